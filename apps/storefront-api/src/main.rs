//! Storefront API entry point.
//!
//! All setup lives in `lib.rs` so the router can be exercised in tests.

#[tokio::main]
async fn main() {
    if let Err(e) = storefront_api::run().await {
        eprintln!("storefront-api: {}", e);
        std::process::exit(1);
    }
}
