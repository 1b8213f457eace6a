//! # Cart Store
//!
//! The seam between checkout logic and wherever a shopper's cart lives.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout flow ──get/set──► dyn CartStore ──notify──► listeners         │
//! │                                   │                    (persistence,    │
//! │                                   │                     UI refresh)     │
//! │                          MemoryCartStore (tests, per-session state)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stores are injected; nothing in this crate reaches for a global cart.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::cart::Cart;
use crate::error::CoreResult;

/// Callback invoked with the cart after every change.
pub type CartListener = Box<dyn Fn(&Cart) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Get/set/subscribe access to one shopper's cart.
pub trait CartStore: Send + Sync {
    /// Snapshot of the current cart.
    fn get(&self) -> Cart;

    /// Replaces the cart and notifies listeners.
    fn set(&self, cart: Cart);

    /// Registers a listener called after every `set`.
    fn subscribe(&self, listener: CartListener) -> SubscriptionId;

    /// Removes a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Applies a fallible mutation; listeners only fire when it succeeds.
    fn update<R>(&self, f: impl FnOnce(&mut Cart) -> CoreResult<R>) -> CoreResult<R>
    where
        Self: Sized,
    {
        let mut cart = self.get();
        let result = f(&mut cart)?;
        self.set(cart);
        Ok(result)
    }
}

struct Inner {
    cart: Cart,
    listeners: Vec<(SubscriptionId, std::sync::Arc<dyn Fn(&Cart) + Send + Sync>)>,
    next_id: u64,
}

/// In-memory `CartStore`.
///
/// ## Locking
/// ```text
///   writer ─┬─ inner: change cart, copy listeners ─┐
///           └─ notify listeners (inner released) ──┴─► next writer
/// ```
/// Writers are serialized for the whole change-and-notify step, so listeners
/// see changes in the order they were made. The cart lock is released before
/// listeners run: a listener may `get` the store, but must not `set` it.
pub struct MemoryCartStore {
    writer: Mutex<()>,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for MemoryCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemoryCartStore")
            .field("cart", &inner.cart)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl Default for MemoryCartStore {
    fn default() -> Self {
        MemoryCartStore::new(Cart::new())
    }
}

impl MemoryCartStore {
    /// Creates a store seeded with a cart (e.g. one loaded from the database).
    pub fn new(cart: Cart) -> Self {
        MemoryCartStore {
            writer: Mutex::new(()),
            inner: Mutex::new(Inner {
                cart,
                listeners: Vec::new(),
                next_id: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartStore for MemoryCartStore {
    fn get(&self) -> Cart {
        self.lock().cart.clone()
    }

    fn set(&self, cart: Cart) {
        let _writer = self.lock_writer();
        let listeners: Vec<_> = {
            let mut inner = self.lock();
            inner.cart = cart.clone();
            inner.listeners.iter().map(|(_, l)| l.clone()).collect()
        };

        for listener in listeners {
            listener(&cart);
        }
    }

    fn subscribe(&self, listener: CartListener) -> SubscriptionId {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, std::sync::Arc::from(listener)));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().listeners.retain(|(existing, _)| *existing != id);
    }

    /// Read-modify-write under a single lock so concurrent requests for the
    /// same session cannot lose each other's changes.
    fn update<R>(&self, f: impl FnOnce(&mut Cart) -> CoreResult<R>) -> CoreResult<R> {
        let _writer = self.lock_writer();
        let (result, cart, listeners) = {
            let mut inner = self.lock();
            let mut cart = inner.cart.clone();
            let result = f(&mut cart)?;
            inner.cart = cart.clone();
            let listeners: Vec<_> = inner.listeners.iter().map(|(_, l)| l.clone()).collect();
            (result, cart, listeners)
        };

        for listener in listeners {
            listener(&cart);
        }
        Ok(result)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
