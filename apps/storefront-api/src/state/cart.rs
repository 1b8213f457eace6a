//! # Cart Sessions
//!
//! One `MemoryCartStore` per active shopper session, written through to
//! SQLite.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session Cart Lifecycle                               │
//! │                                                                         │
//! │  first write ──► load from db ──► MemoryCartStore ──► cached           │
//! │  read-only request ──► cached store or db snapshot (nothing cached)    │
//! │                                          │                              │
//! │  add / update / remove ──► store.update()│                              │
//! │                                          ▼                              │
//! │                              listener ──► PersistCommand::Save          │
//! │                                                 │                       │
//! │                                                 ▼                       │
//! │                         persistence task ──► CartRepository::save      │
//! │                                                                         │
//! │  clear() ──► PersistCommand::Delete ──► session evicted                │
//! │  idle longer than session_idle ──► sweeper evicts (db copy stays)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers never wait on the write. A store notifies its listeners in the
//! order changes were made and the persistence task applies commands in the
//! order they were sent, so the database converges on the latest cart.
//! Before a session is loaded from the database, queued writes are flushed so
//! an evicted store's last changes are not read back stale.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use storefront_core::{Cart, CartStore, MemoryCartStore};
use storefront_db::{CartRepository, DbResult};

/// Work for the persistence task.
#[derive(Debug)]
enum PersistCommand {
    Save { session: String, cart: Cart },
    Delete { session: String },
    Flush(oneshot::Sender<()>),
}

#[derive(Debug)]
struct Session {
    store: Arc<MemoryCartStore>,
    last_used: Instant,
}

/// Per-session carts shared by all handlers.
#[derive(Debug)]
pub struct CartSessions {
    repo: CartRepository,
    stores: Mutex<HashMap<String, Session>>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    persist_tx: mpsc::UnboundedSender<PersistCommand>,
}

impl CartSessions {
    /// Creates the session map and spawns its persistence task.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(repo: CartRepository) -> Self {
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_persistence(repo.clone(), persist_rx));

        CartSessions {
            repo,
            stores: Mutex::new(HashMap::new()),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            persist_tx,
        }
    }

    /// Returns the store for a session, loading it from the database on first use.
    ///
    /// Only paths that change the cart should call this; reads go through
    /// `snapshot` so unknown session ids are not kept in memory.
    pub async fn store(&self, session: &str) -> DbResult<Arc<MemoryCartStore>> {
        if let Some(store) = self.cached(session) {
            return Ok(store);
        }

        // Load without holding the map lock
        let cart = self.load(session).await?;
        debug!(session, lines = cart.item_count(), "Loaded cart session");

        let store = lock(&self.stores)
            .entry(session.to_string())
            .or_insert_with(|| Session {
                store: self.new_store(session, cart),
                last_used: Instant::now(),
            })
            .store
            .clone();
        Ok(store)
    }

    /// Current cart for a session without caching a store for it.
    pub async fn snapshot(&self, session: &str) -> DbResult<Cart> {
        match self.cached(session) {
            Some(store) => Ok(store.get()),
            None => self.load(session).await,
        }
    }

    fn cached(&self, session: &str) -> Option<Arc<MemoryCartStore>> {
        let mut stores = lock(&self.stores);
        let entry = stores.get_mut(session)?;
        entry.last_used = Instant::now();
        Some(entry.store.clone())
    }

    async fn load(&self, session: &str) -> DbResult<Cart> {
        self.flush().await;
        self.repo.load(session).await
    }

    fn new_store(&self, session: &str, cart: Cart) -> Arc<MemoryCartStore> {
        let store = Arc::new(MemoryCartStore::new(cart));

        let tx = self.persist_tx.clone();
        let session = session.to_string();
        store.subscribe(Box::new(move |cart| {
            let command = PersistCommand::Save {
                session: session.clone(),
                cart: cart.clone(),
            };
            if tx.send(command).is_err() {
                error!(session = %session, "Cart persistence task has stopped");
            }
        }));

        store
    }

    /// Empties a session's cart, removes its stored copy and evicts it.
    pub fn clear(&self, session: &str) {
        let evicted = lock(&self.stores).remove(session);
        if let Some(entry) = evicted {
            // Handlers still holding the store see an empty cart
            entry.store.set(Cart::new());
        }

        self.send(PersistCommand::Delete {
            session: session.to_string(),
        });
        info!(session, "Cart cleared");
    }

    /// Evicts sessions unused for `max_idle` that have no checkout running.
    ///
    /// Their carts are already queued for the database and reload on next use.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let checking_out = lock(&self.in_flight).clone();
        let mut stores = lock(&self.stores);

        let before = stores.len();
        stores.retain(|session, entry| {
            entry.last_used.elapsed() < max_idle || checking_out.contains(session)
        });
        before - stores.len()
    }

    /// Marks a checkout as running for the session.
    ///
    /// Returns `None` when one is already running. The mark is removed when
    /// the guard is dropped.
    pub fn begin_checkout(&self, session: &str) -> Option<CheckoutGuard> {
        let inserted = lock(&self.in_flight).insert(session.to_string());
        inserted.then(|| CheckoutGuard {
            session: session.to_string(),
            in_flight: self.in_flight.clone(),
        })
    }

    /// Waits until every write queued so far has reached the database.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.persist_tx.send(PersistCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Number of sessions held in memory.
    pub fn session_count(&self) -> usize {
        lock(&self.stores).len()
    }

    fn send(&self, command: PersistCommand) {
        if let Err(e) = self.persist_tx.send(command) {
            error!(command = ?e.0, "Cart persistence task has stopped");
        }
    }
}

/// Evicts idle sessions every half `max_idle` until the sessions are dropped.
pub fn spawn_idle_sweeper(sessions: &Arc<CartSessions>, max_idle: Duration) {
    let sessions = Arc::downgrade(sessions);
    let period = (max_idle / 2).max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(sessions) = sessions.upgrade() else {
                break;
            };

            let evicted = sessions.evict_idle(max_idle);
            if evicted > 0 {
                debug!(evicted, active = sessions.session_count(), "Evicted idle cart sessions");
            }
        }
    });
}

/// Held while a checkout runs; a second checkout for the session is refused.
#[derive(Debug)]
pub struct CheckoutGuard {
    session: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.session);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_persistence(repo: CartRepository, mut rx: mpsc::UnboundedReceiver<PersistCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            PersistCommand::Save { session, cart } => {
                if let Err(e) = repo.save(&session, &cart).await {
                    error!(session = %session, error = %e, "Failed to save cart");
                }
            }
            PersistCommand::Delete { session } => {
                if let Err(e) = repo.delete(&session).await {
                    error!(session = %session, error = %e, "Failed to delete cart");
                }
            }
            PersistCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Cart persistence task stopped");
}
