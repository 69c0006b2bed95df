use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;
type Updater<S> = Box<dyn FnOnce(&S) -> S + Send>;

struct UpdateQueue<S> {
    queue: VecDeque<Updater<S>>,
    draining: bool,
}

struct StoreInner<S> {
    state: RwLock<S>,
    listeners: RwLock<BTreeMap<u64, Listener<S>>>,
    next_listener_id: AtomicU64,
    pending: Mutex<UpdateQueue<S>>,
}

/// Single-slot state container with synchronous, in-order subscriber
/// notification. Each `update` produces exactly one notification per
/// subscriber; re-entrant updates from inside a listener are queued and
/// drained in invocation order.
pub struct Store<S> {
    inner: Arc<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> Store<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(initial),
                listeners: RwLock::new(BTreeMap::new()),
                next_listener_id: AtomicU64::new(1),
                pending: Mutex::new(UpdateQueue {
                    queue: VecDeque::new(),
                    draining: false,
                }),
            }),
        }
    }

    pub fn get(&self) -> S {
        read_unpoisoned(&self.inner.state).clone()
    }

    pub fn update(&self, updater: impl FnOnce(&S) -> S + Send + 'static) {
        {
            let mut pending = lock_unpoisoned(&self.inner.pending);
            pending.queue.push_back(Box::new(updater));
            if pending.draining {
                // An update further up the stack is already draining the
                // queue; it will pick this one up in order.
                return;
            }
            pending.draining = true;
        }

        loop {
            let updater = {
                let mut pending = lock_unpoisoned(&self.inner.pending);
                match pending.queue.pop_front() {
                    Some(updater) => updater,
                    None => {
                        pending.draining = false;
                        break;
                    }
                }
            };

            let next = {
                let current = read_unpoisoned(&self.inner.state);
                updater(&current)
            };
            *write_unpoisoned(&self.inner.state) = next.clone();

            // Listeners run without any lock held so they may subscribe,
            // unsubscribe, or update re-entrantly.
            let listeners = read_unpoisoned(&self.inner.listeners)
                .values()
                .cloned()
                .collect::<Vec<_>>();
            for listener in listeners {
                listener(&next);
            }
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&S) + Send + Sync + 'static) -> Subscription<S> {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        write_unpoisoned(&self.inner.listeners).insert(id, Arc::new(listener));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }
}

#[must_use = "dropping a Subscription keeps the listener attached; call unsubscribe to detach it"]
pub struct Subscription<S> {
    id: u64,
    store: Weak<StoreInner<S>>,
}

impl<S> Subscription<S> {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.store.upgrade() {
            write_unpoisoned(&inner.listeners).remove(&self.id);
        }
    }
}

fn read_unpoisoned<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_unpoisoned<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn lock_unpoisoned<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
