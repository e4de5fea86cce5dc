use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use tokio::sync::{Mutex, OwnedMutexGuard};

type Registry = Arc<StdMutex<HashMap<String, Slot>>>;

struct Slot {
    lock: Arc<Mutex<()>>,
    /// Holders plus waiters. The slot is removed when this reaches zero.
    users: usize,
}

/// Registry of per-session async mutexes.
///
/// Holding the guard for a session serializes every read-modify-write on it
/// within this process. Sessions with different IDs never contend. An entry
/// lives only while someone holds or waits for it.
#[derive(Default)]
pub struct SessionLocks {
    registry: Registry,
}

/// Exclusive access to one session. Dropping it releases the lock.
pub struct SessionGuard {
    // Field order matters: the mutex is released before the slot is pruned.
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

/// One counted use of a slot, held from `acquire` until the guard drops.
struct Registration {
    registry: Registry,
    session_id: String,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut slots = lock_registry(&self.registry);
        if let Some(slot) = slots.get_mut(&self.session_id) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                slots.remove(&self.session_id);
            }
        }
    }
}

fn lock_registry(registry: &Registry) -> MutexGuard<'_, HashMap<String, Slot>> {
    registry.lock().unwrap_or_else(|e| e.into_inner())
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `session_id`.
    ///
    /// A caller cancelled while waiting gives up its slot like a dropped guard.
    pub async fn acquire(&self, session_id: &str) -> SessionGuard {
        let (registration, lock) = {
            let mut slots = lock_registry(&self.registry);
            let slot = slots
                .entry(session_id.to_string())
                .or_insert_with(|| Slot {
                    lock: Arc::new(Mutex::new(())),
                    users: 0,
                });
            slot.users += 1;
            let registration = Registration {
                registry: self.registry.clone(),
                session_id: session_id.to_string(),
            };
            (registration, slot.lock.clone())
        };

        let guard = lock.lock_owned().await;
        SessionGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of sessions currently held or waited for.
    pub fn len(&self) -> usize {
        lock_registry(&self.registry).len()
    }

    pub fn is_empty(&self) -> bool {
        lock_registry(&self.registry).is_empty()
    }
}
