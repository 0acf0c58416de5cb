use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, Weak},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use crate::player::session::SessionKey;

fn lock_map<T>(map: &Mutex<T>) -> MutexGuard<'_, T> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Serializes read-modify-write cycles on a cached session.
///
/// Cursor moves and list extensions both rewrite the whole session value, so
/// each holds the key's lock from load to store. Entries live only while a
/// guard is held.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<SessionKey, Weak<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &SessionKey) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = lock_map(&self.locks);
            locks.retain(|_, weak| weak.strong_count() > 0);

            let existing = locks.get(key).and_then(Weak::upgrade);
            match existing {
                Some(mutex) => mutex,
                None => {
                    let mutex = Arc::new(AsyncMutex::new(()));
                    locks.insert(key.clone(), Arc::downgrade(&mutex));
                    mutex
                }
            }
        };

        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        lock_map(&self.locks)
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

struct NavigationEntry {
    id: u64,
    token: CancellationToken,
    holders: usize,
}

#[derive(Default)]
struct NavigationMap {
    entries: HashMap<SessionKey, NavigationEntry>,
    next_id: u64,
}

/// Per-session cancellation tokens for collaborator work.
///
/// Every pipeline run holds a [`NavigationGuard`] for its session; the token
/// is dropped with the last guard. Leaving a session cancels the token that
/// outstanding guards still carry.
#[derive(Default)]
pub struct NavigationTokens {
    map: Arc<Mutex<NavigationMap>>,
}

/// Keeps a session's navigation token alive while collaborator work runs
pub struct NavigationGuard {
    map: Arc<Mutex<NavigationMap>>,
    key: SessionKey,
    id: u64,
    token: CancellationToken,
}

impl NavigationTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, key: &SessionKey) -> NavigationGuard {
        let mut map = lock_map(&self.map);
        let next_id = map.next_id;

        let entry = map
            .entries
            .entry(key.clone())
            .or_insert_with(|| NavigationEntry {
                id: next_id,
                token: CancellationToken::new(),
                holders: 0,
            });
        entry.holders += 1;

        let (id, token) = (entry.id, entry.token.clone());
        if id == next_id {
            map.next_id += 1;
        }

        NavigationGuard {
            map: self.map.clone(),
            key: key.clone(),
            id,
            token,
        }
    }

    /// Cancels collaborator work still running for the session.
    /// Returns whether any was running.
    pub fn cancel(&self, key: &SessionKey) -> bool {
        match lock_map(&self.map).entries.remove(key) {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        lock_map(&self.map).entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NavigationGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for NavigationGuard {
    fn drop(&mut self) {
        let mut map = lock_map(&self.map);

        let released = match map.entries.get_mut(&self.key) {
            // A later entry for the same key belongs to a new visit
            Some(entry) if entry.id == self.id => {
                entry.holders -= 1;
                entry.holders == 0
            }
            _ => false,
        };

        if released {
            map.entries.remove(&self.key);
        }
    }
}
