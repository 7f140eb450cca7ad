use crate::domain::NoteName;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One reader-writer lock per note name, created on first use.
///
/// The locks guard no data, so a poisoned lock is simply taken over.
#[derive(Default)]
pub(crate) struct LockTable {
    locks: Mutex<HashMap<NoteName, Arc<RwLock<()>>>>,
}

/// Keeps the per-name lock alive for as long as its guard is held.
pub(crate) struct NoteLock {
    lock: Arc<RwLock<()>>,
}

impl NoteLock {
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LockTable {
    pub(crate) fn get(&self, name: &NoteName) -> NoteLock {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = locks.entry(name.clone()).or_default().clone();
        NoteLock { lock }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn name(s: &str) -> NoteName {
        NoteName::new(s).unwrap()
    }

    #[test]
    fn same_name_shares_a_lock() {
        let table = LockTable::default();
        let a = table.get(&name("todo"));
        let b = table.get(&name("todo"));
        assert!(Arc::ptr_eq(&a.lock, &b.lock));
        assert!(!Arc::ptr_eq(&a.lock, &table.get(&name("other")).lock));
    }

    #[test]
    fn writers_on_one_name_are_serialized() {
        let table = Arc::new(LockTable::default());
        let inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = table.clone();
                let inside = inside.clone();
                thread::spawn(move || {
                    let lock = table.get(&name("todo"));
                    let _guard = lock.write();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    thread::yield_now();
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let table = Arc::new(LockTable::default());
        let t = table.clone();
        let _ = thread::spawn(move || {
            let lock = t.get(&name("todo"));
            let _guard = lock.write();
            panic!("poison");
        })
        .join();

        let lock = table.get(&name("todo"));
        drop(lock.write());
        drop(lock.read());
    }
}
