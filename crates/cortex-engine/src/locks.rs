use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use cortex_core::SessionId;

/// One mutex per busy session, so each session sees at most one in-flight
/// submission while different sessions proceed in parallel. Entries live only
/// while someone holds or waits on them.
#[derive(Default)]
pub struct SessionLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` under the lock for `id`, covering the whole
    /// load-transition-save sequence. The entry is dropped afterwards unless
    /// another caller is already queued on it.
    pub fn with_lock<T>(&self, id: &SessionId, f: impl FnOnce() -> T) -> T {
        let lock = self.entry(id);
        let out = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);
        // Clones are only handed out under the shard lock that remove_if holds,
        // so a count of one means nobody else can reach this mutex.
        self.inner.remove_if(id.as_str(), |_, m| Arc::strong_count(m) == 1);
        out
    }

    fn entry(&self, id: &SessionId) -> Arc<Mutex<()>> {
        self.inner
            .entry(id.as_str().to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_session_shares_a_lock() {
        let locks = SessionLocks::new();
        let id = SessionId::new();
        let a = locks.entry(&id);
        let b = locks.entry(&id);
        assert!(Arc::ptr_eq(&a, &b));

        let _guard = a.lock();
        assert!(b.try_lock().is_none());
    }

    #[test]
    fn different_sessions_do_not_contend() {
        let locks = SessionLocks::new();
        let a = locks.entry(&SessionId::new());
        let b = locks.entry(&SessionId::new());
        let _guard = a.lock();
        assert!(b.try_lock().is_some());
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn idle_entry_is_pruned_after_use() {
        let locks = SessionLocks::new();
        let id = SessionId::new();
        let out = locks.with_lock(&id, || {
            assert_eq!(locks.len(), 1);
            7
        });
        assert_eq!(out, 7);
        assert!(locks.is_empty());
    }

    #[test]
    fn abandoned_sessions_do_not_accumulate() {
        let locks = SessionLocks::new();
        for _ in 0..100 {
            let _: Result<(), &str> = locks.with_lock(&SessionId::new(), || Err("gave up"));
        }
        assert!(locks.is_empty());
    }

    #[test]
    fn entry_survives_while_another_caller_holds_it() {
        let locks = SessionLocks::new();
        let id = SessionId::new();
        let held = locks.entry(&id);
        locks.with_lock(&id, || ());
        assert_eq!(locks.len(), 1);
        drop(held);
        locks.with_lock(&id, || ());
        assert!(locks.is_empty());
    }

    #[test]
    fn waiters_are_serialised() {
        let locks = Arc::new(SessionLocks::new());
        let id = SessionId::new();
        let counter = Arc::new(Mutex::new(Vec::new()));
        let start = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let (locks, id, counter, start) = (locks.clone(), id.clone(), counter.clone(), start.clone());
                thread::spawn(move || {
                    start.wait();
                    locks.with_lock(&id, || {
                        counter.lock().push(i);
                        thread::sleep(Duration::from_millis(5));
                        counter.lock().push(i);
                    });
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let order = counter.lock().clone();
        assert_eq!(order.len(), 8);
        for pair in order.chunks(2) {
            assert_eq!(pair[0], pair[1], "critical sections interleaved: {order:?}");
        }
        assert!(locks.is_empty());
    }
}
