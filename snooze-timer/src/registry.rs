//! The wake registry: deadlines mapped to the wakers waiting on them.
use std::collections::BTreeMap;
use std::time::Instant;
use std::task::Waker;

use parking_lot::Mutex;
use snooze_executor::park::Unpark;

/// Time-ordered map from deadline to pending wakers.
///
/// All structural operations run under one lock which is never held while
/// the driver blocks or while wakers run. Wakers may therefore be registered
/// from any thread, and firing a waker may re-enter the registry.
pub(crate) struct Registry {
    inner: Mutex<Inner>,
}

struct Inner {
    wakers: BTreeMap<Instant, Vec<Waker>>,
    /// Wakes the driver thread when an earlier deadline shows up while it
    /// is blocked.
    unparker: Option<Box<dyn Unpark + Send + Sync>>,
    /// Set while the driver is blocked waiting for the earliest deadline.
    parked: bool,
    shutdown: bool,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                wakers: BTreeMap::new(),
                unparker: None,
                parked: false,
                shutdown: false,
            }),
        }
    }

    pub(crate) fn set_unparker<U>(&self, unparker: U)
    where
        U: Unpark + Send + Sync + 'static,
    {
        self.inner.lock().unparker = Some(Box::new(unparker));
    }

    /// Register `waker` to be woken once `deadline` has passed.
    ///
    /// A waker which would wake the same task as one already registered for
    /// `deadline` is not added again. Returns `false` if the registry was
    /// shut down, in which case nothing is registered.
    pub(crate) fn insert(&self, deadline: Instant, waker: &Waker) -> bool {
        let mut inner = self.inner.lock();
        if inner.shutdown {
            return false;
        }
        let earliest = inner
            .wakers
            .keys()
            .next()
            .map_or(true, |next| deadline < *next);
        let wakers = inner.wakers.entry(deadline).or_default();
        if !wakers.iter().any(|existing| existing.will_wake(waker)) {
            wakers.push(waker.clone());
        }
        if earliest && inner.parked {
            if let Some(unparker) = &inner.unparker {
                unparker.unpark();
            }
        }
        true
    }

    /// Returns the earliest registered deadline.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.inner.lock().wakers.keys().next().copied()
    }

    /// Mark the driver as about to block, returning the deadline it should
    /// wake up for.
    ///
    /// Deadlines registered after this call unpark the driver if they are
    /// earlier than every other registered deadline.
    pub(crate) fn prepare_park(&self) -> Option<Instant> {
        let mut inner = self.inner.lock();
        inner.parked = true;
        inner.wakers.keys().next().copied()
    }

    pub(crate) fn finish_park(&self) {
        self.inner.lock().parked = false;
    }

    /// Remove every entry whose deadline is at or before `now`, returning
    /// their wakers in deadline order.
    pub(crate) fn take_due(&self, now: Instant) -> Vec<Waker> {
        let mut inner = self.inner.lock();
        let mut due = Vec::new();
        while let Some(entry) = inner.wakers.first_entry() {
            if *entry.key() > now {
                break;
            }
            due.extend(entry.remove());
        }
        due
    }

    /// Wake every entry which is due at `now`, returning the number of wakers
    /// invoked.
    pub(crate) fn fire_due(&self, now: Instant) -> usize {
        let due = self.take_due(now);
        let fired = due.len();
        due.into_iter().for_each(Waker::wake);
        fired
    }

    /// Shut the registry down, waking every registered waker.
    ///
    /// Further registrations are refused.
    pub(crate) fn shutdown(&self) -> usize {
        let wakers = {
            let mut inner = self.inner.lock();
            inner.shutdown = true;
            inner.unparker = None;
            std::mem::take(&mut inner.wakers)
        };
        let mut woken = 0;
        for waker in wakers.into_values().flatten() {
            waker.wake();
            woken += 1;
        }
        woken
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.inner.lock().shutdown
    }

    /// Number of registered wakers.
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().wakers.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[derive(Clone, Default)]
    struct CountingUnparker(Arc<AtomicUsize>);

    impl Unpark for CountingUnparker {
        fn unpark(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn duplicate_wakers_are_not_stored_twice() {
        let registry = Registry::new();
        let (waker, _) = futures_test::task::new_count_waker();
        let deadline = Instant::now() + Duration::from_secs(1);
        for _ in 0..1000 {
            assert!(registry.insert(deadline, &waker));
        }
        assert_eq!(registry.len(), 1);

        let (other, _) = futures_test::task::new_count_waker();
        registry.insert(deadline, &other);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn fires_due_entries_in_deadline_order() {
        let registry = Registry::new();
        let now = Instant::now();
        let (early, early_count) = futures_test::task::new_count_waker();
        let (late, late_count) = futures_test::task::new_count_waker();
        registry.insert(now + Duration::from_millis(20), &late);
        registry.insert(now + Duration::from_millis(10), &early);
        assert_eq!(registry.next_deadline(), Some(now + Duration::from_millis(10)));

        assert_eq!(registry.fire_due(now), 0);
        assert_eq!(registry.fire_due(now + Duration::from_millis(10)), 1);
        assert_eq!(early_count.get(), 1);
        assert_eq!(late_count.get(), 0);

        assert_eq!(registry.fire_due(now + Duration::from_secs(1)), 1);
        assert_eq!(late_count.get(), 1);
        assert_eq!(registry.next_deadline(), None);
        // Entries are removed exactly once.
        assert_eq!(registry.fire_due(now + Duration::from_secs(2)), 0);
    }

    #[test]
    fn earlier_deadline_unparks_a_parked_driver() {
        let registry = Registry::new();
        let unparker = CountingUnparker::default();
        registry.set_unparker(unparker.clone());
        let now = Instant::now();
        let (waker, _) = futures_test::task::new_count_waker();

        registry.insert(now + Duration::from_secs(10), &waker);
        assert_eq!(unparker.0.load(Ordering::SeqCst), 0, "driver not parked");

        assert_eq!(registry.prepare_park(), Some(now + Duration::from_secs(10)));
        registry.insert(now + Duration::from_secs(20), &waker);
        assert_eq!(unparker.0.load(Ordering::SeqCst), 0, "later deadline");
        registry.insert(now + Duration::from_secs(5), &waker);
        assert_eq!(unparker.0.load(Ordering::SeqCst), 1);

        registry.finish_park();
        registry.insert(now + Duration::from_secs(1), &waker);
        assert_eq!(unparker.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shutdown_wakes_everything_and_refuses_new_entries() {
        let registry = Registry::new();
        let now = Instant::now();
        let (waker, count) = futures_test::task::new_count_waker();
        let (other, other_count) = futures_test::task::new_count_waker();
        registry.insert(now + Duration::from_secs(1), &waker);
        registry.insert(now + Duration::from_secs(2), &other);

        assert_eq!(registry.shutdown(), 2);
        assert_eq!((count.get(), other_count.get()), (1, 1));
        assert!(registry.is_shutdown());
        assert!(!registry.insert(now, &waker));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn concurrent_insertion() {
        let registry = Arc::new(Registry::new());
        let now = Instant::now();
        let threads: Vec<_> = (0..4)
            .map(|n| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 0..100u64 {
                        let (waker, _) = futures_test::task::new_count_waker();
                        registry.insert(now + Duration::from_millis(n * 100 + i), &waker);
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
        assert_eq!(registry.len(), 400);
        assert_eq!(registry.fire_due(now + Duration::from_secs(10)), 400);
    }
}
