use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::{Condvar, Mutex};

/// Allows checking the progress of a long running operation from another
/// thread.
#[derive(Clone)]
pub struct Progress {
    inner: Arc<ProgressInner>,
}

struct ProgressInner {
    completed: AtomicU32,
    total: AtomicU32,
    finished: AtomicBool,

    notify: Condvar,
    last_completed: Mutex<u32>,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ProgressInner {
                completed: AtomicU32::new(0),
                total: AtomicU32::new(0),
                finished: AtomicBool::new(false),

                notify: Condvar::new(),
                last_completed: Mutex::new(0),
            }),
        }
    }

    /// Waits until the next item is complete (or a short timeout passes),
    /// returning the current count of completed items.
    pub fn wait(&self) -> u32 {
        let mut last_completed = self.inner.last_completed.lock();
        if !self.is_finished() {
            self.inner
                .notify
                .wait_for(&mut last_completed, Duration::from_millis(100));
        }

        let current = self.completed();
        if *last_completed < current {
            *last_completed = current;
        }

        current
    }

    /// Returns the count of completed items.
    pub fn completed(&self) -> u32 {
        self.inner.completed.load(Ordering::Relaxed)
    }

    /// Returns the count of items in the current operation.
    pub fn total(&self) -> u32 {
        self.inner.total.load(Ordering::Relaxed)
    }

    pub fn set_total(&self, total: u32) {
        self.inner.total.store(total, Ordering::Relaxed);
    }

    pub fn add_complete(&self, count: u32) {
        self.inner.completed.fetch_add(count, Ordering::Relaxed);
        self.inner.notify.notify_all();
    }

    /// Marks the operation as done. It may finish before `total` items are
    /// completed.
    pub fn set_finished(&self) {
        self.inner.finished.store(true, Ordering::Relaxed);
        self.inner.notify.notify_all();
    }

    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Relaxed)
    }

    pub fn fraction(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }

        self.completed() as f32 / total as f32
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::Progress;

    #[test]
    fn counts_across_threads() {
        let progress = Progress::new();
        progress.set_total(8);

        thread::scope(|s| {
            for _ in 0..4 {
                let progress = progress.clone();
                s.spawn(move || {
                    progress.add_complete(1);
                    progress.add_complete(1);
                });
            }
        });
        progress.set_finished();

        assert_eq!(progress.completed(), 8);
        assert_eq!(progress.wait(), 8);
        assert!(progress.is_finished());
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn empty_fraction() {
        assert_eq!(Progress::new().fraction(), 0.0);
    }
}
