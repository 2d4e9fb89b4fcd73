//! Fixed-interval scan trigger with a cancel handle.
//!
//! The first tick fires immediately, so starting a schedule also covers the
//! initial-load scan. Ticks run to completion before the next one is awaited;
//! missed ticks are skipped rather than bunched up.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|c| *c).await;
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

pub struct Schedule {
    task: JoinHandle<u64>,
}

impl Schedule {
    /// Call `tick` with the 1-based run number every `period` until `cancel` fires.
    ///
    /// `tick` may block: each call runs on the blocking thread pool.
    pub fn start<F>(period: Duration, cancel: &CancelHandle, tick: F) -> Self
    where
        F: FnMut(u64) + Send + 'static,
    {
        let mut rx = cancel.subscribe();
        let task = tokio::spawn(async move {
            let mut tick = tick;
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut runs = 0;
            loop {
                if *rx.borrow() {
                    break;
                }
                let due = tokio::select! {
                    _ = interval.tick() => true,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        false
                    }
                };
                if !due {
                    continue;
                }

                runs += 1;
                let run = runs;
                match tokio::task::spawn_blocking(move || {
                    tick(run);
                    tick
                })
                .await
                {
                    Ok(returned) => tick = returned,
                    Err(e) => {
                        tracing::error!(run, error = %e, "scan tick panicked; stopping schedule");
                        break;
                    }
                }
            }
            runs
        });
        Self { task }
    }

    /// Wait for the schedule to stop and return how many ticks ran.
    pub async fn join(self) -> anyhow::Result<u64> {
        Ok(self.task.await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn first_tick_is_immediate_and_cancel_stops() {
        let cancel = CancelHandle::new();
        let count = Arc::new(AtomicU64::new(0));
        let seen = count.clone();
        let schedule = Schedule::start(Duration::from_secs(3600), &cancel, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        let runs = schedule.join().await.unwrap();

        assert_eq!(runs, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn tick_can_cancel_its_own_schedule() {
        let cancel = CancelHandle::new();
        let inner = cancel.clone();
        let schedule = Schedule::start(Duration::from_millis(5), &cancel, move |run| {
            if run == 3 {
                inner.cancel();
            }
        });
        assert_eq!(schedule.join().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn ticks_run_off_the_runtime_thread() {
        let cancel = CancelHandle::new();
        let inner = cancel.clone();
        let runtime_thread = std::thread::current().id();
        let seen = Arc::new(std::sync::Mutex::new(None));
        let record = seen.clone();
        let schedule = Schedule::start(Duration::from_secs(3600), &cancel, move |_| {
            *record.lock().unwrap() = Some(std::thread::current().id());
            inner.cancel();
        });

        assert_eq!(schedule.join().await.unwrap(), 1);
        let tick_thread = seen.lock().unwrap().expect("tick ran");
        assert_ne!(tick_thread, runtime_thread);
    }

    #[tokio::test]
    async fn cancelled_before_start_never_ticks() {
        let cancel = CancelHandle::new();
        cancel.cancel();
        let schedule = Schedule::start(Duration::from_millis(5), &cancel, |_| {
            panic!("should not tick");
        });
        assert_eq!(schedule.join().await.unwrap(), 0);
    }
}
