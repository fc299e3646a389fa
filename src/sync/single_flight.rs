use std::future::Future;

use tokio::sync::Mutex;

/// Runs at most one future at a time; callers arriving while one is in
/// flight get `None` instead of queueing behind it.
#[derive(Debug, Default)]
pub struct SingleFlight {
    lock: Mutex<()>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F>(&self, work: F) -> Option<F::Output>
    where
        F: Future,
    {
        let _guard = self.lock.try_lock().ok()?;
        Some(work.await)
    }

    pub fn in_flight(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn coalesces_overlapping_runs() {
        let flight = Arc::new(SingleFlight::new());
        let (release, gate) = oneshot::channel::<()>();
        let (started_tx, started) = oneshot::channel::<()>();

        let first = {
            let flight = Arc::clone(&flight);
            tokio::spawn(async move {
                flight
                    .run(async move {
                        let _ = started_tx.send(());
                        let _ = gate.await;
                        1
                    })
                    .await
            })
        };

        started.await.expect("first run started");
        assert!(flight.in_flight());
        assert_eq!(flight.run(async { 2 }).await, None);

        release.send(()).expect("release first run");
        assert_eq!(first.await.expect("join"), Some(1));
        assert!(!flight.in_flight());
        assert_eq!(flight.run(async { 3 }).await, Some(3));
    }
}
