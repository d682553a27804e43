//! Health snapshot assembly.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::server::ServerConnection;
use crate::types::HealthSnapshot;

/// Underrun counter bumped from the server's notification thread.
///
/// Relaxed ordering: the poll thread only needs an eventually consistent,
/// monotonically increasing count.
#[derive(Debug, Default)]
pub struct XrunCounter(AtomicU64);

impl XrunCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Combine the live load estimate with the underrun count, or report
/// [`HealthSnapshot::unavailable`] when there is no connection.
pub fn assemble<C: ServerConnection>(
    connection: Option<&C>,
    xruns: &XrunCounter,
) -> HealthSnapshot {
    match connection {
        Some(connection) => HealthSnapshot {
            cpu_load: connection.cpu_load().max(0.0),
            xrun_count: xruns.count(),
        },
        None => HealthSnapshot::unavailable(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counter_is_monotonic_across_threads() {
        let counter = Arc::new(XrunCounter::new());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..250 {
                        counter.record();
                    }
                })
            })
            .collect();

        let mut last = 0;
        while workers.iter().any(|w| !w.is_finished()) {
            let now = counter.count();
            assert!(now >= last);
            last = now;
        }
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(counter.count(), 2000);
    }
}
