//! Asynchronous worker pool for hash searches.
//!
//! [`WorkerPool`] owns one bounded channel per worker and hands out
//! [`WorkRequest`]s round-robin. It also tracks how many searches have been
//! admitted and not yet released, which is what graceful shutdown drains.
//!
//! A worker runs one search at a time. With a channel capacity of one, a
//! worker holds at most one queued request while it runs another; further
//! calls wait in [`WorkerPool::send_to_next_worker`].

use crate::server::{
    streaming::request::WorkRequest,
    telemetry::{Rpc, decrement_searches_inflight, increment_searches_inflight},
};
use core::time::Duration;
use hashfind_tonic_core::Error;
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

/// How long each worker is given to acknowledge a shutdown request.
const WORKER_ACK_TIMEOUT: Duration = Duration::from_secs(3);

/// Counts a search from admission until the worker drops its request.
///
/// Created by [`WorkerPool::begin_search`] and moved into the
/// [`WorkRequest`], so a request that is never delivered is released too.
#[derive(Debug)]
pub struct InflightGuard {
    inflight: Arc<AtomicUsize>,
    rpc: Rpc,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.inflight.fetch_sub(1, Ordering::AcqRel);
        decrement_searches_inflight(self.rpc);
    }
}

/// A cooperative pool of asynchronous workers that process [`WorkRequest`]s.
pub struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    next_worker: AtomicUsize,
    shutdown_token: CancellationToken,
    shutdown_timeout: usize,
    shutting_down: AtomicBool,
    inflight: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Constructs a pool over initialized worker channels. `shutdown_token`
    /// must be the token the workers were spawned with.
    pub fn new(
        workers: Vec<mpsc::Sender<WorkRequest>>,
        shutdown_token: CancellationToken,
        shutdown_timeout: usize,
    ) -> Self {
        Self {
            workers,
            next_worker: AtomicUsize::new(0),
            shutdown_token,
            shutdown_timeout,
            shutting_down: AtomicBool::new(false),
            inflight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the index of the next worker to receive work (round-robin).
    pub fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    /// Number of searches admitted and not yet released by a worker.
    pub fn searches_inflight(&self) -> usize {
        self.inflight.load(Ordering::Acquire)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Admits a new search.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceShutdown`] once [`Self::shutdown`] has started.
    pub fn begin_search(&self, rpc: Rpc) -> Result<InflightGuard, Error> {
        if self.is_shutting_down() {
            return Err(Error::ServiceShutdown);
        }
        self.inflight.fetch_add(1, Ordering::AcqRel);
        increment_searches_inflight(rpc);
        Ok(InflightGuard {
            inflight: Arc::clone(&self.inflight),
            rpc,
        })
    }

    /// Sends a [`WorkRequest`] to the next worker, waiting while its queue is
    /// full.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The pool has been cancelled (`shutdown_token`).
    /// - The worker's channel is closed.
    pub async fn send_to_next_worker(&self, request: WorkRequest) -> Result<(), Error> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }

        let worker_idx = self.next_worker_index();
        let worker = &self.workers[worker_idx];

        worker.send(request).await.map_err(|_| Error::ChannelError {
            context: format!("Worker {worker_idx} channel closed"),
        })
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// 1. New searches are refused.
    /// 2. In-flight searches get up to `shutdown_timeout` seconds to finish.
    /// 3. The shared [`CancellationToken`] is cancelled, which sets the cancel
    ///    flag of every search still running.
    /// 4. Each worker is sent [`WorkRequest::Shutdown`]. Queuing the request and
    ///    acknowledging it are each bounded by [`WORKER_ACK_TIMEOUT`].
    pub async fn shutdown(&self) -> Result<(), Error> {
        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new searches");
        self.shutting_down.store(true, Ordering::Release);

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Draining in-flight searches ({} active)",
            self.searches_inflight()
        );
        let drain = timeout(Duration::from_secs(self.shutdown_timeout as u64), async {
            while self.searches_inflight() > 0 {
                sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        match drain {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("All in-flight searches drained");
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Graceful drain timed out ({} searches still active)",
                    self.searches_inflight()
                );
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Cancelling remaining searches via shutdown token");
        self.shutdown_token.cancel();

        #[cfg(feature = "tracing")]
        tracing::debug!("Notifying all workers to shut down");
        let mut acks = Vec::with_capacity(self.workers.len());
        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            let request = WorkRequest::Shutdown { response: tx };
            match timeout(WORKER_ACK_TIMEOUT, worker.send(request)).await {
                Ok(Ok(())) => acks.push((i, rx)),
                Ok(Err(_e)) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Failed to send shutdown to worker {i}: {_e}");
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Worker {i} queue stayed full, skipping shutdown request");
                }
            }
        }

        let waits = acks.into_iter().map(|(_i, rx)| async move {
            match timeout(WORKER_ACK_TIMEOUT, rx).await {
                Ok(Ok(())) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("Worker {_i} shutdown acknowledged");
                }
                Ok(Err(_e)) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {_i} dropped its acknowledgement: {_e}");
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Worker {_i} shutdown timed out");
                }
            }
        });
        futures::future::join_all(waits).await;

        #[cfg(feature = "tracing")]
        tracing::info!("Worker pool shutdown complete");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with(workers: usize) -> (WorkerPool, Vec<mpsc::Receiver<WorkRequest>>) {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..workers)
            .map(|_| mpsc::channel::<WorkRequest>(1))
            .unzip();
        (
            WorkerPool::new(senders, CancellationToken::new(), 0),
            receivers,
        )
    }

    #[test]
    fn workers_are_picked_round_robin() {
        let (pool, _rx) = pool_with(3);
        let picked: Vec<_> = (0..7).map(|_| pool.next_worker_index()).collect();
        assert_eq!(picked, [0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn inflight_guard_counts_until_dropped() {
        let (pool, _rx) = pool_with(1);
        let a = pool.begin_search(Rpc::Find).unwrap();
        let b = pool.begin_search(Rpc::FindRange).unwrap();
        assert_eq!(pool.searches_inflight(), 2);
        drop(a);
        assert_eq!(pool.searches_inflight(), 1);
        drop(b);
        assert_eq!(pool.searches_inflight(), 0);
    }

    #[tokio::test]
    async fn shutdown_refuses_new_searches_and_stops_workers() {
        let (pool, mut receivers) = pool_with(2);
        let acks = tokio::spawn(async move {
            for rx in &mut receivers {
                match rx.recv().await {
                    Some(WorkRequest::Shutdown { response }) => response.send(()).unwrap(),
                    other => panic!("unexpected request: {other:?}"),
                }
            }
        });

        pool.shutdown().await.unwrap();
        acks.await.unwrap();

        assert!(pool.is_shutting_down());
        assert!(matches!(
            pool.begin_search(Rpc::Find),
            Err(Error::ServiceShutdown)
        ));
    }
}
