use crate::server::streaming::{
    processor::{handle_best_request, handle_stream_request},
    request::WorkRequest,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Worker task responsible for processing [`WorkRequest`] messages.
///
/// A worker runs one search at a time and does not take the next request
/// until the current search has returned. It runs until it receives
/// [`WorkRequest::Shutdown`] or every sender is dropped.
///
/// # Arguments
///
/// - `worker_id`: Identifier for this worker, used in logs.
/// - `rx`: Receiver through which [`WorkRequest`]s are received.
/// - `shutdown_token`: Pool-wide token; once cancelled, the running search is
///   cancelled and later searches are refused.
///
/// # Request Types
///
/// - [`WorkRequest::Best`] - [`handle_best_request`].
/// - [`WorkRequest::Stream`] - [`handle_stream_request`].
/// - [`WorkRequest::Shutdown`] - Acknowledge and stop.
pub async fn worker_loop(
    worker_id: usize,
    mut rx: mpsc::Receiver<WorkRequest>,
    shutdown_token: CancellationToken,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Best {
                params,
                cancel,
                response,
                inflight,
            } => {
                handle_best_request(worker_id, params, cancel, response, &shutdown_token).await;
                drop(inflight);
            }
            WorkRequest::Stream {
                params,
                cancel,
                matches,
                inflight,
            } => {
                handle_stream_request(worker_id, params, cancel, matches, &shutdown_token).await;
                drop(inflight);
            }
            WorkRequest::Shutdown { response } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} stopped");
}
