use super::request::WorkRequest;
use crate::server::pool::manager::{InflightGuard, WorkerPool};
use hashfind_tonic_core::{
    Error,
    hashfind::{CancelFlag, Completion, SearchParams},
    proto::HashNameResponse,
};
use tokio::sync::{mpsc, oneshot};
use tonic::Status;

/// Hands a unary search to the pool and waits for its completion.
///
/// Dropping the returned future stops waiting but does not touch `cancel`;
/// the caller's drop guard is what stops the search.
///
/// # Errors
///
/// - [`Error::ServiceShutdown`] or [`Error::ChannelError`] if the search could
///   not be dispatched.
/// - [`Error::Search`] if the search rejected its input.
pub async fn run_best(
    worker_pool: &WorkerPool,
    params: SearchParams,
    cancel: CancelFlag,
    inflight: InflightGuard,
) -> Result<Completion, Error> {
    let (response, result) = oneshot::channel();

    worker_pool
        .send_to_next_worker(WorkRequest::Best {
            params,
            cancel,
            response,
            inflight,
        })
        .await?;

    result.await.map_err(|_| Error::ChannelError {
        context: "worker dropped the search result".to_string(),
    })?
}

/// Hands a streaming search to the pool. Matches are written to `matches` by
/// the worker, so this returns as soon as a worker has accepted the request.
///
/// While every worker is busy this waits for a queue slot, unless the
/// response stream is dropped first.
///
/// # Errors
///
/// - [`Error::RequestCancelled`] if the client went away before a worker
///   accepted the search.
/// - [`Error::ServiceShutdown`] or [`Error::ChannelError`] if the search could
///   not be dispatched. The error is also forwarded to the client on a best
///   effort basis.
pub async fn feed_matches(
    worker_pool: &WorkerPool,
    params: SearchParams,
    cancel: CancelFlag,
    inflight: InflightGuard,
    matches: mpsc::Sender<Result<HashNameResponse, Status>>,
) -> Result<(), Error> {
    let request = WorkRequest::Stream {
        params,
        cancel,
        matches: matches.clone(),
        inflight,
    };

    let dispatched = tokio::select! {
        dispatched = worker_pool.send_to_next_worker(request) => dispatched,
        () = matches.closed() => return Err(Error::RequestCancelled),
    };

    if let Err(e) = dispatched {
        // The client may already be gone, in which case only the returned
        // error is left to report.
        if let Err(_e) = matches.send(Err(e.clone().into())).await {
            #[cfg(feature = "tracing")]
            tracing::warn!("Failed to forward err: {}", _e);
        }
        return Err(e);
    }

    Ok(())
}
