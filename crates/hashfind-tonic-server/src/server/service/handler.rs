//! gRPC service implementation for cancellable hash searches.
//!
//! [`HashFinderService`] implements the [`HashFinder`] service from the
//! protobuf definition. Both methods run the same unbounded search on the
//! worker pool; they differ in what the client sees.
//!
//! - `Find` waits for the search to end and returns its last match, or an
//!   all-default response if there was none.
//! - `FindRange` streams every match as it is found and ends once the search
//!   reaches a match within the ideal distance or is cancelled.
//!
//! ## Cancellation
//!
//! Every call gets its own [`CancelFlag`] and a drop guard tied to the call's
//! lifetime. For `Find` the guard lives in the request future, which tonic
//! drops when the client cancels or its deadline passes. For `FindRange` it
//! lives in the response stream. Either way the search stops before its next
//! candidate once the call is over.

use crate::server::{
    config::ServerConfig,
    pool::{manager::WorkerPool, worker::worker_loop},
    streaming::{
        coordinator::{feed_matches, run_best},
        stream::CancellableStream,
    },
    telemetry::{Rpc, increment_errors, increment_requests},
};
use core::pin::Pin;
use futures::TryStreamExt;
use hashfind_tonic_core::{
    Error,
    hashfind::{CancelFlag, SearchParams},
    proto::{HashNameRequest, HashNameResponse, hash_finder_server::HashFinder},
    types::DIGEST_LEN,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

/// gRPC service that searches for secrets whose digest resembles a name.
#[derive(Clone)]
pub struct HashFinderService {
    config: ServerConfig,
    worker_pool: Arc<WorkerPool>,
}

impl HashFinderService {
    /// Creates the service and spawns `config.num_workers` worker tasks.
    ///
    /// Each worker has a channel of capacity one: a worker holds at most one
    /// queued search while it runs another, and further calls wait for a free
    /// slot.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: ServerConfig) -> Self {
        let mut workers = Vec::with_capacity(config.num_workers);
        let shutdown_token = CancellationToken::new();

        for worker_id in 0..config.num_workers {
            let (tx, rx) = mpsc::channel(1);
            workers.push(tx);
            tokio::spawn(worker_loop(worker_id, rx, shutdown_token.clone()));
        }

        let worker_pool = WorkerPool::new(workers, shutdown_token, config.shutdown_timeout);

        Self {
            config,
            worker_pool: Arc::new(worker_pool),
        }
    }

    /// Initiates a graceful shutdown of the worker pool.
    ///
    /// New calls are refused with `unavailable`. In-flight searches get the
    /// configured timeout to finish before they are cancelled.
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.worker_pool.shutdown().await
    }
}

/// Rejects names that can never appear inside a digest, before any work is
/// queued for them.
fn validate(req: &HashNameRequest) -> Result<(), Error> {
    let len = req.desired_name.len();
    if len > DIGEST_LEN {
        return Err(Error::InvalidRequest {
            reason: format!(
                "Desired name of {len} bytes exceeds the digest length ({DIGEST_LEN})"
            ),
        });
    }
    Ok(())
}

#[tonic::async_trait]
impl HashFinder for HashFinderService {
    type FindRangeStream = Pin<Box<dyn Stream<Item = Result<HashNameResponse, Status>> + Send>>;

    /// Runs a search to its end and returns the last match.
    ///
    /// If `tracing` is enabled, each call gets its own span.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(name = %req.get_ref().desired_name)))]
    async fn find(
        &self,
        req: Request<HashNameRequest>,
    ) -> Result<Response<HashNameResponse>, Status> {
        let req = req.into_inner();
        validate(&req).inspect_err(|_| increment_errors(Rpc::Find))?;
        let params = SearchParams::from(req);
        let inflight = self
            .worker_pool
            .begin_search(Rpc::Find)
            .inspect_err(|_| increment_errors(Rpc::Find))?;
        increment_requests(Rpc::Find);

        let cancel = CancelFlag::new();
        // Dropped with this future, including when the client goes away.
        let _guard = cancel.drop_guard();

        match run_best(&self.worker_pool, params, cancel.clone(), inflight).await {
            Ok(completion) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Search ended: {:?}", completion.outcome);
                Ok(Response::new(
                    completion.best.map(HashNameResponse::from).unwrap_or_default(),
                ))
            }
            Err(e) => {
                increment_errors(Rpc::Find);
                #[cfg(feature = "tracing")]
                tracing::warn!("Error: {}", e);
                Err(e.into())
            }
        }
    }

    /// Streams every match of a search as it is found.
    ///
    /// The stream holds up to `stream_buffer_size` matches ahead of the
    /// client. A search error is sent as the final item.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(name = %req.get_ref().desired_name)))]
    async fn find_range(
        &self,
        req: Request<HashNameRequest>,
    ) -> Result<Response<Self::FindRangeStream>, Status> {
        let req = req.into_inner();
        validate(&req).inspect_err(|_| increment_errors(Rpc::FindRange))?;
        let params = SearchParams::from(req);
        let inflight = self
            .worker_pool
            .begin_search(Rpc::FindRange)
            .inspect_err(|_| increment_errors(Rpc::FindRange))?;
        increment_requests(Rpc::FindRange);

        let cancel = CancelFlag::new();
        let guard = cancel.drop_guard();

        let (resp_tx, resp_rx) = mpsc::channel::<Result<HashNameResponse, Status>>(
            self.config.stream_buffer_size,
        );

        let worker_pool = Arc::clone(&self.worker_pool);
        let fut = async move {
            if let Err(_e) = feed_matches(&worker_pool, params, cancel, inflight, resp_tx).await {
                #[cfg(feature = "tracing")]
                tracing::warn!("Error: {}", _e);
            }
        };
        #[cfg(feature = "tracing")]
        let fut = {
            use tracing::Instrument;
            fut.instrument(tracing::info_span!("streaming"))
        };

        tokio::spawn(fut);

        let stream = ReceiverStream::new(resp_rx).inspect_err(|_e| {
            increment_errors(Rpc::FindRange);
        });

        Ok(Response::new(Box::pin(CancellableStream::new(stream, guard))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    fn named(desired_name: String) -> HashNameRequest {
        HashNameRequest {
            desired_name,
            ..HashNameRequest::default()
        }
    }

    #[test]
    fn names_up_to_the_digest_length_are_accepted() {
        assert!(validate(&named(String::new())).is_ok());
        assert!(validate(&named("a".repeat(DIGEST_LEN))).is_ok());
    }

    #[test]
    fn longer_names_are_invalid_requests() {
        let err = validate(&named("a".repeat(DIGEST_LEN + 1))).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }));
        let status = Status::from(err);
        assert_eq!(status.code(), Code::InvalidArgument);
        assert!(status.message().contains("29 bytes"));
    }
}
