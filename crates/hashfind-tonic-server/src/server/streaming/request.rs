use crate::server::pool::manager::InflightGuard;
use hashfind_tonic_core::{
    Error,
    hashfind::{CancelFlag, Completion, SearchParams},
    proto::HashNameResponse,
};
use tokio::sync::{mpsc, oneshot};
use tonic::Status;

/// A unit of work sent to a worker.
///
/// Search requests carry the [`CancelFlag`] owned by their call and the
/// [`InflightGuard`] that keeps them counted until the worker lets go of
/// them.
#[derive(Debug)]
pub enum WorkRequest {
    /// Run a search to completion and reply with its last match.
    Best {
        params: SearchParams,
        cancel: CancelFlag,
        response: oneshot::Sender<Result<Completion, Error>>,
        inflight: InflightGuard,
    },
    /// Run a search and forward every match as it is found.
    Stream {
        params: SearchParams,
        cancel: CancelFlag,
        matches: mpsc::Sender<Result<HashNameResponse, Status>>,
        inflight: InflightGuard,
    },
    /// Stop the worker once it has acknowledged on `response`.
    Shutdown { response: oneshot::Sender<()> },
}
