use crate::server::telemetry::{
    Rpc, increment_candidates_evaluated, increment_matches_emitted, increment_searches_cancelled,
    record_search_duration,
};
use hashfind_tonic_core::{
    Error,
    hashfind::{CancelFlag, Completion, Outcome, Search, SearchEvent, SearchParams},
    proto::HashNameResponse,
    types::Hasher,
};
use tokio::{
    runtime::Handle,
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// What a finished search reports back to its worker for metrics.
#[derive(Debug)]
struct Tally {
    /// `None` when the search failed.
    outcome: Option<Outcome>,
    evaluated: u64,
    emitted: u64,
}

impl Tally {
    fn record(&self, rpc: Rpc, started: std::time::Instant) {
        increment_candidates_evaluated(rpc, self.evaluated);
        increment_matches_emitted(rpc, self.emitted);
        if self.outcome == Some(Outcome::Cancelled) {
            increment_searches_cancelled(rpc);
        }
        record_search_duration(rpc, started.elapsed().as_secs_f64() * 1000.0);
    }
}

/// Waits for a blocking search, setting its flag if the pool starts shutting
/// down first.
///
/// The search only observes the flag between candidates, so this still waits
/// for the task to return after cancelling it.
async fn supervise<T>(
    mut task: JoinHandle<T>,
    cancel: &CancelFlag,
    shutdown_token: &CancellationToken,
) -> Result<T, Error> {
    let joined = tokio::select! {
        joined = &mut task => joined,
        () = shutdown_token.cancelled() => {
            cancel.cancel();
            task.await
        }
    };
    joined.map_err(|e| Error::ChannelError {
        context: format!("search task failed: {e}"),
    })
}

/// Sends one item from the blocking search thread.
///
/// Waits while the client is behind, but gives up as soon as the pool starts
/// shutting down, so a client that stops reading cannot pin the worker.
/// Returns `false` if the item was not delivered.
fn forward(
    runtime: &Handle,
    matches: &mpsc::Sender<Result<HashNameResponse, Status>>,
    item: Result<HashNameResponse, Status>,
    shutdown_token: &CancellationToken,
) -> bool {
    runtime.block_on(async {
        tokio::select! {
            sent = matches.send(item) => sent.is_ok(),
            () = shutdown_token.cancelled() => false,
        }
    })
}

/// Runs a search to its end and replies with the last match it produced.
///
/// The reply is dropped silently if the caller has gone away; in that case
/// its drop guard has already set `cancel` and the search ends at the next
/// candidate.
#[allow(clippy::used_underscore_binding)]
pub async fn handle_best_request(
    _worker_id: usize,
    params: SearchParams,
    cancel: CancelFlag,
    response: oneshot::Sender<Result<Completion, Error>>,
    shutdown_token: &CancellationToken,
) {
    if shutdown_token.is_cancelled() {
        let _ = response.send(Err(Error::ServiceShutdown));
        return;
    }

    let started = std::time::Instant::now();
    let flag = cancel.clone();
    let task = tokio::task::spawn_blocking(move || {
        let mut search = Search::new(params, Hasher::default(), flag);
        let result = search.best();
        let tally = Tally {
            outcome: result.as_ref().ok().map(|c| c.outcome),
            evaluated: search.candidates_evaluated(),
            emitted: result.as_ref().map_or(0, |c| u64::from(c.best.is_some())),
        };
        (result, tally)
    });

    let reply = match supervise(task, &cancel, shutdown_token).await {
        Ok((result, tally)) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "Worker {_worker_id} finished search: {:?} after {} candidates",
                tally.outcome,
                tally.evaluated
            );
            tally.record(Rpc::Find, started);
            result.map_err(Error::from)
        }
        Err(e) => Err(e),
    };

    if response.send(reply).is_err() {
        #[cfg(feature = "tracing")]
        tracing::debug!("Worker {_worker_id} result dropped, caller went away");
    }
}

/// Runs a search and forwards each match to `matches` as soon as it is found.
///
/// `matches` has a small capacity, so the search thread waits while the
/// client is behind. If the receiving stream is dropped or the pool shuts
/// down, the send is abandoned, the flag is set, and the search finishes as
/// cancelled. An error from the search is forwarded as the final item. Dropping `matches` when the task returns
/// ends the response stream.
#[allow(clippy::used_underscore_binding)]
pub async fn handle_stream_request(
    _worker_id: usize,
    params: SearchParams,
    cancel: CancelFlag,
    matches: mpsc::Sender<Result<HashNameResponse, Status>>,
    shutdown_token: &CancellationToken,
) {
    if shutdown_token.is_cancelled() {
        let _ = matches.send(Err(Error::ServiceShutdown.into())).await;
        return;
    }

    let started = std::time::Instant::now();
    let flag = cancel.clone();
    let runtime = Handle::current();
    let shutdown = shutdown_token.clone();
    let task = tokio::task::spawn_blocking(move || {
        let mut search = Search::new(params, Hasher::default(), flag.clone());
        let mut emitted = 0;
        let mut outcome = None;

        for event in search.by_ref() {
            match event {
                Ok(SearchEvent::Match(m)) => {
                    if forward(&runtime, &matches, Ok(m.into()), &shutdown) {
                        emitted += 1;
                    } else {
                        flag.cancel();
                    }
                }
                Ok(SearchEvent::Finished(done)) => outcome = Some(done),
                Err(e) => {
                    forward(&runtime, &matches, Err(Error::from(e).into()), &shutdown);
                }
            }
        }

        Tally {
            outcome,
            evaluated: search.candidates_evaluated(),
            emitted,
        }
    });

    match supervise(task, &cancel, shutdown_token).await {
        Ok(tally) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "Worker {_worker_id} finished streaming search: {:?} after {} candidates, {} matches",
                tally.outcome,
                tally.evaluated,
                tally.emitted
            );
            tally.record(Rpc::FindRange, started);
        }
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::error!("Worker {_worker_id} lost its streaming search: {_e}");
        }
    }
}
