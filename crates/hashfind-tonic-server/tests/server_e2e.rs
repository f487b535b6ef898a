use core::time::Duration;
use hashfind_tonic_core::proto::{
    HashNameRequest, HashNameResponse,
    hash_finder_client::HashFinderClient,
    hash_finder_server::{HashFinder, HashFinderServer},
};
use hashfind_tonic_server::server::{config::ServerConfig, service::handler::HashFinderService};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Code, transport::Channel, transport::Server};

/// Long enough for any search that is expected to finish.
const PATIENCE: Duration = Duration::from_secs(30);

/// A name whose ideal match will never be found in a test's lifetime.
const UNREACHABLE: &str = "zzzzzzzzzzzz";

async fn start_server(config: ServerConfig) -> (HashFinderClient<Channel>, HashFinderService) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let service = HashFinderService::new(config);

    let server = Server::builder()
        .add_service(HashFinderServer::new(service.clone()))
        .serve_with_incoming(TcpListenerStream::new(listener));
    tokio::spawn(server);

    let client = HashFinderClient::connect(format!("http://{addr}"))
        .await
        .unwrap();
    (client, service)
}

fn single_worker() -> ServerConfig {
    ServerConfig {
        num_workers: 1,
        shutdown_timeout: 0,
        ..ServerConfig::default()
    }
}

fn request(name: &str, ideal: u32, interesting: Option<u32>) -> HashNameRequest {
    HashNameRequest {
        desired_name: name.to_string(),
        ideal_hamming_distance: ideal,
        interesting_hamming_distance: interesting,
    }
}

fn response(secret: &str, hashed_name: &str, hamming_distance: u32) -> HashNameResponse {
    HashNameResponse {
        secret: secret.to_string(),
        hashed_name: hashed_name.to_string(),
        hamming_distance,
    }
}

/// Asserts that the single worker is free by running a short search on it.
async fn assert_worker_is_free(client: &mut HashFinderClient<Channel>) {
    let found = tokio::time::timeout(PATIENCE, client.find(request("Hi", 0, None)))
        .await
        .expect("worker was not released")
        .unwrap()
        .into_inner();
    assert_eq!(found.secret, "AAw=");
}

#[tokio::test(flavor = "multi_thread")]
async fn find_returns_ideal_match() {
    let (mut client, _service) = start_server(single_worker()).await;

    let found = client
        .find(request("Hi", 0, None))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(found, response("AAw=", "X3ft/TkEIFpHiWOVYl3QWKmWnXg=", 0));
}

#[tokio::test(flavor = "multi_thread")]
async fn find_with_interesting_distance_returns_the_ideal_match() {
    let (mut client, _service) = start_server(single_worker()).await;

    let found = client
        .find(request("hI", 0, Some(1)))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(found, response("AAw=", "X3ft/TkEIFpHiWOVYl3QWKmWnXg=", 0));
}

#[tokio::test(flavor = "multi_thread")]
async fn find_range_streams_interesting_then_ideal() {
    let (mut client, _service) = start_server(single_worker()).await;

    let mut stream = client
        .find_range(request("Hi", 0, Some(1)))
        .await
        .unwrap()
        .into_inner();

    let mut received = Vec::new();
    while let Some(item) = stream.message().await.unwrap() {
        received.push(item);
    }

    let expected = [
        response("AAA=", "FIn5I8TcpykXiz4yM0WFUNjd3yk=", 1),
        response("AAE=", "PylUZFNni4VZMcF0qX1sCJS49UY=", 1),
        response("AAI=", "msUh4y+OGUc7yRThr4rkI6bYwSI=", 1),
        response("AAM=", "bIfolRKZ2KUyFGqTkRBIFGtv4eA=", 1),
        response("AAQ=", "82SIwIMDsqXWk4SzoF+M/ZWj3wA=", 1),
        response("AAU=", "a8iWwcYTgSy5CYnx7pm0bMxpfo8=", 1),
        response("AAc=", "yNZnMeObDT+0fqKHemrYFQ7hRdc=", 1),
        response("AAk=", "5KxK4o6LkYsNIHA/2lSq93Dt0iE=", 1),
        response("AAo=", "SVlL+/OpdiCqXepo1EQLOba+3gQ=", 1),
        response("AAs=", "yZdD2NSLj6Htekyv382LO1efjMs=", 1),
        response("AAw=", "X3ft/TkEIFpHiWOVYl3QWKmWnXg=", 0),
    ];
    assert_eq!(received, expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn name_longer_than_digest_is_invalid_argument() {
    let (mut client, _service) = start_server(single_worker()).await;
    let name = "a".repeat(29);

    let status = client.find(request(&name, 0, None)).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("digest length"));

    let status = client.find_range(request(&name, 0, None)).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    // Rejected calls never reach the worker.
    assert_worker_is_free(&mut client).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn name_as_long_as_digest_is_searched() {
    let (mut client, _service) = start_server(single_worker()).await;

    // Every distance is within 28, so the first candidate ends the search.
    let found = client
        .find(request(&"A".repeat(28), 28, None))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(found.secret, format!("{}==", "A".repeat(38)));
    assert_eq!(found.hashed_name.len(), 28);
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_find_range_stream_releases_the_worker() {
    let (mut client, _service) = start_server(single_worker()).await;

    // Every candidate is interesting, so matches keep coming.
    let mut stream = client
        .find_range(request(UNREACHABLE, 0, Some(12)))
        .await
        .unwrap()
        .into_inner();
    for _ in 0..3 {
        let item = stream.message().await.unwrap().unwrap();
        assert_eq!(item.hashed_name.len(), 28);
    }
    drop(stream);

    assert_worker_is_free(&mut client).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn abandoned_find_releases_the_worker() {
    let (mut client, _service) = start_server(single_worker()).await;

    let abandoned = tokio::time::timeout(
        Duration::from_millis(200),
        client.find(request(UNREACHABLE, 0, None)),
    )
    .await;
    assert!(abandoned.is_err());

    assert_worker_is_free(&mut client).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn deadline_exceeded_find_releases_the_worker() {
    let (mut client, _service) = start_server(single_worker()).await;

    let mut req = tonic::Request::new(request(UNREACHABLE, 0, None));
    req.set_timeout(Duration::from_millis(200));
    let status = client.find(req).await.unwrap_err();
    assert!(
        matches!(status.code(), Code::Cancelled | Code::DeadlineExceeded),
        "unexpected status: {status:?}"
    );

    assert_worker_is_free(&mut client).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_cancels_running_search_and_refuses_new_ones() {
    let (mut client, service) = start_server(single_worker()).await;

    let mut running = client.clone();
    let pending =
        tokio::spawn(async move { running.find(request(UNREACHABLE, 0, Some(12))).await });

    // Give the search time to reach the worker and report a first match.
    tokio::time::sleep(Duration::from_millis(200)).await;
    tokio::time::timeout(PATIENCE, service.shutdown())
        .await
        .unwrap()
        .unwrap();

    // The search was cancelled and its last interesting match returned.
    let best = pending.await.unwrap().unwrap().into_inner();
    assert_eq!(best.hashed_name.len(), 28);

    let status = client.find(request("Hi", 0, None)).await.unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);

    let status = client.find_range(request("Hi", 0, None)).await.unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_releases_worker_blocked_on_unread_stream() {
    let service = HashFinderService::new(single_worker());

    // Every candidate is interesting and nobody reads, so the search stalls
    // as soon as the stream buffer is full.
    let idle = service
        .find_range(tonic::Request::new(request(UNREACHABLE, 0, Some(12))))
        .await
        .unwrap();

    // A second call queues behind the stalled worker.
    let queued = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .find(tonic::Request::new(request("Hi", 0, None)))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Well inside the per-worker acknowledgement timeout.
    tokio::time::timeout(Duration::from_secs(2), service.shutdown())
        .await
        .expect("shutdown waited on the stalled worker")
        .unwrap();

    let status = tokio::time::timeout(PATIENCE, queued)
        .await
        .unwrap()
        .unwrap()
        .unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);
    drop(idle);
}
