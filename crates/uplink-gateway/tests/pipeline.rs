//! End-to-end pipeline tests: a real gateway server in front of a
//! stubbed satellite host, driven over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;

use uplink_fetch::SatelliteFetcher;
use uplink_gateway::{Gateway, GatewayServer};
use uplink_runtime::{SatelliteEngine, ScriptCache};

/// Satellite host stub: serves `response` verbatim to every connection
/// and counts the requests it answers.
async fn script_host(
    response: String,
    delay: Duration,
) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let response = response.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let mut head = Vec::new();
                loop {
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        return;
                    }
                    head.extend_from_slice(&buf[..n]);
                    if head.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, hits)
}

fn script_response(source: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        source.len(),
        source
    )
}

/// Start a gateway on an ephemeral port. The returned sender keeps the
/// server alive; dropping it shuts the server down.
async fn start_gateway(cache_capacity: usize) -> (SocketAddr, watch::Sender<bool>) {
    let gateway = Arc::new(Gateway::new(
        ScriptCache::new(cache_capacity).unwrap(),
        SatelliteFetcher::new(128 * 1024, Duration::from_secs(5)).unwrap(),
        SatelliteEngine::new(),
    ));
    let server = GatewayServer::bind("127.0.0.1:0".parse().unwrap(), gateway)
        .await
        .unwrap();
    let addr = server.local_addr();
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move { server.serve(rx).await });
    (addr, tx)
}

#[tokio::test]
async fn repeated_requests_fetch_and_compile_once() {
    let (host, hits) =
        script_host(script_response(r#"#{ status: 201, body: "ok" }"#), Duration::ZERO).await;
    let (gateway, _shutdown) = start_gateway(16).await;
    let client = reqwest::Client::new();

    for _ in 0..3 {
        let res = client
            .get(format!("http://{gateway}/launch"))
            .header("X-Satellite-Location", format!("http://{host}/sat"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 201);
        assert_eq!(res.text().await.unwrap(), "ok");
    }

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_location_header_is_reported() {
    let (gateway, _shutdown) = start_gateway(16).await;
    let res = reqwest::Client::new()
        .get(format!("http://{gateway}/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(
        res.text().await.unwrap(),
        "no X-Satellite-Location header found"
    );
}

#[tokio::test]
async fn status_defaults_to_200() {
    let (host, _) =
        script_host(script_response(r#"#{ body: "hello" }"#), Duration::ZERO).await;
    let (gateway, _shutdown) = start_gateway(16).await;

    let res = reqwest::Client::new()
        .get(format!("http://{gateway}/"))
        .header("X-Satellite-Location", format!("http://{host}/sat"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.text().await.unwrap(), "hello");
}

#[tokio::test]
async fn unrecognized_status_is_rejected() {
    let (host, _) = script_host(script_response("#{ status: 999 }"), Duration::ZERO).await;
    let (gateway, _shutdown) = start_gateway(16).await;

    let res = reqwest::Client::new()
        .get(format!("http://{gateway}/"))
        .header("X-Satellite-Location", format!("http://{host}/sat"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert!(res.text().await.unwrap().contains("invalid status code: 999"));
}

#[tokio::test]
async fn satellite_headers_reach_the_response() {
    let source = r#"#{ body: "tagged", headers: #{ "x-satellite": ["relay-1"] } }"#;
    let (host, _) = script_host(script_response(source), Duration::ZERO).await;
    let (gateway, _shutdown) = start_gateway(16).await;

    let res = reqwest::Client::new()
        .get(format!("http://{gateway}/"))
        .header("X-Satellite-Location", format!("http://{host}/sat"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["x-satellite"], "relay-1");
    assert_eq!(res.text().await.unwrap(), "tagged");
}

#[tokio::test]
async fn request_context_is_visible_to_satellites() {
    let source = r#"#{ body: method + " " + url.path }"#;
    let (host, _) = script_host(script_response(source), Duration::ZERO).await;
    let (gateway, _shutdown) = start_gateway(16).await;

    let res = reqwest::Client::new()
        .get(format!("http://{gateway}/probe"))
        .header("X-Satellite-Location", format!("http://{host}/sat"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "GET /probe");
}

#[tokio::test]
async fn oversized_satellite_is_rejected() {
    let response =
        "HTTP/1.1 200 OK\r\nContent-Length: 200000\r\nConnection: close\r\n\r\n".to_string();
    let (host, _) = script_host(response, Duration::ZERO).await;
    let (gateway, _shutdown) = start_gateway(16).await;

    let res = reqwest::Client::new()
        .get(format!("http://{gateway}/"))
        .header("X-Satellite-Location", format!("http://{host}/sat"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body = res.text().await.unwrap();
    assert!(body.contains("satellite too large"));
    assert!(body.contains("131072"));
}

#[tokio::test]
async fn compile_failures_are_reported() {
    let (host, _) = script_host(script_response("#{ status: "), Duration::ZERO).await;
    let (gateway, _shutdown) = start_gateway(16).await;

    let res = reqwest::Client::new()
        .get(format!("http://{gateway}/"))
        .header("X-Satellite-Location", format!("http://{host}/sat"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert!(
        res.text()
            .await
            .unwrap()
            .starts_with("error compiling satellite:")
    );
}

#[tokio::test]
async fn runtime_failures_are_reported() {
    let (host, _) = script_host(
        script_response("#{ body: no_such_binding }"),
        Duration::ZERO,
    )
    .await;
    let (gateway, _shutdown) = start_gateway(16).await;

    let res = reqwest::Client::new()
        .get(format!("http://{gateway}/"))
        .header("X-Satellite-Location", format!("http://{host}/sat"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert!(
        res.text()
            .await
            .unwrap()
            .starts_with("error running satellite:")
    );
}

#[tokio::test]
async fn non_map_results_are_decode_errors() {
    let (host, _) = script_host(script_response(r#""just a string""#), Duration::ZERO).await;
    let (gateway, _shutdown) = start_gateway(16).await;

    let res = reqwest::Client::new()
        .get(format!("http://{gateway}/"))
        .header("X-Satellite-Location", format!("http://{host}/sat"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body = res.text().await.unwrap();
    assert!(body.starts_with("error decoding satellite result:"));
    assert!(body.contains("expected a map, got string"));
}

#[tokio::test]
async fn concurrent_first_requests_leave_a_consistent_cache() {
    // A slow satellite host widens the window in which several request
    // tasks all miss and resolve independently.
    let (host, hits) = script_host(
        script_response(r#"#{ body: "raced" }"#),
        Duration::from_millis(50),
    )
    .await;
    let (gateway, _shutdown) = start_gateway(16).await;
    let client = reqwest::Client::new();

    let requests: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            let url = format!("http://{gateway}/race");
            let location = format!("http://{host}/sat");
            tokio::spawn(async move {
                client
                    .get(url)
                    .header("X-Satellite-Location", location)
                    .send()
                    .await
                    .unwrap()
            })
        })
        .collect();

    for request in requests {
        let res = request.await.unwrap();
        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(res.text().await.unwrap(), "raced");
    }

    // Every racer may have fetched independently, but no more than that.
    assert!((1..=4).contains(&hits.load(Ordering::SeqCst)));

    // The cache is warm and consistent afterwards.
    let before = hits.load(Ordering::SeqCst);
    let res = client
        .get(format!("http://{gateway}/after"))
        .header("X-Satellite-Location", format!("http://{host}/sat"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "raced");
    assert_eq!(hits.load(Ordering::SeqCst), before);
}
