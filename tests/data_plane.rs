//! Live-socket tests of the data-plane handshake and the dispatch worker,
//! using ephemeral-port listeners on the loopback interface.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};

use refuge_server::activity_log::ActivityLog;
use refuge_server::config::Config;
use refuge_server::context::ServerContext;
use refuge_server::dataplane;
use refuge_server::db::KvStore;
use refuge_server::dispatch::{self, DispatchJob};
use refuge_server::pipeline::{Artifact, ArtifactState};
use refuge_server::services::{SessionRegistry, SupplyService};

struct TestServer {
    ctx: Arc<ServerContext>,
    dispatch_rx: Option<tokio::sync::mpsc::UnboundedReceiver<DispatchJob>>,
    _log_dir: tempfile::TempDir,
}

fn test_server() -> TestServer {
    let log_dir = tempfile::tempdir().unwrap();
    let activity_log = ActivityLog::create(log_dir.path().join("refuge.log")).unwrap();
    let supplies = SupplyService::new(KvStore::open_in_memory().unwrap()).unwrap();
    let (dispatch_tx, dispatch_rx) = dispatch::channel();

    let ctx = Arc::new(ServerContext {
        config: Config::default(),
        registry: SessionRegistry::new(),
        supplies,
        artifact: ArtifactState::new(),
        dispatch: dispatch_tx,
        activity_log,
    });
    TestServer {
        ctx,
        dispatch_rx: Some(dispatch_rx),
        _log_dir: log_dir,
    }
}

/// Bind an ephemeral data-plane listener and serve it in the background.
async fn spawn_data_plane(ctx: Arc<ServerContext>) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(dataplane::serve(ctx, listener));
    addr
}

/// Connect and complete the client side of the handshake: read the 8-byte
/// size, reply with the token.
async fn handshake(addr: std::net::SocketAddr, token: &str) -> (TcpStream, u64) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut size_buf = [0u8; 8];
    stream.read_exact(&mut size_buf).await.unwrap();
    stream.write_all(token.as_bytes()).await.unwrap();
    (stream, u64::from_ne_bytes(size_buf))
}

/// Poll until the registry has a socket for the token.
async fn wait_for_socket(ctx: &Arc<ServerContext>, token: &str) {
    for _ in 0..100 {
        if ctx.registry.socket_from_token(token).is_some() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("socket was never registered for token {token}");
}

#[tokio::test]
async fn handshake_advertises_the_size_and_registers_the_socket() {
    let server = test_server();
    let artifact_bytes: Vec<u8> = (0..=255u8).collect();
    server
        .ctx
        .artifact
        .publish(Artifact::from_bytes(&artifact_bytes, 100));
    server.ctx.registry.add_user("UBUNTU", "TOKENA", true);

    let addr = spawn_data_plane(server.ctx.clone()).await;
    let (_stream, advertised) = handshake(addr, "TOKENA").await;

    assert_eq!(advertised, 256);
    wait_for_socket(&server.ctx, "TOKENA").await;
}

#[tokio::test]
async fn handshake_waits_for_artifact_readiness() {
    let server = test_server();
    server.ctx.registry.add_user("UBUNTU", "TOKENA", true);
    let addr = spawn_data_plane(server.ctx.clone()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut size_buf = [0u8; 8];

    // Before readiness nothing is advertised.
    let early = timeout(Duration::from_millis(100), stream.read_exact(&mut size_buf)).await;
    assert!(early.is_err(), "size must not be sent before readiness");

    server.ctx.artifact.publish(Artifact::from_bytes(&[7; 42], 10));

    timeout(Duration::from_secs(2), stream.read_exact(&mut size_buf))
        .await
        .expect("size should arrive after readiness")
        .unwrap();
    assert_eq!(u64::from_ne_bytes(size_buf), 42);
}

#[tokio::test]
async fn unknown_token_handshake_registers_nothing() {
    let server = test_server();
    server.ctx.artifact.publish(Artifact::from_bytes(&[1; 8], 4));

    let addr = spawn_data_plane(server.ctx.clone()).await;
    let (_stream, _) = handshake(addr, "NEVERISSUED").await;

    sleep(Duration::from_millis(100)).await;
    assert!(server.ctx.registry.socket_from_token("NEVERISSUED").is_none());
}

#[tokio::test]
async fn dispatched_artifact_arrives_in_order_and_in_full() {
    let mut server = test_server();
    let artifact_bytes: Vec<u8> = (0..1000u32).map(|v| (v % 251) as u8).collect();
    server
        .ctx
        .artifact
        .publish(Artifact::from_bytes(&artifact_bytes, 64));
    server.ctx.registry.add_user("UBUNTU", "TOKENA", true);

    let addr = spawn_data_plane(server.ctx.clone()).await;
    tokio::spawn(dispatch::run_worker(
        server.ctx.clone(),
        server.dispatch_rx.take().unwrap(),
    ));

    let (mut stream, advertised) = handshake(addr, "TOKENA").await;
    wait_for_socket(&server.ctx, "TOKENA").await;

    // Two transfers enqueued back to back: the FIFO worker serializes
    // them, so the stream carries the artifact exactly twice.
    for _ in 0..2 {
        let socket = server.ctx.registry.socket_from_token("TOKENA").unwrap();
        server
            .ctx
            .dispatch
            .send(DispatchJob {
                socket,
                token: "TOKENA".to_string(),
            })
            .unwrap();
    }

    let mut received = vec![0u8; advertised as usize * 2];
    timeout(Duration::from_secs(5), stream.read_exact(&mut received))
        .await
        .expect("both transfers should complete")
        .unwrap();

    assert_eq!(&received[..artifact_bytes.len()], &artifact_bytes[..]);
    assert_eq!(&received[artifact_bytes.len()..], &artifact_bytes[..]);
}

#[tokio::test]
async fn a_failed_job_does_not_take_down_the_worker() {
    let mut server = test_server();
    // Large enough to overflow socket buffers and surface a write error
    // once the peer is gone.
    let artifact_bytes = vec![9u8; 4 * 1024 * 1024];
    server
        .ctx
        .artifact
        .publish(Artifact::from_bytes(&artifact_bytes, 64 * 1024));
    server.ctx.registry.add_user("dead", "TOKENDEAD", false);
    server.ctx.registry.add_user("live", "TOKENLIVE", false);

    let addr = spawn_data_plane(server.ctx.clone()).await;
    tokio::spawn(dispatch::run_worker(
        server.ctx.clone(),
        server.dispatch_rx.take().unwrap(),
    ));

    // First connection handshakes and immediately goes away.
    let (dead_stream, _) = handshake(addr, "TOKENDEAD").await;
    wait_for_socket(&server.ctx, "TOKENDEAD").await;
    drop(dead_stream);
    sleep(Duration::from_millis(50)).await;

    let (mut live_stream, advertised) = handshake(addr, "TOKENLIVE").await;
    wait_for_socket(&server.ctx, "TOKENLIVE").await;

    for token in ["TOKENDEAD", "TOKENLIVE"] {
        let socket = server.ctx.registry.socket_from_token(token).unwrap();
        server
            .ctx
            .dispatch
            .send(DispatchJob {
                socket,
                token: token.to_string(),
            })
            .unwrap();
    }

    // The dead job errors out; the live one must still be served in full.
    let mut received = vec![0u8; advertised as usize];
    timeout(Duration::from_secs(10), live_stream.read_exact(&mut received))
        .await
        .expect("the worker should survive the failed job")
        .unwrap();
    assert_eq!(received, artifact_bytes);
}
