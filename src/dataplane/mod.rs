use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::context::ServerContext;

/// Size of the identity payload read from a connecting client.
const CLIENT_BUFFER: usize = 2048;

/// Bind the data-plane listener and serve it.
///
/// A handshake or send error terminates only that connection's task; the
/// accept loop itself only fails at bind time.
pub async fn run(ctx: Arc<ServerContext>) -> std::io::Result<()> {
    let addr = ctx.config.data_plane_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("data plane listening on {addr}");
    serve(ctx, listener).await
}

/// Accept loop over an already-bound listener: one task per connection.
pub async fn serve(ctx: Arc<ServerContext>, listener: TcpListener) -> std::io::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!("data-plane connection from {peer}");
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(ctx, stream).await {
                        error!("data-plane connection from {peer} failed: {e}");
                    }
                });
            }
            Err(e) => {
                error!("data-plane accept failed: {e}");
            }
        }
    }
}

/// Per-connection handshake.
///
/// Waits for artifact readiness before advertising the size, so the
/// 8-byte value is always measured from the finished compressed artifact.
/// Then reads the client's token and registers the write half as that
/// session's socket; the last registrant for a token wins, and an unknown
/// token is a silent no-op.
async fn handle_connection(ctx: Arc<ServerContext>, stream: TcpStream) -> std::io::Result<()> {
    ctx.artifact.wait_ready().await;
    let total_size = ctx.artifact.get().map_or(0, |a| a.total_size);

    let (mut read_half, mut write_half) = stream.into_split();
    write_half.write_all(&total_size.to_ne_bytes()).await?;

    let mut buffer = vec![0u8; CLIENT_BUFFER];
    let read = read_half.read(&mut buffer).await?;
    if read == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "client closed before sending its token",
        ));
    }

    let token = String::from_utf8_lossy(&buffer[..read])
        .trim_end_matches('\0')
        .trim()
        .to_string();
    ctx.registry
        .update_socket(&token, Arc::new(Mutex::new(write_half)));
    info!("data-plane socket registered for token {token}");

    // The write half now lives in the registry for the dispatch worker;
    // nothing more arrives from the client on this connection.
    Ok(())
}
