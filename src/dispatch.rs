use std::io;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::context::ServerContext;
use crate::models::session::SharedSocket;
use crate::pipeline::Artifact;

/// A pending artifact send: the session's data-plane socket and its token.
pub struct DispatchJob {
    pub socket: SharedSocket,
    pub token: String,
}

/// Create the dispatch queue. Jobs are enqueued by the control plane and
/// drained strictly FIFO by the single worker.
pub fn channel() -> (
    mpsc::UnboundedSender<DispatchJob>,
    mpsc::UnboundedReceiver<DispatchJob>,
) {
    mpsc::unbounded_channel()
}

/// The single dispatch worker.
///
/// One job is fully completed (all chunks sent, or a terminal socket
/// error) before the next starts. The readiness wait makes the worker safe
/// regardless of caller ordering, even though the control plane only
/// enqueues after readiness.
pub async fn run_worker(ctx: Arc<ServerContext>, mut queue: mpsc::UnboundedReceiver<DispatchJob>) {
    while let Some(job) = queue.recv().await {
        ctx.artifact.wait_ready().await;
        let Some(artifact) = ctx.artifact.get() else {
            // Readiness implies a published artifact.
            error!("dispatch worker woke without an artifact, dropping job");
            continue;
        };

        if let Err(e) = send_chunks(&job, &artifact).await {
            // The job dies, the worker and the queued jobs behind it survive.
            error!("error sending artifact for token {}: {e}", job.token);
        }
    }
}

/// Stream the artifact's chunks over the job's socket, capping the
/// cumulative bytes at the artifact's advertised total size.
async fn send_chunks(job: &DispatchJob, artifact: &Artifact) -> io::Result<()> {
    if artifact.chunks.is_empty() {
        error!("artifact chunks are empty, nothing to send");
        return Ok(());
    }

    let mut socket = job.socket.lock().await;
    let mut sent_total: u64 = 0;

    'chunks: for chunk in &artifact.chunks {
        let mut offset = 0;
        while offset < chunk.len() {
            if sent_total >= artifact.total_size {
                break 'chunks;
            }
            let written = socket.write(&chunk[offset..]).await?;
            if written == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "socket closed mid-chunk",
                ));
            }
            offset += written;
            sent_total += written as u64;
        }
    }
    socket.flush().await?;

    info!("finished sending {sent_total} artifact bytes to token {}", job.token);
    Ok(())
}
