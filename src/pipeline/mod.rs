pub mod artifact;
pub mod canny;
pub mod compress;

pub use artifact::{Artifact, ArtifactState};
pub use canny::EdgeDetection;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::context::ServerContext;
use crate::error::PipelineError;

/// Run the artifact pipeline once: edge-detect the configured input image,
/// compress it, split the compressed file into chunks and fire readiness.
///
/// A failure at any stage is logged and abandons only the pipeline; the
/// rest of the server keeps running without a servable artifact.
pub async fn run(ctx: Arc<ServerContext>) {
    match build_artifact(&ctx).await {
        Ok(artifact) => {
            info!(
                "artifact ready: {} bytes in {} chunks",
                artifact.total_size,
                artifact.chunks.len()
            );
            ctx.artifact.publish(artifact);
        }
        Err(e) => {
            error!("artifact pipeline failed: {e}; image requests will not be served");
        }
    }
}

async fn build_artifact(ctx: &ServerContext) -> Result<Artifact, PipelineError> {
    let config = &ctx.config;
    let input = PathBuf::from(&config.image_path);
    let edge_output = PathBuf::from(&config.edge_image_path);
    let compressed = PathBuf::from(&config.compressed_image_path);

    let detector = EdgeDetection::new(
        config.canny_low_threshold,
        config.canny_high_threshold,
        config.canny_sigma,
        config.canny_kernel_size,
    );

    // The detection is pure CPU work; keep it off the async worker threads.
    let started = Instant::now();
    let detect_input = input.clone();
    let detect_output = edge_output.clone();
    tokio::task::spawn_blocking(move || detector.detect(&detect_input, &detect_output)).await??;
    info!(
        "canny edge detection finished in {}ms",
        started.elapsed().as_millis()
    );

    compress::compress_image(&edge_output, &compressed).await?;

    let bytes = tokio::fs::read(&compressed).await?;
    Ok(Artifact::from_bytes(&bytes, config.chunk_size))
}
