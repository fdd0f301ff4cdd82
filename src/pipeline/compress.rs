use std::path::Path;

use tokio::process::Command;
use tracing::info;

use crate::error::PipelineError;

/// Compress `input` into a `.tar.gz` at `output` via the external `tar`
/// collaborator. The contract is path in -> compressed path out; a
/// non-zero exit status is a failure.
pub async fn compress_image(input: &Path, output: &Path) -> Result<(), PipelineError> {
    info!("starting to compress {}", input.display());

    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    let file_name = input
        .file_name()
        .ok_or_else(|| PipelineError::Io(std::io::Error::other("input path has no file name")))?;

    let status = Command::new("tar")
        .arg("-czf")
        .arg(output)
        .arg("-C")
        .arg(dir)
        .arg(file_name)
        .status()
        .await?;

    if !status.success() {
        return Err(PipelineError::Compression {
            input: input.to_path_buf(),
            status,
        });
    }

    info!("finished compressing into {}", output.display());
    Ok(())
}
