use std::sync::{Arc, RwLock};

use tokio::sync::watch;

/// The compressed artifact, split into ordered chunks.
#[derive(Debug)]
pub struct Artifact {
    /// Fixed-size byte chunks; the last one may be shorter.
    pub chunks: Vec<Vec<u8>>,
    /// Byte length of the compressed file the chunks were read from.
    pub total_size: u64,
}

impl Artifact {
    /// Split `bytes` into `chunk_size`-sized chunks.
    pub fn from_bytes(bytes: &[u8], chunk_size: usize) -> Self {
        let chunks = bytes.chunks(chunk_size).map(<[u8]>::to_vec).collect();
        Self {
            chunks,
            total_size: bytes.len() as u64,
        }
    }
}

/// Shared artifact slot with a single-fire readiness signal.
///
/// `ready` transitions false -> true exactly once per server run and is
/// never reset. Waiters observe the transition through a watch channel, so
/// a publish wakes every task blocked in [`wait_ready`](Self::wait_ready).
#[derive(Debug)]
pub struct ArtifactState {
    ready_tx: watch::Sender<bool>,
    data: RwLock<Option<Arc<Artifact>>>,
}

impl Default for ArtifactState {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactState {
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            ready_tx,
            data: RwLock::new(None),
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }

    /// Store the artifact and fire the readiness signal.
    pub fn publish(&self, artifact: Artifact) {
        {
            let mut slot = self
                .data
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *slot = Some(Arc::new(artifact));
        }
        self.ready_tx.send_replace(true);
    }

    /// Block until the artifact has been published. Returns immediately
    /// once readiness has fired; the signal is never reset.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready_tx.subscribe();
        // The sender lives inside self, so the channel cannot close here.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    pub fn get(&self) -> Option<Arc<Artifact>> {
        self.data
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn chunking_covers_the_input_exactly() {
        let bytes: Vec<u8> = (0..10u8).collect();
        let artifact = Artifact::from_bytes(&bytes, 4);

        assert_eq!(artifact.total_size, 10);
        assert_eq!(artifact.chunks.len(), 3);
        assert_eq!(artifact.chunks[0], vec![0, 1, 2, 3]);
        assert_eq!(artifact.chunks[1], vec![4, 5, 6, 7]);
        // Final chunk is shorter.
        assert_eq!(artifact.chunks[2], vec![8, 9]);
    }

    #[test]
    fn chunking_an_exact_multiple_has_no_short_tail() {
        let artifact = Artifact::from_bytes(&[1, 2, 3, 4], 2);
        assert_eq!(artifact.chunks.len(), 2);
        assert!(artifact.chunks.iter().all(|c| c.len() == 2));
    }

    #[tokio::test]
    async fn wait_ready_wakes_on_publish() {
        let state = Arc::new(ArtifactState::new());
        assert!(!state.is_ready());
        assert!(state.get().is_none());

        let waiter = {
            let state = state.clone();
            tokio::spawn(async move {
                state.wait_ready().await;
                state.get().map(|a| a.total_size)
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        state.publish(Artifact::from_bytes(&[0; 5], 2));

        assert_eq!(waiter.await.unwrap(), Some(5));
        assert!(state.is_ready());
    }

    #[tokio::test]
    async fn wait_ready_after_publish_returns_immediately() {
        let state = ArtifactState::new();
        state.publish(Artifact::from_bytes(&[1], 1));
        state.wait_ready().await;
        state.wait_ready().await;
    }
}
