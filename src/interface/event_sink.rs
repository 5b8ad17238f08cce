use crate::interface::ThreadSafe;
use crate::model::event::BackupEvent;
use async_trait::async_trait;

/// Receives lifecycle events from the backup manager.
///
/// Called inline on the pipeline, so implementations must return promptly.
pub trait EventSink: ThreadSafe {
    fn notify(&self, event: BackupEvent);
}

#[async_trait]
pub trait EventListener: ThreadSafe {
    fn name(&self) -> &str;

    async fn handle(&self, event: &BackupEvent);
}
