use crate::interface::event_sink::{EventListener, EventSink};
use crate::model::event::BackupEvent;
use crate::model::log::event::EventLog;
use async_trait::async_trait;
use macros::log;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Queues events and fans them out to listeners on a background task.
pub struct EventDispatcher {
    sender: Mutex<Option<UnboundedSender<BackupEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EventDispatcher {
    /// Must be called inside a tokio runtime.
    pub fn new(listeners: Vec<Arc<dyn EventListener>>, listener_timeout: Duration) -> Self {
        let (sender, receiver) = unbounded_channel();
        let worker = tokio::spawn(Self::dispatch_loop(receiver, listeners, listener_timeout));
        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    async fn dispatch_loop(
        mut receiver: UnboundedReceiver<BackupEvent>,
        listeners: Vec<Arc<dyn EventListener>>,
        listener_timeout: Duration,
    ) {
        while let Some(event) = receiver.recv().await {
            for listener in &listeners {
                if timeout(listener_timeout, listener.handle(&event)).await.is_err() {
                    log!(
                        EventLog::ListenerTimedOut {
                            kind: event.kind.to_string()
                        },
                        listener.name()
                    );
                }
            }
        }
    }

    /// Stops accepting events and waits until queued ones are delivered.
    pub async fn close(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        let worker = self.worker.lock().ok().and_then(|mut worker| worker.take());
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}

impl EventSink for EventDispatcher {
    fn notify(&self, event: BackupEvent) {
        let sender = self.sender.lock().ok().and_then(|sender| sender.clone());
        let kind = event.kind;
        let delivered = match sender {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        };
        if !delivered {
            log!(EventLog::EventDropped {
                kind: kind.to_string()
            });
        }
    }
}

/// Writes every lifecycle event to the log.
pub struct TracingEventListener;

#[async_trait]
impl EventListener for TracingEventListener {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn handle(&self, event: &BackupEvent) {
        let kind = event.kind.to_string();
        match &event.error {
            Some(error) => log!(EventLog::EventDispatched { kind }, error),
            None => log!(EventLog::EventDispatched { kind }),
        }
    }
}
