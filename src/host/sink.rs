//! HostSink trait — how events leave the engine
//!
//! The hosting integration supplies the sink at construction. The engine
//! treats delivery failure as non-fatal: an unreachable host must never
//! take down the data pipeline.

use super::events::HostEvent;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("host disconnected")]
    Disconnected,
}

/// The contract host integrations implement.
#[async_trait]
pub trait HostSink: Send + Sync {
    async fn emit(&self, event: HostEvent) -> Result<(), SinkError>;
}

/// Sink backed by an unbounded channel; the integration drains the
/// receiver on its own schedule.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl ChannelSink {
    /// Create the sink and the receiving half the integration consumes.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl HostSink for ChannelSink {
    async fn emit(&self, event: HostEvent) -> Result<(), SinkError> {
        self.tx.send(event).map_err(|_| SinkError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_delivers_events() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(HostEvent::HeaderAction {
            action_name: "export".to_string(),
        })
        .await
        .unwrap();

        match rx.recv().await {
            Some(HostEvent::HeaderAction { action_name }) => assert_eq!(action_name, "export"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn dropped_receiver_reports_disconnect() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        let result = sink
            .emit(HostEvent::HeaderAction {
                action_name: "x".to_string(),
            })
            .await;
        assert!(matches!(result, Err(SinkError::Disconnected)));
    }
}
