//! The side channel a turn writes to.
//!
//! Model tokens and debug events are multiplexed onto one ordered frame
//! sequence. The order frames are written in is the order the caller
//! observes them.

use ccore::DebugEvent;
use tokio::sync::mpsc;

/// One unit of turn output.
#[derive(Debug, Clone)]
pub enum Frame {
    /// A text token of the model.
    Text(String),
    /// A structured debug event.
    Event(DebugEvent),
    /// A fatal turn error.
    Error(String),
}

impl Frame {
    /// Encode the frame as one line of the data-stream protocol.
    ///
    /// `0:` carries text, `2:` a one-element event array and `3:` an error,
    /// each followed by its JSON payload and a newline.
    pub fn encode(&self) -> serde_json::Result<String> {
        let (code, payload) = match self {
            Self::Text(text) => ('0', serde_json::to_string(text)?),
            Self::Event(event) => ('2', serde_json::to_string(&[event])?),
            Self::Error(error) => ('3', serde_json::to_string(error)?),
        };
        Ok(format!("{code}:{payload}\n"))
    }
}

/// The caller went away; the turn should be abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("caller disconnected")]
pub struct Disconnected;

/// Sending half of a turn's output.
///
/// Closing consumes the channel, so it is closed at most once and nothing
/// can be written after it.
#[derive(Debug)]
pub struct SideChannel {
    tx: mpsc::UnboundedSender<Frame>,
}

/// Create a side channel and the receiver the caller drains.
pub fn channel() -> (SideChannel, mpsc::UnboundedReceiver<Frame>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SideChannel { tx }, rx)
}

impl SideChannel {
    /// Forward a text token.
    pub fn text(&self, text: impl Into<String>) -> Result<(), Disconnected> {
        self.send(Frame::Text(text.into()))
    }

    /// Write a debug event.
    pub fn event(&self, event: DebugEvent) -> Result<(), Disconnected> {
        self.send(Frame::Event(event))
    }

    /// Write a fatal error.
    pub fn error(&self, error: impl Into<String>) -> Result<(), Disconnected> {
        self.send(Frame::Error(error.into()))
    }

    /// Resolves once the caller dropped the receiver.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    /// Whether the caller dropped the receiver.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Close the channel, ending the output.
    pub fn close(self) {
        tracing::trace!("side channel closed");
    }

    fn send(&self, frame: Frame) -> Result<(), Disconnected> {
        self.tx.send(frame).map_err(|_| Disconnected)
    }
}
