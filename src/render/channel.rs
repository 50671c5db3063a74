use thiserror::Error;

/// Failures talking to the rendering engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Render host failed to start: {0}")]
    Launch(String),
    #[error("IPC failure: {0}")]
    Ipc(String),
    #[error("Render host is not connected yet")]
    NotConnected,
    #[error("Render channel is closed")]
    Closed,
}

/// Something the engine reported, delivered on the event receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The engine finished loading and accepts submissions.
    Ready,
    Rendered { formula: String, markup: Vec<u8> },
    Failed { formula: String, message: String },
    /// The engine went away; nothing else will arrive.
    Closed,
}

/// Fire-and-forget submission side of a rendering engine.
///
/// Implementations never block waiting for a result. Results and readiness
/// arrive later as [`ChannelEvent`]s, in submission order.
pub trait RenderChannel {
    fn submit(&mut self, formula: &str) -> Result<(), ChannelError>;
}

impl<C: RenderChannel + ?Sized> RenderChannel for Box<C> {
    fn submit(&mut self, formula: &str) -> Result<(), ChannelError> {
        (**self).submit(formula)
    }
}
