//! Formula rendering: the engine channel, the submission queue in front of
//! it, and the out-of-process webview host.

pub mod channel;
pub mod harness;
pub mod host;
pub mod pipeline;
pub mod queue;
pub mod record;
pub mod web_view;

use std::time::Duration;

use thiserror::Error;

pub use channel::{ChannelError, ChannelEvent, RenderChannel};
pub use harness::MathJaxVersion;
pub use pipeline::RenderPipeline;
pub use queue::{Delivery, Purpose, SubmissionQueue};
pub use record::RenderRecord;
pub use web_view::WebViewChannel;

/// Why a single formula did not produce markup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Engine rejected the formula: {0}")]
    Rejected(String),
    #[error("Render timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Render channel closed")]
    ChannelClosed,
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
