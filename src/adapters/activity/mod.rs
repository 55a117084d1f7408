//! Activity Sink Adapters
//!
//! Implementations of the `ActivitySink` port:
//! - `TracingSink`: structured log line per event
//! - `ChannelSink`: unbounded hand-off to a background consumer
//!   (the activity journal)
//! - `FanoutSink`: forwards each event to several sinks in order

pub mod channel;
pub mod fanout;
pub mod tracing_sink;

pub use channel::ChannelSink;
pub use fanout::FanoutSink;
pub use tracing_sink::TracingSink;
