//! Activity Sink Port - Event Callback Interface
//!
//! Single-method capability the engine depends on to report what it
//! is doing. Fire-and-forget: `notify` must not block, and any
//! buffering is the sink's responsibility.

use std::sync::Arc;

use crate::domain::activity::ActivityEvent;

/// Receiver of engine activity events, in emission order.
pub trait ActivitySink: Send + Sync + 'static {
  fn notify(&self, event: ActivityEvent);
}

impl<S: ActivitySink + ?Sized> ActivitySink for Arc<S> {
  fn notify(&self, event: ActivityEvent) {
    (**self).notify(event);
  }
}

impl<S: ActivitySink + ?Sized> ActivitySink for Box<S> {
  fn notify(&self, event: ActivityEvent) {
    (**self).notify(event);
  }
}
