//! Status Port - Engine Observation and Control
//!
//! Lets the health server observe and drive the engine without
//! holding the engine type itself.

use crate::domain::error::EngineError;
use crate::domain::status::EngineStatus;

/// Anything that can report the current engine status.
pub trait StatusSource: Send + Sync + 'static {
  /// Current snapshot. Must not block.
  fn status(&self) -> EngineStatus;
}

/// Start/stop control on top of status reporting.
pub trait AutomationControl: StatusSource {
  /// Begin the automation loop.
  ///
  /// # Errors
  /// `AlreadyRunning` or `InvalidSettings`.
  fn start(&self) -> Result<(), EngineError>;

  /// Stop the automation loop. No-op when stopped.
  fn stop(&self);
}
