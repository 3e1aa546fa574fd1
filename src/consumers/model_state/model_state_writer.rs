use crate::error::{MlStateError, SourceError};
use crate::message::Message;
use crate::ml::ModelState;
use crate::producer::TupleWriter;
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

/// A [`TupleWriter`] that writes payloads into a [`ModelState`].
///
/// A terminated state answers [`SourceError::Stopped`] so the source feeding
/// it halts. Any other failure, a failed fit included, is reported as
/// [`SourceError::Write`] and left to the source's error strategy.
#[derive(Debug)]
pub struct ModelStateWriter {
  state: Arc<ModelState>,
  written: usize,
}

impl ModelStateWriter {
  /// Creates a writer over `state`.
  pub fn new(state: Arc<ModelState>) -> Self {
    Self { state, written: 0 }
  }

  /// Records accepted so far.
  pub fn written(&self) -> usize {
    self.written
  }

  /// The state written into.
  pub fn state(&self) -> &Arc<ModelState> {
    &self.state
  }
}

impl<T: Serialize> TupleWriter<T> for ModelStateWriter {
  fn write(&mut self, message: Message<T>) -> Result<(), SourceError> {
    let record =
      serde_json::to_value(message.payload()).map_err(|e| SourceError::Write(e.to_string()))?;
    match self.state.write(record) {
      Ok(()) => {
        self.written += 1;
        trace!(sequence = message.sequence(), "record written to model state");
        Ok(())
      }
      Err(MlStateError::Terminated) => Err(SourceError::Stopped),
      Err(error) => Err(SourceError::Write(error.to_string())),
    }
  }
}
