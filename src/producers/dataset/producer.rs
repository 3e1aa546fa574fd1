use super::dataset_producer::{DEFAULT_NAME, DatasetProducer, StreamState};
use crate::dataset::Example;
use crate::message::Message;
use crate::producer::{Producer, ProducerConfig};
use async_stream::stream;
use futures::{Stream, StreamExt};
use scopeguard::ScopeGuard;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info};

impl Producer for DatasetProducer {
  fn produce(&mut self) -> Self::OutputStream {
    let dataset = Arc::clone(&self.dataset);
    let order = self.next_order();
    let stop = self.stop.clone();
    let state = Arc::clone(&self.state);
    let name = self.component_name(DEFAULT_NAME);

    Box::pin(stream! {
      // A stream dropped mid-run leaves the producer Stopped.
      let state = scopeguard::guard(state, |state| state.set(StreamState::Stopped));
      state.set(StreamState::Streaming);
      let total = order.len();
      let mut stopped = false;

      for (sequence, idx) in order.into_iter().enumerate() {
        if stop.is_cancelled() {
          debug!(producer = %name, emitted = sequence, "stop requested, ending run");
          stopped = true;
          break;
        }
        if let Some(example) = dataset.example(idx) {
          yield Message::new(example, sequence as u64);
        }
      }

      let state = ScopeGuard::into_inner(state);
      if stopped {
        state.set(StreamState::Stopped);
      } else {
        state.set(StreamState::Exhausted);
        info!(producer = %name, records = total, "all dataset records have been streamed");
      }
    })
  }

  fn get_config_impl(&self) -> &ProducerConfig {
    &self.config
  }

  fn get_config_mut_impl(&mut self) -> &mut ProducerConfig {
    &mut self.config
  }
}

impl DatasetProducer {
  /// Starts a run and groups its records into batches of `batch_size`.
  ///
  /// The last batch is shorter when the record count is not a multiple of
  /// the batch size.
  pub fn produce_batches(&mut self) -> Pin<Box<dyn Stream<Item = Vec<Example>> + Send>> {
    let batch_size = self.batch_size;
    Box::pin(
      self
        .produce()
        .map(Message::into_payload)
        .chunks(batch_size),
    )
  }
}
