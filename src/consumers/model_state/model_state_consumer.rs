use crate::consumer::ConsumerConfig;
use crate::error::{MlStateError, Result};
use crate::ml::ModelState;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// A consumer that writes every payload of a stream into a [`ModelState`].
///
/// Payloads are converted to JSON values and written one at a time, so the
/// state fits its model each time its buffer reaches the batch threshold.
/// Writes block on the model, so each one runs on tokio's blocking pool.
///
/// # Example
///
/// ```rust,no_run
/// use mlweave::consumer::Consumer;
/// use mlweave::consumers::model_state::ModelStateConsumer;
/// use mlweave::dataset::{Dataset, Example};
/// use mlweave::ml::{FactoryLoader, ModelState};
/// use mlweave::producer::Producer;
/// use mlweave::producers::dataset::DatasetProducer;
/// use std::sync::Arc;
///
/// # async fn run(loader: FactoryLoader) -> mlweave::error::Result<()> {
/// let dataset = Arc::new(Dataset::open("images.idx3", "labels.idx1", 1000, 784)?);
/// let mut producer = DatasetProducer::new(dataset, 100, true)?;
/// let state = Arc::new(ModelState::new(&loader, "", "models", "Mlp", 100, "")?);
///
/// let mut consumer = ModelStateConsumer::<Example>::new(Arc::clone(&state));
/// consumer.consume(producer.produce()).await?;
/// state.terminate()?;
/// # Ok(())
/// # }
/// ```
pub struct ModelStateConsumer<T> {
  /// The state records are written into.
  pub state: Arc<ModelState>,
  /// Configuration for the consumer.
  pub config: ConsumerConfig,
  pub(crate) written: usize,
  pub(crate) skipped: usize,
  _payload: PhantomData<fn(T)>,
}

impl<T> ModelStateConsumer<T>
where
  T: Serialize + Send + 'static,
{
  /// Creates a consumer writing into `state`, stopping at the first error.
  pub fn new(state: Arc<ModelState>) -> Self {
    Self {
      state,
      config: ConsumerConfig::default(),
      written: 0,
      skipped: 0,
      _payload: PhantomData,
    }
  }

  /// Records written successfully so far.
  pub fn written(&self) -> usize {
    self.written
  }

  /// Records dropped by the error strategy so far.
  pub fn skipped(&self) -> usize {
    self.skipped
  }

  pub(crate) async fn write_one(&self, payload: T) -> Result<()> {
    let record = serde_json::to_value(&payload)?;
    let state = Arc::clone(&self.state);
    tokio::task::spawn_blocking(move || state.write(record))
      .await
      .map_err(|e| MlStateError::Task(e.to_string()))?
  }
}

impl<T> std::fmt::Debug for ModelStateConsumer<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ModelStateConsumer")
      .field("state", &self.state)
      .field("config", &self.config)
      .field("written", &self.written)
      .field("skipped", &self.skipped)
      .finish()
  }
}
