use crate::dataset::{Dataset, Example};
use crate::error::{ErrorAction, ErrorStrategy, MlStateError, Result, SourceError};
use crate::message::Message;
use crate::producer::{Producer, ProducerConfig, TupleWriter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub(crate) const DEFAULT_NAME: &str = "dataset_producer";

/// Where a [`DatasetProducer`] is in its current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StreamState {
  /// No run in progress. Also the state after a rewind.
  Idle = 0,
  /// Records are being emitted.
  Streaming = 1,
  /// The run ended early: a stop signal or request, an error, or a pull
  /// stream dropped before its end.
  Stopped = 2,
  /// Every record of the run was emitted.
  Exhausted = 3,
}

impl StreamState {
  fn from_u8(value: u8) -> Self {
    match value {
      1 => StreamState::Streaming,
      2 => StreamState::Stopped,
      3 => StreamState::Exhausted,
      _ => StreamState::Idle,
    }
  }
}

/// Shared cell holding a [`StreamState`].
#[derive(Debug, Default)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
  pub(crate) fn set(&self, state: StreamState) {
    self.0.store(state as u8, Ordering::Release);
  }

  pub(crate) fn get(&self) -> StreamState {
    StreamState::from_u8(self.0.load(Ordering::Acquire))
  }
}

/// A producer that streams the records of a [`Dataset`].
///
/// Each run emits every record exactly once, in index order or, when
/// `randomize` is set, in a fresh uniform permutation. Runs are independent
/// so the producer can be rewound by simply starting another one.
///
/// Records are delivered either by pushing into a [`TupleWriter`] with
/// [`generate_stream`](Self::generate_stream) or by pulling the stream
/// returned from [`Producer::produce`].
pub struct DatasetProducer {
  /// The records to stream.
  pub dataset: Arc<Dataset>,
  /// Records per batch in [`produce_batches`](Self::produce_batches).
  pub batch_size: usize,
  /// Whether every run shuffles the record order.
  pub randomize: bool,
  /// Configuration for the producer.
  pub config: ProducerConfig,
  /// How writer errors other than halt signals are handled.
  pub error_strategy: ErrorStrategy<SourceError>,
  pub(crate) rng: StdRng,
  pub(crate) stop: CancellationToken,
  pub(crate) state: Arc<StateCell>,
}

impl DatasetProducer {
  /// Creates a producer over `dataset`.
  ///
  /// Non-halt writer errors are skipped by default.
  ///
  /// # Errors
  ///
  /// Returns [`MlStateError::Config`] if `batch_size` is zero.
  pub fn new(dataset: Arc<Dataset>, batch_size: usize, randomize: bool) -> Result<Self> {
    if batch_size == 0 {
      return Err(MlStateError::Config(
        "batch size must be greater than zero".to_string(),
      ));
    }
    Ok(Self {
      dataset,
      batch_size,
      randomize,
      config: ProducerConfig::default(),
      error_strategy: ErrorStrategy::Skip,
      rng: StdRng::from_entropy(),
      stop: CancellationToken::new(),
      state: Arc::new(StateCell::default()),
    })
  }

  /// Sets the strategy for writer errors that are not halt signals.
  #[must_use]
  pub fn with_error_strategy(mut self, strategy: ErrorStrategy<SourceError>) -> Self {
    self.error_strategy = strategy;
    self
  }

  /// Seeds the shuffle so that the sequence of permutations is reproducible.
  #[must_use]
  pub fn with_seed(mut self, seed: u64) -> Self {
    self.rng = StdRng::seed_from_u64(seed);
    self
  }

  /// State of the most recent run.
  pub fn state(&self) -> StreamState {
    self.state.get()
  }

  /// Requests that the current and all future runs end.
  ///
  /// The request is observed before each record, so no record is emitted
  /// after it has been seen.
  pub fn stop(&self) {
    self.stop.cancel();
  }

  /// Whether [`stop`](Self::stop) has been called.
  pub fn is_stopped(&self) -> bool {
    self.stop.is_cancelled()
  }

  /// A token that stops this producer when cancelled.
  pub fn stop_token(&self) -> CancellationToken {
    self.stop.clone()
  }

  /// Order of the next run.
  pub(crate) fn next_order(&mut self) -> Vec<usize> {
    permutation(self.dataset.len(), self.randomize, &mut self.rng)
  }

  /// Runs once through the dataset, pushing every record into `writer`.
  ///
  /// # Errors
  ///
  /// - the halt signal, if `writer` returns [`SourceError::Rewound`] or
  ///   [`SourceError::Stopped`]
  /// - [`SourceError::Stopped`], if [`stop`](Self::stop) was observed
  /// - the writer's error, if the error strategy says to stop
  pub fn generate_stream(
    &mut self,
    writer: &mut dyn TupleWriter<Example>,
  ) -> std::result::Result<(), SourceError> {
    let name = self.component_name(DEFAULT_NAME);
    let order = self.next_order();
    let total = order.len();
    self.state.set(StreamState::Streaming);

    for (sequence, idx) in order.into_iter().enumerate() {
      if self.stop.is_cancelled() {
        debug!(producer = %name, emitted = sequence, "stop requested, ending run");
        self.state.set(StreamState::Stopped);
        return Err(SourceError::Stopped);
      }
      let Some(example) = self.dataset.example(idx) else {
        continue;
      };

      match writer.write(Message::new(example, sequence as u64)) {
        Ok(()) => {}
        Err(signal) if signal.is_halt() => {
          debug!(producer = %name, emitted = sequence, signal = %signal, "writer halted the run");
          self.state.set(match signal {
            SourceError::Rewound => StreamState::Idle,
            _ => StreamState::Stopped,
          });
          return Err(signal);
        }
        Err(error) => match self.error_strategy.action(&error) {
          ErrorAction::Skip => {
            warn!(producer = %name, index = idx, error = %error, "writer rejected record, skipping");
          }
          ErrorAction::Stop => {
            self.state.set(StreamState::Stopped);
            return Err(error);
          }
        },
      }
    }

    self.state.set(StreamState::Exhausted);
    info!(producer = %name, records = total, "all dataset records have been streamed");
    Ok(())
  }
}

impl fmt::Debug for DatasetProducer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DatasetProducer")
      .field("records", &self.dataset.len())
      .field("batch_size", &self.batch_size)
      .field("randomize", &self.randomize)
      .field("config", &self.config)
      .field("error_strategy", &self.error_strategy)
      .field("state", &self.state())
      .finish()
  }
}

/// Returns the indices `0..len`, shuffled in place when `randomize` is set.
///
/// The shuffle walks `i` from 0 upward and swaps position `i` with a
/// uniformly chosen position in `0..=i`, which yields every permutation
/// with equal probability.
///
/// ```rust
/// use mlweave::producers::dataset::permutation;
///
/// let mut rng = rand::thread_rng();
/// assert_eq!(permutation(4, false, &mut rng), vec![0, 1, 2, 3]);
///
/// let mut shuffled = permutation(4, true, &mut rng);
/// shuffled.sort_unstable();
/// assert_eq!(shuffled, vec![0, 1, 2, 3]);
/// ```
pub fn permutation<R: Rng + ?Sized>(len: usize, randomize: bool, rng: &mut R) -> Vec<usize> {
  let mut perm: Vec<usize> = (0..len).collect();
  if randomize {
    for i in 0..len {
      let j = rng.gen_range(0..=i);
      perm.swap(i, j);
    }
  }
  perm
}
