use super::{DatasetProducer, StreamState, permutation};
use crate::dataset::{Dataset, Example};
use crate::error::{ErrorAction, ErrorStrategy, MlStateError, SourceError};
use crate::message::Message;
use crate::producer::Producer;
use futures::StreamExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::Arc;

/// A dataset whose label equals the record index.
fn indexed_dataset(n: u8) -> Arc<Dataset> {
  let labels: Vec<u8> = (0..n).collect();
  let images = (0..n).map(|i| vec![f32::from(i) / 255.0]).collect();
  Arc::new(Dataset::from_parts(labels, images, 1).unwrap())
}

fn producer(n: u8, randomize: bool) -> DatasetProducer {
  DatasetProducer::new(indexed_dataset(n), 2, randomize).unwrap()
}

fn labels_of(messages: &[Message<Example>]) -> Vec<i32> {
  messages.iter().map(|m| m.payload().label).collect()
}

// ============================================================================
// permutation
// ============================================================================

#[test]
fn test_permutation_identity() {
  let mut rng = StdRng::seed_from_u64(1);
  assert_eq!(permutation(5, false, &mut rng), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_permutation_covers_every_index() {
  let mut rng = StdRng::seed_from_u64(7);
  for len in [0, 1, 2, 17, 100] {
    let mut perm = permutation(len, true, &mut rng);
    perm.sort_unstable();
    assert_eq!(perm, (0..len).collect::<Vec<_>>());
  }
}

#[test]
fn test_permutation_same_seed_same_order() {
  let a = permutation(50, true, &mut StdRng::seed_from_u64(42));
  let b = permutation(50, true, &mut StdRng::seed_from_u64(42));
  assert_eq!(a, b);
}

// ============================================================================
// generate_stream
// ============================================================================

#[test]
fn test_generate_stream_in_index_order() {
  let mut producer = producer(5, false);
  let mut emitted = Vec::new();
  let mut writer = |msg: Message<Example>| -> Result<(), SourceError> {
    emitted.push(msg);
    Ok(())
  };

  producer.generate_stream(&mut writer).unwrap();

  assert_eq!(labels_of(&emitted), vec![0, 1, 2, 3, 4]);
  let sequences: Vec<u64> = emitted.iter().map(Message::sequence).collect();
  assert_eq!(sequences, vec![0, 1, 2, 3, 4]);
  assert!(emitted.iter().all(|m| m.timestamp() == m.proc_timestamp()));
  assert_eq!(producer.state(), StreamState::Exhausted);
}

#[test]
fn test_generate_stream_record_contents() {
  let mut producer = producer(3, false);
  let mut emitted = Vec::new();
  let mut writer = |msg: Message<Example>| -> Result<(), SourceError> {
    emitted.push(msg.into_payload());
    Ok(())
  };

  producer.generate_stream(&mut writer).unwrap();

  assert_eq!(
    emitted[2],
    Example {
      label: 2,
      data: vec![2.0 / 255.0]
    }
  );
}

#[test]
fn test_generate_stream_randomized_is_a_permutation() {
  let mut producer = producer(20, true).with_seed(3);
  let mut emitted = Vec::new();
  let mut writer = |msg: Message<Example>| -> Result<(), SourceError> {
    emitted.push(msg.payload().label);
    Ok(())
  };

  producer.generate_stream(&mut writer).unwrap();

  assert_eq!(emitted.len(), 20);
  let unique: HashSet<i32> = emitted.iter().copied().collect();
  assert_eq!(unique, (0..20).collect::<HashSet<_>>());
}

#[test]
fn test_generate_stream_reshuffles_each_run() {
  let mut producer = producer(10, true).with_seed(11);
  let mut runs = Vec::new();
  for _ in 0..5 {
    let mut labels = Vec::new();
    let mut writer = |msg: Message<Example>| -> Result<(), SourceError> {
      labels.push(msg.payload().label);
      Ok(())
    };
    producer.generate_stream(&mut writer).unwrap();
    runs.push(labels);
  }

  assert!(runs.iter().all(|run| run.len() == 10));
  assert!(runs.iter().any(|run| run != &runs[0]));
}

#[test]
fn test_generate_stream_halts_on_stopped_signal() {
  let mut producer = producer(10, false);
  let mut emitted = Vec::new();
  let mut calls = 0;
  let mut writer = |msg: Message<Example>| -> Result<(), SourceError> {
    calls += 1;
    if emitted.len() == 3 {
      return Err(SourceError::Stopped);
    }
    emitted.push(msg.payload().label);
    Ok(())
  };

  let result = producer.generate_stream(&mut writer);

  assert_eq!(result, Err(SourceError::Stopped));
  assert_eq!(emitted, vec![0, 1, 2]);
  assert_eq!(calls, 4);
  assert_eq!(producer.state(), StreamState::Stopped);
}

#[test]
fn test_generate_stream_halts_on_rewound_signal() {
  let mut producer = producer(10, false);
  let mut calls = 0;
  let mut writer = |_: Message<Example>| -> Result<(), SourceError> {
    calls += 1;
    Err(SourceError::Rewound)
  };

  let result = producer.generate_stream(&mut writer);

  assert_eq!(result, Err(SourceError::Rewound));
  assert_eq!(calls, 1);
  assert_eq!(producer.state(), StreamState::Idle);
}

#[test]
fn test_generate_stream_restarts_after_rewind() {
  let mut producer = producer(4, false);
  let mut first = true;
  let mut rewind_once = |_: Message<Example>| -> Result<(), SourceError> {
    if first {
      first = false;
      return Err(SourceError::Rewound);
    }
    Ok(())
  };
  assert_eq!(
    producer.generate_stream(&mut rewind_once),
    Err(SourceError::Rewound)
  );

  let mut emitted = Vec::new();
  let mut writer = |msg: Message<Example>| -> Result<(), SourceError> {
    emitted.push(msg.payload().label);
    Ok(())
  };
  producer.generate_stream(&mut writer).unwrap();
  assert_eq!(emitted, vec![0, 1, 2, 3]);
}

#[test]
fn test_generate_stream_skips_write_errors_by_default() {
  let mut producer = producer(5, false);
  let mut emitted = Vec::new();
  let mut writer = |msg: Message<Example>| -> Result<(), SourceError> {
    if msg.payload().label == 2 {
      return Err(SourceError::Write("bad record".to_string()));
    }
    emitted.push(msg.payload().label);
    Ok(())
  };

  producer.generate_stream(&mut writer).unwrap();

  assert_eq!(emitted, vec![0, 1, 3, 4]);
  assert_eq!(producer.state(), StreamState::Exhausted);
}

#[test]
fn test_generate_stream_stop_strategy_returns_write_error() {
  let mut producer = producer(5, false).with_error_strategy(ErrorStrategy::Stop);
  let mut emitted = Vec::new();
  let mut writer = |msg: Message<Example>| -> Result<(), SourceError> {
    if msg.payload().label == 2 {
      return Err(SourceError::Write("bad record".to_string()));
    }
    emitted.push(msg.payload().label);
    Ok(())
  };

  let result = producer.generate_stream(&mut writer);

  assert_eq!(result, Err(SourceError::Write("bad record".to_string())));
  assert_eq!(emitted, vec![0, 1]);
}

#[test]
fn test_generate_stream_custom_strategy() {
  let strategy = ErrorStrategy::new_custom(|error: &SourceError| match error {
    SourceError::Write(msg) if msg == "fatal" => ErrorAction::Stop,
    _ => ErrorAction::Skip,
  });
  let mut producer = producer(5, false).with_error_strategy(strategy);
  let mut writer = |msg: Message<Example>| match msg.payload().label {
    1 => Err(SourceError::Write("minor".to_string())),
    3 => Err(SourceError::Write("fatal".to_string())),
    _ => Ok(()),
  };

  let result = producer.generate_stream(&mut writer);
  assert_eq!(result, Err(SourceError::Write("fatal".to_string())));
}

#[test]
fn test_generate_stream_observes_stop_mid_run() {
  let mut producer = producer(10, false);
  let token = producer.stop_token();
  let mut emitted = Vec::new();
  let mut writer = |msg: Message<Example>| -> Result<(), SourceError> {
    emitted.push(msg.payload().label);
    if emitted.len() == 2 {
      token.cancel();
    }
    Ok(())
  };

  let result = producer.generate_stream(&mut writer);

  assert_eq!(result, Err(SourceError::Stopped));
  assert_eq!(emitted, vec![0, 1]);
  assert!(producer.is_stopped());
}

#[test]
fn test_generate_stream_after_stop_emits_nothing() {
  let mut producer = producer(3, false);
  producer.stop();

  let mut calls = 0;
  let mut writer = |_: Message<Example>| -> Result<(), SourceError> {
    calls += 1;
    Ok(())
  };

  assert_eq!(producer.generate_stream(&mut writer), Err(SourceError::Stopped));
  assert_eq!(calls, 0);
}

#[test]
fn test_generate_stream_empty_dataset() {
  let dataset = Dataset::from_parts(vec![], vec![], 784).unwrap();
  let mut producer = DatasetProducer::new(Arc::new(dataset), 1, true).unwrap();
  let mut writer = |_: Message<Example>| -> Result<(), SourceError> { panic!("nothing to write") };

  producer.generate_stream(&mut writer).unwrap();
  assert_eq!(producer.state(), StreamState::Exhausted);
}

// ============================================================================
// Producer
// ============================================================================

#[test]
fn test_new_rejects_zero_batch_size() {
  let result = DatasetProducer::new(indexed_dataset(3), 0, false);
  assert!(matches!(result, Err(MlStateError::Config(_))));
}

#[test]
fn test_producer_name() {
  let producer = producer(1, false).with_name("mnist".to_string());
  assert_eq!(producer.config().name(), Some("mnist".to_string()));
  assert_eq!(producer.component_name("dataset_producer"), "mnist");
}

#[tokio::test]
async fn test_produce_in_index_order() {
  let mut producer = producer(5, false);
  assert_eq!(producer.state(), StreamState::Idle);

  let messages: Vec<Message<Example>> = producer.produce().collect().await;

  assert_eq!(labels_of(&messages), vec![0, 1, 2, 3, 4]);
  assert_eq!(producer.state(), StreamState::Exhausted);
}

#[tokio::test]
async fn test_produce_is_restartable() {
  let mut producer = producer(8, true).with_seed(5);

  let first: Vec<Message<Example>> = producer.produce().collect().await;
  let second: Vec<Message<Example>> = producer.produce().collect().await;

  let mut a = labels_of(&first);
  let mut b = labels_of(&second);
  a.sort_unstable();
  b.sort_unstable();
  assert_eq!(a, (0..8).collect::<Vec<_>>());
  assert_eq!(a, b);
}

#[tokio::test]
async fn test_produce_is_lazy() {
  let mut producer = producer(3, false);
  let stream = producer.produce();
  assert_eq!(producer.state(), StreamState::Idle);
  drop(stream);
}

#[tokio::test]
async fn test_produce_stops_on_request() {
  let mut producer = producer(10, false);
  let token = producer.stop_token();
  let mut stream = producer.produce();

  let first = stream.next().await.unwrap();
  assert_eq!(first.payload().label, 0);
  token.cancel();
  assert!(stream.next().await.is_none());
  drop(stream);

  assert_eq!(producer.state(), StreamState::Stopped);
}

#[tokio::test]
async fn test_produce_dropped_mid_run_is_stopped() {
  let mut producer = producer(10, false);
  let mut stream = producer.produce();

  assert_eq!(stream.next().await.unwrap().payload().label, 0);
  drop(stream);

  assert_eq!(producer.state(), StreamState::Stopped);
}

#[tokio::test]
async fn test_produce_batches() {
  let mut producer = producer(5, false);

  let batches: Vec<Vec<Example>> = producer.produce_batches().collect().await;

  let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
  assert_eq!(sizes, vec![2, 2, 1]);
  assert_eq!(batches[1][0].label, 2);
}

// ============================================================================
// Properties
// ============================================================================

mod properties {
  use super::*;
  use proptest::prelude::*;

  proptest! {
    #[test]
    fn test_permutation_is_bijection(len in 0usize..200, seed in any::<u64>()) {
      let mut perm = permutation(len, true, &mut StdRng::seed_from_u64(seed));
      perm.sort_unstable();
      prop_assert_eq!(perm, (0..len).collect::<Vec<_>>());
    }

    #[test]
    fn test_generate_stream_emits_each_record_once(
      n in 0u8..60,
      randomize in any::<bool>(),
      seed in any::<u64>(),
    ) {
      let mut producer = DatasetProducer::new(indexed_dataset(n), 3, randomize)
        .unwrap()
        .with_seed(seed);
      let mut labels = Vec::new();
      let mut writer = |msg: Message<Example>| -> Result<(), SourceError> {
        labels.push(msg.payload().label);
        Ok(())
      };
      producer.generate_stream(&mut writer).unwrap();

      if !randomize {
        prop_assert_eq!(&labels, &(0..i32::from(n)).collect::<Vec<_>>());
      }
      labels.sort_unstable();
      prop_assert_eq!(labels, (0..i32::from(n)).collect::<Vec<_>>());
    }
  }
}
