//! Message envelope for stream items.
//!
//! Every item a producer emits is wrapped in a [`Message`] carrying a
//! sequence number and two timestamps: when the item was created and when
//! it was handed to processing. Sources set both to the same instant; the
//! engine may move the processing timestamp forward as the item travels.
//!
//! ```rust
//! use mlweave::message::Message;
//!
//! let msg = Message::new(42, 0);
//! assert_eq!(*msg.payload(), 42);
//! assert_eq!(msg.timestamp(), msg.proc_timestamp());
//! ```

use chrono::{DateTime, Utc};

/// A payload with its sequence number and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Message<T> {
  payload: T,
  sequence: u64,
  timestamp: DateTime<Utc>,
  proc_timestamp: DateTime<Utc>,
}

impl<T> Message<T> {
  /// Wraps `payload`, stamping creation and processing time with now.
  pub fn new(payload: T, sequence: u64) -> Self {
    let now = Utc::now();
    Self {
      payload,
      sequence,
      timestamp: now,
      proc_timestamp: now,
    }
  }

  /// The wrapped item.
  pub fn payload(&self) -> &T {
    &self.payload
  }

  /// Unwraps the item.
  pub fn into_payload(self) -> T {
    self.payload
  }

  /// Position of the item in the stream run that produced it.
  pub fn sequence(&self) -> u64 {
    self.sequence
  }

  /// When the item was created.
  pub fn timestamp(&self) -> DateTime<Utc> {
    self.timestamp
  }

  /// When the item entered processing.
  pub fn proc_timestamp(&self) -> DateTime<Utc> {
    self.proc_timestamp
  }

  /// Sets the processing timestamp.
  #[must_use]
  pub fn with_proc_timestamp(mut self, at: DateTime<Utc>) -> Self {
    self.proc_timestamp = at;
    self
  }

  /// Transforms the payload, keeping sequence and timestamps.
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Message<U> {
    Message {
      payload: f(self.payload),
      sequence: self.sequence,
      timestamp: self.timestamp,
      proc_timestamp: self.proc_timestamp,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  #[test]
  fn test_message_map_keeps_envelope() {
    let msg = Message::new(2, 7);
    let ts = msg.timestamp();
    let mapped = msg.map(|x| x * 10);

    assert_eq!(*mapped.payload(), 20);
    assert_eq!(mapped.sequence(), 7);
    assert_eq!(mapped.timestamp(), ts);
  }

  #[test]
  fn test_message_proc_timestamp_moves_independently() {
    let msg = Message::new("a", 0);
    let later = msg.timestamp() + Duration::seconds(5);
    let msg = msg.with_proc_timestamp(later);

    assert_eq!(msg.proc_timestamp(), later);
    assert!(msg.timestamp() < msg.proc_timestamp());
    assert_eq!(msg.into_payload(), "a");
  }
}
