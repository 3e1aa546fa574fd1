use super::dataset_producer::DatasetProducer;
use crate::dataset::Example;
use crate::message::Message;
use crate::output::Output;
use futures::Stream;
use std::pin::Pin;

impl Output for DatasetProducer {
  type Output = Message<Example>;
  type OutputStream = Pin<Box<dyn Stream<Item = Message<Example>> + Send>>;
}
