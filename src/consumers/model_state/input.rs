use super::model_state_consumer::ModelStateConsumer;
use crate::input::Input;
use crate::message::Message;
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;

impl<T> Input for ModelStateConsumer<T>
where
  T: Serialize + Send + 'static,
{
  type Input = Message<T>;
  type InputStream = Pin<Box<dyn Stream<Item = Message<T>> + Send>>;
}
