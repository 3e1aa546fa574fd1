use super::model_state_consumer::ModelStateConsumer;
use crate::consumer::{Consumer, ConsumerConfig};
use crate::error::{ErrorAction, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info, warn};

const DEFAULT_NAME: &str = "model_state_consumer";

#[async_trait]
impl<T> Consumer for ModelStateConsumer<T>
where
  T: Serialize + Send + 'static,
{
  async fn consume(&mut self, mut stream: Self::InputStream) -> Result<()> {
    let name = self.component_name(DEFAULT_NAME);
    debug!(consumer = %name, "starting to consume stream");

    while let Some(message) = stream.next().await {
      let sequence = message.sequence();
      match self.write_one(message.into_payload()).await {
        Ok(()) => self.written += 1,
        Err(error) => match self.config.error_strategy.action(&error) {
          ErrorAction::Skip => {
            warn!(consumer = %name, sequence, error = %error, "failed to write record, skipping");
            self.skipped += 1;
          }
          ErrorAction::Stop => {
            warn!(consumer = %name, sequence, error = %error, "failed to write record, stopping");
            return Err(error);
          }
        },
      }
    }

    info!(
      consumer = %name,
      written = self.written,
      skipped = self.skipped,
      "finished consuming stream"
    );
    Ok(())
  }

  fn get_config_impl(&self) -> &ConsumerConfig {
    &self.config
  }

  fn get_config_mut_impl(&mut self) -> &mut ConsumerConfig {
    &mut self.config
  }
}
