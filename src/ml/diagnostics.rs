//! Post-fit observation hooks.
//!
//! After every successful automatic or forced fit the model state hands the
//! fit result to a [`FitObserver`]. Observers are best-effort: they cannot
//! fail the write that triggered the fit.

use serde_json::Value;
use tracing::debug;

/// Field read from a fit result as the summed batch loss.
pub const LOSS_FIELD: &str = "loss";
/// Field read from a fit result as the summed batch accuracy.
pub const ACCURACY_FIELD: &str = "accuracy";

/// Receives the result of each successful fit.
pub trait FitObserver: Send + Sync {
  /// Called with the value returned by the model and the batch threshold of
  /// the state that ran the fit.
  fn observe(&self, result: &Value, batch_threshold: usize);
}

/// Logs per-example loss and accuracy at `debug` level.
///
/// The fit result must be a map with numeric `loss` and `accuracy` fields;
/// both are divided by the batch threshold. Any other shape is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFitMetrics;

impl FitObserver for LogFitMetrics {
  fn observe(&self, result: &Value, batch_threshold: usize) {
    if let Some((loss, acc)) = fit_metrics(result, batch_threshold) {
      debug!("loss={:.3} acc={:.3}", loss, acc);
    }
  }
}

/// Discards every fit result.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreFitResult;

impl FitObserver for IgnoreFitResult {
  fn observe(&self, _result: &Value, _batch_threshold: usize) {}
}

/// Extracts `(loss, accuracy)` averaged over `batch_threshold` examples.
///
/// Returns `None` when the result is not a map, when either field is absent,
/// or when either field is not a number (numeric strings are accepted).
pub fn fit_metrics(result: &Value, batch_threshold: usize) -> Option<(f64, f64)> {
  let map = result.as_object()?;
  let loss = to_float(map.get(LOSS_FIELD)?)?;
  let acc = to_float(map.get(ACCURACY_FIELD)?)?;
  let n = batch_threshold.max(1) as f64;
  Some((loss / n, acc / n))
}

fn to_float(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}
