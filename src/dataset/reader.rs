//! Reader for MNIST-style binary image and label files.
//!
//! Layout (see "THE MNIST DATABASE of handwritten digits"):
//!
//! - image file: a 16-byte header followed by `data_size * element_size`
//!   unsigned bytes, one per pixel intensity;
//! - label file: an 8-byte header followed by `data_size` unsigned bytes,
//!   one class label per image.
//!
//! The headers are skipped without validation: sizes are supplied by the
//! caller and trusted. Files shorter than the declared sizes are rejected
//! with [`MlStateError::Truncated`].

use crate::error::{MlStateError, Result};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Bytes skipped at the start of an image file.
pub const IMAGES_HEADER_LEN: usize = 16;
/// Bytes skipped at the start of a label file.
pub const LABELS_HEADER_LEN: usize = 8;

/// Reads `data_size` labels and images of `element_size` pixels each.
///
/// Pixels are normalized to `[0, 1]` by dividing by 255.
///
/// # Errors
///
/// - [`MlStateError::Config`] if `element_size` is zero or the sizes overflow
/// - [`MlStateError::Io`] if a file cannot be opened or read
/// - [`MlStateError::Truncated`] if a file is shorter than declared
pub fn read_dataset(
  images_path: impl AsRef<Path>,
  labels_path: impl AsRef<Path>,
  data_size: usize,
  element_size: usize,
) -> Result<(Vec<u8>, Vec<Vec<f32>>)> {
  if element_size == 0 {
    return Err(MlStateError::Config(
      "image element size must be greater than zero".to_string(),
    ));
  }
  let pixels = data_size.checked_mul(element_size).ok_or_else(|| {
    MlStateError::Config(format!(
      "{} images of {} elements overflow the address space",
      data_size, element_size
    ))
  })?;

  let image_bytes = read_body(images_path.as_ref(), IMAGES_HEADER_LEN, pixels)?;
  let labels = read_body(labels_path.as_ref(), LABELS_HEADER_LEN, data_size)?;

  let images = image_bytes
    .chunks_exact(element_size)
    .map(|image| image.iter().map(|&b| normalize(b)).collect())
    .collect();

  debug!(data_size, element_size, "dataset loaded");
  Ok((labels, images))
}

/// Maps a pixel byte to `[0, 1]`.
#[inline]
pub fn normalize(byte: u8) -> f32 {
  f32::from(byte) / 255.0
}

fn read_body(path: &Path, header_len: usize, body_len: usize) -> Result<Vec<u8>> {
  let file = File::open(path).map_err(|e| MlStateError::io(path, e))?;
  let expected = (header_len as u64).saturating_add(body_len as u64);

  // Checked before allocating: the declared size is caller input.
  let actual = file.metadata().map_err(|e| MlStateError::io(path, e))?.len();
  if actual < expected {
    return Err(MlStateError::Truncated {
      path: path.to_path_buf(),
      expected,
      actual,
    });
  }

  let mut reader = BufReader::new(file);
  io::copy(&mut (&mut reader).take(header_len as u64), &mut io::sink())
    .map_err(|e| MlStateError::io(path, e))?;

  let mut bytes = Vec::new();
  let read = reader
    .take(body_len as u64)
    .read_to_end(&mut bytes)
    .map_err(|e| MlStateError::io(path, e))?;

  if read < body_len {
    return Err(MlStateError::Truncated {
      path: path.to_path_buf(),
      expected,
      actual: header_len as u64 + read as u64,
    });
  }
  Ok(bytes)
}
