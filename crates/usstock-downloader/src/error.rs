/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

use thiserror::Error;
use usstock_cache::CacheError;
use usstock_client::FetchError;

/// Errors that abort a run. Per-symbol fetch failures never take this
/// path; they become [`crate::SymbolOutcome`] values instead.
#[derive(Error, Debug)]
pub enum DownloaderError {
  #[error("Fetch error: {0}")]
  Fetch(#[from] FetchError),

  #[error("Cache error: {0}")]
  Cache(#[from] CacheError),

  #[error("CSV error: {0}")]
  Csv(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Invalid data: {0}")]
  InvalidData(String),

  #[error("Configuration error: {0}")]
  Configuration(String),
}

impl From<csv::Error> for DownloaderError {
  fn from(err: csv::Error) -> Self {
    DownloaderError::Csv(err.to_string())
  }
}

pub type DownloaderResult<T> = Result<T, DownloaderError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display_configuration() {
    let err = DownloaderError::Configuration("bad worker count".to_string());
    assert_eq!(err.to_string(), "Configuration error: bad worker count");
  }

  #[test]
  fn test_from_fetch_error() {
    let err = DownloaderError::from(FetchError::NoData);
    assert!(matches!(err, DownloaderError::Fetch(_)));
  }

  #[test]
  fn test_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let err = DownloaderError::from(io_err);
    assert!(err.to_string().contains("read-only"));
  }
}
