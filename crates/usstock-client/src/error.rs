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

/// Typed outcome of one fetch attempt against the chart endpoint.
///
/// The retry controller keys off [`FetchError::is_retryable`]; everything
/// else is terminal for the symbol or window and goes straight back to the
/// orchestrator.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
  #[error("Rate limited by upstream (HTTP 429)")]
  RateLimited { retry_after_secs: Option<u64> },

  #[error("Server error: HTTP {status}")]
  ServerError { status: u16 },

  #[error("Network error: {0}")]
  Transient(String),

  #[error("Request timed out after {0} seconds")]
  Timeout(u64),

  #[error("Bad request: HTTP {status}")]
  BadRequest { status: u16 },

  #[error("Symbol may be delisted: {0}")]
  Delisted(String),

  #[error("No data returned for the requested window")]
  NoData,

  #[error("Malformed response: {0}")]
  MalformedResponse(String),
}

impl FetchError {
  /// Transient failures worth another attempt
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      FetchError::RateLimited { .. }
        | FetchError::ServerError { .. }
        | FetchError::Transient(_)
        | FetchError::Timeout(_)
    )
  }

  /// Stable label used by the failure report histogram
  pub fn kind(&self) -> &'static str {
    match self {
      FetchError::RateLimited { .. } => "RateLimited",
      FetchError::ServerError { .. } => "ServerError",
      FetchError::Transient(_) => "Transient",
      FetchError::Timeout(_) => "Timeout",
      FetchError::BadRequest { .. } => "BadRequest",
      FetchError::Delisted(_) => "Delisted",
      FetchError::NoData => "NoData",
      FetchError::MalformedResponse(_) => "MalformedResponse",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_retryable_classification() {
    assert!(FetchError::RateLimited { retry_after_secs: None }.is_retryable());
    assert!(FetchError::ServerError { status: 503 }.is_retryable());
    assert!(FetchError::Transient("reset".into()).is_retryable());
    assert!(FetchError::Timeout(30).is_retryable());
  }

  #[test]
  fn test_terminal_classification() {
    assert!(!FetchError::BadRequest { status: 404 }.is_retryable());
    assert!(!FetchError::Delisted("gone".into()).is_retryable());
    assert!(!FetchError::NoData.is_retryable());
    assert!(!FetchError::MalformedResponse("shape".into()).is_retryable());
  }

  #[test]
  fn test_kind_labels_are_stable() {
    assert_eq!(FetchError::RateLimited { retry_after_secs: Some(10) }.kind(), "RateLimited");
    assert_eq!(FetchError::NoData.kind(), "NoData");
    assert_eq!(FetchError::Timeout(30).kind(), "Timeout");
  }

  #[test]
  fn test_display_messages() {
    let err = FetchError::ServerError { status: 502 };
    assert_eq!(err.to_string(), "Server error: HTTP 502");
    let err = FetchError::Delisted("No data found, symbol may be delisted".into());
    assert!(err.to_string().contains("may be delisted"));
  }
}
