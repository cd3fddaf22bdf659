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

#[derive(Error, Debug)]
pub enum Error {
  #[error("Environment variable error: {0}")]
  EnvVar(#[from] std::env::VarError),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Serialization error")]
  Serde(#[from] serde_json::Error),

  #[error("Date parsing error")]
  ParseDate(#[from] chrono::ParseError),

  #[error("Invalid symbol: {0}")]
  InvalidSymbol(String),

  #[error("Invalid date range: {0}")]
  InvalidDateRange(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Unexpected error: {0}")]
  Unexpected(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display_config() {
    let err = Error::Config("invalid timeout".to_string());
    assert_eq!(err.to_string(), "Configuration error: invalid timeout");
  }

  #[test]
  fn test_error_display_invalid_symbol() {
    let err = Error::InvalidSymbol("".to_string());
    assert_eq!(err.to_string(), "Invalid symbol: ");
  }

  #[test]
  fn test_error_display_invalid_date_range() {
    let err = Error::InvalidDateRange("start after end".to_string());
    assert_eq!(err.to_string(), "Invalid date range: start after end");
  }

  #[test]
  fn test_error_from_env_var() {
    let env_err = std::env::VarError::NotPresent;
    let err = Error::from(env_err);
    assert!(matches!(err, Error::EnvVar(_)));
    assert!(err.to_string().contains("Environment variable error"));
  }

  #[test]
  fn test_error_from_chrono_parse() {
    let parse_err = chrono::NaiveDate::parse_from_str("invalid", "%Y-%m-%d").unwrap_err();
    let err = Error::from(parse_err);
    assert!(matches!(err, Error::ParseDate(_)));
    assert_eq!(err.to_string(), "Date parsing error");
  }

  #[test]
  fn test_error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err = Error::from(io_err);
    assert!(matches!(err, Error::Io(_)));
    assert!(err.to_string().contains("missing"));
  }

  #[test]
  fn test_result_type_alias() {
    fn returns_ok() -> Result<i32> {
      Ok(42)
    }
    fn returns_err() -> Result<i32> {
      Err(Error::Config("test".to_string()))
    }
    assert_eq!(returns_ok().unwrap(), 42);
    assert!(returns_err().is_err());
  }
}
