/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-dot-]browne[-at-]dwightjbrowne[-dot-]com
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

use crate::error::{Error, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main configuration struct for the downloader
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
  /// Base URL for the chart endpoint
  pub base_url: String,

  /// Request quota (requests per minute)
  pub rate_limit: u32,

  /// Per-attempt request timeout in seconds
  pub timeout_secs: u64,

  /// Maximum retries for failed requests
  pub max_retries: u32,

  /// Directory holding the cache database
  pub cache_dir: PathBuf,

  /// Directory receiving per-symbol CSV files
  pub output_dir: PathBuf,

  /// Operator-supplied portfolio symbol list, one symbol per line
  pub portfolio_file: Option<PathBuf>,

  /// Operator-supplied broker tradable-symbol list, one symbol per line
  pub broker_list_file: Option<PathBuf>,
}

impl Config {
  /// Load configuration from environment variables
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let base_url =
      env::var("USSTOCK_BASE_URL").unwrap_or_else(|_| crate::YAHOO_CHART_BASE_URL.to_string());

    let rate_limit = env::var("USSTOCK_RATE_LIMIT")
      .unwrap_or_else(|_| crate::DEFAULT_RATE_LIMIT.to_string())
      .parse()
      .map_err(|_| Error::Config("Invalid USSTOCK_RATE_LIMIT".to_string()))?;

    let timeout_secs = env::var("USSTOCK_TIMEOUT_SECS")
      .unwrap_or_else(|_| crate::DEFAULT_TIMEOUT_SECS.to_string())
      .parse()
      .map_err(|_| Error::Config("Invalid USSTOCK_TIMEOUT_SECS".to_string()))?;

    let max_retries = env::var("USSTOCK_MAX_RETRIES")
      .unwrap_or_else(|_| crate::DEFAULT_MAX_RETRIES.to_string())
      .parse()
      .map_err(|_| Error::Config("Invalid USSTOCK_MAX_RETRIES".to_string()))?;

    let cache_dir =
      PathBuf::from(env::var("USSTOCK_CACHE_DIR").unwrap_or_else(|_| "./cache".to_string()));

    let output_dir =
      PathBuf::from(env::var("USSTOCK_OUTPUT_DIR").unwrap_or_else(|_| "./output".to_string()));

    let portfolio_file = env::var("USSTOCK_PORTFOLIO_FILE").ok().map(PathBuf::from);
    let broker_list_file = env::var("USSTOCK_BROKER_LIST_FILE").ok().map(PathBuf::from);

    Ok(Config {
      base_url,
      rate_limit,
      timeout_secs,
      max_retries,
      cache_dir,
      output_dir,
      portfolio_file,
      broker_list_file,
    })
  }

  /// Path of the cache database file inside `cache_dir`
  pub fn cache_db_path(&self) -> PathBuf {
    self.cache_dir.join("cache.db")
  }
}

impl Default for Config {
  fn default() -> Self {
    Config {
      base_url: crate::YAHOO_CHART_BASE_URL.to_string(),
      rate_limit: crate::DEFAULT_RATE_LIMIT,
      timeout_secs: crate::DEFAULT_TIMEOUT_SECS,
      max_retries: crate::DEFAULT_MAX_RETRIES,
      cache_dir: PathBuf::from("./cache"),
      output_dir: PathBuf::from("./output"),
      portfolio_file: None,
      broker_list_file: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.base_url, crate::YAHOO_CHART_BASE_URL);
    assert_eq!(config.rate_limit, 60);
    assert_eq!(config.timeout_secs, 30);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.output_dir, PathBuf::from("./output"));
  }

  #[test]
  fn test_cache_db_path() {
    let config = Config::default();
    assert_eq!(config.cache_db_path(), PathBuf::from("./cache/cache.db"));
  }
}
