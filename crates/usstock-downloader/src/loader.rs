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

//! Base trait and shared context for loaders

use crate::DownloaderResult;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use usstock_cache::CacheStore;
use usstock_client::{ChartClient, RetryPolicy};

/// Configuration for the download pipeline
#[derive(Debug, Clone)]
pub struct LoaderConfig {
  /// Worker pool size (operator cap applies upstream)
  pub max_concurrent: usize,

  /// Show an indicatif progress bar
  pub show_progress: bool,

  /// Bypass the cache consult and always fetch the full window
  pub force_update: bool,

  /// Run the stronger second-chance retry regime after the normal
  /// budget is exhausted
  pub special_retry: bool,

  /// Retry tuning applied to every fetch
  pub retry: RetryPolicy,

  /// Directory receiving per-symbol CSV files and the failure report
  pub output_dir: PathBuf,

  /// Fixed observation instant for reproducible runs; `None` uses the
  /// wall clock. Every calendar decision in a run sees the same value.
  pub reference_time: Option<chrono::DateTime<chrono_tz::Tz>>,
}

impl Default for LoaderConfig {
  fn default() -> Self {
    Self {
      max_concurrent: usstock_core::DEFAULT_CONCURRENT,
      show_progress: true,
      force_update: false,
      special_retry: true,
      retry: RetryPolicy::default(),
      output_dir: PathBuf::from("./output"),
      reference_time: None,
    }
  }
}

/// Shared context handed to every loader: the one HTTP client, the one
/// cache store, and a cooperative cancellation flag.
pub struct LoaderContext {
  pub client: Arc<ChartClient>,
  pub cache: Arc<CacheStore>,
  pub config: LoaderConfig,
  pub cancelled: Arc<AtomicBool>,
}

impl LoaderContext {
  pub fn new(client: Arc<ChartClient>, cache: Arc<CacheStore>, config: LoaderConfig) -> Self {
    Self { client, cache, config, cancelled: Arc::new(AtomicBool::new(false)) }
  }

  /// Install an externally-owned cancellation flag (e.g. a ctrl-c handler)
  pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
    self.cancelled = cancelled;
    self
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::SeqCst)
  }
}

/// Base trait for all data loaders
#[async_trait]
pub trait DataLoader: Send + Sync {
  /// The type of data this loader processes
  type Input;

  /// The result type after loading
  type Output;

  /// Load data from the given input
  async fn load(&self, context: &LoaderContext, input: Self::Input)
    -> DownloaderResult<Self::Output>;

  /// Get loader name for logging/tracking
  fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_loader_config_defaults() {
    let config = LoaderConfig::default();
    assert_eq!(config.max_concurrent, 3);
    assert!(config.special_retry);
    assert!(!config.force_update);
    assert_eq!(config.retry.max_attempts, 3);
  }

  #[test]
  fn test_cancel_flag_round_trip() {
    let client = Arc::new(ChartClient::new(&usstock_core::Config::default()).unwrap());
    let cache = Arc::new(CacheStore::in_memory().unwrap());
    let flag = Arc::new(AtomicBool::new(false));
    let context = LoaderContext::new(client, cache, LoaderConfig::default())
      .with_cancel_flag(flag.clone());

    assert!(!context.is_cancelled());
    flag.store(true, Ordering::SeqCst);
    assert!(context.is_cancelled());
  }
}
