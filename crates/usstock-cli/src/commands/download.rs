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

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use usstock_cache::CacheStore;
use usstock_client::{ChartClient, RetryPolicy};
use usstock_core::{calendar, Config};
use usstock_downloader::{
  DataLoader, DownloadLoader, DownloadLoaderInput, LoaderConfig, LoaderContext,
};

use crate::universe::{self, Universe};

#[derive(Args, Debug)]
pub struct DownloadArgs {
  /// Comma-separated symbol list
  #[arg(long, value_delimiter = ',', conflicts_with_all = ["symbols_file", "universe"])]
  pub symbols: Vec<String>,

  /// File with one symbol per line
  #[arg(long, conflicts_with = "universe")]
  pub symbols_file: Option<PathBuf>,

  /// Curated universe token
  #[arg(long, value_enum)]
  pub universe: Option<Universe>,

  /// First session to request, yyyy-MM-dd (default: one year back)
  #[arg(long)]
  pub start_date: Option<NaiveDate>,

  /// Last session to request, yyyy-MM-dd (default: today)
  #[arg(long)]
  pub end_date: Option<NaiveDate>,

  /// Number of concurrent workers (max 10)
  #[arg(short, long, default_value_t = usstock_core::DEFAULT_CONCURRENT)]
  pub concurrent: usize,

  /// Fetch attempts per window before a symbol is failed
  #[arg(long, default_value_t = usstock_core::DEFAULT_MAX_RETRIES)]
  pub max_retries: u32,

  /// First backoff delay in milliseconds
  #[arg(long, default_value_t = 1000)]
  pub retry_delay_ms: u64,

  /// Minimum sleep after an HTTP 429, in milliseconds
  #[arg(long, default_value_t = 30000)]
  pub rate_limit_delay_ms: u64,

  /// Exponential backoff between retries
  #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
  pub exponential: bool,

  /// Apply +/-20% jitter to retry sleeps
  #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
  pub jitter: bool,

  /// Skip the second-chance retry pass for exhausted symbols
  #[arg(long)]
  pub no_special_retry: bool,

  /// Output directory for CSV files and the failure report
  #[arg(long)]
  pub output_dir: Option<PathBuf>,

  /// Wipe the cache before running
  #[arg(long)]
  pub cache_clear: bool,

  /// Bypass the cache and always fetch the full window
  #[arg(long)]
  pub force_update: bool,
}

fn resolve_symbols(args: &DownloadArgs, config: &Config) -> Result<Vec<String>> {
  if !args.symbols.is_empty() {
    return Ok(args.symbols.clone());
  }
  if let Some(path) = &args.symbols_file {
    return universe::read_symbol_file(path);
  }
  if let Some(token) = args.universe {
    return universe::resolve(token, config);
  }
  bail!("exactly one of --symbols, --symbols-file or --universe is required")
}

/// Once-a-day environment check, memoised in the cache: both directories
/// must exist and the output directory must accept writes.
fn preflight(cache: &CacheStore, config: &Config, today: NaiveDate) -> Result<()> {
  if cache.runtime_check(today)? == Some(true) {
    return Ok(());
  }

  let outcome = (|| -> Result<()> {
    std::fs::create_dir_all(&config.output_dir)?;
    let probe = config.output_dir.join(".write_probe");
    std::fs::write(&probe, b"ok")
      .with_context(|| format!("output directory {} is not writable", config.output_dir.display()))?;
    let _ = std::fs::remove_file(&probe);
    Ok(())
  })();

  cache.record_runtime_check(today, outcome.is_ok())?;
  outcome
}

pub async fn execute(args: DownloadArgs, mut config: Config) -> Result<i32> {
  if let Some(dir) = &args.output_dir {
    config.output_dir = dir.clone();
  }

  let symbols = resolve_symbols(&args, &config)?;

  let now = calendar::now_eastern();
  let today = now.date_naive();
  let end = args.end_date.unwrap_or(today);
  let start = args.start_date.unwrap_or(today - Duration::days(365));
  if start > end {
    bail!("start date {start} is after end date {end}");
  }

  let cache = CacheStore::open(&config.cache_db_path()).context("opening cache database")?;
  if args.cache_clear {
    cache.clear_all().context("clearing cache")?;
  }
  let cache = Arc::new(cache);

  preflight(&cache, &config, today)?;

  let client =
    Arc::new(ChartClient::new(&config)?.with_cool_off_ms(args.rate_limit_delay_ms));

  let retry = RetryPolicy {
    max_attempts: args.max_retries,
    base_delay_ms: args.retry_delay_ms,
    rate_limit_delay_ms: args.rate_limit_delay_ms,
    max_delay_ms: 60_000,
    exponential: args.exponential,
    jitter: args.jitter,
    attempt_timeout_secs: config.timeout_secs,
  };
  let loader_config = LoaderConfig {
    max_concurrent: args.concurrent.clamp(1, usstock_core::MAX_CONCURRENT),
    show_progress: true,
    force_update: args.force_update,
    special_retry: !args.no_special_retry,
    retry,
    output_dir: config.output_dir.clone(),
    reference_time: None,
  };

  let cancelled = Arc::new(AtomicBool::new(false));
  let cancel_flag = cancelled.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("Cancellation requested; in-flight writes will finish");
      cancel_flag.store(true, Ordering::SeqCst);
    }
  });

  let context = LoaderContext::new(client, cache, loader_config).with_cancel_flag(cancelled);
  let loader = DownloadLoader::new(args.concurrent);
  let output = loader.load(&context, DownloadLoaderInput { symbols, start, end }).await?;

  println!(
    "{} fetched, {} cache hits, {} delisted, {} no-data, {} failed, {} cancelled",
    output.fetched,
    output.cache_hits,
    output.delisted,
    output.no_data,
    output.failed,
    output.cancelled
  );
  if !output.all_clean() {
    println!("See {}", output.report_path.display());
  }
  info!("Failure report at {}", output.report_path.display());

  Ok(if output.all_clean() { 0 } else { 1 })
}
