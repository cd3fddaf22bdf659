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

//! The per-symbol download state machine and its worker pool.
//!
//! Each symbol walks: cache consult -> fetch (rate-limited, retried) ->
//! validate -> CSV merge -> coverage update, in that order; the coverage
//! write strictly follows the CSV write so the cache never over-claims.
//! Workers convert every failure into a [`SymbolOutcome`]; only cache or
//! output-directory I/O escapes as an error and aborts the run.

use crate::csv_store;
use crate::error::DownloaderResult;
use crate::loader::{DataLoader, LoaderConfig, LoaderContext};
use crate::report::{FailureEntry, FailureReport};
use crate::validator;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use usstock_cache::{CacheStore, FetchPlan};
use usstock_client::{ChartClient, FetchError, RetryPolicy};
use usstock_core::{calendar, symbols};
use usstock_models::{DailyBar, SymbolCoverage};

/// Input for the download loader
#[derive(Debug, Clone)]
pub struct DownloadLoaderInput {
  /// Operator-form symbols (cache keys); normalisation happens inside
  pub symbols: Vec<String>,
  pub start: NaiveDate,
  pub end: NaiveDate,
}

/// Terminal state of one symbol's walk through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolOutcome {
  /// Fresh bars fetched, validated and written
  Fetched { bars_written: usize },
  /// The cache already covered the requested window
  CacheHit,
  /// Cached delisted flag short-circuited the fetch
  SkippedDelisted,
  /// Upstream reported the delisted signature on this run
  Delisted,
  /// Every requested window came back empty
  NoData,
  /// Terminal failure; counts against the exit code
  Failed { kind: String, message: String },
  /// Operator cancelled before this symbol finished
  Cancelled,
}

impl SymbolOutcome {
  /// Outcomes that do not fail the run
  pub fn is_clean(&self) -> bool {
    !matches!(self, SymbolOutcome::Failed { .. } | SymbolOutcome::Cancelled)
  }

  pub fn label(&self) -> &'static str {
    match self {
      SymbolOutcome::Fetched { .. } => "fetched",
      SymbolOutcome::CacheHit => "cache-hit",
      SymbolOutcome::SkippedDelisted => "skipped-delisted",
      SymbolOutcome::Delisted => "delisted",
      SymbolOutcome::NoData => "no-data",
      SymbolOutcome::Failed { .. } => "failed",
      SymbolOutcome::Cancelled => "cancelled",
    }
  }
}

/// Per-symbol result streamed out of the worker pool
#[derive(Debug, Clone)]
pub struct SymbolResult {
  pub symbol: String,
  pub outcome: SymbolOutcome,
  /// Attempt budget consumed (configured attempts, plus the special
  /// regime when it ran)
  pub attempts: u32,
}

/// Output from the download loader
#[derive(Debug)]
pub struct DownloadLoaderOutput {
  pub results: Vec<SymbolResult>,
  pub fetched: usize,
  pub cache_hits: usize,
  pub delisted: usize,
  pub no_data: usize,
  pub failed: usize,
  pub cancelled: usize,
  pub report_path: PathBuf,
}

impl DownloadLoaderOutput {
  /// True when every symbol ended ok or cleanly recorded (exit code 0)
  pub fn all_clean(&self) -> bool {
    self.failed == 0 && self.cancelled == 0
  }
}

/// Download orchestrator: a bounded pool of workers, one symbol each
pub struct DownloadLoader {
  semaphore: Arc<Semaphore>,
  workers: usize,
}

impl DownloadLoader {
  pub fn new(max_concurrent: usize) -> Self {
    let workers = max_concurrent.clamp(1, usstock_core::MAX_CONCURRENT);
    Self { semaphore: Arc::new(Semaphore::new(workers)), workers }
  }

  /// One window fetch under the retry policy, with the per-symbol
  /// wall-clock budget and the optional special-retry second pass.
  /// Returns the outcome plus the attempt budget consumed.
  async fn fetch_range(
    client: Arc<ChartClient>,
    retry: &RetryPolicy,
    special_retry: bool,
    wire_symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> (Result<Vec<DailyBar>, FetchError>, u32) {
    let run_policy = |policy: RetryPolicy| {
      let client = client.clone();
      let sym = wire_symbol.to_string();
      async move {
        let budget = policy.symbol_budget();
        let op = move || {
          let client = client.clone();
          let sym = sym.clone();
          async move { client.fetch_daily_bars(&sym, start, end).await }
        };
        match timeout(budget, policy.run(op)).await {
          Ok(result) => result,
          Err(_) => Err(FetchError::Timeout(budget.as_secs())),
        }
      }
    };

    let mut attempts = retry.max_attempts;
    match run_policy(retry.clone()).await {
      Err(e) if e.is_retryable() && special_retry => {
        warn!("Retry budget exhausted for {} ({}); entering special retry", wire_symbol, e);
        let special = retry.special();
        attempts += special.max_attempts;
        (run_policy(special).await, attempts)
      }
      other => (other, attempts),
    }
  }

  /// Drive one symbol through the state machine. Fetch failures become
  /// outcomes; only cache and output I/O errors propagate.
  #[allow(clippy::too_many_arguments)]
  async fn process_symbol(
    client: Arc<ChartClient>,
    cache: Arc<CacheStore>,
    config: LoaderConfig,
    cancelled: Arc<AtomicBool>,
    report: Arc<FailureReport>,
    raw_symbol: String,
    start: NaiveDate,
    end: NaiveDate,
  ) -> DownloaderResult<SymbolResult> {
    let symbol = match symbols::canonical(&raw_symbol) {
      Ok(s) => s,
      Err(e) => {
        report.record_entry(FailureEntry {
          symbol: raw_symbol.clone(),
          kind: "BadRequest".to_string(),
          message: e.to_string(),
          attempts: 0,
        });
        return Ok(SymbolResult {
          symbol: raw_symbol,
          outcome: SymbolOutcome::Failed {
            kind: "BadRequest".to_string(),
            message: e.to_string(),
          },
          attempts: 0,
        });
      }
    };

    if cancelled.load(Ordering::SeqCst) {
      return Ok(SymbolResult { symbol, outcome: SymbolOutcome::Cancelled, attempts: 0 });
    }

    if !config.force_update && cache.is_delisted(&symbol)? {
      debug!("{} cached as delisted; skipping", symbol);
      return Ok(SymbolResult { symbol, outcome: SymbolOutcome::SkippedDelisted, attempts: 0 });
    }

    let now = config.reference_time.unwrap_or_else(calendar::now_eastern);
    let plan = if config.force_update {
      let eff_end = calendar::adjust_to_latest_trading_day(end, now);
      if start > eff_end { FetchPlan::none() } else { FetchPlan::full(start, eff_end) }
    } else {
      cache.needs_fetch(&symbol, start, end, now)?
    };

    if !plan.needed() {
      debug!("📦 Cache hit for {}", symbol);
      return Ok(SymbolResult { symbol, outcome: SymbolOutcome::CacheHit, attempts: 0 });
    }

    let wire = symbols::wire_symbol(&symbol);
    let path = csv_store::csv_path(&config.output_dir, &symbol);

    let mut collected: Vec<DailyBar> = Vec::new();
    let mut empty_windows = 0usize;
    let mut attempts_used = 0u32;

    for &(range_start, range_end) in &plan.ranges {
      if cancelled.load(Ordering::SeqCst) {
        return Ok(SymbolResult {
          symbol,
          outcome: SymbolOutcome::Cancelled,
          attempts: attempts_used,
        });
      }

      let (result, attempts) = Self::fetch_range(
        client.clone(),
        &config.retry,
        config.special_retry,
        &wire,
        range_start,
        range_end,
      )
      .await;
      attempts_used += attempts;

      match result {
        Ok(bars) => collected.extend(bars),
        Err(FetchError::Delisted(_)) => {
          cache.mark_delisted(&symbol)?;
          csv_store::write_delisted_marker(&path)?;
          info!("{} reported delisted by upstream", symbol);
          return Ok(SymbolResult {
            symbol,
            outcome: SymbolOutcome::Delisted,
            attempts: attempts_used,
          });
        }
        Err(FetchError::NoData) => {
          cache.record_no_data_range(&symbol, range_start, range_end)?;
          empty_windows += 1;
        }
        Err(e) => {
          error!("{} failed terminally: {}", symbol, e);
          report.record(&symbol, &e, attempts_used);
          return Ok(SymbolResult {
            symbol,
            outcome: SymbolOutcome::Failed {
              kind: e.kind().to_string(),
              message: e.to_string(),
            },
            attempts: attempts_used,
          });
        }
      }
    }

    if collected.is_empty() {
      info!("{}: {} requested window(s), all empty", symbol, empty_windows);
      return Ok(SymbolResult { symbol, outcome: SymbolOutcome::NoData, attempts: attempts_used });
    }

    let validation = validator::validate_bars(collected);
    if validation.rejected > 0 {
      warn!("{}: dropped {} malformed bars", symbol, validation.rejected);
    }
    if validation.bars.is_empty() {
      return Ok(SymbolResult { symbol, outcome: SymbolOutcome::NoData, attempts: attempts_used });
    }

    let rows = csv_store::merge_and_write(&path, &validation.bars)?;

    // Cache update strictly follows the CSV write.
    let fetched_start = plan.ranges.first().map(|r| r.0).unwrap_or(start);
    let fetched_end = plan.ranges.last().map(|r| r.1).unwrap_or(end);
    let ltd = calendar::last_trading_day(now);
    let mut coverage = cache.get_coverage(&symbol)?.unwrap_or(SymbolCoverage {
      symbol: symbol.clone(),
      covered_start: fetched_start,
      covered_end: fetched_end,
      last_update: Utc::now(),
      last_trading_day_at_update: ltd,
      delisted: false,
    });
    coverage.extend(fetched_start, fetched_end);
    coverage.last_update = Utc::now();
    coverage.last_trading_day_at_update = ltd;
    cache.put_coverage(&coverage)?;
    cache.put_latest_trading_day_sentinel(ltd)?;

    info!("{}: wrote {} rows ({} fresh bars)", symbol, rows, validation.bars.len());
    Ok(SymbolResult {
      symbol,
      outcome: SymbolOutcome::Fetched { bars_written: validation.bars.len() },
      attempts: attempts_used,
    })
  }
}

#[async_trait]
impl DataLoader for DownloadLoader {
  type Input = DownloadLoaderInput;
  type Output = DownloadLoaderOutput;

  async fn load(
    &self,
    context: &LoaderContext,
    input: Self::Input,
  ) -> DownloaderResult<Self::Output> {
    info!(
      "Starting download for {} symbols [{} .. {}]",
      input.symbols.len(),
      input.start,
      input.end
    );

    let progress = if context.config.show_progress {
      let pb = ProgressBar::new(input.symbols.len() as u64);
      pb.set_style(
        ProgressStyle::default_bar()
          .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
          .unwrap()
          .progress_chars("##-"),
      );
      pb.set_message("Downloading daily bars");
      Some(pb)
    } else {
      None
    };

    let report = Arc::new(FailureReport::new());
    let client = context.client.clone();
    let cache = context.cache.clone();
    let config = context.config.clone();
    let cancelled = context.cancelled.clone();
    let semaphore = self.semaphore.clone();
    let report_for_workers = report.clone();
    let progress_clone = progress.clone();
    let (start, end) = (input.start, input.end);

    let mut in_flight = stream::iter(input.symbols.into_iter().map(move |symbol| {
      let client = client.clone();
      let cache = cache.clone();
      let config = config.clone();
      let cancelled = cancelled.clone();
      let report = report_for_workers.clone();
      let semaphore = semaphore.clone();
      let progress = progress_clone.clone();

      async move {
        let _permit = semaphore.acquire().await.expect("semaphore closed during run");
        if let Some(ref pb) = progress {
          pb.set_message(symbol.clone());
        }
        let result =
          Self::process_symbol(client, cache, config, cancelled, report, symbol, start, end)
            .await;
        if let Some(ref pb) = progress {
          pb.inc(1);
        }
        result
      }
    }))
    .buffer_unordered(self.workers);

    let mut results = Vec::new();
    while let Some(result) = in_flight.next().await {
      let result = result?;
      info!("{} -> {}", result.symbol, result.outcome.label());
      results.push(result);
    }

    if let Some(pb) = progress {
      pb.finish_with_message("Download complete");
    }

    let mut output = DownloadLoaderOutput {
      results: Vec::new(),
      fetched: 0,
      cache_hits: 0,
      delisted: 0,
      no_data: 0,
      failed: 0,
      cancelled: 0,
      report_path: PathBuf::new(),
    };
    for result in &results {
      match &result.outcome {
        SymbolOutcome::Fetched { .. } => output.fetched += 1,
        SymbolOutcome::CacheHit => output.cache_hits += 1,
        SymbolOutcome::SkippedDelisted | SymbolOutcome::Delisted => output.delisted += 1,
        SymbolOutcome::NoData => output.no_data += 1,
        SymbolOutcome::Failed { .. } => output.failed += 1,
        SymbolOutcome::Cancelled => output.cancelled += 1,
      }
    }
    output.report_path = report.write(&context.config.output_dir)?;
    output.results = results;

    info!(
      "Download complete: {} fetched, {} cache hits, {} delisted, {} no-data, {} failed, {} cancelled",
      output.fetched,
      output.cache_hits,
      output.delisted,
      output.no_data,
      output.failed,
      output.cancelled
    );
    Ok(output)
  }

  fn name(&self) -> &'static str {
    "DownloadLoader"
  }
}
