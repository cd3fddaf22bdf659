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

//! End-to-end pipeline tests: mock upstream, in-memory cache, temp output.

use chrono::{NaiveDate, TimeZone};
use chrono_tz::America::New_York;
use std::sync::Arc;
use tempfile::TempDir;
use usstock_cache::CacheStore;
use usstock_client::{ChartClient, RetryPolicy};
use usstock_core::Config;
use usstock_downloader::{
  DataLoader, DownloadLoader, DownloadLoaderInput, LoaderConfig, LoaderContext, SymbolOutcome,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AAPL_BODY: &str = r#"{"chart":{"result":[{
  "meta": {"currency": "USD", "symbol": "AAPL"},
  "timestamp": [1704205800, 1704292200, 1704378600, 1704465000],
  "indicators": {
    "quote": [{
      "open":  [187.15, 184.22, 182.15, 181.99],
      "high":  [188.44, 185.88, 183.0872, 182.76],
      "low":   [183.885, 183.43, 180.88, 180.17],
      "close": [185.64, 184.25, 181.91, 181.18],
      "volume": [82488700, 58414500, 71983600, 62303300]
    }],
    "adjclose": [{"adjclose": [184.9021, 183.5176, 181.1869, 180.4598]}]
  }}],"error":null}}"#;

// Second bar is incoherent (high < low); the validator must drop it.
const DIRTY_BODY: &str = r#"{"chart":{"result":[{
  "timestamp": [1704205800, 1704292200],
  "indicators": {
    "quote": [{
      "open":  [187.15, 100.0],
      "high":  [188.44, 99.0],
      "low":   [183.885, 98.0],
      "close": [185.64, 99.5],
      "volume": [82488700, 1000]
    }]
  }}],"error":null}}"#;

const DELISTED_BODY: &str = r#"{"chart":{"result":null,
  "error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;

const EMPTY_BODY: &str = r#"{"chart":{"result":[],"error":null}}"#;

// Friday 2024-07-05 after the close: deterministic calendar decisions.
fn reference_time() -> chrono::DateTime<chrono_tz::Tz> {
  New_York.with_ymd_and_hms(2024, 7, 5, 17, 0, 0).unwrap()
}

fn window() -> (NaiveDate, NaiveDate) {
  (NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
}

struct Harness {
  context: LoaderContext,
  output_dir: TempDir,
}

fn harness(server: &MockServer) -> Harness {
  let output_dir = TempDir::new().unwrap();
  let config = Config {
    base_url: format!("{}/v8/finance/chart", server.uri()),
    ..Config::default()
  };
  let client = Arc::new(ChartClient::new(&config).unwrap().with_cool_off_ms(1));
  let cache = Arc::new(CacheStore::in_memory().unwrap());
  let loader_config = LoaderConfig {
    max_concurrent: 2,
    show_progress: false,
    force_update: false,
    special_retry: false,
    retry: RetryPolicy {
      max_attempts: 2,
      base_delay_ms: 1,
      rate_limit_delay_ms: 1,
      max_delay_ms: 5,
      exponential: true,
      jitter: false,
      attempt_timeout_secs: 5,
    },
    output_dir: output_dir.path().to_path_buf(),
    reference_time: Some(reference_time()),
  };
  Harness { context: LoaderContext::new(client, cache, loader_config), output_dir }
}

fn input(symbols: &[&str]) -> DownloadLoaderInput {
  let (start, end) = window();
  DownloadLoaderInput { symbols: symbols.iter().map(|s| s.to_string()).collect(), start, end }
}

#[tokio::test]
async fn fetches_validates_writes_and_records_coverage() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/v8/finance/chart/AAPL"))
    .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
    .mount(&server)
    .await;

  let h = harness(&server);
  let loader = DownloadLoader::new(2);
  let output = loader.load(&h.context, input(&["AAPL"])).await.unwrap();

  assert_eq!(output.fetched, 1);
  assert!(output.all_clean());
  assert!(matches!(output.results[0].outcome, SymbolOutcome::Fetched { bars_written: 4 }));

  // CSV: header plus four data rows, newest first
  let csv = std::fs::read_to_string(h.output_dir.path().join("AAPL.csv")).unwrap();
  let lines: Vec<&str> = csv.lines().collect();
  assert_eq!(lines.len(), 5);
  assert_eq!(lines[0], "Date,Open,High,Low,Close,AdjClose,Volume");
  assert!(lines[1].starts_with("20240105,"));
  assert!(lines[4].starts_with("20240102,"));

  // coverage spans the requested window
  let coverage = h.context.cache.get_coverage("AAPL").unwrap().unwrap();
  assert_eq!(coverage.covered_start, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
  assert_eq!(coverage.covered_end, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
  assert!(!coverage.delisted);

  // report always written, empty here
  let report = std::fs::read_to_string(output.report_path).unwrap();
  assert!(report.contains("Total failures: 0"));
}

#[tokio::test]
async fn second_run_is_served_from_cache() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/v8/finance/chart/MSFT"))
    .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
    .mount(&server)
    .await;

  let h = harness(&server);
  let loader = DownloadLoader::new(2);

  let first = loader.load(&h.context, input(&["MSFT"])).await.unwrap();
  assert_eq!(first.fetched, 1);
  assert_eq!(server.received_requests().await.unwrap().len(), 1);

  let second = loader.load(&h.context, input(&["MSFT"])).await.unwrap();
  assert_eq!(second.cache_hits, 1);
  assert_eq!(second.fetched, 0);
  // zero additional HTTP requests
  assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn delisted_symbol_writes_marker_and_skips_next_run() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/v8/finance/chart/XYZQ"))
    .respond_with(ResponseTemplate::new(200).set_body_string(DELISTED_BODY))
    .mount(&server)
    .await;

  let h = harness(&server);
  let loader = DownloadLoader::new(2);

  let first = loader.load(&h.context, input(&["XYZQ"])).await.unwrap();
  assert_eq!(first.delisted, 1);
  assert!(first.all_clean());
  assert_eq!(server.received_requests().await.unwrap().len(), 1);

  let marker = std::fs::read_to_string(h.output_dir.path().join("XYZQ.csv")).unwrap();
  assert_eq!(marker.trim_end(), "Date,Open,High,Low,Close,AdjClose,Volume");
  assert!(h.context.cache.is_delisted("XYZQ").unwrap());

  // second run short-circuits before any HTTP
  let second = loader.load(&h.context, input(&["XYZQ"])).await.unwrap();
  assert_eq!(second.delisted, 1);
  assert!(matches!(second.results[0].outcome, SymbolOutcome::SkippedDelisted));
  assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn incoherent_bars_are_dropped_before_the_csv() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/v8/finance/chart/DIRT"))
    .respond_with(ResponseTemplate::new(200).set_body_string(DIRTY_BODY))
    .mount(&server)
    .await;

  let h = harness(&server);
  let loader = DownloadLoader::new(2);
  let output = loader.load(&h.context, input(&["DIRT"])).await.unwrap();

  assert!(matches!(output.results[0].outcome, SymbolOutcome::Fetched { bars_written: 1 }));
  let csv = std::fs::read_to_string(h.output_dir.path().join("DIRT.csv")).unwrap();
  assert_eq!(csv.lines().count(), 2); // header + the one coherent bar
}

#[tokio::test]
async fn empty_window_records_no_data_and_is_not_refetched() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/v8/finance/chart/THIN"))
    .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_BODY))
    .mount(&server)
    .await;

  let h = harness(&server);
  let loader = DownloadLoader::new(2);

  let first = loader.load(&h.context, input(&["THIN"])).await.unwrap();
  assert_eq!(first.no_data, 1);
  assert!(first.all_clean());
  let (start, end) = window();
  assert!(h.context.cache.is_range_entirely_no_data("THIN", start, end).unwrap());

  let second = loader.load(&h.context, input(&["THIN"])).await.unwrap();
  assert_eq!(second.cache_hits, 1);
  assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn terminal_failure_lands_in_the_report() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/v8/finance/chart/BADP"))
    .respond_with(ResponseTemplate::new(404))
    .mount(&server)
    .await;

  let h = harness(&server);
  let loader = DownloadLoader::new(2);
  let output = loader.load(&h.context, input(&["BADP"])).await.unwrap();

  assert_eq!(output.failed, 1);
  assert!(!output.all_clean());

  let report = std::fs::read_to_string(output.report_path).unwrap();
  assert!(report.contains("BADP"));
  assert!(report.contains("BadRequest: 1"));
}

#[tokio::test]
async fn mixed_universe_aggregates_every_outcome() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/v8/finance/chart/AAPL"))
    .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/v8/finance/chart/XYZQ"))
    .respond_with(ResponseTemplate::new(200).set_body_string(DELISTED_BODY))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/v8/finance/chart/BADP"))
    .respond_with(ResponseTemplate::new(404))
    .mount(&server)
    .await;

  let h = harness(&server);
  let loader = DownloadLoader::new(3);
  let output = loader.load(&h.context, input(&["AAPL", "XYZQ", "BADP"])).await.unwrap();

  assert_eq!(output.fetched, 1);
  assert_eq!(output.delisted, 1);
  assert_eq!(output.failed, 1);
  assert_eq!(output.results.len(), 3);
  assert!(!output.all_clean());
}

#[tokio::test]
async fn class_share_round_trip_uses_all_three_symbol_forms() {
  let server = MockServer::start().await;
  // wire form carries the dash
  Mock::given(method("GET"))
    .and(path("/v8/finance/chart/BRK-B"))
    .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
    .mount(&server)
    .await;

  let h = harness(&server);
  let loader = DownloadLoader::new(1);
  let output = loader.load(&h.context, input(&["BRK.B"])).await.unwrap();
  assert_eq!(output.fetched, 1);

  // file form carries the underscore
  assert!(h.output_dir.path().join("BRK_B.csv").exists());
  // cache key keeps the operator's dot form
  assert!(h.context.cache.get_coverage("BRK.B").unwrap().is_some());
}
