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

//! HTTP transport for chart requests.
//!
//! Handles request construction, response parsing and the mapping of
//! transport/HTTP/semantic failures onto [`FetchError`]. The header set is
//! deliberately minimal (User-Agent, Accept, Referer and nothing else);
//! larger header sets have been observed to draw HTTP 431 from upstream.

use crate::error::FetchError;
use chrono::{Duration, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use std::time::Duration as StdDuration;
use tracing::{debug, instrument, warn};
use usstock_core::Config;
use usstock_models::{ChartResponse, DailyBar};

/// Bytes of response body retained in malformed-response messages
const SAMPLE_LEN: usize = 200;

/// HTTP transport for the v8 chart endpoint
pub struct Transport {
  client: Client,
  base_url: String,
  timeout_secs: u64,
}

fn unix_seconds(date: NaiveDate) -> i64 {
  date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp()
}

fn truncate_sample(body: &str) -> String {
  let mut end = SAMPLE_LEN.min(body.len());
  while !body.is_char_boundary(end) {
    end -= 1;
  }
  body[..end].to_string()
}

impl Transport {
  /// Create a new transport instance
  pub fn new(config: &Config) -> Result<Self, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(REFERER, HeaderValue::from_static("https://finance.yahoo.com/"));

    let client = Client::builder()
      .timeout(StdDuration::from_secs(config.timeout_secs))
      .user_agent("Mozilla/5.0")
      .default_headers(headers)
      .build()
      .map_err(|e| FetchError::Transient(format!("Failed to create HTTP client: {e}")))?;

    Ok(Self { client, base_url: config.base_url.clone(), timeout_secs: config.timeout_secs })
  }

  /// Get the base URL being used
  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Fetch daily bars for a wire-form symbol over an inclusive date window.
  ///
  /// `period2` is the day after `end`: upstream treats the parameter as an
  /// exclusive instant, so the extra day makes `end` itself part of the
  /// window.
  #[instrument(skip(self), fields(symbol = %wire_symbol))]
  pub async fn fetch_bars(
    &self,
    wire_symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<DailyBar>, FetchError> {
    let url = format!("{}/{}", self.base_url, wire_symbol);
    let period1 = unix_seconds(start).to_string();
    let period2 = unix_seconds(end + Duration::days(1)).to_string();

    debug!("GET {} period1={} period2={}", url, period1, period2);

    let response = self
      .client
      .get(&url)
      .query(&[
        ("period1", period1.as_str()),
        ("period2", period2.as_str()),
        ("interval", "1d"),
        ("events", "history"),
      ])
      .send()
      .await
      .map_err(|e| map_request_error(e, self.timeout_secs))?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
      let retry_after_secs = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());
      warn!("Rate limited for {} (Retry-After: {:?})", wire_symbol, retry_after_secs);
      return Err(FetchError::RateLimited { retry_after_secs });
    }
    if status.is_server_error() {
      return Err(FetchError::ServerError { status: status.as_u16() });
    }
    if !status.is_success() {
      return Err(FetchError::BadRequest { status: status.as_u16() });
    }

    let body = response
      .text()
      .await
      .map_err(|e| FetchError::Transient(format!("Failed to read response body: {e}")))?;

    parse_chart_body(&body)
  }
}

fn map_request_error(err: reqwest::Error, timeout_secs: u64) -> FetchError {
  if err.is_timeout() {
    FetchError::Timeout(timeout_secs)
  } else {
    FetchError::Transient(err.to_string())
  }
}

/// Parse the chart JSON and map semantic failures
fn parse_chart_body(body: &str) -> Result<Vec<DailyBar>, FetchError> {
  let response: ChartResponse = serde_json::from_str(body)
    .map_err(|e| FetchError::MalformedResponse(format!("{e}; body: {}", truncate_sample(body))))?;

  if let Some(error) = response.chart.error {
    if error.is_delisted() {
      return Err(FetchError::Delisted(error.description));
    }
    return Err(FetchError::MalformedResponse(format!(
      "upstream error {}: {}",
      error.code, error.description
    )));
  }

  let results = response.chart.result.unwrap_or_default();
  let result = results.first().ok_or(FetchError::NoData)?;
  if result.is_empty() {
    return Err(FetchError::NoData);
  }

  let bars = result.daily_bars();
  if bars.is_empty() {
    return Err(FetchError::NoData);
  }
  Ok(bars)
}

impl std::fmt::Debug for Transport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Transport").field("base_url", &self.base_url).finish()
  }
}
