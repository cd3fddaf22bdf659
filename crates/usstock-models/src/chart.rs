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

//! Serde models for the v8 chart endpoint response.
//!
//! The upstream shape is columnar: one `timestamp` array plus parallel
//! `open`/`high`/`low`/`close`/`volume` arrays in which individual entries
//! may be null. [`ChartResult::daily_bars`] zips the columns back into row
//! form, dropping every index where any of the four prices is missing.

use crate::bar::DailyBar;
use chrono::{DateTime, NaiveDate};
use chrono_tz::America::New_York;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places kept when converting response floats
const PRICE_SCALE: u32 = 4;

/// Top-level chart response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse {
  pub chart: Chart,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
  #[serde(default)]
  pub result: Option<Vec<ChartResult>>,
  #[serde(default)]
  pub error: Option<ChartError>,
}

/// Upstream error object (`{code, description}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartError {
  pub code: String,
  pub description: String,
}

impl ChartError {
  /// The permanent "no data found, symbol may be delisted" signature
  pub fn is_delisted(&self) -> bool {
    self.code == "Not Found" && self.description.contains("may be delisted")
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResult {
  #[serde(default)]
  pub timestamp: Vec<i64>,
  pub indicators: Indicators,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicators {
  #[serde(default)]
  pub quote: Vec<QuoteBlock>,
  #[serde(default)]
  pub adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteBlock {
  #[serde(default)]
  pub open: Vec<Option<f64>>,
  #[serde(default)]
  pub high: Vec<Option<f64>>,
  #[serde(default)]
  pub low: Vec<Option<f64>>,
  #[serde(default)]
  pub close: Vec<Option<f64>>,
  #[serde(default)]
  pub volume: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjCloseBlock {
  #[serde(default)]
  pub adjclose: Vec<Option<f64>>,
}

fn decimal_at(column: &[Option<f64>], idx: usize) -> Option<Decimal> {
  let value = (*column.get(idx)?)?;
  Decimal::from_f64_retain(value).map(|d| d.round_dp(PRICE_SCALE).normalize())
}

fn session_date(epoch_secs: i64) -> Option<NaiveDate> {
  // Chart timestamps are session instants in UTC; the civil trading date
  // only falls out after conversion to Eastern time.
  Some(DateTime::from_timestamp(epoch_secs, 0)?.with_timezone(&New_York).date_naive())
}

impl ChartResult {
  /// Zip the columnar arrays into bars, ascending by date.
  ///
  /// An index is dropped when any of open/high/low/close is null or not a
  /// finite number. A missing adjusted close falls back to the close; a
  /// missing volume (common for indices) becomes zero.
  pub fn daily_bars(&self) -> Vec<DailyBar> {
    let quote = match self.indicators.quote.first() {
      Some(q) => q,
      None => return Vec::new(),
    };
    let adjclose = self.indicators.adjclose.first();

    let mut bars = Vec::with_capacity(self.timestamp.len());
    for (idx, &ts) in self.timestamp.iter().enumerate() {
      let date = match session_date(ts) {
        Some(d) => d,
        None => continue,
      };
      let (open, high, low, close) = match (
        decimal_at(&quote.open, idx),
        decimal_at(&quote.high, idx),
        decimal_at(&quote.low, idx),
        decimal_at(&quote.close, idx),
      ) {
        (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
        _ => continue,
      };
      let adj_close =
        adjclose.and_then(|block| decimal_at(&block.adjclose, idx)).unwrap_or(close);
      let volume = quote.volume.get(idx).copied().flatten().unwrap_or(0);

      bars.push(DailyBar { date, open, high, low, close, adj_close, volume });
    }
    bars
  }

  /// True when the result carries no usable price points at all
  pub fn is_empty(&self) -> bool {
    self.timestamp.is_empty()
      || self.indicators.quote.first().map_or(true, |q| q.close.iter().all(Option::is_none))
  }
}
