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

//! Bar sanity filter.
//!
//! Validation is non-fatal: bad bars are dropped and counted, the
//! survivors flow on to the CSV store. The filter is idempotent, so a
//! validated sequence passes through unchanged.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use usstock_core::calendar;
use usstock_models::DailyBar;

/// Tolerance absorbing float-to-decimal rounding noise at the range edges
fn tolerance() -> Decimal {
  Decimal::new(1, 4) // 0.0001
}

/// Result of one validation pass
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
  /// Surviving bars, ascending by date, one per date
  pub bars: Vec<DailyBar>,
  /// Bars dropped (malformed or duplicate)
  pub rejected: usize,
}

/// Filter a bar sequence down to coherent, trading-day bars.
///
/// Drops bars with negative prices or volume, inverted high/low, open or
/// close outside `[low, high]` (beyond tolerance), or a date the calendar
/// says the market was closed. Duplicate dates keep the last occurrence.
pub fn validate_bars(bars: Vec<DailyBar>) -> ValidationOutcome {
  let tol = tolerance();
  let mut by_date: BTreeMap<chrono::NaiveDate, DailyBar> = BTreeMap::new();
  let mut rejected = 0usize;

  for bar in bars {
    if bar.has_negative_price()
      || bar.volume < 0
      || !bar.is_coherent(tol)
      || !calendar::is_trading_day(bar.date)
    {
      rejected += 1;
      continue;
    }
    if by_date.insert(bar.date, bar).is_some() {
      rejected += 1;
    }
  }

  ValidationOutcome { bars: by_date.into_values().collect(), rejected }
}
