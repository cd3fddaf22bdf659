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

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// What the cache claims about one symbol's CSV file.
///
/// `covered_start..=covered_end` is the inclusive window the file is known
/// to be up to date for. The range only ever grows on the successful path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolCoverage {
  /// Cache key: the operator's symbol form (e.g. `BRK.B`, `^GSPC`)
  pub symbol: String,
  pub covered_start: NaiveDate,
  pub covered_end: NaiveDate,
  pub last_update: DateTime<Utc>,
  /// Latest closed trading day observed when the coverage was written
  pub last_trading_day_at_update: NaiveDate,
  pub delisted: bool,
}

impl SymbolCoverage {
  /// Whether `[start, end]` is entirely inside the covered window
  pub fn contains(&self, start: NaiveDate, end: NaiveDate) -> bool {
    start >= self.covered_start && end <= self.covered_end
  }

  /// Grow the covered window to include `[start, end]`
  pub fn extend(&mut self, start: NaiveDate, end: NaiveDate) {
    self.covered_start = self.covered_start.min(start);
    self.covered_end = self.covered_end.max(end);
  }
}

/// Process-wide cached observation of the most recent closed session.
///
/// Lets a run answer "is the cache stale?" without recomputing against the
/// wall clock on every symbol; refreshed whenever a batch succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestTradingDaySentinel {
  pub value: NaiveDate,
  pub fetched_at: DateTime<Utc>,
}

impl LatestTradingDaySentinel {
  pub fn new(value: NaiveDate, fetched_at: DateTime<Utc>) -> Self {
    Self { value, fetched_at }
  }

  /// Fresh while younger than `ttl_hours`
  pub fn is_fresh(&self, now: DateTime<Utc>, ttl_hours: i64) -> bool {
    now - self.fetched_at < Duration::hours(ttl_hours)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn coverage() -> SymbolCoverage {
    SymbolCoverage {
      symbol: "AAPL".to_string(),
      covered_start: ymd(2024, 1, 2),
      covered_end: ymd(2024, 6, 28),
      last_update: Utc::now(),
      last_trading_day_at_update: ymd(2024, 6, 28),
      delisted: false,
    }
  }

  #[test]
  fn test_contains_inner_range() {
    let cov = coverage();
    assert!(cov.contains(ymd(2024, 2, 1), ymd(2024, 3, 1)));
    assert!(cov.contains(ymd(2024, 1, 2), ymd(2024, 6, 28)));
  }

  #[test]
  fn test_contains_rejects_outside_range() {
    let cov = coverage();
    assert!(!cov.contains(ymd(2023, 12, 1), ymd(2024, 3, 1)));
    assert!(!cov.contains(ymd(2024, 2, 1), ymd(2024, 7, 1)));
  }

  #[test]
  fn test_extend_is_monotonic() {
    let mut cov = coverage();
    cov.extend(ymd(2024, 3, 1), ymd(2024, 4, 1));
    assert_eq!(cov.covered_start, ymd(2024, 1, 2));
    assert_eq!(cov.covered_end, ymd(2024, 6, 28));

    cov.extend(ymd(2023, 1, 3), ymd(2024, 7, 5));
    assert_eq!(cov.covered_start, ymd(2023, 1, 3));
    assert_eq!(cov.covered_end, ymd(2024, 7, 5));
  }

  #[test]
  fn test_sentinel_freshness() {
    let now = Utc::now();
    let fresh = LatestTradingDaySentinel::new(ymd(2024, 6, 28), now - Duration::hours(2));
    assert!(fresh.is_fresh(now, 6));

    let stale = LatestTradingDaySentinel::new(ymd(2024, 6, 28), now - Duration::hours(7));
    assert!(!stale.is_fresh(now, 6));
  }
}
