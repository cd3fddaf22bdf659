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

//! Database row types. Dates live as ISO-8601 text in SQLite and are
//! parsed at the boundary; a row that fails to parse surfaces as
//! [`CacheError::Corrupt`] rather than silently skewing the cache.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use crate::error::{CacheError, CacheResult};
use crate::schema::{cache_meta, no_data_intervals, runtime_checks, symbol_coverage};
use usstock_models::SymbolCoverage;

const DATE_FMT: &str = "%Y-%m-%d";

pub(crate) fn format_date(date: NaiveDate) -> String {
  date.format(DATE_FMT).to_string()
}

pub(crate) fn parse_date(text: &str) -> CacheResult<NaiveDate> {
  Ok(NaiveDate::parse_from_str(text, DATE_FMT)?)
}

pub(crate) fn parse_timestamp(text: &str) -> CacheResult<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(text)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| CacheError::Corrupt(format!("unparseable timestamp '{text}': {e}")))
}

/// Database row for a symbol's coverage.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = symbol_coverage)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CoverageRow {
  pub symbol: String,
  pub covered_start: String,
  pub covered_end: String,
  pub last_update: String,
  pub last_trading_day: String,
  pub delisted: bool,
}

impl CoverageRow {
  pub fn from_domain(coverage: &SymbolCoverage) -> Self {
    Self {
      symbol: coverage.symbol.clone(),
      covered_start: format_date(coverage.covered_start),
      covered_end: format_date(coverage.covered_end),
      last_update: coverage.last_update.to_rfc3339(),
      last_trading_day: format_date(coverage.last_trading_day_at_update),
      delisted: coverage.delisted,
    }
  }

  pub fn into_domain(self) -> CacheResult<SymbolCoverage> {
    Ok(SymbolCoverage {
      symbol: self.symbol,
      covered_start: parse_date(&self.covered_start)?,
      covered_end: parse_date(&self.covered_end)?,
      last_update: parse_timestamp(&self.last_update)?,
      last_trading_day_at_update: parse_date(&self.last_trading_day)?,
      delisted: self.delisted,
    })
  }
}

/// Database row for a no-data interval (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = no_data_intervals)]
pub struct NewNoDataRow {
  pub symbol: String,
  pub start_date: String,
  pub end_date: String,
}

/// Database row for a no-data interval (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = no_data_intervals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NoDataRow {
  pub id: i32,
  pub symbol: String,
  pub start_date: String,
  pub end_date: String,
}

impl NoDataRow {
  pub fn into_range(self) -> CacheResult<(NaiveDate, NaiveDate)> {
    Ok((parse_date(&self.start_date)?, parse_date(&self.end_date)?))
  }
}

/// Database row for the key-value metadata table.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = cache_meta)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MetaRow {
  pub key: String,
  pub value: String,
  pub updated_at: String,
}

/// Database row for the daily preflight memo.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = runtime_checks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RuntimeCheckRow {
  pub check_date: String,
  pub preflight_passed: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn test_coverage_row_round_trip() {
    let coverage = SymbolCoverage {
      symbol: "BRK.B".to_string(),
      covered_start: ymd(2024, 1, 2),
      covered_end: ymd(2024, 6, 28),
      last_update: "2024-06-28T21:30:00Z".parse().unwrap(),
      last_trading_day_at_update: ymd(2024, 6, 28),
      delisted: false,
    };

    let row = CoverageRow::from_domain(&coverage);
    assert_eq!(row.covered_start, "2024-01-02");
    assert_eq!(row.last_trading_day, "2024-06-28");

    let back = row.into_domain().unwrap();
    assert_eq!(back, coverage);
  }

  #[test]
  fn test_corrupt_date_surfaces_as_error() {
    let row = CoverageRow {
      symbol: "AAPL".to_string(),
      covered_start: "not-a-date".to_string(),
      covered_end: "2024-06-28".to_string(),
      last_update: "2024-06-28T21:30:00Z".to_string(),
      last_trading_day: "2024-06-28".to_string(),
      delisted: false,
    };
    assert!(matches!(row.into_domain().unwrap_err(), CacheError::Corrupt(_)));
  }

  #[test]
  fn test_no_data_row_parses_range() {
    let row = NoDataRow {
      id: 1,
      symbol: "XYZQ".to_string(),
      start_date: "2020-01-01".to_string(),
      end_date: "2020-12-31".to_string(),
    };
    let (start, end) = row.into_range().unwrap();
    assert_eq!(start, ymd(2020, 1, 1));
    assert_eq!(end, ymd(2020, 12, 31));
  }
}
