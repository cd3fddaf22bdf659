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

//! The cache store and its fetch-decision function.
//!
//! All writes commit through SQLite transactions, so a crash mid-run
//! leaves the previous state intact. The decision function errs toward
//! fetching: a wrong "skip" would silently lose data, a wrong "fetch"
//! only costs one request.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use std::path::Path;
use tracing::{debug, info};

use crate::connection::{create_pool, run_migrations, DbPool};
use crate::error::{CacheError, CacheResult};
use crate::models::{format_date, parse_date, CoverageRow, MetaRow, NewNoDataRow, NoDataRow, RuntimeCheckRow};
use crate::schema::{cache_meta, no_data_intervals, runtime_checks, symbol_coverage};
use usstock_core::calendar;
use usstock_models::SymbolCoverage;

const SENTINEL_KEY: &str = "latest_trading_day";

/// The sub-ranges a symbol still needs fetched, possibly none
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchPlan {
  pub ranges: Vec<(NaiveDate, NaiveDate)>,
}

impl FetchPlan {
  pub fn none() -> Self {
    Self::default()
  }

  pub fn full(start: NaiveDate, end: NaiveDate) -> Self {
    Self { ranges: vec![(start, end)] }
  }

  pub fn needed(&self) -> bool {
    !self.ranges.is_empty()
  }
}

/// Aggregate counts for the `cache stats` command
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
  pub symbols: i64,
  pub delisted: i64,
  pub no_data_intervals: i64,
}

/// Persistent cache over one SQLite file.
///
/// The store is the only owner of the cache file; every other component
/// receives a shared handle. Reads see consistent snapshots, writes
/// serialise through SQLite.
pub struct CacheStore {
  pool: DbPool,
}

/// Coalesce `new` into a set of disjoint inclusive ranges, merging
/// overlapping or date-adjacent neighbours.
fn merge_intervals(
  mut intervals: Vec<(NaiveDate, NaiveDate)>,
  new: (NaiveDate, NaiveDate),
) -> Vec<(NaiveDate, NaiveDate)> {
  let new = (new.0.min(new.1), new.0.max(new.1));
  intervals.push(new);
  intervals.sort();

  let mut merged: Vec<(NaiveDate, NaiveDate)> = Vec::with_capacity(intervals.len());
  for (start, end) in intervals {
    if let Some(last) = merged.last_mut() {
      if start <= last.1 + Duration::days(1) {
        last.1 = last.1.max(end);
        continue;
      }
    }
    merged.push((start, end));
  }
  merged
}

impl CacheStore {
  /// Open (or create) the cache database at `db_path`, running migrations.
  pub fn open(db_path: &Path) -> CacheResult<Self> {
    if let Some(parent) = db_path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let pool = create_pool(&db_path.to_string_lossy(), 5)?;
    run_migrations(&pool)?;
    info!("Cache database ready at {}", db_path.display());
    Ok(Self { pool })
  }

  /// An in-memory store for tests. One pooled connection, or every
  /// checkout would see a different empty database.
  pub fn in_memory() -> CacheResult<Self> {
    let pool = create_pool(":memory:", 1)?;
    run_migrations(&pool)?;
    Ok(Self { pool })
  }

  fn conn(&self) -> CacheResult<PooledConnection<ConnectionManager<SqliteConnection>>> {
    self.pool.get().map_err(|e| CacheError::Connection(e.to_string()))
  }

  /// Coverage claimed for a symbol, if any
  pub fn get_coverage(&self, symbol: &str) -> CacheResult<Option<SymbolCoverage>> {
    let mut conn = self.conn()?;
    let row = symbol_coverage::table
      .find(symbol)
      .select(CoverageRow::as_select())
      .first(&mut conn)
      .optional()?;
    row.map(CoverageRow::into_domain).transpose()
  }

  /// Upsert a symbol's coverage
  pub fn put_coverage(&self, coverage: &SymbolCoverage) -> CacheResult<()> {
    let mut conn = self.conn()?;
    let row = CoverageRow::from_domain(coverage);
    diesel::replace_into(symbol_coverage::table).values(&row).execute(&mut conn)?;
    debug!(
      "Coverage for {} now [{}, {}]",
      coverage.symbol, coverage.covered_start, coverage.covered_end
    );
    Ok(())
  }

  pub fn is_delisted(&self, symbol: &str) -> CacheResult<bool> {
    let mut conn = self.conn()?;
    let flag = symbol_coverage::table
      .find(symbol)
      .select(symbol_coverage::delisted)
      .first::<bool>(&mut conn)
      .optional()?;
    Ok(flag.unwrap_or(false))
  }

  /// Remember that upstream permanently reports "no data" for a symbol.
  ///
  /// Delisting can precede any successful fetch; the coverage window is a
  /// degenerate epoch range in that case and is never consulted.
  pub fn mark_delisted(&self, symbol: &str) -> CacheResult<()> {
    let mut conn = self.conn()?;
    let updated = diesel::update(symbol_coverage::table.find(symbol))
      .set(symbol_coverage::delisted.eq(true))
      .execute(&mut conn)?;

    if updated == 0 {
      let epoch = "1970-01-01".to_string();
      let row = CoverageRow {
        symbol: symbol.to_string(),
        covered_start: epoch.clone(),
        covered_end: epoch.clone(),
        last_update: Utc::now().to_rfc3339(),
        last_trading_day: epoch,
        delisted: true,
      };
      diesel::insert_into(symbol_coverage::table).values(&row).execute(&mut conn)?;
    }
    info!("Marked {} as delisted", symbol);
    Ok(())
  }

  /// Record a window known to produce zero bars, coalescing with the
  /// intervals already on file.
  pub fn record_no_data_range(
    &self,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> CacheResult<()> {
    let mut conn = self.conn()?;
    conn.transaction::<_, CacheError, _>(|conn| {
      let existing = no_data_intervals::table
        .filter(no_data_intervals::symbol.eq(symbol))
        .select(NoDataRow::as_select())
        .load(conn)?
        .into_iter()
        .map(NoDataRow::into_range)
        .collect::<CacheResult<Vec<_>>>()?;

      let merged = merge_intervals(existing, (start, end));

      diesel::delete(no_data_intervals::table.filter(no_data_intervals::symbol.eq(symbol)))
        .execute(conn)?;
      let rows: Vec<NewNoDataRow> = merged
        .into_iter()
        .map(|(s, e)| NewNoDataRow {
          symbol: symbol.to_string(),
          start_date: format_date(s),
          end_date: format_date(e),
        })
        .collect();
      diesel::insert_into(no_data_intervals::table).values(&rows).execute(conn)?;
      Ok(())
    })
  }

  /// All recorded no-data intervals for a symbol, ascending and disjoint
  pub fn no_data_intervals(&self, symbol: &str) -> CacheResult<Vec<(NaiveDate, NaiveDate)>> {
    let mut conn = self.conn()?;
    let mut ranges = no_data_intervals::table
      .filter(no_data_intervals::symbol.eq(symbol))
      .select(NoDataRow::as_select())
      .load(&mut conn)?
      .into_iter()
      .map(NoDataRow::into_range)
      .collect::<CacheResult<Vec<_>>>()?;
    ranges.sort();
    Ok(ranges)
  }

  /// Whether `[start, end]` lies wholly inside one recorded interval
  pub fn is_range_entirely_no_data(
    &self,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> CacheResult<bool> {
    let intervals = self.no_data_intervals(symbol)?;
    Ok(intervals.iter().any(|(s, e)| *s <= start && end <= *e))
  }

  /// The cached latest-trading-day observation plus its freshness
  pub fn latest_trading_day_sentinel(&self) -> CacheResult<Option<(NaiveDate, bool)>> {
    let mut conn = self.conn()?;
    let row = cache_meta::table
      .find(SENTINEL_KEY)
      .select(MetaRow::as_select())
      .first(&mut conn)
      .optional()?;

    match row {
      None => Ok(None),
      Some(row) => {
        let value = parse_date(&row.value)?;
        let fetched_at = crate::models::parse_timestamp(&row.updated_at)?;
        let sentinel = usstock_models::LatestTradingDaySentinel::new(value, fetched_at);
        let fresh = sentinel.is_fresh(Utc::now(), usstock_core::SENTINEL_TTL_HOURS);
        Ok(Some((value, fresh)))
      }
    }
  }

  pub fn put_latest_trading_day_sentinel(&self, value: NaiveDate) -> CacheResult<()> {
    let mut conn = self.conn()?;
    let row = MetaRow {
      key: SENTINEL_KEY.to_string(),
      value: format_date(value),
      updated_at: Utc::now().to_rfc3339(),
    };
    diesel::replace_into(cache_meta::table).values(&row).execute(&mut conn)?;
    Ok(())
  }

  /// Daily preflight memo: `None` when today has not been checked yet
  pub fn runtime_check(&self, date: NaiveDate) -> CacheResult<Option<bool>> {
    let mut conn = self.conn()?;
    let row = runtime_checks::table
      .find(format_date(date))
      .select(RuntimeCheckRow::as_select())
      .first(&mut conn)
      .optional()?;
    Ok(row.map(|r| r.preflight_passed))
  }

  pub fn record_runtime_check(&self, date: NaiveDate, passed: bool) -> CacheResult<()> {
    let mut conn = self.conn()?;
    let row = RuntimeCheckRow { check_date: format_date(date), preflight_passed: passed };
    diesel::replace_into(runtime_checks::table).values(&row).execute(&mut conn)?;
    Ok(())
  }

  /// Operator-initiated wipe of every table
  pub fn clear_all(&self) -> CacheResult<()> {
    let mut conn = self.conn()?;
    conn.transaction::<_, CacheError, _>(|conn| {
      diesel::delete(symbol_coverage::table).execute(conn)?;
      diesel::delete(no_data_intervals::table).execute(conn)?;
      diesel::delete(cache_meta::table).execute(conn)?;
      diesel::delete(runtime_checks::table).execute(conn)?;
      Ok(())
    })?;
    info!("Cache cleared");
    Ok(())
  }

  /// Aggregate counts for the stats command
  pub fn stats(&self) -> CacheResult<CacheStats> {
    let mut conn = self.conn()?;
    let symbols = symbol_coverage::table.count().get_result(&mut conn)?;
    let delisted = symbol_coverage::table
      .filter(symbol_coverage::delisted.eq(true))
      .count()
      .get_result(&mut conn)?;
    let intervals = no_data_intervals::table.count().get_result(&mut conn)?;
    Ok(CacheStats { symbols, delisted, no_data_intervals: intervals })
  }

  fn drop_known_empty(
    &self,
    symbol: &str,
    ranges: Vec<(NaiveDate, NaiveDate)>,
  ) -> CacheResult<Vec<(NaiveDate, NaiveDate)>> {
    let mut kept = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
      if self.is_range_entirely_no_data(symbol, start, end)? {
        debug!("Skipping known-empty window [{start}, {end}] for {symbol}");
      } else {
        kept.push((start, end));
      }
    }
    Ok(kept)
  }

  /// Decide what, if anything, must be fetched for a symbol and window.
  ///
  /// Follows the cache rules in order: delisted symbols never fetch; an
  /// open market always fetches (the final bar is still moving); a
  /// same-day request against coverage that already reaches the latest
  /// closed session is subsumed (today's bar cannot exist before the
  /// close); otherwise the answer is the symmetric difference between the
  /// requested window and the covered window, trading-day aligned, minus
  /// windows known to be empty.
  pub fn needs_fetch(
    &self,
    symbol: &str,
    requested_start: NaiveDate,
    requested_end: NaiveDate,
    now: DateTime<Tz>,
  ) -> CacheResult<FetchPlan> {
    let eff_end = calendar::adjust_to_latest_trading_day(requested_end, now);
    if requested_start > eff_end {
      return Ok(FetchPlan::none());
    }

    if self.is_delisted(symbol)? {
      debug!("{} is delisted; skipping", symbol);
      return Ok(FetchPlan::none());
    }

    let coverage = match self.get_coverage(symbol)? {
      Some(c) => c,
      None => {
        let ranges = self.drop_known_empty(symbol, vec![(requested_start, eff_end)])?;
        return Ok(FetchPlan { ranges });
      }
    };

    if calendar::is_market_open(now) {
      let ranges = self.drop_known_empty(symbol, vec![(requested_start, eff_end)])?;
      return Ok(FetchPlan { ranges });
    }

    let ltd = calendar::last_trading_day(now);
    let today = now.date_naive();

    // A request ending "today" against coverage that already reaches the
    // latest closed session: today's bar will not exist until the close,
    // so the calendar gap is not a real gap.
    let eff_end = if requested_end == today && coverage.covered_end == ltd {
      eff_end.min(coverage.covered_end)
    } else {
      eff_end
    };

    let mut ranges = Vec::new();
    if requested_start < coverage.covered_start {
      let head_end = calendar::previous_trading_day(coverage.covered_start);
      if requested_start <= head_end {
        ranges.push((requested_start, head_end));
      }
    }
    if eff_end > coverage.covered_end {
      let tail_start = calendar::next_trading_day(coverage.covered_end);
      if tail_start <= eff_end {
        ranges.push((tail_start, eff_end));
      }
    }

    let ranges = self.drop_known_empty(symbol, ranges)?;
    Ok(FetchPlan { ranges })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use chrono_tz::America::New_York;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn eastern(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
    New_York.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
  }

  fn coverage(symbol: &str, start: NaiveDate, end: NaiveDate, ltd: NaiveDate) -> SymbolCoverage {
    SymbolCoverage {
      symbol: symbol.to_string(),
      covered_start: start,
      covered_end: end,
      last_update: Utc::now(),
      last_trading_day_at_update: ltd,
      delisted: false,
    }
  }

  // Friday 2024-07-05 after the close; last trading day is that Friday.
  fn friday_evening() -> DateTime<Tz> {
    eastern(2024, 7, 5, 17, 0)
  }

  #[test]
  fn test_merge_intervals_disjoint() {
    let merged = merge_intervals(vec![(ymd(2024, 1, 1), ymd(2024, 1, 10))], (ymd(2024, 3, 1), ymd(2024, 3, 5)));
    assert_eq!(merged, vec![(ymd(2024, 1, 1), ymd(2024, 1, 10)), (ymd(2024, 3, 1), ymd(2024, 3, 5))]);
  }

  #[test]
  fn test_merge_intervals_overlapping() {
    let merged =
      merge_intervals(vec![(ymd(2024, 1, 1), ymd(2024, 1, 10))], (ymd(2024, 1, 5), ymd(2024, 1, 20)));
    assert_eq!(merged, vec![(ymd(2024, 1, 1), ymd(2024, 1, 20))]);
  }

  #[test]
  fn test_merge_intervals_adjacent() {
    let merged =
      merge_intervals(vec![(ymd(2024, 1, 1), ymd(2024, 1, 10))], (ymd(2024, 1, 11), ymd(2024, 1, 20)));
    assert_eq!(merged, vec![(ymd(2024, 1, 1), ymd(2024, 1, 20))]);
  }

  #[test]
  fn test_merge_intervals_normalises_reversed_input() {
    let merged = merge_intervals(Vec::new(), (ymd(2024, 1, 10), ymd(2024, 1, 1)));
    assert_eq!(merged, vec![(ymd(2024, 1, 1), ymd(2024, 1, 10))]);
  }

  #[test]
  fn test_coverage_round_trip_and_upsert() {
    let store = CacheStore::in_memory().unwrap();
    let mut cov = coverage("AAPL", ymd(2024, 1, 2), ymd(2024, 6, 28), ymd(2024, 6, 28));
    store.put_coverage(&cov).unwrap();

    let loaded = store.get_coverage("AAPL").unwrap().unwrap();
    assert_eq!(loaded.covered_start, ymd(2024, 1, 2));

    cov.covered_end = ymd(2024, 7, 5);
    store.put_coverage(&cov).unwrap();
    let loaded = store.get_coverage("AAPL").unwrap().unwrap();
    assert_eq!(loaded.covered_end, ymd(2024, 7, 5));
  }

  #[test]
  fn test_missing_symbol_has_no_coverage() {
    let store = CacheStore::in_memory().unwrap();
    assert!(store.get_coverage("NOPE").unwrap().is_none());
    assert!(!store.is_delisted("NOPE").unwrap());
  }

  #[test]
  fn test_mark_delisted_without_prior_coverage() {
    let store = CacheStore::in_memory().unwrap();
    store.mark_delisted("XYZQ").unwrap();
    assert!(store.is_delisted("XYZQ").unwrap());

    let plan = store.needs_fetch("XYZQ", ymd(2024, 1, 2), ymd(2024, 1, 5), friday_evening()).unwrap();
    assert!(!plan.needed());
  }

  #[test]
  fn test_mark_delisted_preserves_existing_window() {
    let store = CacheStore::in_memory().unwrap();
    store.put_coverage(&coverage("OLD", ymd(2020, 1, 2), ymd(2021, 1, 4), ymd(2021, 1, 4))).unwrap();
    store.mark_delisted("OLD").unwrap();

    let cov = store.get_coverage("OLD").unwrap().unwrap();
    assert!(cov.delisted);
    assert_eq!(cov.covered_start, ymd(2020, 1, 2));
  }

  #[test]
  fn test_no_data_intervals_stay_disjoint_and_sorted() {
    let store = CacheStore::in_memory().unwrap();
    store.record_no_data_range("THIN", ymd(2024, 3, 1), ymd(2024, 3, 10)).unwrap();
    store.record_no_data_range("THIN", ymd(2024, 1, 1), ymd(2024, 1, 5)).unwrap();
    store.record_no_data_range("THIN", ymd(2024, 3, 5), ymd(2024, 3, 20)).unwrap();

    let intervals = store.no_data_intervals("THIN").unwrap();
    assert_eq!(intervals, vec![(ymd(2024, 1, 1), ymd(2024, 1, 5)), (ymd(2024, 3, 1), ymd(2024, 3, 20))]);
    assert!(intervals.windows(2).all(|w| w[0].1 < w[1].0));
  }

  #[test]
  fn test_is_range_entirely_no_data() {
    let store = CacheStore::in_memory().unwrap();
    store.record_no_data_range("THIN", ymd(2024, 1, 1), ymd(2024, 1, 31)).unwrap();

    assert!(store.is_range_entirely_no_data("THIN", ymd(2024, 1, 5), ymd(2024, 1, 20)).unwrap());
    assert!(!store.is_range_entirely_no_data("THIN", ymd(2024, 1, 5), ymd(2024, 2, 5)).unwrap());
    assert!(!store.is_range_entirely_no_data("OTHER", ymd(2024, 1, 5), ymd(2024, 1, 20)).unwrap());
  }

  #[test]
  fn test_needs_fetch_no_coverage_is_full_range() {
    let store = CacheStore::in_memory().unwrap();
    let plan = store.needs_fetch("AAPL", ymd(2024, 1, 2), ymd(2024, 1, 5), friday_evening()).unwrap();
    assert_eq!(plan.ranges, vec![(ymd(2024, 1, 2), ymd(2024, 1, 5))]);
  }

  #[test]
  fn test_needs_fetch_subsumed_range_skips() {
    let store = CacheStore::in_memory().unwrap();
    store
      .put_coverage(&coverage("AAPL", ymd(2024, 1, 2), ymd(2024, 6, 28), ymd(2024, 6, 28)))
      .unwrap();

    let plan = store.needs_fetch("AAPL", ymd(2024, 2, 1), ymd(2024, 3, 1), friday_evening()).unwrap();
    assert!(!plan.needed());
  }

  #[test]
  fn test_needs_fetch_head_gap_is_trading_day_aligned() {
    let store = CacheStore::in_memory().unwrap();
    store
      .put_coverage(&coverage("AAPL", ymd(2024, 1, 2), ymd(2024, 6, 28), ymd(2024, 6, 28)))
      .unwrap();

    let plan =
      store.needs_fetch("AAPL", ymd(2023, 12, 1), ymd(2024, 3, 1), friday_evening()).unwrap();
    // head ends at the trading day before covered_start
    assert_eq!(plan.ranges, vec![(ymd(2023, 12, 1), ymd(2023, 12, 29))]);
  }

  #[test]
  fn test_needs_fetch_tail_gap_is_trading_day_aligned() {
    let store = CacheStore::in_memory().unwrap();
    store
      .put_coverage(&coverage("AAPL", ymd(2024, 1, 2), ymd(2024, 6, 28), ymd(2024, 6, 28)))
      .unwrap();

    let plan = store.needs_fetch("AAPL", ymd(2024, 2, 1), ymd(2024, 7, 3), friday_evening()).unwrap();
    // 2024-06-28 is a Friday; the tail starts the following Monday
    assert_eq!(plan.ranges, vec![(ymd(2024, 7, 1), ymd(2024, 7, 3))]);
  }

  #[test]
  fn test_needs_fetch_both_gaps() {
    let store = CacheStore::in_memory().unwrap();
    store
      .put_coverage(&coverage("AAPL", ymd(2024, 2, 1), ymd(2024, 2, 29), ymd(2024, 6, 28)))
      .unwrap();

    let plan = store.needs_fetch("AAPL", ymd(2024, 1, 2), ymd(2024, 3, 28), friday_evening()).unwrap();
    assert_eq!(plan.ranges.len(), 2);
    assert_eq!(plan.ranges[0], (ymd(2024, 1, 2), ymd(2024, 1, 31)));
    assert_eq!(plan.ranges[1], (ymd(2024, 3, 1), ymd(2024, 3, 28)));
  }

  #[test]
  fn test_needs_fetch_same_day_rerun_is_subsumed() {
    // Monday 2024-07-08 at 08:00, before the open: last closed session is
    // Friday 07-05 and the cache already reaches it. A request ending
    // "today" must not refetch.
    let store = CacheStore::in_memory().unwrap();
    store
      .put_coverage(&coverage("MSFT", ymd(2024, 1, 2), ymd(2024, 7, 5), ymd(2024, 7, 5)))
      .unwrap();

    let now = eastern(2024, 7, 8, 8, 0);
    let plan = store.needs_fetch("MSFT", ymd(2024, 1, 2), ymd(2024, 7, 8), now).unwrap();
    assert!(!plan.needed());
  }

  #[test]
  fn test_needs_fetch_market_open_always_fetches() {
    let store = CacheStore::in_memory().unwrap();
    store
      .put_coverage(&coverage("MSFT", ymd(2024, 1, 2), ymd(2024, 7, 5), ymd(2024, 7, 5)))
      .unwrap();

    let now = eastern(2024, 7, 8, 12, 0);
    let plan = store.needs_fetch("MSFT", ymd(2024, 2, 1), ymd(2024, 7, 8), now).unwrap();
    // effective end while the session runs is the previous trading day
    assert_eq!(plan.ranges, vec![(ymd(2024, 2, 1), ymd(2024, 7, 5))]);
  }

  #[test]
  fn test_needs_fetch_stale_coverage_fetches_new_sessions() {
    let store = CacheStore::in_memory().unwrap();
    store
      .put_coverage(&coverage("MSFT", ymd(2024, 1, 2), ymd(2024, 7, 1), ymd(2024, 7, 1)))
      .unwrap();

    let plan = store.needs_fetch("MSFT", ymd(2024, 1, 2), ymd(2024, 7, 5), friday_evening()).unwrap();
    assert_eq!(plan.ranges, vec![(ymd(2024, 7, 2), ymd(2024, 7, 5))]);
  }

  #[test]
  fn test_needs_fetch_drops_known_empty_windows() {
    let store = CacheStore::in_memory().unwrap();
    store.record_no_data_range("THIN", ymd(2024, 1, 1), ymd(2024, 1, 31)).unwrap();

    let plan = store.needs_fetch("THIN", ymd(2024, 1, 2), ymd(2024, 1, 30), friday_evening()).unwrap();
    assert!(!plan.needed());
  }

  #[test]
  fn test_needs_fetch_degenerate_window() {
    let store = CacheStore::in_memory().unwrap();
    // requested start after the effective end
    let plan = store.needs_fetch("AAPL", ymd(2024, 7, 5), ymd(2024, 7, 4), friday_evening()).unwrap();
    assert!(!plan.needed());
  }

  #[test]
  fn test_sentinel_round_trip() {
    let store = CacheStore::in_memory().unwrap();
    assert!(store.latest_trading_day_sentinel().unwrap().is_none());

    store.put_latest_trading_day_sentinel(ymd(2024, 7, 5)).unwrap();
    let (value, fresh) = store.latest_trading_day_sentinel().unwrap().unwrap();
    assert_eq!(value, ymd(2024, 7, 5));
    assert!(fresh);
  }

  #[test]
  fn test_runtime_check_memo() {
    let store = CacheStore::in_memory().unwrap();
    let today = ymd(2024, 7, 5);
    assert!(store.runtime_check(today).unwrap().is_none());

    store.record_runtime_check(today, true).unwrap();
    assert_eq!(store.runtime_check(today).unwrap(), Some(true));
  }

  #[test]
  fn test_clear_all_wipes_everything() {
    let store = CacheStore::in_memory().unwrap();
    store
      .put_coverage(&coverage("AAPL", ymd(2024, 1, 2), ymd(2024, 6, 28), ymd(2024, 6, 28)))
      .unwrap();
    store.record_no_data_range("THIN", ymd(2024, 1, 1), ymd(2024, 1, 5)).unwrap();
    store.put_latest_trading_day_sentinel(ymd(2024, 7, 5)).unwrap();

    store.clear_all().unwrap();
    assert!(store.get_coverage("AAPL").unwrap().is_none());
    assert!(store.no_data_intervals("THIN").unwrap().is_empty());
    assert!(store.latest_trading_day_sentinel().unwrap().is_none());
    let stats = store.stats().unwrap();
    assert_eq!(stats.symbols, 0);
    assert_eq!(stats.no_data_intervals, 0);
  }

  #[test]
  fn test_reopen_preserves_state() {
    let dir = tempfile::TempDir::new().unwrap();
    let db_path = dir.path().join("cache.db");

    {
      let store = CacheStore::open(&db_path).unwrap();
      store
        .put_coverage(&coverage("AAPL", ymd(2024, 1, 2), ymd(2024, 6, 28), ymd(2024, 6, 28)))
        .unwrap();
      store.mark_delisted("XYZQ").unwrap();
      store.record_no_data_range("THIN", ymd(2024, 1, 1), ymd(2024, 1, 5)).unwrap();
    }

    let store = CacheStore::open(&db_path).unwrap();
    assert!(store.get_coverage("AAPL").unwrap().is_some());
    assert!(store.is_delisted("XYZQ").unwrap());
    assert_eq!(store.no_data_intervals("THIN").unwrap().len(), 1);
  }

  #[test]
  fn test_two_stores_share_one_file_without_corruption() {
    let dir = tempfile::TempDir::new().unwrap();
    let db_path = dir.path().join("cache.db");

    let store_a = CacheStore::open(&db_path).unwrap();
    let store_b = CacheStore::open(&db_path).unwrap();

    store_a
      .put_coverage(&coverage("AAPL", ymd(2024, 1, 2), ymd(2024, 6, 28), ymd(2024, 6, 28)))
      .unwrap();
    store_b
      .put_coverage(&coverage("MSFT", ymd(2024, 1, 2), ymd(2024, 6, 28), ymd(2024, 6, 28)))
      .unwrap();
    store_a.record_no_data_range("THIN", ymd(2024, 1, 1), ymd(2024, 1, 5)).unwrap();

    assert!(store_b.get_coverage("AAPL").unwrap().is_some());
    assert!(store_a.get_coverage("MSFT").unwrap().is_some());
    assert_eq!(store_b.no_data_intervals("THIN").unwrap().len(), 1);
  }

  #[test]
  fn test_stats_counts() {
    let store = CacheStore::in_memory().unwrap();
    store
      .put_coverage(&coverage("AAPL", ymd(2024, 1, 2), ymd(2024, 6, 28), ymd(2024, 6, 28)))
      .unwrap();
    store.mark_delisted("XYZQ").unwrap();
    store.record_no_data_range("THIN", ymd(2024, 1, 1), ymd(2024, 1, 5)).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.symbols, 2);
    assert_eq!(stats.delisted, 1);
    assert_eq!(stats.no_data_intervals, 1);
  }
}
