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

//! Per-symbol CSV persistence.
//!
//! One file per symbol, newest row first, fixed header. Writes go through
//! a temp file, fsync and rename so a crash mid-write never leaves a
//! truncated file behind. Delisted symbols get a header-only file to
//! record the negative result.

use crate::error::{DownloaderError, DownloaderResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;
use usstock_core::symbols::file_symbol;
use usstock_models::DailyBar;

/// Fixed column set; the header line is exactly this, comma-joined
pub const CSV_HEADER: [&str; 7] = ["Date", "Open", "High", "Low", "Close", "AdjClose", "Volume"];

const DATE_FMT: &str = "%Y%m%d";

/// Output path for a symbol: `{output_dir}/{file_symbol}.csv`
pub fn csv_path(output_dir: &Path, symbol: &str) -> PathBuf {
  output_dir.join(format!("{}.csv", file_symbol(symbol)))
}

fn parse_field<T: std::str::FromStr>(
  record: &csv::StringRecord,
  idx: usize,
  name: &str,
) -> DownloaderResult<T> {
  let raw = record
    .get(idx)
    .ok_or_else(|| DownloaderError::InvalidData(format!("missing {name} column")))?;
  raw
    .trim()
    .parse()
    .map_err(|_| DownloaderError::InvalidData(format!("unparseable {name}: '{raw}'")))
}

/// Read a symbol's existing CSV file; an absent file is an empty series.
pub fn read_existing(path: &Path) -> DownloaderResult<Vec<DailyBar>> {
  if !path.exists() {
    return Ok(Vec::new());
  }

  let mut reader = csv::Reader::from_path(path)?;
  let mut bars = Vec::new();
  for result in reader.records() {
    let record = result?;
    let date_raw: String = parse_field(&record, 0, "Date")?;
    let date = NaiveDate::parse_from_str(&date_raw, DATE_FMT)
      .map_err(|_| DownloaderError::InvalidData(format!("unparseable Date: '{date_raw}'")))?;
    bars.push(DailyBar {
      date,
      open: parse_field::<Decimal>(&record, 1, "Open")?,
      high: parse_field::<Decimal>(&record, 2, "High")?,
      low: parse_field::<Decimal>(&record, 3, "Low")?,
      close: parse_field::<Decimal>(&record, 4, "Close")?,
      adj_close: parse_field::<Decimal>(&record, 5, "AdjClose")?,
      volume: parse_field::<i64>(&record, 6, "Volume")?,
    });
  }
  Ok(bars)
}

fn write_atomic<'a, I>(path: &Path, bars_descending: I) -> DownloaderResult<()>
where
  I: Iterator<Item = &'a DailyBar>,
{
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  let tmp_path = path.with_extension("csv.tmp");

  let file = File::create(&tmp_path)?;
  let mut writer = csv::Writer::from_writer(file);
  writer.write_record(CSV_HEADER)?;
  for bar in bars_descending {
    writer.write_record([
      bar.date.format(DATE_FMT).to_string(),
      bar.open.to_string(),
      bar.high.to_string(),
      bar.low.to_string(),
      bar.close.to_string(),
      bar.adj_close.to_string(),
      bar.volume.to_string(),
    ])?;
  }
  writer.flush()?;
  let file = writer.into_inner().map_err(|e| DownloaderError::Csv(e.to_string()))?;
  file.sync_all()?;

  fs::rename(&tmp_path, path)?;
  Ok(())
}

/// Merge new bars into a symbol's file and persist atomically.
///
/// Union by date with new bars winning on conflict, sorted newest first.
/// Returns the number of data rows in the final file.
pub fn merge_and_write(path: &Path, new_bars: &[DailyBar]) -> DownloaderResult<usize> {
  let mut by_date: BTreeMap<NaiveDate, DailyBar> =
    read_existing(path)?.into_iter().map(|b| (b.date, b)).collect();
  for bar in new_bars {
    by_date.insert(bar.date, bar.clone());
  }

  let total = by_date.len();
  write_atomic(path, by_date.values().rev())?;
  debug!("Wrote {} rows to {}", total, path.display());
  Ok(total)
}

/// Header-only file recording that a symbol is delisted
pub fn write_delisted_marker(path: &Path) -> DownloaderResult<()> {
  write_atomic(path, std::iter::empty())
}
