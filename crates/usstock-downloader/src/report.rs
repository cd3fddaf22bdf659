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

//! Failure aggregation across workers and the human-readable report file.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use usstock_client::FetchError;

pub const REPORT_FILE_NAME: &str = "failed_symbols_report.txt";

/// One failed symbol as it appears in the report
#[derive(Debug, Clone)]
pub struct FailureEntry {
  pub symbol: String,
  pub kind: String,
  pub message: String,
  pub attempts: u32,
}

/// Append-only failure aggregator shared by every worker
#[derive(Debug, Default)]
pub struct FailureReport {
  entries: Mutex<Vec<FailureEntry>>,
}

impl FailureReport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record(&self, symbol: &str, error: &FetchError, attempts: u32) {
    self.record_entry(FailureEntry {
      symbol: symbol.to_string(),
      kind: error.kind().to_string(),
      message: error.to_string(),
      attempts,
    });
  }

  pub fn record_entry(&self, entry: FailureEntry) {
    self.entries.lock().expect("failure report lock poisoned").push(entry);
  }

  pub fn is_empty(&self) -> bool {
    self.entries.lock().expect("failure report lock poisoned").is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.lock().expect("failure report lock poisoned").len()
  }

  pub fn entries(&self) -> Vec<FailureEntry> {
    self.entries.lock().expect("failure report lock poisoned").clone()
  }

  /// The report text: per-kind histogram, then one line per symbol
  pub fn render(&self) -> String {
    let mut entries = self.entries();
    entries.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let mut out = String::new();
    writeln!(out, "Failed symbols report").unwrap();
    writeln!(out, "=====================").unwrap();
    writeln!(out, "Total failures: {}", entries.len()).unwrap();
    writeln!(out).unwrap();

    if entries.is_empty() {
      writeln!(out, "No failures.").unwrap();
      return out;
    }

    let mut histogram: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in &entries {
      *histogram.entry(entry.kind.as_str()).or_default() += 1;
    }
    writeln!(out, "By error kind:").unwrap();
    for (kind, count) in &histogram {
      writeln!(out, "  {kind}: {count}").unwrap();
    }
    writeln!(out).unwrap();

    writeln!(out, "Symbols:").unwrap();
    for entry in &entries {
      writeln!(
        out,
        "  {}  kind={}  attempts={}  {}",
        entry.symbol, entry.kind, entry.attempts, entry.message
      )
      .unwrap();
    }
    out
  }

  /// Write the report into the output directory, returning its path.
  /// Always written, even when empty, so operators can script against it.
  pub fn write(&self, output_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(REPORT_FILE_NAME);
    std::fs::write(&path, self.render())?;
    Ok(path)
  }
}
