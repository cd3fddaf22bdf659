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

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily OHLCV + adjusted-close record for one symbol.
///
/// Prices are decimals so the CSV files round-trip exactly. The validator
/// enforces `low <= open,close <= high` and `volume >= 0`; bars leaving
/// the validator always satisfy those invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBar {
  /// U.S. market day this bar belongs to
  pub date: NaiveDate,
  pub open: Decimal,
  pub high: Decimal,
  pub low: Decimal,
  pub close: Decimal,
  pub adj_close: Decimal,
  pub volume: i64,
}

impl DailyBar {
  /// Whether the OHLC relationships hold within `tolerance`
  pub fn is_coherent(&self, tolerance: Decimal) -> bool {
    let lo = self.low - tolerance;
    let hi = self.high + tolerance;
    self.high >= self.low
      && self.open >= lo
      && self.open <= hi
      && self.close >= lo
      && self.close <= hi
  }

  /// Any price negative (volume handled separately)
  pub fn has_negative_price(&self) -> bool {
    self.open.is_sign_negative()
      || self.high.is_sign_negative()
      || self.low.is_sign_negative()
      || self.close.is_sign_negative()
      || self.adj_close.is_sign_negative()
  }
}
