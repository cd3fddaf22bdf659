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

//! Symbol normalisation between the three forms a ticker appears in:
//! the operator's input (`BRK.B`), the upstream URL (`BRK-B`) and the
//! output filename (`BRK_B`). Index symbols keep their `^` prefix on the
//! wire; filenames replace it with an underscore so `^GSPC` can never
//! collide with an equity named `GSPC`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Classification of a symbol for listing exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
  Equity,
  Index,
}

/// Canonical cache-key form: trimmed and uppercased, separators untouched
pub fn canonical(symbol: &str) -> Result<String> {
  let s = symbol.trim().to_uppercase();
  if s.is_empty() {
    return Err(Error::InvalidSymbol(symbol.to_string()));
  }
  Ok(s)
}

/// The form used in the upstream request URL: `.` becomes `-`
pub fn wire_symbol(symbol: &str) -> String {
  symbol.trim().to_uppercase().replace('.', "-")
}

/// The form used in output filenames: `.` and `^` become `_`
pub fn file_symbol(symbol: &str) -> String {
  symbol.trim().to_uppercase().replace('.', "_").replace('^', "_")
}

/// Index symbols carry a leading `^` (e.g. `^GSPC`, `^DJI`)
pub fn is_index(symbol: &str) -> bool {
  symbol.trim().starts_with('^')
}

/// Classify a symbol for listing purposes
pub fn kind(symbol: &str) -> SymbolKind {
  if is_index(symbol) { SymbolKind::Index } else { SymbolKind::Equity }
}
