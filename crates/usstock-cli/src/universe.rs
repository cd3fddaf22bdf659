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

//! Symbol universe resolution.
//!
//! The index universes ship as bundled lists; the portfolio and broker
//! universes are inherently operator-specific and resolve from files
//! named by environment configuration. List acquisition (scraping index
//! pages, broker exports) is an external concern; these are its typed
//! inputs.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::collections::HashSet;
use std::path::Path;
use usstock_core::Config;

const SP500: &str = include_str!("../data/sp500.txt");
const DOW30: &str = include_str!("../data/dow30.txt");
const INDICES: &str = include_str!("../data/indices.txt");

/// Opaque universe tokens accepted by `--universe`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Universe {
  Sp500,
  Dow30,
  Indices,
  Portfolio,
  Broker,
}

/// One symbol per line; `#` comments and blank lines skipped; first
/// occurrence wins on duplicates.
pub fn parse_symbol_lines(text: &str) -> Vec<String> {
  let mut seen = HashSet::new();
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty() && !line.starts_with('#'))
    .map(|line| line.to_uppercase())
    .filter(|symbol| seen.insert(symbol.clone()))
    .collect()
}

/// Read an operator-supplied symbol file
pub fn read_symbol_file(path: &Path) -> Result<Vec<String>> {
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("reading symbol file {}", path.display()))?;
  let symbols = parse_symbol_lines(&text);
  if symbols.is_empty() {
    bail!("symbol file {} contains no symbols", path.display());
  }
  Ok(symbols)
}

/// Resolve a universe token into its symbol list
pub fn resolve(universe: Universe, config: &Config) -> Result<Vec<String>> {
  match universe {
    Universe::Sp500 => Ok(parse_symbol_lines(SP500)),
    Universe::Dow30 => Ok(parse_symbol_lines(DOW30)),
    Universe::Indices => Ok(parse_symbol_lines(INDICES)),
    Universe::Portfolio => match &config.portfolio_file {
      Some(path) => read_symbol_file(path),
      None => bail!("--universe portfolio requires USSTOCK_PORTFOLIO_FILE"),
    },
    Universe::Broker => match &config.broker_list_file {
      Some(path) => read_symbol_file(path),
      None => bail!("--universe broker requires USSTOCK_BROKER_LIST_FILE"),
    },
  }
}
