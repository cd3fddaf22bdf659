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

use anyhow::{Context, Result};
use clap::Subcommand;

use usstock_cache::CacheStore;
use usstock_core::Config;

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
  /// Wipe the cache database
  Clear,

  /// Show coverage, delisted and no-data counts
  Stats,
}

pub async fn execute(cmd: CacheCommands, config: Config) -> Result<i32> {
  let cache = CacheStore::open(&config.cache_db_path()).context("opening cache database")?;

  match cmd {
    CacheCommands::Clear => {
      cache.clear_all()?;
      println!("Cache cleared at {}", config.cache_db_path().display());
    }
    CacheCommands::Stats => {
      let stats = cache.stats()?;
      println!("Symbols tracked:    {}", stats.symbols);
      println!("Delisted:           {}", stats.delisted);
      println!("No-data intervals:  {}", stats.no_data_intervals);
      match cache.latest_trading_day_sentinel()? {
        Some((value, fresh)) => {
          println!("Latest trading day: {} ({})", value, if fresh { "fresh" } else { "stale" });
        }
        None => println!("Latest trading day: unknown"),
      }
    }
  }

  Ok(0)
}
