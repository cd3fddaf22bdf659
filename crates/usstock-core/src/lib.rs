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

//! # usstock-core
//!
//! Core types, configuration, and error handling for the usstock downloader.
//!
//! This crate provides the foundational components shared across all usstock crates:
//!
//! - [`Config`] - runtime configuration (endpoint, rate limits, directories)
//! - [`Error`] and [`Result`] - unified error handling
//! - [`symbols`] - wire-form and file-form symbol normalisation
//! - [`calendar`] - the U.S. equity trading calendar in Eastern time

pub mod calendar;
pub mod config;
pub mod error;
pub mod symbols;

pub use config::Config;
pub use error::{Error, Result};

/// Base URL for the Yahoo Finance v8 chart endpoint
pub const YAHOO_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Default request quota (requests per minute) for the unauthenticated chart endpoint
pub const DEFAULT_RATE_LIMIT: u32 = 60;

/// Default per-attempt HTTP timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of fetch attempts per symbol window
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default and maximum worker counts for the download pool
pub const DEFAULT_CONCURRENT: usize = 3;
pub const MAX_CONCURRENT: usize = 10;

/// Time-to-live of the cached latest-trading-day observation, in hours
pub const SENTINEL_TTL_HOURS: i64 = 6;
