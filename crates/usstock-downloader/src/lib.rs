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

//! # usstock-downloader
//!
//! The download pipeline: a bounded worker pool drives each symbol through
//! cache consultation, rate-limited fetch with retry, validation, CSV
//! merge and cache update, then collates a failure report.
//!
//! Workers never let an error escape their loop; every symbol ends in a
//! typed [`SymbolOutcome`]. Only cache or output-directory I/O failures
//! abort the run.

pub mod csv_store;
pub mod download_loader;
pub mod error;
pub mod loader;
pub mod report;
pub mod validator;

pub use download_loader::{
  DownloadLoader, DownloadLoaderInput, DownloadLoaderOutput, SymbolOutcome, SymbolResult,
};
pub use error::{DownloaderError, DownloaderResult};
pub use loader::{DataLoader, LoaderConfig, LoaderContext};
pub use report::{FailureEntry, FailureReport};
pub use validator::{validate_bars, ValidationOutcome};
