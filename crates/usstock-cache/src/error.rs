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

use thiserror::Error;

/// Cache failures are fatal for the run (a corrupt or unwritable cache
/// aborts with exit code 1), so the taxonomy stays small.
#[derive(Error, Debug)]
pub enum CacheError {
  #[error("Database error: {0}")]
  Database(String),

  #[error("Connection error: {0}")]
  Connection(String),

  #[error("Corrupt cache entry: {0}")]
  Corrupt(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

impl From<diesel::result::Error> for CacheError {
  fn from(err: diesel::result::Error) -> Self {
    CacheError::Database(err.to_string())
  }
}

impl From<diesel::r2d2::PoolError> for CacheError {
  fn from(err: diesel::r2d2::PoolError) -> Self {
    CacheError::Connection(err.to_string())
  }
}

impl From<chrono::ParseError> for CacheError {
  fn from(err: chrono::ParseError) -> Self {
    CacheError::Corrupt(format!("unparseable date: {err}"))
  }
}

pub type CacheResult<T> = Result<T, CacheError>;
