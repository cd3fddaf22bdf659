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

//! # usstock-cache
//!
//! Persistent download cache backed by one embedded SQLite file.
//!
//! The cache remembers, per symbol, which date window the CSV file already
//! covers, which windows are known to be empty, and which symbols are
//! delisted - enough for [`CacheStore::needs_fetch`] to answer "what is
//! still missing?" without a network round-trip. SQLite's transactional
//! commit gives crash safety; an r2d2 pool plus `busy_timeout` makes the
//! store safe to share between workers and between concurrent runs.

pub mod connection;
pub mod error;
pub mod models;
pub mod schema;
pub mod store;

pub use connection::{create_pool, run_migrations, DbPool};
pub use error::{CacheError, CacheResult};
pub use store::{CacheStats, CacheStore, FetchPlan};
