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

use crate::error::FetchError;
use crate::transport::Transport;
use chrono::{NaiveDate, Utc};
use governor::{
  Quota, RateLimiter,
  clock::DefaultClock,
  middleware::NoOpMiddleware,
  state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::info;
use usstock_core::{Config, Error, Result};
use usstock_models::DailyBar;

/// Process-wide cool-off set when any worker sees an HTTP 429.
///
/// Stores a "back off until" instant as epoch milliseconds; every worker
/// waits it out before issuing a request, so a throttled upstream never
/// sees a thundering herd of retries. Last writer wins.
#[derive(Debug, Default)]
pub struct CoolOff {
  until_ms: AtomicI64,
}

impl CoolOff {
  pub fn new() -> Self {
    Self::default()
  }

  /// Push the back-off horizon out by `duration` from now
  pub fn engage(&self, duration: Duration) {
    let until = Utc::now().timestamp_millis() + duration.as_millis() as i64;
    self.until_ms.store(until, Ordering::SeqCst);
  }

  /// Time left before requests may resume, if any
  pub fn remaining(&self) -> Option<Duration> {
    let until = self.until_ms.load(Ordering::SeqCst);
    let now = Utc::now().timestamp_millis();
    if until > now {
      Some(Duration::from_millis((until - now) as u64))
    } else {
      None
    }
  }

  /// Sleep until the cool-off horizon has passed
  pub async fn wait(&self) {
    while let Some(remaining) = self.remaining() {
      tokio::time::sleep(remaining).await;
    }
  }
}

/// Shared chart-endpoint client.
///
/// One instance serves every worker: a requests-per-minute quota spaces
/// requests out, and the [`CoolOff`] holds all of them back after a 429.
/// The client itself is read-only; concurrency needs nothing beyond `Arc`.
pub struct ChartClient {
  transport: Transport,
  rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
  cool_off: CoolOff,
  cool_off_ms: u64,
}

impl ChartClient {
  /// Create a new client from configuration
  ///
  /// # Errors
  ///
  /// Returns an error if the HTTP client cannot be created.
  pub fn new(config: &Config) -> Result<Self> {
    let rate_limit = NonZeroU32::new(config.rate_limit).unwrap_or_else(|| {
      NonZeroU32::new(usstock_core::DEFAULT_RATE_LIMIT).expect("default rate limit is non-zero")
    });
    let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rate_limit)));

    let transport =
      Transport::new(config).map_err(|e| Error::Config(format!("HTTP client: {e}")))?;

    Ok(Self {
      transport,
      rate_limiter,
      cool_off: CoolOff::new(),
      cool_off_ms: 30_000,
    })
  }

  /// Override the default cool-off applied after a 429 without a
  /// Retry-After hint.
  pub fn with_cool_off_ms(mut self, cool_off_ms: u64) -> Self {
    self.cool_off_ms = cool_off_ms;
    self
  }

  /// Fetch daily bars for one wire-form symbol over an inclusive window.
  ///
  /// Waits out any active cool-off and the request quota first; engages
  /// the cool-off for every worker when the response is a 429.
  pub async fn fetch_daily_bars(
    &self,
    wire_symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> std::result::Result<Vec<DailyBar>, FetchError> {
    self.cool_off.wait().await;
    self.rate_limiter.until_ready().await;

    match self.transport.fetch_bars(wire_symbol, start, end).await {
      Err(FetchError::RateLimited { retry_after_secs }) => {
        let hold =
          Duration::from_millis(retry_after_secs.map(|s| s * 1_000).unwrap_or(self.cool_off_ms));
        info!("Engaging {}ms cool-off after 429 on {}", hold.as_millis(), wire_symbol);
        self.cool_off.engage(hold);
        Err(FetchError::RateLimited { retry_after_secs })
      }
      other => other,
    }
  }

  /// Time left on the shared cool-off, if one is active
  pub fn cool_off_remaining(&self) -> Option<Duration> {
    self.cool_off.remaining()
  }
}

impl std::fmt::Debug for ChartClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ChartClient")
      .field("transport", &self.transport)
      .field("rate_limiter", &"RateLimiter")
      .finish()
  }
}
