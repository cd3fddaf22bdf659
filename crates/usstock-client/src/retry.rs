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

//! Bounded retry around a fetch attempt.
//!
//! Transient and server errors back off exponentially (with an optional
//! +/-20% jitter); a 429 sleeps the longer of the configured rate-limit
//! delay and the server's Retry-After hint. Rate-limited attempts count
//! toward the same attempt bound so a throttled run can never loop
//! forever. Terminal errors return immediately.

use crate::error::FetchError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

/// Retry tuning for one fetch pipeline
#[derive(Debug, Clone)]
pub struct RetryPolicy {
  /// Total attempts, including rate-limited ones
  pub max_attempts: u32,

  /// First backoff delay in milliseconds
  pub base_delay_ms: u64,

  /// Minimum sleep after an HTTP 429
  pub rate_limit_delay_ms: u64,

  /// Cap applied to exponential backoff
  pub max_delay_ms: u64,

  /// Exponential (true) or constant (false) backoff
  pub exponential: bool,

  /// Apply +/-20% uniform jitter to every sleep
  pub jitter: bool,

  /// Wall-clock bound per attempt
  pub attempt_timeout_secs: u64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      base_delay_ms: 1_000,
      rate_limit_delay_ms: 30_000,
      max_delay_ms: 60_000,
      exponential: true,
      jitter: true,
      attempt_timeout_secs: 30,
    }
  }
}

impl RetryPolicy {
  /// The second-chance regime for symbols that exhausted the normal
  /// budget: five attempts at double the base delay.
  pub fn special(&self) -> Self {
    Self { max_attempts: 5, base_delay_ms: self.base_delay_ms.saturating_mul(2), ..self.clone() }
  }

  /// Backoff before the attempt after `attempt` (1-based) failed
  pub fn backoff_delay(&self, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let base = if self.exponential {
      self.base_delay_ms.saturating_mul(1u64 << exponent)
    } else {
      self.base_delay_ms
    };
    self.jittered(base.min(self.max_delay_ms))
  }

  /// Sleep after a 429: the longer of our configured delay and the
  /// server's Retry-After hint.
  pub fn rate_limit_delay(&self, server_retry_after_secs: Option<u64>) -> Duration {
    let hint_ms = server_retry_after_secs.map(|s| s.saturating_mul(1_000)).unwrap_or(0);
    self.jittered(self.rate_limit_delay_ms.max(hint_ms))
  }

  fn jittered(&self, ms: u64) -> Duration {
    if !self.jitter || ms == 0 {
      return Duration::from_millis(ms);
    }
    let spread = ms / 5;
    Duration::from_millis(rand::thread_rng().gen_range(ms - spread..=ms + spread))
  }

  /// Worst-case wall clock for a full retry cycle over one symbol:
  /// every attempt timing out plus the largest possible sleep between
  /// attempts (jitter headroom included).
  pub fn symbol_budget(&self) -> Duration {
    let attempts = u64::from(self.max_attempts.max(1));
    let timeouts_ms = attempts * self.attempt_timeout_secs * 1_000;
    let worst_sleep_ms = self.rate_limit_delay_ms.max(self.max_delay_ms);
    let sleeps_ms = (attempts - 1) * worst_sleep_ms * 6 / 5;
    Duration::from_millis(timeouts_ms + sleeps_ms + 1_000)
  }

  /// Drive `op` until it succeeds, fails terminally, or the attempt
  /// budget runs out. Each attempt is bounded by `attempt_timeout_secs`.
  pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, FetchError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
  {
    let mut last_error = None;

    for attempt in 1..=self.max_attempts.max(1) {
      let outcome = match timeout(Duration::from_secs(self.attempt_timeout_secs), op()).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(self.attempt_timeout_secs)),
      };

      match outcome {
        Ok(value) => return Ok(value),
        Err(e) if !e.is_retryable() => return Err(e),
        Err(e) => {
          warn!("Attempt {}/{} failed: {}", attempt, self.max_attempts, e);
          if attempt < self.max_attempts {
            let delay = match &e {
              FetchError::RateLimited { retry_after_secs } => {
                self.rate_limit_delay(*retry_after_secs)
              }
              _ => self.backoff_delay(attempt),
            };
            sleep(delay).await;
          }
          last_error = Some(e);
        }
      }
    }

    Err(last_error.unwrap_or_else(|| FetchError::Transient("retry budget exhausted".to_string())))
  }
}
