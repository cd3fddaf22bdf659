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

//! U.S. equity trading calendar, evaluated in Eastern time.
//!
//! The regular session runs 09:30-16:00 America/New_York on weekdays that
//! are not exchange holidays. The holiday set covers the fixed dates
//! (New Year's Day, Independence Day, Christmas) and the floating Monday/
//! Thursday holidays; it deliberately excludes Good Friday and
//! observation shifts, acting as a conservative filter. Session presence
//! is always confirmed against actual response data downstream.
//!
//! All functions are pure; callers thread the current instant through so
//! behaviour is testable at any fixed point in time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

/// Current wall-clock instant in Eastern time (DST-aware via the tz database)
pub fn now_eastern() -> DateTime<Tz> {
  Utc::now().with_timezone(&New_York)
}

fn session_open() -> NaiveTime {
  NaiveTime::from_hms_opt(9, 30, 0).unwrap()
}

fn session_close() -> NaiveTime {
  NaiveTime::from_hms_opt(16, 0, 0).unwrap()
}

/// Ordinal of the date's weekday within its month (1-based)
fn nth_of_month(date: NaiveDate) -> u32 {
  (date.day() - 1) / 7 + 1
}

/// True for weekends and exchange holidays
pub fn is_trading_day(date: NaiveDate) -> bool {
  !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !is_holiday(date)
}

/// Fixed holidays plus the floating Monday/Thursday set
pub fn is_holiday(date: NaiveDate) -> bool {
  let (m, d) = (date.month(), date.day());
  if matches!((m, d), (1, 1) | (7, 4) | (12, 25)) {
    return true;
  }

  let wd = date.weekday();
  match m {
    // MLK Day: 3rd Monday of January
    1 => wd == Weekday::Mon && nth_of_month(date) == 3,
    // Presidents Day: 3rd Monday of February
    2 => wd == Weekday::Mon && nth_of_month(date) == 3,
    // Memorial Day: last Monday of May
    5 => wd == Weekday::Mon && d >= 25,
    // Labor Day: 1st Monday of September
    9 => wd == Weekday::Mon && nth_of_month(date) == 1,
    // Thanksgiving: 4th Thursday of November
    11 => wd == Weekday::Thu && nth_of_month(date) == 4,
    _ => false,
  }
}

/// Whether the regular session is in progress at the given Eastern instant
pub fn is_market_open(at: DateTime<Tz>) -> bool {
  let date = at.date_naive();
  if !is_trading_day(date) {
    return false;
  }
  let t = at.time();
  t >= session_open() && t < session_close()
}

/// The most recent date whose regular session has fully closed.
///
/// If `at` falls on a trading day past 16:00 Eastern that day qualifies;
/// otherwise the walk goes back to the prior trading day.
pub fn last_trading_day(at: DateTime<Tz>) -> NaiveDate {
  let today = at.date_naive();
  if is_trading_day(today) && at.time() >= session_close() {
    return today;
  }
  previous_trading_day(today)
}

/// Closest trading day strictly before `date`
pub fn previous_trading_day(date: NaiveDate) -> NaiveDate {
  let mut d = date - Duration::days(1);
  while !is_trading_day(d) {
    d -= Duration::days(1);
  }
  d
}

/// Closest trading day strictly after `date`
pub fn next_trading_day(date: NaiveDate) -> NaiveDate {
  let mut d = date + Duration::days(1);
  while !is_trading_day(d) {
    d += Duration::days(1);
  }
  d
}

/// Clamp a requested end date to the latest date that can have a closed bar.
///
/// Future dates become `last_trading_day(now)`; today-while-the-session-is-
/// still-open becomes the previous trading day; anything else passes through.
pub fn adjust_to_latest_trading_day(date: NaiveDate, now: DateTime<Tz>) -> NaiveDate {
  let today = now.date_naive();
  if date > today {
    return last_trading_day(now);
  }
  if date == today && is_market_open(now) {
    return previous_trading_day(today);
  }
  date
}
