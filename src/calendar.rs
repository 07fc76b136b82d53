// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Calendar month boundaries for monthly statistics.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::models::StatsRange;

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Inclusive range covering the calendar month of `now`, in `now`'s time zone.
///
/// Starts at the first day 00:00:00 and ends at the last day
/// 23:59:59.999999999.
pub fn month_range<Tz: TimeZone>(now: &DateTime<Tz>) -> StatsRange {
    let tz = now.timezone();
    let (year, month) = (now.year(), now.month());

    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(now.date_naive());
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
        .unwrap_or(now.date_naive());
    let end_of_day =
        NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);

    StatsRange {
        begin: to_utc(&tz, first.and_time(NaiveTime::MIN), true),
        end: to_utc(&tz, last.and_time(end_of_day), false),
    }
}

/// Resolve a local wall-clock time, picking the widest interpretation when
/// a DST transition makes it ambiguous or skipped.
fn to_utc<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime, earliest: bool) -> DateTime<Utc> {
    let resolved = tz.from_local_datetime(&local);
    let picked = if earliest {
        resolved.earliest()
    } else {
        resolved.latest()
    };
    match picked {
        Some(dt) => dt.with_timezone(&Utc),
        None => tz.from_utc_datetime(&local).with_timezone(&Utc),
    }
}
