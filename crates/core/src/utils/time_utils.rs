use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// Default timezone for valuation dates.
/// This is the canonical timezone used to convert UTC instants to domain dates.
/// For a US-focused portfolio tracker, America/New_York is a sensible default.
pub const DEFAULT_VALUATION_TZ: Tz = chrono_tz::America::New_York;

/// Regular exchange session open, in the valuation timezone.
pub fn session_open() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).expect("valid session open time")
}

/// Regular exchange session close, in the valuation timezone.
pub fn session_close() -> NaiveTime {
    NaiveTime::from_hms_opt(16, 0, 0).expect("valid session close time")
}

/// Converts a UTC instant to a valuation date in the given timezone.
///
/// This is the single source of truth for converting instants to domain dates.
pub fn valuation_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Convenience function that uses the default valuation timezone.
pub fn valuation_date_today() -> NaiveDate {
    valuation_date_from_utc(Utc::now(), DEFAULT_VALUATION_TZ)
}

pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        if let Some(next) = current.succ_opt() {
            current = next;
        } else {
            break;
        }
    }
    days
}

fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Returns true if the given instant falls inside a regular exchange
/// session (Mon-Fri, 09:30-16:00 in the valuation timezone).
pub fn is_session_open(instant: DateTime<Utc>, tz: Tz) -> bool {
    let local = instant.with_timezone(&tz);
    let time = local.time();
    is_trading_day(local.date_naive()) && time >= session_open() && time < session_close()
}

/// Returns the next session open at or after the given instant.
///
/// If the instant is before today's open on a trading day, today's open is
/// returned; otherwise the open of the next trading day. Weekends roll
/// forward to Monday.
pub fn next_session_open(instant: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = instant.with_timezone(&tz);
    let mut date = local.date_naive();

    if !is_trading_day(date) || local.time() >= session_open() {
        loop {
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
            if is_trading_day(date) {
                break;
            }
        }
    }

    // earliest() handles DST transitions; regular session opens never fall
    // inside a spring-forward gap in America/New_York
    tz.from_local_datetime(&date.and_time(session_open()))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(instant)
}
