//! Booking-window policy.
//!
//! Bookings open at 12:00 AM in the salon's timezone and there is no
//! closing hour - a day stops taking bookings only when its capacity is
//! reached. All functions take `now` as a parameter and compute local
//! time in the configured business timezone, never the host clock: the
//! server may well run in a different region than the salon.

use chrono::offset::LocalResult;
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Local time of day at which bookings open (12:00 AM).
pub const OPENING_TIME: NaiveTime = NaiveTime::MIN;

/// Whether the booking window is currently open.
///
/// `always_open` short-circuits the clock check entirely; it exists so a
/// deployment can be tested outside the live window.
#[must_use]
pub fn is_open(now: DateTime<Utc>, tz: Tz, always_open: bool) -> bool {
    if always_open {
        return true;
    }
    let local = now.with_timezone(&tz);
    local.time() >= OPENING_TIME
}

/// The next instant at which the booking window opens.
///
/// Returns the next local midnight at or after `now`: exactly midnight
/// maps to itself, any later local time maps to tomorrow's midnight.
#[must_use]
pub fn next_opening(now: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    let local = now.with_timezone(&tz);
    let date = if local.hour() > 0 || local.minute() > 0 {
        local.date_naive() + Days::new(1)
    } else {
        local.date_naive()
    };
    local_midnight(date, tz)
}

/// Day-partition key for `now` in the business timezone (`YYYY-MM-DD`).
///
/// One partition (sheet tab) per calendar day of the salon, regardless
/// of where the server runs.
#[must_use]
pub fn day_key(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

/// Resolve local midnight of `date` in `tz`.
fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    let midnight = NaiveDateTime::new(date, NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
        // A DST gap can swallow local midnight; take the earliest valid
        // instant of the day instead.
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;
    use chrono_tz::Asia::Tokyo;
    use chrono_tz::UTC;

    #[test]
    fn test_day_key_uses_business_timezone() {
        // 23:30 UTC is already the next day in Tokyo but still the same
        // day on the US east coast.
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 23, 30, 0).unwrap();
        assert_eq!(day_key(now, Tokyo), "2025-06-02");
        assert_eq!(day_key(now, New_York), "2025-06-01");
        assert_eq!(day_key(now, UTC), "2025-06-01");
    }

    #[test]
    fn test_next_opening_is_in_the_future() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 14, 45, 12).unwrap();
        for tz in [Tokyo, New_York, UTC] {
            let opening = next_opening(now, tz);
            assert!(opening > now, "next opening must be after now in {tz}");
            assert_eq!(opening.time(), NaiveTime::MIN);
        }
    }

    #[test]
    fn test_next_opening_rolls_to_tomorrow_once_past_midnight() {
        // 05:00 UTC on June 1 is 14:00 in Tokyo; the next opening is
        // Tokyo midnight of June 2.
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 5, 0, 0).unwrap();
        let opening = next_opening(now, Tokyo);
        assert_eq!(opening.date_naive(), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    }

    #[test]
    fn test_next_opening_at_exact_midnight_is_today() {
        // Exactly local midnight maps to itself.
        let opening_instant = Tokyo.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let now = opening_instant.with_timezone(&Utc);
        assert_eq!(next_opening(now, Tokyo), opening_instant);
    }

    #[test]
    fn test_window_is_open_at_the_opening_instant() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 14, 45, 12).unwrap();
        let opening = next_opening(now, New_York).with_timezone(&Utc);
        assert!(is_open(opening, New_York, false));
    }

    #[test]
    fn test_window_has_no_closing_hour() {
        // Midday and one minute to midnight are both inside the window;
        // capacity, not the clock, closes a day.
        let midday = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let late = New_York
            .with_ymd_and_hms(2025, 6, 1, 23, 59, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert!(is_open(midday, UTC, false));
        assert!(is_open(late, New_York, false));
    }

    #[test]
    fn test_always_open_override() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 3, 33, 0).unwrap();
        assert!(is_open(now, Tokyo, true));
        assert!(is_open(now, New_York, true));
    }

    #[test]
    fn test_next_opening_differs_per_timezone() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 5, 0, 0).unwrap();
        let tokyo = next_opening(now, Tokyo).with_timezone(&Utc);
        let new_york = next_opening(now, New_York).with_timezone(&Utc);
        assert_ne!(tokyo, new_york);
    }
}
