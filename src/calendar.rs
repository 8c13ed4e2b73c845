//! Calendar arithmetic over chrono values.
//!
//! Date and DateTime nodes resolve against a base taken from a [`Clock`],
//! overwrite selected fields and then add deltas. Month and year deltas
//! clamp the day to the end of the target month; day overrides past the end
//! of a month roll forward.

use chrono::{Datelike, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Source of "today" and "now" for nodes without an explicit start
pub trait Clock {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> NaiveDateTime;
}

/// Local date for today, UTC for now
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// A clock stopped at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0.date()
    }

    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Field overrides and deltas for the date part
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateAdjustment {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub delta_years: i64,
    pub delta_months: i64,
    pub delta_days: i64,
}

/// Field overrides and deltas for the time-of-day part
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeAdjustment {
    pub hour: Option<i64>,
    pub minute: Option<i64>,
    pub second: Option<i64>,
    pub microsecond: Option<i64>,
    pub delta_hours: i64,
    pub delta_minutes: i64,
    pub delta_seconds: i64,
    pub delta_microseconds: i64,
}

impl DateAdjustment {
    /// Apply to a date; `None` when the result leaves chrono's range
    pub fn apply(&self, base: NaiveDate) -> Option<NaiveDate> {
        let date = self.replace(base)?;
        let date = add_months(date, self.delta_years.checked_mul(12)?)?;
        let date = add_months(date, self.delta_months)?;
        date.checked_add_signed(TimeDelta::try_days(self.delta_days)?)
    }

    fn replace(&self, base: NaiveDate) -> Option<NaiveDate> {
        let year = self.year.unwrap_or(base.year() as i64);
        let month0 = match self.month {
            Some(month) => month.checked_sub(1)?,
            None => base.month0() as i64,
        };
        let year = i32::try_from(year.checked_add(month0.div_euclid(12))?).ok()?;
        let month = (month0.rem_euclid(12) + 1) as u32;
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        match self.day {
            Some(day) => first.checked_add_signed(TimeDelta::try_days(day.checked_sub(1)?)?),
            None => first.with_day(base.day().min(days_in_month(first))),
        }
    }
}

impl TimeAdjustment {
    /// Apply both adjustments to a datetime
    pub fn apply(&self, date: &DateAdjustment, base: NaiveDateTime) -> Option<NaiveDateTime> {
        let day = date.replace(base.date())?;
        let time = base.time();
        let offset = [
            TimeDelta::try_hours(self.hour.unwrap_or(time.hour() as i64))?,
            TimeDelta::try_minutes(self.minute.unwrap_or(time.minute() as i64))?,
            TimeDelta::try_seconds(self.second.unwrap_or(time.second() as i64))?,
            TimeDelta::microseconds(
                self.microsecond
                    .unwrap_or((time.nanosecond() / 1_000) as i64),
            ),
        ];
        let mut datetime = day.and_time(NaiveTime::MIN);
        for delta in offset {
            datetime = datetime.checked_add_signed(delta)?;
        }

        datetime = add_months_datetime(datetime, date.delta_years.checked_mul(12)?)?;
        datetime = add_months_datetime(datetime, date.delta_months)?;
        let deltas = [
            TimeDelta::try_days(date.delta_days)?,
            TimeDelta::try_hours(self.delta_hours)?,
            TimeDelta::try_minutes(self.delta_minutes)?,
            TimeDelta::try_seconds(self.delta_seconds)?,
            TimeDelta::microseconds(self.delta_microseconds),
        ];
        for delta in deltas {
            datetime = datetime.checked_add_signed(delta)?;
        }
        Some(datetime)
    }
}

fn days_in_month(first: NaiveDate) -> u32 {
    (28..=31)
        .rev()
        .find(|day| first.with_day(*day).is_some())
        .unwrap_or(28)
}

fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

fn add_months_datetime(datetime: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        datetime.checked_add_months(magnitude)
    } else {
        datetime.checked_sub_months(magnitude)
    }
}

/// Duration from days, seconds and microseconds, rounded to the microsecond
pub fn duration(days: f64, seconds: f64, microseconds: f64) -> Option<TimeDelta> {
    let total = days * MICROS_PER_DAY as f64 + seconds * 1_000_000.0 + microseconds;
    if !total.is_finite() || total.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::microseconds(total.round() as i64))
}

/// Split a duration into (days, seconds, microseconds) with
/// `0 <= seconds < 86400` and `0 <= microseconds < 1_000_000`
pub fn duration_components(delta: TimeDelta) -> (i64, i64, i64) {
    let mut seconds = delta.num_seconds();
    let mut micros = (delta.subsec_nanos() / 1_000) as i64;
    if micros < 0 {
        micros += 1_000_000;
        seconds -= 1;
    }
    (seconds.div_euclid(86_400), seconds.rem_euclid(86_400), micros)
}

/// Milliseconds since the epoch, with a microsecond fraction
pub fn datetime_millis(datetime: NaiveDateTime) -> f64 {
    datetime.and_utc().timestamp_micros() as f64 / 1_000.0
}

pub fn date_millis(date: NaiveDate) -> f64 {
    datetime_millis(date.and_time(NaiveTime::MIN))
}

pub fn time_millis(time: NaiveTime) -> f64 {
    time.num_seconds_from_midnight() as f64 * 1_000.0 + (time.nanosecond() / 1_000) as f64 / 1_000.0
}

pub fn delta_millis(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000.0,
        None => delta.num_milliseconds() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn datetime(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, mi, s).unwrap()
    }

    #[test]
    fn test_date_overrides_and_deltas() {
        let adjustment = DateAdjustment {
            year: Some(2010),
            month: Some(1),
            day: Some(12),
            delta_years: -1,
            delta_months: 12,
            delta_days: -7,
            ..Default::default()
        };
        assert_eq!(adjustment.apply(date(2000, 6, 6)), Some(date(2010, 1, 5)));
    }

    #[test]
    fn test_date_keeps_base_fields() {
        let adjustment = DateAdjustment {
            delta_days: 1,
            ..Default::default()
        };
        assert_eq!(adjustment.apply(date(2020, 2, 29)), Some(date(2020, 3, 1)));
    }

    #[test]
    fn test_month_delta_clamps_day() {
        let adjustment = DateAdjustment {
            delta_months: 1,
            ..Default::default()
        };
        assert_eq!(adjustment.apply(date(2021, 1, 31)), Some(date(2021, 2, 28)));

        let adjustment = DateAdjustment {
            delta_years: 1,
            ..Default::default()
        };
        assert_eq!(adjustment.apply(date(2020, 2, 29)), Some(date(2021, 2, 28)));
    }

    #[test]
    fn test_month_override_clamps_base_day() {
        let adjustment = DateAdjustment {
            month: Some(2),
            ..Default::default()
        };
        assert_eq!(adjustment.apply(date(2021, 1, 31)), Some(date(2021, 2, 28)));
    }

    #[test]
    fn test_overrides_roll_over() {
        let adjustment = DateAdjustment {
            month: Some(13),
            day: Some(32),
            ..Default::default()
        };
        assert_eq!(adjustment.apply(date(2020, 5, 5)), Some(date(2021, 2, 1)));
    }

    #[test]
    fn test_overflow_is_none() {
        let adjustment = DateAdjustment {
            delta_years: i64::MAX,
            ..Default::default()
        };
        assert_eq!(adjustment.apply(date(2020, 1, 1)), None);

        let adjustment = DateAdjustment {
            month: Some(i64::MIN),
            ..Default::default()
        };
        assert_eq!(adjustment.apply(date(2020, 1, 1)), None);
        let times = TimeAdjustment::default();
        let base = date(2020, 1, 1).and_time(NaiveTime::MIN);
        assert_eq!(times.apply(&adjustment, base), None);

        let adjustment = DateAdjustment {
            day: Some(i64::MIN),
            ..Default::default()
        };
        assert_eq!(adjustment.apply(date(2020, 1, 1)), None);
    }

    #[test]
    fn test_datetime_adjustment() {
        let dates = DateAdjustment {
            year: Some(2010),
            month: Some(1),
            day: Some(12),
            delta_years: -1,
            delta_months: 12,
            delta_days: -7,
        };
        let times = TimeAdjustment {
            hour: Some(10),
            minute: Some(30),
            second: Some(20),
            microsecond: Some(0),
            delta_hours: 2,
            delta_minutes: 15,
            delta_seconds: 30,
            delta_microseconds: 1,
        };
        let expected = date(2010, 1, 5)
            .and_hms_micro_opt(12, 45, 50, 1)
            .unwrap();
        assert_eq!(
            times.apply(&dates, datetime(2000, 1, 1, 0, 0, 0)),
            Some(expected)
        );
    }

    #[test]
    fn test_time_overrides_roll_over() {
        let times = TimeAdjustment {
            hour: Some(25),
            ..Default::default()
        };
        assert_eq!(
            times.apply(&DateAdjustment::default(), datetime(2020, 1, 1, 8, 15, 0)),
            Some(datetime(2020, 1, 2, 1, 15, 0))
        );
    }

    #[test]
    fn test_duration() {
        let delta = duration(1.0, 2.0, 3.0).unwrap();
        assert_eq!(delta.num_microseconds(), Some(86_402_000_003));
        assert_eq!(duration(f64::INFINITY, 0.0, 0.0), None);
        assert_eq!(duration(0.0, 1.5, 0.4).unwrap().num_microseconds(), Some(1_500_000));
    }

    #[test]
    fn test_duration_components() {
        let delta = TimeDelta::microseconds(86_402_000_003);
        assert_eq!(duration_components(delta), (1, 2, 3));

        // Negative durations borrow from days
        let delta = TimeDelta::microseconds(-1);
        assert_eq!(duration_components(delta), (-1, 86_399, 999_999));
    }

    #[test]
    fn test_millis() {
        assert_eq!(date_millis(date(1970, 1, 2)), 86_400_000.0);
        let micro = date(1970, 1, 1).and_hms_micro_opt(0, 0, 0, 1).unwrap();
        assert_eq!(datetime_millis(micro), 0.001);
        assert_eq!(delta_millis(TimeDelta::seconds(90)), 90_000.0);
        let time = NaiveTime::from_hms_opt(0, 1, 0).unwrap();
        assert_eq!(time_millis(time), 60_000.0);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(datetime(2024, 5, 6, 7, 8, 9));
        assert_eq!(clock.today(), date(2024, 5, 6));
        assert_eq!(clock.now(), datetime(2024, 5, 6, 7, 8, 9));
    }
}
