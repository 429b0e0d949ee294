//! Time sources and calendar helpers.
//!
//! Every transition receives `today` explicitly; the clock is injected into the
//! session store so tests and the tester can walk through calendars.
use chrono::{Days, NaiveDate, Utc};
use std::cell::Cell;

/// Capability providing the current calendar date and wall-clock time.
pub trait Clock {
    /// Current UTC calendar date.
    fn today(&self) -> NaiveDate;

    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

const MS_PER_DAY: i64 = 86_400_000;

/// Manually driven clock for deterministic runs.
#[derive(Debug, Clone)]
pub struct ManualClock {
    today: Cell<NaiveDate>,
    now_ms: Cell<i64>,
}

impl ManualClock {
    /// Start at midnight UTC of `today`.
    #[must_use]
    pub fn starting_at(today: NaiveDate) -> Self {
        let now_ms = today
            .and_hms_opt(0, 0, 0)
            .map_or(0, |dt| dt.and_utc().timestamp_millis());
        Self {
            today: Cell::new(today),
            now_ms: Cell::new(now_ms),
        }
    }

    /// Move the calendar forward by whole days.
    pub fn advance_days(&self, days: u32) {
        if let Some(next) = self.today.get().checked_add_days(Days::new(u64::from(days))) {
            self.today.set(next);
            self.now_ms
                .set(self.now_ms.get().saturating_add(i64::from(days) * MS_PER_DAY));
        }
    }

    /// Move wall-clock time forward without changing the date.
    pub fn tick_ms(&self, ms: i64) {
        self.now_ms.set(self.now_ms.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        self.today.get()
    }

    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }

    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// The instant a transition is applied: calendar day plus wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub today: NaiveDate,
    pub timestamp_ms: i64,
}

impl Moment {
    #[must_use]
    pub const fn new(today: NaiveDate, timestamp_ms: i64) -> Self {
        Self {
            today,
            timestamp_ms,
        }
    }

    /// Sample a clock.
    pub fn now<C: Clock + ?Sized>(clock: &C) -> Self {
        Self::new(clock.today(), clock.now_ms())
    }
}

/// The calendar day before `date`, if representable.
#[must_use]
pub fn yesterday(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}

/// Serde adapter for `YYYY-MM-DD` dates where an empty string means "never".
pub(crate) mod iso_date_or_empty {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.collect_str(&date.format(FORMAT)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(&raw, FORMAT)
            .map(Some)
            .map_err(D::Error::custom)
    }
}
