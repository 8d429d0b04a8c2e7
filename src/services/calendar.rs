use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::Error;

/// Calendar whose day defines "today" for the up-to-date check
#[derive(Debug, Clone, Copy)]
pub struct ReferenceCalendar {
    pub timezone: Tz,
    fixed_today: Option<NaiveDate>,
}

impl ReferenceCalendar {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            fixed_today: None,
        }
    }

    /// Parse an IANA timezone name ("America/Argentina/Buenos_Aires")
    pub fn from_name(name: &str) -> Result<Self, Error> {
        let tz: Tz = name
            .parse()
            .map_err(|e| Error::Config(format!("Invalid timezone '{}': {}", name, e)))?;
        Ok(Self::new(tz))
    }

    /// Pin "today" to a fixed day
    pub fn with_override(mut self, day: NaiveDate) -> Self {
        self.fixed_today = Some(day);
        self
    }

    /// Calendar day of `now` in this timezone
    pub fn day_of(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        match self.fixed_today {
            Some(day) => day,
            None => self.day_of(Utc::now()),
        }
    }

    /// Whether `latest` already covers the reference day
    pub fn is_up_to_date(&self, latest: NaiveDate) -> bool {
        latest >= self.today()
    }
}
