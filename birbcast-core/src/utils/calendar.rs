use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, Utc};

/// The receiver's calendar, used for day separators and time labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayClock {
    /// The process-local time zone.
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl DayClock {
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    fn local_datetime(&self, timestamp_ms: i64) -> Option<NaiveDateTime> {
        let utc = DateTime::from_timestamp_millis(timestamp_ms)?;
        Some(match self {
            Self::Local => utc.with_timezone(&Local).naive_local(),
            Self::Fixed(offset) => utc.with_timezone(offset).naive_local(),
        })
    }

    pub fn date_of(&self, timestamp_ms: i64) -> Option<NaiveDate> {
        self.local_datetime(timestamp_ms).map(|dt| dt.date())
    }

    pub fn same_day(&self, a_ms: i64, b_ms: i64) -> bool {
        match (self.date_of(a_ms), self.date_of(b_ms)) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Separator label, e.g. `2 January 2024`.
    pub fn day_label(&self, timestamp_ms: i64) -> Option<String> {
        self.local_datetime(timestamp_ms)
            .map(|dt| dt.format("%-d %B %Y").to_string())
    }

    /// `HH:MM` label shown next to a message.
    pub fn time_label(&self, timestamp_ms: i64) -> Option<String> {
        self.local_datetime(timestamp_ms)
            .map(|dt| dt.format("%H:%M").to_string())
    }
}
