use crate::api::japan_offset;
use chrono::{DateTime, FixedOffset};

/// How much of a timestamp a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// `2024/9/20 10:15:00`
    DateTime,
    /// `2024/9/20`
    Date,
}

impl TimestampStyle {
    fn pattern(self) -> &'static str {
        match self {
            TimestampStyle::DateTime => "%Y/%-m/%-d %-H:%M:%S",
            TimestampStyle::Date => "%Y/%-m/%-d",
        }
    }
}

/// Reader-facing time zone and date format (ja-JP style).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLocale {
    offset: FixedOffset,
}

impl Default for DisplayLocale {
    fn default() -> Self {
        Self::japan()
    }
}

impl DisplayLocale {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// UTC+09:00.
    pub fn japan() -> Self {
        Self::new(japan_offset())
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn format(&self, at: &DateTime<FixedOffset>, style: TimestampStyle) -> String {
        at.with_timezone(&self.offset)
            .format(style.pattern())
            .to_string()
    }
}
