//! Date parsing and display labels.
//!
//! Feed and timeline records carry ISO-8601 strings. Parsing accepts full
//! RFC 3339 date-times, offset-less date-times and bare dates (the latter two
//! are taken as UTC). Anything else is "unparseable" and callers decide what
//! that means: the feed drops the record, DOM re-sort treats it as epoch 0,
//! labels render as an empty string.
//!
//! ## Formatting
//!
//! [`DateFormatter`] tries the configured locale first (`ru_RU` by default)
//! and falls back to a numeric, locale-independent form when that locale is
//! not available. Dates are shown in the offset they were written with.

use chrono::{DateTime, FixedOffset, Locale, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Minute-precision date-times with an offset; RFC 3339 requires seconds.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"];

/// Parse an ISO-8601 date or date-time.
pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date);
    }
    let zoned = match raw.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => raw.to_string(),
    };
    for format in OFFSET_FORMATS {
        if let Ok(date) = DateTime::parse_from_str(&zoned, format) {
            return Some(date);
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(DateTime::<FixedOffset>::from(naive.and_utc()));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::<FixedOffset>::from(naive.and_utc()))
}

/// Milliseconds since the Unix epoch, or `None` when the input does not parse.
pub fn timestamp_millis(raw: &str) -> Option<i64> {
    parse_date(raw).map(|date| date.timestamp_millis())
}

/// Which parts of the date a label shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `18 сентября 2025`
    Long,
    /// `18 сентября`
    DayMonth,
    /// `18 сен`
    DayMonthShort,
}

impl DateStyle {
    fn localized_pattern(self) -> &'static str {
        match self {
            DateStyle::Long => "%-d %B %Y",
            DateStyle::DayMonth => "%-d %B",
            DateStyle::DayMonthShort => "%-d %b",
        }
    }

    fn generic_pattern(self) -> &'static str {
        match self {
            DateStyle::Long => "%d.%m.%Y",
            DateStyle::DayMonth | DateStyle::DayMonthShort => "%d.%m",
        }
    }
}

/// Turns ISO strings into display labels.
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    locale: Option<Locale>,
    style: DateStyle,
}

impl DateFormatter {
    /// A formatter for `locale` (e.g. `"ru_RU"`). An unknown locale is not an
    /// error: labels degrade to the generic numeric form.
    pub fn new(locale: &str, style: DateStyle) -> Self {
        let parsed = Locale::try_from(locale).ok();
        if parsed.is_none() {
            log::debug!("locale {locale:?} not available, using numeric dates");
        }
        Self {
            locale: parsed,
            style,
        }
    }

    /// Long form used by feed cards.
    pub fn long(locale: &str) -> Self {
        Self::new(locale, DateStyle::Long)
    }

    pub fn with_style(self, style: DateStyle) -> Self {
        Self { style, ..self }
    }

    /// Format `iso`, returning an empty string when it does not parse.
    pub fn format(&self, iso: &str) -> String {
        match parse_date(iso) {
            Some(date) => self.format_date(&date),
            None => String::new(),
        }
    }

    pub fn format_date(&self, date: &DateTime<FixedOffset>) -> String {
        match self.locale {
            Some(locale) => date
                .format_localized(self.style.localized_pattern(), locale)
                .to_string(),
            None => date.format(self.style.generic_pattern()).to_string(),
        }
    }
}
