//! Structured representation of a time-window calendar.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single recurring access schedule, extracted from one VEVENT.
///
/// All scalar fields are optional: a property that is absent from the
/// VEVENT yields `None` rather than a parse failure. The original ICS
/// text is always retained verbatim in `raw_calendar`, so callers can
/// fall back to it even when the structured fields are sparse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindowDescriptor {
    /// The original ICS text, unmodified
    pub raw_calendar: String,
    /// UID of the event
    pub uid: Option<String>,
    /// SUMMARY of the event
    pub summary: Option<String>,
    /// DTSTAMP of the event
    pub dtstamp: Option<IcalDateTime>,
    /// DTSTART of the event
    pub dtstart: Option<IcalDateTime>,
    /// DTEND of the event
    pub dtend: Option<IcalDateTime>,
    /// Structured RRULE, absent when the event has no recurrence
    pub recurrence_rule: Option<RecurrenceRule>,
}

/// An iCalendar date or date-time value.
///
/// Keeps the raw property text alongside a best-effort `chrono`
/// interpretation. An unrecognised format leaves `date_time` empty; it is
/// never an error, since the remote service controls the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcalDateTime {
    /// Raw property value as it appeared in the calendar
    pub raw: String,
    /// Parsed value, when the raw text is a recognisable DATE or DATE-TIME
    pub date_time: Option<NaiveDateTime>,
    /// True when the value was a bare DATE with no time component
    pub is_date: bool,
}

impl IcalDateTime {
    /// Interpret a raw iCalendar DATE or DATE-TIME value.
    ///
    /// Accepts `YYYYMMDDTHHMMSS` (with or without a trailing `Z`) and bare
    /// `YYYYMMDD` dates, which are normalised to midnight.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim().trim_end_matches(['Z', 'z']);

        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y%m%dT%H%M%S") {
            return Self {
                raw: raw.to_string(),
                date_time: Some(dt),
                is_date: false,
            };
        }

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y%m%d") {
            return Self {
                raw: raw.to_string(),
                date_time: date.and_hms_opt(0, 0, 0),
                is_date: true,
            };
        }

        Self {
            raw: raw.to_string(),
            date_time: None,
            is_date: false,
        }
    }
}

/// Recurrence frequencies defined by RFC 5545.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl std::str::FromStr for Frequency {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Ok(Self::Secondly),
            "MINUTELY" => Ok(Self::Minutely),
            "HOURLY" => Ok(Self::Hourly),
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            _ => Err(()),
        }
    }
}

/// Days of the week as used in BYDAY lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl std::str::FromStr for Weekday {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MO" => Ok(Self::Monday),
            "TU" => Ok(Self::Tuesday),
            "WE" => Ok(Self::Wednesday),
            "TH" => Ok(Self::Thursday),
            "FR" => Ok(Self::Friday),
            "SA" => Ok(Self::Saturday),
            "SU" => Ok(Self::Sunday),
            _ => Err(()),
        }
    }
}

/// One BYDAY entry, e.g. `MO` or `2TU` (second Tuesday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByDay {
    /// Optional ordinal prefix (`2` in `2TU`, `-1` in `-1FR`)
    pub ordinal: Option<i32>,
    /// The weekday itself
    pub weekday: Weekday,
}

/// Structured recurrence derived from a VEVENT's RRULE property.
///
/// Either fully populated from a parseable RRULE or absent; a malformed
/// rule never yields a partial value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// FREQ part, the only mandatory component of an RRULE
    pub frequency: Frequency,
    /// INTERVAL part
    pub interval: Option<u32>,
    /// BYDAY list
    pub by_day: Vec<ByDay>,
    /// BYMONTHDAY list
    pub by_month_day: Vec<i32>,
    /// BYMONTH list
    pub by_month: Vec<u32>,
    /// UNTIL bound
    pub until: Option<IcalDateTime>,
    /// COUNT bound
    pub count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ical_datetime_full_timestamp() {
        let dt = IcalDateTime::parse("20190304T080000Z");
        assert_eq!(dt.raw, "20190304T080000Z");
        assert!(!dt.is_date);
        let parsed = dt.date_time.unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), "2019-03-04 08:00:00");
    }

    #[test]
    fn test_ical_datetime_bare_date() {
        let dt = IcalDateTime::parse("20190304");
        assert!(dt.is_date);
        let parsed = dt.date_time.unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), "2019-03-04 00:00:00");
    }

    #[test]
    fn test_ical_datetime_unrecognised() {
        let dt = IcalDateTime::parse("next tuesday");
        assert_eq!(dt.raw, "next tuesday");
        assert!(dt.date_time.is_none());
        assert!(!dt.is_date);
    }

    #[test]
    fn test_frequency_from_str_case_insensitive() {
        assert_eq!("weekly".parse::<Frequency>(), Ok(Frequency::Weekly));
        assert_eq!("YEARLY".parse::<Frequency>(), Ok(Frequency::Yearly));
        assert!("fortnightly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_weekday_from_str() {
        assert_eq!("mo".parse::<Weekday>(), Ok(Weekday::Monday));
        assert_eq!("SU".parse::<Weekday>(), Ok(Weekday::Sunday));
        assert!("XX".parse::<Weekday>().is_err());
    }
}
