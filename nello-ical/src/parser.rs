//! Parsing of time-window ICS text into descriptors.
//!
//! The remote service hands out one VCALENDAR with exactly one VEVENT per
//! time window. Parsing is deliberately lenient about properties it does
//! not know and strict about the two things callers rely on: the
//! structural markers and the RRULE grammar.

use crate::descriptor::{ByDay, IcalDateTime, RecurrenceRule, TimeWindowDescriptor};
use crate::error::{IcalError, Result};

/// Parse an ICS calendar string for a single event.
///
/// The input must contain a `BEGIN:VCALENDAR`/`END:VCALENDAR` wrapper and
/// one `BEGIN:VEVENT`/`END:VEVENT` block; anything else is
/// [`IcalError::MalformedCalendar`]. Scalar properties are matched
/// case-insensitively and missing ones resolve to `None`. An RRULE that is
/// present but unparseable is [`IcalError::InvalidRecurrenceRule`]; an
/// absent RRULE is not an error.
///
/// The returned descriptor always carries the input verbatim in
/// `raw_calendar`, regardless of how sparse the structured fields are.
pub fn parse(ical_text: &str) -> Result<TimeWindowDescriptor> {
    let lines = unfold(ical_text);

    require_marker(&lines, "BEGIN:VCALENDAR")?;
    require_marker(&lines, "END:VCALENDAR")?;
    let event_start = require_marker(&lines, "BEGIN:VEVENT")?;
    let event_end = require_marker(&lines, "END:VEVENT")?;
    if event_end < event_start {
        return Err(IcalError::MalformedCalendar(
            "END:VEVENT appears before BEGIN:VEVENT".to_string(),
        ));
    }

    let mut uid = None;
    let mut summary = None;
    let mut dtstamp = None;
    let mut dtstart = None;
    let mut dtend = None;
    let mut rrule_raw: Option<String> = None;

    for line in &lines[event_start + 1..event_end] {
        let Some((name, value)) = split_property(line) else {
            continue;
        };

        match name.as_str() {
            "UID" if uid.is_none() => uid = Some(value.to_string()),
            "SUMMARY" if summary.is_none() => summary = Some(value.to_string()),
            "DTSTAMP" if dtstamp.is_none() => dtstamp = Some(IcalDateTime::parse(value)),
            "DTSTART" if dtstart.is_none() => dtstart = Some(IcalDateTime::parse(value)),
            "DTEND" if dtend.is_none() => dtend = Some(IcalDateTime::parse(value)),
            "RRULE" if rrule_raw.is_none() => rrule_raw = Some(value.to_string()),
            _ => {}
        }
    }

    let recurrence_rule = match rrule_raw {
        Some(raw) => Some(parse_rrule(&raw)?),
        None => None,
    };

    Ok(TimeWindowDescriptor {
        raw_calendar: ical_text.to_string(),
        uid,
        summary,
        dtstamp,
        dtstart,
        dtend,
        recurrence_rule,
    })
}

/// Unfold RFC 5545 content lines.
///
/// A line beginning with a space or tab continues the previous line; the
/// leading whitespace character is dropped.
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push(line.to_string());
    }

    lines
}

/// Find the index of a structural marker line, case-insensitively.
fn require_marker(lines: &[String], marker: &str) -> Result<usize> {
    lines
        .iter()
        .position(|line| line.trim().eq_ignore_ascii_case(marker))
        .ok_or_else(|| IcalError::MalformedCalendar(format!("missing {marker}")))
}

/// Split a content line into its uppercased property name and value.
///
/// Property parameters (`DTSTART;TZID=...`) are discarded. Lines without a
/// `:` separator carry no value and are skipped by the caller.
fn split_property(line: &str) -> Option<(String, &str)> {
    let colon = line.find(':')?;
    let name_end = line.find(';').filter(|i| *i < colon).unwrap_or(colon);
    let name = line[..name_end].trim().to_ascii_uppercase();
    Some((name, &line[colon + 1..]))
}

/// Parse an RRULE value into a structured recurrence.
///
/// Unknown `KEY=VALUE` parts are tolerated so that rules using modifiers
/// this crate does not model still parse. A part without `=`, an unknown
/// FREQ, a missing FREQ or an unparseable numeric list fails the whole
/// rule.
fn parse_rrule(value: &str) -> Result<RecurrenceRule> {
    let mut frequency = None;
    let mut interval = None;
    let mut by_day = Vec::new();
    let mut by_month_day = Vec::new();
    let mut by_month = Vec::new();
    let mut until = None;
    let mut count = None;

    for part in value.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (key, val) = part.split_once('=').ok_or_else(|| {
            IcalError::InvalidRecurrenceRule(format!("expected KEY=VALUE, got {part:?}"))
        })?;

        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => {
                frequency = Some(val.parse().map_err(|_| {
                    IcalError::InvalidRecurrenceRule(format!("unknown frequency {val:?}"))
                })?);
            }
            "INTERVAL" => {
                interval = Some(val.parse::<u32>().map_err(|_| {
                    IcalError::InvalidRecurrenceRule(format!("invalid INTERVAL {val:?}"))
                })?);
            }
            "COUNT" => {
                count = Some(val.parse::<u32>().map_err(|_| {
                    IcalError::InvalidRecurrenceRule(format!("invalid COUNT {val:?}"))
                })?);
            }
            "UNTIL" => until = Some(IcalDateTime::parse(val)),
            "BYDAY" => {
                for entry in val.split(',') {
                    by_day.push(parse_by_day(entry)?);
                }
            }
            "BYMONTHDAY" => {
                for entry in val.split(',') {
                    by_month_day.push(entry.trim().parse::<i32>().map_err(|_| {
                        IcalError::InvalidRecurrenceRule(format!("invalid BYMONTHDAY {entry:?}"))
                    })?);
                }
            }
            "BYMONTH" => {
                for entry in val.split(',') {
                    by_month.push(entry.trim().parse::<u32>().map_err(|_| {
                        IcalError::InvalidRecurrenceRule(format!("invalid BYMONTH {entry:?}"))
                    })?);
                }
            }
            _ => {}
        }
    }

    let frequency = frequency
        .ok_or_else(|| IcalError::InvalidRecurrenceRule("missing FREQ".to_string()))?;

    Ok(RecurrenceRule {
        frequency,
        interval,
        by_day,
        by_month_day,
        by_month,
        until,
        count,
    })
}

/// Parse one BYDAY entry, e.g. `MO`, `2TU` or `-1FR`.
fn parse_by_day(entry: &str) -> Result<ByDay> {
    let entry = entry.trim();
    if entry.len() < 2 || !entry.is_char_boundary(entry.len() - 2) {
        return Err(IcalError::InvalidRecurrenceRule(format!(
            "invalid BYDAY entry {entry:?}"
        )));
    }

    let (prefix, day) = entry.split_at(entry.len() - 2);
    let weekday = day.parse().map_err(|_| {
        IcalError::InvalidRecurrenceRule(format!("invalid BYDAY entry {entry:?}"))
    })?;

    let ordinal = if prefix.is_empty() {
        None
    } else {
        Some(prefix.parse::<i32>().map_err(|_| {
            IcalError::InvalidRecurrenceRule(format!("invalid BYDAY ordinal {prefix:?}"))
        })?)
    };

    Ok(ByDay { ordinal, weekday })
}
