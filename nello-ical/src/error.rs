//! Error types for the nello-ical crate.

/// Errors that can occur while parsing time-window calendar data.
#[derive(Debug, thiserror::Error)]
pub enum IcalError {
    /// The VCALENDAR wrapper or the VEVENT component is structurally absent
    #[error("Malformed calendar: {0}")]
    MalformedCalendar(String),

    /// An RRULE property is present but cannot be parsed
    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrenceRule(String),
}

/// Convenience type alias for Results using IcalError.
pub type Result<T> = std::result::Result<T, IcalError>;
