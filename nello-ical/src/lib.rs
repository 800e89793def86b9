//! # nello-ical
//!
//! ICS calendar parsing for nello time windows.
//!
//! A nello time window carries its access schedule as an iCalendar string
//! with a single VEVENT. This crate turns that string into a
//! [`TimeWindowDescriptor`] with the scalar event fields and a structured
//! recurrence rule, while always keeping the original text around for
//! round-trip fidelity.

mod descriptor;
mod error;
mod parser;

pub use descriptor::{
    ByDay, Frequency, IcalDateTime, RecurrenceRule, TimeWindowDescriptor, Weekday,
};
pub use error::{IcalError, Result};
pub use parser::parse;
