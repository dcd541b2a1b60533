//! RSVP outcomes for the attendee list of an event.
//!
//! The database performs attend/unattend as single conditional statements.
//! When a statement changes nothing, the repository reads the event once
//! and uses [`classify_attend`] / [`classify_unattend`] to pick the reason.

use crate::error::CoreError;
use crate::types::DbId;

pub const ALREADY_ATTENDING: &str = "Already attending this event";
pub const FULLY_BOOKED: &str = "Event is fully booked";
pub const NOT_ATTENDING: &str = "You are not attending this event";

/// Why an RSVP change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpRejection {
    EventNotFound,
    AlreadyAttending,
    FullyBooked,
    NotAttending,
}

impl RsvpRejection {
    pub fn into_error(self, event_id: DbId) -> CoreError {
        match self {
            RsvpRejection::EventNotFound => CoreError::NotFound {
                entity: "Event",
                id: event_id,
            },
            RsvpRejection::AlreadyAttending => CoreError::Conflict(ALREADY_ATTENDING.into()),
            RsvpRejection::FullyBooked => CoreError::Conflict(FULLY_BOOKED.into()),
            RsvpRejection::NotAttending => CoreError::Validation(NOT_ATTENDING.into()),
        }
    }
}

/// Snapshot of an event's attendee state, read after a refused change.
#[derive(Debug, Clone, Copy)]
pub struct AttendeeSnapshot {
    pub attendee_count: i32,
    pub max_participants: i32,
    pub is_attending: bool,
}

/// Whether one more attendee fits.
pub fn has_capacity(attendee_count: i32, max_participants: i32) -> bool {
    attendee_count < max_participants
}

/// Reason a refused attend was refused. Duplicate attendance takes
/// precedence over a full event.
pub fn classify_attend(snapshot: Option<AttendeeSnapshot>) -> RsvpRejection {
    match snapshot {
        None => RsvpRejection::EventNotFound,
        Some(s) if s.is_attending => RsvpRejection::AlreadyAttending,
        Some(s) if !has_capacity(s.attendee_count, s.max_participants) => {
            RsvpRejection::FullyBooked
        }
        // The slot was taken by a concurrent request between the refused
        // statement and this read.
        Some(_) => RsvpRejection::FullyBooked,
    }
}

/// Reason a refused unattend was refused.
pub fn classify_unattend(snapshot: Option<AttendeeSnapshot>) -> RsvpRejection {
    match snapshot {
        None => RsvpRejection::EventNotFound,
        Some(_) => RsvpRejection::NotAttending,
    }
}
