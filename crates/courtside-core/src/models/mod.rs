//! Data models for club records served by the backend.
//!
//! The fetch client treats payloads as opaque JSON; these types are what
//! callers decode them into:
//!
//! - `UpcomingEvent`: tournaments open (or soon open) for registration
//! - `CompletedEvent`, `EventResult`: finished tournaments and their galleries
//! - `Registration`, `NewRegistration`: player sign-ups

pub mod event;
pub mod registration;

pub use event::{
    CompletedEvent, EntryFee, EventId, EventResult, RegistrationStatus, ResultImage, UpcomingEvent,
};
pub use registration::{Document, NewRegistration, Registration, RegistrationError, MAX_DOCUMENT_BYTES};
