//! Core booking types: time normalization, slot generation, availability
//! reconciliation and the booking record.

pub mod availability;
pub mod booking;
pub mod slots;
pub mod time;
pub mod tracing;

pub use availability::{first_conflict, is_busy, reconcile};
pub use booking::{
    Booking, BookingConfirmation, BookingId, BookingPatch, BookingRequest,
    DEFAULT_REMINDER_LOOKAHEAD_MINUTES, InputError, PatchError, SweepFailure, SweepReport,
    SweepStage, ValidatedRequest, select_due,
};
pub use slots::{BusinessHours, BusinessHoursError, Slot, generate_slots, slots_for_request};
pub use time::{BusinessZone, ProviderLocalTime, TimeError, TimeInterval};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
