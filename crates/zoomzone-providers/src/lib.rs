//! External collaborators of the booking core.
//!
//! This crate holds the traits the booking service talks through, and
//! their implementations:
//!
//! - [`CalendarProvider`] / [`MeetingProvider`] - remote services, with the
//!   Google Calendar and Zoom implementations behind the `google` and `zoom`
//!   features
//! - [`CredentialStore`] and [`BookingStore`] - JSON-file and in-memory
//!   persistence
//! - [`Notifier`] - outbound messages
//! - [`call_with_refresh`] - the one-refresh-one-retry credential policy
//! - [`busy_intervals`] - calendar events to busy time
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │  Google API     │    │    Zoom API     │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │ GoogleProvider  │    │  ZoomProvider   │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          │   call_with_refresh  │ ◄── CredentialStore
//!          └──────────┬───────────┘
//!                     │
//!                     ▼
//!              ┌─────────────┐
//!              │  RawEvent   │
//!              └──────┬──────┘
//!                     │
//!                     ▼ busy_intervals()
//!              ┌──────────────────┐
//!              │  TimeInterval    │
//!              └──────────────────┘
//! ```

pub mod bookings;
pub mod credentials;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
#[cfg(any(feature = "google", feature = "zoom"))]
mod http;
mod json_file;
pub mod normalize;
pub mod notifier;
pub mod provider;
pub mod raw_event;
pub mod retry;
#[cfg(feature = "zoom")]
pub mod zoom;

pub use bookings::{BookingStore, FileBookingStore, MemoryBookingStore};
pub use credentials::{
    CredentialStore, FileCredentialStore, GOOGLE, IntegrationCredential, MemoryCredentialStore,
    ZOOM,
};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{busy_interval, busy_intervals};
pub use notifier::{LogNotifier, Notifier, OutgoingMessage};
pub use provider::{
    BoxFuture, CalendarProvider, CreatedEvent, MeetingProvider, MeetingResource, NewCalendarEvent,
    NewMeeting, TokenRefresher, UnconfiguredProvider,
};
pub use raw_event::{EventStatus, RawEvent, RawEventTime};
pub use retry::call_with_refresh;
