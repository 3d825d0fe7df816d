//! In-process fakes for the collaborator traits.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use zoomzone_core::{Booking, BookingId, BookingPatch, BusinessZone, TimeInterval};
use zoomzone_providers::{
    BookingStore, BoxFuture, CalendarProvider, CreatedEvent, GOOGLE, IntegrationCredential,
    MeetingProvider, MeetingResource, MemoryBookingStore, MemoryCredentialStore, NewCalendarEvent,
    NewMeeting, Notifier, OutgoingMessage, ProviderError, ProviderErrorCode, ProviderResult,
    RawEvent, TokenRefresher, ZOOM, busy_interval,
};

pub fn utc(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, h, m, 0).unwrap()
}

/// A store holding a Google and a Zoom credential, both refreshable.
pub fn credentials() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_credentials([
        IntegrationCredential::new(GOOGLE, "google-token").with_refresh_token("google-refresh"),
        IntegrationCredential::new(ZOOM, "zoom-token").with_refresh_token("zoom-refresh"),
    ]))
}

#[derive(Default)]
struct TokenGate {
    rejected: HashSet<String>,
    reject_all: bool,
    refreshes: usize,
}

impl TokenGate {
    fn check(&self, provider: &str, token: &str) -> ProviderResult<()> {
        if self.reject_all || self.rejected.contains(token) {
            return Err(ProviderError::authentication("access token expired").with_provider(provider));
        }
        Ok(())
    }

    fn refresh(&mut self, provider: &str, refresh_token: String) -> IntegrationCredential {
        self.refreshes += 1;
        IntegrationCredential::new(provider, format!("{provider}-fresh-{}", self.refreshes))
            .with_refresh_token(refresh_token)
    }
}

#[derive(Default)]
struct CalendarState {
    gate: TokenGate,
    create_gate: TokenGate,
    create_tokens: Vec<String>,
    events: Vec<RawEvent>,
    created: Vec<NewCalendarEvent>,
    list_calls: usize,
    list_failure: Option<ProviderErrorCode>,
    create_failure: Option<ProviderErrorCode>,
}

/// Calendar that serves a fixed event list and records created events.
///
/// Listing returns only events overlapping the requested window; cancelled
/// events are passed through as the real API does.
#[derive(Default)]
pub struct FakeCalendar {
    state: Mutex<CalendarState>,
}

impl FakeCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<RawEvent>) -> Self {
        let calendar = Self::new();
        calendar.state.lock().unwrap().events = events;
        calendar
    }

    pub fn reject_token(self, token: &str) -> Self {
        self.state.lock().unwrap().gate.rejected.insert(token.to_string());
        self
    }

    pub fn reject_all_tokens(self) -> Self {
        self.state.lock().unwrap().gate.reject_all = true;
        self
    }

    /// Rejects `token` on event inserts only; listing still accepts it.
    pub fn reject_create_token(self, token: &str) -> Self {
        self.state.lock().unwrap().create_gate.rejected.insert(token.to_string());
        self
    }

    pub fn reject_all_create_tokens(self) -> Self {
        self.state.lock().unwrap().create_gate.reject_all = true;
        self
    }

    pub fn fail_list(self, code: ProviderErrorCode) -> Self {
        self.state.lock().unwrap().list_failure = Some(code);
        self
    }

    pub fn fail_create(self, code: ProviderErrorCode) -> Self {
        self.state.lock().unwrap().create_failure = Some(code);
        self
    }

    pub fn add_event(&self, event: RawEvent) {
        self.state.lock().unwrap().events.push(event);
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn refresh_count(&self) -> usize {
        self.state.lock().unwrap().gate.refreshes
    }

    pub fn created(&self) -> Vec<NewCalendarEvent> {
        self.state.lock().unwrap().created.clone()
    }

    /// Access tokens presented to `create_event`, in order.
    pub fn create_tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().create_tokens.clone()
    }
}

impl TokenRefresher for FakeCalendar {
    fn provider_id(&self) -> &str {
        GOOGLE
    }

    fn refresh_token(
        &self,
        refresh_token: String,
    ) -> BoxFuture<'_, ProviderResult<IntegrationCredential>> {
        let credential = self.state.lock().unwrap().gate.refresh(GOOGLE, refresh_token);
        Box::pin(async move { Ok(credential) })
    }
}

impl CalendarProvider for FakeCalendar {
    fn list_events(
        &self,
        access_token: String,
        window: TimeInterval,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        let result = {
            let mut state = self.state.lock().unwrap();
            state.list_calls += 1;
            state.gate.check(GOOGLE, &access_token).and_then(|()| match state.list_failure {
                Some(code) => Err(ProviderError::new(code, "calendar read failed").with_provider(GOOGLE)),
                None => Ok(state
                    .events
                    .iter()
                    .filter(|e| {
                        busy_interval(e, &BusinessZone::default())
                            .is_none_or(|interval| interval.overlaps(&window))
                    })
                    .cloned()
                    .collect()),
            })
        };
        Box::pin(async move { result })
    }

    fn create_event(
        &self,
        access_token: String,
        event: NewCalendarEvent,
    ) -> BoxFuture<'_, ProviderResult<CreatedEvent>> {
        let result = {
            let mut state = self.state.lock().unwrap();
            state.create_tokens.push(access_token.clone());
            state
                .gate
                .check(GOOGLE, &access_token)
                .and_then(|()| state.create_gate.check(GOOGLE, &access_token))
                .and_then(|()| match state.create_failure {
                    Some(code) => {
                        Err(ProviderError::new(code, "event insert failed").with_provider(GOOGLE))
                    }
                    None => {
                        state.created.push(event);
                        Ok(CreatedEvent {
                            id: format!("evt-{}", state.created.len()),
                            html_link: None,
                        })
                    }
                })
        };
        Box::pin(async move { result })
    }
}

#[derive(Default)]
struct MeetingState {
    gate: TokenGate,
    tokens_seen: Vec<String>,
    created: Vec<NewMeeting>,
    failure: Option<ProviderErrorCode>,
}

/// Meeting service that hands out numbered join links.
#[derive(Default)]
pub struct FakeMeetings {
    state: Mutex<MeetingState>,
}

impl FakeMeetings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_token(self, token: &str) -> Self {
        self.state.lock().unwrap().gate.rejected.insert(token.to_string());
        self
    }

    pub fn reject_all_tokens(self) -> Self {
        self.state.lock().unwrap().gate.reject_all = true;
        self
    }

    pub fn fail_with(self, code: ProviderErrorCode) -> Self {
        self.state.lock().unwrap().failure = Some(code);
        self
    }

    pub fn refresh_count(&self) -> usize {
        self.state.lock().unwrap().gate.refreshes
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.state.lock().unwrap().tokens_seen.clone()
    }

    pub fn created(&self) -> Vec<NewMeeting> {
        self.state.lock().unwrap().created.clone()
    }
}

impl TokenRefresher for FakeMeetings {
    fn provider_id(&self) -> &str {
        ZOOM
    }

    fn refresh_token(
        &self,
        refresh_token: String,
    ) -> BoxFuture<'_, ProviderResult<IntegrationCredential>> {
        let credential = self.state.lock().unwrap().gate.refresh(ZOOM, refresh_token);
        Box::pin(async move { Ok(credential) })
    }
}

impl MeetingProvider for FakeMeetings {
    fn create_meeting(
        &self,
        access_token: String,
        meeting: NewMeeting,
    ) -> BoxFuture<'_, ProviderResult<MeetingResource>> {
        let result = {
            let mut state = self.state.lock().unwrap();
            state.tokens_seen.push(access_token.clone());
            state.gate.check(ZOOM, &access_token).and_then(|()| match state.failure {
                Some(code) => Err(ProviderError::new(code, "meeting create failed").with_provider(ZOOM)),
                None => {
                    state.created.push(meeting);
                    let n = state.created.len();
                    Ok(MeetingResource {
                        id: Some(n.to_string()),
                        join_url: format!("https://zoom.us/j/{n}"),
                    })
                }
            })
        };
        Box::pin(async move { result })
    }
}

/// Notifier that keeps every delivered message and refuses some recipients.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutgoingMessage>>,
    failing: HashSet<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(mut self, recipient: &str) -> Self {
        self.failing.insert(recipient.to_string());
        self
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, message: OutgoingMessage) -> BoxFuture<'_, ProviderResult<()>> {
        let result = if self.failing.contains(&message.to) {
            Err(ProviderError::delivery(format!("mailbox {} unavailable", message.to)))
        } else {
            self.sent.lock().unwrap().push(message);
            Ok(())
        };
        Box::pin(async move { result })
    }
}

/// Booking store whose writes can be made to fail.
#[derive(Default)]
pub struct FlakyBookingStore {
    inner: MemoryBookingStore,
    fail_insert: bool,
    fail_update: HashSet<BookingId>,
}

impl FlakyBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bookings(bookings: Vec<Booking>) -> Self {
        Self {
            inner: MemoryBookingStore::with_bookings(bookings),
            ..Self::default()
        }
    }

    pub fn fail_insert(mut self) -> Self {
        self.fail_insert = true;
        self
    }

    pub fn fail_update_for(mut self, id: &str) -> Self {
        self.fail_update.insert(BookingId::from(id));
        self
    }
}

impl BookingStore for FlakyBookingStore {
    fn insert(&self, booking: Booking) -> BoxFuture<'_, ProviderResult<BookingId>> {
        if self.fail_insert {
            return Box::pin(async { Err(ProviderError::storage("disk full")) });
        }
        self.inner.insert(booking)
    }

    fn list_all(&self) -> BoxFuture<'_, ProviderResult<Vec<Booking>>> {
        self.inner.list_all()
    }

    fn update<'a>(
        &'a self,
        id: &'a BookingId,
        patch: BookingPatch,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        if self.fail_update.contains(id) {
            return Box::pin(async { Err(ProviderError::storage("write refused")) });
        }
        self.inner.update(id, patch)
    }
}
