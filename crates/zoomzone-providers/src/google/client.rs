//! Google Calendar API client.
//!
//! Low-level HTTP calls: listing events (recurring series expanded, pages
//! followed) and inserting events. Tokens are passed per call.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zoomzone_core::{BusinessZone, ProviderLocalTime, TimeInterval};

use crate::error::ProviderResult;
use crate::http;
use crate::provider::{CreatedEvent, NewCalendarEvent};
use crate::raw_event::{EventStatus, RawEvent, RawEventTime};

/// Google Calendar API client.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(http_client: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        )
    }

    /// Lists events overlapping `window`, following every page.
    pub async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: TimeInterval,
    ) -> ProviderResult<Vec<RawEvent>> {
        let mut all_events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_events_page(access_token, calendar_id, window, page_token.as_deref())
                .await?;

            all_events.extend(page.items.into_iter().filter_map(convert_event));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "fetched {} events from calendar {}",
            all_events.len(),
            calendar_id
        );
        Ok(all_events)
    }

    async fn list_events_page(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: TimeInterval,
        page_token: Option<&str>,
    ) -> ProviderResult<EventListResponse> {
        let mut request = self
            .http_client
            .get(self.events_url(calendar_id))
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", window.start.to_rfc3339()),
                ("timeMax", window.end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(http::transport_error)?;
        http::read_json(response).await
    }

    /// Inserts an event. Start and end are sent as business-zone local
    /// date-times with the zone name attached.
    pub async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        zone: &BusinessZone,
        event: &NewCalendarEvent,
    ) -> ProviderResult<CreatedEvent> {
        let body = InsertEventBody {
            summary: &event.summary,
            description: &event.description,
            start: zone.provider_local(event.start),
            end: zone.provider_local(event.end),
            attendees: event
                .attendees
                .iter()
                .map(|email| InsertAttendee { email })
                .collect(),
        };

        let response = self
            .http_client
            .post(self.events_url(calendar_id))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(http::transport_error)?;

        let created: InsertEventResponse = http::read_json(response).await?;
        Ok(CreatedEvent {
            id: created.id,
            html_link: created.html_link,
        })
    }
}

/// Converts a Google Calendar API event to a RawEvent.
fn convert_event(event: ApiEvent) -> Option<RawEvent> {
    let Some(id) = event.id else {
        warn!("skipping event without id");
        return None;
    };
    let start = convert_time(&event.start, &id, "start")?;
    let end = convert_time(&event.end, &id, "end")?;

    let mut raw = RawEvent::new(id, start, end)
        .with_status(EventStatus::from_provider(event.status.as_deref()));
    raw.summary = event.summary;
    raw.recurring_event_id = event.recurring_event_id;
    Some(raw)
}

fn convert_time(time: &ApiEventTime, id: &str, which: &str) -> Option<RawEventTime> {
    match (&time.date_time, &time.date) {
        (Some(dt), _) => DateTime::parse_from_rfc3339(dt)
            .map_err(|e| warn!(event_id = %id, "failed to parse {which} time: {e}"))
            .ok()
            .map(|parsed| RawEventTime::DateTime(parsed.with_timezone(&Utc))),
        (None, Some(date)) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| warn!(event_id = %id, "failed to parse {which} date: {e}"))
            .ok()
            .map(RawEventTime::Date),
        (None, None) => {
            warn!(event_id = %id, "event has no {which} time");
            None
        }
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    start: ApiEventTime,
    #[serde(default)]
    end: ApiEventTime,
    status: Option<String>,
    recurring_event_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

#[derive(Debug, Serialize)]
struct InsertEventBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: ProviderLocalTime,
    end: ProviderLocalTime,
    attendees: Vec<InsertAttendee<'a>>,
}

#[derive(Debug, Serialize)]
struct InsertAttendee<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertEventResponse {
    id: String,
    html_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, m, 0).unwrap()
    }

    fn client(server: &MockServer) -> GoogleCalendarClient {
        GoogleCalendarClient::new(
            http::build_client(Duration::from_secs(5)).unwrap(),
            server.uri(),
        )
    }

    fn window() -> TimeInterval {
        TimeInterval::new(utc(10, 6, 0), utc(11, 6, 0)).unwrap()
    }

    mod parsing {
        use super::*;

        #[test]
        fn timed_event() {
            let json = r#"{
                "id": "event1",
                "summary": "Test Meeting",
                "start": {"dateTime": "2024-06-10T10:00:00-06:00", "timeZone": "America/Denver"},
                "end": {"dateTime": "2024-06-10T11:00:00-06:00"},
                "status": "confirmed"
            }"#;
            let raw = convert_event(serde_json::from_str(json).unwrap()).unwrap();
            assert_eq!(raw.start, RawEventTime::DateTime(utc(10, 16, 0)));
            assert_eq!(raw.end, RawEventTime::DateTime(utc(10, 17, 0)));
            assert_eq!(raw.status, EventStatus::Confirmed);
        }

        #[test]
        fn all_day_event() {
            let json = r#"{
                "id": "event1",
                "start": {"date": "2024-06-10"},
                "end": {"date": "2024-06-11"}
            }"#;
            let raw = convert_event(serde_json::from_str(json).unwrap()).unwrap();
            assert!(raw.is_all_day());
        }

        #[test]
        fn cancelled_instance_keeps_status() {
            let json = r#"{
                "id": "event1_20240610",
                "status": "cancelled",
                "recurringEventId": "event1",
                "start": {"dateTime": "2024-06-10T10:00:00Z"},
                "end": {"dateTime": "2024-06-10T11:00:00Z"}
            }"#;
            let raw = convert_event(serde_json::from_str(json).unwrap()).unwrap();
            assert!(raw.is_cancelled());
            assert_eq!(raw.recurring_event_id.as_deref(), Some("event1"));
        }

        #[test]
        fn missing_times_are_skipped() {
            let json = r#"{"id": "event1", "start": {}, "end": {}}"#;
            assert!(convert_event(serde_json::from_str(json).unwrap()).is_none());
            let json = r#"{"id": "event1", "start": {"dateTime": "garbage"}, "end": {}}"#;
            assert!(convert_event(serde_json::from_str(json).unwrap()).is_none());
        }
    }

    #[tokio::test]
    async fn list_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .and(query_param("pageToken", "p2"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "b",
                    "start": {"dateTime": "2024-06-10T18:00:00Z"},
                    "end": {"dateTime": "2024-06-10T19:00:00Z"}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "a",
                    "start": {"dateTime": "2024-06-10T15:00:00Z"},
                    "end": {"dateTime": "2024-06-10T16:00:00Z"}
                }],
                "nextPageToken": "p2"
            })))
            .mount(&server)
            .await;

        let events = client(&server)
            .list_events("tok", "primary", window())
            .await
            .unwrap();
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn list_unauthorized_needs_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server)
            .list_events("stale", "primary", window())
            .await
            .unwrap_err();
        assert!(err.needs_refresh());
    }

    #[tokio::test]
    async fn insert_sends_local_times() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .and(body_partial_json(serde_json::json!({
                "summary": "Zoom Meeting with Ada",
                "start": {"dateTime": "2024-06-10T08:00:00", "timeZone": "America/Denver"},
                "end": {"dateTime": "2024-06-10T08:15:00", "timeZone": "America/Denver"},
                "attendees": [{"email": "ada@example.com"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "evt-1",
                "htmlLink": "https://calendar.google.com/event?eid=1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = client(&server)
            .insert_event(
                "tok",
                "primary",
                &BusinessZone::default(),
                &NewCalendarEvent {
                    summary: "Zoom Meeting with Ada".into(),
                    start: utc(10, 14, 0),
                    end: utc(10, 14, 15),
                    attendees: vec!["ada@example.com".into()],
                    description: "Join Zoom: https://zoom.us/j/1".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.id, "evt-1");
    }
}
