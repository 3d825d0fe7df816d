//! `slots`, `book` and `sweep`: the three booking operations over the socket.

use std::fmt::Write as _;

use zoomzone_core::{BookingConfirmation, BookingRequest, BusinessZone, Slot, SweepReport, SweepStage};
use zoomzone_protocol::{Request, Response};

use super::print_json;
use crate::error::{ClientError, ClientResult};
use crate::socket::SocketClient;

pub async fn slots(
    client: &SocketClient,
    date: &str,
    duration_minutes: i64,
    json: bool,
) -> ClientResult<()> {
    match client.request(Request::get_slots(date, duration_minutes)).await? {
        Response::Slots { slots, .. } if json => print_json(&slots),
        Response::Slots { slots, .. } => {
            print!("{}", render_slots(&slots));
            Ok(())
        }
        other => Err(unexpected(&other)),
    }
}

/// One `HH:MM  free|busy` line per slot.
pub fn render_slots(slots: &[Slot]) -> String {
    if slots.is_empty() {
        return "No slots left on this day.\n".to_string();
    }
    slots
        .iter()
        .map(|slot| {
            let state = if slot.is_busy { "busy" } else { "free" };
            format!("{}  {state}\n", slot.local_time)
        })
        .collect()
}

pub async fn book(
    client: &SocketClient,
    request: BookingRequest,
    zone: BusinessZone,
    json: bool,
) -> ClientResult<()> {
    match client.request(Request::submit_booking(request)).await? {
        Response::BookingConfirmed { confirmation } if json => print_json(&confirmation),
        Response::BookingConfirmed { confirmation } => {
            print!("{}", render_confirmation(&confirmation, &zone));
            Ok(())
        }
        other => Err(unexpected(&other)),
    }
}

pub fn render_confirmation(confirmation: &BookingConfirmation, zone: &BusinessZone) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Booked {}", zone.display(confirmation.start));
    let _ = writeln!(out, "  until:    {}", zone.display(confirmation.end));
    let _ = writeln!(out, "  join:     {}", confirmation.meeting_link);
    let _ = writeln!(out, "  booking:  {}", confirmation.booking_id);
    let _ = writeln!(out, "  event:    {}", confirmation.calendar_event_id);
    for failure in &confirmation.notification_failures {
        let _ = writeln!(out, "  warning:  notification not sent to {failure}");
    }
    out
}

pub async fn sweep(client: &SocketClient, json: bool) -> ClientResult<()> {
    match client.request(Request::RunSweep).await? {
        Response::SweepReport { report } if json => print_json(&report),
        Response::SweepReport { report } => {
            print!("{}", render_sweep(&report));
            Ok(())
        }
        other => Err(unexpected(&other)),
    }
}

pub fn render_sweep(report: &SweepReport) -> String {
    let mut out = format!(
        "Reminders sent: {}, failed: {}\n",
        report.sent.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        let stage = match failure.stage {
            SweepStage::Send => "send",
            SweepStage::MarkSent => "mark sent",
        };
        let _ = writeln!(out, "  {} ({stage}): {}", failure.booking_id, failure.error);
    }
    out
}

fn unexpected(response: &Response) -> ClientError {
    ClientError::UnexpectedResponse(format!("{response:?}"))
}
