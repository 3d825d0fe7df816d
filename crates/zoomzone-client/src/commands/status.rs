//! `status`: what the daemon has been doing.

use std::fmt::Write as _;

use zoomzone_protocol::{Request, Response, StatusInfo};

use super::print_json;
use crate::error::{ClientError, ClientResult};
use crate::socket::SocketClient;

pub async fn run(client: &SocketClient, json: bool) -> ClientResult<()> {
    match client.request(Request::Status).await? {
        Response::Status { info } if json => print_json(&info),
        Response::Status { info } => {
            print!("{}", render(&info));
            Ok(())
        }
        other => Err(ClientError::UnexpectedResponse(format!("{other:?}"))),
    }
}

pub fn render(info: &StatusInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "uptime:    {}", format_uptime(info.uptime_seconds));
    let _ = writeln!(out, "timezone:  {}", info.timezone);
    let _ = writeln!(out, "bookings:  {}", info.bookings_submitted);
    let sweeps = if info.sweeps_paused { "paused" } else { "running" };
    let _ = writeln!(out, "sweeps:    {sweeps}");
    match &info.last_sweep {
        Some(sweep) => {
            let _ = write!(
                out,
                "last sweep: {} (sent {}, failed {})",
                sweep.ran_at.format("%Y-%m-%d %H:%M:%S UTC"),
                sweep.sent,
                sweep.failed
            );
            if let Some(error) = &sweep.error {
                let _ = write!(out, ", aborted: {error}");
            }
            out.push('\n');
        }
        None => out.push_str("last sweep: never\n"),
    }
    out
}

fn format_uptime(seconds: u64) -> String {
    let (hours, rest) = (seconds / 3600, seconds % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
