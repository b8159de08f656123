// src/scheduler.rs
//! Fixed wall-clock triggers (default 08:00 and 20:00 local time).

use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};

use crate::error::{RelayError, Result};
use crate::pipeline::Runner;

pub const DEFAULT_TIMES: &[&str] = &["08:00", "20:00"];

/// Parse `HH:MM` (or `HH:MM:SS`) strings; sorted, without duplicates.
pub fn parse_times<S: AsRef<str>>(raw: &[S]) -> Result<Vec<NaiveTime>> {
    let mut out = Vec::with_capacity(raw.len());
    for s in raw {
        let s = s.as_ref().trim();
        let t = NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map_err(|_| RelayError::config(format!("invalid schedule time {s:?}, expected HH:MM")))?;
        out.push(t);
    }
    out.sort();
    out.dedup();
    if out.is_empty() {
        return Err(RelayError::config("schedule needs at least one time"));
    }
    Ok(out)
}

/// Earliest trigger strictly after `now`. Local times skipped by a DST
/// gap are ignored for that day.
pub fn next_trigger<Tz: TimeZone>(now: &DateTime<Tz>, times: &[NaiveTime]) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();
    (0..=2)
        .filter_map(|d| today.checked_add_signed(Duration::days(d)))
        .flat_map(|day| times.iter().map(move |t| day.and_time(*t)))
        .filter_map(|naive| tz.from_local_datetime(&naive).earliest())
        .filter(|candidate| candidate > now)
        .min()
}

/// Run forever at the given local times. The next trigger is recomputed
/// from the wall clock after every run, so a long run or a suspended host
/// never shifts later triggers.
pub async fn run_forever(runner: &mut Runner, times: &[NaiveTime]) {
    loop {
        let now = Local::now();
        let Some(next) = next_trigger(&now, times) else {
            tracing::error!(?times, "no upcoming trigger, scheduler stopping");
            return;
        };
        tracing::info!(next = %next.format("%Y-%m-%d %H:%M:%S %:z"), "waiting for next run");

        // sleep can return early; never fire before the trigger
        loop {
            let remaining = next.signed_duration_since(Local::now());
            match remaining.to_std() {
                Ok(d) if !d.is_zero() => tokio::time::sleep(d).await,
                _ => break,
            }
        }

        let report = runner.run_once().await;
        tracing::debug!(run = report.run, dispatched = report.dispatched(), "scheduled run complete");
    }
}
