//! Client-side projection of the remote pomodoro timer.
//!
//! The service owns the truth: `{is_active, is_break, start_time}`.  The
//! client keeps a [`TimerView`] derived from it, and every change to that
//! view goes through [`TimerView::apply`].
//!
//! `time_left` is always recomputed from the server's `start_time` and the
//! local wall clock, never decremented locally, so clock skew cannot pile up
//! over a session.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TimerConfig;

pub const CONNECT_ERROR: &str =
    "Cannot connect to timer service. Please ensure the backend is running on port 5001.";
pub const START_ERROR: &str = "Failed to start timer. Please ensure the backend is running.";
pub const STOP_ERROR: &str = "Failed to stop timer. Please ensure the backend is running.";

/// Displayed time-left changes only when the new value moves by more than
/// this many seconds.
const DAMPING_SECS: u64 = 1;

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Body of `GET /pomodoro/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub is_active: bool,
    pub is_break: bool,
    #[serde(default)]
    pub start_time: Option<String>,
}

/// Parse a service timestamp.
///
/// RFC 3339 stamps carry their own offset.  Naive ISO-8601 stamps (what the
/// service emits) are read as local time.  Anything else yields `None`.
pub fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.with_timezone(&Utc));
    }
    let naive: NaiveDateTime = raw.parse().ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

/// Length of the focus and break periods, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerDurations {
    pub work_secs: u64,
    pub break_secs: u64,
}

impl Default for TimerDurations {
    fn default() -> Self {
        Self {
            work_secs: 25 * 60,
            break_secs: 5 * 60,
        }
    }
}

impl From<&TimerConfig> for TimerDurations {
    fn from(config: &TimerConfig) -> Self {
        Self {
            work_secs: config.work_secs,
            break_secs: config.break_secs,
        }
    }
}

/// Seconds left in the current period, or `None` when the timer has no
/// start time.
///
/// A start time in the future counts as zero elapsed.
///
/// ```
/// use chrono::{Duration, Utc};
/// use study_kit::timer::{time_left, TimerDurations, TimerStatus};
///
/// let now = Utc::now();
/// let status = TimerStatus {
///     is_active: true,
///     is_break: false,
///     start_time: Some((now - Duration::seconds(10)).to_rfc3339()),
/// };
/// assert_eq!(time_left(&status, now, TimerDurations::default()), Some(1490));
/// ```
pub fn time_left(status: &TimerStatus, now: DateTime<Utc>, durations: TimerDurations) -> Option<u64> {
    let start = parse_start_time(status.start_time.as_deref()?)?;
    let elapsed = u64::try_from((now - start).num_seconds()).unwrap_or(0);
    let total = if status.is_break {
        durations.break_secs
    } else {
        durations.work_secs
    };
    Some(total.saturating_sub(elapsed))
}

/// `MM:SS`; an unset value shows a full focus period.
pub fn format_clock(seconds: Option<u64>) -> String {
    match seconds {
        None => "25:00".to_string(),
        Some(s) => format!("{:02}:{:02}", s / 60, s % 60),
    }
}

// ---------------------------------------------------------------------------
// TimerView
// ---------------------------------------------------------------------------

/// Whether a request to the service is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// A poll or command is in flight (also the state before the first poll
    /// returns).
    Connecting,
    /// The last request has completed, successfully or not.
    Synced,
}

/// Everything that can change the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A poll or command is about to be sent.
    Requesting,
    PollSucceeded(TimerStatus),
    PollFailed,
    Started,
    StartFailed,
    Stopped,
    StopFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerView {
    durations: TimerDurations,
    is_active: bool,
    is_break: bool,
    time_left: Option<u64>,
    error: Option<String>,
    phase: SyncPhase,
    last_poll: Option<DateTime<Utc>>,
}

impl TimerView {
    pub fn new(durations: TimerDurations) -> Self {
        Self {
            durations,
            is_active: false,
            is_break: false,
            time_left: None,
            error: None,
            phase: SyncPhase::Connecting,
            last_poll: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_break(&self) -> bool {
        self.is_break
    }

    pub fn time_left(&self) -> Option<u64> {
        self.time_left
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// When the last poll answered, successfully or not.  `None` until the
    /// first one does.
    pub fn last_poll(&self) -> Option<DateTime<Utc>> {
        self.last_poll
    }

    /// Start/stop are offered only with no error showing and nothing in
    /// flight.
    pub fn can_command(&self) -> bool {
        self.error.is_none() && self.phase == SyncPhase::Synced
    }

    pub fn clock(&self) -> String {
        format_clock(self.time_left)
    }

    pub fn headline(&self) -> &'static str {
        if self.is_break {
            "Break Time!"
        } else {
            "Focus Time"
        }
    }

    /// The single transition function.  `now` is the local wall clock used
    /// to project `time_left` from the server's start time.
    pub fn apply(&mut self, event: TimerEvent, now: DateTime<Utc>) {
        match event {
            TimerEvent::Requesting => {
                self.phase = SyncPhase::Connecting;
                return;
            }
            TimerEvent::PollSucceeded(status) => {
                self.last_poll = Some(now);
                self.error = None;
                if self.is_active != status.is_active {
                    self.is_active = status.is_active;
                }
                if self.is_break != status.is_break {
                    self.is_break = status.is_break;
                }
                match time_left(&status, now, self.durations) {
                    Some(fresh) => self.show_time_left(fresh),
                    None => self.time_left = None,
                }
            }
            TimerEvent::PollFailed => {
                self.last_poll = Some(now);
                self.error = Some(CONNECT_ERROR.into());
            }
            TimerEvent::Started => {
                self.error = None;
                self.is_active = true;
                self.time_left = Some(self.durations.work_secs);
            }
            TimerEvent::StartFailed => self.error = Some(START_ERROR.into()),
            TimerEvent::Stopped => {
                self.error = None;
                self.is_active = false;
                self.is_break = false;
                self.time_left = None;
            }
            TimerEvent::StopFailed => self.error = Some(STOP_ERROR.into()),
        }
        self.phase = SyncPhase::Synced;
    }

    fn show_time_left(&mut self, fresh: u64) {
        match self.time_left {
            Some(shown) if shown.abs_diff(fresh) <= DAMPING_SECS => {}
            _ => self.time_left = Some(fresh),
        }
    }
}

impl Default for TimerView {
    fn default() -> Self {
        Self::new(TimerDurations::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn status_started(ago_secs: i64, is_break: bool, now: DateTime<Utc>) -> TimerStatus {
        TimerStatus {
            is_active: true,
            is_break,
            start_time: Some((now - Duration::seconds(ago_secs)).to_rfc3339()),
        }
    }

    fn synced_view() -> TimerView {
        let mut view = TimerView::default();
        view.apply(
            TimerEvent::PollSucceeded(TimerStatus {
                is_active: false,
                is_break: false,
                start_time: None,
            }),
            Utc::now(),
        );
        view
    }

    // ---- time_left ---

    #[test]
    fn work_period_ten_seconds_in() {
        let now = Utc::now();
        let status = status_started(10, false, now);
        assert_eq!(time_left(&status, now, TimerDurations::default()), Some(1490));
    }

    #[test]
    fn break_overrun_clamps_to_zero() {
        let now = Utc::now();
        let status = status_started(310, true, now);
        assert_eq!(time_left(&status, now, TimerDurations::default()), Some(0));
    }

    #[test]
    fn future_start_counts_as_no_elapsed_time() {
        let now = Utc::now();
        let status = status_started(-30, false, now);
        assert_eq!(time_left(&status, now, TimerDurations::default()), Some(1500));
    }

    #[test]
    fn missing_or_garbled_start_time_is_unset() {
        let now = Utc::now();
        let mut status = status_started(0, false, now);
        status.start_time = None;
        assert_eq!(time_left(&status, now, TimerDurations::default()), None);
        status.start_time = Some("yesterday-ish".into());
        assert_eq!(time_left(&status, now, TimerDurations::default()), None);
    }

    #[test]
    fn naive_stamp_is_local_time() {
        let now = Utc::now();
        let started = (now - Duration::seconds(60)).with_timezone(&Local);
        let raw = started.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        let parsed = parse_start_time(&raw).unwrap();
        assert!((now - parsed).num_seconds() >= 59);
        assert!((now - parsed).num_seconds() <= 61);
    }

    #[test]
    fn naive_stamp_without_fraction_parses() {
        assert!(parse_start_time("2024-03-01T09:30:00").is_some());
    }

    // ---- format_clock / headline ---

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(None), "25:00");
        assert_eq!(format_clock(Some(1490)), "24:50");
        assert_eq!(format_clock(Some(5)), "00:05");
    }

    #[test]
    fn headline_follows_break_flag() {
        let now = Utc::now();
        let mut view = TimerView::default();
        assert_eq!(view.headline(), "Focus Time");
        view.apply(TimerEvent::PollSucceeded(status_started(1, true, now)), now);
        assert_eq!(view.headline(), "Break Time!");
    }

    // ---- apply ---

    #[test]
    fn starts_connecting_and_refuses_commands() {
        let view = TimerView::default();
        assert_eq!(view.phase(), SyncPhase::Connecting);
        assert_eq!(view.last_poll(), None);
        assert!(!view.can_command());
    }

    #[test]
    fn damping_ignores_one_second_drift() {
        let now = Utc::now();
        let mut view = TimerView::default();
        view.apply(TimerEvent::PollSucceeded(status_started(10, false, now)), now);
        assert_eq!(view.time_left(), Some(1490));

        let later = now + Duration::seconds(1);
        view.apply(TimerEvent::PollSucceeded(status_started(10, false, now)), later);
        assert_eq!(view.time_left(), Some(1490));

        let much_later = now + Duration::seconds(2);
        view.apply(TimerEvent::PollSucceeded(status_started(10, false, now)), much_later);
        assert_eq!(view.time_left(), Some(1488));
    }

    #[test]
    fn poll_failure_keeps_projection_and_sets_error() {
        let now = Utc::now();
        let mut view = TimerView::default();
        view.apply(TimerEvent::PollSucceeded(status_started(10, false, now)), now);

        view.apply(TimerEvent::Requesting, now);
        view.apply(TimerEvent::PollFailed, now);
        assert!(view.is_active());
        assert_eq!(view.time_left(), Some(1490));
        assert_eq!(view.error(), Some(CONNECT_ERROR));
        assert_eq!(view.phase(), SyncPhase::Synced);
        assert_eq!(view.last_poll(), Some(now));
        assert!(!view.can_command());

        view.apply(TimerEvent::PollSucceeded(status_started(12, false, now)), now);
        assert!(view.error().is_none());
        assert!(view.can_command());
    }

    #[test]
    fn absent_start_time_clears_display() {
        let now = Utc::now();
        let mut view = TimerView::default();
        view.apply(TimerEvent::PollSucceeded(status_started(10, false, now)), now);
        view.apply(
            TimerEvent::PollSucceeded(TimerStatus {
                is_active: false,
                is_break: false,
                start_time: None,
            }),
            now,
        );
        assert_eq!(view.time_left(), None);
        assert!(!view.is_active());
    }

    #[test]
    fn start_is_optimistic() {
        let mut view = synced_view();
        view.apply(TimerEvent::Requesting, Utc::now());
        assert!(!view.can_command());
        view.apply(TimerEvent::Started, Utc::now());
        assert!(view.is_active());
        assert_eq!(view.time_left(), Some(1500));
        assert!(view.can_command());
    }

    #[test]
    fn stop_clears_everything() {
        let now = Utc::now();
        let mut view = TimerView::default();
        view.apply(TimerEvent::PollSucceeded(status_started(10, true, now)), now);
        view.apply(TimerEvent::Stopped, now);
        assert!(!view.is_active());
        assert!(!view.is_break());
        assert_eq!(view.time_left(), None);
    }

    #[test]
    fn failed_commands_leave_state_alone() {
        let mut view = synced_view();
        let before = (view.is_active(), view.is_break(), view.time_left());
        view.apply(TimerEvent::StartFailed, Utc::now());
        assert_eq!(before, (view.is_active(), view.is_break(), view.time_left()));
        assert_eq!(view.error(), Some(START_ERROR));

        view.apply(TimerEvent::StopFailed, Utc::now());
        assert_eq!(view.error(), Some(STOP_ERROR));
    }
}
