//! Pomodoro timer synchronisation.
//!
//! The timer itself runs on a remote service; this module polls it, keeps a
//! drift-corrected [`TimerView`] and forwards start/stop commands.
//!
//! * [`TimerClient`]: HTTP calls to `/pomodoro/{status,start,stop}`.
//! * [`TimerView`]: the client projection and its transition function.
//! * [`TimerSync`] / [`TimerHandle`]: the poll loop and its owner.

pub mod client;
pub mod state;
pub mod sync;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{TimerClient, TimerError};
pub use state::{
    format_clock, parse_start_time, time_left, SyncPhase, TimerDurations, TimerEvent,
    TimerStatus, TimerView,
};
pub use sync::{SharedTimerView, TimerCommand, TimerHandle, TimerSync};
