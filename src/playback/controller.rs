//! [`PlaybackController`]: exclusive owner of the speech engine.
//!
//! At most one utterance is active: `play` always cancels before it speaks,
//! and the engine is cancelled unconditionally when the controller drops.

use super::engine::{PlaybackEvent, SpeechEngine, SpeechError, UtteranceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing(UtteranceId),
}

pub struct PlaybackController<E: SpeechEngine> {
    engine: E,
    state: PlaybackState,
    next_id: u64,
}

impl<E: SpeechEngine> PlaybackController<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: PlaybackState::Idle,
            next_id: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing(_))
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_available()
    }

    /// Speak `text`, cancelling whatever was playing first.
    ///
    /// On error the controller is left `Idle`.
    pub fn play(&mut self, text: &str) -> Result<UtteranceId, SpeechError> {
        self.stop();

        self.next_id += 1;
        let id = UtteranceId(self.next_id);
        self.engine.speak(id, text)?;
        self.state = PlaybackState::Playing(id);
        log::info!("playback: started {id:?} ({} chars)", text.chars().count());
        Ok(id)
    }

    /// Cancel and force `Idle`.
    pub fn stop(&mut self) {
        self.engine.cancel();
        self.state = PlaybackState::Idle;
    }

    /// Apply an engine notice.  Events for anything but the current
    /// utterance are stale and ignored.
    pub fn handle(&mut self, event: PlaybackEvent) {
        match self.state {
            PlaybackState::Playing(current) if current == event.utterance() => {
                if let PlaybackEvent::Failed(id) = event {
                    log::warn!("playback: {id:?} failed");
                }
                self.state = PlaybackState::Idle;
            }
            _ => log::debug!("playback: ignoring stale {event:?}"),
        }
    }

    /// Drain pending engine notices.
    pub fn tick(&mut self) {
        while let Some(event) = self.engine.poll_event() {
            self.handle(event);
        }
    }
}

impl<E: SpeechEngine> Drop for PlaybackController<E> {
    fn drop(&mut self) {
        self.engine.cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Speak(UtteranceId, String),
        Cancel,
    }

    /// Records calls and checks that no two utterances overlap.
    #[derive(Default)]
    struct Log {
        calls: Vec<Call>,
        active: Option<UtteranceId>,
        max_active: usize,
    }

    struct RecordingEngine {
        log: Arc<Mutex<Log>>,
        events: VecDeque<PlaybackEvent>,
        available: bool,
    }

    impl RecordingEngine {
        fn new() -> (Self, Arc<Mutex<Log>>) {
            let log = Arc::new(Mutex::new(Log::default()));
            (
                Self {
                    log: Arc::clone(&log),
                    events: VecDeque::new(),
                    available: true,
                },
                log,
            )
        }
    }

    impl SpeechEngine for RecordingEngine {
        fn is_available(&self) -> bool {
            self.available
        }

        fn speak(&mut self, id: UtteranceId, text: &str) -> Result<(), SpeechError> {
            if !self.available {
                return Err(SpeechError::Unavailable);
            }
            let mut log = self.log.lock().unwrap();
            log.calls.push(Call::Speak(id, text.to_string()));
            let now_active = usize::from(log.active.is_some()) + 1;
            log.max_active = log.max_active.max(now_active);
            log.active = Some(id);
            Ok(())
        }

        fn cancel(&mut self) {
            let mut log = self.log.lock().unwrap();
            log.calls.push(Call::Cancel);
            log.active = None;
        }

        fn poll_event(&mut self) -> Option<PlaybackEvent> {
            self.events.pop_front()
        }
    }

    #[test]
    fn play_cancels_before_speaking() {
        let (engine, log) = RecordingEngine::new();
        let mut controller = PlaybackController::new(engine);

        let first = controller.play("one").unwrap();
        let second = controller.play("two").unwrap();
        assert_ne!(first, second);
        assert_eq!(controller.state(), PlaybackState::Playing(second));

        let log = log.lock().unwrap();
        assert_eq!(
            log.calls,
            vec![
                Call::Cancel,
                Call::Speak(first, "one".into()),
                Call::Cancel,
                Call::Speak(second, "two".into()),
            ]
        );
        assert_eq!(log.max_active, 1);
    }

    #[test]
    fn stop_forces_idle() {
        let (engine, _log) = RecordingEngine::new();
        let mut controller = PlaybackController::new(engine);
        controller.play("text").unwrap();
        controller.stop();
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn ended_and_failed_return_to_idle() {
        let (engine, _log) = RecordingEngine::new();
        let mut controller = PlaybackController::new(engine);

        let id = controller.play("a").unwrap();
        controller.handle(PlaybackEvent::Ended(id));
        assert!(!controller.is_playing());

        let id = controller.play("b").unwrap();
        controller.handle(PlaybackEvent::Failed(id));
        assert!(!controller.is_playing());
    }

    #[test]
    fn stale_event_is_ignored() {
        let (engine, _log) = RecordingEngine::new();
        let mut controller = PlaybackController::new(engine);

        let old = controller.play("old").unwrap();
        let current = controller.play("new").unwrap();
        controller.handle(PlaybackEvent::Ended(old));
        assert_eq!(controller.state(), PlaybackState::Playing(current));
    }

    #[test]
    fn tick_drains_engine_events() {
        let (mut engine, _log) = RecordingEngine::new();
        engine.events.push_back(PlaybackEvent::Ended(UtteranceId(1)));
        let mut controller = PlaybackController::new(engine);
        // The queued event matches the first utterance id handed out.
        controller.play("x").unwrap();
        controller.tick();
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn failed_speak_leaves_idle() {
        let (mut engine, _log) = RecordingEngine::new();
        engine.available = false;
        let mut controller = PlaybackController::new(engine);
        assert!(controller.play("x").is_err());
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn drop_cancels() {
        let (engine, log) = RecordingEngine::new();
        let mut controller = PlaybackController::new(engine);
        controller.play("x").unwrap();
        drop(controller);
        let log = log.lock().unwrap();
        assert_eq!(log.calls.last(), Some(&Call::Cancel));
        assert!(log.active.is_none());
    }
}
