//! Poll loop that keeps a [`TimerView`] in step with the timer service.
//!
//! ```text
//! interval (500 ms, missed ticks skipped) ──┐
//!                                           ├─ select! ─▶ one request at a time ─▶ TimerView::apply
//! TimerCommand (mpsc) ──────────────────────┘
//! ```
//!
//! Polls and commands share one task, so at most one request is ever in
//! flight and a poll response can never be applied after a later command.
//! Dropping every [`TimerHandle`] sender ends the loop.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::TimerConfig;

use super::client::{TimerClient, TimerError};
use super::state::{TimerDurations, TimerEvent, TimerView};

/// Thread-safe handle to the projection.  Do **not** hold the lock across
/// `.await` points.
pub type SharedTimerView = Arc<Mutex<TimerView>>;

type Reply = oneshot::Sender<Result<(), TimerError>>;

#[derive(Debug)]
pub enum TimerCommand {
    Start(Reply),
    Stop(Reply),
}

// ---------------------------------------------------------------------------
// TimerSync
// ---------------------------------------------------------------------------

pub struct TimerSync {
    client: TimerClient,
    view: SharedTimerView,
    poll_interval: Duration,
}

impl TimerSync {
    pub fn new(client: TimerClient, durations: TimerDurations, poll_interval: Duration) -> Self {
        Self {
            client,
            view: Arc::new(Mutex::new(TimerView::new(durations))),
            poll_interval,
        }
    }

    pub fn from_config(config: &TimerConfig) -> Self {
        Self::new(
            TimerClient::from_config(config),
            TimerDurations::from(config),
            Duration::from_millis(config.poll_interval_ms.max(1)),
        )
    }

    pub fn view(&self) -> SharedTimerView {
        Arc::clone(&self.view)
    }

    /// Run until `commands` is closed.  The first poll goes out immediately.
    pub async fn run(self, mut commands: mpsc::Receiver<TimerCommand>) {
        log::info!(
            "timer: syncing with {} every {:?}",
            self.client.base_url(),
            self.poll_interval
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.poll().await,
                command = commands.recv() => match command {
                    Some(command) => self.execute(command).await,
                    None => break,
                },
            }
        }

        log::info!("timer: command channel closed, sync loop stopping");
    }

    fn update(&self, event: TimerEvent) {
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        view.apply(event, Utc::now());
    }

    fn can_command(&self) -> bool {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .can_command()
    }

    async fn poll(&self) {
        self.update(TimerEvent::Requesting);
        match self.client.status().await {
            Ok(status) => self.update(TimerEvent::PollSucceeded(status)),
            Err(e) => {
                log::debug!("timer: poll failed: {e}");
                self.update(TimerEvent::PollFailed);
            }
        }
    }

    async fn execute(&self, command: TimerCommand) {
        let (reply, outcome) = match command {
            TimerCommand::Start(reply) => (reply, self.start().await),
            TimerCommand::Stop(reply) => (reply, self.stop().await),
        };
        // The caller may have given up waiting.
        let _ = reply.send(outcome);
    }

    async fn start(&self) -> Result<(), TimerError> {
        if !self.can_command() {
            return Err(TimerError::Unavailable);
        }
        self.update(TimerEvent::Requesting);
        match self.client.start().await {
            Ok(()) => {
                self.update(TimerEvent::Started);
                Ok(())
            }
            Err(e) => {
                log::warn!("timer: start failed: {e}");
                self.update(TimerEvent::StartFailed);
                Err(e)
            }
        }
    }

    async fn stop(&self) -> Result<(), TimerError> {
        if !self.can_command() {
            return Err(TimerError::Unavailable);
        }
        self.update(TimerEvent::Requesting);
        match self.client.stop().await {
            Ok(()) => {
                self.update(TimerEvent::Stopped);
                Ok(())
            }
            Err(e) => {
                log::warn!("timer: stop failed: {e}");
                self.update(TimerEvent::StopFailed);
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TimerHandle
// ---------------------------------------------------------------------------

/// Owns a running [`TimerSync`] task.  Dropping the handle aborts the task.
pub struct TimerHandle {
    commands: mpsc::Sender<TimerCommand>,
    view: SharedTimerView,
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// Spawn the sync loop on the current tokio runtime.
    pub fn spawn(sync: TimerSync) -> Self {
        let (commands, rx) = mpsc::channel(8);
        let view = sync.view();
        let task = tokio::spawn(sync.run(rx));
        Self {
            commands,
            view,
            task: Some(task),
        }
    }

    pub fn view(&self) -> SharedTimerView {
        Arc::clone(&self.view)
    }

    /// Copy of the current projection.
    pub fn snapshot(&self) -> TimerView {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn start(&self) -> Result<(), TimerError> {
        self.send(TimerCommand::Start).await
    }

    pub async fn stop(&self) -> Result<(), TimerError> {
        self.send(TimerCommand::Stop).await
    }

    async fn send(&self, make: fn(Reply) -> TimerCommand) -> Result<(), TimerError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| TimerError::Unavailable)?;
        rx.await.map_err(|_| TimerError::Unavailable)?
    }

    /// Close the command channel and wait for the loop to finish.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            drop(self);
            let _ = task.await;
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::state::{SyncPhase, CONNECT_ERROR};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sync_for(server: &MockServer) -> TimerSync {
        TimerSync::from_config(&TimerConfig {
            base_url: server.uri(),
            poll_interval_ms: 20,
            ..TimerConfig::default()
        })
    }

    async fn mount_status(server: &MockServer, code: u16, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/pomodoro/status"))
            .respond_with(ResponseTemplate::new(code).set_body_json(body))
            .mount(server)
            .await;
    }

    /// Status answer that takes `delay` to arrive, much longer than the poll
    /// interval.
    async fn mount_slow_status(server: &MockServer, delay: Duration, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/pomodoro/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
            .mount(server)
            .await;
    }

    async fn mount_start(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/pomodoro/start"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "running" })),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    /// Wait until `check` holds or give up after ~2 s.
    async fn wait_for(handle: &TimerHandle, check: impl Fn(&TimerView) -> bool) -> TimerView {
        for _ in 0..100 {
            let view = handle.snapshot();
            if check(&view) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("timer view never reached expected state: {:?}", handle.snapshot());
    }

    #[tokio::test]
    async fn first_poll_syncs_view() {
        let server = MockServer::start().await;
        let started = (Utc::now() - chrono::Duration::seconds(10)).to_rfc3339();
        mount_status(
            &server,
            200,
            serde_json::json!({ "is_active": true, "is_break": false, "start_time": started }),
        )
        .await;

        let handle = TimerHandle::spawn(sync_for(&server));
        let view = wait_for(&handle, |v| v.time_left().is_some()).await;
        assert!(view.is_active());
        let left = view.time_left().unwrap();
        assert!((1488..=1490).contains(&left), "left = {left}");
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn start_applies_optimistic_state() {
        let server = MockServer::start().await;
        // Slow polls keep the next status answer from landing before the
        // snapshot below.
        mount_slow_status(
            &server,
            Duration::from_millis(300),
            serde_json::json!({ "is_active": false, "is_break": false, "start_time": null }),
        )
        .await;
        mount_start(&server).await;

        let handle = TimerHandle::spawn(sync_for(&server));
        wait_for(&handle, |v| v.last_poll().is_some()).await;

        handle.start().await.unwrap();
        let view = handle.snapshot();
        assert!(view.is_active());
        assert!(!view.is_break());
        assert_eq!(view.time_left(), Some(1500));
        assert_eq!(view.error(), None);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn slow_polls_never_overlap() {
        let server = MockServer::start().await;
        mount_slow_status(
            &server,
            Duration::from_millis(150),
            serde_json::json!({ "is_active": false, "is_break": false }),
        )
        .await;

        // 20 ms ticks against 150 ms answers: overlapping polls would send
        // about thirty requests in this window, serial ones at most five.
        let handle = TimerHandle::spawn(sync_for(&server));
        tokio::time::sleep(Duration::from_millis(600)).await;
        handle.shutdown().await;

        let polls = server.received_requests().await.unwrap().len();
        assert!((2..=6).contains(&polls), "polls = {polls}");
    }

    #[tokio::test]
    async fn command_waits_for_in_flight_poll() {
        let server = MockServer::start().await;
        mount_slow_status(
            &server,
            Duration::from_millis(200),
            serde_json::json!({ "is_active": false, "is_break": false, "start_time": null }),
        )
        .await;
        mount_start(&server).await;

        let handle = TimerHandle::spawn(sync_for(&server));
        wait_for(&handle, |v| v.last_poll().is_some()).await;
        // The next poll is already out; the start queues behind it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.snapshot().phase(), SyncPhase::Connecting);

        let sent = std::time::Instant::now();
        handle.start().await.unwrap();
        assert!(sent.elapsed() >= Duration::from_millis(100));

        let view = handle.snapshot();
        assert!(view.is_active(), "an earlier poll answer replaced the start");
        assert_eq!(view.time_left(), Some(1500));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn unreachable_service_sets_error_and_refuses_commands() {
        let server = MockServer::start().await;
        mount_status(&server, 500, serde_json::json!({ "error": "boom" })).await;
        Mock::given(method("POST"))
            .and(path("/pomodoro/start"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let handle = TimerHandle::spawn(sync_for(&server));
        let view = wait_for(&handle, |v| v.error().is_some()).await;
        assert_eq!(view.error(), Some(CONNECT_ERROR));

        let err = handle.start().await.unwrap_err();
        assert!(matches!(err, TimerError::Unavailable));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn loop_ends_when_handle_shuts_down() {
        let server = MockServer::start().await;
        mount_status(
            &server,
            200,
            serde_json::json!({ "is_active": false, "is_break": false }),
        )
        .await;

        let sync = sync_for(&server);
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(sync.run(rx));
        drop(tx);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("sync loop did not stop")
            .unwrap();
    }
}
