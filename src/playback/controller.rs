use super::engine::{execute, EngineStatus, MediaEngine};
use super::progress::PlaybackProgress;
use super::state::{PlaybackEvent, PlaybackState, TimerEffect};
use super::timer::{HideTimer, TimerHandle};
use crate::config::Config;
use crate::progress::ProgressHandle;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc as tokio_mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// User gestures sent to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    TogglePlayPause,
    /// Tap on the seek track; width is the track width measured at tap time
    SeekTap {
        offset_px: f64,
        track_width_px: f64,
    },
    CycleRate,
    ToggleMute,
    ShowControls,
    HideControls,
    /// Tap on the video surface outside the controls
    SurfaceTap,
    Stop,
}

impl PlaybackCommand {
    fn into_event(self) -> Option<PlaybackEvent> {
        let event = match self {
            PlaybackCommand::TogglePlayPause => PlaybackEvent::TogglePlayPause,
            PlaybackCommand::SeekTap {
                offset_px,
                track_width_px,
            } => PlaybackEvent::SeekTap {
                offset_px,
                track_width_px,
            },
            PlaybackCommand::CycleRate => PlaybackEvent::CycleRate,
            PlaybackCommand::ToggleMute => PlaybackEvent::ToggleMute,
            PlaybackCommand::ShowControls => PlaybackEvent::ShowControls,
            PlaybackCommand::HideControls => PlaybackEvent::HideControls,
            PlaybackCommand::SurfaceTap => PlaybackEvent::SurfaceTap,
            PlaybackCommand::Stop => return None,
        };
        Some(event)
    }
}

/// Player settings taken from the app config
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub controls_hide_delay: Duration,
    pub autoplay: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            controls_hide_delay: Duration::from_millis(3000),
            autoplay: true,
        }
    }
}

impl From<&Config> for PlayerOptions {
    fn from(config: &Config) -> Self {
        Self {
            controls_hide_delay: config.controls_hide_delay,
            autoplay: config.autoplay,
        }
    }
}

/// Handle to a running playback controller
#[derive(Clone)]
pub struct PlaybackHandle {
    command_tx: tokio_mpsc::UnboundedSender<PlaybackCommand>,
    progress_handle: ProgressHandle<PlaybackProgress>,
    state_rx: watch::Receiver<PlaybackState>,
}

impl PlaybackHandle {
    fn send(&self, command: PlaybackCommand) {
        if self.command_tx.send(command).is_err() {
            debug!("Playback controller already stopped");
        }
    }

    pub fn toggle_play_pause(&self) {
        self.send(PlaybackCommand::TogglePlayPause);
    }

    pub fn seek_tap(&self, offset_px: f64, track_width_px: f64) {
        self.send(PlaybackCommand::SeekTap {
            offset_px,
            track_width_px,
        });
    }

    pub fn cycle_rate(&self) {
        self.send(PlaybackCommand::CycleRate);
    }

    pub fn toggle_mute(&self) {
        self.send(PlaybackCommand::ToggleMute);
    }

    pub fn show_controls(&self) {
        self.send(PlaybackCommand::ShowControls);
    }

    pub fn hide_controls(&self) {
        self.send(PlaybackCommand::HideControls);
    }

    pub fn tap_surface(&self) {
        self.send(PlaybackCommand::SurfaceTap);
    }

    /// Unload the engine and end the controller task
    pub fn stop(&self) {
        self.send(PlaybackCommand::Stop);
    }

    /// Latest published state
    pub fn snapshot(&self) -> PlaybackState {
        self.state_rx.borrow().clone()
    }

    /// Wait until the published state satisfies `predicate`.
    /// Returns `None` if the controller stops first.
    pub async fn wait_for<F>(&self, predicate: F) -> Option<PlaybackState>
    where
        F: FnMut(&PlaybackState) -> bool,
    {
        let mut state_rx = self.state_rx.clone();
        let state = state_rx.wait_for(predicate).await.ok()?;
        Some(state.clone())
    }

    pub fn subscribe_progress(&self) -> tokio_mpsc::UnboundedReceiver<PlaybackProgress> {
        self.progress_handle.subscribe_all()
    }
}

/// Owns one player screen's `PlaybackState`.
///
/// Runs as a single task that takes user commands, engine statuses and the
/// controls hide deadline one at a time, so no two updates interleave.
pub struct PlaybackController {
    engine: Arc<dyn MediaEngine>,
    command_rx: tokio_mpsc::UnboundedReceiver<PlaybackCommand>,
    progress_tx: tokio_mpsc::UnboundedSender<PlaybackProgress>,
    state_tx: watch::Sender<PlaybackState>,
    state: PlaybackState,
    timer: HideTimer,
    autoplay: bool,
}

impl PlaybackController {
    pub fn start<S>(
        engine: Arc<dyn MediaEngine>,
        statuses: S,
        source_url: impl Into<String>,
        options: PlayerOptions,
        runtime_handle: tokio::runtime::Handle,
    ) -> PlaybackHandle
    where
        S: Stream<Item = EngineStatus> + Send + Unpin + 'static,
    {
        let (command_tx, command_rx) = tokio_mpsc::unbounded_channel();
        let (progress_tx, progress_rx) = tokio_mpsc::unbounded_channel();
        let progress_handle = ProgressHandle::new(progress_rx, runtime_handle.clone());

        let state = PlaybackState::new(source_url);
        let (state_tx, state_rx) = watch::channel(state.clone());

        let controller = PlaybackController {
            engine,
            command_rx,
            progress_tx,
            state_tx,
            state,
            timer: HideTimer::new(options.controls_hide_delay),
            autoplay: options.autoplay,
        };

        runtime_handle.spawn(controller.run(statuses));

        PlaybackHandle {
            command_tx,
            progress_handle,
            state_rx,
        }
    }

    async fn run<S>(mut self, mut statuses: S)
    where
        S: Stream<Item = EngineStatus> + Unpin,
    {
        info!("PlaybackController started for {}", self.state.source_url);

        if let Err(e) = self
            .engine
            .load(&self.state.source_url, self.autoplay)
            .await
        {
            error!("Failed to load {}: {}", self.state.source_url, e);
            self.emit(PlaybackProgress::EngineError {
                command: "load",
                error: e.to_string(),
            });
        }

        let mut statuses_open = true;

        loop {
            let pending = self.timer.pending();

            tokio::select! {
                command = self.command_rx.recv() => {
                    match command.and_then(PlaybackCommand::into_event) {
                        Some(event) => self.apply(event).await,
                        None => break,
                    }
                }
                status = statuses.next(), if statuses_open => {
                    match status {
                        Some(status) => self.apply(PlaybackEvent::EngineStatus(status)).await,
                        None => {
                            warn!("Media engine status stream ended");
                            statuses_open = false;
                        }
                    }
                }
                _ = wait_for_deadline(pending) => {
                    if let Some(handle) = pending {
                        if self.timer.fire(handle) {
                            self.apply(PlaybackEvent::ControlsTimerElapsed).await;
                        }
                    }
                }
            }
        }

        self.timer.cancel();
        if let Err(e) = self.engine.unload().await {
            warn!("Failed to unload media engine: {}", e);
        }
        info!("PlaybackController stopped");
    }

    async fn apply(&mut self, event: PlaybackEvent) {
        let before = self.state.clone();
        let is_status = matches!(&event, PlaybackEvent::EngineStatus(status) if status.loaded);
        let transition = self.state.reduce(event);

        match transition.timer {
            TimerEffect::Arm => {
                let handle = self.timer.arm(Instant::now());
                self.state.controls_hide_deadline = Some(handle.deadline());
            }
            TimerEffect::Cancel => {
                self.timer.cancel();
                self.state.controls_hide_deadline = None;
            }
            TimerEffect::Keep => {}
        }

        self.publish(&before, is_status);

        // Local state already mirrors the request; the engine confirms (or
        // contradicts) it through a later status.
        for command in transition.commands {
            if let Err(e) = execute(self.engine.as_ref(), command).await {
                error!("Media engine {} failed: {}", command.name(), e);
                self.emit(PlaybackProgress::EngineError {
                    command: command.name(),
                    error: e.to_string(),
                });
            }
        }
    }

    fn publish(&self, before: &PlaybackState, is_status: bool) {
        let state = &self.state;

        if state.transport != before.transport {
            info!("Playback {:?} -> {:?}", before.transport, state.transport);
            self.emit(PlaybackProgress::StateChanged {
                transport: state.transport,
            });
        }

        if is_status {
            self.emit(PlaybackProgress::PositionUpdate {
                position_millis: state.position_millis,
                duration_millis: state.duration_millis,
            });
        } else if state.position_millis != before.position_millis {
            self.emit(PlaybackProgress::Seeked {
                position_millis: state.position_millis,
            });
        }

        if state.rate != before.rate {
            self.emit(PlaybackProgress::RateChanged {
                rate: state.rate.value(),
            });
        }

        if state.muted != before.muted {
            self.emit(PlaybackProgress::MuteChanged { muted: state.muted });
        }

        match (before.controls_visible, state.controls_visible) {
            (false, true) => self.emit(PlaybackProgress::ControlsShown),
            (true, false) => self.emit(PlaybackProgress::ControlsHidden),
            _ => {}
        }

        self.state_tx.send_replace(state.clone());
    }

    fn emit(&self, progress: PlaybackProgress) {
        let _ = self.progress_tx.send(progress);
    }
}

async fn wait_for_deadline(pending: Option<TimerHandle>) {
    match pending {
        Some(handle) => tokio::time::sleep_until(handle.deadline()).await,
        None => std::future::pending().await,
    }
}
