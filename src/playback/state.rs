use super::engine::{EngineCommand, EngineStatus};
use super::format::format_millis;
use tokio::time::Instant;

/// Rates offered by the rate button, in cycling order
pub const PLAYBACK_RATES: [f32; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

const NORMAL_RATE_INDEX: usize = 2;

/// One entry of `PLAYBACK_RATES`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackRate(usize);

impl PlaybackRate {
    pub const NORMAL: PlaybackRate = PlaybackRate(NORMAL_RATE_INDEX);

    pub fn from_value(value: f32) -> Option<Self> {
        PLAYBACK_RATES
            .iter()
            .position(|rate| (rate - value).abs() < f32::EPSILON)
            .map(PlaybackRate)
    }

    pub fn value(self) -> f32 {
        PLAYBACK_RATES[self.0]
    }

    /// Next rate, wrapping from the fastest back to the slowest
    pub fn next(self) -> Self {
        PlaybackRate((self.0 + 1) % PLAYBACK_RATES.len())
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        PlaybackRate::NORMAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Loading,
    Playing,
    Paused,
}

/// Everything a player screen renders, owned by the playback controller.
///
/// Position, duration and load completion only ever come from engine
/// statuses; the rest is driven by user gestures and the hide timer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub source_url: String,
    pub transport: TransportState,
    pub position_millis: u64,
    pub duration_millis: u64,
    pub rate: PlaybackRate,
    pub muted: bool,
    pub controls_visible: bool,
    pub controls_hide_deadline: Option<Instant>,
    /// What the user last asked for
    pub desired_playing: bool,
    /// What the engine last reported
    pub engine_playing: bool,
}

/// Inputs to the reducer: user intent and engine observations alike
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    EngineStatus(EngineStatus),
    TogglePlayPause,
    SeekTap {
        offset_px: f64,
        track_width_px: f64,
    },
    CycleRate,
    ToggleMute,
    ShowControls,
    HideControls,
    SurfaceTap,
    ControlsTimerElapsed,
}

/// What the controls hide timer should do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerEffect {
    #[default]
    Keep,
    Arm,
    Cancel,
}

/// Side effects requested by one reducer step
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transition {
    pub commands: Vec<EngineCommand>,
    pub timer: TimerEffect,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    fn command(command: EngineCommand) -> Self {
        Self {
            commands: vec![command],
            timer: TimerEffect::Keep,
        }
    }

    fn timer(timer: TimerEffect) -> Self {
        Self {
            commands: Vec::new(),
            timer,
        }
    }
}

/// Map a tap on the seek track to a ratio of the full duration.
///
/// `track_width_px` must be the width measured when the gesture happened.
/// Edges are valid targets: 0 maps to 0.0 and `width` to 1.0. Returns
/// `None` when the width is unusable.
pub fn seek_ratio(offset_px: f64, track_width_px: f64) -> Option<f64> {
    if !offset_px.is_finite() || !track_width_px.is_finite() || track_width_px <= 0.0 {
        return None;
    }
    Some((offset_px / track_width_px).clamp(0.0, 1.0))
}

impl PlaybackState {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            transport: TransportState::Loading,
            position_millis: 0,
            duration_millis: 0,
            rate: PlaybackRate::NORMAL,
            muted: false,
            controls_visible: true,
            controls_hide_deadline: None,
            desired_playing: false,
            engine_playing: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.transport != TransportState::Loading
    }

    pub fn is_playing(&self) -> bool {
        self.transport == TransportState::Playing
    }

    /// position / duration, `None` until the duration is known
    pub fn progress_ratio(&self) -> Option<f64> {
        if self.duration_millis == 0 {
            return None;
        }
        Some((self.position_millis as f64 / self.duration_millis as f64).clamp(0.0, 1.0))
    }

    /// `("1:15", "2:30")` style labels for the position and duration
    pub fn time_labels(&self) -> (String, String) {
        (
            format_millis(self.position_millis),
            format_millis(self.duration_millis),
        )
    }

    pub fn reduce(&mut self, event: PlaybackEvent) -> Transition {
        match event {
            PlaybackEvent::EngineStatus(status) => self.observe(status),
            PlaybackEvent::TogglePlayPause => {
                if !self.is_loaded() {
                    return Transition::none();
                }
                let (command, transport) = if self.is_playing() {
                    (EngineCommand::Pause, TransportState::Paused)
                } else {
                    (EngineCommand::Play, TransportState::Playing)
                };
                self.transport = transport;
                self.desired_playing = transport == TransportState::Playing;
                Transition::command(command)
            }
            PlaybackEvent::SeekTap {
                offset_px,
                track_width_px,
            } => {
                if !self.is_loaded() || self.duration_millis == 0 {
                    return Transition::none();
                }
                let Some(ratio) = seek_ratio(offset_px, track_width_px) else {
                    return Transition::none();
                };
                let target = (ratio * self.duration_millis as f64).round() as u64;
                let target = target.min(self.duration_millis);
                self.position_millis = target;
                Transition::command(EngineCommand::Seek(target))
            }
            PlaybackEvent::CycleRate => {
                self.rate = self.rate.next();
                Transition::command(EngineCommand::SetRate(self.rate.value()))
            }
            PlaybackEvent::ToggleMute => {
                self.muted = !self.muted;
                Transition::command(EngineCommand::SetMuted(self.muted))
            }
            PlaybackEvent::ShowControls => {
                self.controls_visible = true;
                if self.is_loaded() {
                    Transition::timer(TimerEffect::Arm)
                } else {
                    Transition::none()
                }
            }
            PlaybackEvent::HideControls => {
                self.controls_visible = false;
                Transition::timer(TimerEffect::Cancel)
            }
            PlaybackEvent::SurfaceTap => {
                if !self.is_loaded() {
                    return Transition::none();
                }
                self.controls_visible = !self.controls_visible;
                if self.controls_visible {
                    Transition::timer(TimerEffect::Arm)
                } else {
                    Transition::timer(TimerEffect::Cancel)
                }
            }
            PlaybackEvent::ControlsTimerElapsed => {
                self.controls_visible = false;
                self.controls_hide_deadline = None;
                Transition::none()
            }
        }
    }

    /// Engine statuses are ground truth: they complete loading and
    /// overrule any optimistic transport flag that disagrees.
    fn observe(&mut self, status: EngineStatus) -> Transition {
        if !status.loaded {
            if self.is_loaded() {
                self.transport = TransportState::Loading;
                self.controls_visible = true;
                return Transition::timer(TimerEffect::Cancel);
            }
            return Transition::none();
        }

        self.duration_millis = status.duration_millis;
        self.position_millis = if status.duration_millis > 0 {
            status.position_millis.min(status.duration_millis)
        } else {
            status.position_millis
        };
        self.engine_playing = status.should_play;

        let observed = if status.should_play {
            TransportState::Playing
        } else {
            TransportState::Paused
        };

        if !self.is_loaded() {
            self.transport = observed;
            self.desired_playing = status.should_play;
            self.controls_visible = true;
            return Transition::timer(TimerEffect::Arm);
        }

        if self.transport != observed {
            tracing::debug!(
                "Engine reports {:?}, overriding local {:?}",
                observed,
                self.transport
            );
            self.transport = observed;
            self.desired_playing = status.should_play;
        }
        Transition::none()
    }
}
