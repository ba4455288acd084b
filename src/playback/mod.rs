// # Playback Module
//
// Transport state machine for one player screen:
//
// - **PlaybackState**: reducer over user intent and engine observations
// - **HideTimer**: cancellable single-shot deadline for the controls overlay
// - **MediaEngine**: boundary to the platform decoder/renderer
// - **PlaybackController**: task that owns the state and talks to the engine

mod controller;
pub mod engine;
mod format;
pub mod progress;
pub mod state;
mod timer;

pub use controller::{PlaybackCommand, PlaybackController, PlaybackHandle, PlayerOptions};
pub use engine::{EngineCommand, EngineError, EngineStatus, MediaEngine};
pub use format::format_millis;
pub use progress::PlaybackProgress;
pub use state::{
    seek_ratio, PlaybackEvent, PlaybackRate, PlaybackState, TransportState, PLAYBACK_RATES,
};
pub use timer::{HideTimer, TimerHandle};
