use super::state::TransportState;

/// Progress updates during playback
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackProgress {
    StateChanged {
        transport: TransportState,
    },
    PositionUpdate {
        position_millis: u64,
        duration_millis: u64,
    },
    Seeked {
        position_millis: u64,
    },
    RateChanged {
        rate: f32,
    },
    MuteChanged {
        muted: bool,
    },
    ControlsShown,
    /// The hide deadline elapsed or the user hid the overlay; the fade-out
    /// transition starts here
    ControlsHidden,
    EngineError {
        command: &'static str,
        error: String,
    },
}
