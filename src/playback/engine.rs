use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Media engine rejected {command}: {reason}")]
    Rejected {
        command: &'static str,
        reason: String,
    },
    #[error("Media engine unavailable: {0}")]
    Unavailable(String),
}

/// Periodic report from the media engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    pub loaded: bool,
    pub position_millis: u64,
    pub duration_millis: u64,
    /// Whether the engine intends to be playing
    pub should_play: bool,
}

/// Command the controller issues to the media engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    Play,
    Pause,
    Seek(u64),
    SetRate(f32),
    SetMuted(bool),
}

impl EngineCommand {
    pub fn name(&self) -> &'static str {
        match self {
            EngineCommand::Play => "play",
            EngineCommand::Pause => "pause",
            EngineCommand::Seek(_) => "seek",
            EngineCommand::SetRate(_) => "set rate",
            EngineCommand::SetMuted(_) => "set muted",
        }
    }
}

/// Trait for the platform media engine (allows mocking for tests)
///
/// Every call resolves once the engine has acknowledged the command.
/// Position and load state come back separately on the status stream.
#[async_trait::async_trait]
pub trait MediaEngine: Send + Sync {
    async fn load(&self, url: &str, should_play: bool) -> Result<(), EngineError>;
    async fn unload(&self) -> Result<(), EngineError>;
    async fn play(&self) -> Result<(), EngineError>;
    async fn pause(&self) -> Result<(), EngineError>;
    async fn seek(&self, position_millis: u64) -> Result<(), EngineError>;
    async fn set_rate(&self, rate: f32) -> Result<(), EngineError>;
    async fn set_muted(&self, muted: bool) -> Result<(), EngineError>;
}

/// Dispatch a command to the matching engine call
pub async fn execute(engine: &dyn MediaEngine, command: EngineCommand) -> Result<(), EngineError> {
    match command {
        EngineCommand::Play => engine.play().await,
        EngineCommand::Pause => engine.pause().await,
        EngineCommand::Seek(position_millis) => engine.seek(position_millis).await,
        EngineCommand::SetRate(rate) => engine.set_rate(rate).await,
        EngineCommand::SetMuted(muted) => engine.set_muted(muted).await,
    }
}
