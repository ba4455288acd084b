// # Upload Module
//
// Publishes a picked video in three strictly ordered remote calls:
//
// - **Acquire target**: one-time upload URL plus server storage key (20%)
// - **Transfer**: PUT the file bytes to that URL, must answer 200 (40%)
// - **Commit**: create the catalog entry `{title, filename}` (80% → 100%)
//
// Public API:
// - `UploadCoordinator`: runs uploads and owns the current `UploadSession`
// - `UploadProgress`: events for subscribers
// - `UploadError`: validation, network and transfer failures

mod coordinator;
mod types;

pub use coordinator::UploadCoordinator;
pub use types::{UploadError, UploadOutcome, UploadPhase, UploadProgress, UploadSession};
