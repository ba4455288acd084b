// Library exports for the CLI, integration tests and embedding apps

pub mod catalog;
pub mod config;
pub mod file_picker;
pub mod models;
pub mod playback;
pub mod progress;
pub mod remote;
pub mod upload;

pub use catalog::CatalogStore;
pub use config::Config;

// Test support (only available with test-utils feature)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
