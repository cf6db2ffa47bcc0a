pub mod auth;
pub mod capabilities;
pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod providers;
pub mod secrets;
pub mod server;
mod util;

pub use capabilities::{GenreClassifier, GenrePhrase, SongCandidate, SongFinder, SongSearch};
pub use errors::{MixerError, Result};
pub use orchestrator::{MoodMixer, Recommendation};
