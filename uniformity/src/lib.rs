pub mod catalog;
pub mod catch;
pub mod condition;
pub mod config;
pub mod demo;
pub mod error;
pub mod grid;
pub mod noise;
pub mod phase_timer;
pub mod recorder;
pub mod scene;
pub mod schedule;
pub mod serde_seconds;
pub mod session;
pub mod text;
pub mod trial;

pub use catalog::Catalog;
pub use config::ExperimentConfig;
pub use error::{ExperimentError, Result};
pub use recorder::DataRecorder;
pub use session::{Session, SessionStatus};
