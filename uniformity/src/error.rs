use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("repetitions must be a positive multiple of 3 so a third can be catch trials, got {0}")]
    Repetitions(u32),
    #[error("`{name}` must be longer than zero")]
    ZeroDuration { name: &'static str },
    #[error("latency catch duration ({catch:?}) must be shorter than the stimulus duration ({stimulus:?})")]
    CatchNotShorter {
        catch: std::time::Duration,
        stimulus: std::time::Duration,
    },
    #[error("stimulus sizes must satisfy 0 < small < big, got small={small} big={big}")]
    SizeOrder { small: f32, big: f32 },
    #[error("`{name}` must be positive and finite, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("the block list is empty")]
    NoBlocks,
    #[error("no trial list for block `{0}`")]
    NoTrials(crate::condition::BlockType),
    #[error("unknown key name `{0}`")]
    UnknownKey(String),
    #[error("advance and quit keys must differ (both `{0}`)")]
    KeyClash(String),
    #[error("config format version {found} is newer than the supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("could not read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("a grid needs at least one column and one row, got {columns}x{rows}")]
    Empty { columns: u32, rows: u32 },
    #[error("grid bounds must be finite")]
    NonFinite,
    #[error("the grid {axis} axis has zero length")]
    ZeroLength { axis: char },
    #[error("the grid x axis must run left to right and y top to bottom ({axis}: {start} -> {end})")]
    Direction { axis: char, start: f32, end: f32 },
}

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("could not create data directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("could not open backup file {path}: {source}")]
    OpenBackup { path: PathBuf, source: io::Error },
    #[error("could not append to backup file {path}: {source}")]
    AppendBackup { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteCsv { path: PathBuf, source: io::Error },
}

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Recorder(#[from] RecorderError),
}

pub type Result<T, E = ExperimentError> = std::result::Result<T, E>;
