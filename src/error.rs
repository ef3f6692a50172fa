use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PowerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("output file does not exist: {0:?}")]
    MissingOutput(PathBuf),

    #[error("no method to parse report file {0:?}")]
    UnsupportedReport(PathBuf),

    #[error("unexpected value in report at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("no frame boundaries for {0:?}: companion timing files are missing and the report has no segmentation")]
    MissingFrames(PathBuf),

    #[error("profile has {rows} rows but the frame timing files list {frames} frames")]
    FrameMismatch { rows: usize, frames: usize },

    #[error("invalid physical unit: {0}")]
    Unit(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error writing csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("error serializing/deserializing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("error rendering template: {0}")]
    Template(#[from] tera::Error),
}

impl PowerError {
    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            line,
            msg: msg.into(),
        }
    }
}
