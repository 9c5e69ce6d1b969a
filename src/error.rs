//! Errors surfaced to the host application
//!
//! The simulation itself never fails; these cover the host-facing edges
//! (settings parsing, highscore entry, stage flow requests).

use core::fmt;

use crate::sim::StagePhase;

#[derive(Debug)]
pub enum Error {
    SettingsParse(serde_json::Error),
    VolumeOutOfRange { field: &'static str, value: u8, max: u8 },
    HighscoreNameEmpty,
    HighscoreNameTooLong { len: usize, max: usize },
    ScoreNotQualified { score: u64 },
    WrongPhase { expected: StagePhase, actual: StagePhase },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SettingsParse(err) => write!(f, "invalid settings json: {err}"),
            Self::VolumeOutOfRange { field, value, max } => {
                write!(f, "{field} out of range: {value} (allowed 0..={max})")
            }
            Self::HighscoreNameEmpty => write!(f, "highscore name is empty"),
            Self::HighscoreNameTooLong { len, max } => {
                write!(f, "highscore name too long: {len} chars (max {max})")
            }
            Self::ScoreNotQualified { score } => {
                write!(f, "score {score} does not qualify for the highscore table")
            }
            Self::WrongPhase { expected, actual } => {
                write!(f, "stage is in {actual:?}, operation requires {expected:?}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SettingsParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::SettingsParse(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
