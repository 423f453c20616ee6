//! Error types for mine transitions, placement and message loading

use std::fmt;
use std::io;

/// Why a mine refused to transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineError {
    /// The mine already detonated or was defused.
    AlreadyResolved,
    /// The owner left, is observing, or has no live position.
    OwnerInvalid,
}

impl fmt::Display for MineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyResolved => write!(f, "mine is already resolved"),
            Self::OwnerInvalid => write!(f, "mine owner is not an active participant"),
        }
    }
}

impl std::error::Error for MineError {}

/// Caller misuse of `/mine`. The display text is sent to the player as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceError {
    Observer,
    NotSpawned,
    MissingFlag,
}

impl fmt::Display for PlaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observer => write!(f, "Observers cannot set mines."),
            Self::NotSpawned => write!(f, "You have to be alive to set a mine."),
            Self::MissingFlag => {
                write!(f, "You need a Useless flag to set a mine. Go find one!")
            }
        }
    }
}

impl std::error::Error for PlaceError {}

#[derive(Debug)]
pub enum MessageError {
    /// No source is configured for the bank.
    NoSource,
    Io { source: String, error: io::Error },
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSource => write!(f, "no message file configured"),
            Self::Io { source, error } => write!(f, "could not read {source}: {error}"),
        }
    }
}

impl std::error::Error for MessageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoSource => None,
            Self::Io { error, .. } => Some(error),
        }
    }
}
