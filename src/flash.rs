use gotham::middleware::session::SessionData;
use gotham::state::{FromState, State};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Info,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Error => write!(f, "error"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn info(message: impl Into<String>) -> Flash {
        Flash {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Flash {
        Flash {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// Notices waiting for the visitor's next rendered page.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FlashMessages(Vec<Flash>);

pub fn push(state: &mut State, flash: Flash) {
    if let Some(session) = SessionData::<FlashMessages>::try_borrow_mut_from(state) {
        session.0.push(flash);
    }
}

pub fn info(state: &mut State, message: impl Into<String>) {
    push(state, Flash::info(message))
}

pub fn error(state: &mut State, message: impl Into<String>) {
    push(state, Flash::error(message))
}

/// Drains the pending notices. The session is only touched when there is
/// something to drain.
pub fn take(state: &mut State) -> Vec<Flash> {
    match SessionData::<FlashMessages>::try_borrow_mut_from(state) {
        Some(session) if !session.0.is_empty() => std::mem::take(&mut session.0),
        _ => Vec::new(),
    }
}
