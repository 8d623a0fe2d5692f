//! Transient error notice
//!
//! A single message slot shared by every operation. Raising a message arms a
//! one-shot deadline; raising again while one is showing restarts the window.
//! There is no queue: the newest message replaces the old one.

use std::time::{Duration, Instant};

use crate::models::ServerId;

/// Operation that raised the current notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeOrigin {
    Load,
    Add,
    Delete(ServerId),
    Clear(u64),
}

#[derive(Debug, Clone)]
struct Shown {
    message: String,
    origin: NoticeOrigin,
    deadline: Instant,
}

/// The current error message and its auto-clear deadline
#[derive(Debug, Clone)]
pub struct ErrorNotice {
    timeout: Duration,
    shown: Option<Shown>,
}

impl ErrorNotice {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            shown: None,
        }
    }

    /// Show a message, (re)arming the deadline
    pub fn raise(&mut self, message: impl Into<String>, origin: NoticeOrigin, now: Instant) {
        self.shown = Some(Shown {
            message: message.into(),
            origin,
            deadline: now + self.timeout,
        });
    }

    /// Clear the message and cancel the deadline
    pub fn dismiss(&mut self) {
        self.shown = None;
    }

    /// Clear the message only if it was raised by `origin`
    pub fn dismiss_from(&mut self, origin: NoticeOrigin) -> bool {
        if self.origin() == Some(origin) {
            self.shown = None;
            true
        } else {
            false
        }
    }

    /// Drop the message once its deadline has passed
    ///
    /// Returns true when a message was cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.shown {
            Some(shown) if now >= shown.deadline => {
                self.shown = None;
                true
            }
            _ => false,
        }
    }

    /// The message as visible at `now`
    pub fn message_at(&self, now: Instant) -> Option<&str> {
        self.shown
            .as_ref()
            .filter(|shown| now < shown.deadline)
            .map(|shown| shown.message.as_str())
    }

    pub fn origin(&self) -> Option<NoticeOrigin> {
        self.shown.as_ref().map(|shown| shown.origin)
    }

    /// Deadline of the current message, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.shown.as_ref().map(|shown| shown.deadline)
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_none()
    }
}

impl Default for ErrorNotice {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_NOTICE_TIMEOUT_MS))
    }
}
