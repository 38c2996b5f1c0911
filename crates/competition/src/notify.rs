//! Seams to whatever UI drives the session: fire-and-forget notifications and
//! awaited yes/no confirmations.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

pub trait Notifier: Send + Sync {
    /// `duration` is a display hint; `None` leaves it to the UI.
    fn notify(&self, message: &str, level: NotifyLevel, duration: Option<Duration>);
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, level: NotifyLevel, _duration: Option<Duration>) {
        match level {
            NotifyLevel::Info | NotifyLevel::Success => info!(%level, "{}", message),
            NotifyLevel::Warning => warn!("{}", message),
            NotifyLevel::Error => error!("{}", message),
        }
    }
}

/// Answers every confirmation the same way. Used for non-interactive runs.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, message: &str) -> bool {
        info!("{} -> {}", message, if self.0 { "tak" } else { "nie" });
        self.0
    }
}
