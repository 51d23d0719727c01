//! Alert delivery for monitor transitions
//!
//! The [`Dispatcher`] is built once at startup and shared by every monitor
//! task. It routes a formatted message to the channel selected in the
//! monitor's alert configuration.

pub mod message;
pub mod telegram;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::monitoring::Monitor;
use crate::monitoring::types::EventKind;

pub use telegram::TelegramNotifier;

/// Channel a monitor sends its alerts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertChannel {
    #[default]
    None,
    Telegram,
    Email,
    All,
}

impl std::fmt::Display for AlertChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertChannel::None => write!(f, "none"),
            AlertChannel::Telegram => write!(f, "telegram"),
            AlertChannel::Email => write!(f, "email"),
            AlertChannel::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{channel} token or chat id is empty")]
    MissingCredentials { channel: AlertChannel },

    #[error("failed to send request to telegram: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to send message to telegram: {status} - {body}")]
    Transport { status: u16, body: String },
}

/// Routes transition alerts to the configured channel
pub struct Dispatcher {
    telegram: TelegramNotifier,
}

impl Dispatcher {
    pub fn new(telegram: TelegramNotifier) -> Self {
        Self { telegram }
    }

    /// Deliver `payload` for `monitor` over its configured channel.
    ///
    /// Nothing is retried; the caller decides how to report a failure.
    pub async fn send(
        &self,
        monitor: &Monitor,
        event: EventKind,
        payload: &str,
    ) -> Result<(), NotifyError> {
        let route = monitor.alert();

        match route.channel {
            AlertChannel::None => {
                debug!(monitor = %monitor.name(), %event, "No alert channel configured");
                Ok(())
            }
            AlertChannel::Telegram => {
                if !route.telegram.is_complete() {
                    return Err(NotifyError::MissingCredentials { channel: route.channel });
                }

                self.telegram.notify(&route.telegram.chat_id, payload, &route.telegram.token).await
            }
            AlertChannel::Email | AlertChannel::All => {
                warn!(
                    monitor = %monitor.name(),
                    channel = %route.channel,
                    %event,
                    "Alert channel is not implemented yet, alert was not delivered"
                );
                Ok(())
            }
        }
    }
}
