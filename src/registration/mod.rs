use crate::communication::notifier::{NotificationError, Notifier};
use crate::configuration::TimeoutConfig;
use crate::database::{DatabaseError, User, UserStore};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{error, info, warn};

mod messages;
mod payload;
#[cfg(test)]
pub(crate) mod testing;

pub use payload::RegistrationPayload;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] DatabaseError),
}

impl RegistrationError {
    /// Stable identifier of the failed stage, reported to HTTP callers.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistrationError::MalformedInput(_) => "malformed_input",
            RegistrationError::StorageFailure(_) => "storage_failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationReceipt {
    pub user: User,
    pub admin_notified: bool,
    pub user_notified: bool,
}

/// Validate, persist, then notify the admin and the user.
pub struct RegistrationWorkflow {
    store: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    admin_id: i64,
    storage_timeout: Duration,
    notification_timeout: Duration,
}

impl RegistrationWorkflow {
    pub fn new(
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        admin_id: i64,
        timeouts: &TimeoutConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            admin_id,
            storage_timeout: timeouts.storage(),
            notification_timeout: timeouts.notification(),
        }
    }

    pub fn with_timeouts(mut self, storage: Duration, notification: Duration) -> Self {
        self.storage_timeout = storage;
        self.notification_timeout = notification;
        self
    }

    pub async fn submit(
        &self,
        payload: RegistrationPayload,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        let user = User::try_from(payload).inspect_err(|e| {
            warn!(error = %e, "Rejected registration");
        })?;

        let stored = match timeout(self.storage_timeout, self.store.upsert_user(&user)).await {
            Ok(result) => result,
            Err(_) => Err(DatabaseError::Timeout(self.storage_timeout)),
        };
        if let Err(e) = stored {
            error!(tg_id = user.tg_id, error = %e, "Failed to save registration");
            return Err(RegistrationError::StorageFailure(e));
        }
        info!(tg_id = user.tg_id, "Registration saved");

        let admin_text = messages::admin_notification(&user, Utc::now());
        let admin_notified = self.deliver(self.admin_id, &admin_text).await;
        let user_notified = self.deliver(user.tg_id, messages::USER_CONFIRMATION).await;

        Ok(RegistrationReceipt {
            user,
            admin_notified,
            user_notified,
        })
    }

    // Failures are logged and swallowed: the registration is already committed.
    async fn deliver(&self, recipient: i64, text: &str) -> bool {
        let result = match timeout(self.notification_timeout, self.notifier.notify(recipient, text))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(NotificationError::Timeout(self.notification_timeout)),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                error!(recipient, error = %e, "Failed to send notification");
                false
            }
        }
    }
}
