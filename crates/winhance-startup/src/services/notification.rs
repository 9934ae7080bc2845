use std::sync::Arc;

use async_trait::async_trait;
use winhance_bridge::{
    notification::{NotificationMessage, NotificationType},
    results::{BackupResult, MigrationResult},
};

use super::{LocalizationService, StartupNotificationService};

/// Destination for notifications built from startup results.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: NotificationMessage);
}

/// Sink that writes notifications to the `log` facade.
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, notification: NotificationMessage) {
        match notification.notification_type {
            NotificationType::Error => log::error!("{}: {}", notification.title, notification.message),
            NotificationType::Warning => log::warn!("{}: {}", notification.title, notification.message),
            NotificationType::Info | NotificationType::Success => {
                log::info!("{}: {}", notification.title, notification.message)
            }
        }
    }
}

/// Turns backup and migration results into user notifications.
pub struct ResultNotificationService {
    localization: Arc<dyn LocalizationService>,
    sink: Arc<dyn NotificationSink>,
}

impl ResultNotificationService {
    pub fn new(localization: Arc<dyn LocalizationService>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { localization, sink }
    }
}

pub(crate) fn backup_notification(result: &BackupResult, title: String) -> NotificationMessage {
    if result.success {
        let location = result
            .backup_path
            .as_ref()
            .map(|path| format!(" in {}", path.display()))
            .unwrap_or_default();
        NotificationMessage {
            notification_type: NotificationType::Success,
            title,
            message: format!("Initial backup created{location}."),
        }
    } else {
        NotificationMessage {
            notification_type: NotificationType::Warning,
            title,
            message: format!(
                "Initial backup could not be created: {}",
                result.error_message.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

pub(crate) fn migration_notification(
    result: &MigrationResult,
    title: String,
) -> Option<NotificationMessage> {
    if !result.needed {
        return None;
    }
    let notification = if result.success {
        NotificationMessage {
            notification_type: NotificationType::Info,
            title,
            message: format!(
                "Moved {} script(s) from a previous location.",
                result.migrated.len()
            ),
        }
    } else {
        NotificationMessage {
            notification_type: NotificationType::Error,
            title,
            message: format!(
                "Some scripts could not be moved: {}",
                result.error_message.as_deref().unwrap_or("unknown error")
            ),
        }
    };
    Some(notification)
}

#[async_trait]
impl StartupNotificationService for ResultNotificationService {
    async fn show_backup_notification(&self, result: Option<&BackupResult>) {
        let Some(result) = result else {
            return;
        };
        let title = self.localization.get_string("Notification_Backup_Title");
        self.sink.notify(backup_notification(result, title));
    }

    fn show_migration_notification(&self, result: Option<&MigrationResult>) {
        let Some(result) = result else {
            return;
        };
        let title = self.localization.get_string("Notification_Migration_Title");
        if let Some(notification) = migration_notification(result, title) {
            self.sink.notify(notification);
        }
    }
}
