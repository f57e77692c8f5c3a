use kilo_core::notification::NotificationId;
use serde_json::json;

use crate::client::ReminderClient;
use crate::util::{EXIT_OK, print_error, print_json};

/// Marks one notification read without recording an outcome.
pub async fn run(client: &ReminderClient, id: NotificationId) -> i32 {
    match client.mark_read(id).await {
        Ok(()) => {
            tracing::info!(notification_id = id, "notification dismissed");
            print_json(&json!({"status": "ok", "id": id, "dismissed": true}));
            EXIT_OK
        }
        Err(e) => {
            tracing::warn!(notification_id = id, error = %e, "dismiss failed");
            print_error(e.code(), &e.to_string(), None);
            e.exit_code()
        }
    }
}
