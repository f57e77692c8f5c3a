use kilo_core::notification::NotificationId;
use kilo_core::resolution::{ConfirmRequest, Resolution, ResolutionKind};
use serde_json::json;

use crate::client::ReminderClient;
use crate::error::ResolveError;
use crate::util::{EXIT_OK, EXIT_USAGE, print_error, print_json};

const RESOLUTION_HINT: &str =
    "Use --action completed|skipped|snoozed; snoozed needs --snooze-minutes 5|15|30|60";

/// Turns the `--action`/`--snooze-minutes` pair into a valid resolution.
pub fn parse_resolution(action: &str, snooze_minutes: Option<u32>) -> Result<Resolution, ResolveError> {
    let kind = action.parse::<ResolutionKind>()?;
    Ok(Resolution::from_parts(kind, snooze_minutes)?)
}

/// Records a resolution for one notification.
///
/// The resolution is validated before any request is made.
pub async fn run(
    client: &ReminderClient,
    id: NotificationId,
    action: &str,
    snooze_minutes: Option<u32>,
    notes: Option<&str>,
) -> i32 {
    let resolution = match parse_resolution(action, snooze_minutes) {
        Ok(r) => r,
        Err(e) => {
            print_error(e.code(), &e.to_string(), Some(RESOLUTION_HINT));
            return EXIT_USAGE;
        }
    };

    let request = ConfirmRequest::new(resolution, notes);
    match client.confirm(id, &request).await {
        Ok(()) => {
            tracing::info!(notification_id = id, action = %request.action, "notification resolved");
            print_json(&json!({"status": "ok", "id": id, "request": request}));
            EXIT_OK
        }
        Err(e) => {
            tracing::warn!(notification_id = id, error = %e, "resolution failed");
            print_error(e.code(), &e.to_string(), None);
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kilo_core::error::{ResolutionError, codes};
    use kilo_core::resolution::SnoozeDuration;

    #[test]
    fn accepts_valid_pairs() {
        assert_eq!(parse_resolution("done", None).unwrap(), Resolution::Completed);
        assert_eq!(
            parse_resolution("snoozed", Some(30)).unwrap(),
            Resolution::Snoozed(SnoozeDuration::try_from(30).unwrap())
        );
    }

    #[test]
    fn invalid_pairs_report_invalid_resolution() {
        let err = parse_resolution("snoozed", None).unwrap_err();
        assert_eq!(
            err,
            ResolveError::InvalidResolution(ResolutionError::MissingSnoozeDuration)
        );
        assert_eq!(err.code(), codes::INVALID_RESOLUTION);

        let err = parse_resolution("later", None).unwrap_err();
        assert_eq!(err.code(), codes::INVALID_RESOLUTION);
    }
}
