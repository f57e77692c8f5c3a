use crate::reconciler::{PollOutcome, Reconciler};
use crate::util::{EXIT_OK, print_error, print_json};

/// Polls once and prints the classified pending notifications.
pub async fn run(reconciler: &Reconciler) -> i32 {
    match reconciler.poll().await {
        PollOutcome::Merged { dropped, .. } => {
            if dropped > 0 {
                tracing::warn!(dropped, "some pending items were malformed and skipped");
            }
            print_json(&reconciler.snapshot());
            EXIT_OK
        }
        PollOutcome::Failed(e) => {
            print_error(
                e.code(),
                &e.to_string(),
                Some("Is the reminder service reachable? Check KILO_API_URL and KILO_ORIGIN."),
            );
            e.exit_code()
        }
        PollOutcome::Skipped | PollOutcome::Discarded => {
            print_error("poll_skipped", "poll did not run", None);
            2
        }
    }
}
