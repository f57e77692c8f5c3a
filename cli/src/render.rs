use kilo_core::notification::{Category, Notification};
use kilo_core::resolution::SnoozeDuration;

use crate::resolver::{Draft, Menu, Phase};

fn badge(category: Category) -> &'static str {
    match category {
        Category::Medication => "[MED]",
        Category::Habit => "[HABIT]",
        Category::Reminder => "[REMIND]",
        Category::Info => "[INFO]",
    }
}

/// Renders one notification as a card: a summary line plus an action line.
pub fn render_card(notification: &Notification, phase: Phase, draft: &Draft) -> String {
    let heading = match notification.title.as_deref() {
        Some(title) if title != notification.text => format!("{title}: {}", notification.text),
        _ => notification.text.clone(),
    };
    let mut out = format!(
        "{:<8} #{} {}  ({})\n",
        badge(notification.category),
        notification.id,
        heading,
        notification.occurred_at
    );
    if !draft.notes.trim().is_empty() {
        out.push_str(&format!("         notes: {}\n", draft.notes.trim()));
    }
    out.push_str("         ");
    out.push_str(&render_actions(phase, draft.menu));
    out
}

/// Action hint for the current phase and menu.
pub fn render_actions(phase: Phase, menu: Menu) -> String {
    match phase {
        Phase::Processing => "(working...)".to_string(),
        Phase::Resolved => "(done)".to_string(),
        Phase::Idle | Phase::Failed => {
            let prefix = if phase == Phase::Failed {
                "last attempt failed, retry: "
            } else {
                ""
            };
            let actions = match menu {
                Menu::Choosing => "complete | skip | snooze | dismiss".to_string(),
                Menu::ChoosingSnoozeDuration => {
                    let mut parts: Vec<String> = SnoozeDuration::ALL
                        .iter()
                        .map(|d| format!("{}m", d.minutes()))
                        .collect();
                    parts.push("back".to_string());
                    parts.join(" | ")
                }
            };
            format!("{prefix}{actions}")
        }
    }
}
