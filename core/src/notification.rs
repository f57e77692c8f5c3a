use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identity key of a notification. Unique within the locally held sequence.
pub type NotificationId = i64;

/// Kind of pending item. Derived on the client, not authoritative: unless the
/// backend names one explicitly, it is inferred from the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Reminder,
    Habit,
    Medication,
    Info,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::Habit => "habit",
            Self::Medication => "medication",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reminder" => Ok(Self::Reminder),
            "habit" => Ok(Self::Habit),
            "medication" => Ok(Self::Medication),
            "info" => Ok(Self::Info),
            _ => Err(()),
        }
    }
}

/// A pending notification in canonical form.
///
/// Immutable once classified. Anything the user is typing or toggling while
/// resolving it belongs to the resolver's draft, never to this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub category: Category,
    /// Display text (defaults to a generic label when upstream sends none)
    pub text: String,
    /// When the item fired upstream, or when it was classified if upstream is silent
    pub occurred_at: String,
    /// Optional heading supplied by the reminder service (e.g. "Reminder")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Upstream priority hint, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}
