use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResolutionError;

/// Outcome kind the user picks for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionKind {
    Completed,
    Skipped,
    Snoozed,
}

impl ResolutionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Snoozed => "snoozed",
        }
    }
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionKind {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" | "complete" | "done" => Ok(Self::Completed),
            "skipped" | "skip" => Ok(Self::Skipped),
            "snoozed" | "snooze" => Ok(Self::Snoozed),
            other => Err(ResolutionError::UnknownAction(other.to_string())),
        }
    }
}

/// One of the snooze durations the backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnoozeDuration {
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
}

impl SnoozeDuration {
    pub const ALL: [SnoozeDuration; 4] = [
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::SixtyMinutes,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::SixtyMinutes => 60,
        }
    }
}

impl TryFrom<u32> for SnoozeDuration {
    type Error = ResolutionError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        match minutes {
            5 => Ok(Self::FiveMinutes),
            15 => Ok(Self::FifteenMinutes),
            30 => Ok(Self::ThirtyMinutes),
            60 => Ok(Self::SixtyMinutes),
            other => Err(ResolutionError::UnsupportedSnoozeDuration(other)),
        }
    }
}

/// A validated resolution. A snooze always carries its duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Completed,
    Skipped,
    Snoozed(SnoozeDuration),
}

impl Resolution {
    /// Builds a resolution from a loosely-typed request.
    ///
    /// Rejects a snooze without a duration, a duration outside 5/15/30/60,
    /// and a duration attached to a non-snooze kind.
    pub fn from_parts(
        kind: ResolutionKind,
        snooze_minutes: Option<u32>,
    ) -> Result<Self, ResolutionError> {
        match (kind, snooze_minutes) {
            (ResolutionKind::Snoozed, Some(minutes)) => {
                Ok(Self::Snoozed(SnoozeDuration::try_from(minutes)?))
            }
            (ResolutionKind::Snoozed, None) => Err(ResolutionError::MissingSnoozeDuration),
            (_, Some(minutes)) => Err(ResolutionError::UnexpectedSnoozeDuration(minutes)),
            (ResolutionKind::Completed, None) => Ok(Self::Completed),
            (ResolutionKind::Skipped, None) => Ok(Self::Skipped),
        }
    }

    pub fn kind(self) -> ResolutionKind {
        match self {
            Self::Completed => ResolutionKind::Completed,
            Self::Skipped => ResolutionKind::Skipped,
            Self::Snoozed(_) => ResolutionKind::Snoozed,
        }
    }

    pub fn snooze_minutes(self) -> Option<u32> {
        match self {
            Self::Snoozed(duration) => Some(duration.minutes()),
            _ => None,
        }
    }
}

/// Body of `POST /api/reminder/notifications/{id}/confirm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmRequest {
    pub action: ResolutionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snooze_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ConfirmRequest {
    pub fn new(resolution: Resolution, notes: Option<&str>) -> Self {
        Self {
            action: resolution.kind(),
            snooze_minutes: resolution.snooze_minutes(),
            notes: normalize_notes(notes),
        }
    }
}

/// Whitespace-only notes count as no notes at all.
pub fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snooze_without_duration_is_rejected() {
        assert_eq!(
            Resolution::from_parts(ResolutionKind::Snoozed, None),
            Err(ResolutionError::MissingSnoozeDuration)
        );
    }

    #[test]
    fn snooze_duration_must_be_allowed_value() {
        assert_eq!(
            Resolution::from_parts(ResolutionKind::Snoozed, Some(10)),
            Err(ResolutionError::UnsupportedSnoozeDuration(10))
        );
        for minutes in [5, 15, 30, 60] {
            let resolution = Resolution::from_parts(ResolutionKind::Snoozed, Some(minutes))
                .expect("allowed duration");
            assert_eq!(resolution.snooze_minutes(), Some(minutes));
        }
    }

    #[test]
    fn duration_on_non_snooze_is_rejected() {
        assert_eq!(
            Resolution::from_parts(ResolutionKind::Completed, Some(5)),
            Err(ResolutionError::UnexpectedSnoozeDuration(5))
        );
    }

    #[test]
    fn confirm_body_omits_absent_fields() {
        let body = ConfirmRequest::new(Resolution::Skipped, Some("   "));
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"action": "skipped"}));
    }

    #[test]
    fn confirm_body_carries_snooze_and_trimmed_notes() {
        let body = ConfirmRequest::new(
            Resolution::Snoozed(SnoozeDuration::FifteenMinutes),
            Some("  after lunch "),
        );
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"action": "snoozed", "snooze_minutes": 15, "notes": "after lunch"})
        );
    }

    #[test]
    fn action_aliases_parse() {
        assert_eq!("complete".parse::<ResolutionKind>(), Ok(ResolutionKind::Completed));
        assert_eq!("SKIP".parse::<ResolutionKind>(), Ok(ResolutionKind::Skipped));
        assert_eq!("snoozed".parse::<ResolutionKind>(), Ok(ResolutionKind::Snoozed));
        assert!("later".parse::<ResolutionKind>().is_err());
    }
}
