//! Closed domain enums stored as text columns.
//!
//! Parsing is lenient so legacy rows and loose client input converge on one
//! variant: input is trimmed, lower-cased, and spaces or hyphens become
//! underscores before matching. Values are always written back in canonical
//! form via `as_str`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Raised when a text value does not name any variant of a domain enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $canonical:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical stored representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $canonical),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let key = normalize(raw);
                $(
                    if key == normalize($canonical) $(|| key == $alias)* {
                        return Ok($name::$variant);
                    }
                )+
                Err(ParseEnumError {
                    kind: $kind,
                    value: raw.to_string(),
                })
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Work order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum WorkOrderStatus {
    New,
    InProgress,
    WaitingParts,
    OnHold,
    Completed,
    Cancelled,
}

text_enum!(WorkOrderStatus, "work order status", {
    New => "new",
    InProgress => "in_progress",
    WaitingParts => "waiting_parts",
    OnHold => "on_hold",
    Completed => "completed",
    Cancelled => "cancelled" | "canceled",
});

impl WorkOrderStatus {
    /// Completed and cancelled work orders no longer influence asset health.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn terminal_values() -> [&'static str; 2] {
        [Self::Completed.as_str(), Self::Cancelled.as_str()]
    }
}

/// Work order priority.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

text_enum!(Priority, "priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

/// Derived asset health.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String")]
pub enum AssetStatus {
    #[default]
    #[serde(rename = "Healthy")]
    Healthy,
    #[serde(rename = "Running with issues")]
    RunningWithIssues,
    #[serde(rename = "Breakdown")]
    Breakdown,
}

text_enum!(AssetStatus, "asset status", {
    Healthy => "Healthy",
    RunningWithIssues => "Running with issues",
    Breakdown => "Breakdown",
});

/// Tenant user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Role {
    Admin,
    Manager,
    Owner,
    Technician,
    Engineer,
    TeamLeader,
    Viewer,
}

text_enum!(Role, "role", {
    Admin => "admin",
    Manager => "manager",
    Owner => "owner",
    Technician => "technician",
    Engineer => "engineer",
    TeamLeader => "team_leader",
    Viewer => "viewer",
});

impl Role {
    pub fn can_delete_work_orders(&self) -> bool {
        matches!(self, Self::Admin | Self::Manager | Self::Owner)
    }
}
