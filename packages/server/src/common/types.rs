// Types shared across domains
//
// IssueCategory and IssueStatus live here rather than in the issues domain
// because routing, analytics and the error taxonomy key on them without
// depending on IssueStore.

use serde::{Deserialize, Serialize};

/// Closed set of issue categories a citizen can report under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "issue_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum IssueCategory {
    Potholes,
    Garbage,
    Streetlights,
    WaterLeaks,
    Traffic,
    Noise,
    Pollution,
    PublicSafety,
    Infrastructure,
    Other,
}

impl IssueCategory {
    /// Every category, in declaration order.
    pub const ALL: [IssueCategory; 10] = [
        IssueCategory::Potholes,
        IssueCategory::Garbage,
        IssueCategory::Streetlights,
        IssueCategory::WaterLeaks,
        IssueCategory::Traffic,
        IssueCategory::Noise,
        IssueCategory::Pollution,
        IssueCategory::PublicSafety,
        IssueCategory::Infrastructure,
        IssueCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Potholes => "potholes",
            IssueCategory::Garbage => "garbage",
            IssueCategory::Streetlights => "streetlights",
            IssueCategory::WaterLeaks => "water_leaks",
            IssueCategory::Traffic => "traffic",
            IssueCategory::Noise => "noise",
            IssueCategory::Pollution => "pollution",
            IssueCategory::PublicSafety => "public_safety",
            IssueCategory::Infrastructure => "infrastructure",
            IssueCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueCategory {
    type Err = crate::common::CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the hyphenated spellings older clients send ("water-leaks").
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        IssueCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                crate::common::CivicError::Validation(format!("unknown issue category: {}", s))
            })
    }
}

// Request bodies, query strings and the catalog file all parse through FromStr.
impl TryFrom<String> for IssueCategory {
    type Error = crate::common::CivicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Workflow position of an issue. Legal moves live in the issues state machine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "issue_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    Submitted,
    Acknowledged,
    Assigned,
    InProgress,
    Resolved,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Submitted => "submitted",
            IssueStatus::Acknowledged => "acknowledged",
            IssueStatus::Assigned => "assigned",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Closed => "closed",
        }
    }

    /// Resolved or closed: the issue has a `resolved_at`.
    pub fn is_resolved_lineage(&self) -> bool {
        matches!(self, IssueStatus::Resolved | IssueStatus::Closed)
    }

    /// Human label used in notification text.
    pub fn label(&self) -> &'static str {
        match self {
            IssueStatus::Submitted => "Submitted",
            IssueStatus::Acknowledged => "Acknowledged",
            IssueStatus::Assigned => "Assigned",
            IssueStatus::InProgress => "In Progress",
            IssueStatus::Resolved => "Resolved",
            IssueStatus::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueStatus {
    type Err = crate::common::CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(IssueStatus::Submitted),
            "acknowledged" => Ok(IssueStatus::Acknowledged),
            "assigned" => Ok(IssueStatus::Assigned),
            "in_progress" => Ok(IssueStatus::InProgress),
            "resolved" => Ok(IssueStatus::Resolved),
            "closed" => Ok(IssueStatus::Closed),
            _ => Err(crate::common::CivicError::Validation(format!("unknown issue status: {}", s))),
        }
    }
}

/// Where an issue was reported. Coordinates are optional; the address is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    #[sqlx(rename = "location_address")]
    pub address: String,
    #[sqlx(rename = "location_lat")]
    pub lat: Option<f64>,
    #[sqlx(rename = "location_lng")]
    pub lng: Option<f64>,
}

impl Location {
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            lat: None,
            lng: None,
        }
    }
}

/// Role supplied by the identity provider with every authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Citizen,
    #[serde(alias = "municipal_staff")]
    Staff,
    Admin,
}

impl Role {
    /// Staff and admins see internal comments and may drive the workflow.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}
