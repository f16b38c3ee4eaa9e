use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::common::{CivicError, CivicResult, IssueCategory, Location, UserId};
use crate::domains::issues::models::IssuePriority;

/// Citizen submission, before routing and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
#[serde(rename_all = "camelCase")]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    #[builder(default)]
    #[serde(default)]
    pub priority: IssuePriority,
    pub location: Location,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub reported_by: Option<UserId>,
    #[builder(default)]
    #[serde(default)]
    pub is_anonymous: bool,
}

impl IssueDraft {
    /// Required text must be present; coordinates, when given, must be real.
    pub fn validate(&self) -> CivicResult<()> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        require_text("location address", &self.location.address)?;

        if let Some(lat) = self.location.lat {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(CivicError::Validation(format!(
                    "latitude out of range: {}",
                    lat
                )));
            }
        }
        if let Some(lng) = self.location.lng {
            if !(-180.0..=180.0).contains(&lng) {
                return Err(CivicError::Validation(format!(
                    "longitude out of range: {}",
                    lng
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> CivicResult<()> {
    if value.trim().is_empty() {
        return Err(CivicError::Validation(format!("{} is required", field)));
    }
    Ok(())
}
