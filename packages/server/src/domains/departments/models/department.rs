use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::common::{CivicError, CivicResult, IssueCategory};

/// Organizational unit responsible for one or more issue categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub name: String,
    /// Served categories. Membership decides routing.
    pub categories: BTreeSet<IssueCategory>,
    pub response_time_hours: i32,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl Department {
    pub fn serves(&self, category: IssueCategory) -> bool {
        self.categories.contains(&category)
    }
}

/// Static department configuration, loaded once at startup.
///
/// Scan order is significant: routing picks the first department serving a
/// category, so a category served twice (pollution) goes to the earlier one.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentCatalog {
    departments: Vec<Department>,
    fallback_id: String,
}

/// On-disk shape of a catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    fallback: String,
    departments: Vec<Department>,
}

impl DepartmentCatalog {
    /// Build a catalog, checking ids are unique, every department serves at
    /// least one category, and the fallback exists.
    pub fn new(departments: Vec<Department>, fallback_id: impl Into<String>) -> CivicResult<Self> {
        let fallback_id = fallback_id.into();

        let mut seen = HashSet::new();
        for dept in &departments {
            if dept.id.trim().is_empty() {
                return Err(CivicError::Validation("department id is empty".into()));
            }
            if !seen.insert(dept.id.as_str()) {
                return Err(CivicError::Validation(format!(
                    "duplicate department id: {}",
                    dept.id
                )));
            }
            if dept.categories.is_empty() {
                return Err(CivicError::Validation(format!(
                    "department {} serves no categories",
                    dept.id
                )));
            }
        }

        if !seen.contains(fallback_id.as_str()) {
            return Err(CivicError::Validation(format!(
                "fallback department {} is not in the catalog",
                fallback_id
            )));
        }

        Ok(Self {
            departments,
            fallback_id,
        })
    }

    /// Load a catalog from a JSON file (`{"fallback": "...", "departments": [...]}`).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read department catalog {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Invalid department catalog {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw).context("Malformed catalog JSON")?;
        Self::new(file.departments, file.fallback).map_err(anyhow::Error::from)
    }

    /// The city's default catalog.
    pub fn builtin() -> Self {
        use IssueCategory::*;

        let dept = |id: &str,
                    name: &str,
                    categories: &[IssueCategory],
                    hours: i32,
                    email: &str,
                    phone: &str| Department {
            id: id.to_string(),
            name: name.to_string(),
            categories: categories.iter().copied().collect(),
            response_time_hours: hours,
            contact_email: Some(email.to_string()),
            contact_phone: Some(phone.to_string()),
        };

        let departments = vec![
            dept(
                "road-maintenance",
                "Road Maintenance",
                &[Potholes, Infrastructure],
                24,
                "roads@city.gov",
                "+1-555-ROAD-001",
            ),
            dept(
                "sanitation",
                "Sanitation Department",
                &[Garbage, Pollution],
                12,
                "sanitation@city.gov",
                "+1-555-SANI-001",
            ),
            dept(
                "electrical",
                "Electrical Department",
                &[Streetlights],
                6,
                "electrical@city.gov",
                "+1-555-ELEC-001",
            ),
            dept(
                "water",
                "Water Department",
                &[WaterLeaks],
                4,
                "water@city.gov",
                "+1-555-WATER-001",
            ),
            dept(
                "traffic",
                "Traffic Management",
                &[Traffic],
                8,
                "traffic@city.gov",
                "+1-555-TRAF-001",
            ),
            dept(
                "environmental",
                "Environmental Department",
                &[Noise, Pollution],
                48,
                "environment@city.gov",
                "+1-555-ENV-001",
            ),
            dept(
                "public-safety",
                "Public Safety",
                &[PublicSafety],
                2,
                "safety@city.gov",
                "+1-555-SAFE-001",
            ),
            dept(
                "general",
                "General Services",
                &[Other],
                72,
                "general@city.gov",
                "+1-555-GEN-001",
            ),
        ];

        Self {
            departments,
            fallback_id: "general".to_string(),
        }
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    pub fn fallback(&self) -> &Department {
        // new() and builtin() guarantee the fallback is present.
        self.get(&self.fallback_id)
            .unwrap_or(&self.departments[self.departments.len() - 1])
    }

    pub fn get(&self, id: &str) -> Option<&Department> {
        self.departments.iter().find(|d| d.id == id)
    }

    /// Look up a department id, failing with `NotFound` when it is unknown.
    pub fn require(&self, id: &str) -> CivicResult<&Department> {
        self.get(id).ok_or_else(|| CivicError::not_found("department", id))
    }

    /// Categories no department serves directly (they route to the fallback).
    pub fn unserved_categories(&self) -> Vec<IssueCategory> {
        IssueCategory::ALL
            .into_iter()
            .filter(|c| !self.departments.iter().any(|d| d.serves(*c)))
            .collect()
    }
}
