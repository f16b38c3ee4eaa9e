//! Category → department routing.
//!
//! Pure lookup over the static catalog: no IO, no hidden state, so the same
//! `(category, location)` always lands on the same department.

use tracing::debug;

use super::models::{Department, DepartmentCatalog};
use crate::common::{IssueCategory, Location};

/// Pick the department responsible for an issue.
///
/// First department (in catalog order) whose served set contains `category`,
/// otherwise the catalog's fallback. The location is accepted for zone-based
/// routing but does not change the result under the current policy.
pub fn route<'a>(
    catalog: &'a DepartmentCatalog,
    category: IssueCategory,
    _location: Option<&Location>,
) -> &'a Department {
    match catalog.departments().iter().find(|d| d.serves(category)) {
        Some(department) => department,
        None => {
            let fallback = catalog.fallback();
            debug!(
                category = %category,
                fallback = %fallback.id,
                "No department serves category, using fallback"
            );
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::departments::models::Department;

    fn narrow_catalog() -> DepartmentCatalog {
        let roads = Department {
            id: "roads".into(),
            name: "Roads".into(),
            categories: [IssueCategory::Potholes].into_iter().collect(),
            response_time_hours: 24,
            contact_email: None,
            contact_phone: None,
        };
        let city = Department {
            id: "city".into(),
            name: "City Hall".into(),
            categories: [IssueCategory::Other].into_iter().collect(),
            response_time_hours: 72,
            contact_email: None,
            contact_phone: None,
        };
        DepartmentCatalog::new(vec![roads, city], "city").unwrap()
    }

    #[test]
    fn every_category_routes_to_a_department_that_serves_it() {
        let catalog = DepartmentCatalog::builtin();
        for category in IssueCategory::ALL {
            let department = route(&catalog, category, None);
            assert!(
                department.serves(category),
                "{} routed to {} which does not serve it",
                category,
                department.id
            );
        }
    }

    #[test]
    fn potholes_go_to_road_maintenance() {
        let catalog = DepartmentCatalog::builtin();
        let department = route(&catalog, IssueCategory::Potholes, None);
        assert_eq!(department.name, "Road Maintenance");
    }

    #[test]
    fn shared_category_goes_to_first_department_in_catalog_order() {
        let catalog = DepartmentCatalog::builtin();
        assert_eq!(route(&catalog, IssueCategory::Pollution, None).id, "sanitation");
    }

    #[test]
    fn unserved_category_goes_to_fallback() {
        let catalog = narrow_catalog();
        assert_eq!(route(&catalog, IssueCategory::Noise, None).id, "city");
        assert_eq!(route(&catalog, IssueCategory::Traffic, None).id, "city");
    }

    #[test]
    fn location_does_not_change_the_result() {
        let catalog = DepartmentCatalog::builtin();
        let downtown = Location {
            address: "1 Main St".into(),
            lat: Some(44.97),
            lng: Some(-93.26),
        };
        for category in IssueCategory::ALL {
            assert_eq!(
                route(&catalog, category, None).id,
                route(&catalog, category, Some(&downtown)).id
            );
        }
    }

    #[test]
    fn routing_is_deterministic() {
        let catalog = DepartmentCatalog::builtin();
        let first = route(&catalog, IssueCategory::Streetlights, None).id.clone();
        for _ in 0..10 {
            assert_eq!(route(&catalog, IssueCategory::Streetlights, None).id, first);
        }
    }
}
