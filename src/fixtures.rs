// src/fixtures.rs - Sample records served in mock mode and after failed loads
use crate::models::{
    Accident, AccidentStatus, CatalogReagent, DisposalView, ExperimentReagentView, ExperimentStatus,
    ExperimentView, Quantity, ReagentItem, ReagentStatus, ReagentView, Severity, StorageStatus,
    StorageView, User, UserRole,
};

struct SampleReagent {
    id: &'static str,
    name: &'static str,
    formula: &'static str,
    purchase_date: &'static str,
    open_date: Option<&'static str>,
    current: (f64, &'static str),
    original: (f64, &'static str),
    density: f64,
    mass: f64,
    purity: f64,
    location: &'static str,
    status: ReagentStatus,
}

const SAMPLE_REAGENTS: [SampleReagent; 8] = [
    SampleReagent {
        id: "H2SO4-001", name: "Sulfuric acid #1", formula: "H₂SO₄",
        purchase_date: "2025-12-15", open_date: Some("2026-01-10"),
        current: (450.0, "ml"), original: (500.0, "ml"),
        density: 1.84, mass: 828.0, purity: 98.0, location: "Cabinet A-01", status: ReagentStatus::Normal,
    },
    SampleReagent {
        id: "NaOH-001", name: "Sodium hydroxide #1", formula: "NaOH",
        purchase_date: "2025-11-20", open_date: Some("2025-12-05"),
        current: (80.0, "ml"), original: (500.0, "ml"),
        density: 2.13, mass: 170.0, purity: 99.0, location: "Cabinet A-02", status: ReagentStatus::Low,
    },
    SampleReagent {
        id: "HCl-001", name: "Hydrochloric acid #1", formula: "HCl",
        purchase_date: "2025-10-01", open_date: Some("2025-10-15"),
        current: (200.0, "ml"), original: (500.0, "ml"),
        density: 1.19, mass: 238.0, purity: 37.0, location: "Cabinet B-01", status: ReagentStatus::Expired,
    },
    SampleReagent {
        id: "CH3COOH-001", name: "Acetic acid #1", formula: "CH₃COOH",
        purchase_date: "2026-01-05", open_date: None,
        current: (500.0, "ml"), original: (500.0, "ml"),
        density: 1.05, mass: 525.0, purity: 99.5, location: "Cabinet A-03", status: ReagentStatus::Normal,
    },
    SampleReagent {
        id: "H2SO4-002", name: "Sulfuric acid #2", formula: "H₂SO₄",
        purchase_date: "2026-01-20", open_date: None,
        current: (500.0, "ml"), original: (500.0, "ml"),
        density: 1.84, mass: 920.0, purity: 98.0, location: "Cabinet A-01", status: ReagentStatus::Normal,
    },
    SampleReagent {
        id: "Zn-001", name: "Zinc powder", formula: "Zn",
        purchase_date: "2025-12-01", open_date: Some("2025-12-10"),
        current: (100.0, "g"), original: (250.0, "g"),
        density: 7.14, mass: 100.0, purity: 99.9, location: "Cabinet C-01", status: ReagentStatus::Normal,
    },
    SampleReagent {
        id: "NaCl-001", name: "Sodium chloride", formula: "NaCl",
        purchase_date: "2025-11-15", open_date: Some("2025-11-20"),
        current: (450.0, "g"), original: (500.0, "g"),
        density: 2.16, mass: 450.0, purity: 99.5, location: "Cabinet A-04", status: ReagentStatus::Normal,
    },
    SampleReagent {
        id: "HNO3-002", name: "Nitric acid #2", formula: "HNO₃",
        purchase_date: "2026-01-10", open_date: None,
        current: (500.0, "ml"), original: (500.0, "ml"),
        density: 1.51, mass: 755.0, purity: 70.0, location: "Cabinet B-02", status: ReagentStatus::Normal,
    },
];

fn sample_items() -> Vec<ReagentItem> {
    SAMPLE_REAGENTS
        .iter()
        .map(|r| ReagentItem {
            id: r.id.to_string(),
            name: r.name.to_string(),
            formula: Some(r.formula.to_string()),
            purchase_date: Some(r.purchase_date.to_string()),
            open_date: r.open_date.map(str::to_string),
            current_volume: Some(Quantity::new(r.current.0, r.current.1)),
            original_volume: Some(Quantity::new(r.original.0, r.original.1)),
            density: Some(r.density),
            mass: Some(r.mass),
            purity: Some(r.purity),
            location: Some(r.location.to_string()),
            status: Some(r.status),
            name_i18n: None,
            location_i18n: None,
        })
        .collect()
}

pub fn sample_reagents() -> Vec<ReagentView> {
    sample_items().iter().map(ReagentView::from).collect()
}

pub fn sample_catalog() -> Vec<CatalogReagent> {
    sample_items().iter().map(CatalogReagent::from).collect()
}

pub fn sample_disposals() -> Vec<DisposalView> {
    vec![
        DisposalView {
            id: "HNO3-001".to_string(),
            name: "Nitric acid #1".to_string(),
            formula: "HNO₃".to_string(),
            disposal_date: "2026-01-15".to_string(),
            disposed_by: "Lab manager".to_string(),
            reason: "Expired".to_string(),
            pending: false,
        },
        DisposalView {
            id: "KMnO4-001".to_string(),
            name: "Potassium permanganate".to_string(),
            formula: "KMnO₄".to_string(),
            disposal_date: "2026-01-08".to_string(),
            disposed_by: "Lab manager".to_string(),
            reason: "Used up".to_string(),
            pending: false,
        },
    ]
}

pub fn sample_storage() -> Vec<StorageView> {
    [
        ("Cabinet A", 22.0, 45.0, StorageStatus::Normal),
        ("Cabinet B", 23.0, 48.0, StorageStatus::Normal),
        ("Cabinet C", 26.0, 62.0, StorageStatus::Warning),
    ]
    .iter()
    .map(|(location, temp, humidity, status)| StorageView {
        location: location.to_string(),
        temp: format!("{}°C", temp),
        humidity: format!("{}%", humidity),
        status: *status,
    })
    .collect()
}

fn sample_usage(id: &str, catalog_id: &str, dosage: &str) -> ExperimentReagentView {
    let catalog = sample_catalog();
    let entry = catalog.iter().find(|c| c.id == catalog_id);
    ExperimentReagentView {
        id: id.to_string(),
        catalog_id: catalog_id.to_string(),
        name: entry.map(|c| c.name.clone()).unwrap_or_default(),
        formula: entry.map(|c| c.formula.clone()).unwrap_or_default(),
        dosage: dosage.to_string(),
        volume: entry.map(|c| c.current_volume.clone()).unwrap_or_default(),
        density: entry.map(|c| c.density.clone()).unwrap_or_default(),
        mass: entry.map(|c| c.mass.clone()).unwrap_or_default(),
        purity: entry.map(|c| c.purity.clone()).unwrap_or_default(),
        location: entry.map(|c| c.location.clone()).unwrap_or_default(),
    }
}

pub fn sample_experiments() -> Vec<ExperimentView> {
    vec![
        ExperimentView {
            id: "EXP-2026-001".to_string(),
            title: "Redox reaction".to_string(),
            date: "2026-01-28".to_string(),
            status: ExperimentStatus::InProgress,
            researcher: "Dr. Kim".to_string(),
            reagents: vec![
                sample_usage("R1", "H2SO4-001", "50"),
                sample_usage("R2", "NaOH-001", "25"),
            ],
            memo: "Hold reaction temperature at 25°C. Confirm exhaust system is running.".to_string(),
        },
        ExperimentView {
            id: "EXP-2026-002".to_string(),
            title: "Catalytic oxidation test".to_string(),
            date: "2026-01-27".to_string(),
            status: ExperimentStatus::Completed,
            researcher: "Dr. Lee".to_string(),
            reagents: vec![sample_usage("R3", "HNO3-002", "30")],
            memo: String::new(),
        },
        ExperimentView {
            id: "EXP-2026-003".to_string(),
            title: "Acid-base titration".to_string(),
            date: "2026-01-26".to_string(),
            status: ExperimentStatus::Pending,
            researcher: "Dr. Park".to_string(),
            reagents: Vec::new(),
            memo: String::new(),
        },
    ]
}

pub fn sample_accidents() -> Vec<Accident> {
    let accident = |id: i64, title: &str, description: &str, location: &str, severity, status, at: &str, by: &str| Accident {
        id,
        title: title.to_string(),
        description: Some(description.to_string()),
        location: Some(location.to_string()),
        severity,
        status,
        reported_at: at.to_string(),
        reported_by: by.to_string(),
    };
    vec![
        accident(
            1, "Chemical spill - Zone B",
            "Small sulfuric acid spill detected at storage cabinet B-12. Containment protocol active.",
            "Storage room 1, cabinet B-12", Severity::High, AccidentStatus::Active,
            "2026-01-28 14:28:00", "Automatic sensor",
        ),
        accident(
            2, "Temperature anomaly",
            "Cold storage temperature exceeded its threshold. Current 8°C, threshold 4°C.",
            "Cold storage C-05", Severity::Medium, AccidentStatus::Acknowledged,
            "2026-01-28 14:15:00", "Dr. Lee",
        ),
        accident(
            3, "Ventilation alarm",
            "Reduced airflow detected in lab section A. Maintenance notified.",
            "Lab section A", Severity::Low, AccidentStatus::Resolved,
            "2026-01-28 13:45:00", "Technician Park",
        ),
        accident(
            4, "Access violation",
            "Unauthorized access attempt to restricted chemical storage was blocked.",
            "Restricted zone R-01", Severity::Critical, AccidentStatus::Acknowledged,
            "2026-01-28 13:30:00", "Security system",
        ),
    ]
}

/// User list shown when the backend is unreachable.
pub fn sample_users() -> Vec<User> {
    vec![sample_admin()]
}

/// Signed-in user in mock mode.
pub fn sample_admin() -> User {
    User {
        id: 1,
        email: "admin@lab.local".to_string(),
        name: Some("Lab Admin".to_string()),
        affiliation: Some("Chemistry Lab".to_string()),
        department: None,
        position: None,
        phone: None,
        contact_email: None,
        profile_image_url: Some("/avatars/avatar-1.png".to_string()),
        role: UserRole::Admin,
        is_active: true,
        created_at: Some("2026-01-01T00:00:00".to_string()),
        last_login_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_ids_unique() {
        let reagents = sample_reagents();
        let ids: HashSet<_> = reagents.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), reagents.len());

        let accidents = sample_accidents();
        let ids: HashSet<_> = accidents.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), accidents.len());
    }

    #[test]
    fn test_sample_usage_resolves_catalog() {
        let experiments = sample_experiments();
        let first = &experiments[0].reagents[0];
        assert_eq!(first.name, "Sulfuric acid #1");
        assert_eq!(first.volume, "450ml");
        assert_eq!(first.density, "1.84 g/cm³");
    }

    #[test]
    fn test_sample_reagent_formatting() {
        let reagents = sample_reagents();
        assert_eq!(reagents[0].current_volume, "450ml");
        assert_eq!(reagents[0].purity, "98%");
        assert_eq!(reagents[1].status, ReagentStatus::Low);
    }
}
