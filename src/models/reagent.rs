// src/models/reagent.rs
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

use super::Quantity;
use crate::format::{format_date, format_density, format_mass, format_number, format_percent, format_quantity, pick_i18n};

pub const UNASSIGNED_LOCATION: &str = "Unassigned";

// ==================== REAGENT ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReagentStatus {
    #[default]
    Normal,
    Low,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageStatus {
    #[default]
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReagentItem {
    pub id: String,
    #[serde(alias = "reagent_name", default)]
    pub name: String,
    pub formula: Option<String>,
    pub purchase_date: Option<String>,
    pub open_date: Option<String>,
    pub current_volume: Option<Quantity>,
    pub original_volume: Option<Quantity>,
    pub density: Option<f64>,
    pub mass: Option<f64>,
    pub purity: Option<f64>,
    pub location: Option<String>,
    pub status: Option<ReagentStatus>,
    #[serde(default)]
    pub name_i18n: Option<String>,
    #[serde(default)]
    pub location_i18n: Option<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReagentCreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 255, code = "required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, code = "required"))]
    pub formula: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_volume: Option<Quantity>,
    pub original_volume: Quantity,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, code = "out_of_range"))]
    pub density: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, code = "out_of_range"))]
    pub mass: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, code = "out_of_range"))]
    pub purity: f64,
    #[validate(length(min = 1, max = 255, code = "required"))]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReagentStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReagentUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, code = "required"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_volume: Option<Quantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_volume: Option<Quantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 100.0, code = "out_of_range"))]
    pub purity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReagentStatus>,
}

// ==================== DISPOSAL / STORAGE ====================

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReagentDisposalCreateRequest {
    #[validate(length(min = 1, max = 255, code = "required"))]
    pub reason: String,
    #[validate(length(min = 1, max = 100, code = "required"))]
    pub disposed_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReagentDisposal {
    pub id: String,
    #[serde(alias = "reagent_name", default)]
    pub name: String,
    pub formula: Option<String>,
    #[serde(default)]
    pub disposal_date: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub disposed_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEnvironmentItem {
    pub location: String,
    pub temp: f64,
    pub humidity: f64,
    #[serde(default)]
    pub status: StorageStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEnvironmentResponse {
    #[serde(default)]
    pub items: Vec<StorageEnvironmentItem>,
}

// ==================== VIEW MODELS ====================

#[derive(Debug, Clone, PartialEq)]
pub struct ReagentView {
    pub id: String,
    pub name: String,
    pub formula: String,
    pub purchase_date: String,
    pub open_date: Option<String>,
    pub current_volume: String,
    pub total_capacity: String,
    pub purity: String,
    pub location: String,
    pub density: f64,
    pub mass: f64,
    pub status: ReagentStatus,
}

impl From<&ReagentItem> for ReagentView {
    fn from(item: &ReagentItem) -> Self {
        Self {
            id: item.id.clone(),
            name: pick_i18n(item.name_i18n.as_deref(), Some(&item.name)),
            formula: item.formula.clone().unwrap_or_default(),
            purchase_date: format_date(item.purchase_date.as_deref()),
            open_date: item.open_date.as_deref().map(|d| format_date(Some(d))),
            current_volume: format_quantity(item.current_volume.as_ref(), "0"),
            total_capacity: format_quantity(item.original_volume.as_ref(), "0"),
            purity: format_percent(Some(item.purity.unwrap_or(0.0))),
            location: item
                .location
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| UNASSIGNED_LOCATION.to_string()),
            density: item.density.unwrap_or(0.0),
            mass: item.mass.unwrap_or(0.0),
            status: item.status.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisposalView {
    pub id: String,
    pub name: String,
    pub formula: String,
    pub disposal_date: String,
    pub disposed_by: String,
    pub reason: String,
    /// Shown while the dispose request is in flight.
    pub pending: bool,
}

impl From<&ReagentDisposal> for DisposalView {
    fn from(item: &ReagentDisposal) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            formula: item.formula.clone().unwrap_or_default(),
            disposal_date: format_date(Some(&item.disposal_date)),
            disposed_by: item.disposed_by.clone(),
            reason: item.reason.clone(),
            pending: false,
        }
    }
}

impl DisposalView {
    pub fn provisional(reagent: &ReagentView, reason: &str, disposed_by: &str, today: &str) -> Self {
        Self {
            id: reagent.id.clone(),
            name: reagent.name.clone(),
            formula: reagent.formula.clone(),
            disposal_date: today.to_string(),
            disposed_by: disposed_by.to_string(),
            reason: reason.to_string(),
            pending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageView {
    pub location: String,
    pub temp: String,
    pub humidity: String,
    pub status: StorageStatus,
}

impl From<&StorageEnvironmentItem> for StorageView {
    fn from(item: &StorageEnvironmentItem) -> Self {
        Self {
            location: item.location.clone(),
            temp: format!("{}°C", format_number(item.temp)),
            humidity: format!("{}%", format_number(item.humidity)),
            status: item.status,
        }
    }
}

/// Reagent as offered when adding it to an experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogReagent {
    pub id: String,
    pub name: String,
    pub formula: String,
    pub purchase_date: String,
    pub open_date: Option<String>,
    pub current_volume: String,
    pub original_volume: String,
    pub density: String,
    pub mass: String,
    pub purity: String,
    pub location: String,
    pub status: ReagentStatus,
}

impl From<&ReagentItem> for CatalogReagent {
    fn from(item: &ReagentItem) -> Self {
        Self {
            id: item.id.clone(),
            name: pick_i18n(item.name_i18n.as_deref(), Some(&item.name)),
            formula: item.formula.clone().unwrap_or_default(),
            purchase_date: item.purchase_date.clone().unwrap_or_default(),
            open_date: item.open_date.clone(),
            current_volume: format_quantity(item.current_volume.as_ref(), "-"),
            original_volume: format_quantity(item.original_volume.as_ref(), "-"),
            density: format_density(item.density, ""),
            mass: format_mass(item.mass, ""),
            purity: format_percent(item.purity),
            location: pick_i18n(item.location_i18n.as_deref(), item.location.as_deref()),
            status: item.status.unwrap_or_default(),
        }
    }
}
