// src/models/experiment.rs
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

use super::Quantity;
use crate::format::{format_density, format_mass, format_number, format_percent, pick_i18n};

// ==================== EXPERIMENT ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExperimentStatus {
    #[default]
    InProgress,
    Completed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSummary {
    pub id: String,
    pub title: String,
    pub date: Option<String>,
    #[serde(default)]
    pub status: ExperimentStatus,
    pub researcher: Option<String>,
    #[serde(default)]
    pub title_i18n: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentReagent {
    pub id: String,
    pub reagent_id: String,
    pub name: String,
    pub formula: Option<String>,
    #[serde(default)]
    pub dosage: Quantity,
    pub density: Option<f64>,
    pub mass: Option<f64>,
    pub purity: Option<f64>,
    pub location: Option<String>,
    #[serde(default)]
    pub name_i18n: Option<String>,
    #[serde(default)]
    pub location_i18n: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentDetail {
    pub id: String,
    pub title: String,
    pub date: Option<String>,
    #[serde(default)]
    pub status: ExperimentStatus,
    pub researcher: Option<String>,
    pub memo: Option<String>,
    #[serde(default)]
    pub reagents: Vec<ExperimentReagent>,
    #[serde(default)]
    pub title_i18n: Option<String>,
    #[serde(default)]
    pub memo_i18n: Option<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentCreateRequest {
    #[validate(length(min = 1, max = 255, code = "required"))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub researcher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExperimentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, code = "required"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub researcher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExperimentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentReagentCreateRequest {
    pub reagent_id: String,
    pub dosage: Quantity,
}

// ==================== VIEW MODELS ====================

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentReagentView {
    pub id: String,
    pub catalog_id: String,
    pub name: String,
    pub formula: String,
    pub dosage: String,
    pub volume: String,
    pub density: String,
    pub mass: String,
    pub purity: String,
    pub location: String,
}

impl From<&ExperimentReagent> for ExperimentReagentView {
    fn from(item: &ExperimentReagent) -> Self {
        Self {
            id: item.id.clone(),
            catalog_id: item.reagent_id.clone(),
            name: pick_i18n(item.name_i18n.as_deref(), Some(&item.name)),
            formula: item.formula.clone().unwrap_or_default(),
            dosage: item.dosage.value.map(format_number).unwrap_or_default(),
            volume: "N/A".to_string(),
            density: format_density(item.density, ""),
            mass: format_mass(item.mass, ""),
            purity: format_percent(item.purity),
            location: pick_i18n(item.location_i18n.as_deref(), item.location.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentView {
    pub id: String,
    pub title: String,
    pub date: String,
    pub status: ExperimentStatus,
    pub researcher: String,
    pub reagents: Vec<ExperimentReagentView>,
    pub memo: String,
}

impl From<&ExperimentSummary> for ExperimentView {
    fn from(summary: &ExperimentSummary) -> Self {
        Self {
            id: summary.id.clone(),
            title: pick_i18n(summary.title_i18n.as_deref(), Some(&summary.title)),
            date: summary.date.clone().unwrap_or_default(),
            status: summary.status,
            researcher: summary.researcher.clone().unwrap_or_default(),
            reagents: Vec::new(),
            memo: String::new(),
        }
    }
}

impl From<&ExperimentDetail> for ExperimentView {
    fn from(detail: &ExperimentDetail) -> Self {
        Self {
            id: detail.id.clone(),
            title: pick_i18n(detail.title_i18n.as_deref(), Some(&detail.title)),
            date: detail.date.clone().unwrap_or_default(),
            status: detail.status,
            researcher: detail.researcher.clone().unwrap_or_default(),
            reagents: detail.reagents.iter().map(ExperimentReagentView::from).collect(),
            memo: pick_i18n(detail.memo_i18n.as_deref(), detail.memo.as_deref()),
        }
    }
}
