// src/models/catalog.rs
// Cadastros simples: cores, fincas, tipos de contrato e centros de custo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationErrors};

use crate::common::query::{double_option, flag};
use crate::common::validation::{check_nullable_length, into_result, HEX_COLOR};

// --- 1. Cores ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub id: i64,
    pub name: String,
    pub code: String, // #RRGGBB
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateColorPayload {
    #[validate(length(min = 1, max = 50, message = "length"))]
    pub name: String,
    #[validate(regex(path = *HEX_COLOR, message = "invalid_hex_color"))]
    pub code: String,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateColorPayload {
    #[validate(length(min = 1, max = 50, message = "length"))]
    pub name: Option<String>,
    #[validate(regex(path = *HEX_COLOR, message = "invalid_hex_color"))]
    pub code: Option<String>,
    pub active: Option<bool>,
}

impl UpdateColorPayload {
    pub fn apply_to(&self, color: &mut Color) {
        if let Some(name) = &self.name {
            color.name = name.clone();
        }
        if let Some(code) = &self.code {
            color.code = code.clone();
        }
        if let Some(active) = self.active {
            color.active = active;
        }
    }
}

// --- 2. Fincas ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFarmPayload {
    #[validate(length(min = 1, max = 100, message = "length"))]
    pub name: String,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFarmPayload {
    #[validate(length(min = 1, max = 100, message = "length"))]
    pub name: Option<String>,
    pub active: Option<bool>,
}

impl UpdateFarmPayload {
    pub fn apply_to(&self, farm: &mut Farm) {
        if let Some(name) = &self.name {
            farm.name = name.clone();
        }
        if let Some(active) = self.active {
            farm.active = active;
        }
    }
}

// --- 3. Tipos de contrato ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContractType {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateContractTypePayload {
    #[validate(length(min = 1, max = 100, message = "length"))]
    pub name: String,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateContractTypePayload {
    #[validate(length(min = 1, max = 100, message = "length"))]
    pub name: Option<String>,
    pub active: Option<bool>,
}

impl UpdateContractTypePayload {
    pub fn apply_to(&self, contract_type: &mut ContractType) {
        if let Some(name) = &self.name {
            contract_type.name = name.clone();
        }
        if let Some(active) = self.active {
            contract_type.active = active;
        }
    }
}

// --- 4. Centros de custo ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CostCenter {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub group: Option<String>,
    pub contract_type_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Centro de custo com o tipo de contrato já carregado
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostCenterResponse {
    #[serde(flatten)]
    pub cost_center: CostCenter,
    pub contract_type: Option<ContractType>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCostCenterPayload {
    #[validate(length(min = 1, max = 150, message = "length"))]
    pub name: String,
    pub active: Option<bool>,
    #[validate(length(max = 100, message = "too_long"))]
    pub group: Option<String>,
    pub contract_type_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCostCenterPayload {
    #[validate(length(min = 1, max = 150, message = "length"))]
    pub name: Option<String>,
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub group: Option<Option<String>>,
    pub contract_type_id: Option<i64>,
}

impl UpdateCostCenterPayload {
    // `validate()` derivado não enxerga dentro de Option<Option<_>>
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };
        check_nullable_length(&mut errors, "group", &self.group, 100);
        into_result(errors)
    }

    pub fn apply_to(&self, cost_center: &mut CostCenter) {
        if let Some(name) = &self.name {
            cost_center.name = name.clone();
        }
        if let Some(active) = self.active {
            cost_center.active = active;
        }
        if let Some(group) = &self.group {
            cost_center.group = group.clone();
        }
        if let Some(contract_type_id) = self.contract_type_id {
            cost_center.contract_type_id = contract_type_id;
        }
    }
}

// --- Filtros de listagem ---

// ?active=1
#[derive(Debug, Default, Deserialize)]
pub struct ActiveFilter {
    #[serde(default, deserialize_with = "flag")]
    pub active: Option<bool>,
}

// ?active=1&group=Campo
#[derive(Debug, Default, Deserialize)]
pub struct CostCenterFilters {
    #[serde(default, deserialize_with = "flag")]
    pub active: Option<bool>,
    pub group: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cost_center() -> CostCenter {
        CostCenter {
            id: 3,
            name: "Empaque".into(),
            active: true,
            group: Some("Campo".into()),
            contract_type_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn color_code_must_be_hex() {
        let payload = CreateColorPayload {
            name: "Azul".into(),
            code: "blue".into(),
            active: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("code"));

        let ok = CreateColorPayload {
            name: "Azul".into(),
            code: "#0066CC".into(),
            active: None,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn farm_name_is_limited_to_100_chars() {
        let payload = CreateFarmPayload {
            name: "x".repeat(101),
            active: Some(true),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn cost_center_group_can_be_cleared_with_null() {
        let payload: UpdateCostCenterPayload = serde_json::from_str(r#"{"group": null}"#).unwrap();
        let mut target = cost_center();
        payload.apply_to(&mut target);
        assert_eq!(target.group, None);
        assert_eq!(target.name, "Empaque");
    }

    #[test]
    fn cost_center_update_without_fields_changes_nothing() {
        let payload: UpdateCostCenterPayload = serde_json::from_str("{}").unwrap();
        let mut target = cost_center();
        payload.apply_to(&mut target);
        assert_eq!(target.group.as_deref(), Some("Campo"));
        assert_eq!(target.contract_type_id, 1);
    }

    #[test]
    fn cost_center_group_length_is_checked_on_update() {
        let long = format!(r#"{{"group": "{}"}}"#, "g".repeat(101));
        let payload: UpdateCostCenterPayload = serde_json::from_str(&long).unwrap();
        let errors = payload.validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("group"));
    }
}
