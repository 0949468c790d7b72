// src/models/organization.rs
// Departamentos e estrutura organizacional (cargos)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::common::query::{double_option, flag, lenient_i64};
use crate::models::catalog::Color;

// --- Departamentos ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub color_id: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentResponse {
    #[serde(flatten)]
    pub department: Department,
    pub color: Option<Color>,
    // Só aparece com ?with_structures=1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_structures: Option<Vec<OrgStructure>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentPayload {
    #[validate(length(min = 1, max = 100, message = "length"))]
    pub name: String,
    pub color_id: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartmentPayload {
    #[validate(length(min = 1, max = 100, message = "length"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub color_id: Option<Option<i64>>,
    pub active: Option<bool>,
}

impl UpdateDepartmentPayload {
    pub fn apply_to(&self, department: &mut Department) {
        if let Some(name) = &self.name {
            department.name = name.clone();
        }
        if let Some(color_id) = self.color_id {
            department.color_id = color_id;
        }
        if let Some(active) = self.active {
            department.active = active;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DepartmentFilters {
    #[serde(default, deserialize_with = "flag")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub with_structures: Option<bool>,
}

// --- Estrutura organizacional ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrgStructure {
    pub id: i64,
    pub position: String,
    pub department_id: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha do JOIN org_structure_access -> departments, para carregar em lote
#[derive(Debug, Clone, FromRow)]
pub struct AccessDepartmentRow {
    pub org_structure_id: i64,
    pub id: i64,
    pub name: String,
    pub color_id: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccessDepartmentRow> for Department {
    fn from(row: AccessDepartmentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            color_id: row.color_id,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgStructureResponse {
    #[serde(flatten)]
    pub org_structure: OrgStructure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    // Cada departamento de acesso vem com a sua cor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_departments: Option<Vec<DepartmentResponse>>,
}

impl From<OrgStructure> for OrgStructureResponse {
    fn from(org_structure: OrgStructure) -> Self {
        Self {
            org_structure,
            department: None,
            access_departments: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrgStructurePayload {
    #[validate(length(min = 1, max = 150, message = "length"))]
    pub position: String,
    pub department_id: i64,
    pub active: Option<bool>,
    pub access_departments: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrgStructurePayload {
    #[validate(length(min = 1, max = 150, message = "length"))]
    pub position: Option<String>,
    pub department_id: Option<i64>,
    pub active: Option<bool>,
    pub access_departments: Option<Vec<i64>>,
}

impl UpdateOrgStructurePayload {
    pub fn apply_to(&self, org_structure: &mut OrgStructure) {
        if let Some(position) = &self.position {
            org_structure.position = position.clone();
        }
        if let Some(department_id) = self.department_id {
            org_structure.department_id = department_id;
        }
        if let Some(active) = self.active {
            org_structure.active = active;
        }
    }
}

// PUT /org-structures/{id}/access: substitui o conjunto inteiro
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccessPayload {
    pub access_departments: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrgStructureFilters {
    #[serde(default, deserialize_with = "flag")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub department_id: Option<i64>,
    #[serde(default, deserialize_with = "flag")]
    pub with_relations: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn department() -> Department {
        Department {
            id: 2,
            name: "Cosecha".into(),
            color_id: Some(4),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn explicit_null_clears_the_department_color() {
        let payload: UpdateDepartmentPayload =
            serde_json::from_str(r#"{"colorId": null}"#).unwrap();
        let mut target = department();
        payload.apply_to(&mut target);
        assert_eq!(target.color_id, None);
    }

    #[test]
    fn absent_color_keeps_the_current_one() {
        let payload: UpdateDepartmentPayload =
            serde_json::from_str(r#"{"name": "Poscosecha"}"#).unwrap();
        let mut target = department();
        payload.apply_to(&mut target);
        assert_eq!(target.color_id, Some(4));
        assert_eq!(target.name, "Poscosecha");
    }

    #[test]
    fn structures_are_hidden_unless_requested() {
        let response = DepartmentResponse {
            department: department(),
            color: None,
            org_structures: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("orgStructures").is_none());
        assert_eq!(json["colorId"], 4);
    }

    #[test]
    fn access_departments_carry_their_color() {
        let structure = OrgStructure {
            id: 9,
            position: "Supervisor".into(),
            department_id: 2,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let color = Color {
            id: 4,
            name: "Verde".into(),
            code: "#00FF00".into(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let response = OrgStructureResponse {
            department: None,
            access_departments: Some(vec![DepartmentResponse {
                department: department(),
                color: Some(color),
                org_structures: None,
            }]),
            org_structure: structure,
        };
        let json = serde_json::to_value(&response).unwrap();
        let access = &json["accessDepartments"][0];
        assert_eq!(access["colorId"], 4);
        assert_eq!(access["color"]["code"], "#00FF00");
        assert!(access.get("orgStructures").is_none());
    }

    #[test]
    fn access_payload_reads_camel_case() {
        let payload: UpdateAccessPayload =
            serde_json::from_str(r#"{"accessDepartments": [1, 2, 3]}"#).unwrap();
        assert_eq!(payload.access_departments, vec![1, 2, 3]);
    }

    #[test]
    fn position_is_required_and_bounded() {
        let payload = CreateOrgStructurePayload {
            position: String::new(),
            department_id: 1,
            active: None,
            access_departments: None,
        };
        assert!(payload.validate().is_err());
    }
}
