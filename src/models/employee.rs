// src/models/employee.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationErrors};

use crate::common::query::{double_option, flag, lenient_i64};
use crate::common::validation::{check_nullable_length, into_result};
use crate::models::auth::UserSummary;
use crate::models::catalog::{ContractType, Farm};
use crate::models::organization::OrgStructure;

// Tabela employees. Os campos "as2" espelham o cadastro do sistema de folha.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub as2_employee_id: String,
    pub hr_active: bool,
    pub as2_active: bool,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub contact: String,
    pub disability: String,
    pub disability_percentage: i32,
    pub as2_hire_date: NaiveDate,
    pub as2_exit_date: Option<NaiveDate>,
    pub as2_cost_structure: String,
    pub hr_hire_date: Option<NaiveDate>,
    pub hr_exit_date: Option<NaiveDate>,
    pub srv66_id: String,
    pub srv90_id: String,
    pub areas_id: String,
    pub biometric_user_type: String,
    pub profile_photo: Option<String>,
    pub user_id: Option<i64>,
    pub contract_type_id: i64,
    pub org_structure_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Relações carregadas com ?with_relations=1 (e sempre após create/update)
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRelations {
    pub user: Option<UserSummary>,
    pub contract_type: Option<ContractType>,
    pub org_structure: Option<OrgStructure>,
    pub farms: Vec<Farm>,
}

#[derive(Debug, Serialize)]
pub struct EmployeeResponse {
    #[serde(flatten)]
    pub employee: Employee,
    #[serde(flatten)]
    pub relations: Option<EmployeeRelations>,
}

// Linha do JOIN employee_farms -> farms
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeFarmRow {
    pub employee_id: i64,
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EmployeeFarmRow> for Farm {
    fn from(row: EmployeeFarmRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeePayload {
    #[validate(length(min = 1, max = 10, message = "length"))]
    pub as2_employee_id: String,
    pub hr_active: Option<bool>,
    pub as2_active: Option<bool>,
    #[validate(length(min = 1, max = 20, message = "length"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 20, message = "length"))]
    pub last_name: String,
    pub birth_date: NaiveDate,
    #[validate(length(min = 1, max = 10, message = "length"))]
    pub contact: String,
    #[validate(length(min = 1, max = 20, message = "length"))]
    pub disability: String,
    #[validate(range(min = 0, max = 100, message = "invalid_percentage"))]
    pub disability_percentage: i32,
    pub as2_hire_date: NaiveDate,
    pub as2_exit_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub as2_cost_structure: String,
    pub hr_hire_date: Option<NaiveDate>,
    pub hr_exit_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub srv66_id: String,
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub srv90_id: String,
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub areas_id: String,
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub biometric_user_type: String,
    #[validate(length(max = 255, message = "too_long"))]
    pub profile_photo: Option<String>,
    pub user_id: Option<i64>,
    pub contract_type_id: i64,
    pub org_structure_id: i64,
    pub farms: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeePayload {
    #[validate(length(min = 1, max = 10, message = "length"))]
    pub as2_employee_id: Option<String>,
    pub hr_active: Option<bool>,
    pub as2_active: Option<bool>,
    #[validate(length(min = 1, max = 20, message = "length"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 20, message = "length"))]
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 10, message = "length"))]
    pub contact: Option<String>,
    #[validate(length(min = 1, max = 20, message = "length"))]
    pub disability: Option<String>,
    #[validate(range(min = 0, max = 100, message = "invalid_percentage"))]
    pub disability_percentage: Option<i32>,
    pub as2_hire_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub as2_exit_date: Option<Option<NaiveDate>>,
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub as2_cost_structure: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub hr_hire_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub hr_exit_date: Option<Option<NaiveDate>>,
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub srv66_id: Option<String>,
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub srv90_id: Option<String>,
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub areas_id: Option<String>,
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub biometric_user_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub profile_photo: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub user_id: Option<Option<i64>>,
    pub contract_type_id: Option<i64>,
    pub org_structure_id: Option<i64>,
    pub farms: Option<Vec<i64>>,
}

impl UpdateEmployeePayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };
        check_nullable_length(&mut errors, "profile_photo", &self.profile_photo, 255);
        into_result(errors)
    }

    // Mescla os campos presentes. `farms` é tratado à parte (tabela pivô).
    pub fn apply_to(&self, e: &mut Employee) {
        if let Some(v) = &self.as2_employee_id {
            e.as2_employee_id = v.clone();
        }
        if let Some(v) = self.hr_active {
            e.hr_active = v;
        }
        if let Some(v) = self.as2_active {
            e.as2_active = v;
        }
        if let Some(v) = &self.first_name {
            e.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            e.last_name = v.clone();
        }
        if let Some(v) = self.birth_date {
            e.birth_date = v;
        }
        if let Some(v) = &self.contact {
            e.contact = v.clone();
        }
        if let Some(v) = &self.disability {
            e.disability = v.clone();
        }
        if let Some(v) = self.disability_percentage {
            e.disability_percentage = v;
        }
        if let Some(v) = self.as2_hire_date {
            e.as2_hire_date = v;
        }
        if let Some(v) = self.as2_exit_date {
            e.as2_exit_date = v;
        }
        if let Some(v) = &self.as2_cost_structure {
            e.as2_cost_structure = v.clone();
        }
        if let Some(v) = self.hr_hire_date {
            e.hr_hire_date = v;
        }
        if let Some(v) = self.hr_exit_date {
            e.hr_exit_date = v;
        }
        if let Some(v) = &self.srv66_id {
            e.srv66_id = v.clone();
        }
        if let Some(v) = &self.srv90_id {
            e.srv90_id = v.clone();
        }
        if let Some(v) = &self.areas_id {
            e.areas_id = v.clone();
        }
        if let Some(v) = &self.biometric_user_type {
            e.biometric_user_type = v.clone();
        }
        if let Some(v) = &self.profile_photo {
            e.profile_photo = v.clone();
        }
        if let Some(v) = self.user_id {
            e.user_id = v;
        }
        if let Some(v) = self.contract_type_id {
            e.contract_type_id = v;
        }
        if let Some(v) = self.org_structure_id {
            e.org_structure_id = v;
        }
    }
}

// ?hr_active=1&as2_active=0&contract_type_id=2&org_structure_id=5&with_relations=1
#[derive(Debug, Default, Deserialize)]
pub struct EmployeeFilters {
    #[serde(default, deserialize_with = "flag")]
    pub hr_active: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub as2_active: Option<bool>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub contract_type_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub org_structure_id: Option<i64>,
    #[serde(default, deserialize_with = "flag")]
    pub with_relations: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee() -> Employee {
        let date = NaiveDate::from_ymd_opt(1990, 5, 17).unwrap();
        Employee {
            id: 10,
            as2_employee_id: "A001".into(),
            hr_active: true,
            as2_active: true,
            first_name: "Lucía".into(),
            last_name: "Pérez".into(),
            birth_date: date,
            contact: "3001234567".into(),
            disability: "Ninguna".into(),
            disability_percentage: 0,
            as2_hire_date: date,
            as2_exit_date: None,
            as2_cost_structure: "Cultivo".into(),
            hr_hire_date: Some(date),
            hr_exit_date: None,
            srv66_id: "66".into(),
            srv90_id: "90".into(),
            areas_id: "AR".into(),
            biometric_user_type: "normal".into(),
            profile_photo: Some("fotos/10.jpg".into()),
            user_id: Some(3),
            contract_type_id: 1,
            org_structure_id: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn create_json(percentage: i32) -> String {
        format!(
            r#"{{
                "as2EmployeeId": "A002", "firstName": "Juan", "lastName": "Ríos",
                "birthDate": "1988-02-01", "contact": "3000000000", "disability": "Ninguna",
                "disabilityPercentage": {}, "as2HireDate": "2020-01-15",
                "as2CostStructure": "Cultivo", "srv66Id": "1", "srv90Id": "2",
                "areasId": "3", "biometricUserType": "normal",
                "contractTypeId": 1, "orgStructureId": 2, "farms": [1, 2]
            }}"#,
            percentage
        )
    }

    #[test]
    fn create_payload_parses_and_validates() {
        let payload: CreateEmployeePayload = serde_json::from_str(&create_json(40)).unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.farms, Some(vec![1, 2]));
        assert_eq!(payload.hr_active, None);
    }

    #[test]
    fn disability_percentage_is_bounded() {
        let payload: CreateEmployeePayload = serde_json::from_str(&create_json(101)).unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("disability_percentage"));
    }

    #[test]
    fn nulls_clear_optional_fields_and_absent_fields_are_kept() {
        let payload: UpdateEmployeePayload = serde_json::from_str(
            r#"{"userId": null, "profilePhoto": null, "hrExitDate": "2024-06-30"}"#,
        )
        .unwrap();
        let mut target = employee();
        payload.apply_to(&mut target);

        assert_eq!(target.user_id, None);
        assert_eq!(target.profile_photo, None);
        assert_eq!(target.hr_exit_date, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(target.hr_hire_date, NaiveDate::from_ymd_opt(1990, 5, 17));
        assert_eq!(target.first_name, "Lucía");
    }

    #[test]
    fn applying_the_same_values_twice_is_stable() {
        let payload: UpdateEmployeePayload =
            serde_json::from_str(r#"{"firstName": "Lucía", "contractTypeId": 1}"#).unwrap();
        let mut once = employee();
        payload.apply_to(&mut once);
        let mut twice = once.clone();
        payload.apply_to(&mut twice);
        assert_eq!(once.first_name, twice.first_name);
        assert_eq!(once.contract_type_id, twice.contract_type_id);
    }

    #[test]
    fn relations_are_omitted_when_not_loaded() {
        let plain = EmployeeResponse {
            employee: employee(),
            relations: None,
        };
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("farms").is_none());
        assert_eq!(json["as2EmployeeId"], "A001");

        let loaded = EmployeeResponse {
            employee: employee(),
            relations: Some(EmployeeRelations::default()),
        };
        let json = serde_json::to_value(&loaded).unwrap();
        assert!(json["farms"].is_array());
    }
}
