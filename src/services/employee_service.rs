// src/services/employee_service.rs

use std::collections::HashMap;

use sqlx::PgPool;

use crate::{
    common::{
        db_utils::missing_ids,
        error::{AppError, Resource},
        query::{PageRequest, Paginated},
        validation::FieldCheck,
    },
    db::{CatalogRepository, EmployeeRepository, OrganizationRepository, UserRepository},
    models::{
        auth::UserSummary,
        catalog::{ContractType, Farm},
        employee::{
            CreateEmployeePayload, Employee, EmployeeFilters, EmployeeRelations, EmployeeResponse,
            UpdateEmployeePayload,
        },
        organization::OrgStructure,
    },
    services::group_by,
};

// Referências de um empregado que precisam existir antes de gravar
struct References<'a> {
    user_id: Option<i64>,
    contract_type_id: Option<i64>,
    org_structure_id: Option<i64>,
    farms: Option<&'a [i64]>,
}

fn distinct(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[derive(Clone)]
pub struct EmployeeService {
    repo: EmployeeRepository,
    user_repo: UserRepository,
    catalog_repo: CatalogRepository,
    org_repo: OrganizationRepository,
    pool: PgPool,
}

impl EmployeeService {
    pub fn new(
        repo: EmployeeRepository,
        user_repo: UserRepository,
        catalog_repo: CatalogRepository,
        org_repo: OrganizationRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            user_repo,
            catalog_repo,
            org_repo,
            pool,
        }
    }

    // Carrega usuário, tipo de contrato, cargo e fincas de todos de uma vez
    async fn with_relations(&self, employees: Vec<Employee>) -> Result<Vec<EmployeeResponse>, AppError> {
        let user_ids = distinct(employees.iter().filter_map(|e| e.user_id).collect());
        let contract_type_ids = distinct(employees.iter().map(|e| e.contract_type_id).collect());
        let org_structure_ids = distinct(employees.iter().map(|e| e.org_structure_id).collect());
        let employee_ids: Vec<i64> = employees.iter().map(|e| e.id).collect();

        let users: HashMap<i64, UserSummary> = self
            .user_repo
            .find_summaries(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let contract_types: HashMap<i64, ContractType> = self
            .catalog_repo
            .find_contract_types(&contract_type_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let org_structures: HashMap<i64, OrgStructure> = self
            .org_repo
            .find_org_structures(&org_structure_ids)
            .await?
            .into_iter()
            .map(|o| (o.id, o))
            .collect();
        let rows = self.repo.farms_for(&employee_ids).await?;
        let mut farms: HashMap<i64, Vec<Farm>> = group_by(rows, |row| row.employee_id);

        Ok(employees
            .into_iter()
            .map(|employee| {
                let relations = EmployeeRelations {
                    user: employee.user_id.and_then(|id| users.get(&id).cloned()),
                    contract_type: contract_types.get(&employee.contract_type_id).cloned(),
                    org_structure: org_structures.get(&employee.org_structure_id).cloned(),
                    farms: farms.remove(&employee.id).unwrap_or_default(),
                };
                EmployeeResponse {
                    employee,
                    relations: Some(relations),
                }
            })
            .collect())
    }

    async fn one_with_relations(&self, employee: Employee) -> Result<EmployeeResponse, AppError> {
        self.with_relations(vec![employee])
            .await?
            .pop()
            .ok_or(AppError::NotFound(Resource::Employee))
    }

    async fn find(&self, id: i64) -> Result<Employee, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Resource::Employee))
    }

    // Unicidade do código AS2 e do usuário, e existência das referências.
    // `except_id` é o próprio empregado no update.
    async fn check_references(
        &self,
        check: &mut FieldCheck,
        as2_employee_id: Option<&str>,
        refs: References<'_>,
        except_id: Option<i64>,
    ) -> Result<(), AppError> {
        if let Some(as2_id) = as2_employee_id {
            check.fail_if(self.repo.as2_id_taken(as2_id, except_id).await?, "as2_employee_id", "taken");
        }
        if let Some(user_id) = refs.user_id {
            if !self.user_repo.exists(user_id).await? {
                check.add("user_id", "not_found");
            } else if self.repo.user_linked(user_id, except_id).await? {
                check.add("user_id", "taken");
            }
        }
        if let Some(contract_type_id) = refs.contract_type_id {
            check.fail_if(
                !self.catalog_repo.contract_type_exists(contract_type_id).await?,
                "contract_type_id",
                "not_found",
            );
        }
        if let Some(org_structure_id) = refs.org_structure_id {
            check.fail_if(
                !self.org_repo.org_structure_exists(org_structure_id).await?,
                "org_structure_id",
                "not_found",
            );
        }
        if let Some(farm_ids) = refs.farms {
            let found = self.catalog_repo.existing_farm_ids(farm_ids).await?;
            check.fail_if(!missing_ids(farm_ids, &found).is_empty(), "farms", "not_found");
        }
        Ok(())
    }

    pub async fn list(
        &self,
        filters: &EmployeeFilters,
        page: PageRequest,
    ) -> Result<Paginated<EmployeeResponse>, AppError> {
        let (employees, total) = self.repo.list(filters, page).await?;
        let data = if filters.with_relations.unwrap_or(false) {
            self.with_relations(employees).await?
        } else {
            employees
                .into_iter()
                .map(|employee| EmployeeResponse {
                    employee,
                    relations: None,
                })
                .collect()
        };
        Ok(Paginated::new(data, page, total))
    }

    pub async fn get(&self, id: i64, with_relations: bool) -> Result<EmployeeResponse, AppError> {
        let employee = self.find(id).await?;
        if with_relations {
            self.one_with_relations(employee).await
        } else {
            Ok(EmployeeResponse {
                employee,
                relations: None,
            })
        }
    }

    pub async fn create(&self, payload: &CreateEmployeePayload) -> Result<EmployeeResponse, AppError> {
        let mut check = FieldCheck::new();
        self.check_references(
            &mut check,
            Some(&payload.as2_employee_id),
            References {
                user_id: payload.user_id,
                contract_type_id: Some(payload.contract_type_id),
                org_structure_id: Some(payload.org_structure_id),
                farms: payload.farms.as_deref(),
            },
            None,
        )
        .await?;
        check.finish()?;

        let mut tx = self.pool.begin().await?;
        let employee = self.repo.create(&mut *tx, payload).await?;
        if let Some(farm_ids) = &payload.farms {
            self.repo.sync_farms(&mut *tx, employee.id, farm_ids).await?;
        }
        tx.commit().await?;

        tracing::info!(employee_id = employee.id, "empregado criado");
        self.one_with_relations(employee).await
    }

    pub async fn update(&self, id: i64, payload: &UpdateEmployeePayload) -> Result<EmployeeResponse, AppError> {
        let mut employee = self.find(id).await?;

        let mut check = FieldCheck::new();
        self.check_references(
            &mut check,
            payload.as2_employee_id.as_deref(),
            References {
                // `Some(None)` desvincula o usuário: nada a checar
                user_id: payload.user_id.flatten(),
                contract_type_id: payload.contract_type_id,
                org_structure_id: payload.org_structure_id,
                farms: payload.farms.as_deref(),
            },
            Some(id),
        )
        .await?;
        check.finish()?;

        payload.apply_to(&mut employee);

        let mut tx = self.pool.begin().await?;
        let updated = self.repo.update(&mut *tx, &employee).await?;
        if let Some(farm_ids) = &payload.farms {
            self.repo.sync_farms(&mut *tx, id, farm_ids).await?;
        }
        tx.commit().await?;

        self.one_with_relations(updated).await
    }

    // Solta as fincas e apaga, na mesma transação
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.find(id).await?;

        let mut tx = self.pool.begin().await?;
        self.repo.detach_farms(&mut *tx, id).await?;
        self.repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(employee_id = id, "empregado removido");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sqlx::PgPool;

    use super::*;
    use crate::services::fixtures;

    // Catálogo mínimo para um empregado: tipo de contrato, cargo e duas fincas
    struct Setup {
        contract_type: i64,
        org_structure: i64,
        farms: [i64; 2],
    }

    async fn setup(pool: &PgPool) -> Setup {
        let contract_type = fixtures::named(pool, "contract_types", "Fijo").await;
        let department = fixtures::department(pool, "Cosecha", None).await;
        let org_structure = fixtures::org_structure(pool, "Cortador", department).await;
        let farms = [
            fixtures::named(pool, "farms", "La Esperanza").await,
            fixtures::named(pool, "farms", "San Rafael").await,
        ];
        Setup {
            contract_type,
            org_structure,
            farms,
        }
    }

    fn payload(as2_id: &str, setup: &Setup, farms: &[i64], user_id: Option<i64>) -> CreateEmployeePayload {
        serde_json::from_value(json!({
            "as2EmployeeId": as2_id,
            "firstName": "Luis",
            "lastName": "Mora",
            "birthDate": "1990-04-12",
            "contact": "0991234567",
            "disability": "Ninguna",
            "disabilityPercentage": 0,
            "as2HireDate": "2020-01-15",
            "as2CostStructure": "Campo",
            "srv66Id": "S66",
            "srv90Id": "S90",
            "areasId": "A1",
            "biometricUserType": "Normal",
            "userId": user_id,
            "contractTypeId": setup.contract_type,
            "orgStructureId": setup.org_structure,
            "farms": farms,
        }))
        .unwrap()
    }

    fn farm_ids(response: &EmployeeResponse) -> Vec<i64> {
        let mut ids: Vec<i64> = response
            .relations
            .iter()
            .flat_map(|r| r.farms.iter().map(|f| f.id))
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn distinct_sorts_and_removes_duplicates() {
        assert_eq!(distinct(vec![5, 1, 5, 3, 1]), vec![1, 3, 5]);
        assert!(distinct(Vec::new()).is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn created_employee_comes_back_with_relations(pool: PgPool) {
        let setup = setup(&pool).await;
        let user = fixtures::user(&pool, "luis@finca.co").await;
        let service = fixtures::state(pool).employee_service;

        let created = service
            .create(&payload("A300", &setup, &setup.farms, Some(user)))
            .await
            .unwrap();
        let mut expected = setup.farms.to_vec();
        expected.sort_unstable();
        assert_eq!(farm_ids(&created), expected);

        let found = service.get(created.employee.id, true).await.unwrap();
        let relations = found.relations.as_ref().unwrap();
        assert_eq!(found.employee.as2_employee_id, "A300");
        assert_eq!(relations.user.as_ref().map(|u| u.id), Some(user));
        assert_eq!(relations.contract_type.as_ref().map(|c| c.id), Some(setup.contract_type));
        assert_eq!(relations.org_structure.as_ref().map(|o| o.id), Some(setup.org_structure));

        let bare = service.get(created.employee.id, false).await.unwrap();
        assert!(bare.relations.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn farm_list_is_replaced_on_update(pool: PgPool) {
        let setup = setup(&pool).await;
        let service = fixtures::state(pool).employee_service;

        let created = service
            .create(&payload("A301", &setup, &setup.farms, None))
            .await
            .unwrap();
        let id = created.employee.id;

        let only_second: UpdateEmployeePayload =
            serde_json::from_value(json!({ "farms": [setup.farms[1]] })).unwrap();
        let updated = service.update(id, &only_second).await.unwrap();
        assert_eq!(farm_ids(&updated), vec![setup.farms[1]]);

        // Sem "farms" no corpo, o conjunto fica como está
        let rename: UpdateEmployeePayload =
            serde_json::from_value(json!({ "firstName": "Pedro" })).unwrap();
        let renamed = service.update(id, &rename).await.unwrap();
        assert_eq!(renamed.employee.first_name, "Pedro");
        assert_eq!(farm_ids(&renamed), vec![setup.farms[1]]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn as2_code_and_user_cannot_be_reused(pool: PgPool) {
        let setup = setup(&pool).await;
        let user = fixtures::user(&pool, "ana@finca.co").await;
        let service = fixtures::state(pool).employee_service;

        service
            .create(&payload("A302", &setup, &[], Some(user)))
            .await
            .unwrap();

        let error = service
            .create(&payload("A302", &setup, &[], Some(user)))
            .await
            .unwrap_err();
        let fields = fixtures::field_errors(error);
        assert_eq!(fields["as2_employee_id"], vec!["taken"]);
        assert_eq!(fields["user_id"], vec!["taken"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_references_are_reported_together(pool: PgPool) {
        let setup = setup(&pool).await;
        let service = fixtures::state(pool).employee_service;

        let mut broken = payload("A303", &setup, &[setup.farms[0], 9_999], Some(8_888));
        broken.contract_type_id = 7_777;
        let fields = fixtures::field_errors(service.create(&broken).await.unwrap_err());
        assert_eq!(fields["farms"], vec!["not_found"]);
        assert_eq!(fields["user_id"], vec!["not_found"]);
        assert_eq!(fields["contract_type_id"], vec!["not_found"]);
        assert!(!fields.contains_key("org_structure_id"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleting_an_employee_frees_its_farms(pool: PgPool) {
        let setup = setup(&pool).await;
        let state = fixtures::state(pool);

        let created = state
            .employee_service
            .create(&payload("A304", &setup, &setup.farms, None))
            .await
            .unwrap();
        assert!(matches!(
            state.catalog_service.delete_farm(setup.farms[0]).await,
            Err(AppError::HasDependents("farm.has_employees"))
        ));

        state.employee_service.delete(created.employee.id).await.unwrap();
        assert!(matches!(
            state.employee_service.get(created.employee.id, false).await,
            Err(AppError::NotFound(Resource::Employee))
        ));
        state.catalog_service.delete_farm(setup.farms[0]).await.unwrap();
    }
}
