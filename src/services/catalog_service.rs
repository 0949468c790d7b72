// src/services/catalog_service.rs

use std::collections::HashMap;

use crate::{
    common::{
        error::{AppError, Resource},
        query::{PageRequest, Paginated},
        validation::FieldCheck,
    },
    db::CatalogRepository,
    models::catalog::{
        ActiveFilter, Color, ContractType, CostCenter, CostCenterFilters, CostCenterResponse,
        CreateColorPayload, CreateContractTypePayload, CreateCostCenterPayload, CreateFarmPayload,
        Farm, UpdateColorPayload, UpdateContractTypePayload, UpdateCostCenterPayload,
        UpdateFarmPayload,
    },
};

// Cores, fincas, tipos de contrato e centros de custo
#[derive(Clone)]
pub struct CatalogService {
    repo: CatalogRepository,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository) -> Self {
        Self { repo }
    }

    // ---
    // Cores
    // ---

    pub async fn list_colors(&self, filters: &ActiveFilter, page: PageRequest) -> Result<Paginated<Color>, AppError> {
        let (colors, total) = self.repo.list_colors(filters, page).await?;
        Ok(Paginated::new(colors, page, total))
    }

    pub async fn get_color(&self, id: i64) -> Result<Color, AppError> {
        self.repo.find_color(id).await?.ok_or(AppError::NotFound(Resource::Color))
    }

    pub async fn create_color(&self, payload: &CreateColorPayload) -> Result<Color, AppError> {
        let mut check = FieldCheck::new();
        check.fail_if(self.repo.color_name_taken(&payload.name, None).await?, "name", "taken");
        check.fail_if(self.repo.color_code_taken(&payload.code, None).await?, "code", "taken");
        check.finish()?;

        self.repo
            .create_color(&payload.name, &payload.code, payload.active.unwrap_or(true))
            .await
    }

    pub async fn update_color(&self, id: i64, payload: &UpdateColorPayload) -> Result<Color, AppError> {
        let mut color = self.get_color(id).await?;

        let mut check = FieldCheck::new();
        if let Some(name) = &payload.name {
            check.fail_if(self.repo.color_name_taken(name, Some(id)).await?, "name", "taken");
        }
        if let Some(code) = &payload.code {
            check.fail_if(self.repo.color_code_taken(code, Some(id)).await?, "code", "taken");
        }
        check.finish()?;

        payload.apply_to(&mut color);
        self.repo.update_color(&color).await
    }

    pub async fn delete_color(&self, id: i64) -> Result<(), AppError> {
        self.get_color(id).await?;
        if self.repo.color_in_use(id).await? {
            return Err(AppError::HasDependents("color.in_use"));
        }
        self.repo.delete_color(id).await?;
        Ok(())
    }

    // ---
    // Fincas
    // ---

    pub async fn list_farms(&self, filters: &ActiveFilter, page: PageRequest) -> Result<Paginated<Farm>, AppError> {
        let (farms, total) = self.repo.list_farms(filters, page).await?;
        Ok(Paginated::new(farms, page, total))
    }

    pub async fn get_farm(&self, id: i64) -> Result<Farm, AppError> {
        self.repo.find_farm(id).await?.ok_or(AppError::NotFound(Resource::Farm))
    }

    pub async fn create_farm(&self, payload: &CreateFarmPayload) -> Result<Farm, AppError> {
        if self.repo.farm_name_taken(&payload.name, None).await? {
            return Err(AppError::field("name", "taken"));
        }
        self.repo.create_farm(&payload.name, payload.active.unwrap_or(true)).await
    }

    pub async fn update_farm(&self, id: i64, payload: &UpdateFarmPayload) -> Result<Farm, AppError> {
        let mut farm = self.get_farm(id).await?;
        if let Some(name) = &payload.name {
            if self.repo.farm_name_taken(name, Some(id)).await? {
                return Err(AppError::field("name", "taken"));
            }
        }
        payload.apply_to(&mut farm);
        self.repo.update_farm(&farm).await
    }

    pub async fn delete_farm(&self, id: i64) -> Result<(), AppError> {
        self.get_farm(id).await?;
        if self.repo.farm_has_employees(id).await? {
            return Err(AppError::HasDependents("farm.has_employees"));
        }
        self.repo.delete_farm(id).await?;
        Ok(())
    }

    // ---
    // Tipos de contrato
    // ---

    pub async fn list_contract_types(
        &self,
        filters: &ActiveFilter,
        page: PageRequest,
    ) -> Result<Paginated<ContractType>, AppError> {
        let (contract_types, total) = self.repo.list_contract_types(filters, page).await?;
        Ok(Paginated::new(contract_types, page, total))
    }

    pub async fn get_contract_type(&self, id: i64) -> Result<ContractType, AppError> {
        self.repo
            .find_contract_type(id)
            .await?
            .ok_or(AppError::NotFound(Resource::ContractType))
    }

    pub async fn create_contract_type(&self, payload: &CreateContractTypePayload) -> Result<ContractType, AppError> {
        if self.repo.contract_type_name_taken(&payload.name, None).await? {
            return Err(AppError::field("name", "taken"));
        }
        self.repo
            .create_contract_type(&payload.name, payload.active.unwrap_or(true))
            .await
    }

    pub async fn update_contract_type(
        &self,
        id: i64,
        payload: &UpdateContractTypePayload,
    ) -> Result<ContractType, AppError> {
        let mut contract_type = self.get_contract_type(id).await?;
        if let Some(name) = &payload.name {
            if self.repo.contract_type_name_taken(name, Some(id)).await? {
                return Err(AppError::field("name", "taken"));
            }
        }
        payload.apply_to(&mut contract_type);
        self.repo.update_contract_type(&contract_type).await
    }

    pub async fn delete_contract_type(&self, id: i64) -> Result<(), AppError> {
        self.get_contract_type(id).await?;
        if self.repo.contract_type_in_use(id).await? {
            return Err(AppError::HasDependents("contract_type.in_use"));
        }
        self.repo.delete_contract_type(id).await?;
        Ok(())
    }

    // ---
    // Centros de custo
    // ---

    async fn with_contract_types(&self, cost_centers: Vec<CostCenter>) -> Result<Vec<CostCenterResponse>, AppError> {
        let mut ids: Vec<i64> = cost_centers.iter().map(|c| c.contract_type_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let by_id: HashMap<i64, ContractType> = self
            .repo
            .find_contract_types(&ids)
            .await?
            .into_iter()
            .map(|ct| (ct.id, ct))
            .collect();

        Ok(cost_centers
            .into_iter()
            .map(|cost_center| CostCenterResponse {
                contract_type: by_id.get(&cost_center.contract_type_id).cloned(),
                cost_center,
            })
            .collect())
    }

    async fn one_with_contract_type(&self, cost_center: CostCenter) -> Result<CostCenterResponse, AppError> {
        let contract_type = self.repo.find_contract_type(cost_center.contract_type_id).await?;
        Ok(CostCenterResponse {
            cost_center,
            contract_type,
        })
    }

    pub async fn list_cost_centers(
        &self,
        filters: &CostCenterFilters,
        page: PageRequest,
    ) -> Result<Paginated<CostCenterResponse>, AppError> {
        let (cost_centers, total) = self.repo.list_cost_centers(filters, page).await?;
        let data = self.with_contract_types(cost_centers).await?;
        Ok(Paginated::new(data, page, total))
    }

    pub async fn get_cost_center(&self, id: i64) -> Result<CostCenterResponse, AppError> {
        let cost_center = self
            .repo
            .find_cost_center(id)
            .await?
            .ok_or(AppError::NotFound(Resource::CostCenter))?;
        self.one_with_contract_type(cost_center).await
    }

    pub async fn create_cost_center(&self, payload: &CreateCostCenterPayload) -> Result<CostCenterResponse, AppError> {
        let mut check = FieldCheck::new();
        check.fail_if(self.repo.cost_center_name_taken(&payload.name, None).await?, "name", "taken");
        check.fail_if(
            !self.repo.contract_type_exists(payload.contract_type_id).await?,
            "contract_type_id",
            "not_found",
        );
        check.finish()?;

        let cost_center = self
            .repo
            .create_cost_center(
                &payload.name,
                payload.active.unwrap_or(true),
                payload.group.as_deref(),
                payload.contract_type_id,
            )
            .await?;
        self.one_with_contract_type(cost_center).await
    }

    pub async fn update_cost_center(
        &self,
        id: i64,
        payload: &UpdateCostCenterPayload,
    ) -> Result<CostCenterResponse, AppError> {
        let mut cost_center = self
            .repo
            .find_cost_center(id)
            .await?
            .ok_or(AppError::NotFound(Resource::CostCenter))?;

        let mut check = FieldCheck::new();
        if let Some(name) = &payload.name {
            check.fail_if(self.repo.cost_center_name_taken(name, Some(id)).await?, "name", "taken");
        }
        if let Some(contract_type_id) = payload.contract_type_id {
            check.fail_if(
                !self.repo.contract_type_exists(contract_type_id).await?,
                "contract_type_id",
                "not_found",
            );
        }
        check.finish()?;

        payload.apply_to(&mut cost_center);
        let updated = self.repo.update_cost_center(&cost_center).await?;
        self.one_with_contract_type(updated).await
    }

    pub async fn delete_cost_center(&self, id: i64) -> Result<(), AppError> {
        if self.repo.delete_cost_center(id).await? == 0 {
            return Err(AppError::NotFound(Resource::CostCenter));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::services::fixtures;

    #[sqlx::test(migrations = "./migrations")]
    async fn created_farm_can_be_read_back(pool: PgPool) {
        let service = fixtures::state(pool).catalog_service;

        let farm = service
            .create_farm(&CreateFarmPayload {
                name: "La Esperanza".into(),
                active: None,
            })
            .await
            .unwrap();
        assert!(farm.active);

        let found = service.get_farm(farm.id).await.unwrap();
        assert_eq!(found.name, "La Esperanza");

        let page = service
            .list_farms(&ActiveFilter { active: Some(true) }, PageRequest { page: 1, per_page: 15 })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn color_name_and_code_must_be_unique(pool: PgPool) {
        fixtures::color(&pool, "Verde", "#00FF00").await;
        let service = fixtures::state(pool).catalog_service;

        let error = service
            .create_color(&CreateColorPayload {
                name: "Verde".into(),
                code: "#00FF00".into(),
                active: None,
            })
            .await
            .unwrap_err();
        let fields = fixtures::field_errors(error);
        assert_eq!(fields["name"], vec!["taken"]);
        assert_eq!(fields["code"], vec!["taken"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn renaming_a_farm_to_its_own_name_is_allowed(pool: PgPool) {
        let id = fixtures::named(&pool, "farms", "San Rafael").await;
        let other = fixtures::named(&pool, "farms", "El Prado").await;
        let service = fixtures::state(pool).catalog_service;

        let same = UpdateFarmPayload {
            name: Some("San Rafael".into()),
            active: Some(false),
        };
        let updated = service.update_farm(id, &same).await.unwrap();
        assert!(!updated.active);

        let clash = UpdateFarmPayload {
            name: Some("San Rafael".into()),
            active: None,
        };
        let error = service.update_farm(other, &clash).await.unwrap_err();
        assert_eq!(fixtures::field_errors(error)["name"], vec!["taken"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn farm_with_employees_cannot_be_deleted(pool: PgPool) {
        let contract_type = fixtures::named(&pool, "contract_types", "Fijo").await;
        let department = fixtures::department(&pool, "Cosecha", None).await;
        let structure = fixtures::org_structure(&pool, "Cortador", department).await;
        let employee = fixtures::employee(&pool, "A100", contract_type, structure).await;
        let farm = fixtures::named(&pool, "farms", "La Esperanza").await;
        fixtures::link_farm(&pool, employee, farm).await;
        let service = fixtures::state(pool).catalog_service;

        let error = service.delete_farm(farm).await.unwrap_err();
        assert!(matches!(error, AppError::HasDependents("farm.has_employees")));
        assert!(service.get_farm(farm).await.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn contract_type_used_by_a_cost_center_is_kept(pool: PgPool) {
        let contract_type = fixtures::named(&pool, "contract_types", "Temporal").await;
        let service = fixtures::state(pool).catalog_service;

        let cost_center = service
            .create_cost_center(&CreateCostCenterPayload {
                name: "Empaque".into(),
                active: None,
                group: Some("Campo".into()),
                contract_type_id: contract_type,
            })
            .await
            .unwrap();
        assert_eq!(
            cost_center.contract_type.map(|ct| ct.name),
            Some("Temporal".to_string())
        );

        let error = service.delete_contract_type(contract_type).await.unwrap_err();
        assert!(matches!(error, AppError::HasDependents("contract_type.in_use")));

        service.delete_cost_center(cost_center.cost_center.id).await.unwrap();
        service.delete_contract_type(contract_type).await.unwrap();
        assert!(matches!(
            service.get_contract_type(contract_type).await,
            Err(AppError::NotFound(Resource::ContractType))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn color_used_by_a_department_is_kept(pool: PgPool) {
        let color = fixtures::color(&pool, "Azul", "#0066CC").await;
        fixtures::department(&pool, "Riego", Some(color)).await;
        let service = fixtures::state(pool).catalog_service;

        let error = service.delete_color(color).await.unwrap_err();
        assert!(matches!(error, AppError::HasDependents("color.in_use")));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn cost_center_needs_an_existing_contract_type(pool: PgPool) {
        let service = fixtures::state(pool).catalog_service;
        let error = service
            .create_cost_center(&CreateCostCenterPayload {
                name: "Bodega".into(),
                active: None,
                group: None,
                contract_type_id: 9_999,
            })
            .await
            .unwrap_err();
        assert_eq!(fixtures::field_errors(error)["contract_type_id"], vec!["not_found"]);
    }
}
