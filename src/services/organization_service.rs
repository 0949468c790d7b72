// src/services/organization_service.rs

use std::collections::HashMap;

use sqlx::PgPool;

use crate::{
    common::{
        db_utils::missing_ids,
        error::{AppError, Resource},
        query::{PageRequest, Paginated},
        validation::FieldCheck,
    },
    db::{CatalogRepository, OrganizationRepository},
    models::{
        catalog::Color,
        organization::{
            CreateDepartmentPayload, CreateOrgStructurePayload, Department, DepartmentFilters,
            DepartmentResponse, OrgStructure, OrgStructureFilters, OrgStructureResponse,
            UpdateDepartmentPayload, UpdateOrgStructurePayload,
        },
    },
    services::group_by,
};

#[derive(Clone)]
pub struct OrganizationService {
    repo: OrganizationRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl OrganizationService {
    pub fn new(repo: OrganizationRepository, catalog_repo: CatalogRepository, pool: PgPool) -> Self {
        Self {
            repo,
            catalog_repo,
            pool,
        }
    }

    // ---
    // Departamentos
    // ---

    // Cores dos departamentos numa única consulta
    async fn colors_for<'a>(
        &self,
        departments: impl Iterator<Item = &'a Department>,
    ) -> Result<HashMap<i64, Color>, AppError> {
        let mut color_ids: Vec<i64> = departments.filter_map(|d| d.color_id).collect();
        color_ids.sort_unstable();
        color_ids.dedup();
        Ok(self
            .catalog_repo
            .find_colors(&color_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect())
    }

    async fn department_responses(
        &self,
        departments: Vec<Department>,
        with_structures: bool,
    ) -> Result<Vec<DepartmentResponse>, AppError> {
        let colors = self.colors_for(departments.iter()).await?;

        let mut structures: HashMap<i64, Vec<OrgStructure>> = HashMap::new();
        if with_structures {
            let ids: Vec<i64> = departments.iter().map(|d| d.id).collect();
            for structure in self.repo.org_structures_for_departments(&ids).await? {
                structures.entry(structure.department_id).or_default().push(structure);
            }
        }

        Ok(departments
            .into_iter()
            .map(|department| DepartmentResponse {
                color: department.color_id.and_then(|id| colors.get(&id).cloned()),
                org_structures: with_structures
                    .then(|| structures.remove(&department.id).unwrap_or_default()),
                department,
            })
            .collect())
    }

    async fn department_response(
        &self,
        department: Department,
        with_structures: bool,
    ) -> Result<DepartmentResponse, AppError> {
        self.department_responses(vec![department], with_structures)
            .await?
            .pop()
            .ok_or(AppError::NotFound(Resource::Department))
    }

    async fn find_department(&self, id: i64) -> Result<Department, AppError> {
        self.repo
            .find_department(id)
            .await?
            .ok_or(AppError::NotFound(Resource::Department))
    }

    pub async fn list_departments(
        &self,
        filters: &DepartmentFilters,
        page: PageRequest,
    ) -> Result<Paginated<DepartmentResponse>, AppError> {
        let (departments, total) = self.repo.list_departments(filters, page).await?;
        let data = self
            .department_responses(departments, filters.with_structures.unwrap_or(false))
            .await?;
        Ok(Paginated::new(data, page, total))
    }

    pub async fn get_department(&self, id: i64, with_structures: bool) -> Result<DepartmentResponse, AppError> {
        let department = self.find_department(id).await?;
        self.department_response(department, with_structures).await
    }

    pub async fn create_department(&self, payload: &CreateDepartmentPayload) -> Result<DepartmentResponse, AppError> {
        let mut check = FieldCheck::new();
        check.fail_if(self.repo.department_name_taken(&payload.name, None).await?, "name", "taken");
        if let Some(color_id) = payload.color_id {
            check.fail_if(!self.catalog_repo.color_exists(color_id).await?, "color_id", "not_found");
        }
        check.finish()?;

        let department = self
            .repo
            .create_department(&payload.name, payload.color_id, payload.active.unwrap_or(true))
            .await?;
        self.department_response(department, false).await
    }

    pub async fn update_department(
        &self,
        id: i64,
        payload: &UpdateDepartmentPayload,
    ) -> Result<DepartmentResponse, AppError> {
        let mut department = self.find_department(id).await?;

        let mut check = FieldCheck::new();
        if let Some(name) = &payload.name {
            check.fail_if(self.repo.department_name_taken(name, Some(id)).await?, "name", "taken");
        }
        if let Some(Some(color_id)) = payload.color_id {
            check.fail_if(!self.catalog_repo.color_exists(color_id).await?, "color_id", "not_found");
        }
        check.finish()?;

        payload.apply_to(&mut department);
        let updated = self.repo.update_department(&department).await?;
        self.department_response(updated, false).await
    }

    pub async fn delete_department(&self, id: i64) -> Result<(), AppError> {
        self.find_department(id).await?;
        if self.repo.department_has_structures(id).await? {
            return Err(AppError::HasDependents("department.has_structures"));
        }
        self.repo.delete_department(id).await?;
        Ok(())
    }

    // ---
    // Estrutura organizacional
    // ---

    async fn org_structure_responses(
        &self,
        org_structures: Vec<OrgStructure>,
        with_relations: bool,
    ) -> Result<Vec<OrgStructureResponse>, AppError> {
        if !with_relations {
            return Ok(org_structures.into_iter().map(OrgStructureResponse::from).collect());
        }

        let mut department_ids: Vec<i64> = org_structures.iter().map(|o| o.department_id).collect();
        department_ids.sort_unstable();
        department_ids.dedup();
        let departments: HashMap<i64, Department> = self
            .repo
            .find_departments(&department_ids)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        let ids: Vec<i64> = org_structures.iter().map(|o| o.id).collect();
        let rows = self.repo.access_departments_for(&ids).await?;
        let access: HashMap<i64, Vec<Department>> = group_by(rows, |row| row.org_structure_id);
        let colors = self.colors_for(access.values().flatten()).await?;
        let mut access: HashMap<i64, Vec<DepartmentResponse>> = access
            .into_iter()
            .map(|(owner, list)| {
                let list = list
                    .into_iter()
                    .map(|department| DepartmentResponse {
                        color: department.color_id.and_then(|id| colors.get(&id).cloned()),
                        org_structures: None,
                        department,
                    })
                    .collect();
                (owner, list)
            })
            .collect();

        Ok(org_structures
            .into_iter()
            .map(|org_structure| OrgStructureResponse {
                department: departments.get(&org_structure.department_id).cloned(),
                access_departments: Some(access.remove(&org_structure.id).unwrap_or_default()),
                org_structure,
            })
            .collect())
    }

    async fn org_structure_response(
        &self,
        org_structure: OrgStructure,
        with_relations: bool,
    ) -> Result<OrgStructureResponse, AppError> {
        self.org_structure_responses(vec![org_structure], with_relations)
            .await?
            .pop()
            .ok_or(AppError::NotFound(Resource::OrgStructure))
    }

    async fn find_org_structure(&self, id: i64) -> Result<OrgStructure, AppError> {
        self.repo
            .find_org_structure(id)
            .await?
            .ok_or(AppError::NotFound(Resource::OrgStructure))
    }

    async fn check_access_departments(&self, check: &mut FieldCheck, ids: &[i64]) -> Result<(), AppError> {
        let found = self.repo.existing_department_ids(ids).await?;
        check.fail_if(!missing_ids(ids, &found).is_empty(), "access_departments", "not_found");
        Ok(())
    }

    pub async fn list_org_structures(
        &self,
        filters: &OrgStructureFilters,
        page: PageRequest,
    ) -> Result<Paginated<OrgStructureResponse>, AppError> {
        let (org_structures, total) = self.repo.list_org_structures(filters, page).await?;
        let data = self
            .org_structure_responses(org_structures, filters.with_relations.unwrap_or(false))
            .await?;
        Ok(Paginated::new(data, page, total))
    }

    pub async fn get_org_structure(&self, id: i64, with_relations: bool) -> Result<OrgStructureResponse, AppError> {
        let org_structure = self.find_org_structure(id).await?;
        self.org_structure_response(org_structure, with_relations).await
    }

    pub async fn create_org_structure(
        &self,
        payload: &CreateOrgStructurePayload,
    ) -> Result<OrgStructureResponse, AppError> {
        let mut check = FieldCheck::new();
        check.fail_if(
            !self.repo.department_exists(payload.department_id).await?,
            "department_id",
            "not_found",
        );
        if let Some(ids) = &payload.access_departments {
            self.check_access_departments(&mut check, ids).await?;
        }
        check.finish()?;

        let mut tx = self.pool.begin().await?;
        let org_structure = self
            .repo
            .create_org_structure(
                &mut *tx,
                &payload.position,
                payload.department_id,
                payload.active.unwrap_or(true),
            )
            .await?;
        if let Some(ids) = &payload.access_departments {
            self.repo.sync_access(&mut *tx, org_structure.id, ids).await?;
        }
        tx.commit().await?;

        tracing::info!(org_structure_id = org_structure.id, "cargo da estrutura criado");
        self.org_structure_response(org_structure, true).await
    }

    pub async fn update_org_structure(
        &self,
        id: i64,
        payload: &UpdateOrgStructurePayload,
    ) -> Result<OrgStructureResponse, AppError> {
        let mut org_structure = self.find_org_structure(id).await?;

        let mut check = FieldCheck::new();
        if let Some(department_id) = payload.department_id {
            check.fail_if(
                !self.repo.department_exists(department_id).await?,
                "department_id",
                "not_found",
            );
        }
        if let Some(ids) = &payload.access_departments {
            self.check_access_departments(&mut check, ids).await?;
        }
        check.finish()?;

        payload.apply_to(&mut org_structure);

        let mut tx = self.pool.begin().await?;
        let updated = self.repo.update_org_structure(&mut *tx, &org_structure).await?;
        if let Some(ids) = &payload.access_departments {
            self.repo.sync_access(&mut *tx, id, ids).await?;
        }
        tx.commit().await?;

        self.org_structure_response(updated, true).await
    }

    // Substitui todo o conjunto de departamentos acessíveis
    pub async fn update_access(&self, id: i64, department_ids: &[i64]) -> Result<OrgStructureResponse, AppError> {
        let org_structure = self.find_org_structure(id).await?;

        let mut check = FieldCheck::new();
        self.check_access_departments(&mut check, department_ids).await?;
        check.finish()?;

        let mut tx = self.pool.begin().await?;
        self.repo.sync_access(&mut *tx, id, department_ids).await?;
        tx.commit().await?;

        self.org_structure_response(org_structure, true).await
    }

    pub async fn badge_colors(&self, id: i64) -> Result<Vec<Color>, AppError> {
        self.find_org_structure(id).await?;
        self.repo.badge_colors(id).await
    }

    pub async fn delete_org_structure(&self, id: i64) -> Result<(), AppError> {
        self.find_org_structure(id).await?;
        if self.repo.org_structure_has_employees(id).await? {
            return Err(AppError::HasDependents("org_structure.has_employees"));
        }

        let mut tx = self.pool.begin().await?;
        self.repo.detach_access(&mut *tx, id).await?;
        self.repo.delete_org_structure(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(org_structure_id = id, "cargo da estrutura removido");
        Ok(())
    }
}
