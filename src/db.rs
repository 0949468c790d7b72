pub mod user_repo;
pub use user_repo::UserRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod organization_repo;
pub use organization_repo::OrganizationRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
