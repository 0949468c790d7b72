pub mod auth;
pub mod catalog;
pub mod employee;
pub mod organization;
pub mod rbac;
pub mod users;
