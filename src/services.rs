pub mod auth;
pub mod business_service;
pub mod rbac_service;
pub mod staff_service;
