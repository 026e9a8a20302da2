pub mod user_repo;
pub use user_repo::{UserRepository, UserStore};
pub mod business_repo;
pub use business_repo::{BusinessRepository, BusinessStore};

#[cfg(test)]
pub mod memory;
