pub mod membership_service;
pub mod package_service;
pub mod pricing;

pub use membership_service::*;
pub use package_service::*;
