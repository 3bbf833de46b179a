pub mod membership;
pub mod webhook;

pub use membership::membership_config;
pub use webhook::webhook_config;
