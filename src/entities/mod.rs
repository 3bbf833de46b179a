pub mod checkout_sessions;
pub mod packages;
pub mod subscriptions;
pub mod upgrade_logs;
pub mod users;
