pub mod xendit;

pub use xendit::XenditService;
