pub mod checkout;
pub mod package;
pub mod quote;
pub mod subscription;

pub use checkout::*;
pub use package::*;
pub use quote::*;
pub use subscription::*;
