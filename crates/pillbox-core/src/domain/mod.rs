//! Pillbox EHR 도메인 모델.

mod account;
mod audit;
mod principal;
mod profile;
mod role;

pub use account::*;
pub use audit::*;
pub use principal::*;
pub use profile::*;
pub use role::*;
