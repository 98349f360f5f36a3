//! SeaORM entities for the identity core.

pub mod session;
pub mod user;
