//! SeaORM entities.

pub mod chord;
pub mod user;
