//! In-tree chain families.

pub mod aave;
pub mod substrate;
