// src/config/mod.rs

//! Instance files for shopsched.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an instance file from disk (`loader.rs`).
//! - Validate routing tables, project networks and dispatch pools
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_and_validate};
pub use model::{
    ActivityConfig, ConfigSection, ItemConfig, JobConfig, RawShopFile, RoutingStepConfig, ShopFile,
};
pub use validate::validate_shop_file;
