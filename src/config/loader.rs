// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{RawShopFile, ShopFile};
use crate::errors::Result;

/// Load an instance file from a given path and return the raw `RawShopFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawShopFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawShopFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), "loaded instance file");

    Ok(raw)
}

/// Load an instance file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks routings, activity references and cycles, and item windows.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ShopFile> {
    let raw = load_from_path(&path)?;
    ShopFile::try_from(raw)
}

/// Same as [`load_and_validate`] for TOML already held in memory.
pub fn parse_and_validate(contents: &str) -> Result<ShopFile> {
    let raw: RawShopFile = toml::from_str(contents)?;
    ShopFile::try_from(raw)
}
