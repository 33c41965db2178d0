//! Seed the database with demo tags, museums and products.
//!
//! # Usage
//!
//! ```bash
//! tm-cli seed crates/cli/seed/demo.yaml --owner admin
//! ```
//!
//! The file names tags by `name`; museums refer to them through `tag_names`.
//! Museums are created by, and products sold by, the `--owner` user.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use tripmate_core::{TagId, UserId};
use tripmate_server::db::{RepositoryError, Stores};
use tripmate_server::models::{MuseumInput, ProductInput, Tag, TagInput};

use super::{CommandError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Cannot read {0}: {1}")]
    Read(String, std::io::Error),

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Owner not found: {0}")]
    OwnerNotFound(String),

    #[error("Museum {museum:?} refers to unknown tag {tag:?}")]
    UnknownTag { museum: String, tag: String },

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A museum plus the names of its tags.
#[derive(Debug, Deserialize)]
pub struct MuseumSeed {
    #[serde(flatten)]
    pub input: MuseumInput,
    #[serde(default)]
    pub tag_names: Vec<String>,
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub tags: Vec<TagInput>,
    #[serde(default)]
    pub museums: Vec<MuseumSeed>,
    #[serde(default)]
    pub products: Vec<ProductInput>,
}

impl SeedFile {
    /// Parse a YAML seed document.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` if the document does not match the format.
    pub fn parse(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Counts of inserted records.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub tags: usize,
    pub museums: usize,
    pub products: usize,
}

/// Resolve a museum's tag names to ids.
fn resolve_tags(
    museum: &MuseumSeed,
    by_name: &HashMap<String, TagId>,
) -> Result<Vec<TagId>, SeedError> {
    museum
        .tag_names
        .iter()
        .map(|name| {
            by_name
                .get(&name.to_lowercase())
                .copied()
                .ok_or_else(|| SeedError::UnknownTag {
                    museum: museum.input.name.clone(),
                    tag: name.clone(),
                })
        })
        .collect()
}

/// Insert everything in `seed` through `stores`.
///
/// Tags that already exist are reused rather than failing the run.
///
/// # Errors
///
/// Returns an error if a museum names an unknown tag or a write fails.
pub async fn apply(
    stores: &Stores,
    owner: UserId,
    seed: SeedFile,
) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    for input in seed.tags {
        match stores.tags.create(input).await {
            Ok(_) => summary.tags += 1,
            Err(RepositoryError::Conflict(what)) => warn!("Skipping existing tag: {what}"),
            Err(e) => return Err(e.into()),
        }
    }

    let by_name: HashMap<String, TagId> = stores
        .tags
        .list()
        .await?
        .into_iter()
        .map(|Tag { id, name, .. }| (name.to_lowercase(), id))
        .collect();

    for museum in seed.museums {
        let tags = resolve_tags(&museum, &by_name)?;
        let mut input = museum.input;
        input.tags.extend(tags);
        stores.museums.create(owner, input).await?;
        summary.museums += 1;
    }

    for input in seed.products {
        stores.products.create(owner, input).await?;
        summary.products += 1;
    }

    Ok(summary)
}

/// Seed from a YAML file as `owner` (username or email).
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the owner does not
/// exist, or database operations fail.
pub async fn run(file_path: &str, owner: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading seed data from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SeedError::Read(file_path.to_owned(), e))?;
    let seed = SeedFile::parse(&content)?;
    info!(
        tags = seed.tags.len(),
        museums = seed.museums.len(),
        products = seed.products.len(),
        "Parsed seed file"
    );

    let stores = Stores::postgres(connect().await?);
    let owner = stores
        .users
        .get_by_login(owner)
        .await?
        .ok_or_else(|| SeedError::OwnerNotFound(owner.to_owned()))?;

    let summary = apply(&stores, owner.id, seed).await?;

    info!("Seeding complete!");
    info!("  Tags inserted: {}", summary.tags);
    info!("  Museums inserted: {}", summary.museums);
    info!("  Products inserted: {}", summary.products);
    Ok(())
}
