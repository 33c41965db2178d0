//! Tags classify activities, itineraries and museums.

use serde::{Deserialize, Serialize};

use tripmate_core::{TagId, TagKind};

/// A tag (domain type). The target of reference population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub kind: TagKind,
}

/// Body of `POST /tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub name: String,
    #[serde(default)]
    pub kind: TagKind,
}
