//! Book data exchanged with the upstreams and returned to the UI
//!
//! Upstream records are kept as the JSON objects they arrived as and re-emitted
//! unchanged: absent fields stay absent and `null` fields stay `null`. The few
//! fields the gateway reads are exposed through accessors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a ranking (bestseller) list
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RankedItem {
    fields: Map<String, Value>,
}

impl RankedItem {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Raw upstream record
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }

    pub fn rank(&self) -> Option<u64> {
        self.get("rank").and_then(Value::as_u64)
    }

    /// Catalog lookup key: `primary_isbn13` if present, else `primary_isbn10`
    ///
    /// Empty or whitespace-only identifiers count as absent, as do
    /// identifiers that are not strings.
    pub fn lookup_key(&self) -> Option<&str> {
        ["primary_isbn13", "primary_isbn10"]
            .into_iter()
            .filter_map(|field| self.get(field).and_then(Value::as_str))
            .map(str::trim)
            .find(|isbn| !isbn.is_empty())
    }
}

impl From<Map<String, Value>> for RankedItem {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// A catalog volume record (the enrichment for a ranked item)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CatalogVolume {
    fields: Map<String, Value>,
}

impl CatalogVolume {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    /// `volumeInfo.title`
    pub fn title(&self) -> Option<&str> {
        self.get("volumeInfo")
            .and_then(|info| info.get("title"))
            .and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for CatalogVolume {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Catalog `volumes` listing: search results or ISBN matches
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSearchPage {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub items: Vec<CatalogVolume>,
}

/// Free-text catalog search parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeQuery {
    pub query: String,
    pub max_results: u32,
    pub start_index: u32,
}

/// A ranked item paired with its catalog enrichment, in rank order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedResult {
    pub ranking: RankedItem,
    /// `null` when the lookup found nothing or failed
    pub enrichment: Option<CatalogVolume>,
}
