//! provider schema documents
//!
//! Serde model of a `terraform providers schema -json` dump, plus the
//! [SchemaRegistry] that indexes it by parsed
//! [ProviderAddress]. The registry is built once per run and is
//! immutable afterwards; independent runs never share state.

use crate::provider::{AddressParseError, ProviderAddress};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;

/// Top level of a provider schema dump
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub format_version: String,
    #[serde(default)]
    pub provider_schemas: HashMap<String, ProviderSchema>,
}

/// Schemas declared by one provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSchema {
    #[serde(default)]
    pub resource_schemas: HashMap<String, ResourceSchema>,
}

/// Schema of one resource type
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceSchema {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub block: SchemaBlock,
}

impl ResourceSchema {
    /// Whether the resource type declares an attribute of this name
    pub fn declares_attribute(&self, name: &str) -> bool {
        self.block.attributes.contains_key(name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaBlock {
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeSchema {
    #[serde(rename = "type", default)]
    pub kind: AttributeKind,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub required: bool,
}

/// Declared attribute kind, collapsed from the cty type encoding.
///
/// The cty JSON encoding is either a plain string (`"string"`,
/// `"number"`, `"bool"`) or an array describing a collection or object
/// type. Everything non-scalar collapses to `Structured`; the engine
/// cannot render those either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum AttributeKind {
    String,
    Number,
    Bool,
    Structured,
}

impl Default for AttributeKind {
    fn default() -> Self {
        AttributeKind::Structured
    }
}

impl From<serde_json::Value> for AttributeKind {
    fn from(value: serde_json::Value) -> Self {
        match value.as_str() {
            Some("string") => AttributeKind::String,
            Some("number") => AttributeKind::Number,
            Some("bool") => AttributeKind::Bool,
            _ => AttributeKind::Structured,
        }
    }
}

/// Immutable mapping from provider address to its declared schemas
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    providers: HashMap<ProviderAddress, ProviderSchema>,
}

impl SchemaRegistry {
    /// Build a registry from `(source string, schema)` entries.
    ///
    /// Source strings parse into [ProviderAddress]es, so the short and
    /// full forms of the same address share one entry; later entries
    /// overwrite earlier ones.
    pub fn build<S>(
        entries: impl IntoIterator<Item = (S, ProviderSchema)>,
    ) -> Result<Self, AddressParseError>
    where
        S: AsRef<str>,
    {
        let mut providers = HashMap::new();

        for (source, schema) in entries {
            let address: ProviderAddress = source.as_ref().parse()?;
            tracing::debug!(%address, "registering provider schema");
            providers.insert(address, schema);
        }

        Ok(Self { providers })
    }

    pub fn from_document(document: SchemaDocument) -> Result<Self, AddressParseError> {
        Self::build(document.provider_schemas)
    }

    pub fn lookup(&self, address: &ProviderAddress) -> Option<&ProviderSchema> {
        self.providers.get(address)
    }
}
