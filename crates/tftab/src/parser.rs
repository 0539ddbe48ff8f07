//! parser facade: resource lookup, block location, attribute evaluation
//!
//! [Parser] composes the module inventory, the schema registry and the
//! file cache. Its core operation, [Parser::resource_attributes],
//! bridges the schema-driven partial decode against the open
//! configuration grammar:
//!
//! 1. resolve the resource's provider local name to a
//!    [ProviderAddress] through the required-provider map
//! 2. look up the provider schema and the resource type schema
//! 3. locate the resource's declaration block in its own source file
//!    and partially decode it against the declared attribute names
//! 4. evaluate each requested attribute with an empty evaluation
//!    context
//!
//! Evaluation outcomes are classified strictly: a literal resolves to
//! its value, an expression referencing an undefined variable or
//! function resolves to [AttributeValue::Unknown], everything else -
//! missing attribute, non-primitive result, genuinely invalid
//! expression - is a hard error that aborts the resource's whole
//! attribute batch. There is no partial row.

use crate::module::{LoadError, ManagedResource, Module};
use crate::provider::{AddressParseError, ProviderAddress};
use crate::schema::{ResourceSchema, SchemaRegistry};
use crate::source::{BlockBody, FileCache, ParseError, SourceFile};
use crate::value::AttributeValue;
use hcl::eval::{Context, Evaluate};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("provider {provider:?} is not configured in required_providers for {resource}")]
    ProviderNotConfigured { resource: String, provider: String },
    #[error(transparent)]
    Address(#[from] AddressParseError),
    #[error("no schema for provider {address}")]
    ProviderSchemaNotFound { address: ProviderAddress },
    #[error("no schema for resource type {resource_type:?} from provider {address}")]
    ResourceSchemaNotFound {
        address: ProviderAddress,
        resource_type: String,
    },
    #[error("resource block for {resource} not found in {path:?}")]
    BlockNotFound { resource: String, path: PathBuf },
    #[error("attribute {attribute:?} not found for resource {resource}")]
    AttributeNotFound { resource: String, attribute: String },
    #[error("attribute {attribute:?} for resource {resource} is not a primitive type")]
    UnsupportedAttributeType { resource: String, attribute: String },
    #[error("failed to evaluate attribute {attribute:?} for resource {resource}")]
    Evaluation {
        resource: String,
        attribute: String,
        #[source]
        source: hcl::eval::Errors,
    },
    #[error("failed to parse source file")]
    Parse(#[from] ParseError),
}

#[derive(Debug)]
pub struct Parser {
    module: Module,
    registry: SchemaRegistry,
    cache: FileCache,
}

impl Parser {
    /// Load the module at `dir` and compose it with `registry`.
    /// Both are immutable for the lifetime of the parser.
    pub fn new(dir: &Path, registry: SchemaRegistry) -> Result<Self, LoadError> {
        let cache = FileCache::default();
        let module = Module::load(dir, &cache)?;

        Ok(Self {
            module,
            registry,
            cache,
        })
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Resources of the given type, sorted ascending by name
    pub fn resources_of_type(&self, resource_type: &str) -> Vec<&ManagedResource> {
        self.module.resources_of_type(resource_type)
    }

    /// Resolve the requested attributes of a resource to typed values.
    ///
    /// The result covers exactly the requested names, in request
    /// order. Resolution is atomic per resource: the first hard
    /// failure aborts the whole batch. An attribute whose expression
    /// references values only known at a later provisioning stage
    /// resolves to [AttributeValue::Unknown] instead of failing.
    pub fn resource_attributes(
        &self,
        resource: &ManagedResource,
        attributes: &[String],
    ) -> Result<IndexMap<String, AttributeValue>, ResolveError> {
        let schema = self.resource_schema(resource)?;

        let file = self.cache.get(&resource.pos.path)?;
        let body = locate_block(&file, resource)?;

        let decoded = body.partial_attributes(|name| schema.declares_attribute(name));

        let mut values = IndexMap::with_capacity(attributes.len());
        for attribute in attributes {
            let Some(expr) = decoded.get(attribute) else {
                return Err(ResolveError::AttributeNotFound {
                    resource: resource.addr(),
                    attribute: attribute.clone(),
                });
            };

            values.insert(attribute.clone(), evaluate(expr, resource, attribute)?);
        }

        Ok(values)
    }

    fn resource_schema(&self, resource: &ManagedResource) -> Result<&ResourceSchema, ResolveError> {
        let source = self
            .module
            .required_providers
            .get(&resource.provider_name)
            .and_then(|provider| provider.source.as_deref())
            .ok_or_else(|| ResolveError::ProviderNotConfigured {
                resource: resource.addr(),
                provider: resource.provider_name.clone(),
            })?;

        let address: ProviderAddress = source.parse()?;

        let provider = self
            .registry
            .lookup(&address)
            .ok_or_else(|| ResolveError::ProviderSchemaNotFound {
                address: address.clone(),
            })?;

        provider
            .resource_schemas
            .get(&resource.resource_type)
            .ok_or_else(|| ResolveError::ResourceSchemaNotFound {
                address,
                resource_type: resource.resource_type.clone(),
            })
    }
}

/// Find the resource's declaration block in its own source file.
///
/// Absence means the inventory and the source disagree; that is an
/// invariant violation, not a per-attribute condition.
fn locate_block<'a>(
    file: &'a SourceFile,
    resource: &ManagedResource,
) -> Result<BlockBody<'a>, ResolveError> {
    file.resource_blocks()
        .into_iter()
        .find(|block| {
            block.resource_type == resource.resource_type && block.name == resource.name
        })
        .map(|block| block.body)
        .ok_or_else(|| ResolveError::BlockNotFound {
            resource: resource.addr(),
            path: resource.pos.path.clone(),
        })
}

fn evaluate(
    expr: &hcl::Expression,
    resource: &ManagedResource,
    attribute: &str,
) -> Result<AttributeValue, ResolveError> {
    // empty context: no variables, no functions
    let context = Context::new();

    let mut reduced = expr.clone();
    if let Err(errors) = reduced.evaluate_in_place(&context) {
        if errors.iter().all(is_unresolved_reference) {
            tracing::debug!(
                resource = %resource.addr(),
                attribute,
                "attribute is not statically known"
            );
            return Ok(AttributeValue::Unknown(hcl::format::to_string(expr).ok()));
        }

        return Err(ResolveError::Evaluation {
            resource: resource.addr(),
            attribute: attribute.to_string(),
            source: errors,
        });
    }

    match reduced {
        hcl::Expression::String(s) => Ok(AttributeValue::String(s)),
        hcl::Expression::Bool(b) => Ok(AttributeValue::Bool(b)),
        // f64 conversion loses precision above 2^53; inherited,
        // documented behavior
        hcl::Expression::Number(n) => Ok(AttributeValue::Number(
            n.as_f64().expect("hcl numbers are representable as f64"),
        )),
        _ => Err(ResolveError::UnsupportedAttributeType {
            resource: resource.addr(),
            attribute: attribute.to_string(),
        }),
    }
}

/// Whether the error means "refers to something that only exists at a
/// later provisioning stage" rather than "the expression is invalid"
fn is_unresolved_reference(error: &hcl::eval::Error) -> bool {
    matches!(
        error.kind(),
        hcl::eval::ErrorKind::UndefinedVar(_) | hcl::eval::ErrorKind::UndefinedFunc(_)
    )
}
