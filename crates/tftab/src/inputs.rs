//! resource-type request input
//!
//! The set of tables to generate is requested as YAML, a list of
//! resource types with the attributes to document:
//!
//! ```yaml
//! - name: aws_instance
//!   attributes:
//!     - ami
//!     - instance_type
//! ```

use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("Unable to parse resource types input")]
    Yaml(#[from] serde_yaml::Error),
    #[error("No resource types defined")]
    NoResourceTypes,
    #[error("No attributes defined for resource type {name:?}")]
    NoAttributes { name: String },
}

/// One requested table: a resource type and the attribute columns
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceTypeSpec {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// Parse and validate the YAML request list.
///
/// An empty request is rejected: generating nothing is always a
/// configuration mistake. Every requested type must name at least one
/// attribute column.
pub fn parse_resource_types(input: &str) -> Result<Vec<ResourceTypeSpec>, InputError> {
    if input.trim().is_empty() {
        return Err(InputError::NoResourceTypes);
    }

    let specs: Vec<ResourceTypeSpec> = serde_yaml::from_str(input)?;

    if specs.is_empty() {
        return Err(InputError::NoResourceTypes);
    }

    for spec in &specs {
        if spec.attributes.is_empty() {
            return Err(InputError::NoAttributes {
                name: spec.name.clone(),
            });
        }
    }

    Ok(specs)
}
