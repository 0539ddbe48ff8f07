//! provider source addresses
//!
//! A provider source string names the provider a schema comes from.
//! The full form is `hostname/namespace/type`. Shorter forms default
//! the hostname to the public registry and the namespace to
//! `hashicorp`, the same defaulting terraform applies:
//!
//! - `aws` -> `registry.terraform.io/hashicorp/aws`
//! - `test/test` -> `registry.terraform.io/test/test`

use std::str::FromStr;

pub const DEFAULT_REGISTRY_HOST: &str = "registry.terraform.io";
pub const DEFAULT_NAMESPACE: &str = "hashicorp";

/// A structurally compared provider address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderAddress {
    pub hostname: String,
    pub namespace: String,
    pub provider_type: String,
}

impl ProviderAddress {
    pub fn new(
        hostname: impl Into<String>,
        namespace: impl Into<String>,
        provider_type: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            namespace: namespace.into(),
            provider_type: provider_type.into(),
        }
    }
}

impl FromStr for ProviderAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('/').collect();

        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(AddressParseError {
                input: s.to_string(),
                reason: "empty address segment",
            });
        }

        match segments.as_slice() {
            [provider_type] => Ok(Self::new(
                DEFAULT_REGISTRY_HOST,
                DEFAULT_NAMESPACE,
                *provider_type,
            )),
            [namespace, provider_type] => {
                Ok(Self::new(DEFAULT_REGISTRY_HOST, *namespace, *provider_type))
            }
            [hostname, namespace, provider_type] => {
                Ok(Self::new(*hostname, *namespace, *provider_type))
            }
            _ => Err(AddressParseError {
                input: s.to_string(),
                reason: "expected at most three segments",
            }),
        }
    }
}

impl std::fmt::Display for ProviderAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.hostname, self.namespace, self.provider_type
        )
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid provider source address {input:?}: {reason}")]
pub struct AddressParseError {
    pub input: String,
    pub reason: &'static str,
}
