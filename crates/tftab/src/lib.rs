//! # tftab - terraform resource attribute tables
//!
//! Generates markdown tables that document terraform resources by
//! statically resolving attribute values straight from configuration
//! source, without evaluating against live state.
//!
//! ### HCL Terms
//!
//! Quick introduction to terms used to describe elements of HCL documents.
//!
//! In hcl terms...
//! - a file gets parsed as a `body`
//! - ...which is just a list of `structures`
//! - ...where there are two kinds:
//!   - `attribute`: a "key = value" pair
//!   - or `block`:
//!     - 1 `identifier`
//!     - followed by 0 or more `labels`
//!     - and a `body` enclosed in `{` and `}`
//!
//! A terraform resource is a `resource` block with two labels, the
//! resource type and the resource name:
//! ```hcl
//! resource "aws_instance" "web" {
//!   ami = "ami-12345678"
//! }
//! ```
//!
//! The same declaration exists in a JSON flavor (`*.tf.json` files),
//! where the block becomes nested object keys.
//!
//! ### Pipeline
//!
//! - [schema::SchemaRegistry] indexes a provider schema dump
//!   (`terraform providers schema -json`) by parsed
//!   [provider::ProviderAddress]
//! - [module::Module] inventories the managed resources and the
//!   required-provider map declared in a configuration directory
//! - [source::FileCache] lazily parses and memoizes source files,
//!   dispatching grammar by file extension
//! - [parser::Parser] locates each resource's declaration block,
//!   partially decodes it against the provider schema and evaluates
//!   the requested attributes to [value::AttributeValue]s
//! - [markdown] renders the resulting rows as one table per resource
//!   type and merges them into an output document between comment
//!   fences
//!
//! ### Evaluation
//!
//! Expressions are evaluated with an empty [hcl::eval::Context]: no
//! variables, no resources, no functions. Only literals and purely
//! literal operations resolve to a value. An expression that refers to
//! anything else - an input variable, another resource, a function -
//! resolves to [value::AttributeValue::Unknown]. `Unknown` is a
//! first-class result, distinct from both an error and a missing
//! attribute.

pub mod inputs;
pub mod markdown;
pub mod module;
pub mod parser;
pub mod provider;
pub mod schema;
pub mod source;
pub mod value;
