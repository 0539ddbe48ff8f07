//! parsed configuration source files
//!
//! [FileCache] lazily parses and memoizes the syntax tree of each
//! source file. Grammar dispatch follows the file extension: `.json`
//! files (in practice `*.tf.json`) use the JSON flavor, everything
//! else the native flavor parsed by [hcl_edit].
//!
//! [SourceFile] presents both flavors behind one surface: top-level
//! `resource` blocks, the required-provider declarations, and a
//! schema-driven partial decode of a block body into evaluable
//! [hcl::Expression]s.

use hcl_edit::Span;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse hcl file")]
    Hcl(#[from] hcl_edit::parser::Error),
    #[error("Unable to parse json file")]
    Json(#[from] serde_json::Error),
}

/// One parsed configuration file, in either source flavor
#[derive(Debug)]
pub enum SourceFile {
    Native {
        text: String,
        body: hcl_edit::structure::Body,
    },
    Json {
        text: String,
        value: serde_json::Value,
    },
}

impl SourceFile {
    pub fn parse(path: &Path) -> Result<Self, ParseError> {
        let text = std::fs::read_to_string(path)?;

        if path.extension().is_some_and(|ext| ext == "json") {
            let value = serde_json::from_str(&text)?;
            Ok(SourceFile::Json { text, value })
        } else {
            let body = hcl_edit::parser::parse_body(&text)?;
            Ok(SourceFile::Native { text, body })
        }
    }

    /// Top-level `resource` blocks with exactly two labels
    /// (resource type, resource name), in declaration order.
    pub fn resource_blocks(&self) -> Vec<ResourceBlock<'_>> {
        let mut found = Vec::new();

        match self {
            SourceFile::Native { text, body } => {
                for block in body.blocks() {
                    if block.ident.value().as_str() != "resource" || block.labels.len() != 2 {
                        continue;
                    }

                    let offset = block.span().map_or(0, |span| span.start);
                    found.push(ResourceBlock {
                        resource_type: block.labels[0].as_str(),
                        name: block.labels[1].as_str(),
                        line: line_of(text, offset),
                        body: BlockBody::Native(&block.body),
                    });
                }
            }
            SourceFile::Json { text, value } => {
                let Some(resources) = value.get("resource").and_then(|v| v.as_object()) else {
                    return found;
                };

                for (resource_type, names) in resources {
                    let Some(names) = names.as_object() else {
                        continue;
                    };

                    for (name, body) in names {
                        let Some(body) = body.as_object() else {
                            continue;
                        };

                        found.push(ResourceBlock {
                            resource_type,
                            name,
                            line: json_key_line(text, resource_type, name),
                            body: BlockBody::Json(body),
                        });
                    }
                }
            }
        }

        found
    }

    /// Local provider names declared in
    /// `terraform { required_providers { ... } }` blocks, with their
    /// source address string when one is declared.
    pub fn required_providers(&self) -> Vec<(String, Option<String>)> {
        let mut found = Vec::new();

        match self {
            SourceFile::Native { body, .. } => {
                for terraform in body.blocks() {
                    if terraform.ident.value().as_str() != "terraform" {
                        continue;
                    }

                    for required in terraform.body.blocks() {
                        if required.ident.value().as_str() != "required_providers" {
                            continue;
                        }

                        for attribute in required.body.attributes() {
                            let expr: hcl::Expression = attribute.value.clone().into();
                            found.push((
                                attribute.key.value().as_str().to_string(),
                                declared_source(&expr),
                            ));
                        }
                    }
                }
            }
            SourceFile::Json { value, .. } => {
                let required = value
                    .get("terraform")
                    .and_then(|v| v.as_object())
                    .and_then(|terraform| terraform.get("required_providers"))
                    .and_then(|v| v.as_object());

                let Some(required) = required else {
                    return found;
                };

                for (name, declaration) in required {
                    let source = declaration
                        .as_object()
                        .and_then(|d| d.get("source"))
                        .and_then(|s| s.as_str())
                        .map(str::to_string);
                    found.push((name.clone(), source));
                }
            }
        }

        found
    }
}

/// A located resource declaration block
#[derive(Debug, Clone, Copy)]
pub struct ResourceBlock<'a> {
    pub resource_type: &'a str,
    pub name: &'a str,
    pub line: usize,
    pub body: BlockBody<'a>,
}

/// A block body supporting schema-driven partial decoding
#[derive(Debug, Clone, Copy)]
pub enum BlockBody<'a> {
    Native(&'a hcl_edit::structure::Body),
    Json(&'a serde_json::Map<String, serde_json::Value>),
}

impl BlockBody<'_> {
    /// Partial decode: the attributes of this body for which
    /// `declared` holds, as evaluable expressions. Everything else in
    /// the body - undeclared attributes, nested blocks - is ignored.
    pub fn partial_attributes(
        &self,
        declared: impl Fn(&str) -> bool,
    ) -> IndexMap<String, hcl::Expression> {
        match self {
            BlockBody::Native(body) => body
                .attributes()
                .filter(|attribute| declared(attribute.key.value().as_str()))
                .map(|attribute| {
                    (
                        attribute.key.value().as_str().to_string(),
                        attribute.value.clone().into(),
                    )
                })
                .collect(),
            BlockBody::Json(map) => map
                .iter()
                .filter(|(key, _)| declared(key))
                .map(|(key, value)| (key.clone(), json_expr(value)))
                .collect(),
        }
    }

    /// Root name of an explicit `provider = <ref>` attribute, if any.
    /// An alias (`aws.secondary`) reduces to its root name.
    pub fn provider_reference(&self) -> Option<String> {
        match self {
            BlockBody::Native(body) => {
                let attribute = body
                    .attributes()
                    .find(|attribute| attribute.key.value().as_str() == "provider")?;

                match hcl::Expression::from(attribute.value.clone()) {
                    hcl::Expression::Variable(variable) => Some(variable.as_str().to_string()),
                    hcl::Expression::Traversal(traversal) => match &traversal.expr {
                        hcl::Expression::Variable(variable) => {
                            Some(variable.as_str().to_string())
                        }
                        _ => None,
                    },
                    _ => None,
                }
            }
            BlockBody::Json(map) => map
                .get("provider")
                .and_then(|v| v.as_str())
                .and_then(|reference| reference.split('.').next())
                .map(str::to_string),
        }
    }
}

/// Extract the `source` string from a required_providers declaration.
///
/// Only the object form declares a source; a plain string is a version
/// constraint and leaves the source undeclared.
fn declared_source(expr: &hcl::Expression) -> Option<String> {
    let hcl::Expression::Object(object) = expr else {
        return None;
    };

    object
        .iter()
        .find(|(key, _)| object_key_name(key) == Some("source"))
        .and_then(|(_, value)| match value {
            hcl::Expression::String(source) => Some(source.clone()),
            _ => None,
        })
}

fn object_key_name(key: &hcl::ObjectKey) -> Option<&str> {
    match key {
        hcl::ObjectKey::Identifier(ident) => Some(ident.as_str()),
        hcl::ObjectKey::Expression(hcl::Expression::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

/// JSON flavor: scalars are literal; strings may carry template
/// interpolation, in which case they evaluate like native templates.
pub(crate) fn json_expr(value: &serde_json::Value) -> hcl::Expression {
    use hcl::Expression;

    match value {
        serde_json::Value::Null => Expression::Null,
        serde_json::Value::Bool(b) => Expression::Bool(*b),
        serde_json::Value::Number(n) => json_number(n),
        serde_json::Value::String(s) if s.contains("${") => {
            hcl::expr::TemplateExpr::QuotedString(s.clone()).into()
        }
        serde_json::Value::String(s) => Expression::String(s.clone()),
        serde_json::Value::Array(items) => {
            Expression::Array(items.iter().map(json_expr).collect())
        }
        serde_json::Value::Object(map) => Expression::Object(
            map.iter()
                .map(|(key, value)| {
                    (
                        hcl::ObjectKey::Expression(Expression::String(key.clone())),
                        json_expr(value),
                    )
                })
                .collect(),
        ),
    }
}

fn json_number(number: &serde_json::Number) -> hcl::Expression {
    if let Some(i) = number.as_i64() {
        return hcl::Number::from(i).into();
    }
    if let Some(u) = number.as_u64() {
        return hcl::Number::from(u).into();
    }

    // JSON numbers are finite, so from_f64 only misses on NaN/inf
    number
        .as_f64()
        .and_then(hcl::Number::from_f64)
        .map_or(hcl::Expression::Null, hcl::Expression::Number)
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())]
        .bytes()
        .filter(|b| *b == b'\n')
        .count()
        + 1
}

/// serde_json keeps no spans, so approximate the declaration position
/// by scanning the raw text: the `"resource"` key first, then the type
/// key and the name key after it. Still a heuristic - a colliding
/// string value between those keys shifts the anchor - but good enough
/// for a link target.
fn json_key_line(text: &str, resource_type: &str, name: &str) -> usize {
    let Some(resource_at) = text.find("\"resource\"") else {
        return 1;
    };

    let type_key = format!("\"{resource_type}\"");
    let Some(type_offset) = text[resource_at..].find(&type_key) else {
        return line_of(text, resource_at);
    };
    let type_at = resource_at + type_offset;

    let name_key = format!("\"{name}\"");
    match text[type_at..].find(&name_key) {
        Some(offset) => line_of(text, type_at + offset),
        None => line_of(text, type_at),
    }
}

type CacheSlot = Arc<RwLock<Option<Arc<SourceFile>>>>;

/// Lazily parsed, memoized source files.
///
/// Population is single-flight per path: the per-entry write lock is
/// held for the duration of the parse, so concurrent requests for the
/// same not-yet-cached path wait for one parse instead of duplicating
/// it, while requests for distinct paths proceed independently. Failed
/// parses are not cached; a later call re-parses.
#[derive(Debug, Default)]
pub struct FileCache {
    entries: Mutex<HashMap<PathBuf, CacheSlot>>,
}

impl FileCache {
    pub fn get(&self, path: &Path) -> Result<Arc<SourceFile>, ParseError> {
        let slot = {
            let mut entries = self.entries.lock().expect("file cache index poisoned");
            entries.entry(path.to_path_buf()).or_default().clone()
        };

        if let Some(file) = slot.read().expect("file cache entry poisoned").as_ref() {
            return Ok(Arc::clone(file));
        }

        let mut populate = slot.write().expect("file cache entry poisoned");
        if let Some(file) = populate.as_ref() {
            // populated while we waited for the write lock
            return Ok(Arc::clone(file));
        }

        tracing::debug!(path = %path.display(), "parsing file");
        let file = Arc::new(SourceFile::parse(path)?);
        *populate = Some(Arc::clone(&file));
        Ok(file)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hcl::eval::{Context, Evaluate};
    use pretty_assertions::assert_eq;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("write fixture");
        path
    }

    #[test]
    fn memoizes_successful_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "main.tf", "resource \"a\" \"b\" {}\n");

        let cache = FileCache::default();
        let first = cache.get(&path).unwrap();
        let second = cache.get(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn concurrent_gets_of_one_path_share_a_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "main.tf", "resource \"a\" \"b\" {}\n");

        let cache = FileCache::default();
        let files: Vec<Arc<SourceFile>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.get(&path).unwrap()))
                .collect();
            workers
                .into_iter()
                .map(|worker| worker.join().unwrap())
                .collect()
        });

        for file in &files[1..] {
            assert!(Arc::ptr_eq(&files[0], file));
        }
    }

    #[test]
    fn concurrent_gets_of_distinct_paths_resolve_independently() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..4)
            .map(|i| write_file(dir.path(), &format!("part{i}.tf"), "value = 1\n"))
            .collect();

        let cache = FileCache::default();
        let files: Vec<Arc<SourceFile>> = std::thread::scope(|scope| {
            let workers: Vec<_> = paths
                .iter()
                .map(|path| {
                    let cache = &cache;
                    scope.spawn(move || cache.get(path).unwrap())
                })
                .collect();
            workers
                .into_iter()
                .map(|worker| worker.join().unwrap())
                .collect()
        });

        assert_eq!(files.len(), paths.len());
        for (left, right) in files.iter().zip(files.iter().skip(1)) {
            assert!(!Arc::ptr_eq(left, right));
        }
    }

    #[test]
    fn failed_parses_are_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "main.tf", "not = valid = hcl");

        let cache = FileCache::default();
        assert!(cache.get(&path).is_err());

        std::fs::write(&path, "valid = 1\n").unwrap();
        assert!(cache.get(&path).is_ok());
    }

    #[test]
    fn reparsing_yields_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "main.tf",
            "resource \"test_resource\" \"test\" {\n  foo = \"bar\"\n}\n",
        );

        let decode = |file: &SourceFile| {
            file.resource_blocks()[0]
                .body
                .partial_attributes(|name| name == "foo")
        };

        let first = FileCache::default().get(&path).unwrap();
        let second = FileCache::default().get(&path).unwrap();

        assert_eq!(decode(&first), decode(&second));
    }

    #[test]
    fn dispatches_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "main.tf.json",
            r#"{"resource": {"test_resource": {"test": {"foo": "bar"}}}}"#,
        );

        let file = FileCache::default().get(&path).unwrap();
        assert!(matches!(file.as_ref(), SourceFile::Json { .. }));

        let blocks = file.resource_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].resource_type, "test_resource");
        assert_eq!(blocks[0].name, "test");
    }

    #[test]
    fn native_blocks_carry_their_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "main.tf",
            "# comment\n\nresource \"test_resource\" \"test\" {\n  foo = 1\n}\n",
        );

        let file = FileCache::default().get(&path).unwrap();
        let blocks = file.resource_blocks();
        assert_eq!(blocks[0].line, 3);
    }

    #[test]
    fn json_block_line_ignores_earlier_value_collisions() {
        // the resource type string also appears as an attribute value
        // before the resource section; the line scan must not anchor
        // on it
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "main.tf.json",
            r#"{
  "locals": { "note": "test_resource" },
  "resource": {
    "test_resource": {
      "test": { "foo": "bar" }
    }
  }
}
"#,
        );

        let file = FileCache::default().get(&path).unwrap();
        let blocks = file.resource_blocks();
        assert_eq!(blocks[0].line, 5);
    }

    #[test]
    fn required_providers_object_form_declares_a_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "versions.tf",
            r#"
terraform {
  required_providers {
    test = {
      source  = "test/test"
      version = ">= 1"
    }
    legacy = ">= 2"
  }
}
"#,
        );

        let file = FileCache::default().get(&path).unwrap();
        let providers = file.required_providers();

        assert_eq!(
            providers,
            vec![
                ("test".to_string(), Some("test/test".to_string())),
                ("legacy".to_string(), None),
            ]
        );
    }

    #[test]
    fn json_template_strings_become_template_expressions() {
        let literal = json_expr(&serde_json::json!("bar"));
        assert_eq!(literal, hcl::Expression::String("bar".to_string()));

        let template = json_expr(&serde_json::json!("${var.foo}"));
        let mut evaluated = template.clone();
        let errors = evaluated
            .evaluate_in_place(&Context::new())
            .expect_err("unresolved variable must not evaluate");
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind(), hcl::eval::ErrorKind::UndefinedVar(_))));
    }
}
