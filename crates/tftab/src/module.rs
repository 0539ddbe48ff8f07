//! module inventory
//!
//! [Module::load] performs a full parse of every recognized
//! configuration file in a directory (`*.tf` and `*.tf.json`) and
//! collects the declared managed resources plus the required-provider
//! map. Loading is all-or-nothing: the first IO or syntax failure
//! aborts the load, there is no partial module. The inventory is
//! immutable once built.

use crate::source::{BlockBody, FileCache, ParseError, SourceFile};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse configuration file")]
    Parse(#[from] ParseError),
    #[error("Duplicate resource {address}")]
    DuplicateResource { address: String },
}

/// Source position of a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePos {
    pub path: PathBuf,
    pub line: usize,
}

/// A declared managed resource, identified by (type, name)
#[derive(Debug, Clone)]
pub struct ManagedResource {
    pub resource_type: String,
    pub name: String,
    pub pos: SourcePos,
    /// Local provider reference name: the root of an explicit
    /// `provider =` expression, else the resource type prefix before
    /// the first `_`.
    pub provider_name: String,
}

impl ManagedResource {
    /// `type.name` identity, unique within a module
    pub fn addr(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}

/// A required_providers entry; `source` is absent when the
/// declaration only carries a version constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredProvider {
    pub source: Option<String>,
}

/// Inventory of one configuration directory
#[derive(Debug, Default)]
pub struct Module {
    pub dir: PathBuf,
    pub resources: Vec<ManagedResource>,
    pub required_providers: IndexMap<String, RequiredProvider>,
}

impl Module {
    pub fn load(dir: &Path, cache: &FileCache) -> Result<Self, LoadError> {
        let mut module = Module {
            dir: dir.to_path_buf(),
            ..Default::default()
        };
        let mut seen = HashSet::new();

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.ends_with(".tf") || file_name.ends_with(".tf.json") {
                paths.push(entry.path());
            }
        }
        // read_dir order is platform dependent
        paths.sort();

        for path in paths {
            tracing::info!(path = %path.display(), "loading file");
            let file = cache.get(&path)?;
            module.collect(&path, &file, &mut seen)?;
        }

        Ok(module)
    }

    fn collect(
        &mut self,
        path: &Path,
        file: &SourceFile,
        seen: &mut HashSet<(String, String)>,
    ) -> Result<(), LoadError> {
        for block in file.resource_blocks() {
            let resource = ManagedResource {
                resource_type: block.resource_type.to_string(),
                name: block.name.to_string(),
                pos: SourcePos {
                    path: path.to_path_buf(),
                    line: block.line,
                },
                provider_name: provider_name(block.resource_type, &block.body),
            };

            let identity = (resource.resource_type.clone(), resource.name.clone());
            if !seen.insert(identity) {
                return Err(LoadError::DuplicateResource {
                    address: resource.addr(),
                });
            }

            self.resources.push(resource);
        }

        for (name, source) in file.required_providers() {
            self.required_providers
                .insert(name, RequiredProvider { source });
        }

        Ok(())
    }

    /// Resources of the given type, sorted ascending by name.
    /// Empty when nothing matches.
    pub fn resources_of_type(&self, resource_type: &str) -> Vec<&ManagedResource> {
        let mut matching: Vec<&ManagedResource> = self
            .resources
            .iter()
            .filter(|resource| resource.resource_type == resource_type)
            .collect();

        matching.sort_by(|a, b| a.name.cmp(&b.name));
        matching
    }
}

fn provider_name(resource_type: &str, body: &BlockBody<'_>) -> String {
    if let Some(explicit) = body.provider_reference() {
        return explicit;
    }

    resource_type
        .split('_')
        .next()
        .unwrap_or(resource_type)
        .to_string()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn load_fixture(files: &[(&str, &str)]) -> Result<(tempfile::TempDir, Module), LoadError> {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).expect("write fixture");
        }

        let module = Module::load(dir.path(), &FileCache::default())?;
        Ok((dir, module))
    }

    #[test]
    fn collects_resources_across_files() {
        let (dir, module) = load_fixture(&[
            ("a.tf", "resource \"test_resource\" \"one\" {}\n"),
            (
                "b.tf.json",
                r#"{"resource": {"test_resource": {"two": {}}}}"#,
            ),
        ])
        .unwrap();

        assert_eq!(module.resources.len(), 2);
        assert_eq!(module.resources[0].addr(), "test_resource.one");
        assert_eq!(module.resources[0].pos.path, dir.path().join("a.tf"));
        assert_eq!(module.resources[0].pos.line, 1);
        assert_eq!(module.resources[1].addr(), "test_resource.two");
    }

    #[test]
    fn resources_of_type_sorts_by_name() {
        let (_dir, module) = load_fixture(&[(
            "main.tf",
            "resource \"test_resource\" \"c\" {}\n\
             resource \"test_resource\" \"b\" {}\n\
             resource \"test_resource\" \"a\" {}\n\
             resource \"other_resource\" \"z\" {}\n",
        )])
        .unwrap();

        let names: Vec<&str> = module
            .resources_of_type("test_resource")
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn resources_of_type_without_matches_is_empty() {
        let (_dir, module) =
            load_fixture(&[("main.tf", "resource \"test_resource\" \"a\" {}\n")]).unwrap();

        assert!(module.resources_of_type("absent_resource").is_empty());
    }

    #[test]
    fn duplicate_identity_aborts_the_load() {
        let result = load_fixture(&[
            ("a.tf", "resource \"test_resource\" \"same\" {}\n"),
            ("b.tf", "resource \"test_resource\" \"same\" {}\n"),
        ]);

        assert!(matches!(
            result,
            Err(LoadError::DuplicateResource { address }) if address == "test_resource.same"
        ));
    }

    #[test]
    fn syntax_errors_abort_the_load() {
        let result = load_fixture(&[
            ("good.tf", "resource \"test_resource\" \"a\" {}\n"),
            ("bad.tf", "this is not hcl {{{"),
        ]);

        assert!(matches!(result, Err(LoadError::Parse(_))));
    }

    #[test]
    fn provider_name_defaults_to_the_type_prefix() {
        let (_dir, module) = load_fixture(&[(
            "main.tf",
            "resource \"aws_instance\" \"web\" {}\n\
             resource \"random\" \"seed\" {}\n",
        )])
        .unwrap();

        assert_eq!(module.resources[0].provider_name, "aws");
        assert_eq!(module.resources[1].provider_name, "random");
    }

    #[test]
    fn explicit_provider_reference_wins() {
        let (_dir, module) = load_fixture(&[(
            "main.tf",
            "resource \"aws_instance\" \"web\" {\n  provider = aws.secondary\n}\n",
        )])
        .unwrap();

        assert_eq!(module.resources[0].provider_name, "aws");

        let (_dir, module) = load_fixture(&[(
            "main.tf",
            "resource \"aws_instance\" \"web\" {\n  provider = mycloud\n}\n",
        )])
        .unwrap();

        assert_eq!(module.resources[0].provider_name, "mycloud");
    }

    #[test]
    fn required_providers_merge_across_files() {
        let (_dir, module) = load_fixture(&[
            (
                "versions.tf",
                "terraform {\n  required_providers {\n    test = {\n      source = \"test/test\"\n    }\n  }\n}\n",
            ),
            (
                "versions_extra.tf.json",
                r#"{"terraform": {"required_providers": {"extra": {"source": "acme/extra"}}}}"#,
            ),
        ])
        .unwrap();

        assert_eq!(
            module.required_providers.get("test"),
            Some(&RequiredProvider {
                source: Some("test/test".to_string())
            })
        );
        assert_eq!(
            module.required_providers.get("extra"),
            Some(&RequiredProvider {
                source: Some("acme/extra".to_string())
            })
        );
    }
}
