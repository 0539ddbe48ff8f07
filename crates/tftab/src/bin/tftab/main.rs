mod cli;

use anyhow::Context;
use std::path::Path;
use tftab::markdown;
use tftab::schema::{SchemaDocument, SchemaRegistry};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TFTAB_LOG"))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        for error in e.chain() {
            eprintln!("{error}");
        }
        std::process::exit(1);
    }
}

fn run(cli: cli::Cli) -> anyhow::Result<()> {
    let request = match (&cli.resources, &cli.resources_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("either --resources or --resources-file is required"),
    };
    let resource_types = tftab::inputs::parse_resource_types(&request)?;

    let document: SchemaDocument = match &cli.schemas_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&raw).context("failed to parse provider schema document")?
        }
        None => dump_provider_schemas(&cli.directory)?,
    };
    let registry = SchemaRegistry::from_document(document)?;

    let parser = tftab::parser::Parser::new(&cli.directory, registry)
        .context("failed to load module")?;

    let mut buffer = String::new();
    for spec in &resource_types {
        tracing::info!(resource_type = %spec.name, "generating table");

        let mut rows = Vec::new();
        for resource in parser.resources_of_type(&spec.name) {
            let attributes = parser
                .resource_attributes(resource, &spec.attributes)
                .with_context(|| format!("failed to resolve attributes of {}", resource.addr()))?;

            rows.push(markdown::ResourceRow {
                name: resource.name.clone(),
                pos: resource.pos.clone(),
                attributes,
            });
        }

        markdown::write_table(&cli.directory, spec, &rows, cli.header_level, &mut buffer);
    }

    match &cli.output_file {
        None => print!("{buffer}"),
        Some(path) => {
            let existing = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to read {}", path.display()))
                }
            };

            std::fs::write(path, markdown::merge_into(&existing, &buffer))
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }

    Ok(())
}

/// Obtain the provider schema document from the terraform cli
fn dump_provider_schemas(dir: &Path) -> anyhow::Result<SchemaDocument> {
    let output = std::process::Command::new("terraform")
        .args(["providers", "schema", "-json"])
        .current_dir(dir)
        .output()
        .context("failed to run terraform")?;

    anyhow::ensure!(
        output.status.success(),
        "terraform providers schema failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(serde_json::from_slice(&output.stdout)
        .context("failed to parse provider schema document")?)
}
