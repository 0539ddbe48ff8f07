//! tftab cli interface

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Module directory to document
    #[clap(short = 'C', long = "directory", default_value = ".")]
    pub directory: PathBuf,

    /// Resource types to document, as inline YAML
    ///
    /// Example: [{name: aws_instance, attributes: [ami]}]
    #[clap(short = 'r', long = "resources", conflicts_with = "resources_file")]
    pub resources: Option<String>,

    /// Read the resource types YAML from a file
    #[clap(long = "resources-file")]
    pub resources_file: Option<PathBuf>,

    /// Provider schema document, as dumped by
    /// `terraform providers schema -json`
    ///
    /// When omitted, that command is run in the module directory.
    #[clap(short = 's', long = "schemas-file")]
    pub schemas_file: Option<PathBuf>,

    /// Merge the tables into this file instead of printing to stdout
    ///
    /// Content between the tftab comment fences is replaced; without
    /// fences a fenced block is appended.
    #[clap(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,

    /// Markdown header level for the per-type headings
    #[clap(long = "header-level", default_value_t = 2)]
    pub header_level: usize,
}
