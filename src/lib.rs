//! pydanticgen compiles OpenAPI specification documents into Python source
//! text: pydantic v2 model definitions and typed API client classes.
//!
//! The pipeline is a fixed sequence of stages over an in-memory model
//! universe:
//!
//! 1. [`loader`] reads and normalizes the documents (rename table, schema
//!    merge, response-array synthesis).
//! 2. [`model::builder`] turns schemas into model definitions in two passes.
//! 3. [`model::dedupe`] collapses structurally identical models.
//! 4. [`model::resolver`] orders the universe and breaks reference cycles.
//! 5. [`endpoints`] extracts one client descriptor per document.
//! 6. [`emit`] renders every output file; [`output`] swaps the tree into
//!    place atomically.
//!
//! Identical inputs produce byte-identical output trees.

pub mod config;
pub mod emit;
pub mod endpoints;
pub mod error;
pub mod loader;
pub mod model;
pub mod names;
pub mod output;
pub mod spec;

use std::path::PathBuf;

use tracing::{info, warn};

use crate::emit::EmitInput;
use crate::endpoints::ClientDescriptor;
use crate::model::dedupe;
use crate::model::resolver;
use crate::model::ModelBuilder;

pub use crate::error::{Error, Result};

/// Inputs for one compilation batch.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Directory containing `*.json` specification documents.
    pub spec_dir: PathBuf,
    /// Root of the generated output tree.
    pub output_dir: PathBuf,
    /// Optional rename-table JSON file.
    pub renames: Option<PathBuf>,
    /// Optional array-wrapper list JSON file.
    pub array_wrappers: Option<PathBuf>,
    /// Base URL written into client configs; defaults to each document's
    /// server origin.
    pub base_url: Option<String>,
}

/// Summary of a successful compilation.
#[derive(Debug)]
pub struct CompileReport {
    pub models: usize,
    pub clients: usize,
    pub files: usize,
    pub warnings: Vec<String>,
}

/// Run the whole pipeline and write the output tree.
pub fn compile(options: &CompileOptions) -> Result<CompileReport> {
    let renames = config::load_rename_table(options.renames.as_deref())?;
    let wrappers = config::load_wrapper_list(options.array_wrappers.as_deref())?;

    let loaded = loader::load(&options.spec_dir, &renames)?;
    let mut warnings = loaded.warnings;

    let (mut models, build_warnings) = ModelBuilder::new().build(&loaded.schemas)?;
    warnings.extend(build_warnings);
    ModelBuilder::augment_wrappers(&mut models, &mut warnings, &wrappers);
    ModelBuilder::add_generic_response_model(&mut models);

    // Deduplicate before resolving so ordering and the diagram cover
    // exactly the canonical model set.
    let (mut models, reference_map) = dedupe::deduplicate(models);
    let resolution = resolver::resolve(&mut models, &mut warnings);

    let clients = endpoints::extract(&loaded.documents, &models, &reference_map, &mut warnings);
    let clients: Vec<(ClientDescriptor, String)> = clients
        .into_iter()
        .map(|client| {
            let base_url = options
                .base_url
                .clone()
                .or_else(|| client.base_url.clone())
                .unwrap_or_else(|| {
                    warnings.push(format!(
                        "no base URL for '{}'; config will carry an empty one",
                        client.class_name
                    ));
                    String::new()
                });
            (client, base_url)
        })
        .collect();

    let files = emit::render_all(&EmitInput {
        models: &models,
        resolution: &resolution,
        clients: &clients,
    });
    output::write_output(&options.output_dir, &files)?;

    for warning in &warnings {
        warn!("{warning}");
    }
    info!(
        models = models.len(),
        clients = clients.len(),
        files = files.len(),
        "compilation finished"
    );
    Ok(CompileReport {
        models: models.len(),
        clients: clients.len(),
        files: files.len(),
        warnings,
    })
}
