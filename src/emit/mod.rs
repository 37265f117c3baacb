//! Python code emission via the Emit trait.
//!
//! Every output file is one emission unit. Units are independent and carry
//! everything they need, so rendering is parallelized with rayon; the output
//! is defined by the set of files and their contents, never by write order.

pub mod clients;
pub mod diagram;
pub mod models;

use std::collections::BTreeMap;
use std::path::PathBuf;

use rayon::prelude::*;

use crate::endpoints::ClientDescriptor;
use crate::model::resolver::Resolution;
use crate::model::types::ModelDefinition;

/// Trait for emitting Python source text from an output unit.
pub trait Emit {
    /// Render the unit to its full file content.
    fn emit(&self) -> String;
}

/// One rendered output file, path relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub content: String,
}

/// Everything the emitter needs, borrowed from the pipeline stages.
pub struct EmitInput<'a> {
    pub models: &'a BTreeMap<String, ModelDefinition>,
    pub resolution: &'a Resolution,
    /// `(client, effective base URL)` pairs.
    pub clients: &'a [(ClientDescriptor, String)],
}

enum OutputUnit<'a> {
    Model(models::ModelUnit<'a>),
    Enum(models::EnumUnit<'a>),
    ModelsInit(models::ModelsInitUnit<'a>),
    Client(clients::ClientUnit<'a>),
    ClientConfig(clients::ClientConfigUnit<'a>),
    ClientsInit(clients::ClientsInitUnit<'a>),
    Diagram(diagram::DiagramUnit<'a>),
}

impl OutputUnit<'_> {
    fn path(&self) -> PathBuf {
        match self {
            OutputUnit::Model(unit) => PathBuf::from("models").join(format!("{}.py", unit.name())),
            OutputUnit::Enum(unit) => PathBuf::from("models").join(format!("{}.py", unit.name())),
            OutputUnit::ModelsInit(_) => PathBuf::from("models").join("__init__.py"),
            OutputUnit::Client(unit) => {
                PathBuf::from("clients").join(format!("{}.py", unit.class_name()))
            }
            OutputUnit::ClientConfig(unit) => {
                PathBuf::from("clients").join(format!("{}_config.py", unit.class_name()))
            }
            OutputUnit::ClientsInit(_) => PathBuf::from("clients").join("__init__.py"),
            OutputUnit::Diagram(_) => PathBuf::from("class_diagram.mmd"),
        }
    }

    fn render(&self) -> String {
        match self {
            OutputUnit::Model(unit) => unit.emit(),
            OutputUnit::Enum(unit) => unit.emit(),
            OutputUnit::ModelsInit(unit) => unit.emit(),
            OutputUnit::Client(unit) => unit.emit(),
            OutputUnit::ClientConfig(unit) => unit.emit(),
            OutputUnit::ClientsInit(unit) => unit.emit(),
            OutputUnit::Diagram(unit) => unit.emit(),
        }
    }
}

/// Render every output file for the compiled universe.
pub fn render_all(input: &EmitInput<'_>) -> Vec<RenderedFile> {
    let mut units: Vec<OutputUnit<'_>> = Vec::new();

    for model in input.models.values() {
        units.push(OutputUnit::Model(models::ModelUnit::new(
            model,
            input.resolution,
        )));
    }

    // Enums are shared by name across models; one file per name.
    let mut enums = BTreeMap::new();
    for model in input.models.values() {
        for def in model.enums() {
            enums.insert(def.name.as_str(), def);
        }
    }
    for def in enums.into_values() {
        units.push(OutputUnit::Enum(models::EnumUnit::new(def)));
    }

    units.push(OutputUnit::ModelsInit(models::ModelsInitUnit::new(
        input.models,
        input.resolution,
    )));

    for (client, base_url) in input.clients {
        units.push(OutputUnit::Client(clients::ClientUnit::new(client)));
        units.push(OutputUnit::ClientConfig(clients::ClientConfigUnit::new(
            client, base_url,
        )));
    }
    units.push(OutputUnit::ClientsInit(clients::ClientsInitUnit::new(
        input.clients,
    )));

    units.push(OutputUnit::Diagram(diagram::DiagramUnit::new(
        input.resolution,
    )));

    units
        .par_iter()
        .map(|unit| RenderedFile {
            path: unit.path(),
            content: unit.render(),
        })
        .collect()
}
