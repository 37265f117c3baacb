//! Model, enum and package-index emission.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use super::Emit;
use crate::model::builder::GENERIC_RESPONSE_MODEL;
use crate::model::resolver::Resolution;
use crate::model::types::{EnumDef, FieldDefinition, ModelDefinition, RootKind};

/// One `<Model>.py` file.
pub struct ModelUnit<'a> {
    model: &'a ModelDefinition,
    /// Known models this one references; unknown names never get imports.
    dependencies: BTreeSet<String>,
    cyclic: bool,
}

impl<'a> ModelUnit<'a> {
    pub fn new(model: &'a ModelDefinition, resolution: &Resolution) -> Self {
        ModelUnit {
            model,
            dependencies: resolution
                .dependencies
                .get(&model.name)
                .cloned()
                .unwrap_or_default(),
            cyclic: resolution.cyclic.contains(&model.name),
        }
    }

    pub fn name(&self) -> &str {
        &self.model.name
    }

    /// Deferred references, which import after the class body so a module
    /// cycle can load.
    fn deferred(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for field in &self.model.fields {
            field.ty.collect_deferred(&mut out);
        }
        if let Some(root) = &self.model.root {
            root.collect_deferred(&mut out);
        }
        out.remove(&self.model.name);
        out
    }

    fn head_imports(&self) -> BTreeSet<String> {
        let deferred = self.deferred();
        let mut imports = BTreeSet::new();

        for dep in &self.dependencies {
            if dep != &self.model.name && !deferred.contains(dep) {
                imports.insert(format!("from .{dep} import {dep}"));
            }
        }
        for def in self.model.enums() {
            imports.insert(format!("from .{} import {}", def.name, def.name));
        }

        let pydantic: Vec<&str> = match self.model.kind {
            RootKind::Object => {
                if self.model.fields.is_empty() {
                    vec!["BaseModel", "ConfigDict"]
                } else {
                    vec!["BaseModel", "ConfigDict", "Field"]
                }
            }
            _ => vec!["ConfigDict", "RootModel"],
        };
        imports.insert(format!("from pydantic import {}", pydantic.join(", ")));

        let mut typing = BTreeSet::new();
        if self.model.fields.iter().any(|f| !f.required) {
            typing.insert("Optional");
        }
        let any_needed = self.model.fields.iter().any(|f| f.ty.uses_any())
            || self.model.root.as_ref().is_some_and(|r| r.uses_any());
        if any_needed {
            typing.insert("Any");
        }
        if !typing.is_empty() {
            let names: Vec<&str> = typing.into_iter().collect();
            imports.insert(format!("from typing import {}", names.join(", ")));
        }
        imports
    }

    fn field_line(field: &FieldDefinition) -> String {
        let annotation = if field.required {
            field.ty.to_string()
        } else {
            format!("Optional[{}]", field.ty)
        };
        let default = if field.required { "..." } else { "None" };
        match &field.alias {
            Some(alias) => format!(
                "    {}: {} = Field({}, alias='{}')",
                field.name, annotation, default, alias
            ),
            None => format!("    {}: {} = Field({})", field.name, annotation, default),
        }
    }
}

impl Emit for ModelUnit<'_> {
    fn emit(&self) -> String {
        let mut out = String::new();
        let imports = self.head_imports();
        for import in &imports {
            out.push_str(import);
            out.push('\n');
        }
        out.push_str("\n\n");

        match self.model.kind {
            RootKind::Object => {
                let _ = writeln!(out, "class {}(BaseModel):", self.model.name);
                for field in &self.model.fields {
                    out.push_str(&Self::field_line(field));
                    out.push('\n');
                }
            }
            RootKind::List | RootKind::Map | RootKind::Opaque => {
                let root = self
                    .model
                    .root
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "Any".to_string());
                let _ = writeln!(out, "class {}(RootModel[{root}]):", self.model.name);
            }
        }

        let config = if self.model.name == GENERIC_RESPONSE_MODEL {
            "ConfigDict(arbitrary_types_allowed=True)"
        } else {
            "ConfigDict(from_attributes=True)"
        };
        let _ = writeln!(out, "\n    model_config = {config}");

        let deferred = self.deferred();
        if self.cyclic {
            out.push('\n');
            for dep in &deferred {
                let _ = writeln!(out, "from .{dep} import {dep}");
            }
            let _ = writeln!(out, "{}.model_rebuild()", self.model.name);
        }
        out
    }
}

/// One `<Name>Enum.py` file.
pub struct EnumUnit<'a> {
    def: &'a EnumDef,
}

impl<'a> EnumUnit<'a> {
    pub fn new(def: &'a EnumDef) -> Self {
        EnumUnit { def }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }
}

impl Emit for EnumUnit<'_> {
    fn emit(&self) -> String {
        let mut out = String::from("from enum import Enum\n\n\n");
        let _ = writeln!(out, "class {}(Enum):", self.def.name);
        for (member, literal) in &self.def.members {
            let _ = writeln!(out, "    {} = {}", member, literal.as_py());
        }
        out
    }
}

/// The `models/__init__.py` file: dependency-ordered imports, the closed
/// response-model name enumeration, and `__all__`.
pub struct ModelsInitUnit<'a> {
    models: &'a BTreeMap<String, ModelDefinition>,
    resolution: &'a Resolution,
}

impl<'a> ModelsInitUnit<'a> {
    pub fn new(models: &'a BTreeMap<String, ModelDefinition>, resolution: &'a Resolution) -> Self {
        ModelsInitUnit { models, resolution }
    }
}

impl Emit for ModelsInitUnit<'_> {
    fn emit(&self) -> String {
        let mut out = String::new();
        // Dependency order keeps forward references in the package index to
        // a minimum.
        for name in &self.resolution.order {
            if self.models.contains_key(name) {
                let _ = writeln!(out, "from .{name} import {name}");
            }
        }

        let sorted: Vec<&String> = self.models.keys().collect();
        out.push_str("from typing import Literal\n\nResponseModelName = Literal[\n");
        let literal_entries: Vec<String> = sorted.iter().map(|n| format!("    \"{n}\"")).collect();
        out.push_str(&literal_entries.join(",\n"));
        out.push_str("\n]\n\n__all__ = [\n");
        out.push_str(&literal_entries.join(",\n"));
        out.push_str("\n]\n");
        out
    }
}
