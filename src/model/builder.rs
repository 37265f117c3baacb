//! Schema-to-model construction.
//!
//! Two passes over the merged schema universe: object schemas first, array
//! schemas second, so an array can always resolve its element model by name.
//! Malformed shapes degrade to permissive types with a warning; only an
//! array pointing at a model the object pass never created is fatal.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::types::{
    EnumDef, EnumLiteral, FieldDefinition, ModelDefinition, Primitive, TypeDescriptor,
};
use crate::names::{capitalize_first, clean_enum_name, ref_to_model_name, sanitize_field_name};
use crate::spec::Schema;

/// Name of the fallback model for untyped responses.
pub const GENERIC_RESPONSE_MODEL: &str = "GenericResponseModel";

/// Builds the model universe from sanitized, merged schemas.
pub struct ModelBuilder {
    models: BTreeMap<String, ModelDefinition>,
    warnings: Vec<String>,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    pub fn new() -> Self {
        ModelBuilder {
            models: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Run both passes over the schema universe and return the models.
    pub fn build(
        mut self,
        schemas: &BTreeMap<String, Schema>,
    ) -> Result<(BTreeMap<String, ModelDefinition>, Vec<String>)> {
        // Pass 1: everything that is not an array.
        for (name, schema) in schemas {
            if schema.schema_type.as_deref() == Some("array") {
                continue;
            }
            let model = self.build_object(name, schema);
            self.models.insert(name.clone(), model);
        }

        // Pass 2: arrays, which may reference pass-1 models.
        for (name, schema) in schemas {
            if schema.schema_type.as_deref() != Some("array") {
                continue;
            }
            let model = self.build_array(name, schema)?;
            self.models.insert(name.clone(), model);
        }

        debug!(models = self.models.len(), "model universe built");
        Ok((self.models, self.warnings))
    }

    fn build_object(&mut self, name: &str, schema: &Schema) -> ModelDefinition {
        let Some(properties) = &schema.properties else {
            self.warnings.push(format!(
                "schema '{name}' has no properties; falling back to dict[str, Any]"
            ));
            warn!(model = name, "object schema without properties");
            return ModelDefinition::map(
                name,
                TypeDescriptor::Primitive(Primitive::Str),
                TypeDescriptor::Primitive(Primitive::Any),
            );
        };

        let required = schema.required.clone().unwrap_or_default();
        let mut fields = Vec::with_capacity(properties.len());
        for (prop_name, prop_schema) in properties {
            let py_name = sanitize_field_name(prop_name);
            let alias = (py_name != *prop_name).then(|| prop_name.clone());
            let ty = self.map_type(name, prop_name, prop_schema);
            fields.push(FieldDefinition {
                source_name: prop_name.clone(),
                name: py_name,
                ty,
                alias,
                required: required.iter().any(|r| r == prop_name),
            });
        }
        ModelDefinition::object(name, fields)
    }

    fn build_array(&mut self, name: &str, schema: &Schema) -> Result<ModelDefinition> {
        let Some(items) = &schema.items else {
            self.warnings.push(format!(
                "array schema '{name}' has no items; falling back to list[Any]"
            ));
            warn!(model = name, "array schema without items");
            return Ok(ModelDefinition::list(
                name,
                TypeDescriptor::Primitive(Primitive::Any),
            ));
        };

        if let Some(ref_path) = &items.ref_path {
            let target = ref_to_model_name(ref_path);
            if !self.models.contains_key(&target) {
                return Err(Error::MissingArrayTarget {
                    array: name.to_string(),
                    target,
                });
            }
            return Ok(ModelDefinition::list(
                name,
                TypeDescriptor::Reference(target),
            ));
        }

        let inner = self.map_type(name, "items", items);
        Ok(ModelDefinition::list(name, inner))
    }

    /// Map a property schema to a type descriptor, synthesizing enums and
    /// degrading unknown shapes to `Any`.
    fn map_type(&mut self, model: &str, field: &str, schema: &Schema) -> TypeDescriptor {
        if let Some(ref_path) = &schema.ref_path {
            return TypeDescriptor::Reference(ref_to_model_name(ref_path));
        }

        if let Some(values) = &schema.enum_values {
            return TypeDescriptor::Enum(self.build_enum(field, values));
        }

        match schema.schema_type.as_deref() {
            Some("string") => TypeDescriptor::Primitive(Primitive::Str),
            Some("integer") => TypeDescriptor::Primitive(Primitive::Int),
            Some("number") => TypeDescriptor::Primitive(Primitive::Float),
            Some("boolean") => TypeDescriptor::Primitive(Primitive::Bool),
            Some("array") => match &schema.items {
                Some(items) => TypeDescriptor::list(self.map_type(model, field, items)),
                None => {
                    self.warnings.push(format!(
                        "array field '{model}.{field}' has no items; using list[Any]"
                    ));
                    TypeDescriptor::list(TypeDescriptor::Primitive(Primitive::Any))
                }
            },
            Some("object") => TypeDescriptor::map(
                TypeDescriptor::Primitive(Primitive::Str),
                TypeDescriptor::Primitive(Primitive::Any),
            ),
            other => {
                self.warnings.push(format!(
                    "field '{model}.{field}' has unsupported type {other:?}; using Any"
                ));
                TypeDescriptor::Primitive(Primitive::Any)
            }
        }
    }

    /// Synthesize `<FieldName>Enum` from an inline enumeration. Duplicate
    /// member names after cleaning get numeric suffixes.
    fn build_enum(&mut self, field: &str, values: &[serde_json::Value]) -> EnumDef {
        let name = format!("{}Enum", capitalize_first(field));
        let mut seen: BTreeMap<String, usize> = BTreeMap::new();
        let mut members = Vec::with_capacity(values.len());
        for value in values {
            let (member, literal) = match value {
                serde_json::Value::String(s) => (clean_enum_name(s), EnumLiteral::Str(s.clone())),
                serde_json::Value::Number(n) => {
                    let member = clean_enum_name(&n.to_string());
                    let literal = match n.as_i64() {
                        Some(i) => EnumLiteral::Int(i),
                        None => EnumLiteral::Float(n.as_f64().unwrap_or_default()),
                    };
                    (format!("VALUE_{member}"), literal)
                }
                serde_json::Value::Bool(b) => (
                    if *b { "TRUE".into() } else { "FALSE".into() },
                    EnumLiteral::Bool(*b),
                ),
                serde_json::Value::Null => ("NULL".into(), EnumLiteral::Null),
                other => (clean_enum_name(&other.to_string()), EnumLiteral::Str(other.to_string())),
            };
            let member = if member.is_empty() {
                "EMPTY".to_string()
            } else {
                member
            };
            let count = seen.entry(member.clone()).or_insert(0);
            *count += 1;
            let member = if *count > 1 {
                format!("{member}_{count}")
            } else {
                member
            };
            members.push((member, literal));
        }
        EnumDef { name, members }
    }

    /// Add the fallback model for untyped responses to a built universe.
    pub fn add_generic_response_model(models: &mut BTreeMap<String, ModelDefinition>) {
        models.insert(
            GENERIC_RESPONSE_MODEL.to_string(),
            ModelDefinition::opaque(GENERIC_RESPONSE_MODEL),
        );
    }

    /// Add configured `<Base>Array` wrapper models for payloads some
    /// endpoints return as bare arrays. Existing names are left alone;
    /// unknown bases are skipped with a warning.
    pub fn augment_wrappers(
        models: &mut BTreeMap<String, ModelDefinition>,
        warnings: &mut Vec<String>,
        bases: &[String],
    ) {
        for base in bases {
            let array_name = format!("{base}Array");
            if models.contains_key(&array_name) {
                continue;
            }
            if !models.contains_key(base) {
                warnings.push(format!(
                    "array wrapper requested for unknown model '{base}'; skipped"
                ));
                warn!(model = base.as_str(), "array wrapper base not found");
                continue;
            }
            models.insert(
                array_name.clone(),
                ModelDefinition::list(array_name, TypeDescriptor::Reference(base.clone())),
            );
        }
    }
}
