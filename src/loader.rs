//! Document loading and normalization.
//!
//! Reads every `*.json` document from the spec directory in sorted order,
//! applies the per-title rename table as a pure rewrite over the raw JSON
//! tree, merges all schemas into one sanitized universe, and synthesizes
//! `<Name>Array` schema entries for responses declared as bare arrays of
//! references.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::config::RenameTable;
use crate::error::{Error, Result};
use crate::names::{ref_to_model_name, sanitize_name};
use crate::spec::{Document, Schema};

/// One parsed document plus its source path.
#[derive(Debug)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub document: Document,
}

/// The loader's output: parsed documents and the merged schema universe.
#[derive(Debug)]
pub struct LoadedSpecs {
    pub documents: Vec<LoadedDocument>,
    pub schemas: BTreeMap<String, Schema>,
    pub warnings: Vec<String>,
}

/// Load, rename, merge and augment every document in `spec_dir`.
pub fn load(spec_dir: &Path, renames: &RenameTable) -> Result<LoadedSpecs> {
    if !spec_dir.is_dir() {
        return Err(Error::SpecDirMissing(spec_dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(spec_dir)
        .map_err(|e| Error::io(spec_dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    let mut schemas = BTreeMap::new();
    let mut warnings = Vec::new();

    for path in paths {
        let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let mut value: Value = serde_json::from_str(&text).map_err(|e| Error::SpecParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let title = value
            .pointer("/info/title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if let Some(mapping) = renames.get(&title) {
            // Replacement names go through the sanitizer so the table cannot
            // introduce names the rest of the pipeline would reject.
            let mapping: BTreeMap<String, String> = mapping
                .iter()
                .map(|(old, new)| (old.clone(), sanitize_name(new)))
                .collect();
            rewrite_refs(&mut value, &mapping);
            rename_schema_keys(&mut value, &mapping);
            debug!(title, renames = mapping.len(), "applied rename table");
        }

        let document = Document::from_value(value, &path)?;
        merge_schemas(&document, &mut schemas);
        documents.push(LoadedDocument { path, document });
    }

    if documents.is_empty() {
        return Err(Error::EmptySpecSet(spec_dir.to_path_buf()));
    }

    synthesize_response_arrays(&documents, &mut schemas, &mut warnings);

    info!(
        documents = documents.len(),
        schemas = schemas.len(),
        "specifications loaded"
    );
    Ok(LoadedSpecs {
        documents,
        schemas,
        warnings,
    })
}

/// Rewrite the terminal segment of every `$ref` pointer present in the
/// rename table. Pure recursive walk over the raw tree.
fn rewrite_refs(value: &mut Value, mapping: &BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "$ref" {
                    if let Value::String(pointer) = child {
                        let last = pointer.rsplit('/').next().unwrap_or("");
                        if let Some(new) = mapping.get(last) {
                            let prefix_len = pointer.len() - last.len();
                            let mut renamed = pointer[..prefix_len].to_string();
                            renamed.push_str(new);
                            *pointer = renamed;
                        }
                    }
                } else {
                    rewrite_refs(child, mapping);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_refs(item, mapping);
            }
        }
        _ => {}
    }
}

/// Rename keys of `components.schemas` that appear in the rename table.
fn rename_schema_keys(value: &mut Value, mapping: &BTreeMap<String, String>) {
    let Some(Value::Object(schemas)) = value.pointer_mut("/components/schemas") else {
        return;
    };
    let old: Vec<String> = schemas
        .keys()
        .filter(|k| mapping.contains_key(*k))
        .cloned()
        .collect();
    for key in old {
        if let Some(schema) = schemas.remove(&key) {
            if let Some(new) = mapping.get(&key) {
                schemas.insert(new.clone(), schema);
            }
        }
    }
}

/// Merge a document's schemas into the universe under sanitized names.
/// Later documents overwrite earlier ones; structural duplicates are
/// collapsed downstream anyway.
fn merge_schemas(document: &Document, schemas: &mut BTreeMap<String, Schema>) {
    let Some(components) = &document.components else {
        return;
    };
    let Some(doc_schemas) = &components.schemas else {
        return;
    };
    for (name, schema) in doc_schemas {
        schemas.insert(sanitize_name(name), schema.clone());
    }
}

/// Add a synthetic `<Name>Array` schema for every 200 response declared as
/// an array of references, so bare-array payloads deserialize into a named
/// root model.
fn synthesize_response_arrays(
    documents: &[LoadedDocument],
    schemas: &mut BTreeMap<String, Schema>,
    warnings: &mut Vec<String>,
) {
    for loaded in documents {
        for item in loaded.document.paths.values() {
            for (_, operation) in item.operations() {
                let Some(schema) = ok_json_schema(operation) else {
                    continue;
                };
                if schema.schema_type.as_deref() != Some("array") {
                    continue;
                }
                let Some(ref_path) = schema.items.as_ref().and_then(|i| i.ref_path.as_deref())
                else {
                    continue;
                };
                let array_name = format!("{}Array", ref_to_model_name(ref_path));
                if schemas.contains_key(&array_name) {
                    continue;
                }
                if !schemas.contains_key(&ref_to_model_name(ref_path)) {
                    warnings.push(format!(
                        "response array '{array_name}' references unknown schema; skipped"
                    ));
                    continue;
                }
                schemas.insert(
                    array_name,
                    Schema {
                        schema_type: Some("array".to_string()),
                        items: Some(Box::new(Schema {
                            ref_path: Some(ref_path.to_string()),
                            ..Schema::default()
                        })),
                        ..Schema::default()
                    },
                );
            }
        }
    }
}

/// The schema of an operation's 200 `application/json` response, if any.
pub fn ok_json_schema(operation: &crate::spec::Operation) -> Option<&Schema> {
    operation
        .responses
        .get("200")?
        .content
        .as_ref()?
        .get("application/json")?
        .schema
        .as_ref()
}
