//! Endpoint descriptor extraction.
//!
//! One `ClientDescriptor` per source document, one `EndpointDescriptor` per
//! operation. Response model names resolve through the deduplication rename
//! map and fall back to the generic marker; extraction itself never fails.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::loader::{ok_json_schema, LoadedDocument};
use crate::model::builder::GENERIC_RESPONSE_MODEL;
use crate::model::dedupe;
use crate::model::types::{ModelDefinition, Primitive, TypeDescriptor};
use crate::names::{method_name, ref_to_model_name, sanitize_field_name, sanitize_name};
use crate::spec::{Operation, Parameter, Schema};

/// One operation parameter, path or query.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    /// Wire name, used when the client forwards the parameter.
    pub name: String,
    /// Valid Python argument name.
    pub py_name: String,
    pub ty: TypeDescriptor,
    pub required: bool,
    pub description: Option<String>,
    pub example: Option<String>,
}

/// One callable operation of a generated client.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    pub operation_id: String,
    pub method_name: String,
    /// Registry URI with positional `{0}`, `{1}` slots for path parameters.
    pub uri: String,
    /// The joined query path with named placeholders, for documentation.
    pub path: String,
    pub path_params: Vec<ParamDescriptor>,
    pub query_params: Vec<ParamDescriptor>,
    pub response_model: String,
    pub description: Option<String>,
}

/// One generated client class, backed by one source document.
#[derive(Debug, Clone)]
pub struct ClientDescriptor {
    pub class_name: String,
    /// Origin of the document's declared base URL, if any.
    pub base_url: Option<String>,
    pub endpoints: Vec<EndpointDescriptor>,
}

/// Extract client descriptors for every loaded document.
pub fn extract(
    documents: &[LoadedDocument],
    models: &BTreeMap<String, ModelDefinition>,
    reference_map: &BTreeMap<String, String>,
    warnings: &mut Vec<String>,
) -> Vec<ClientDescriptor> {
    let mut clients = Vec::with_capacity(documents.len());
    for loaded in documents {
        let document = &loaded.document;
        let class_name = format!("{}Client", sanitize_name(&document.info.title));
        let base_path = document.base_path();
        let mut endpoints = Vec::new();

        for (path, item) in &document.paths {
            for (http_method, operation) in item.operations() {
                let Some(operation_id) = operation.operation_id.as_deref() else {
                    warnings.push(format!(
                        "{http_method} {path} in '{}' has no operationId; skipped",
                        document.info.title
                    ));
                    warn!(path, http_method, "operation without operationId skipped");
                    continue;
                };
                endpoints.push(extract_endpoint(
                    operation_id,
                    operation,
                    &base_path,
                    path,
                    models,
                    reference_map,
                    warnings,
                ));
            }
        }

        endpoints.sort_by(|a, b| a.operation_id.cmp(&b.operation_id));
        debug!(
            client = class_name.as_str(),
            endpoints = endpoints.len(),
            "client extracted"
        );
        clients.push(ClientDescriptor {
            class_name,
            base_url: document.base_origin(),
            endpoints,
        });
    }
    clients
}

fn extract_endpoint(
    operation_id: &str,
    operation: &Operation,
    base_path: &str,
    path: &str,
    models: &BTreeMap<String, ModelDefinition>,
    reference_map: &BTreeMap<String, String>,
    warnings: &mut Vec<String>,
) -> EndpointDescriptor {
    let path_params: Vec<ParamDescriptor> = operation
        .parameters
        .iter()
        .filter(|p| p.location == "path")
        .map(param_descriptor)
        .collect();
    let query_params: Vec<ParamDescriptor> = operation
        .parameters
        .iter()
        .filter(|p| p.location == "query")
        .map(param_descriptor)
        .collect();

    EndpointDescriptor {
        operation_id: operation_id.to_string(),
        method_name: method_name(operation_id),
        uri: positional_uri(base_path, path, &path_params),
        path: join_url_paths(base_path, path),
        path_params,
        query_params,
        response_model: response_model(operation_id, operation, models, reference_map, warnings),
        description: operation
            .description
            .clone()
            .or_else(|| operation.summary.clone()),
    }
}

fn param_descriptor(parameter: &Parameter) -> ParamDescriptor {
    ParamDescriptor {
        name: parameter.name.clone(),
        py_name: sanitize_field_name(&parameter.name),
        ty: param_type(parameter.schema.as_ref()),
        required: parameter.required || parameter.location == "path",
        description: parameter.description.clone(),
        example: parameter.example.as_ref().map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
    }
}

fn param_type(schema: Option<&Schema>) -> TypeDescriptor {
    let primitive = match schema.and_then(|s| s.schema_type.as_deref()) {
        Some("integer") => Primitive::Int,
        Some("number") => Primitive::Float,
        Some("boolean") => Primitive::Bool,
        Some("array") => {
            return TypeDescriptor::list(TypeDescriptor::Primitive(Primitive::Str));
        }
        _ => Primitive::Str,
    };
    TypeDescriptor::Primitive(primitive)
}

/// Join the server base path with the operation path and replace each
/// `{name}` placeholder with its positional index.
fn positional_uri(base_path: &str, path: &str, path_params: &[ParamDescriptor]) -> String {
    let joined = join_url_paths(base_path, path);
    let mut uri = joined;
    for (index, param) in path_params.iter().enumerate() {
        uri = uri.replace(&format!("{{{}}}", param.name), &format!("{{{index}}}"));
    }
    uri
}

fn join_url_paths(left: &str, right: &str) -> String {
    let left = left.trim_end_matches('/');
    let right = right.trim_start_matches('/');
    if right.is_empty() {
        format!("{left}/")
    } else {
        format!("{left}/{right}")
    }
}

/// Resolve the 200 response to a canonical model name, falling back to the
/// generic marker for untyped or unknown shapes.
fn response_model(
    operation_id: &str,
    operation: &Operation,
    models: &BTreeMap<String, ModelDefinition>,
    reference_map: &BTreeMap<String, String>,
    warnings: &mut Vec<String>,
) -> String {
    let Some(schema) = ok_json_schema(operation) else {
        return GENERIC_RESPONSE_MODEL.to_string();
    };

    let candidate = if schema.schema_type.as_deref() == Some("array") {
        schema
            .items
            .as_ref()
            .and_then(|items| items.ref_path.as_deref())
            .map(|ref_path| {
                // Wrapper arrays deduplicate as a unit, so resolve the
                // element first and then the wrapper name itself.
                let element = dedupe::resolve(&ref_to_model_name(ref_path), reference_map);
                dedupe::resolve(&format!("{element}Array"), reference_map)
            })
    } else {
        schema
            .ref_path
            .as_deref()
            .map(|ref_path| dedupe::resolve(&ref_to_model_name(ref_path), reference_map))
    };

    match candidate {
        Some(name) if models.contains_key(&name) => name,
        Some(name) => {
            warnings.push(format!(
                "response model '{name}' for '{operation_id}' not in universe; using {GENERIC_RESPONSE_MODEL}"
            ));
            GENERIC_RESPONSE_MODEL.to_string()
        }
        None => GENERIC_RESPONSE_MODEL.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::RenameTable;
    use std::io::Write as _;

    fn load_one(json: &serde_json::Value) -> Vec<LoadedDocument> {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("spec.json")).unwrap();
        write!(file, "{json}").unwrap();
        crate::loader::load(dir.path(), &RenameTable::new())
            .unwrap()
            .documents
    }

    fn items_spec() -> serde_json::Value {
        serde_json::json!({
            "info": { "title": "Inventory" },
            "servers": [{ "url": "https://api.example.com/Inventory" }],
            "paths": {
                "/items/{id}": {
                    "get": {
                        "operationId": "Inventory_GetItem",
                        "description": "Fetch one item.",
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "string" },
                                "description": "Item identifier.",
                                "example": "widget-1"
                            },
                            {
                                "name": "limit",
                                "in": "query",
                                "schema": { "type": "integer" }
                            }
                        ],
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Item" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Item": { "type": "object", "properties": { "id": { "type": "string" } } }
                }
            }
        })
    }

    fn item_models() -> BTreeMap<String, ModelDefinition> {
        let mut models = BTreeMap::new();
        models.insert("Item".to_string(), ModelDefinition::object("Item", vec![]));
        crate::model::builder::ModelBuilder::add_generic_response_model(&mut models);
        models
    }

    #[test]
    fn test_path_and_query_params_split() {
        let documents = load_one(&items_spec());
        let mut warnings = Vec::new();
        let clients = extract(&documents, &item_models(), &BTreeMap::new(), &mut warnings);
        assert_eq!(clients.len(), 1);
        let client = &clients[0];
        assert_eq!(client.class_name, "InventoryClient");
        assert_eq!(client.base_url.as_deref(), Some("https://api.example.com"));

        let endpoint = &client.endpoints[0];
        assert_eq!(endpoint.operation_id, "Inventory_GetItem");
        assert_eq!(endpoint.method_name, "getitem");
        assert_eq!(endpoint.uri, "/Inventory/items/{0}");
        let path_names: Vec<_> = endpoint.path_params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(path_names, vec!["id"]);
        let query_names: Vec<_> = endpoint.query_params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(query_names, vec!["limit"]);
        assert!(endpoint.path_params[0].required);
        assert!(!endpoint.query_params[0].required);
        assert_eq!(endpoint.query_params[0].ty.to_string(), "int");
        assert_eq!(endpoint.response_model, "Item");
    }

    #[test]
    fn test_missing_operation_id_is_skipped_with_warning() {
        let mut spec = items_spec();
        let op = spec
            .pointer_mut("/paths/~1items~1{id}/get")
            .and_then(|op| op.as_object_mut())
            .unwrap();
        op.remove("operationId");
        let documents = load_one(&spec);
        let mut warnings = Vec::new();
        let clients = extract(&documents, &item_models(), &BTreeMap::new(), &mut warnings);
        assert!(clients[0].endpoints.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_untyped_response_uses_generic_marker() {
        let mut spec = items_spec();
        let responses = spec
            .pointer_mut("/paths/~1items~1{id}/get/responses")
            .unwrap();
        *responses = serde_json::json!({});
        let documents = load_one(&spec);
        let mut warnings = Vec::new();
        let clients = extract(&documents, &item_models(), &BTreeMap::new(), &mut warnings);
        assert_eq!(
            clients[0].endpoints[0].response_model,
            GENERIC_RESPONSE_MODEL
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_response_model_resolves_through_rename_map() {
        let documents = load_one(&items_spec());
        let mut models = BTreeMap::new();
        models.insert(
            "CanonicalItem".to_string(),
            ModelDefinition::object("CanonicalItem", vec![]),
        );
        let reference_map: BTreeMap<String, String> =
            [("Item".to_string(), "CanonicalItem".to_string())]
                .into_iter()
                .collect();
        let mut warnings = Vec::new();
        let clients = extract(&documents, &models, &reference_map, &mut warnings);
        assert_eq!(clients[0].endpoints[0].response_model, "CanonicalItem");
    }

    #[test]
    fn test_join_url_paths() {
        assert_eq!(join_url_paths("/Line", "/Meta/Modes"), "/Line/Meta/Modes");
        assert_eq!(join_url_paths("/AirQuality", "/"), "/AirQuality/");
        assert_eq!(join_url_paths("", "/items"), "/items");
    }
}
