//! OpenAPI specification structs for serde deserialization.
//!
//! A minimal subset of OpenAPI 3.x: objects, arrays, enums, references and
//! simple scalar types. Documents are parsed from `serde_json::Value` (after
//! the loader's rename rewrite) rather than straight from text.
//!
//! `BTreeMap` is used for every map that can reach generated output, so
//! iteration order is deterministic regardless of input key order.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One interface-description document.
#[derive(Debug, Deserialize)]
pub struct Document {
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    pub components: Option<Components>,
}

/// Document metadata; the title keys the rename table.
#[derive(Debug, Deserialize)]
pub struct Info {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub url: String,
}

/// Components section containing reusable schemas.
#[derive(Debug, Deserialize)]
pub struct Components {
    pub schemas: Option<BTreeMap<String, Schema>>,
}

/// A path item containing operations for different HTTP methods.
#[derive(Debug, Deserialize)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub post: Option<Operation>,
    pub put: Option<Operation>,
    pub patch: Option<Operation>,
    pub delete: Option<Operation>,
}

impl PathItem {
    /// Operations in a fixed method order, for deterministic extraction.
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("get", self.get.as_ref()),
            ("post", self.post.as_ref()),
            ("put", self.put.as_ref()),
            ("patch", self.patch.as_ref()),
            ("delete", self.delete.as_ref()),
        ]
        .into_iter()
        .filter_map(|(m, op)| op.map(|op| (m, op)))
    }
}

/// An API operation (endpoint).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
}

/// A parameter (query or path).
#[derive(Debug, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    pub schema: Option<Schema>,
    pub description: Option<String>,
    pub example: Option<serde_json::Value>,
}

/// A response definition.
#[derive(Debug, Deserialize)]
pub struct Response {
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// Media type content (e.g. application/json).
#[derive(Debug, Deserialize)]
pub struct MediaType {
    pub schema: Option<Schema>,
}

/// A schema entry: one named type definition (object, array, enum or
/// scalar). Created by the loader, consumed once by the model builder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: Option<String>,

    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    pub properties: Option<BTreeMap<String, Schema>>,

    pub required: Option<Vec<String>>,

    pub items: Option<Box<Schema>>,

    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<serde_json::Value>>,
}

impl Document {
    /// Deserialize a document from a (possibly rename-rewritten) JSON tree.
    pub fn from_value(value: serde_json::Value, path: &std::path::Path) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::SpecParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The path component of the document's declared base URL, e.g.
    /// `https://api.tfl.gov.uk/AirQuality` -> `/AirQuality`.
    pub fn base_path(&self) -> String {
        let Some(server) = self.servers.first() else {
            return String::new();
        };
        match url::Url::parse(&server.url) {
            Ok(parsed) => parsed.path().trim_end_matches('/').to_string(),
            // Relative server URLs are already a path.
            Err(_) => server.url.trim_end_matches('/').to_string(),
        }
    }

    /// The origin of the document's declared base URL, used as the default
    /// base URL for generated client configs.
    pub fn base_origin(&self) -> Option<String> {
        let server = self.servers.first()?;
        let parsed = url::Url::parse(&server.url).ok()?;
        let host = parsed.host_str()?;
        Some(match parsed.port() {
            Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
            None => format!("{}://{}", parsed.scheme(), host),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_document_from_value() {
        let value: serde_json::Value = serde_json::from_str(
            r##"{
              "info": { "title": "Air Quality" },
              "servers": [{ "url": "https://api.tfl.gov.uk/AirQuality" }],
              "paths": { "/": { "get": { "operationId": "AirQuality_Get", "responses": {} } } },
              "components": { "schemas": { "LondonAirForecast": { "type": "object", "properties": {} } } }
            }"##,
        )
        .unwrap();
        let doc = Document::from_value(value, Path::new("air.json")).unwrap();
        assert_eq!(doc.info.title, "Air Quality");
        assert_eq!(doc.base_path(), "/AirQuality");
        assert_eq!(doc.base_origin().unwrap(), "https://api.tfl.gov.uk");
        let item = doc.paths.get("/").unwrap();
        let ops: Vec<_> = item.operations().collect();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].0, "get");
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let value = serde_json::json!({ "servers": [] });
        let err = Document::from_value(value, Path::new("bad.json")).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_base_path_without_servers() {
        let value = serde_json::json!({ "info": { "title": "T" }, "paths": {} });
        let doc = Document::from_value(value, Path::new("t.json")).unwrap();
        assert_eq!(doc.base_path(), "");
        assert!(doc.base_origin().is_none());
    }
}
