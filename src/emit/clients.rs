//! Client class, endpoint registry and clients-package index emission.
//!
//! Generated clients subclass a `Client` base class from the enclosing
//! package's `core` module and dispatch every call through
//! `_send_request_and_deserialize`; the HTTP runtime itself is outside the
//! compiler.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use super::Emit;
use crate::endpoints::{ClientDescriptor, EndpointDescriptor, ParamDescriptor};

/// One `<Class>.py` client file.
pub struct ClientUnit<'a> {
    client: &'a ClientDescriptor,
}

impl<'a> ClientUnit<'a> {
    pub fn new(client: &'a ClientDescriptor) -> Self {
        ClientUnit { client }
    }

    pub fn class_name(&self) -> &str {
        &self.client.class_name
    }

    /// Path params, then required query params, then optional query params.
    fn signature_params(endpoint: &EndpointDescriptor) -> Vec<&ParamDescriptor> {
        let mut params: Vec<&ParamDescriptor> = endpoint
            .path_params
            .iter()
            .chain(endpoint.query_params.iter())
            .collect();
        params.sort_by_key(|p| !p.required);
        params
    }

    fn signature(endpoint: &EndpointDescriptor) -> String {
        let mut parts = vec!["self".to_string()];
        for param in Self::signature_params(endpoint) {
            if param.required {
                parts.push(format!("{}: {}", param.py_name, param.ty));
            } else {
                parts.push(format!("{}: {} | None = None", param.py_name, param.ty));
            }
        }
        parts.join(", ")
    }

    fn docstring(endpoint: &EndpointDescriptor, out: &mut String) {
        out.push_str("        '''\n");
        let description = endpoint
            .description
            .as_deref()
            .unwrap_or("No description provided.");
        let _ = writeln!(out, "        {description}");
        let _ = writeln!(out, "\n        Query path: `{}`", endpoint.path);
        let _ = writeln!(
            out,
            "\n        `ResponseModel.content` contains `models.{}` type.",
            endpoint.response_model
        );
        out.push_str("\n        Parameters:\n");
        let params = Self::signature_params(endpoint);
        if params.is_empty() {
            out.push_str("        No parameters required.\n");
        } else {
            for param in params {
                let description = param.description.as_deref().unwrap_or("").trim_end();
                let _ = write!(
                    out,
                    "        `{}`: {} - {}",
                    param.py_name, param.ty, description
                );
                if let Some(example) = &param.example {
                    let _ = write!(out, " Example: `{example}`");
                }
                out.push('\n');
            }
        }
        out.push_str("        '''\n");
    }

    fn dispatch(endpoint: &EndpointDescriptor) -> String {
        let endpoint_args = if endpoint.query_params.is_empty() {
            "endpoint_args=None".to_string()
        } else {
            let pairs: Vec<String> = endpoint
                .query_params
                .iter()
                .map(|p| format!("'{}': {}", p.name, p.py_name))
                .collect();
            format!("endpoint_args={{{}}}", pairs.join(", "))
        };

        if endpoint.path_params.is_empty() {
            format!(
                "        return self._send_request_and_deserialize(base_url, endpoints['{}'], {})\n",
                endpoint.operation_id, endpoint_args
            )
        } else {
            let positional: Vec<&str> = endpoint
                .path_params
                .iter()
                .map(|p| p.py_name.as_str())
                .collect();
            format!(
                "        return self._send_request_and_deserialize(base_url, endpoints['{}'], params=[{}], {})\n",
                endpoint.operation_id,
                positional.join(", "),
                endpoint_args
            )
        }
    }
}

impl Emit for ClientUnit<'_> {
    fn emit(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "from .{}_config import base_url, endpoints",
            self.client.class_name
        );
        out.push_str("from ..core import ApiError, Client, ResponseModel\n");

        let response_models: BTreeSet<&str> = self
            .client
            .endpoints
            .iter()
            .map(|e| e.response_model.as_str())
            .collect();
        if !response_models.is_empty() {
            let names: Vec<&str> = response_models.into_iter().collect();
            let _ = writeln!(out, "from ..models import {}", names.join(", "));
        }

        let _ = write!(out, "\n\nclass {}(Client):\n", self.client.class_name);
        if self.client.endpoints.is_empty() {
            out.push_str("    pass\n");
            return out;
        }

        for (index, endpoint) in self.client.endpoints.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            let _ = writeln!(
                out,
                "    def {}({}) -> ResponseModel[{}] | ApiError:",
                endpoint.method_name,
                Self::signature(endpoint),
                endpoint.response_model
            );
            Self::docstring(endpoint, &mut out);
            out.push_str(&Self::dispatch(endpoint));
        }
        out
    }
}

/// One `<Class>_config.py` endpoint registry.
pub struct ClientConfigUnit<'a> {
    client: &'a ClientDescriptor,
    base_url: &'a str,
}

impl<'a> ClientConfigUnit<'a> {
    pub fn new(client: &'a ClientDescriptor, base_url: &'a str) -> Self {
        ClientConfigUnit { client, base_url }
    }

    pub fn class_name(&self) -> &str {
        &self.client.class_name
    }
}

impl Emit for ClientConfigUnit<'_> {
    fn emit(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "base_url = \"{}\"", self.base_url);
        out.push_str("endpoints = {\n");
        for endpoint in &self.client.endpoints {
            let _ = writeln!(
                out,
                "    '{}': {{'uri': '{}', 'model': '{}'}},",
                endpoint.operation_id, endpoint.uri, endpoint.response_model
            );
        }
        out.push_str("}\n");
        out
    }
}

/// The `clients/__init__.py` file.
pub struct ClientsInitUnit<'a> {
    clients: &'a [(ClientDescriptor, String)],
}

impl<'a> ClientsInitUnit<'a> {
    pub fn new(clients: &'a [(ClientDescriptor, String)]) -> Self {
        ClientsInitUnit { clients }
    }
}

impl Emit for ClientsInitUnit<'_> {
    fn emit(&self) -> String {
        let mut names: Vec<&str> = self
            .clients
            .iter()
            .map(|(client, _)| client.class_name.as_str())
            .collect();
        names.sort_unstable();

        let mut out = String::new();
        for name in &names {
            let _ = writeln!(out, "from .{name} import {name}");
        }
        out.push_str("\n__all__ = [\n");
        let quoted: Vec<String> = names.iter().map(|n| format!("    '{n}'")).collect();
        out.push_str(&quoted.join(",\n"));
        out.push_str("\n]\n");
        out
    }
}
