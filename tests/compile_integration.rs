//! End-to-end compilations into temporary directories.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use pydanticgen::{compile, CompileOptions};

fn write_spec(dir: &Path, name: &str, json: &serde_json::Value) {
    fs::write(dir.join(name), serde_json::to_string_pretty(json).unwrap()).unwrap();
}

fn options(spec_dir: &Path, output_dir: &Path) -> CompileOptions {
    CompileOptions {
        spec_dir: spec_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        renames: None,
        array_wrappers: None,
        base_url: None,
    }
}

/// Every file under `root`, keyed by relative path.
fn read_tree(root: &Path) -> BTreeMap<PathBuf, String> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(rel, fs::read_to_string(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

fn foo_doc() -> serde_json::Value {
    serde_json::json!({
        "info": { "title": "Foo Service" },
        "servers": [{ "url": "https://api.example.com/Foo" }],
        "paths": {
            "/current": {
                "get": {
                    "operationId": "Foo_Current",
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Foo" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Foo": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "partner": { "$ref": "#/components/schemas/Bar" }
                    }
                }
            }
        }
    })
}

fn bar_doc() -> serde_json::Value {
    serde_json::json!({
        "info": { "title": "Bar Service" },
        "servers": [{ "url": "https://api.example.com/Bar" }],
        "paths": {},
        "components": {
            "schemas": {
                "Bar": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "partner": { "$ref": "#/components/schemas/Foo" }
                    }
                }
            }
        }
    })
}

fn inventory_doc() -> serde_json::Value {
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
                            "schema": { "type": "string" }
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
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Item" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Item": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {
                        "id": { "type": "string" },
                        "tags": { "type": "array", "items": { "type": "string" } }
                    }
                }
            }
        }
    })
}

#[test]
fn mutual_cycle_compiles_with_deferred_references() {
    let spec_dir = tempfile::tempdir().unwrap();
    write_spec(spec_dir.path(), "foo.json", &foo_doc());
    write_spec(spec_dir.path(), "bar.json", &bar_doc());
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("generated");

    let report = compile(&options(spec_dir.path(), &output)).unwrap();
    assert_eq!(report.models, 3); // Foo, Bar, GenericResponseModel
    assert_eq!(report.clients, 2);

    let foo = fs::read_to_string(output.join("models/Foo.py")).unwrap();
    let bar = fs::read_to_string(output.join("models/Bar.py")).unwrap();
    assert!(foo.contains("partner: Optional['Bar'] = Field(None)"), "{foo}");
    assert!(bar.contains("partner: Optional['Foo'] = Field(None)"), "{bar}");
    assert!(foo.trim_end().ends_with("Foo.model_rebuild()"));
    assert!(bar.trim_end().ends_with("Bar.model_rebuild()"));
    // Cyclic imports come after the class body.
    assert!(!foo.starts_with("from .Bar"));
    assert!(foo.contains("\nfrom .Bar import Bar\nFoo.model_rebuild()"));

    let init = fs::read_to_string(output.join("models/__init__.py")).unwrap();
    assert!(init.contains("from .Foo import Foo"));
    assert!(init.contains("ResponseModelName = Literal["));
    assert!(init.contains("\"GenericResponseModel\""));
    assert!(output.join("models/GenericResponseModel.py").exists());
    assert!(output.join("class_diagram.mmd").exists());
}

#[test]
fn path_and_query_parameters_reach_the_registry() {
    let spec_dir = tempfile::tempdir().unwrap();
    write_spec(spec_dir.path(), "inventory.json", &inventory_doc());
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("generated");

    compile(&options(spec_dir.path(), &output)).unwrap();

    let config = fs::read_to_string(output.join("clients/InventoryClient_config.py")).unwrap();
    assert!(config.contains("base_url = \"https://api.example.com\""));
    assert!(config.contains(
        "'Inventory_GetItem': {'uri': '/Inventory/items/{0}', 'model': 'ItemArray'}"
    ));

    let client = fs::read_to_string(output.join("clients/InventoryClient.py")).unwrap();
    assert!(client.contains(
        "def getitem(self, id: str, limit: int | None = None) -> ResponseModel[ItemArray] | ApiError:"
    ));
    assert!(client.contains("params=[id], endpoint_args={'limit': limit}"));

    // The bare-array response synthesized a wrapper model.
    let array = fs::read_to_string(output.join("models/ItemArray.py")).unwrap();
    assert!(array.contains("class ItemArray(RootModel[list[Item]]):"));

    let item = fs::read_to_string(output.join("models/Item.py")).unwrap();
    assert!(item.contains("id: str = Field(...)"));
    assert!(item.contains("tags: Optional[list[str]] = Field(None)"));

    let clients_init = fs::read_to_string(output.join("clients/__init__.py")).unwrap();
    assert!(clients_init.contains("from .InventoryClient import InventoryClient"));
}

#[test]
fn reruns_are_byte_identical() {
    let spec_dir = tempfile::tempdir().unwrap();
    write_spec(spec_dir.path(), "foo.json", &foo_doc());
    write_spec(spec_dir.path(), "bar.json", &bar_doc());
    write_spec(spec_dir.path(), "inventory.json", &inventory_doc());
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("generated");

    compile(&options(spec_dir.path(), &output)).unwrap();
    let first = read_tree(&output);
    compile(&options(spec_dir.path(), &output)).unwrap();
    let second = read_tree(&output);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn base_url_override_wins() {
    let spec_dir = tempfile::tempdir().unwrap();
    write_spec(spec_dir.path(), "inventory.json", &inventory_doc());
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("generated");

    let mut opts = options(spec_dir.path(), &output);
    opts.base_url = Some("https://staging.example.com".to_string());
    compile(&opts).unwrap();

    let config = fs::read_to_string(output.join("clients/InventoryClient_config.py")).unwrap();
    assert!(config.contains("base_url = \"https://staging.example.com\""));
}

#[test]
fn rename_table_changes_generated_names() {
    let spec_dir = tempfile::tempdir().unwrap();
    write_spec(spec_dir.path(), "inventory.json", &inventory_doc());
    let renames_file = spec_dir.path().join("renames.config.json5.txt");
    fs::write(
        &renames_file,
        r##"{ "Inventory": { "Item": "StockItem" } }"##,
    )
    .unwrap();
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("generated");

    let mut opts = options(spec_dir.path(), &output);
    opts.renames = Some(renames_file);
    compile(&opts).unwrap();

    assert!(output.join("models/StockItem.py").exists());
    assert!(!output.join("models/Item.py").exists());
    let config = fs::read_to_string(output.join("clients/InventoryClient_config.py")).unwrap();
    assert!(config.contains("'model': 'StockItemArray'"));
}
