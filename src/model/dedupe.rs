//! Structural deduplication of the model universe.
//!
//! Identically shaped models collapse onto a single canonical definition
//! (the alphabetically first name), and every reference to a collapsed name
//! is rewritten. Collapsing can make wrapper models newly identical, so the
//! pass repeats until a fixpoint.
//!
//! Map-rooted and opaque-rooted models never deduplicate; their shapes are
//! intentionally permissive and merging them would conflate unrelated
//! payloads.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::debug;

use crate::model::types::{ModelDefinition, RootKind, TypeDescriptor};

/// Collapse duplicates and return the canonical universe plus the rename
/// map (`duplicate name -> canonical name`, chains already resolved).
pub fn deduplicate(
    mut models: BTreeMap<String, ModelDefinition>,
) -> (BTreeMap<String, ModelDefinition>, BTreeMap<String, String>) {
    let mut reference_map: BTreeMap<String, String> = BTreeMap::new();

    loop {
        let mut canonical_by_shape: BTreeMap<String, String> = BTreeMap::new();
        let mut collapsed: Vec<(String, String)> = Vec::new();

        for (name, model) in &models {
            let Some(shape) = fingerprint(model) else {
                continue;
            };
            match canonical_by_shape.get(&shape) {
                Some(canonical) => collapsed.push((name.clone(), canonical.clone())),
                None => {
                    canonical_by_shape.insert(shape, name.clone());
                }
            }
        }

        if collapsed.is_empty() {
            break;
        }

        for (dup, canonical) in &collapsed {
            models.remove(dup);
            reference_map.insert(dup.clone(), canonical.clone());
        }
        for model in models.values_mut() {
            for field in &mut model.fields {
                rewrite(&mut field.ty, &reference_map);
            }
            if let Some(root) = &mut model.root {
                rewrite(root, &reference_map);
            }
        }
    }

    // Resolve chains so every entry points at a surviving model.
    let resolved: BTreeMap<String, String> = reference_map
        .keys()
        .map(|dup| (dup.clone(), resolve(dup, &reference_map)))
        .collect();

    if !resolved.is_empty() {
        debug!(collapsed = resolved.len(), "duplicate models collapsed");
    }
    (models, resolved)
}

/// Canonical name for `name`, following the rename map through chains.
pub fn resolve(name: &str, reference_map: &BTreeMap<String, String>) -> String {
    let mut current = name;
    while let Some(next) = reference_map.get(current) {
        current = next;
    }
    current.to_string()
}

/// Structural fingerprint, or `None` for models that never deduplicate.
fn fingerprint(model: &ModelDefinition) -> Option<String> {
    match model.kind {
        RootKind::Object => {
            let mut shape = String::from("object");
            for field in &model.fields {
                let _ = write!(
                    shape,
                    "|{}:{}:{}:{}",
                    field.name,
                    field.ty,
                    field.alias.as_deref().unwrap_or(""),
                    field.required
                );
            }
            Some(shape)
        }
        RootKind::List => model.root.as_ref().map(|root| format!("list|{root}")),
        RootKind::Map | RootKind::Opaque => None,
    }
}

fn rewrite(ty: &mut TypeDescriptor, reference_map: &BTreeMap<String, String>) {
    match ty {
        TypeDescriptor::Reference(name) | TypeDescriptor::Deferred(name) => {
            if reference_map.contains_key(name) {
                *name = resolve(name, reference_map);
            }
        }
        TypeDescriptor::List(inner) => rewrite(inner, reference_map),
        TypeDescriptor::Map(key, value) => {
            rewrite(key, reference_map);
            rewrite(value, reference_map);
        }
        TypeDescriptor::Primitive(_) | TypeDescriptor::Enum(_) => {}
    }
}
