//! Mermaid class-diagram emission for the model dependency graph.

use std::fmt::Write as _;

use super::Emit;
use crate::model::resolver::Resolution;

/// The `class_diagram.mmd` file: one edge line per dependency, in emission
/// order, and a bare `class` line for dependency-free models.
pub struct DiagramUnit<'a> {
    resolution: &'a Resolution,
}

impl<'a> DiagramUnit<'a> {
    pub fn new(resolution: &'a Resolution) -> Self {
        DiagramUnit { resolution }
    }
}

impl Emit for DiagramUnit<'_> {
    fn emit(&self) -> String {
        let mut out = String::from("classDiagram\n");
        for model in &self.resolution.order {
            match self.resolution.dependencies.get(model) {
                Some(deps) if !deps.is_empty() => {
                    for dep in deps {
                        let _ = writeln!(out, "    {model} --> {dep}");
                    }
                }
                _ => {
                    let _ = writeln!(out, "    class {model}");
                }
            }
        }
        out
    }
}
