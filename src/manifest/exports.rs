//! Export detection over a parsed module.
//!
//! Only top-level `export` statements are inspected; nested declarations and
//! re-exports never qualify a file.

use serde_json::Value;
use tree_sitter::{Node, Tree};

use super::literal;
use super::syntax::{has_token, named_children, node_text, unwrap_expression};

/// How the qualifying function is exported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStyle {
    /// `export default function handler …`
    Default,
    /// `export function handler …` / `export const handler = …`
    Named,
}

/// What a module exports that matters to the manifest
#[derive(Debug, Default)]
pub struct ModuleExports {
    /// The function exported under the requested name, if any
    pub function: Option<ExportStyle>,
    /// Result of evaluating an `export const config = { … }` object literal
    pub config: Option<anyhow::Result<Value>>,
}

const FUNCTION_DECLARATIONS: &[&str] = &["function_declaration", "generator_function_declaration"];
const FUNCTION_EXPRESSIONS: &[&str] = &[
    "function_expression",
    "function",
    "generator_function",
    "arrow_function",
];

/// Inspect the top level of `tree` for `export_name` and a `config` object
pub fn find_exports(tree: &Tree, source: &[u8], export_name: &str) -> ModuleExports {
    let mut exports = ModuleExports::default();
    for statement in named_children(tree.root_node()) {
        if statement.kind() != "export_statement" {
            continue;
        }
        let is_default = has_token(statement, "default");

        if let Some(declaration) = statement.child_by_field_name("declaration") {
            if FUNCTION_DECLARATIONS.contains(&declaration.kind()) {
                if declared_name(declaration, source) == Some(export_name) {
                    exports.function = Some(if is_default {
                        ExportStyle::Default
                    } else {
                        ExportStyle::Named
                    });
                }
                continue;
            }
            if is_default {
                continue;
            }
            for (name, value) in variable_bindings(declaration, source) {
                let value = unwrap_expression(value);
                if name == "config" && value.kind() == "object" {
                    exports.config = Some(literal::evaluate(value, source));
                } else if name == export_name && FUNCTION_EXPRESSIONS.contains(&value.kind()) {
                    exports.function = Some(ExportStyle::Named);
                }
            }
        } else if let Some(value) = statement.child_by_field_name("value") {
            let value = unwrap_expression(value);
            if is_default
                && FUNCTION_EXPRESSIONS.contains(&value.kind())
                && declared_name(value, source) == Some(export_name)
            {
                exports.function = Some(ExportStyle::Default);
            }
        }
    }
    exports
}

fn declared_name<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    node.child_by_field_name("name")
        .and_then(|name| node_text(name, source).ok())
}

/// `(name, initializer)` pairs of a `const`/`let`/`var` declaration
fn variable_bindings<'t, 's>(declaration: Node<'t>, source: &'s [u8]) -> Vec<(&'s str, Node<'t>)> {
    if !matches!(declaration.kind(), "lexical_declaration" | "variable_declaration") {
        return Vec::new();
    }
    named_children(declaration)
        .into_iter()
        .filter(|d| d.kind() == "variable_declarator")
        .filter_map(|declarator| {
            let name = declarator.child_by_field_name("name")?;
            if name.kind() != "identifier" {
                return None;
            }
            let value = declarator.child_by_field_name("value")?;
            Some((node_text(name, source).ok()?, value))
        })
        .collect()
}

/// Initializer of `export const <name> = …`
pub fn exported_binding<'t>(tree: &'t Tree, source: &[u8], name: &str) -> Option<Node<'t>> {
    named_children(tree.root_node())
        .into_iter()
        .filter(|s| s.kind() == "export_statement" && !has_token(*s, "default"))
        .filter_map(|s| s.child_by_field_name("declaration"))
        .flat_map(|d| variable_bindings(d, source))
        .find(|(binding, _)| *binding == name)
        .map(|(_, value)| value)
}

/// Expression of `export default …`
pub fn default_export(tree: &Tree) -> Option<Node<'_>> {
    named_children(tree.root_node())
        .into_iter()
        .filter(|s| s.kind() == "export_statement" && has_token(*s, "default"))
        .find_map(|s| s.child_by_field_name("value"))
}

/// Right-hand side of a top-level `module.exports = …`
pub fn commonjs_export<'t>(tree: &'t Tree, source: &[u8]) -> Option<Node<'t>> {
    named_children(tree.root_node())
        .into_iter()
        .filter(|s| s.kind() == "expression_statement")
        .filter_map(|s| named_children(s).into_iter().next())
        .filter(|e| e.kind() == "assignment_expression")
        .find_map(|assignment| {
            let left = assignment.child_by_field_name("left")?;
            let target = node_text(left, source).ok()?;
            if target.split_whitespace().collect::<String>() == "module.exports" {
                assignment.child_by_field_name("right")
            } else {
                None
            }
        })
}
