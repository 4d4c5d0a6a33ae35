//! tree-sitter front end shared by the source analyzer and the config loader.

use anyhow::{anyhow, bail, Context};
use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

/// Grammar used to parse a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    JavaScript,
    TypeScript,
    Tsx,
}

impl SourceLanguage {
    /// Pick the grammar from the file extension; `None` means "not a source file"
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ts" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            "js" | "mjs" | "cjs" | "jsx" => Some(SourceLanguage::JavaScript),
            _ => None,
        }
    }

    fn grammar(self) -> Language {
        match self {
            SourceLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Parse `source`, rejecting any tree that needed error recovery.
///
/// tree-sitter always produces a tree; a file only counts as parsed when that
/// tree is free of ERROR and MISSING nodes.
///
/// JavaScript that the JavaScript grammar rejects is retried with the
/// TypeScript and then the TSX grammar, so `.js` files carrying type
/// annotations still parse. The JavaScript error is returned when every
/// grammar rejects the source.
pub fn parse_source(language: SourceLanguage, source: &str) -> anyhow::Result<Tree> {
    let err = match parse_with(language, source) {
        Ok(tree) => return Ok(tree),
        Err(e) => e,
    };
    if language != SourceLanguage::JavaScript {
        return Err(err);
    }
    [SourceLanguage::TypeScript, SourceLanguage::Tsx]
        .into_iter()
        .find_map(|fallback| parse_with(fallback, source).ok())
        .ok_or(err)
}

fn parse_with(language: SourceLanguage, source: &str) -> anyhow::Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| anyhow!("failed to load {language:?} grammar: {e}"))?;
    let tree = parser
        .parse(source, None)
        .context("parser returned no syntax tree")?;
    if let Some(node) = first_error(tree.root_node()) {
        let pos = node.start_position();
        if node.is_missing() {
            bail!(
                "missing `{}` at line {}, column {}",
                node.kind(),
                pos.row + 1,
                pos.column + 1
            );
        }
        bail!(
            "unexpected syntax at line {}, column {}",
            pos.row + 1,
            pos.column + 1
        );
    }
    Ok(tree)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Named children of `node`, comments excluded
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

/// Whether `node` has an anonymous child token spelled `token`
pub fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

/// Source text covered by `node`
pub fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> anyhow::Result<&'s str> {
    Ok(node.utf8_text(source)?)
}

/// Strip `( … )`, `… as T`, `… satisfies T` and `…!` wrappers
pub fn unwrap_expression(mut node: Node<'_>) -> Node<'_> {
    while matches!(
        node.kind(),
        "parenthesized_expression" | "as_expression" | "satisfies_expression" | "non_null_expression"
    ) {
        match named_children(node).into_iter().next() {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_language_from_path() {
        assert_eq!(
            SourceLanguage::from_path(Path::new("a/index.ts")),
            Some(SourceLanguage::TypeScript)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("a/index.MJS")),
            Some(SourceLanguage::JavaScript)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("page.tsx")),
            Some(SourceLanguage::Tsx)
        );
        assert_eq!(SourceLanguage::from_path(Path::new("README.md")), None);
        assert_eq!(SourceLanguage::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_parse_valid_typescript() {
        let src = "import type { Request } from 'express';\n\
                   export default function handler (req: Request, res: any) { res.send('ok'); }\n";
        let tree = parse_source(SourceLanguage::TypeScript, src).unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_parse_rejects_broken_source() {
        let src = "export function handler (req, res) {\n  res.send('oops'\n";
        let err = parse_source(SourceLanguage::JavaScript, src).unwrap_err();
        assert!(err.to_string().contains("line"), "{err}");
    }

    #[test]
    fn test_javascript_with_type_annotations_falls_back_to_typescript() {
        let src = "export function handler(req: Request, res: any): void { res.send('ok'); }\n";
        assert!(parse_with(SourceLanguage::JavaScript, src).is_err());
        let tree = parse_source(SourceLanguage::JavaScript, src).unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_javascript_with_jsx_and_annotations_falls_back_to_tsx() {
        let src = "export const handler = (req: any, res: any) => res.send(<p>ok</p>);\n";
        assert!(parse_source(SourceLanguage::JavaScript, src).is_ok());
    }

    #[test]
    fn test_unwrap_expression_strips_as_const() {
        let src = "const x = ({ a: 1 } as const);";
        let tree = parse_source(SourceLanguage::TypeScript, src).unwrap();
        let decl = named_children(tree.root_node())[0];
        let declarator = named_children(decl)[0];
        let value = declarator.child_by_field_name("value").unwrap();
        assert_eq!(unwrap_expression(value).kind(), "object");
    }
}
