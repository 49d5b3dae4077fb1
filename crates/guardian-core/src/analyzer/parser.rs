//! Language front-ends used by the structural analyzer and the test executor.
//!
//! A front-end turns raw source text into either a flat list of declarations
//! or a located syntax failure. Parsing is backed by native tree-sitter
//! grammars; a fresh `tree_sitter::Parser` is built per call so front-ends
//! stay `Send + Sync` without locking.

use std::sync::Arc;

use tree_sitter::{Node, Parser, Tree};

use crate::config::SourceLanguage;
use crate::errors::{GuardianError, GuardianResult};
use crate::models::{ClassInfo, FunctionInfo};

/// Declarations collected from a unit that parsed cleanly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Declarations {
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub imports: Vec<String>,
}

/// First syntax problem found in a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxFailure {
    pub message: String,
    /// 1-based line, when the grammar could locate the problem.
    pub line: Option<usize>,
}

impl std::fmt::Display for SyntaxFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {})", self.message, line),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(Declarations),
    Failed(SyntaxFailure),
}

/// Tokenize + declaration-walk capability for one source grammar.
///
/// `Err` is reserved for front-end failures (grammar could not be loaded);
/// malformed input is reported as [`ParseOutcome::Failed`].
pub trait FrontEnd: Send + Sync {
    fn language(&self) -> &'static str;

    fn parse(&self, source: &str) -> GuardianResult<ParseOutcome>;

    /// Syntax check without the declaration walk.
    fn check_syntax(&self, source: &str) -> GuardianResult<Option<SyntaxFailure>> {
        match self.parse(source)? {
            ParseOutcome::Parsed(_) => Ok(None),
            ParseOutcome::Failed(failure) => Ok(Some(failure)),
        }
    }
}

/// Build the front-end for a configured language.
pub fn front_end_for(language: SourceLanguage) -> Arc<dyn FrontEnd> {
    match language {
        SourceLanguage::Python => Arc::new(PythonFrontEnd),
        SourceLanguage::Go => Arc::new(GoFrontEnd),
    }
}

// ---------------------------------------------------------------------------
// Shared tree-sitter helpers
// ---------------------------------------------------------------------------

fn parse_tree(language: tree_sitter::Language, source: &str) -> GuardianResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| GuardianError::FrontEnd(format!("Failed to set language: {e}")))?;
    parser
        .parse(source.as_bytes(), None)
        .ok_or_else(|| GuardianError::FrontEnd("Parser returned no tree".to_string()))
}

/// Depth-first search for the first ERROR or MISSING node.
fn first_syntax_error(root: Node<'_>) -> Option<SyntaxFailure> {
    if !root.has_error() {
        return None;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            let message = if node.is_missing() {
                format!(
                    "missing `{}` at column {}",
                    node.kind(),
                    pos.column + 1
                )
            } else {
                format!("invalid syntax at column {}", pos.column + 1)
            };
            return Some(SyntaxFailure {
                message,
                line: Some(pos.row + 1),
            });
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node
            .children(&mut cursor)
            .filter(|c| c.has_error() || c.is_missing())
            .collect();
        // Reverse so the earliest child is popped first.
        stack.extend(children.into_iter().rev());
    }
    Some(SyntaxFailure {
        message: "invalid syntax".to_string(),
        line: None,
    })
}

fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node.named_children(&mut cursor).collect();
    children
}

// ---------------------------------------------------------------------------
// Python
// ---------------------------------------------------------------------------

pub struct PythonFrontEnd;

impl FrontEnd for PythonFrontEnd {
    fn language(&self) -> &'static str {
        "python"
    }

    fn parse(&self, source: &str) -> GuardianResult<ParseOutcome> {
        let tree = parse_tree(tree_sitter_python::LANGUAGE.into(), source)?;
        let root = tree.root_node();
        if let Some(failure) = first_syntax_error(root).or_else(|| python2_statement(root)) {
            return Ok(ParseOutcome::Failed(failure));
        }
        let mut decls = Declarations::default();
        python_walk(root, source, &mut decls);
        Ok(ParseOutcome::Parsed(decls))
    }
}

/// The grammar still accepts Python 2 `print` and `exec` statements; both
/// are syntax errors under Python 3.
fn python2_statement(root: Node<'_>) -> Option<SyntaxFailure> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let keyword = match node.kind() {
            "print_statement" => Some("print"),
            "exec_statement" => Some("exec"),
            _ => None,
        };
        if let Some(keyword) = keyword {
            let pos = node.start_position();
            return Some(SyntaxFailure {
                message: format!(
                    "Python 2 `{keyword}` statement at column {}",
                    pos.column + 1
                ),
                line: Some(pos.row + 1),
            });
        }
        stack.extend(named_children(node).into_iter().rev());
    }
    None
}

fn python_walk(node: Node<'_>, source: &str, decls: &mut Declarations) {
    match node.kind() {
        "function_definition" => {
            if let Some(name) = node.child_by_field_name("name") {
                let arg_count = node
                    .child_by_field_name("parameters")
                    .map(python_arg_count)
                    .unwrap_or(0);
                decls.functions.push(FunctionInfo {
                    name: node_text(name, source).to_string(),
                    arg_count,
                    line: line_of(node),
                });
            }
        }
        "class_definition" => {
            if let Some(name) = node.child_by_field_name("name") {
                let methods = node
                    .child_by_field_name("body")
                    .map(|body| python_methods(body, source))
                    .unwrap_or_default();
                decls.classes.push(ClassInfo {
                    name: node_text(name, source).to_string(),
                    line: line_of(node),
                    methods,
                });
            }
        }
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                decls
                    .imports
                    .push(format!("import {}", python_import_target(name, source)));
            }
            return;
        }
        "future_import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                decls.imports.push(format!(
                    "from __future__ import {}",
                    python_import_target(name, source)
                ));
            }
            return;
        }
        "import_from_statement" => {
            let module = node
                .child_by_field_name("module_name")
                .map(|m| node_text(m, source).to_string())
                .unwrap_or_default();
            let mut cursor = node.walk();
            let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
            if names.is_empty() {
                // `from x import *`
                decls.imports.push(format!("from {module} import *"));
            }
            for name in names {
                decls.imports.push(format!(
                    "from {module} import {}",
                    python_import_target(name, source)
                ));
            }
            return;
        }
        _ => {}
    }
    for child in named_children(node) {
        python_walk(child, source, decls);
    }
}

/// Aliases are dropped: `import numpy as np` normalizes to `import numpy`.
fn python_import_target<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    if node.kind() == "aliased_import" {
        if let Some(name) = node.child_by_field_name("name") {
            return node_text(name, source);
        }
    }
    node_text(node, source)
}

/// Positional-or-keyword parameters, `self` included. Splats and anything
/// after a bare `*` are not counted.
fn python_arg_count(parameters: Node<'_>) -> usize {
    let mut count = 0;
    for param in named_children(parameters) {
        match param.kind() {
            "identifier" | "default_parameter" | "typed_default_parameter" => count += 1,
            "typed_parameter" => {
                let splat = named_children(param).iter().any(|c| {
                    matches!(c.kind(), "list_splat_pattern" | "dictionary_splat_pattern")
                });
                if splat {
                    break;
                }
                count += 1;
            }
            "list_splat_pattern" | "keyword_separator" | "dictionary_splat_pattern" => break,
            _ => {}
        }
    }
    count
}

fn python_methods(body: Node<'_>, source: &str) -> Vec<String> {
    let mut methods = Vec::new();
    for stmt in named_children(body) {
        let def = match stmt.kind() {
            "function_definition" => Some(stmt),
            "decorated_definition" => stmt
                .child_by_field_name("definition")
                .filter(|d| d.kind() == "function_definition"),
            _ => None,
        };
        if let Some(name) = def.and_then(|d| d.child_by_field_name("name")) {
            methods.push(node_text(name, source).to_string());
        }
    }
    methods
}

// ---------------------------------------------------------------------------
// Go
// ---------------------------------------------------------------------------

pub struct GoFrontEnd;

impl FrontEnd for GoFrontEnd {
    fn language(&self) -> &'static str {
        "go"
    }

    fn parse(&self, source: &str) -> GuardianResult<ParseOutcome> {
        let tree = parse_tree(tree_sitter_go::LANGUAGE.into(), source)?;
        let root = tree.root_node();
        if let Some(failure) = first_syntax_error(root) {
            return Ok(ParseOutcome::Failed(failure));
        }
        let mut decls = Declarations::default();
        // (receiver type, method name)
        let mut receivers: Vec<(String, String)> = Vec::new();
        go_walk(root, source, &mut decls, &mut receivers);
        for (receiver, method) in receivers {
            if let Some(class) = decls.classes.iter_mut().find(|c| c.name == receiver) {
                class.methods.push(method);
            }
        }
        Ok(ParseOutcome::Parsed(decls))
    }
}

fn go_walk(
    node: Node<'_>,
    source: &str,
    decls: &mut Declarations,
    receivers: &mut Vec<(String, String)>,
) {
    match node.kind() {
        "function_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                decls.functions.push(FunctionInfo {
                    name: node_text(name, source).to_string(),
                    arg_count: node
                        .child_by_field_name("parameters")
                        .map(go_arg_count)
                        .unwrap_or(0),
                    line: line_of(node),
                });
            }
        }
        "method_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                let method = node_text(name, source).to_string();
                decls.functions.push(FunctionInfo {
                    name: method.clone(),
                    arg_count: node
                        .child_by_field_name("parameters")
                        .map(go_arg_count)
                        .unwrap_or(0),
                    line: line_of(node),
                });
                if let Some(receiver) = node
                    .child_by_field_name("receiver")
                    .and_then(|r| go_receiver_type(r, source))
                {
                    receivers.push((receiver, method));
                }
            }
        }
        "type_spec" => {
            let ty = node.child_by_field_name("type");
            let is_type_decl = ty
                .map(|t| matches!(t.kind(), "struct_type" | "interface_type"))
                .unwrap_or(false);
            if let (true, Some(name)) = (is_type_decl, node.child_by_field_name("name")) {
                let methods = ty
                    .filter(|t| t.kind() == "interface_type")
                    .map(|t| go_interface_methods(t, source))
                    .unwrap_or_default();
                decls.classes.push(ClassInfo {
                    name: node_text(name, source).to_string(),
                    line: line_of(node),
                    methods,
                });
            }
        }
        "import_spec" => {
            if let Some(path) = node.child_by_field_name("path") {
                let module = node_text(path, source).trim_matches(|c| c == '"' || c == '`');
                decls.imports.push(format!("import {module}"));
            }
            return;
        }
        _ => {}
    }
    for child in named_children(node) {
        go_walk(child, source, decls, receivers);
    }
}

/// `a, b int` declares two parameters; an unnamed `int` declares one.
fn go_arg_count(parameters: Node<'_>) -> usize {
    named_children(parameters)
        .into_iter()
        .map(|param| match param.kind() {
            "parameter_declaration" => {
                let mut cursor = param.walk();
                let names = param.children_by_field_name("name", &mut cursor).count();
                names.max(1)
            }
            "variadic_parameter_declaration" => 1,
            _ => 0,
        })
        .sum()
}

fn go_receiver_type(receiver: Node<'_>, source: &str) -> Option<String> {
    let decl = named_children(receiver)
        .into_iter()
        .find(|c| c.kind() == "parameter_declaration")?;
    let ty = decl.child_by_field_name("type")?;
    let raw = node_text(ty, source).trim_start_matches('*');
    let base = raw.split('[').next().unwrap_or(raw).trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

fn go_interface_methods(interface: Node<'_>, source: &str) -> Vec<String> {
    named_children(interface)
        .into_iter()
        .filter(|c| matches!(c.kind(), "method_elem" | "method_spec"))
        .filter_map(|c| c.child_by_field_name("name"))
        .map(|n| node_text(n, source).to_string())
        .collect()
}
