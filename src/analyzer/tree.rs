//! Single pass over the syntax tree.
//!
//! One recursive walk checks definitions and handlers as it meets them and
//! feeds every identifier into the [`NameTable`] as a binding or a load.

use std::collections::HashSet;

use tree_sitter::Node;

use super::naming::{self, Convention};
use super::names::NameTable;
use crate::config::AnalyzerConfig;
use crate::core::{Diagnostic, DiagnosticKind};
use crate::parser::queries::{is_decision_point, PARAMETER_NODE_TYPES, SCOPE_NODE_TYPES};
use crate::parser::{line_of, ParseResult};

/// Whether an identifier is being bound or read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    Load,
    Store,
}

/// Rows covered by multi-line string literals.
#[derive(Debug, Default)]
pub struct StringRows {
    /// 1-based lines whose end lies inside a string.
    pub ends_inside: HashSet<usize>,
    /// 1-based lines whose start lies inside a string.
    pub starts_inside: HashSet<usize>,
}

/// Output of the tree walk.
pub struct TreeFindings<'a> {
    pub diagnostics: Vec<Diagnostic>,
    pub names: NameTable<'a>,
    pub strings: StringRows,
}

pub fn walk<'a>(parsed: &ParseResult<'a>, config: &AnalyzerConfig) -> TreeFindings<'a> {
    let mut walker = Walker {
        source: parsed.source,
        config,
        findings: TreeFindings {
            diagnostics: Vec::new(),
            names: NameTable::default(),
            strings: StringRows::default(),
        },
    };
    walker.visit(parsed.root_node(), Ctx::Load);
    walker.findings
}

struct Walker<'a, 'c> {
    source: &'a str,
    config: &'c AnalyzerConfig,
    findings: TreeFindings<'a>,
}

impl<'a> Walker<'a, '_> {
    fn text(&self, node: &Node<'_>) -> &'a str {
        let source: &'a str = self.source;
        node.utf8_text(source.as_bytes()).unwrap_or("")
    }

    fn visit(&mut self, node: Node<'_>, ctx: Ctx) {
        match node.kind() {
            "identifier" => {
                let name = self.text(&node);
                match ctx {
                    Ctx::Store => self.findings.names.bind(name),
                    Ctx::Load => {
                        let pos = node.start_position();
                        self.findings.names.load(name, pos.row + 1, pos.column);
                    }
                }
            }
            "function_definition" => {
                self.check_definition(node, Convention::Value);
                self.visit_definition(node);
            }
            "class_definition" => {
                self.check_definition(node, Convention::Type);
                self.visit_definition(node);
            }
            "except_clause" => {
                self.check_except(node);
                self.visit_children(node, Ctx::Load);
            }
            "string" => {
                self.record_string_rows(node);
                self.visit_children(node, Ctx::Load);
            }
            "import_statement" | "import_from_statement" => self.record_import(node),
            "future_import_statement" => {}
            "parameters" | "lambda_parameters" => self.visit_parameters(node),
            "assignment" | "augmented_assignment" | "for_statement" | "for_in_clause" => {
                let left = node.child_by_field_name("left");
                self.visit_split(node, left, Ctx::Load);
            }
            "named_expression" => {
                let name = node.child_by_field_name("name");
                self.visit_split(node, name, Ctx::Load);
            }
            "global_statement" | "nonlocal_statement" | "case_pattern" => {
                self.visit_children(node, Ctx::Store)
            }
            "attribute" => {
                if let Some(object) = node.child_by_field_name("object") {
                    self.visit(object, Ctx::Load);
                }
            }
            "subscript" => self.visit_children(node, Ctx::Load),
            "keyword_argument" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(value, Ctx::Load);
                }
            }
            _ => self.visit_children(node, ctx),
        }
    }

    /// Visit named children; the child right after an `as` keyword is bound.
    fn visit_children(&mut self, node: Node<'_>, ctx: Ctx) {
        let mut cursor = node.walk();
        let mut after_as = false;
        for child in node.children(&mut cursor) {
            if !child.is_named() {
                after_as = child.kind() == "as";
                continue;
            }
            let child_ctx = if after_as { Ctx::Store } else { ctx };
            after_as = false;
            self.visit(child, child_ctx);
        }
    }

    /// Visit `target` as a binding and every other named child as `rest`.
    fn visit_split(&mut self, node: Node<'_>, target: Option<Node<'_>>, rest: Ctx) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if Some(child) == target {
                self.visit(child, Ctx::Store);
            } else {
                self.visit(child, rest);
            }
        }
    }

    fn visit_definition(&mut self, node: Node<'_>) {
        let name = node.child_by_field_name("name");
        self.visit_split(node, name, Ctx::Load);
    }

    fn visit_parameters(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for param in node.named_children(&mut cursor) {
            match param.kind() {
                "identifier" => self.visit(param, Ctx::Store),
                "default_parameter" | "typed_default_parameter" => {
                    let name = param.child_by_field_name("name");
                    self.visit_split(param, name, Ctx::Load);
                }
                "typed_parameter" => {
                    let annotation = param.child_by_field_name("type");
                    let mut inner = param.walk();
                    for child in param.named_children(&mut inner) {
                        let ctx = if Some(child) == annotation {
                            Ctx::Load
                        } else {
                            Ctx::Store
                        };
                        self.visit(child, ctx);
                    }
                }
                kind if PARAMETER_NODE_TYPES.contains(&kind) => {
                    self.visit_children(param, Ctx::Store)
                }
                _ => {}
            }
        }
    }

    fn record_import(&mut self, node: Node<'_>) {
        let line = line_of(&node);
        let mut cursor = node.walk();
        for child in node.children_by_field_name("name", &mut cursor) {
            let bound = match child.kind() {
                "aliased_import" => child.child_by_field_name("alias"),
                _ => Some(child),
            };
            let Some(bound) = bound else { continue };
            let text = self.text(&bound);
            // `import os.path` binds `os`.
            let name = text.split('.').next().unwrap_or(text).trim();
            if !name.is_empty() {
                self.findings
                    .names
                    .import(name, line, bound.start_position().column);
            }
        }
        let mut cursor = node.walk();
        if node
            .named_children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import")
        {
            self.findings.names.wildcard();
        }
    }

    fn record_string_rows(&mut self, node: Node<'_>) {
        let start = node.start_position().row + 1;
        let end = node.end_position().row + 1;
        if end > start {
            self.findings.strings.ends_inside.extend(start..end);
            self.findings.strings.starts_inside.extend(start + 1..=end);
        }
    }

    fn check_definition(&mut self, node: Node<'_>, convention: Convention) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(&name_node);
        let line = line_of(&node);
        let what = match convention {
            Convention::Value => "Function",
            Convention::Type => "Class",
        };

        if !Convention::is_exempt(name) && !convention.matches(name) {
            let suggestion = convention.convert(name);
            let mut diag = Diagnostic::new(
                DiagnosticKind::NamingViolation,
                line,
                format!(
                    "{what} name '{name}' should be {}",
                    convention.describe()
                ),
            )
            .with_column(name_node.start_position().column)
            .with_symbol(name);
            let fixable = suggestion != name
                && convention.matches(&suggestion)
                && naming::renameable(self.source, name, &suggestion);
            diag = if fixable {
                diag.with_fix(suggestion)
            } else {
                diag.report_only()
            };
            self.findings.diagnostics.push(diag);
        }

        let body = node.child_by_field_name("body");
        if !body.is_some_and(|b| has_docstring(&b)) {
            self.findings.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::MissingDocstring,
                    line,
                    format!("{what} '{name}' is missing a docstring"),
                )
                .with_column(node.start_position().column)
                .with_symbol(name),
            );
        }

        if convention == Convention::Value {
            let complexity = 1 + body.map_or(0, |b| count_decision_points(&b));
            if complexity > self.config.max_complexity {
                self.findings.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::HighComplexity,
                        line,
                        format!(
                            "Function '{name}' has cyclomatic complexity {complexity} (max {})",
                            self.config.max_complexity
                        ),
                    )
                    .with_column(node.start_position().column)
                    .with_symbol(name),
                );
            }
        }
    }

    fn check_except(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        let typed = node
            .named_children(&mut cursor)
            .any(|c| !matches!(c.kind(), "block" | "comment"));
        if typed {
            return;
        }
        let pos = node.start_position();
        self.findings.diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::BareExcept,
                pos.row + 1,
                "Bare 'except:' also catches SystemExit and KeyboardInterrupt",
            )
            .with_column(pos.column)
            .with_fix("except Exception:"),
        );
    }
}

/// A block starts with a string expression statement.
fn has_docstring(body: &Node<'_>) -> bool {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    let Some(stmt) = first else {
        return false;
    };
    if stmt.kind() != "expression_statement" {
        return false;
    }
    let mut expr = stmt.named_child(0);
    while let Some(inner) = expr.filter(|e| e.kind() == "parenthesized_expression") {
        expr = inner.named_child(0);
    }
    expr.is_some_and(|e| matches!(e.kind(), "string" | "concatenated_string"))
}

/// Count decision points below `node`, not descending into nested
/// functions or classes.
/// Uses iterative cursor traversal.
fn count_decision_points(node: &Node<'_>) -> u32 {
    let mut count = 0;
    let mut cursor = node.walk();
    let start_depth = cursor.depth();

    loop {
        let current = cursor.node();
        if is_decision_point(current.kind()) {
            count += 1;
        }

        let nested_scope = cursor.depth() > start_depth && SCOPE_NODE_TYPES.contains(&current.kind());
        if !nested_scope && cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.depth() > start_depth && cursor.goto_next_sibling() {
                break;
            }
            if cursor.depth() <= start_depth || !cursor.goto_parent() {
                return count;
            }
        }
    }
}
