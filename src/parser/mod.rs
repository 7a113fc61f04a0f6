//! Tree-sitter based Python parser.

pub mod lexer;
pub mod queries;
pub mod recovery;

use parking_lot::Mutex;
use serde::Serialize;
use tree_sitter::{Node, Parser as TsParser, Tree};

use crate::core::Result;

/// A Python parser owned by one engine instance.
///
/// The inner tree-sitter parser is behind a mutex so analysis can take `&self`.
pub struct Parser {
    inner: Mutex<TsParser>,
}

impl Parser {
    /// Create a parser with the Python grammar loaded.
    pub fn new() -> Result<Self> {
        let mut parser = TsParser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
        Ok(Self {
            inner: Mutex::new(parser),
        })
    }

    /// Parse `source`, returning the tree or the first syntax error in it.
    pub fn parse<'a>(&self, source: &'a str) -> std::result::Result<ParseResult<'a>, SyntaxError> {
        let tree = {
            let mut parser = self.inner.lock();
            parser.parse(source, None)
        };
        let Some(tree) = tree else {
            return Err(SyntaxError {
                line: 1,
                end_line: 1,
                column: 0,
                message: "parser produced no tree".to_string(),
            });
        };
        match first_syntax_error(&tree) {
            Some(err) => Err(err),
            None => Ok(ParseResult { tree, source }),
        }
    }

    /// Whether `source` parses without errors.
    pub fn is_valid(&self, source: &str) -> bool {
        self.parse(source).is_ok()
    }
}

/// Location of the first syntax error in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxError {
    /// 1-based line where the error starts.
    pub line: usize,
    /// 1-based line where the erroneous region ends.
    pub end_line: usize,
    /// 0-based column.
    pub column: usize,
    pub message: String,
}

/// A successfully parsed source buffer.
#[derive(Debug)]
pub struct ParseResult<'a> {
    pub tree: Tree,
    pub source: &'a str,
}

impl<'a> ParseResult<'a> {
    /// Get the root node of the tree.
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Get text for a node.
    pub fn node_text(&self, node: &Node<'_>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }
}

/// 1-based start line of a node.
pub fn line_of(node: &Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Find the first ERROR or MISSING node, in document order.
///
/// Descends only into subtrees that report `has_error`.
pub fn first_syntax_error(tree: &Tree) -> Option<SyntaxError> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_missing() {
            let pos = node.start_position();
            return Some(SyntaxError {
                line: pos.row + 1,
                end_line: pos.row + 1,
                column: pos.column,
                message: format!("expected '{}'", node.kind()),
            });
        }
        if node.is_error() {
            let pos = node.start_position();
            return Some(SyntaxError {
                line: pos.row + 1,
                end_line: node.end_position().row + 1,
                column: pos.column,
                message: "invalid syntax".to_string(),
            });
        }

        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                if cursor.node().has_error() {
                    break;
                }
                continue;
            }
            if !cursor.goto_parent() {
                // has_error was set but no node matched; report at the root.
                return Some(SyntaxError {
                    line: 1,
                    end_line: root.end_position().row + 1,
                    column: 0,
                    message: "invalid syntax".to_string(),
                });
            }
        }
    }
}
