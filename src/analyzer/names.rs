//! Best-effort cross reference of bound and loaded names.
//!
//! There is no scope resolution: a name bound anywhere in the module counts
//! as bound everywhere. Both resulting diagnostics are advisory.

use std::collections::HashSet;

use crate::core::{Diagnostic, DiagnosticKind};
use crate::parser::queries::is_builtin;

/// A name introduced by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName<'a> {
    /// The local name the import binds.
    pub name: &'a str,
    /// 1-based line of the import statement.
    pub line: usize,
    pub column: usize,
}

/// Names seen during one tree walk.
#[derive(Debug, Default)]
pub struct NameTable<'a> {
    bound: HashSet<&'a str>,
    loads: Vec<(&'a str, usize, usize)>,
    imports: Vec<ImportedName<'a>>,
    wildcard_import: bool,
}

impl<'a> NameTable<'a> {
    pub fn bind(&mut self, name: &'a str) {
        self.bound.insert(name);
    }

    pub fn load(&mut self, name: &'a str, line: usize, column: usize) {
        self.loads.push((name, line, column));
    }

    pub fn import(&mut self, name: &'a str, line: usize, column: usize) {
        self.imports.push(ImportedName { name, line, column });
    }

    pub fn wildcard(&mut self) {
        self.wildcard_import = true;
    }

    /// Undefined-name diagnostics (first use only), then unused imports.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        let imported: HashSet<&str> = self.imports.iter().map(|i| i.name).collect();
        let loaded: HashSet<&str> = self.loads.iter().map(|(n, _, _)| *n).collect();
        let mut out = Vec::new();

        if !self.wildcard_import {
            let mut reported = HashSet::new();
            for &(name, line, column) in &self.loads {
                if self.bound.contains(name)
                    || imported.contains(name)
                    || is_builtin(name)
                    || name.starts_with('_')
                    || !reported.insert(name)
                {
                    continue;
                }
                out.push(
                    Diagnostic::new(
                        DiagnosticKind::UndefinedName,
                        line,
                        format!("Name '{name}' may be undefined"),
                    )
                    .with_column(column)
                    .with_symbol(name),
                );
            }
        }

        for import in &self.imports {
            if loaded.contains(import.name) {
                continue;
            }
            out.push(
                Diagnostic::new(
                    DiagnosticKind::UnusedImport,
                    import.line,
                    format!("Import '{}' is unused", import.name),
                )
                .with_column(import.column)
                .with_symbol(import.name),
            );
        }
        out
    }
}
