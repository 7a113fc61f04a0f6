//! Identifier casing conventions.

use once_cell::sync::Lazy;
use regex::Regex;

static SNAKE_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("valid regex"));
static PASCAL_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-zA-Z0-9]*$").expect("valid regex"));

/// The two naming conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// Functions and other value-like names: `snake_case`.
    Value,
    /// Classes: `PascalCase`.
    Type,
}

impl Convention {
    pub fn describe(self) -> &'static str {
        match self {
            Convention::Value => "snake_case",
            Convention::Type => "PascalCase",
        }
    }

    pub fn matches(self, name: &str) -> bool {
        match self {
            Convention::Value => SNAKE_CASE.is_match(name),
            Convention::Type => PASCAL_CASE.is_match(name),
        }
    }

    /// Rewrite `name` into this convention.
    pub fn convert(self, name: &str) -> String {
        match self {
            Convention::Value => to_snake_case(name),
            Convention::Type => to_pascal_case(name),
        }
    }

    /// Leading-underscore names are private or dunder and exempt.
    pub fn is_exempt(name: &str) -> bool {
        name.starts_with('_')
    }
}

/// Whole-word occurrences of `name` in `source`, comments and strings
/// included.
pub fn occurrences(source: &str, name: &str) -> usize {
    Regex::new(&format!(r"\b{}\b", regex::escape(name)))
        .map(|re| re.find_iter(source).count())
        .unwrap_or(0)
}

/// A definition can be renamed in place when its name appears exactly once
/// and the new name appears nowhere.
pub fn renameable(source: &str, name: &str, new_name: &str) -> bool {
    occurrences(source, name) == 1 && occurrences(source, new_name) == 0
}

/// `fetchHTTPData` -> `fetch_http_data`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `my_class` / `myClass` -> `MyClass`.
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_matches() {
        assert!(Convention::Value.matches("compute_total"));
        assert!(Convention::Value.matches("x2"));
        assert!(!Convention::Value.matches("computeTotal"));
        assert!(!Convention::Value.matches("Compute"));
    }

    #[test]
    fn test_pascal_case_matches() {
        assert!(Convention::Type.matches("HttpServer"));
        assert!(Convention::Type.matches("HTTPServer"));
        assert!(!Convention::Type.matches("http_server"));
        assert!(!Convention::Type.matches("Http_Server"));
    }

    #[test]
    fn test_occurrences_are_whole_words() {
        let source = "def getValue():\n    return getValues()  # getValue\n";
        assert_eq!(occurrences(source, "getValue"), 2);
        assert_eq!(occurrences(source, "getValues"), 1);
        assert_eq!(occurrences(source, "missing"), 0);
    }

    #[test]
    fn test_renameable() {
        assert!(renameable("def getValue():\n    pass\n", "getValue", "get_value"));
        assert!(!renameable("def getValue():\n    pass\ngetValue()\n", "getValue", "get_value"));
        assert!(!renameable("def getValue():\n    pass\nget_value = 1\n", "getValue", "get_value"));
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("computeTotal"), "compute_total");
        assert_eq!(to_snake_case("fetchHTTPData"), "fetch_http_data");
        assert_eq!(to_snake_case("Parse"), "parse");
        assert_eq!(to_snake_case("load2Files"), "load2_files");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("snake_Case"), "snake_case");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("my_class"), "MyClass");
        assert_eq!(to_pascal_case("myClass"), "MyClass");
        assert_eq!(to_pascal_case("Http_Server"), "HttpServer");
    }

    #[test]
    fn test_convert_produces_matching_names() {
        for name in ["getValue", "HTTPRequest", "value2Text"] {
            let fixed = Convention::Value.convert(name);
            assert!(Convention::Value.matches(&fixed), "{name} -> {fixed}");
        }
        for name in ["request_handler", "lower", "Mixed_case"] {
            let fixed = Convention::Type.convert(name);
            assert!(Convention::Type.matches(&fixed), "{name} -> {fixed}");
        }
    }

    #[test]
    fn test_exempt() {
        assert!(Convention::is_exempt("__init__"));
        assert!(Convention::is_exempt("_Helper"));
        assert!(!Convention::is_exempt("Helper"));
    }
}
