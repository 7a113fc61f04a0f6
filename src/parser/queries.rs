//! Node kinds and name tables for the Python grammar.

/// Decision point node types for cyclomatic complexity.
///
/// `boolean_operator` is counted once per operator node, so `a and b and c`
/// contributes two. Comprehensions count once per `for` clause.
pub const DECISION_NODE_TYPES: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "except_clause",
    "conditional_expression",
    "boolean_operator",
    "for_in_clause",
];

/// Node kinds that start their own complexity count.
pub const SCOPE_NODE_TYPES: &[&str] = &["function_definition", "class_definition"];

/// Parameter node kinds whose identifier is a binding.
pub const PARAMETER_NODE_TYPES: &[&str] = &[
    "default_parameter",
    "typed_parameter",
    "typed_default_parameter",
    "list_splat_pattern",
    "dictionary_splat_pattern",
];

/// Statement keywords that open an indented block.
pub const BLOCK_KEYWORDS: &[&str] = &[
    "def", "class", "if", "elif", "else", "for", "while", "with", "try", "except", "finally",
    "async",
];

/// Whether `kind` is a decision point.
pub fn is_decision_point(kind: &str) -> bool {
    DECISION_NODE_TYPES.contains(&kind)
}

/// Names available in every module without an import.
pub const PYTHON_BUILTINS: &[&str] = &[
    // constants and module attributes
    "True", "False", "None", "Ellipsis", "NotImplemented", "__name__", "__file__", "__doc__",
    "__package__", "__spec__", "__loader__", "__builtins__", "__debug__", "__all__",
    "__annotations__", "__dict__", "__class__", "__module__", "__qualname__",
    // functions
    "abs", "aiter", "all", "anext", "any", "ascii", "bin", "bool", "breakpoint", "bytearray",
    "bytes", "callable", "chr", "classmethod", "compile", "complex", "copyright", "credits",
    "delattr", "dict", "dir", "divmod", "enumerate", "eval", "exec", "exit", "filter", "float",
    "format", "frozenset", "getattr", "globals", "hasattr", "hash", "help", "hex", "id", "input",
    "int", "isinstance", "issubclass", "iter", "len", "license", "list", "locals", "map", "max",
    "memoryview", "min", "next", "object", "oct", "open", "ord", "pow", "print", "property",
    "quit", "range", "repr", "reversed", "round", "set", "setattr", "slice", "sorted",
    "staticmethod", "str", "sum", "super", "tuple", "type", "vars", "zip", "__import__",
    "__build_class__",
    // exceptions
    "BaseException", "BaseExceptionGroup", "Exception", "ExceptionGroup", "ArithmeticError",
    "AssertionError", "AttributeError", "BlockingIOError", "BrokenPipeError", "BufferError",
    "ChildProcessError", "ConnectionAbortedError", "ConnectionError", "ConnectionRefusedError",
    "ConnectionResetError", "EOFError", "EnvironmentError", "FileExistsError",
    "FileNotFoundError", "FloatingPointError", "GeneratorExit", "IOError", "ImportError",
    "IndentationError", "IndexError", "InterruptedError", "IsADirectoryError", "KeyError",
    "KeyboardInterrupt", "LookupError", "MemoryError", "ModuleNotFoundError", "NameError",
    "NotADirectoryError", "NotImplementedError", "OSError", "OverflowError", "PermissionError",
    "ProcessLookupError", "RecursionError", "ReferenceError", "RuntimeError", "StopAsyncIteration",
    "StopIteration", "SyntaxError", "SystemError", "SystemExit", "TabError", "TimeoutError",
    "TypeError", "UnboundLocalError", "UnicodeDecodeError", "UnicodeEncodeError", "UnicodeError",
    "UnicodeTranslateError", "ValueError", "ZeroDivisionError",
    // warnings
    "Warning", "BytesWarning", "DeprecationWarning", "EncodingWarning", "FutureWarning",
    "ImportWarning", "PendingDeprecationWarning", "ResourceWarning", "RuntimeWarning",
    "SyntaxWarning", "UnicodeWarning", "UserWarning",
];

/// Whether `name` is a builtin.
pub fn is_builtin(name: &str) -> bool {
    PYTHON_BUILTINS.contains(&name)
}
