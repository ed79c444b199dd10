//! Error types for the two phases of the pipeline: compilation of
//! BrainfuckScript source, and execution of a compiled tape program.
//!
//! Compile-time failures are fatal to that compilation and produce no
//! output artifact. Runtime failures are fatal to that run but
//! non-destructive: output bytes produced before the failure remain
//! available on the machine.

use std::fmt;

/// Errors raised while turning BrainfuckScript source into tape code.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The source text does not conform to the grammar (includes the
    /// parser's location/description rendering).
    Syntax(String),

    /// A name was declared twice in the same scope.
    DuplicateDeclaration(String),

    /// A name was referenced but not declared in any enclosing scope.
    UndeclaredVariable(String),

    /// An operation the target cannot express at runtime, e.g.
    /// multiplication of two variables.
    UnsupportedOperation(String),

    /// A language feature that parses but is not compiled, e.g. stacks
    /// or function calls.
    UnsupportedFeature(String),

    /// A void-typed expression was used where a value is required.
    TypeMismatch(String),

    /// A source or include file could not be read, or the artifact
    /// could not be written.
    Io(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::Syntax(msg) => write!(f, "syntax error: {}", msg),
            CompileError::DuplicateDeclaration(name) => {
                write!(f, "duplicate declaration of '{}' in the same scope", name)
            }
            CompileError::UndeclaredVariable(name) => {
                write!(f, "use of undeclared variable '{}'", name)
            }
            CompileError::UnsupportedOperation(msg) => {
                write!(f, "unsupported operation: {}", msg)
            }
            CompileError::UnsupportedFeature(msg) => {
                write!(f, "unsupported feature: {}", msg)
            }
            CompileError::TypeMismatch(msg) => write!(f, "type mismatch: {}", msg),
            CompileError::Io(msg) => write!(f, "i/o error: {}", msg),
        }
    }
}

impl std::error::Error for CompileError {}

/// Errors raised while loading or running a compiled tape program.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Bracket structure did not stack-match during the load scan.
    /// `position` is the offending character's index in the program text.
    UnbalancedBrackets { position: usize },

    /// The pointer would have left `[0, memory_size)`. Fatal.
    OutOfBoundsAccess { pointer: usize, position: usize },

    /// The wall-clock watchdog fired. Output produced before the abort
    /// is preserved on the machine.
    ExecutionTimeout { limit_secs: f64 },

    /// Cell width is not one of the supported sizes (8, 16, 32, 64).
    UnsupportedCellWidth(u32),

    /// The configured tape length is unusable.
    InvalidMemorySize(usize),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuntimeError::UnbalancedBrackets { position } => {
                write!(f, "unbalanced bracket at code position {}", position)
            }
            RuntimeError::OutOfBoundsAccess { pointer, position } => write!(
                f,
                "pointer moved out of bounds (at cell {}, code position {})",
                pointer, position
            ),
            RuntimeError::ExecutionTimeout { limit_secs } => {
                write!(f, "execution exceeded the limit of {} seconds", limit_secs)
            }
            RuntimeError::UnsupportedCellWidth(bits) => {
                write!(f, "unsupported cell width {} (use 8, 16, 32 or 64)", bits)
            }
            RuntimeError::InvalidMemorySize(size) => {
                write!(f, "memory size {} is not usable; need at least one cell", size)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}
