//! Error taxonomy.
//!
//! Plain logical failure (pattern mismatch, explicit `false`, exhausted
//! alternatives) is represented as a `bool`/`Result<_, UnifyFail>` return,
//! never as an [`ExecError`]. Keeping these in distinct Rust types enforces
//! spec §7's "plain logical failure is not an error" at compile time instead
//! of by convention — a call site that wants to backtrack cannot accidentally
//! propagate a fatal error, and vice versa.
//!
//! Grounds on `ouros::exception_private::RunError` (catchable vs.
//! uncatchable exceptions) and `ouros::resource::ResourceError` (the
//! depth/time/op exhaustion family).

use std::fmt;

use crate::frame::FrameTrace;

/// Zero-sized marker for ordinary unification/pattern-match failure.
///
/// Never carries data: the caller already knows what it tried and with what,
/// and propagating a formatted message on every failed unification attempt
/// (the overwhelmingly common case during backtracking) would be wasteful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnifyFail;

impl fmt::Display for UnifyFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unification failed")
    }
}

impl std::error::Error for UnifyFail {}

/// A fatal, non-local execution error. Unwinds across frames carrying the
/// frame chain (for a stack-trace renderer) rather than being recoverable
/// within the core.
#[derive(Debug, Clone)]
pub struct ExecError {
    pub kind: ExecErrorKind,
    pub trace: FrameTrace,
}

impl ExecError {
    #[must_use]
    pub fn new(kind: ExecErrorKind, trace: FrameTrace) -> Self {
        Self { kind, trace }
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for ExecError {}

/// Kinds enumerated in spec §7.
#[derive(Debug, Clone)]
pub enum ExecErrorKind {
    /// Actual arity did not match a primitive's declared arity.
    ArgCountMismatch {
        task: String,
        expected: ArityExpectation,
        got: usize,
    },
    /// An argument's runtime kind was not acceptable to the primitive.
    ArgTypeMismatch { task: String, position: usize, expected: &'static str },
    /// A required-ground argument was unbound, or a required-unbound
    /// argument was bound.
    ArgInstantiation {
        task: String,
        position: usize,
        expected_ground: bool,
    },
    /// A primitive such as `ExactlyOnce` produced no solution.
    CallFailed { task: String },
    /// Frame depth exceeded the ceiling (spec §5, default ~500).
    StackOverflow { limit: usize },
    /// A call target resolved to a value that cannot be invoked.
    UndefinedTask { rendered: String },
    /// The exclusion-logic KB rejected a write: the path reused a key at a
    /// position that a different separator already claimed (spec §4.10).
    KbSeparatorMismatch { position: String },
    /// A `write`/`delete` path contained an unbound (non-ground) key.
    KbNonGroundKey,
    /// Resource limits (time, step count) other than recursion depth.
    ResourceExhausted(crate::resource::ResourceError),
}

impl fmt::Display for ExecErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArgCountMismatch { task, expected, got } => {
                write!(f, "{task}: expected {expected} arguments, got {got}")
            }
            Self::ArgTypeMismatch { task, position, expected } => {
                write!(f, "{task}: argument {position} must be {expected}")
            }
            Self::ArgInstantiation {
                task,
                position,
                expected_ground,
            } => {
                if *expected_ground {
                    write!(f, "{task}: argument {position} must be ground")
                } else {
                    write!(f, "{task}: argument {position} must be unbound")
                }
            }
            Self::CallFailed { task } => write!(f, "{task}: call failed"),
            Self::StackOverflow { limit } => write!(f, "stack overflow: depth exceeded {limit}"),
            Self::UndefinedTask { rendered } => write!(f, "undefined task: {rendered}"),
            Self::KbSeparatorMismatch { position } => {
                write!(f, "exclusion-logic KB: separator mismatch at {position}")
            }
            Self::KbNonGroundKey => write!(f, "exclusion-logic KB: path key is not ground"),
            Self::ResourceExhausted(err) => write!(f, "{err}"),
        }
    }
}

/// How many arguments a primitive declared it wants, for error rendering.
#[derive(Debug, Clone, Copy)]
pub enum ArityExpectation {
    Exactly(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl fmt::Display for ArityExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
            Self::Range(lo, hi) => write!(f, "between {lo} and {hi}"),
        }
    }
}

pub type ExecResult<T> = Result<T, ExecError>;
