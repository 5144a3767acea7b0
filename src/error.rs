// error.rs - Error types for compilation and matching.
//
// Compile failures carry a diagnostic code plus the pattern offset.
// Exec failures group the negative status codes into variants while
// preserving the original code for interop.

use std::fmt;

use crate::pcre::*;
use crate::regerror::pcrs_error_code_to_str;

/// A pattern that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    code: i32,
    offset: usize,
}

impl CompileError {
    pub(crate) fn new(code: i32, offset: usize) -> Self {
        CompileError { code, offset }
    }

    /// The diagnostic code (one of the `PCRS_ERR_*` constants).
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Byte offset in the pattern where the problem was detected.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Human-readable diagnostic text.
    pub fn message(&self) -> &'static str {
        pcrs_error_code_to_str(self.code)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message(), self.offset)
    }
}

impl std::error::Error for CompileError {}

/// A failed exec call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecError {
    /// The pattern does not match the subject.
    NoMatch,
    /// A required argument was null (C ABI only).
    Null,
    /// An option bit not valid at exec time was set.
    BadOption,
    /// The handle does not point to a compiled pattern (C ABI only).
    BadMagic,
    /// Scratch space could not be allocated.
    NoMemory,
    /// The backtracking limit was exceeded.
    MatchLimit,
    /// A negative output slot count was supplied (C ABI only).
    BadCount,
    /// The start offset lies beyond the end of the subject.
    BadOffset,
    /// Any other status code.
    Other(i32),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Other(code) => write!(f, "exec error code {}", code),
            other => f.write_str(pcrs_error_code_to_str(other.code())),
        }
    }
}

impl std::error::Error for ExecError {}

impl From<i32> for ExecError {
    fn from(code: i32) -> Self {
        match code {
            PCRS_ERROR_NOMATCH => ExecError::NoMatch,
            PCRS_ERROR_NULL => ExecError::Null,
            PCRS_ERROR_BADOPTION => ExecError::BadOption,
            PCRS_ERROR_BADMAGIC => ExecError::BadMagic,
            PCRS_ERROR_NOMEMORY => ExecError::NoMemory,
            PCRS_ERROR_MATCHLIMIT => ExecError::MatchLimit,
            PCRS_ERROR_BADCOUNT => ExecError::BadCount,
            PCRS_ERROR_BADOFFSET => ExecError::BadOffset,
            _ => ExecError::Other(code),
        }
    }
}

impl ExecError {
    /// Returns the raw status code, exactly as the engine reported it.
    pub fn code(&self) -> i32 {
        match self {
            ExecError::NoMatch => PCRS_ERROR_NOMATCH,
            ExecError::Null => PCRS_ERROR_NULL,
            ExecError::BadOption => PCRS_ERROR_BADOPTION,
            ExecError::BadMagic => PCRS_ERROR_BADMAGIC,
            ExecError::NoMemory => PCRS_ERROR_NOMEMORY,
            ExecError::MatchLimit => PCRS_ERROR_MATCHLIMIT,
            ExecError::BadCount => PCRS_ERROR_BADCOUNT,
            ExecError::BadOffset => PCRS_ERROR_BADOFFSET,
            ExecError::Other(code) => *code,
        }
    }

    /// `true` for a plain "no match" outcome.
    pub fn is_no_match(&self) -> bool {
        matches!(self, ExecError::NoMatch)
    }
}
