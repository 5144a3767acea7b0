// pcre.rs - Public types, option flags, status codes and limits.

use bitflags::bitflags;

bitflags! {
    /// Option bits accepted by [`pcrs_compile`](crate::regcomp::pcrs_compile)
    /// and [`pcrs_exec`](crate::regexec::pcrs_exec).
    ///
    /// Bit values are the classic PCRE ones so raw integers coming from a
    /// foreign caller can be passed through with [`Options::from_bits_retain`].
    /// Combining is plain union, so the order flags are supplied in never
    /// matters:
    ///
    /// ```
    /// use pcrs::pcre::Options;
    ///
    /// let a: Options = [Options::CASELESS, Options::DOTALL].into_iter().collect();
    /// let b: Options = [Options::DOTALL, Options::CASELESS].into_iter().collect();
    /// assert_eq!(a, b);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Options: u32 {
        // compile time
        const CASELESS = 0x0000_0001;
        const MULTILINE = 0x0000_0002;
        const DOTALL = 0x0000_0004;
        const EXTENDED = 0x0000_0008;
        // compile and exec time
        const ANCHORED = 0x0000_0010;
        // compile time
        const DOLLAR_ENDONLY = 0x0000_0020;
        // exec time
        const NOTBOL = 0x0000_0080;
        const NOTEOL = 0x0000_0100;
        // compile time
        const UNGREEDY = 0x0000_0200;
        // exec time
        const NOTEMPTY = 0x0000_0400;
        // compile time
        const NO_AUTO_CAPTURE = 0x0000_1000;
        // exec time
        const NOTEMPTY_ATSTART = 0x1000_0000;
    }
}

/// Options that are meaningful to the compiler.
pub const PUBLIC_COMPILE_OPTIONS: Options = Options::CASELESS
    .union(Options::MULTILINE)
    .union(Options::DOTALL)
    .union(Options::EXTENDED)
    .union(Options::ANCHORED)
    .union(Options::DOLLAR_ENDONLY)
    .union(Options::UNGREEDY)
    .union(Options::NO_AUTO_CAPTURE);

/// Options that are meaningful to the executor.
pub const PUBLIC_EXEC_OPTIONS: Options = Options::ANCHORED
    .union(Options::NOTBOL)
    .union(Options::NOTEOL)
    .union(Options::NOTEMPTY)
    .union(Options::NOTEMPTY_ATSTART);

// === Raw flag constants ===
// For callers that build an option word from integers themselves.
pub const CASELESS: i32 = Options::CASELESS.bits() as i32;
pub const DOTALL: i32 = Options::DOTALL.bits() as i32;

// === Exec status codes ===
pub const PCRS_ERROR_NOMATCH: i32 = -1;
pub const PCRS_ERROR_NULL: i32 = -2;
pub const PCRS_ERROR_BADOPTION: i32 = -3;
pub const PCRS_ERROR_BADMAGIC: i32 = -4;
pub const PCRS_ERROR_NOMEMORY: i32 = -6;
pub const PCRS_ERROR_MATCHLIMIT: i32 = -8;
pub const PCRS_ERROR_BADCOUNT: i32 = -15;
pub const PCRS_ERROR_BADOFFSET: i32 = -24;
pub const PCRS_ERROR_BADLENGTH: i32 = -32;

// === Compile diagnostic codes ===
pub const PCRS_ERR_BACKSLASH_AT_END: i32 = 1;
pub const PCRS_ERR_BACKSLASH_C_AT_END: i32 = 2;
pub const PCRS_ERR_UNRECOGNIZED_ESCAPE: i32 = 3;
pub const PCRS_ERR_QUANTIFIER_OUT_OF_ORDER: i32 = 4;
pub const PCRS_ERR_QUANTIFIER_TOO_BIG: i32 = 5;
pub const PCRS_ERR_MISSING_CLASS_TERMINATOR: i32 = 6;
pub const PCRS_ERR_CLASS_RANGE_OUT_OF_ORDER: i32 = 8;
pub const PCRS_ERR_NOTHING_TO_REPEAT: i32 = 9;
pub const PCRS_ERR_UNRECOGNIZED_AFTER_QUERY: i32 = 12;
pub const PCRS_ERR_POSIX_OUTSIDE_CLASS: i32 = 13;
pub const PCRS_ERR_MISSING_PARENTHESIS: i32 = 14;
pub const PCRS_ERR_NONEXISTENT_SUBPATTERN: i32 = 15;
pub const PCRS_ERR_UNKNOWN_OPTION_BITS: i32 = 17;
pub const PCRS_ERR_MISSING_COMMENT_PARENTHESIS: i32 = 18;
pub const PCRS_ERR_PATTERN_TOO_LARGE: i32 = 20;
pub const PCRS_ERR_UNMATCHED_PARENTHESES: i32 = 22;
pub const PCRS_ERR_UNRECOGNIZED_AFTER_QUERY_LT: i32 = 24;
pub const PCRS_ERR_LOOKBEHIND_NOT_FIXED_LENGTH: i32 = 25;
pub const PCRS_ERR_UNKNOWN_POSIX_CLASS: i32 = 30;
pub const PCRS_ERR_CHAR_VALUE_TOO_LARGE: i32 = 34;
pub const PCRS_ERR_NAME_MISSING_TERMINATOR: i32 = 42;
pub const PCRS_ERR_DUPLICATE_NAME: i32 = 43;
pub const PCRS_ERR_UNSUPPORTED_PROPERTY: i32 = 45;
pub const PCRS_ERR_NAME_TOO_LONG: i32 = 48;
pub const PCRS_ERR_BAD_G_ESCAPE: i32 = 57;
pub const PCRS_ERR_NAME_EXPECTED: i32 = 62;
pub const PCRS_ERR_BACKSLASH_C_NOT_ASCII: i32 = 68;
pub const PCRS_ERR_BAD_K_ESCAPE: i32 = 69;
pub const PCRS_ERR_PARENTHESES_TOO_DEEP: i32 = 82;
pub const PCRS_ERR_NAME_STARTS_WITH_DIGIT: i32 = 84;

// === Limits ===
pub const PCRS_MAX_REPEAT_NUM: u32 = 65535;
pub const PCRS_MAX_NAME_LEN: usize = 32;
pub const PCRS_DEFAULT_MATCH_LIMIT: u64 = 10_000_000;
