// regerror.rs - Status and diagnostic code to message conversion.
//
// Messages are NUL-terminated statics so the C ABI can hand out the
// pointer directly, the way pcre_compile() fills its error pointer.

use std::ffi::CStr;

use crate::pcre::*;

/// Message for a compile diagnostic code (positive numbers).
pub fn pcrs_compile_error_cstr(code: i32) -> &'static CStr {
    match code {
        PCRS_ERR_BACKSLASH_AT_END => c"\\ at end of pattern",
        PCRS_ERR_BACKSLASH_C_AT_END => c"\\c at end of pattern",
        PCRS_ERR_UNRECOGNIZED_ESCAPE => c"unrecognized character follows \\",
        PCRS_ERR_QUANTIFIER_OUT_OF_ORDER => c"numbers out of order in {} quantifier",
        PCRS_ERR_QUANTIFIER_TOO_BIG => c"number too big in {} quantifier",
        PCRS_ERR_MISSING_CLASS_TERMINATOR => c"missing terminating ] for character class",
        PCRS_ERR_CLASS_RANGE_OUT_OF_ORDER => c"range out of order in character class",
        PCRS_ERR_NOTHING_TO_REPEAT => c"nothing to repeat",
        PCRS_ERR_UNRECOGNIZED_AFTER_QUERY => c"unrecognized character after (? or (?-",
        PCRS_ERR_POSIX_OUTSIDE_CLASS => {
            c"POSIX named classes are supported only within a class"
        }
        PCRS_ERR_MISSING_PARENTHESIS => c"missing )",
        PCRS_ERR_NONEXISTENT_SUBPATTERN => c"reference to non-existent subpattern",
        PCRS_ERR_UNKNOWN_OPTION_BITS => c"unknown option bit(s) set",
        PCRS_ERR_MISSING_COMMENT_PARENTHESIS => c"missing ) after comment",
        PCRS_ERR_PATTERN_TOO_LARGE => c"regular expression is too large",
        PCRS_ERR_UNMATCHED_PARENTHESES => c"unmatched parentheses",
        PCRS_ERR_UNRECOGNIZED_AFTER_QUERY_LT => c"unrecognized character after (?<",
        PCRS_ERR_LOOKBEHIND_NOT_FIXED_LENGTH => c"lookbehind assertion is not fixed length",
        PCRS_ERR_UNKNOWN_POSIX_CLASS => c"unknown POSIX class name",
        PCRS_ERR_CHAR_VALUE_TOO_LARGE => c"character value in \\x{} is too large",
        PCRS_ERR_NAME_MISSING_TERMINATOR => {
            c"syntax error in subpattern name (missing terminator)"
        }
        PCRS_ERR_DUPLICATE_NAME => c"two named subpatterns have the same name",
        PCRS_ERR_UNSUPPORTED_PROPERTY => c"support for \\P, \\p, and \\X is not available",
        PCRS_ERR_NAME_TOO_LONG => c"subpattern name is too long (maximum 32 characters)",
        PCRS_ERR_BAD_G_ESCAPE => {
            c"\\g is not followed by a braced name/number or by a plain number"
        }
        PCRS_ERR_NAME_EXPECTED => c"subpattern name expected",
        PCRS_ERR_BACKSLASH_C_NOT_ASCII => c"\\c must be followed by an ASCII character",
        PCRS_ERR_BAD_K_ESCAPE => c"\\k is not followed by a braced, angle-bracketed, or quoted name",
        PCRS_ERR_PARENTHESES_TOO_DEEP => c"parentheses are too deeply nested",
        PCRS_ERR_NAME_STARTS_WITH_DIGIT => c"group name must start with a non-digit",
        _ => c"internal error: unknown compile error code",
    }
}

/// Message for an exec status code (negative numbers).
pub fn pcrs_exec_error_cstr(code: i32) -> &'static CStr {
    match code {
        PCRS_ERROR_NOMATCH => c"no match",
        PCRS_ERROR_NULL => c"null argument",
        PCRS_ERROR_BADOPTION => c"bad option value",
        PCRS_ERROR_BADMAGIC => c"magic number missing",
        PCRS_ERROR_NOMEMORY => c"failed to get memory",
        PCRS_ERROR_MATCHLIMIT => c"match limit exceeded",
        PCRS_ERROR_BADCOUNT => c"bad count value",
        PCRS_ERROR_BADOFFSET => c"bad offset value",
        PCRS_ERROR_BADLENGTH => c"bad length",
        _ => c"unknown error",
    }
}

/// Message text for any code: positive codes are compile diagnostics,
/// negative codes are exec status values.
pub fn pcrs_error_code_to_str(code: i32) -> &'static str {
    let cstr = if code < 0 {
        pcrs_exec_error_cstr(code)
    } else {
        pcrs_compile_error_cstr(code)
    };
    // Every message above is ASCII.
    cstr.to_str().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_messages() {
        assert_eq!(pcrs_error_code_to_str(PCRS_ERR_MISSING_PARENTHESIS), "missing )");
        assert_eq!(pcrs_error_code_to_str(PCRS_ERR_NOTHING_TO_REPEAT), "nothing to repeat");
        assert_eq!(
            pcrs_error_code_to_str(PCRS_ERR_BACKSLASH_AT_END),
            "\\ at end of pattern"
        );
    }

    #[test]
    fn exec_messages() {
        assert_eq!(pcrs_error_code_to_str(PCRS_ERROR_NOMATCH), "no match");
        assert_eq!(pcrs_error_code_to_str(PCRS_ERROR_BADOFFSET), "bad offset value");
        assert_eq!(pcrs_error_code_to_str(-9999), "unknown error");
    }

    #[test]
    fn cstr_is_nul_terminated() {
        let c = pcrs_compile_error_cstr(PCRS_ERR_MISSING_PARENTHESIS);
        assert_eq!(c.to_bytes_with_nul().last(), Some(&0));
    }
}
