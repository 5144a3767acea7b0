// C ABI exports in the classic pcre_compile / pcre_exec shape.
//
// Handles are Box-allocated CompiledPattern values released with
// pcrs_free(). Error message pointers are static NUL-terminated strings.
// Gated behind the `ffi` Cargo feature.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;

use crate::pcre::*;
use crate::regcomp;
use crate::regerror::{pcrs_compile_error_cstr, pcrs_exec_error_cstr};
use crate::regexec;
use crate::reginfo;
use crate::regint::CompiledPattern;

// --- Constants ---

#[no_mangle]
pub static PCRS_CASELESS: c_int = CASELESS;
#[no_mangle]
pub static PCRS_DOTALL: c_int = DOTALL;

// --- Compile / free ---

/// Compile a NUL-terminated pattern.
///
/// Returns a new handle, or null on failure. On failure `*errptr` points
/// to a static message and `*erroffset` holds the byte offset in the
/// pattern; either out-pointer may be null.
///
/// # Safety
///
/// `pattern` must be null or point to a NUL-terminated string. `errptr`
/// and `erroffset` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn pcrs_compile(
    pattern: *const c_char,
    options: c_int,
    errptr: *mut *const c_char,
    erroffset: *mut c_int,
) -> *mut CompiledPattern {
    let (message, offset) = if pattern.is_null() {
        (pcrs_exec_error_cstr(PCRS_ERROR_NULL), 0)
    } else {
        let bytes = CStr::from_ptr(pattern).to_bytes();
        match regcomp::pcrs_compile(bytes, Options::from_bits_retain(options as u32)) {
            Ok(reg) => {
                if !errptr.is_null() {
                    *errptr = ptr::null();
                }
                return Box::into_raw(Box::new(reg));
            }
            Err(e) => (pcrs_compile_error_cstr(e.code()), e.offset()),
        }
    };
    if !errptr.is_null() {
        *errptr = message.as_ptr();
    }
    if !erroffset.is_null() {
        *erroffset = c_int::try_from(offset).unwrap_or(c_int::MAX);
    }
    ptr::null_mut()
}

/// Release a handle returned by [`pcrs_compile`]. Null is ignored.
///
/// # Safety
///
/// `code` must be null or a handle from [`pcrs_compile`] that has not
/// been freed yet.
#[no_mangle]
pub unsafe extern "C" fn pcrs_free(code: *mut CompiledPattern) {
    if !code.is_null() {
        drop(Box::from_raw(code));
    }
}

// --- Introspection ---

/// Number of capturing groups, or `PCRS_ERROR_NULL` for a null handle.
///
/// # Safety
///
/// `code` must be null or a live handle from [`pcrs_compile`].
#[no_mangle]
pub unsafe extern "C" fn pcrs_captured_count(code: *const CompiledPattern) -> c_int {
    match code.as_ref() {
        Some(reg) => reginfo::pcrs_captured_count(reg) as c_int,
        None => PCRS_ERROR_NULL,
    }
}

// --- Exec ---

/// Match `code` against `subject`.
///
/// `length` is the subject length in bytes; a negative length means the
/// subject is NUL-terminated. Results are written to `ovector` as in
/// [`regexec::pcrs_exec`], using `ovecsize / 2` pairs.
///
/// # Safety
///
/// `code` must be null or a live handle. `subject` must be null or valid
/// for `length` bytes (or NUL-terminated when `length` is negative).
/// `ovector` must be null or valid for `ovecsize` writes.
#[no_mangle]
pub unsafe extern "C" fn pcrs_exec(
    code: *const CompiledPattern,
    subject: *const c_char,
    length: c_int,
    start_offset: c_int,
    options: c_int,
    ovector: *mut c_int,
    ovecsize: c_int,
) -> c_int {
    let Some(reg) = code.as_ref() else {
        return PCRS_ERROR_NULL;
    };
    if subject.is_null() || (ovector.is_null() && ovecsize > 0) {
        return PCRS_ERROR_NULL;
    }
    if ovecsize < 0 {
        return PCRS_ERROR_BADCOUNT;
    }
    if start_offset < 0 {
        return PCRS_ERROR_BADOFFSET;
    }
    let subject = if length < 0 {
        CStr::from_ptr(subject).to_bytes()
    } else {
        slice::from_raw_parts(subject.cast::<u8>(), length as usize)
    };
    let ovector: &mut [c_int] = if ovecsize == 0 {
        &mut []
    } else {
        slice::from_raw_parts_mut(ovector, ovecsize as usize)
    };
    regexec::pcrs_exec(
        reg,
        subject,
        start_offset as usize,
        Options::from_bits_retain(options as u32),
        ovector,
    )
}

/// Static message for a status or diagnostic code.
#[no_mangle]
pub extern "C" fn pcrs_error_message(code: c_int) -> *const c_char {
    if code < 0 {
        pcrs_exec_error_cstr(code).as_ptr()
    } else {
        pcrs_compile_error_cstr(code).as_ptr()
    }
}

/// Set the process-wide match limit.
#[no_mangle]
pub extern "C" fn pcrs_set_match_limit(limit: u64) {
    regexec::pcrs_set_match_limit(limit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regerror::pcrs_error_code_to_str;
    use std::ffi::CString;

    #[test]
    fn compile_exec_free() {
        let pat = CString::new("(a)(b)").unwrap();
        let subject = CString::new("xaby").unwrap();
        unsafe {
            let mut err: *const c_char = ptr::null();
            let mut off: c_int = -1;
            let code = pcrs_compile(pat.as_ptr(), 0, &mut err, &mut off);
            assert!(!code.is_null());
            assert!(err.is_null());
            assert_eq!(pcrs_captured_count(code), 2);

            let mut ov = [0 as c_int; 6];
            let rc = pcrs_exec(code, subject.as_ptr(), -1, 0, 0, ov.as_mut_ptr(), 6);
            assert_eq!(rc, 3);
            assert_eq!(ov, [1, 3, 1, 2, 2, 3]);
            pcrs_free(code);
        }
    }

    #[test]
    fn compile_error_reports_message_and_offset() {
        let pat = CString::new("(").unwrap();
        unsafe {
            let mut err: *const c_char = ptr::null();
            let mut off: c_int = -1;
            let code = pcrs_compile(pat.as_ptr(), PCRS_CASELESS, &mut err, &mut off);
            assert!(code.is_null());
            assert_eq!(CStr::from_ptr(err).to_str().unwrap(), "missing )");
            assert_eq!(off, 1);
        }
    }

    #[test]
    fn bad_arguments() {
        let pat = CString::new("a").unwrap();
        unsafe {
            let code = pcrs_compile(pat.as_ptr(), 0, ptr::null_mut(), ptr::null_mut());
            let mut ov = [0 as c_int; 3];
            let s = b"a".as_ptr().cast::<c_char>();
            assert_eq!(pcrs_exec(code, s, 1, 0, 0, ov.as_mut_ptr(), -1), PCRS_ERROR_BADCOUNT);
            assert_eq!(pcrs_exec(code, s, 1, -1, 0, ov.as_mut_ptr(), 3), PCRS_ERROR_BADOFFSET);
            assert_eq!(pcrs_exec(ptr::null(), s, 1, 0, 0, ov.as_mut_ptr(), 3), PCRS_ERROR_NULL);
            assert_eq!(pcrs_captured_count(ptr::null()), PCRS_ERROR_NULL);
            pcrs_free(code);
            pcrs_free(ptr::null_mut());
        }
        assert_eq!(pcrs_error_code_to_str(PCRS_ERROR_BADCOUNT), "bad count value");
    }
}
