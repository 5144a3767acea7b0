// binding_test.rs - compile / captured_count / exec as a binding sees them.

use std::sync::Arc;
use std::thread;

use pcrs::binding::{captured_count, compile, exec, MatchResult};
use pcrs::error::ExecError;
use pcrs::pcre::*;

fn spans(m: &MatchResult) -> Vec<Option<(usize, usize)>> {
    m.iter().collect()
}

// === captured_count ===

#[test]
fn captured_count_two_groups() {
    let code = compile("(a)(b)", Options::empty()).unwrap();
    assert_eq!(captured_count(&code), 2);
}

#[test]
fn captured_count_no_groups() {
    let code = compile("ab", Options::empty()).unwrap();
    assert_eq!(captured_count(&code), 0);
}

#[test]
fn captured_count_ignores_non_capturing_groups() {
    let code = compile("(?:x)(?>y)(?=z)(?#c)(w)", Options::empty()).unwrap();
    assert_eq!(captured_count(&code), 1);
}

// === compile errors ===

#[test]
fn compile_error_has_message_and_offset() {
    let err = compile("(", Options::empty()).unwrap_err();
    assert!(!err.message().is_empty());
    assert!(err.offset() <= 1);
}

#[test]
fn compile_error_offsets_are_in_range() {
    for pattern in ["(", ")", "[a", "a{2,1}", "*", "(?<", "\\", "(?<=a*)", "\\k<x>"] {
        let err = compile(pattern, Options::empty()).unwrap_err();
        assert!(
            err.offset() <= pattern.len(),
            "offset {} out of range for {:?}",
            err.offset(),
            pattern
        );
        assert!(!err.message().is_empty());
    }
}

#[test]
fn empty_pattern_compiles_and_matches_everywhere() {
    let code = compile("", Options::empty()).unwrap();
    assert_eq!(captured_count(&code), 0);
    let m = exec(&code, "abc", 2, Options::empty(), 2).unwrap();
    assert_eq!(m.whole_match(), Some((2, 2)));
}

// === exec ===

#[test]
fn exec_reports_all_groups() {
    let code = compile("(a)(b)", Options::empty()).unwrap();
    let m = exec(&code, "xaby", 0, Options::empty(), 6).unwrap();
    assert_eq!(spans(&m), vec![Some((1, 3)), Some((1, 2)), Some((2, 3))]);
    assert_eq!(m.len(), captured_count(&code) + 1);
}

#[test]
fn exec_no_match() {
    let code = compile("z", Options::empty()).unwrap();
    for _ in 0..3 {
        let err = exec(&code, "abc", 0, Options::empty(), 3).unwrap_err();
        assert_eq!(err, ExecError::NoMatch);
        assert_eq!(err.code(), PCRS_ERROR_NOMATCH);
    }
}

#[test]
fn caseless_flag() {
    let code = compile("ABC", Options::CASELESS).unwrap();
    let m = exec(&code, "xabcX", 0, Options::empty(), 3).unwrap();
    assert_eq!(m.whole_match(), Some((1, 4)));

    let code = compile("ABC", Options::empty()).unwrap();
    assert!(exec(&code, "xabcX", 0, Options::empty(), 3)
        .unwrap_err()
        .is_no_match());
}

#[test]
fn raw_flag_constants_combine_in_any_order() {
    let a = Options::from_bits_retain((CASELESS | DOTALL) as u32);
    let b = Options::from_bits_retain((DOTALL | CASELESS) as u32);
    let c: Options = [Options::DOTALL, Options::CASELESS, Options::DOTALL]
        .into_iter()
        .collect();
    assert_eq!(a, b);
    assert_eq!(a, c);

    let code_a = compile("A.B", a).unwrap();
    let code_c = compile("A.B", c).unwrap();
    let ma = exec(&code_a, "xa\nb", 0, Options::empty(), 2).unwrap();
    let mc = exec(&code_c, "xa\nb", 0, Options::empty(), 2).unwrap();
    assert_eq!(ma, mc);
    assert_eq!(ma.whole_match(), Some((1, 4)));
}

#[test]
fn repeated_exec_is_deterministic() {
    let code = compile("(\\w+)@(\\w+)\\.com", Options::empty()).unwrap();
    let subject = "mail bob@example.com now";
    let first = exec(&code, subject, 0, Options::empty(), 6);
    for _ in 0..10 {
        assert_eq!(exec(&code, subject, 0, Options::empty(), 6), first);
    }
    assert_eq!(
        first.unwrap().as_slice(),
        &[Some((5, 20)), Some((5, 8)), Some((9, 16))]
    );
}

#[test]
fn buffer_too_small_gives_empty_success() {
    let code = compile("(a)(b)", Options::empty()).unwrap();
    for slots in [0, 1, 2, 3, 4, 5] {
        let m = exec(&code, "xaby", 0, Options::empty(), slots).unwrap();
        assert!(m.is_empty(), "slots = {}", slots);
    }
    // no match is still an error, whatever the buffer size
    assert!(exec(&code, "zzz", 0, Options::empty(), 0).is_err());
}

#[test]
fn unset_groups_are_none() {
    let code = compile("(a)|(b)", Options::empty()).unwrap();
    let m = exec(&code, "b", 0, Options::empty(), 6).unwrap();
    assert_eq!(spans(&m), vec![Some((0, 1)), None, Some((0, 1))]);

    // trailing unset groups are still reported
    let m = exec(&code, "a", 0, Options::empty(), 6).unwrap();
    assert_eq!(spans(&m), vec![Some((0, 1)), Some((0, 1)), None]);
}

#[test]
fn compile_only_flag_at_exec_is_bad_option() {
    let code = compile("a", Options::empty()).unwrap();
    let err = exec(&code, "A", 0, Options::CASELESS, 2).unwrap_err();
    assert_eq!(err, ExecError::BadOption);
    assert_eq!(err.code(), PCRS_ERROR_BADOPTION);
}

#[test]
fn start_offset_past_end_is_bad_offset() {
    let code = compile("a", Options::empty()).unwrap();
    let err = exec(&code, "abc", 4, Options::empty(), 2).unwrap_err();
    assert_eq!(err, ExecError::BadOffset);
    assert_eq!(err.code(), -24);
    assert!(exec(&code, "abc", 3, Options::empty(), 2).unwrap_err().is_no_match());
}

#[test]
fn start_offset_semantics() {
    let caret = compile("^b", Options::empty()).unwrap();
    assert!(exec(&caret, "ab", 1, Options::empty(), 2).is_err());

    let caret_ml = compile("^b", Options::MULTILINE).unwrap();
    let m = exec(&caret_ml, "a\nb", 2, Options::empty(), 2).unwrap();
    assert_eq!(m.whole_match(), Some((2, 3)));

    let g = compile("\\Gb", Options::empty()).unwrap();
    assert_eq!(
        exec(&g, "abb", 1, Options::empty(), 2).unwrap().whole_match(),
        Some((1, 2))
    );
    assert!(exec(&g, "acb", 1, Options::empty(), 2).is_err());

    let wb = compile("\\bb", Options::empty()).unwrap();
    assert!(exec(&wb, "ab", 1, Options::empty(), 2).is_err());
    assert_eq!(
        exec(&wb, "a b", 1, Options::empty(), 2).unwrap().whole_match(),
        Some((2, 3))
    );
}

#[test]
fn exec_options() {
    let code = compile("^a", Options::empty()).unwrap();
    assert!(exec(&code, "a", 0, Options::NOTBOL, 2).is_err());

    let code = compile("a$", Options::empty()).unwrap();
    assert!(exec(&code, "a", 0, Options::NOTEOL, 2).is_err());

    let code = compile("b*", Options::empty()).unwrap();
    let m = exec(&code, "abb", 0, Options::NOTEMPTY, 2).unwrap();
    assert_eq!(m.whole_match(), Some((1, 3)));

    let code = compile("b", Options::empty()).unwrap();
    assert!(exec(&code, "ab", 0, Options::ANCHORED, 2).is_err());
}

#[test]
fn match_limit_aborts_pathological_pattern() {
    let code = compile("(x+x+)+y", Options::empty()).unwrap();
    let subject = "x".repeat(40);
    let err = exec(&code, &subject, 0, Options::empty(), 6).unwrap_err();
    assert_eq!(err, ExecError::MatchLimit);
    assert_eq!(err.code(), PCRS_ERROR_MATCHLIMIT);
}

#[test]
fn shared_handle_across_threads() {
    let code = Arc::new(compile("(\\d+)-(\\d+)", Options::empty()).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let code = Arc::clone(&code);
            thread::spawn(move || {
                let subject = format!("id {}-{}", i, i * 10);
                exec(&code, &subject, 0, Options::empty(), 6).unwrap()
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        let m = h.join().unwrap();
        assert_eq!(m.get(1), Some((3, 4)));
        assert_eq!(m.len(), 3);
        assert_eq!(m.whole_match().map(|(s, _)| s), Some(3), "thread {}", i);
    }
}
