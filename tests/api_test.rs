// api_test.rs - Integration tests for the idiomatic Rust API.

use pcrs::api::{Regex, RegexBuilder};
use pcrs::pcre::*;
use pcrs::prelude::*;

// === Regex::new ===

#[test]
fn find_hex_literal() {
    let re = Regex::new(r"0x[[:xdigit:]]+").unwrap();
    assert_eq!(re.find("mov eax, 0x1F; ret").unwrap().as_str(), "0x1F");
    assert!(re.find("mov eax, 31").is_none());
}

#[test]
fn empty_pattern() {
    let re = Regex::new(r"").unwrap();
    let m = re.find("hello").unwrap();
    assert_eq!(m.start(), 0);
    assert_eq!(m.end(), 0);
    assert!(m.is_empty());
}

#[test]
fn invalid_pattern_reports_code_and_offset() {
    let err = Regex::new(r"(unclosed").unwrap_err();
    assert_eq!(err.code(), PCRS_ERR_MISSING_PARENTHESIS);
    assert_eq!(err.offset(), 9);
}

#[test]
fn invalid_pattern_unterminated_class() {
    let err = Regex::new(r"[]").unwrap_err();
    assert_eq!(err.code(), PCRS_ERR_MISSING_CLASS_TERMINATOR);
}

#[test]
fn unicode_property_is_rejected() {
    let err = Regex::new(r"\p{Hiragana}+").unwrap_err();
    assert_eq!(err.code(), PCRS_ERR_UNSUPPORTED_PROPERTY);
}

// === Regex::is_match ===

#[test]
fn is_match_anywhere() {
    let re = Regex::new(r"\.rs$").unwrap();
    assert!(re.is_match("src/lib.rs"));
    assert!(re.is_match("main.rs\n"));
    assert!(!re.is_match("main.rs.bak"));
}

// === Regex::find ===

#[test]
fn find_start_end_range() {
    let re = Regex::new(r"k[aeiou]+t").unwrap();
    let m = re.find("jackboot kiet").unwrap();
    assert_eq!((m.start(), m.end()), (9, 13));
    assert_eq!(m.range(), 9..13);
    assert_eq!(m.len(), 4);
    assert_eq!(m.as_bytes(), b"kiet");
}

#[test]
fn find_non_ascii_subject() {
    let re = Regex::new(r"wörld").unwrap();
    let m = re.find("hello wörld").unwrap();
    assert_eq!(m.range(), 6..12);
    assert_eq!(m.as_str(), "wörld");
}

#[test]
fn find_at_offset() {
    let re = Regex::new(r"\d").unwrap();
    let m = re.find_at("1a2b3", 1).unwrap().unwrap();
    assert_eq!(m.start(), 2);
    assert!(re.find_at("1a2b3", 5).unwrap().is_none());
    assert_eq!(re.find_at("1a2b3", 6).unwrap_err(), ExecError::BadOffset);
}

// === Regex::captures ===

#[test]
fn captures_groups() {
    let re = Regex::new(r"(\w+):(\d+)").unwrap();
    let caps = re.captures("connect db:5432 now").unwrap();
    assert_eq!(caps.get(0).unwrap().as_str(), "db:5432");
    assert_eq!(caps.get(1).unwrap().as_str(), "db");
    assert_eq!(caps.get(2).unwrap().range(), 11..15);
    assert_eq!(caps.len(), 3);
}

#[test]
fn captures_optional_group() {
    let re = Regex::new(r"(a)(b)?c").unwrap();
    let caps = re.captures("ac").unwrap();
    assert_eq!(caps.get(0).unwrap().as_str(), "ac");
    assert_eq!(caps.get(1).unwrap().as_str(), "a");
    assert!(caps.get(2).is_none()); // group 2 didn't participate
}

#[test]
fn captures_named() {
    let re = Regex::new(r"(?'key'[a-z_]+)\s*=\s*(?P<value>\S+)").unwrap();
    let caps = re.captures("  max_conn = 64").unwrap();
    assert_eq!(caps.name("key").unwrap().as_str(), "max_conn");
    assert_eq!(caps.name("value").unwrap().as_str(), "64");
    assert!(caps.name("section").is_none());
}

#[test]
fn captures_no_match() {
    let re = Regex::new(r"(\d+)").unwrap();
    assert!(re.captures("no digits").is_none());
}

#[test]
fn captures_len() {
    let re = Regex::new(r"(a)(?:b)((c)(?<d>d))(?=e)").unwrap();
    assert_eq!(re.captures_len(), 4);
}

#[test]
fn captures_iter() {
    let re = Regex::new(r"(\d)(\d)?").unwrap();
    let caps = re.captures("x7").unwrap();
    let items: Vec<_> = caps.iter().map(|m| m.map(|m| m.as_str())).collect();
    assert_eq!(items, vec![Some("7"), Some("7"), None]);
}

#[test]
fn captures_last_iteration_wins() {
    let re = Regex::new(r"(\w)+").unwrap();
    let caps = re.captures("abc").unwrap();
    assert_eq!(caps.get(1).unwrap().as_str(), "c");
}

// === Regex::find_iter ===

#[test]
fn find_iter_multiple() {
    let re = Regex::new(r"[A-Z][a-z]*").unwrap();
    let words: Vec<&str> = re.find_iter("GetHTTPStatus").map(|m| m.as_str()).collect();
    assert_eq!(words, vec!["Get", "H", "T", "T", "P", "Status"]);
    assert_eq!(re.find_iter("lower only").count(), 0);
}

#[test]
fn find_iter_empty_pattern() {
    let re = Regex::new(r"").unwrap();
    let results: Vec<_> = re.find_iter("ab").collect();
    assert_eq!(results.len(), 3);
    for (i, m) in results.iter().enumerate() {
        assert_eq!(m.start(), i);
        assert!(m.is_empty());
    }
}

#[test]
fn find_iter_mixed_empty_and_nonempty() {
    let re = Regex::new(r"a*").unwrap();
    let spans: Vec<_> = re.find_iter("baa").map(|m| m.range()).collect();
    assert_eq!(spans, vec![0..0, 1..3, 3..3]);
}

#[test]
fn find_iter_word_boundaries_see_previous_text() {
    let re = Regex::new(r"\bx").unwrap();
    let starts: Vec<_> = re.find_iter("x xx x").map(|m| m.start()).collect();
    assert_eq!(starts, vec![0, 2, 5]);
}

// === RegexBuilder ===

#[test]
fn builder_case_insensitive() {
    let re = RegexBuilder::new(r"select\s+\*")
        .case_insensitive(true)
        .build()
        .unwrap();
    assert!(re.is_match("SELECT  * FROM t"));
    assert!(re.is_match("Select *"));
}

#[test]
fn builder_dot_matches_newline() {
    let re = Regex::builder(r"a.b")
        .dot_matches_newline(true)
        .build()
        .unwrap();
    assert!(re.is_match("a\nb"));

    let re2 = Regex::builder(r"a.b").build().unwrap();
    assert!(!re2.is_match("a\nb"));
}

#[test]
fn builder_multi_line() {
    let re = Regex::builder(r"^b$").multi_line(true).build().unwrap();
    assert_eq!(re.find("a\nb\nc").unwrap().start(), 2);
    let re2 = Regex::builder(r"^b$").build().unwrap();
    assert!(!re2.is_match("a\nb\nc"));
}

#[test]
fn builder_extended_mode() {
    let re = Regex::builder(
        r"
        \d+   # digits
        \s+   # space
        \w+   # word
    ",
    )
    .extended(true)
    .build()
    .unwrap();
    assert!(re.is_match("42 hello"));
}

#[test]
fn builder_ungreedy() {
    let re = Regex::builder(r"a+").ungreedy(true).build().unwrap();
    assert_eq!(re.find("aaa").unwrap().as_str(), "a");
    let re = Regex::builder(r"a+?").ungreedy(true).build().unwrap();
    assert_eq!(re.find("aaa").unwrap().as_str(), "aaa");
}

#[test]
fn builder_rejects_exec_only_option() {
    let err = Regex::builder(r"a").option(Options::NOTBOL).build().unwrap_err();
    assert_eq!(err.code(), PCRS_ERR_UNKNOWN_OPTION_BITS);
    assert_eq!(err.offset(), 0);
}

#[test]
fn builder_chaining() {
    let re = Regex::builder(r"begin.+end")
        .case_insensitive(true)
        .dot_matches_newline(true)
        .extended(false)
        .build()
        .unwrap();
    assert!(re.is_match("BEGIN\n body \nEND"));
}

// === Byte API ===

#[test]
fn find_bytes() {
    let re = Regex::new_bytes(b"\\x00[^\\x00]+").unwrap();
    let m = re.find_bytes(b"hdr\x00payload").unwrap();
    assert_eq!(m.as_bytes(), b"\x00payload");
    assert_eq!(m.start(), 3);
    assert!(!re.is_match_bytes(b"no nul here"));
}

#[test]
fn byte_classes_match_high_bytes() {
    let re = Regex::new_bytes(b"[\\x80-\\xff]+").unwrap();
    let m = re.find_bytes(b"ab\xc3\xa9cd").unwrap();
    assert_eq!(m.range(), 2..4);
}

// === Errors ===

#[test]
fn error_display() {
    let err = Regex::new(r"(").unwrap_err();
    assert_eq!(err.to_string(), "missing ) at offset 1");
}

#[test]
fn error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(Regex::new(r"[").unwrap_err());
    assert!(!err.to_string().is_empty());
}

// === Prelude ===

#[test]
fn prelude_imports_work() {
    let re = Regex::new(r"(\w+)").unwrap();
    let caps: Captures = re.captures("hello").unwrap();
    let m: Match = caps.get(0).unwrap();
    assert_eq!(m.as_str(), "hello");
    let _: &CompileError = &Regex::new(r"(").unwrap_err();
}

// === as_raw escape hatch ===

#[test]
fn as_raw_access() {
    use pcrs::reginfo::pcrs_captured_count;
    let re = Regex::new(r"(a)(b)(c)").unwrap();
    assert_eq!(pcrs_captured_count(re.as_raw()), 3);
    assert_eq!(re.group_index("x"), None);
}

// === Complex patterns ===

#[test]
fn alternation() {
    let re = Regex::new(r"GET|PUT|POST").unwrap();
    assert_eq!(re.find("curl -X POST url").unwrap().as_str(), "POST");
}

#[test]
fn backreference() {
    let re = Regex::new(r"<(\w+)>.*</\1>").unwrap();
    let m = re.find("x <b>bold</b> <i>").unwrap();
    assert_eq!(m.as_str(), "<b>bold</b>");
}

#[test]
fn lookahead() {
    let re = Regex::new(r"\w+(?=\.txt)").unwrap();
    let m = re.find("open notes.txt").unwrap();
    assert_eq!(m.as_str(), "notes");
}

#[test]
fn lookbehind() {
    let re = Regex::new(r"(?<!-)\b\d+").unwrap();
    let m = re.find("-5 and 8").unwrap();
    assert_eq!(m.as_str(), "8");
}

#[test]
fn possessive_quantifier() {
    let re = Regex::new(r"a++b").unwrap();
    assert!(re.is_match("aab"));
    assert!(!re.is_match("aa"));
    let re = Regex::new(r"a++a").unwrap();
    assert!(!re.is_match("aaa"));
}

#[test]
fn log_line_extraction() {
    let re = Regex::new(r"^(?<level>[A-Z]+) \[(?<mod>[\w:]+)\] (?<msg>.*)$").unwrap();
    let caps = re.captures("WARN [net::tcp] retrying connect").unwrap();
    assert_eq!(caps.name("level").unwrap().as_str(), "WARN");
    assert_eq!(caps.name("mod").unwrap().as_str(), "net::tcp");
    assert_eq!(caps.name("msg").unwrap().as_str(), "retrying connect");
    assert_eq!(re.group_index("msg"), Some(3));
}

#[test]
fn debug_impl() {
    let re = Regex::builder(r"(x)").case_insensitive(true).build().unwrap();
    let dbg = format!("{:?}", re);
    assert!(dbg.contains("Regex"));
    assert!(dbg.contains("CASELESS"));
}

#[test]
fn captures_debug_impl() {
    let re = Regex::new(r"(\d+)").unwrap();
    let caps = re.captures("42").unwrap();
    let dbg = format!("{:?}", caps);
    assert!(!dbg.is_empty());
}
