// api.rs - Idiomatic Rust API for pcrs.
//
// Owned pattern plus borrowed match views over pcrs_compile/pcrs_exec.
// Searches run on a stack-allocated ovector sized to the pattern.

use std::ops::Range;

use smallvec::{smallvec, SmallVec};

use crate::error::{CompileError, ExecError};
use crate::pcre::*;
use crate::regcomp::pcrs_compile;
use crate::regexec::pcrs_exec;
use crate::reginfo::pcrs_get_stringnumber;
use crate::regint::CompiledPattern;

type OVector = SmallVec<[i32; 32]>;

/// A pattern compiled with [`pcrs_compile`].
///
/// # Examples
///
/// ```
/// use pcrs::api::Regex;
///
/// let re = Regex::new(r"[0-9]+").unwrap();
/// assert!(re.is_match("port 8080"));
///
/// let m = re.find("port 8080").unwrap();
/// assert_eq!(m.as_str(), "8080");
/// assert_eq!(m.range(), 5..9);
/// ```
pub struct Regex {
    inner: CompiledPattern,
}

impl Regex {
    /// Compile a pattern with no options.
    pub fn new(pattern: &str) -> Result<Regex, CompileError> {
        Self::new_bytes(pattern.as_bytes())
    }

    /// Compile a pattern from raw bytes with no options.
    pub fn new_bytes(pattern: &[u8]) -> Result<Regex, CompileError> {
        let inner = pcrs_compile(pattern, Options::empty())?;
        Ok(Regex { inner })
    }

    /// Start a [`RegexBuilder`] to set compile options.
    pub fn builder(pattern: &str) -> RegexBuilder {
        RegexBuilder::new(pattern)
    }

    /// Run the engine once. `Ok(None)` is a plain "no match".
    fn search(
        &self,
        text: &[u8],
        start: usize,
        options: Options,
    ) -> Result<Option<OVector>, ExecError> {
        let mut ovector: OVector = smallvec![-1; self.inner.ovector_size()];
        match pcrs_exec(&self.inner, text, start, options, &mut ovector) {
            PCRS_ERROR_NOMATCH => Ok(None),
            rc if rc < 0 => Err(ExecError::from(rc)),
            _ => Ok(Some(ovector)),
        }
    }

    /// Leftmost match in `text`.
    pub fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.find_bytes(text.as_bytes())
    }

    /// Leftmost match in a byte subject. Engine errors read as no match.
    pub fn find_bytes<'t>(&self, text: &'t [u8]) -> Option<Match<'t>> {
        self.find_at_bytes(text, 0).ok().flatten()
    }

    /// Return the first match starting the search at byte `start`.
    ///
    /// Unlike slicing the text, this keeps the bytes before `start`
    /// visible to `\b` and look-behind.
    pub fn find_at<'t>(&self, text: &'t str, start: usize) -> Result<Option<Match<'t>>, ExecError> {
        self.find_at_bytes(text.as_bytes(), start)
    }

    pub fn find_at_bytes<'t>(
        &self,
        text: &'t [u8],
        start: usize,
    ) -> Result<Option<Match<'t>>, ExecError> {
        Ok(self
            .search(text, start, Options::empty())?
            .map(|ov| Match {
                text,
                start: ov[0] as usize,
                end: ov[1] as usize,
            }))
    }

    /// `true` if the pattern matches somewhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.is_match_bytes(text.as_bytes())
    }

    /// Byte-slice form of [`Regex::is_match`].
    pub fn is_match_bytes(&self, text: &[u8]) -> bool {
        matches!(self.search(text, 0, Options::empty()), Ok(Some(_)))
    }

    /// Leftmost match together with its groups.
    pub fn captures<'t>(&'t self, text: &'t str) -> Option<Captures<'t>> {
        self.captures_bytes(text.as_bytes())
    }

    /// Byte-slice form of [`Regex::captures`].
    pub fn captures_bytes<'t>(&'t self, text: &'t [u8]) -> Option<Captures<'t>> {
        let ovector = self.search(text, 0, Options::empty()).ok()??;
        Some(Captures {
            text,
            ovector,
            regex: self,
        })
    }

    /// Successive non-overlapping matches, left to right.
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> FindIter<'r, 't> {
        self.find_iter_bytes(text.as_bytes())
    }

    /// Byte-slice form of [`Regex::find_iter`].
    pub fn find_iter_bytes<'r, 't>(&'r self, text: &'t [u8]) -> FindIter<'r, 't> {
        FindIter {
            regex: self,
            text,
            last_end: 0,
            last_was_empty: false,
        }
    }

    /// Number of capturing groups, not counting the whole match.
    pub fn captures_len(&self) -> usize {
        self.inner.capture_count()
    }

    /// Group number of a named group.
    pub fn group_index(&self, name: &str) -> Option<usize> {
        pcrs_get_stringnumber(&self.inner, name)
    }

    /// Access the underlying [`CompiledPattern`] for use with the
    /// engine-level functions.
    pub fn as_raw(&self) -> &CompiledPattern {
        &self.inner
    }
}

impl std::fmt::Debug for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Regex")
            .field("captures", &self.inner.capture_count())
            .field("options", &self.inner.options())
            .finish_non_exhaustive()
    }
}

impl std::str::FromStr for Regex {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Regex, CompileError> {
        Regex::new(s)
    }
}

// === RegexBuilder ===

/// Compile options for a [`Regex`], set one at a time.
///
/// # Examples
///
/// ```
/// use pcrs::api::Regex;
///
/// let re = Regex::builder(r"^get /\w+")
///     .case_insensitive(true)
///     .multi_line(true)
///     .build()
///     .unwrap();
/// assert!(re.is_match("Host: x\nGET /index"));
/// ```
pub struct RegexBuilder {
    pattern: Vec<u8>,
    options: Options,
}

impl RegexBuilder {
    pub fn new(pattern: &str) -> Self {
        RegexBuilder {
            pattern: pattern.as_bytes().to_vec(),
            options: Options::empty(),
        }
    }

    /// ASCII case folding (`CASELESS`).
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.options.set(Options::CASELESS, yes);
        self
    }

    /// `.` also matches `\n` (`DOTALL`).
    pub fn dot_matches_newline(mut self, yes: bool) -> Self {
        self.options.set(Options::DOTALL, yes);
        self
    }

    /// `^` and `$` match at internal newlines (`MULTILINE`).
    pub fn multi_line(mut self, yes: bool) -> Self {
        self.options.set(Options::MULTILINE, yes);
        self
    }

    /// Ignore whitespace and `#` comments in the pattern (`EXTENDED`).
    pub fn extended(mut self, yes: bool) -> Self {
        self.options.set(Options::EXTENDED, yes);
        self
    }

    /// Make quantifiers lazy by default.
    pub fn ungreedy(mut self, yes: bool) -> Self {
        self.options.set(Options::UNGREEDY, yes);
        self
    }

    /// Add raw option flags.
    pub fn option(mut self, flag: Options) -> Self {
        self.options |= flag;
        self
    }

    /// Compile with the collected options.
    pub fn build(self) -> Result<Regex, CompileError> {
        let inner = pcrs_compile(&self.pattern, self.options)?;
        Ok(Regex { inner })
    }
}

// === Match ===

/// Span of one match, borrowing the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'t> {
    text: &'t [u8],
    start: usize,
    end: usize,
}

impl<'t> Match<'t> {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// `start..end` in bytes.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn as_bytes(&self) -> &'t [u8] {
        &self.text[self.start..self.end]
    }

    /// Matched bytes as `&str`.
    ///
    /// # Panics
    ///
    /// Panics if the matched bytes are not valid UTF-8, which can happen
    /// when a byte-level pattern splits a multi-byte character.
    pub fn as_str(&self) -> &'t str {
        std::str::from_utf8(self.as_bytes()).expect("match is not valid UTF-8")
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// === Captures ===

/// Group spans of one match, read straight from the ovector. Slot 0 is
/// the whole match.
pub struct Captures<'t> {
    text: &'t [u8],
    ovector: OVector,
    regex: &'t Regex,
}

impl<'t> Captures<'t> {
    /// Span of group `i`; `None` for an unset group or an index past the end.
    pub fn get(&self, i: usize) -> Option<Match<'t>> {
        let start = *self.ovector.get(2 * i)?;
        let end = *self.ovector.get(2 * i + 1)?;
        if start < 0 {
            return None;
        }
        Some(Match {
            text: self.text,
            start: start as usize,
            end: end as usize,
        })
    }

    /// Span of a named group.
    pub fn name(&self, name: &str) -> Option<Match<'t>> {
        self.get(self.regex.group_index(name)?)
    }

    /// Number of slots, the whole match included.
    pub fn len(&self) -> usize {
        self.ovector.len() / 2
    }

    /// `true` when no slot was recorded.
    pub fn is_empty(&self) -> bool {
        self.ovector.is_empty()
    }

    pub fn iter(&self) -> CapturesIter<'_, 't> {
        CapturesIter {
            captures: self,
            index: 0,
        }
    }
}

impl std::fmt::Debug for Captures<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for i in 0..self.len() {
            list.entry(&self.get(i));
        }
        list.finish()
    }
}

// === CapturesIter ===

/// Yields each group of a [`Captures`] in order.
pub struct CapturesIter<'c, 't> {
    captures: &'c Captures<'t>,
    index: usize,
}

impl<'c, 't> Iterator for CapturesIter<'c, 't> {
    type Item = Option<Match<'t>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.captures.len() {
            return None;
        }
        let m = self.captures.get(self.index);
        self.index += 1;
        Some(m)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.captures.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CapturesIter<'_, '_> {}

// === FindIter ===

/// Length of the UTF-8 sequence introduced by `lead`, 1 for stray bytes.
fn utf8_seq_len(lead: u8) -> usize {
    match lead {
        0xf0..=0xf7 => 4,
        0xe0..=0xef => 3,
        0xc0..=0xdf => 2,
        _ => 1,
    }
}

/// Non-overlapping matches of a [`Regex`]. After an empty match the next
/// search starts one character further on.
pub struct FindIter<'r, 't> {
    regex: &'r Regex,
    text: &'t [u8],
    last_end: usize,
    last_was_empty: bool,
}

impl<'r, 't> Iterator for FindIter<'r, 't> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Match<'t>> {
        if self.last_end > self.text.len() {
            return None;
        }

        let m = self.regex.find_at_bytes(self.text, self.last_end).ok()??;

        // two empty matches in a row at the same spot: advance one char
        if m.is_empty() {
            if self.last_was_empty {
                if self.last_end >= self.text.len() {
                    return None;
                }
                let step = utf8_seq_len(self.text[self.last_end]);
                self.last_end = (self.last_end + step).min(self.text.len());
                self.last_was_empty = false;
                return self.next();
            }
            self.last_was_empty = true;
        } else {
            self.last_was_empty = false;
        }

        self.last_end = m.end;
        Some(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_reports_span() {
        let re = Regex::new(r"[a-z]+@").unwrap();
        let m = re.find("to: alice@host").unwrap();
        assert_eq!(m.as_str(), "alice@");
        assert_eq!((m.start(), m.end()), (4, 10));
        assert_eq!(m.len(), 6);
        assert!(!m.is_empty());
        assert!(re.find("TO: ALICE@HOST").is_none());
    }

    #[test]
    fn captures_by_index() {
        let re = Regex::new(r"(\w+)=(\w*)").unwrap();
        let caps = re.captures("?key=val&x=").unwrap();
        assert_eq!(caps.len(), 3);
        assert_eq!(caps.get(0).map(|m| m.range()), Some(1..8));
        assert_eq!(caps.get(1).unwrap().as_str(), "key");
        assert_eq!(caps.get(2).unwrap().as_str(), "val");
        assert!(caps.get(3).is_none());
    }

    #[test]
    fn compile_error_surfaces_code_and_offset() {
        let err = Regex::new(r"ab(c").unwrap_err();
        assert_eq!(err.code(), PCRS_ERR_MISSING_PARENTHESIS);
        assert_eq!(err.offset(), 4);
        let err: CompileError = "x{3,1}".parse::<Regex>().unwrap_err();
        assert_eq!(err.code(), PCRS_ERR_QUANTIFIER_OUT_OF_ORDER);
    }

    #[test]
    fn unset_group_in_iteration() {
        let re = Regex::new(r"(x)|(y)").unwrap();
        let caps = re.captures("y").unwrap();
        let set: Vec<bool> = caps.iter().map(|m| m.is_some()).collect();
        assert_eq!(set, vec![true, false, true]);
        assert_eq!(caps.iter().len(), 3);
    }

    #[test]
    fn named_groups() {
        let re = Regex::new(r"(?<k>\w+):(?P<v>\d+)").unwrap();
        assert_eq!(re.group_index("v"), Some(2));
        let caps = re.captures("a:1").unwrap();
        assert_eq!(caps.name("k").map(|m| m.as_str()), Some("a"));
        assert_eq!(caps.name("v").map(|m| m.as_str()), Some("1"));
        assert!(caps.name("z").is_none());
    }

    #[test]
    fn find_iter_with_empty_pattern() {
        let re = Regex::new(r"").unwrap();
        let starts: Vec<_> = re.find_iter("xyz").map(|m| m.start()).collect();
        assert_eq!(starts, vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_match_steps_whole_character() {
        let re = Regex::new(r"q*").unwrap();
        let starts: Vec<_> = re.find_iter("ü!").map(|m| m.start()).collect();
        assert_eq!(starts, vec![0, 2, 3]);
    }

    #[test]
    fn find_at_sees_preceding_text() {
        let re = Regex::new(r"\bb").unwrap();
        assert_eq!(re.find_at("ab b", 1).unwrap().map(|m| m.start()), Some(3));
        assert_eq!(re.find_at("ab", 3).unwrap_err(), ExecError::BadOffset);
    }

    #[test]
    fn byte_slice_variants() {
        let re = Regex::new(r"id=(\d+)").unwrap();
        let text = b"\xff\xfe id=7 id=42";
        assert!(re.is_match_bytes(text));
        let caps = re.captures_bytes(text).unwrap();
        assert_eq!(caps.len(), 2);
        assert!(!caps.is_empty());
        assert_eq!(caps.get(1).unwrap().as_bytes(), b"7");
        let ends: Vec<usize> = re.find_iter_bytes(text).map(|m| m.end()).collect();
        assert_eq!(ends, vec![7, 13]);
        assert!(!re.is_match_bytes(b"\xffid=x"));
    }

    #[test]
    fn debug_shows_group_count() {
        let re = Regex::new(r"(a)(b)").unwrap();
        assert!(format!("{:?}", re).contains("captures: 2"));
    }
}
