// binding.rs - compile / captured_count / exec over host values.
//
// The three primitives a PCRE binding needs, expressed with owned
// handles and Result values instead of raw pointers and status ints.

use smallvec::{smallvec, SmallVec};

use crate::error::{CompileError, ExecError};
use crate::pcre::Options;
use crate::regcomp::pcrs_compile;
use crate::regexec::pcrs_exec;
use crate::reginfo::pcrs_captured_count;
use crate::regint::CompiledPattern;

pub type CompileOutcome = Result<CompiledPattern, CompileError>;
pub type ExecOutcome = Result<MatchResult, ExecError>;

/// Offset pairs of one successful exec.
///
/// Index 0 is the whole match, index `i` is capture group `i`. A group
/// that did not take part in the match is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    spans: Vec<Option<(usize, usize)>>,
}

impl MatchResult {
    /// Number of pairs, including group 0.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// `true` when the output buffer was too small to hold the result.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<(usize, usize)> {
        self.spans.get(i).copied().flatten()
    }

    pub fn whole_match(&self) -> Option<(usize, usize)> {
        self.get(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<(usize, usize)>> + '_ {
        self.spans.iter().copied()
    }

    pub fn as_slice(&self) -> &[Option<(usize, usize)>] {
        &self.spans
    }
}

impl IntoIterator for MatchResult {
    type Item = Option<(usize, usize)>;
    type IntoIter = std::vec::IntoIter<Option<(usize, usize)>>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.into_iter()
    }
}

/// Compile `pattern` with `options`.
///
/// # Examples
///
/// ```
/// use pcrs::binding::{compile, captured_count};
/// use pcrs::pcre::Options;
///
/// let code = compile("(a)(b)", Options::empty()).unwrap();
/// assert_eq!(captured_count(&code), 2);
///
/// let err = compile("(", Options::empty()).unwrap_err();
/// assert!(!err.message().is_empty());
/// assert!(err.offset() <= 1);
/// ```
pub fn compile(pattern: &str, options: Options) -> CompileOutcome {
    pcrs_compile(pattern.as_bytes(), options)
}

/// Number of capturing groups in `code`.
pub fn captured_count(code: &CompiledPattern) -> usize {
    pcrs_captured_count(code)
}

/// Run `code` against `subject` starting at byte `start_offset`.
///
/// `output_slots` is the size of the integer buffer handed to the engine;
/// it is clamped to the most the pattern can fill. A buffer smaller than
/// `2 * (1 + captured_count)` still reports a match, but as an empty
/// [`MatchResult`].
///
/// # Examples
///
/// ```
/// use pcrs::binding::{compile, exec};
/// use pcrs::pcre::Options;
///
/// let code = compile("(a)(b)", Options::empty()).unwrap();
/// let m = exec(&code, "xaby", 0, Options::empty(), 6).unwrap();
/// assert_eq!(m.as_slice(), &[Some((1, 3)), Some((1, 2)), Some((2, 3))]);
/// ```
pub fn exec(
    code: &CompiledPattern,
    subject: &str,
    start_offset: usize,
    options: Options,
    output_slots: usize,
) -> ExecOutcome {
    let slots = output_slots.min(code.ovector_size()) & !1;
    let mut ovector: SmallVec<[i32; 32]> = smallvec![-1; slots];
    let rc = pcrs_exec(code, subject.as_bytes(), start_offset, options, &mut ovector);
    if rc < 0 {
        return Err(ExecError::from(rc));
    }
    let pairs = rc as usize;
    let spans = ovector[..2 * pairs]
        .chunks_exact(2)
        .map(|pair| (pair[0] >= 0).then(|| (pair[0] as usize, pair[1] as usize)))
        .collect();
    Ok(MatchResult { spans })
}
