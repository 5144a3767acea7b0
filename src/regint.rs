// regint.rs - Internal types: Operation, AnchorKind, BitSet, CompiledPattern.

use crate::pcre::Options;

// === Config Constants ===
pub const DEFAULT_PARSE_DEPTH_LIMIT: u32 = 250;
pub const INIT_MATCH_STACK_SIZE: usize = 64;
/// Upper bound on the number of operations a single pattern may compile to.
pub const MAX_COMPILED_OPS: usize = 1 << 20;

// === BitSet (256 bits, one per byte value) ===
pub const BITS_IN_ROOM: usize = 32;
pub const BITSET_REAL_SIZE: usize = 256 / BITS_IN_ROOM;
pub type BitSet = [u32; BITSET_REAL_SIZE];

pub const EMPTY_BITSET: BitSet = [0; BITSET_REAL_SIZE];

#[inline]
pub fn bitset_at(bs: &BitSet, pos: u8) -> bool {
    let pos = pos as usize;
    (bs[pos >> 5] & (1u32 << (pos & 0x1f))) != 0
}

#[inline]
pub fn bitset_set(bs: &mut BitSet, pos: u8) {
    let pos = pos as usize;
    bs[pos >> 5] |= 1u32 << (pos & 0x1f);
}

pub fn bitset_set_range(bs: &mut BitSet, from: u8, to: u8) {
    for c in from..=to {
        bitset_set(bs, c);
    }
}

pub fn bitset_invert(bs: &mut BitSet) {
    for room in bs.iter_mut() {
        *room = !*room;
    }
}

pub fn bitset_or(dst: &mut BitSet, src: &BitSet) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d |= *s;
    }
}

pub fn bitset_is_empty(bs: &BitSet) -> bool {
    bs.iter().all(|&room| room == 0)
}

/// Add the other ASCII case of every letter already in the set.
pub fn bitset_fold_ascii_case(bs: &mut BitSet) {
    for c in b'a'..=b'z' {
        let upper = c.to_ascii_uppercase();
        if bitset_at(bs, c) || bitset_at(bs, upper) {
            bitset_set(bs, c);
            bitset_set(bs, upper);
        }
    }
}

/// Byte-class predicates shared by the parser and the executor.
#[inline]
pub fn is_word_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[inline]
pub fn is_space_byte(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

#[inline]
pub fn is_hspace_byte(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | 0xa0)
}

// === Anchors ===

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorKind {
    /// `^`: subject start, unless NOTBOL.
    BeginLine,
    /// `^` in multiline mode: also after any `\n` that is not the last byte.
    BeginLineMl,
    /// `$`: end, or before a final `\n`, unless NOTEOL.
    EndLine,
    /// `$` with DOLLAR_ENDONLY: end only, unless NOTEOL.
    EndLineEndOnly,
    /// `$` in multiline mode: also before any `\n`.
    EndLineMl,
    /// `\A`
    BeginBuf,
    /// `\z`
    EndBuf,
    /// `\Z`: end, or before a final `\n`.
    SemiEndBuf,
    /// `\G`: the start offset passed to exec.
    BeginPosition,
    /// `\b`
    WordBoundary,
    /// `\B`
    NotWordBoundary,
}

// === Bytecode ===

pub type AbsAddrType = usize;
pub type MemNumType = usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Successful end of the pattern.
    End,
    /// Literal byte string, compared exactly.
    Str(Box<[u8]>),
    /// Literal byte string stored in lower case, compared ASCII-caselessly.
    StrIc(Box<[u8]>),
    /// Any byte except `\n`.
    AnyChar,
    /// Any byte.
    AnyCharMl,
    /// Byte class (negation and case folding already applied).
    CClass(Box<BitSet>),

    /// Zero-width assertion.
    Anchor(AnchorKind),

    // captures
    MemStart(MemNumType),
    MemEnd(MemNumType),
    BackRef { mem: MemNumType, ignore_case: bool },

    // control flow
    /// Push a choice point resuming at `addr`, then continue with the next op.
    Push(AbsAddrType),
    Jump(AbsAddrType),

    // empty-loop guard
    EmptyCheckStart(usize),
    /// Jump to `exit` if nothing was consumed since the matching start.
    EmptyCheckEnd { id: usize, exit: AbsAddrType },

    // atomic groups and look-around
    /// Push a mark; when `on_fail` is set, backtracking into the mark
    /// resumes there at the saved position.
    Mark { on_fail: Option<AbsAddrType> },
    /// Discard choice points back to the nearest mark, keep position.
    CutToMark,
    /// Discard choice points back to the nearest mark, restore position.
    CutToMarkRestore,
    /// Discard choice points back to the nearest mark, then fail.
    CutToMarkFail,
    /// Move back `n` bytes; fails if that would cross the subject start.
    StepBack(usize),
}

/// Start-up hints computed once at compile time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptimizeInfo {
    /// Every match starts with this byte (compared exactly).
    pub first_byte: Option<u8>,
    /// First byte compared caselessly (both cases are candidates).
    pub first_byte_ic: bool,
    /// Pattern can only match at the subject start (`\A`, or `^` without
    /// multiline).
    pub anchored_buf: bool,
    /// Pattern can only match at the start offset (`\G`).
    pub anchored_position: bool,
    /// Every match consumes at least this many bytes.
    pub min_len: usize,
}

/// A compiled pattern.
///
/// Immutable after [`pcrs_compile`](crate::regcomp::pcrs_compile) returns it;
/// one handle can be matched from many threads at once.
#[derive(Clone, Debug)]
pub struct CompiledPattern {
    pub(crate) ops: Vec<Operation>,
    pub(crate) num_mem: usize,
    pub(crate) num_empty_check: usize,
    pub(crate) backref_max: usize,
    pub(crate) names: Vec<(String, MemNumType)>,
    pub(crate) options: Options,
    pub(crate) optimize: OptimizeInfo,
}

impl CompiledPattern {
    pub(crate) fn new(options: Options) -> Self {
        CompiledPattern {
            ops: Vec::new(),
            num_mem: 0,
            num_empty_check: 0,
            backref_max: 0,
            names: Vec::new(),
            options,
            optimize: OptimizeInfo::default(),
        }
    }

    /// Number of capturing groups (group 0 excluded).
    pub fn capture_count(&self) -> usize {
        self.num_mem
    }

    /// Options the pattern was compiled with.
    pub fn options(&self) -> Options {
        self.options
    }

    /// Named groups in definition order.
    pub fn names(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.names.iter().map(|(n, g)| (n.as_str(), *g))
    }

    /// Number of integer slots that holds a complete result.
    pub fn ovector_size(&self) -> usize {
        2 * (self.num_mem + 1)
    }
}
