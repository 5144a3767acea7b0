// regexec.rs - Backtracking matcher and search loop.
//
// match_at() runs the bytecode at one start position, keeping choice
// points and capture restores on an explicit stack. pcrs_exec() picks
// candidate start positions and writes the offset vector.

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use memchr::{memchr, memchr2};
use smallvec::{smallvec, SmallVec};

use crate::pcre::*;
use crate::regint::*;

// ============================================================================
// Global limits
// ============================================================================

static MATCH_LIMIT: AtomicU64 = AtomicU64::new(PCRS_DEFAULT_MATCH_LIMIT);

/// Set the maximum number of choice points a single exec call may create.
pub fn pcrs_set_match_limit(n: u64) {
    MATCH_LIMIT.store(n, Ordering::Relaxed);
}

pub fn pcrs_get_match_limit() -> u64 {
    MATCH_LIMIT.load(Ordering::Relaxed)
}

// ============================================================================
// Match state
// ============================================================================

type MemPtr = Option<usize>;
type MemSpan = Option<(usize, usize)>;

/// Inline capacity for per-group vectors; most patterns have few groups.
const INLINE_MEMS: usize = 8;

#[derive(Clone, Copy, Debug)]
enum StackEntry {
    /// Choice point: resume at `pcode` with subject position `pstr`.
    Alt { pcode: AbsAddrType, pstr: usize },
    /// Restore a group's tentative start.
    MemStart { mem: MemNumType, prev: MemPtr },
    /// Restore a group's committed span.
    MemEnd { mem: MemNumType, prev: MemSpan },
    /// Restore an empty-loop guard position.
    EmptyCheck { id: usize, prev: MemPtr },
    /// Atomic group or look-around boundary.
    Mark {
        pstr: usize,
        on_fail: Option<AbsAddrType>,
    },
}

struct MatchArg<'a> {
    reg: &'a CompiledPattern,
    subject: &'a [u8],
    options: Options,
    start_offset: usize,
    limit: u64,
    steps: u64,
    stack: Vec<StackEntry>,
    mem_start: SmallVec<[MemPtr; INLINE_MEMS]>,
    mem_span: SmallVec<[MemSpan; INLINE_MEMS]>,
    empty_check: SmallVec<[MemPtr; INLINE_MEMS]>,
}

impl<'a> MatchArg<'a> {
    fn new(
        reg: &'a CompiledPattern,
        subject: &'a [u8],
        start_offset: usize,
        options: Options,
        limit: u64,
    ) -> Self {
        let n = reg.num_mem + 1;
        MatchArg {
            reg,
            subject,
            options: options | (reg.options & Options::ANCHORED),
            start_offset,
            limit,
            steps: 0,
            stack: Vec::with_capacity(INIT_MATCH_STACK_SIZE),
            mem_start: smallvec![None; n],
            mem_span: smallvec![None; n],
            empty_check: smallvec![None; reg.num_empty_check],
        }
    }

    /// Clear per-attempt state before trying a new start position.
    fn reset(&mut self) {
        self.stack.clear();
        self.mem_start.iter_mut().for_each(|m| *m = None);
        self.mem_span.iter_mut().for_each(|m| *m = None);
        self.empty_check.iter_mut().for_each(|m| *m = None);
    }

    #[inline]
    fn push_alt(&mut self, pcode: AbsAddrType, pstr: usize) -> Result<(), i32> {
        self.steps += 1;
        if self.steps > self.limit {
            return Err(PCRS_ERROR_MATCHLIMIT);
        }
        self.stack.push(StackEntry::Alt { pcode, pstr });
        Ok(())
    }
}

// ============================================================================
// Stack operations
// ============================================================================

/// Pop entries until a resumable one is found, undoing capture and guard
/// changes along the way. Returns `(pcode, pstr)` to resume at, or `None`
/// when the stack is exhausted.
fn stack_pop(arg: &mut MatchArg) -> Option<(AbsAddrType, usize)> {
    loop {
        match arg.stack.pop()? {
            StackEntry::Alt { pcode, pstr } => return Some((pcode, pstr)),
            StackEntry::MemStart { mem, prev } => arg.mem_start[mem] = prev,
            StackEntry::MemEnd { mem, prev } => arg.mem_span[mem] = prev,
            StackEntry::EmptyCheck { id, prev } => arg.empty_check[id] = prev,
            StackEntry::Mark {
                pstr,
                on_fail: Some(pcode),
            } => return Some((pcode, pstr)),
            StackEntry::Mark { on_fail: None, .. } => {}
        }
    }
}

/// Remove the nearest mark and every choice point above it. Restore
/// entries above the mark are kept so later backtracking still undoes
/// captures made inside the group. Returns the position saved in the mark.
fn stack_cut_to_mark(stack: &mut Vec<StackEntry>) -> Option<usize> {
    let idx = stack
        .iter()
        .rposition(|e| matches!(e, StackEntry::Mark { .. }))?;
    let StackEntry::Mark { pstr, .. } = stack[idx] else {
        return None;
    };
    let kept: SmallVec<[StackEntry; 16]> = stack
        .drain(idx + 1..)
        .filter(|e| !matches!(e, StackEntry::Alt { .. } | StackEntry::Mark { .. }))
        .collect();
    stack.truncate(idx);
    stack.extend(kept);
    Some(pstr)
}

// ============================================================================
// Helpers
// ============================================================================

#[inline]
fn is_word_at(subject: &[u8], s: usize) -> bool {
    subject.get(s).copied().is_some_and(is_word_byte)
}

#[inline]
fn is_word_boundary(subject: &[u8], s: usize) -> bool {
    let before = s > 0 && is_word_at(subject, s - 1);
    before != is_word_at(subject, s)
}

fn anchor_matches(kind: AnchorKind, arg: &MatchArg, s: usize) -> bool {
    let subject = arg.subject;
    let end = subject.len();
    let notbol = arg.options.contains(Options::NOTBOL);
    let noteol = arg.options.contains(Options::NOTEOL);
    let before_final_newline = s + 1 == end && subject[s] == b'\n';
    match kind {
        AnchorKind::BeginLine => s == 0 && !notbol,
        AnchorKind::BeginLineMl => {
            (s == 0 && !notbol) || (s > 0 && s < end && subject[s - 1] == b'\n')
        }
        AnchorKind::EndLine => !noteol && (s == end || before_final_newline),
        AnchorKind::EndLineEndOnly => !noteol && s == end,
        AnchorKind::EndLineMl => (s < end && subject[s] == b'\n') || (s == end && !noteol),
        AnchorKind::BeginBuf => s == 0,
        AnchorKind::EndBuf => s == end,
        AnchorKind::SemiEndBuf => s == end || before_final_newline,
        AnchorKind::BeginPosition => s == arg.start_offset,
        AnchorKind::WordBoundary => is_word_boundary(subject, s),
        AnchorKind::NotWordBoundary => !is_word_boundary(subject, s),
    }
}

// ============================================================================
// match_at - main VM loop
// ============================================================================

/// Try to match at `sstart`. Returns the end of the match on success; the
/// group spans are left in `arg.mem_span`.
fn match_at(arg: &mut MatchArg, sstart: usize) -> Result<Option<usize>, i32> {
    let reg = arg.reg;
    let ops = &reg.ops;
    let subject = arg.subject;
    let end = subject.len();
    let mut pc: AbsAddrType = 0;
    let mut s = sstart;

    loop {
        let ok = match &ops[pc] {
            Operation::End => {
                let empty = s == sstart;
                let reject = empty
                    && (arg.options.contains(Options::NOTEMPTY)
                        || (arg.options.contains(Options::NOTEMPTY_ATSTART)
                            && sstart == arg.start_offset));
                if !reject {
                    arg.mem_span[0] = Some((sstart, s));
                    return Ok(Some(s));
                }
                false
            }
            Operation::Str(bytes) => {
                if subject[s..].starts_with(bytes) {
                    s += bytes.len();
                    pc += 1;
                    true
                } else {
                    false
                }
            }
            Operation::StrIc(bytes) => {
                let n = bytes.len();
                if end - s >= n && subject[s..s + n].eq_ignore_ascii_case(bytes) {
                    s += n;
                    pc += 1;
                    true
                } else {
                    false
                }
            }
            Operation::AnyChar => {
                if s < end && subject[s] != b'\n' {
                    s += 1;
                    pc += 1;
                    true
                } else {
                    false
                }
            }
            Operation::AnyCharMl => {
                if s < end {
                    s += 1;
                    pc += 1;
                    true
                } else {
                    false
                }
            }
            Operation::CClass(bs) => {
                if s < end && bitset_at(bs, subject[s]) {
                    s += 1;
                    pc += 1;
                    true
                } else {
                    false
                }
            }
            Operation::Anchor(kind) => {
                pc += 1;
                anchor_matches(*kind, arg, s)
            }
            Operation::MemStart(mem) => {
                let mem = *mem;
                arg.stack.push(StackEntry::MemStart {
                    mem,
                    prev: arg.mem_start[mem],
                });
                arg.mem_start[mem] = Some(s);
                pc += 1;
                true
            }
            Operation::MemEnd(mem) => {
                let mem = *mem;
                arg.stack.push(StackEntry::MemEnd {
                    mem,
                    prev: arg.mem_span[mem],
                });
                arg.mem_span[mem] = arg.mem_start[mem].map(|start| (start, s));
                pc += 1;
                true
            }
            Operation::BackRef { mem, ignore_case } => match arg.mem_span[*mem] {
                Some((from, to)) => {
                    let n = to - from;
                    let captured = &subject[from..to];
                    let matched = end - s >= n
                        && if *ignore_case {
                            subject[s..s + n].eq_ignore_ascii_case(captured)
                        } else {
                            subject[s..s + n] == *captured
                        };
                    if matched {
                        s += n;
                        pc += 1;
                    }
                    matched
                }
                None => false,
            },
            Operation::Push(addr) => {
                arg.push_alt(*addr, s)?;
                pc += 1;
                true
            }
            Operation::Jump(addr) => {
                pc = *addr;
                true
            }
            Operation::EmptyCheckStart(id) => {
                let id = *id;
                arg.stack.push(StackEntry::EmptyCheck {
                    id,
                    prev: arg.empty_check[id],
                });
                arg.empty_check[id] = Some(s);
                pc += 1;
                true
            }
            Operation::EmptyCheckEnd { id, exit } => {
                pc = if arg.empty_check[*id] == Some(s) {
                    *exit
                } else {
                    pc + 1
                };
                true
            }
            Operation::Mark { on_fail } => {
                arg.stack.push(StackEntry::Mark {
                    pstr: s,
                    on_fail: *on_fail,
                });
                pc += 1;
                true
            }
            Operation::CutToMark => {
                stack_cut_to_mark(&mut arg.stack);
                pc += 1;
                true
            }
            Operation::CutToMarkRestore => {
                if let Some(saved) = stack_cut_to_mark(&mut arg.stack) {
                    s = saved;
                }
                pc += 1;
                true
            }
            Operation::CutToMarkFail => {
                stack_cut_to_mark(&mut arg.stack);
                false
            }
            Operation::StepBack(n) => {
                if s >= *n {
                    s -= *n;
                    pc += 1;
                    true
                } else {
                    false
                }
            }
        };

        if !ok {
            match stack_pop(arg) {
                Some((pcode, pstr)) => {
                    pc = pcode;
                    s = pstr;
                }
                None => return Ok(None),
            }
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// Next candidate start position at or after `from`, or `None` when no
/// further position can begin a match.
fn forward_search(reg: &CompiledPattern, subject: &[u8], from: usize) -> Option<usize> {
    let opt = &reg.optimize;
    if subject.len() - from < opt.min_len {
        return None;
    }
    let hay = &subject[from..];
    let found = match opt.first_byte {
        Some(c) if opt.first_byte_ic => memchr2(c, c.to_ascii_uppercase(), hay),
        Some(c) => memchr(c, hay),
        None => return Some(from),
    }?;
    let pos = from + found;
    (subject.len() - pos >= opt.min_len).then_some(pos)
}

/// Find the leftmost match at or after `start_offset`. On success the
/// group spans are left in `arg.mem_span`.
fn search(arg: &mut MatchArg) -> Result<bool, i32> {
    let reg = arg.reg;
    let subject = arg.subject;
    let start = arg.start_offset;

    if arg.options.contains(Options::ANCHORED) || reg.optimize.anchored_position {
        if subject.len() - start < reg.optimize.min_len {
            return Ok(false);
        }
        return Ok(match_at(arg, start)?.is_some());
    }
    if reg.optimize.anchored_buf {
        if start != 0 || subject.len() < reg.optimize.min_len {
            return Ok(false);
        }
        return Ok(match_at(arg, 0)?.is_some());
    }

    let mut s = start;
    while let Some(candidate) = forward_search(reg, subject, s) {
        arg.reset();
        if match_at(arg, candidate)?.is_some() {
            return Ok(true);
        }
        if candidate >= subject.len() {
            break;
        }
        s = candidate + 1;
    }
    Ok(false)
}

/// Write the match into `ovector` and compute the return value.
fn fill_ovector(arg: &MatchArg, ovector: &mut [i32]) -> i32 {
    let pairs = arg.mem_span.len();
    let usable = ovector.len() / 2;
    for (i, span) in arg.mem_span.iter().take(usable).enumerate() {
        let (a, b) = match span {
            Some((a, b)) => (*a as i32, *b as i32),
            None => (-1, -1),
        };
        ovector[2 * i] = a;
        ovector[2 * i + 1] = b;
    }
    if usable >= pairs {
        pairs as i32
    } else {
        0
    }
}

pub(crate) fn exec_with_limit(
    reg: &CompiledPattern,
    subject: &[u8],
    start_offset: usize,
    options: Options,
    ovector: &mut [i32],
    limit: u64,
) -> i32 {
    if !PUBLIC_EXEC_OPTIONS.contains(options) {
        return PCRS_ERROR_BADOPTION;
    }
    if subject.len() > i32::MAX as usize {
        return PCRS_ERROR_BADLENGTH;
    }
    if start_offset > subject.len() {
        return PCRS_ERROR_BADOFFSET;
    }

    let mut arg = MatchArg::new(reg, subject, start_offset, options, limit);
    match search(&mut arg) {
        Ok(true) => fill_ovector(&arg, ovector),
        Ok(false) => PCRS_ERROR_NOMATCH,
        Err(code) => {
            debug!(
                "exec aborted with code {} after {} choice points (limit {})",
                code, arg.steps, limit
            );
            code
        }
    }
}

/// Match `reg` against `subject`, starting the search at `start_offset`.
///
/// `ovector` receives `(start, end)` pairs: pair 0 is the whole match and
/// pair `i` is capture group `i`, `-1, -1` for a group that did not take
/// part. Only `ovector.len() / 2` pairs are used.
///
/// Returns `1 + capture_count` when every pair fit, `0` when a match was
/// found but `ovector` was too small to hold all pairs (the pairs that fit
/// are still written), or a negative `PCRS_ERROR_*` status.
pub fn pcrs_exec(
    reg: &CompiledPattern,
    subject: &[u8],
    start_offset: usize,
    options: Options,
    ovector: &mut [i32],
) -> i32 {
    exec_with_limit(
        reg,
        subject,
        start_offset,
        options,
        ovector,
        pcrs_get_match_limit(),
    )
}
