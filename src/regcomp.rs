// regcomp.rs - Compiler: converts Node trees into Operation arrays.
//
// Layout: operation management, node compilation (strings, quantifiers,
// groups, look-around), start-up optimization, entry point.

use log::{debug, trace};

use crate::error::CompileError;
use crate::pcre::*;
use crate::regint::*;
use crate::regparse::{parse_regexp, LookKind, Node};

type CompileResult = Result<(), i32>;

// ============================================================================
// Operation management
// ============================================================================

/// Append an operation and return its address.
fn add_op(reg: &mut CompiledPattern, op: Operation) -> Result<AbsAddrType, i32> {
    if reg.ops.len() >= MAX_COMPILED_OPS {
        return Err(PCRS_ERR_PATTERN_TOO_LARGE);
    }
    reg.ops.push(op);
    Ok(reg.ops.len() - 1)
}

/// Address of the next operation to be added.
#[inline]
fn ops_next_addr(reg: &CompiledPattern) -> AbsAddrType {
    reg.ops.len()
}

/// Point a previously emitted jump-like operation at `target`.
fn patch_addr(reg: &mut CompiledPattern, at: AbsAddrType, target: AbsAddrType) {
    match &mut reg.ops[at] {
        Operation::Push(addr) | Operation::Jump(addr) => *addr = target,
        Operation::EmptyCheckEnd { exit, .. } => *exit = target,
        Operation::Mark { on_fail } => *on_fail = Some(target),
        _ => {}
    }
}

// ============================================================================
// Node compilation
// ============================================================================

fn compile_string_node(bytes: &[u8], ignore_case: bool, reg: &mut CompiledPattern) -> CompileResult {
    if bytes.is_empty() {
        return Ok(());
    }
    let op = if ignore_case && bytes.iter().any(u8::is_ascii_alphabetic) {
        Operation::StrIc(bytes.to_ascii_lowercase().into_boxed_slice())
    } else {
        Operation::Str(bytes.into())
    };
    add_op(reg, op)?;
    Ok(())
}

fn compile_alt_node(branches: &[Node], reg: &mut CompiledPattern) -> CompileResult {
    let mut jumps = Vec::with_capacity(branches.len());
    let (last, rest) = match branches.split_last() {
        Some(split) => split,
        None => return Ok(()),
    };
    for branch in rest {
        let push = add_op(reg, Operation::Push(0))?;
        compile_tree(branch, reg)?;
        jumps.push(add_op(reg, Operation::Jump(0))?);
        let next = ops_next_addr(reg);
        patch_addr(reg, push, next);
    }
    compile_tree(last, reg)?;
    let end = ops_next_addr(reg);
    for j in jumps {
        patch_addr(reg, j, end);
    }
    Ok(())
}

/// Unbounded repetition of `body` (zero or more times).
///
/// A body that can match empty is wrapped in an empty check so a
/// zero-length iteration leaves the loop instead of spinning.
fn compile_star(body: &Node, greedy: bool, reg: &mut CompiledPattern) -> CompileResult {
    let check_empty = body.min_len() == 0;
    let top = ops_next_addr(reg);
    let push = add_op(reg, Operation::Push(0))?;
    let skip = if greedy {
        None
    } else {
        let j = add_op(reg, Operation::Jump(0))?;
        let body_addr = ops_next_addr(reg);
        patch_addr(reg, push, body_addr);
        Some(j)
    };

    let mut check_end = None;
    if check_empty {
        let id = reg.num_empty_check;
        reg.num_empty_check += 1;
        add_op(reg, Operation::EmptyCheckStart(id))?;
        compile_tree(body, reg)?;
        check_end = Some(add_op(reg, Operation::EmptyCheckEnd { id, exit: 0 })?);
    } else {
        compile_tree(body, reg)?;
    }
    add_op(reg, Operation::Jump(top))?;

    let exit = ops_next_addr(reg);
    match skip {
        Some(j) => patch_addr(reg, j, exit),
        None => patch_addr(reg, push, exit),
    }
    if let Some(at) = check_end {
        patch_addr(reg, at, exit);
    }
    Ok(())
}

/// `count` nested optional copies of `body`: `(?:b(?:b(?:b)?)?)?`.
fn compile_optional_chain(
    body: &Node,
    count: u32,
    greedy: bool,
    reg: &mut CompiledPattern,
) -> CompileResult {
    let mut exits = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if greedy {
            exits.push(add_op(reg, Operation::Push(0))?);
        } else {
            let push = add_op(reg, Operation::Push(0))?;
            exits.push(add_op(reg, Operation::Jump(0))?);
            let body_addr = ops_next_addr(reg);
            patch_addr(reg, push, body_addr);
        }
        compile_tree(body, reg)?;
    }
    let end = ops_next_addr(reg);
    for at in exits {
        patch_addr(reg, at, end);
    }
    Ok(())
}

/// Does the node compile to no operations at all?
///
/// Repeating such a body never reaches `MAX_COMPILED_OPS`, so the
/// quantifier has to drop it instead of unrolling it.
fn emits_no_ops(node: &Node) -> bool {
    match node {
        Node::Empty => true,
        Node::Str { bytes, .. } => bytes.is_empty(),
        Node::List(items) => items.iter().all(emits_no_ops),
        Node::Alt(branches) => match branches.as_slice() {
            [] => true,
            [only] => emits_no_ops(only),
            _ => false,
        },
        Node::Quant { body, .. } => emits_no_ops(body),
        _ => false,
    }
}

fn compile_quantifier_node(
    body: &Node,
    lower: u32,
    upper: Option<u32>,
    greedy: bool,
    possessive: bool,
    reg: &mut CompiledPattern,
) -> CompileResult {
    if emits_no_ops(body) {
        return Ok(());
    }
    if possessive {
        add_op(reg, Operation::Mark { on_fail: None })?;
        compile_quantifier_node(body, lower, upper, true, false, reg)?;
        add_op(reg, Operation::CutToMark)?;
        return Ok(());
    }
    for _ in 0..lower {
        compile_tree(body, reg)?;
    }
    match upper {
        None => compile_star(body, greedy, reg),
        Some(upper) => compile_optional_chain(body, upper - lower, greedy, reg),
    }
}

fn compile_look_node(kind: LookKind, body: &Node, reg: &mut CompiledPattern) -> CompileResult {
    let negative = matches!(kind, LookKind::NegAhead | LookKind::NegBehind);
    let mark = add_op(reg, Operation::Mark { on_fail: None })?;
    if matches!(kind, LookKind::Behind | LookKind::NegBehind) {
        let n = body
            .fixed_len()
            .ok_or(PCRS_ERR_LOOKBEHIND_NOT_FIXED_LENGTH)?;
        add_op(reg, Operation::StepBack(n))?;
    }
    compile_tree(body, reg)?;
    if negative {
        add_op(reg, Operation::CutToMarkFail)?;
        let after = ops_next_addr(reg);
        patch_addr(reg, mark, after);
    } else {
        add_op(reg, Operation::CutToMarkRestore)?;
    }
    Ok(())
}

pub fn compile_tree(node: &Node, reg: &mut CompiledPattern) -> CompileResult {
    match node {
        Node::Empty => {}
        Node::Str { bytes, ignore_case } => compile_string_node(bytes, *ignore_case, reg)?,
        Node::AnyChar { multiline } => {
            let op = if *multiline {
                Operation::AnyCharMl
            } else {
                Operation::AnyChar
            };
            add_op(reg, op)?;
        }
        Node::CClass(bs) => {
            add_op(reg, Operation::CClass(bs.clone()))?;
        }
        Node::Anchor(kind) => {
            add_op(reg, Operation::Anchor(*kind))?;
        }
        Node::BackRef {
            mem, ignore_case, ..
        } => {
            add_op(
                reg,
                Operation::BackRef {
                    mem: *mem,
                    ignore_case: *ignore_case,
                },
            )?;
        }
        Node::Capture { mem, body } => {
            add_op(reg, Operation::MemStart(*mem))?;
            compile_tree(body, reg)?;
            add_op(reg, Operation::MemEnd(*mem))?;
        }
        Node::Look { kind, body } => compile_look_node(*kind, body, reg)?,
        Node::Atomic(body) => {
            add_op(reg, Operation::Mark { on_fail: None })?;
            compile_tree(body, reg)?;
            add_op(reg, Operation::CutToMark)?;
        }
        Node::Quant {
            body,
            lower,
            upper,
            greedy,
            possessive,
        } => compile_quantifier_node(body, *lower, *upper, *greedy, *possessive, reg)?,
        Node::List(items) => {
            for item in items {
                compile_tree(item, reg)?;
            }
        }
        Node::Alt(branches) => compile_alt_node(branches, reg)?,
    }
    Ok(())
}

// ============================================================================
// Start-up optimization
// ============================================================================

/// Does the node never consume input?
fn is_zero_width(node: &Node) -> bool {
    matches!(node, Node::Empty | Node::Anchor(_) | Node::Look { .. })
}

/// The byte every match of `node` starts with, and whether it compares
/// caselessly.
fn first_byte(node: &Node) -> Option<(u8, bool)> {
    match node {
        Node::Str { bytes, ignore_case } => {
            let c = *bytes.first()?;
            if *ignore_case && c.is_ascii_alphabetic() {
                Some((c.to_ascii_lowercase(), true))
            } else {
                Some((c, false))
            }
        }
        Node::Capture { body, .. } | Node::Atomic(body) => first_byte(body),
        Node::Quant { body, lower, .. } if *lower > 0 => first_byte(body),
        Node::List(items) => items
            .iter()
            .find(|n| !is_zero_width(n))
            .and_then(first_byte),
        Node::Alt(branches) => {
            let first = first_byte(branches.first()?)?;
            branches[1..]
                .iter()
                .all(|b| first_byte(b) == Some(first))
                .then_some(first)
        }
        _ => None,
    }
}

/// Anchor that every match must begin with, if any.
fn leading_anchor(node: &Node) -> Option<AnchorKind> {
    match node {
        Node::Anchor(kind) => Some(*kind),
        Node::Capture { body, .. } | Node::Atomic(body) => leading_anchor(body),
        Node::List(items) => leading_anchor(items.first()?),
        Node::Alt(branches) => {
            let first = leading_anchor(branches.first()?)?;
            branches[1..]
                .iter()
                .all(|b| leading_anchor(b) == Some(first))
                .then_some(first)
        }
        _ => None,
    }
}

fn set_optimize_info(node: &Node, reg: &mut CompiledPattern) {
    let mut info = OptimizeInfo {
        min_len: node.min_len(),
        ..OptimizeInfo::default()
    };
    match leading_anchor(node) {
        Some(AnchorKind::BeginBuf) | Some(AnchorKind::BeginLine) => info.anchored_buf = true,
        Some(AnchorKind::BeginPosition) => info.anchored_position = true,
        _ => {}
    }
    if let Some((c, ic)) = first_byte(node) {
        info.first_byte = Some(c);
        info.first_byte_ic = ic;
    }
    reg.optimize = info;
}

// ============================================================================
// Entry point
// ============================================================================

fn compile_from_tree(
    node: &Node,
    reg: &mut CompiledPattern,
) -> CompileResult {
    compile_tree(node, reg)?;
    add_op(reg, Operation::End)?;
    set_optimize_info(node, reg);
    Ok(())
}

/// Compile a pattern.
///
/// Only bits in [`PUBLIC_COMPILE_OPTIONS`] are accepted; anything else is
/// reported as [`PCRS_ERR_UNKNOWN_OPTION_BITS`] at offset 0. On failure the
/// error carries the diagnostic code and the pattern offset where the
/// problem was found.
pub fn pcrs_compile(pattern: &[u8], options: Options) -> Result<CompiledPattern, CompileError> {
    let result = compile_pattern(pattern, options);
    match &result {
        Ok(reg) => trace!(
            "compiled pattern ({} bytes) into {} ops, {} groups",
            pattern.len(),
            reg.ops.len(),
            reg.num_mem
        ),
        Err(e) => debug!(
            "compile failed: {} (code {}) for pattern {:?}",
            e,
            e.code(),
            String::from_utf8_lossy(pattern)
        ),
    }
    result
}

fn compile_pattern(pattern: &[u8], options: Options) -> Result<CompiledPattern, CompileError> {
    if !PUBLIC_COMPILE_OPTIONS.contains(options) {
        return Err(CompileError::new(PCRS_ERR_UNKNOWN_OPTION_BITS, 0));
    }
    let (root, env) = parse_regexp(pattern, options)?;

    let mut reg = CompiledPattern::new(options);
    reg.num_mem = env.num_mem;
    reg.backref_max = env.backref_max;
    reg.names = env.names;
    compile_from_tree(&root, &mut reg).map_err(|code| CompileError::new(code, pattern.len()))?;
    Ok(reg)
}
