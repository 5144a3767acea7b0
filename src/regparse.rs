// regparse.rs - Pattern parser.
//
// Turns pattern bytes into a Node tree. Capture groups are numbered in
// order of their opening parenthesis; inline options are tracked in the
// parse environment and restored at the end of each group.

use crate::error::CompileError;
use crate::pcre::*;
use crate::regint::*;

// === Node Types ===

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookKind {
    Ahead,
    NegAhead,
    Behind,
    NegBehind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Empty,
    Str {
        bytes: Vec<u8>,
        ignore_case: bool,
    },
    AnyChar {
        multiline: bool,
    },
    CClass(Box<BitSet>),
    Anchor(AnchorKind),
    BackRef {
        mem: usize,
        name: Option<String>,
        ignore_case: bool,
        offset: usize,
    },
    Capture {
        mem: usize,
        body: Box<Node>,
    },
    Look {
        kind: LookKind,
        body: Box<Node>,
    },
    Atomic(Box<Node>),
    Quant {
        body: Box<Node>,
        lower: u32,
        upper: Option<u32>,
        greedy: bool,
        possessive: bool,
    },
    List(Vec<Node>),
    Alt(Vec<Node>),
}

impl Node {
    fn literal(c: u8, ignore_case: bool) -> Node {
        Node::Str {
            bytes: vec![c],
            ignore_case,
        }
    }

    /// Minimum number of subject bytes any match of this node consumes.
    pub fn min_len(&self) -> usize {
        match self {
            Node::Str { bytes, .. } => bytes.len(),
            Node::AnyChar { .. } | Node::CClass(_) => 1,
            Node::Empty | Node::Anchor(_) | Node::BackRef { .. } | Node::Look { .. } => 0,
            Node::Capture { body, .. } | Node::Atomic(body) => body.min_len(),
            Node::Quant { body, lower, .. } => body.min_len().saturating_mul(*lower as usize),
            Node::List(items) => items.iter().fold(0usize, |acc, n| acc.saturating_add(n.min_len())),
            Node::Alt(branches) => branches.iter().map(Node::min_len).min().unwrap_or(0),
        }
    }

    /// Exact length in bytes when every match has the same length.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            Node::Str { bytes, .. } => Some(bytes.len()),
            Node::AnyChar { .. } | Node::CClass(_) => Some(1),
            Node::Empty | Node::Anchor(_) | Node::Look { .. } => Some(0),
            Node::BackRef { .. } => None,
            Node::Capture { body, .. } | Node::Atomic(body) => body.fixed_len(),
            Node::Quant {
                body, lower, upper, ..
            } => match upper {
                Some(u) if u == lower => body.fixed_len()?.checked_mul(*lower as usize),
                _ => None,
            },
            Node::List(items) => items
                .iter()
                .try_fold(0usize, |acc, n| acc.checked_add(n.fixed_len()?)),
            Node::Alt(branches) => {
                let first = branches.first()?.fixed_len()?;
                branches[1..]
                    .iter()
                    .all(|b| b.fixed_len() == Some(first))
                    .then_some(first)
            }
        }
    }
}

// === Parse Environment ===

#[derive(Debug)]
pub struct ParseEnv {
    /// Options in effect at the current parse position.
    pub options: Options,
    pub num_mem: usize,
    pub names: Vec<(String, usize)>,
    pub backref_max: usize,
    depth: u32,
}

impl ParseEnv {
    fn new(options: Options) -> Self {
        ParseEnv {
            options,
            num_mem: 0,
            names: Vec::new(),
            backref_max: 0,
            depth: 0,
        }
    }

    #[inline]
    fn ignore_case(&self) -> bool {
        self.options.contains(Options::CASELESS)
    }
}

/// What follows an opening parenthesis.
enum GroupKind {
    Capture(Option<String>),
    NonCapture(Option<Options>),
    Atomic,
    Look(LookKind),
    Comment,
    SetOptions(Options),
    NamedBackRef(String, usize),
}

enum ClassAtom {
    Byte(u8),
    Set(BitSet),
}

type ParseResult<T> = Result<T, CompileError>;

fn err<T>(code: i32, offset: usize) -> ParseResult<T> {
    Err(CompileError::new(code, offset))
}

// === Parser ===

struct Parser<'p> {
    pat: &'p [u8],
    pos: usize,
    env: ParseEnv,
}

/// Parse a pattern into a Node tree.
///
/// Back-references (numbered and named) are resolved and validated against
/// the complete group table before returning.
pub fn parse_regexp(pattern: &[u8], options: Options) -> ParseResult<(Node, ParseEnv)> {
    let mut parser = Parser {
        pat: pattern,
        pos: 0,
        env: ParseEnv::new(options),
    };
    let mut node = parser.parse_alts()?;
    if parser.pos < parser.pat.len() {
        // parse_alts() only stops early at a ')'
        return err(PCRS_ERR_UNMATCHED_PARENTHESES, parser.pos);
    }
    let mut env = parser.env;
    resolve_backrefs(&mut node, &mut env)?;
    Ok((node, env))
}

impl<'p> Parser<'p> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.pat.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, n: usize) -> Option<u8> {
        self.pat.get(self.pos + n).copied()
    }

    #[inline]
    fn next_byte(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Skip whitespace and `#` comments in extended mode.
    fn skip_extended(&mut self) {
        if !self.env.options.contains(Options::EXTENDED) {
            return;
        }
        while let Some(c) = self.peek() {
            if is_space_byte(c) {
                self.pos += 1;
            } else if c == b'#' {
                while let Some(c) = self.next_byte() {
                    if c == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Skip anything that may sit between an atom and its quantifier:
    /// extended-mode whitespace and complete `(?#...)` comments.
    fn skip_before_quantifier(&mut self) {
        loop {
            self.skip_extended();
            if !self.pat[self.pos..].starts_with(b"(?#") {
                return;
            }
            match self.pat[self.pos + 3..].iter().position(|&c| c == b')') {
                Some(close) => self.pos += 3 + close + 1,
                None => return,
            }
        }
    }

    // --- alternation and sequence ---

    fn parse_alts(&mut self) -> ParseResult<Node> {
        let mut branches = vec![self.parse_branch()?];
        while self.peek() == Some(b'|') {
            self.pos += 1;
            branches.push(self.parse_branch()?);
        }
        if branches.len() == 1 {
            Ok(branches.swap_remove(0))
        } else {
            Ok(Node::Alt(branches))
        }
    }

    fn parse_branch(&mut self) -> ParseResult<Node> {
        let mut items: Vec<Node> = Vec::new();
        loop {
            self.skip_extended();
            let Some(c) = self.peek() else { break };
            if c == b'|' || c == b')' {
                break;
            }
            if c == b'\\' && self.peek_at(1) == Some(b'Q') {
                self.pos += 2;
                let quoted = self.take_quoted();
                let ic = self.env.ignore_case();
                let n = quoted.len();
                for (i, b) in quoted.into_iter().enumerate() {
                    let atom = Node::literal(b, ic);
                    if i + 1 < n {
                        items.push(atom);
                    } else {
                        items.push(self.parse_quantifier(atom)?);
                    }
                }
                continue;
            }
            if c == b'\\' && self.peek_at(1) == Some(b'E') {
                self.pos += 2;
                continue;
            }
            if self.at_quantifier()? {
                return err(PCRS_ERR_NOTHING_TO_REPEAT, self.pos);
            }
            if let Some(atom) = self.parse_atom()? {
                items.push(self.parse_quantifier(atom)?);
            }
        }
        Ok(build_list(items))
    }

    /// Bytes up to `\E` (or the end of the pattern), taken literally.
    fn take_quoted(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(c) = self.next_byte() {
            if c == b'\\' && self.peek() == Some(b'E') {
                self.pos += 1;
                break;
            }
            out.push(c);
        }
        out
    }

    // --- quantifiers ---

    fn at_quantifier(&self) -> ParseResult<bool> {
        match self.peek() {
            Some(b'*') | Some(b'+') | Some(b'?') => Ok(true),
            Some(b'{') => Ok(self.scan_interval()?.is_some()),
            _ => Ok(false),
        }
    }

    /// Recognize `{n}`, `{n,}` or `{n,m}` at the current position.
    /// Anything else starting with `{` is a literal brace.
    fn scan_interval(&self) -> ParseResult<Option<(u32, Option<u32>, usize)>> {
        let mut p = self.pos + 1;
        let read_num = |p: &mut usize| -> ParseResult<Option<u32>> {
            let start = *p;
            let mut n: u32 = 0;
            while let Some(d) = self.pat.get(*p).filter(|d| d.is_ascii_digit()) {
                n = n.saturating_mul(10).saturating_add((d - b'0') as u32);
                *p += 1;
            }
            if *p == start {
                return Ok(None);
            }
            if n > PCRS_MAX_REPEAT_NUM {
                return err(PCRS_ERR_QUANTIFIER_TOO_BIG, *p);
            }
            Ok(Some(n))
        };

        let Some(lower) = read_num(&mut p)? else {
            return Ok(None);
        };
        let upper = match self.pat.get(p) {
            Some(b'}') => Some(lower),
            Some(b',') => {
                p += 1;
                let upper = read_num(&mut p)?;
                if self.pat.get(p) != Some(&b'}') {
                    return Ok(None);
                }
                upper
            }
            _ => return Ok(None),
        };
        if let Some(u) = upper {
            if u < lower {
                return err(PCRS_ERR_QUANTIFIER_OUT_OF_ORDER, p);
            }
        }
        Ok(Some((lower, upper, p + 1)))
    }

    fn parse_quantifier(&mut self, atom: Node) -> ParseResult<Node> {
        self.skip_before_quantifier();
        let qpos = self.pos;
        let (lower, upper) = match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                (0, None)
            }
            Some(b'+') => {
                self.pos += 1;
                (1, None)
            }
            Some(b'?') => {
                self.pos += 1;
                (0, Some(1))
            }
            Some(b'{') => match self.scan_interval()? {
                Some((lower, upper, end)) => {
                    self.pos = end;
                    (lower, upper)
                }
                None => return Ok(atom),
            },
            _ => return Ok(atom),
        };
        if matches!(atom, Node::Anchor(_)) {
            return err(PCRS_ERR_NOTHING_TO_REPEAT, qpos);
        }

        let mut greedy = !self.env.options.contains(Options::UNGREEDY);
        let mut possessive = false;
        match self.peek() {
            Some(b'?') => {
                self.pos += 1;
                greedy = !greedy;
            }
            Some(b'+') => {
                self.pos += 1;
                possessive = true;
                greedy = true;
            }
            _ => {}
        }

        self.skip_extended();
        if self.at_quantifier()? {
            return err(PCRS_ERR_NOTHING_TO_REPEAT, self.pos);
        }

        Ok(Node::Quant {
            body: Box::new(atom),
            lower,
            upper,
            greedy,
            possessive,
        })
    }

    // --- atoms ---

    fn parse_atom(&mut self) -> ParseResult<Option<Node>> {
        let Some(c) = self.next_byte() else {
            return Ok(None);
        };
        let options = self.env.options;
        let node = match c {
            b'.' => Node::AnyChar {
                multiline: options.contains(Options::DOTALL),
            },
            b'^' => Node::Anchor(if options.contains(Options::MULTILINE) {
                AnchorKind::BeginLineMl
            } else {
                AnchorKind::BeginLine
            }),
            b'$' => Node::Anchor(if options.contains(Options::MULTILINE) {
                AnchorKind::EndLineMl
            } else if options.contains(Options::DOLLAR_ENDONLY) {
                AnchorKind::EndLineEndOnly
            } else {
                AnchorKind::EndLine
            }),
            b'[' => self.parse_cclass()?,
            b'(' => return self.parse_group(),
            b'\\' => self.parse_escape()?,
            _ => Node::literal(c, self.env.ignore_case()),
        };
        Ok(Some(node))
    }

    // --- escapes ---

    /// Parse an escape outside a character class; the backslash has been
    /// consumed.
    fn parse_escape(&mut self) -> ParseResult<Node> {
        let Some(c) = self.next_byte() else {
            return err(PCRS_ERR_BACKSLASH_AT_END, self.pat.len());
        };
        let ic = self.env.ignore_case();
        let node = match c {
            b'd' | b'D' | b'w' | b'W' | b's' | b'S' | b'h' | b'H' | b'v' | b'V' => {
                Node::CClass(Box::new(escape_class(c)))
            }
            b'A' => Node::Anchor(AnchorKind::BeginBuf),
            b'z' => Node::Anchor(AnchorKind::EndBuf),
            b'Z' => Node::Anchor(AnchorKind::SemiEndBuf),
            b'G' => Node::Anchor(AnchorKind::BeginPosition),
            b'b' => Node::Anchor(AnchorKind::WordBoundary),
            b'B' => Node::Anchor(AnchorKind::NotWordBoundary),
            b'N' => Node::AnyChar { multiline: false },
            b'C' => Node::AnyChar { multiline: true },
            b'R' => newline_sequence(),
            b'p' | b'P' | b'X' => return err(PCRS_ERR_UNSUPPORTED_PROPERTY, self.pos),
            b'K' => return err(PCRS_ERR_UNRECOGNIZED_ESCAPE, self.pos),
            b'1'..=b'9' => return self.parse_numbered_backref(c),
            b'g' => return self.parse_g_backref(),
            b'k' => {
                let offset = self.pos;
                let term = match self.next_byte() {
                    Some(b'<') => b'>',
                    Some(b'\'') => b'\'',
                    Some(b'{') => b'}',
                    _ => return err(PCRS_ERR_BAD_K_ESCAPE, self.pos),
                };
                let name = self.read_name(term)?;
                Node::BackRef {
                    mem: 0,
                    name: Some(name),
                    ignore_case: ic,
                    offset,
                }
            }
            _ => Node::literal(self.escape_char(c)?, ic),
        };
        Ok(node)
    }

    /// `\1`..`\9` are always back-references; longer numbers are
    /// back-references only if that many groups have been opened so far,
    /// otherwise they are octal escapes.
    fn parse_numbered_backref(&mut self, first: u8) -> ParseResult<Node> {
        let start = self.pos - 1;
        let mut n: usize = (first - b'0') as usize;
        while let Some(d) = self.peek().filter(u8::is_ascii_digit) {
            n = n.saturating_mul(10).saturating_add((d - b'0') as usize);
            self.pos += 1;
        }
        let ic = self.env.ignore_case();
        if n < 10 || n <= self.env.num_mem {
            return Ok(Node::BackRef {
                mem: n,
                name: None,
                ignore_case: ic,
                offset: self.pos,
            });
        }
        self.pos = start + 1;
        if first >= b'8' {
            return Ok(Node::literal(first, ic));
        }
        let value = self.read_octal(first)?;
        Ok(Node::literal(value, ic))
    }

    /// `\g{n}`, `\g{-n}`, `\gn`, `\g-n`, `\g{name}`.
    fn parse_g_backref(&mut self) -> ParseResult<Node> {
        let ic = self.env.ignore_case();
        let braced = self.peek() == Some(b'{');
        if braced {
            self.pos += 1;
        }
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }
        let digits_start = self.pos;
        let mut n: usize = 0;
        while let Some(d) = self.peek().filter(u8::is_ascii_digit) {
            n = n.saturating_mul(10).saturating_add((d - b'0') as usize);
            self.pos += 1;
        }
        let has_digits = self.pos > digits_start;

        if !has_digits {
            if braced && !negative {
                let offset = self.pos;
                let name = self.read_name(b'}')?;
                return Ok(Node::BackRef {
                    mem: 0,
                    name: Some(name),
                    ignore_case: ic,
                    offset,
                });
            }
            return err(PCRS_ERR_BAD_G_ESCAPE, self.pos);
        }
        if braced {
            if self.peek() != Some(b'}') {
                return err(PCRS_ERR_BAD_G_ESCAPE, self.pos);
            }
            self.pos += 1;
        }
        if n == 0 {
            return err(PCRS_ERR_NONEXISTENT_SUBPATTERN, self.pos);
        }
        let mem = if negative {
            if n > self.env.num_mem {
                return err(PCRS_ERR_NONEXISTENT_SUBPATTERN, self.pos);
            }
            self.env.num_mem + 1 - n
        } else {
            n
        };
        Ok(Node::BackRef {
            mem,
            name: None,
            ignore_case: ic,
            offset: self.pos,
        })
    }

    /// Up to three octal digits, the first of which is already consumed.
    fn read_octal(&mut self, first: u8) -> ParseResult<u8> {
        let mut value: u32 = (first - b'0') as u32;
        for _ in 0..2 {
            match self.peek() {
                Some(d @ b'0'..=b'7') => {
                    value = value * 8 + (d - b'0') as u32;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        u8::try_from(value).or_else(|_| err(PCRS_ERR_CHAR_VALUE_TOO_LARGE, self.pos))
    }

    /// Escapes that stand for a single byte. Unknown letters and all
    /// non-alphanumeric bytes stand for themselves.
    fn escape_char(&mut self, c: u8) -> ParseResult<u8> {
        let value = match c {
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'f' => 0x0c,
            b'e' => 0x1b,
            b'a' => 0x07,
            b'0'..=b'7' => return self.read_octal(c),
            b'x' => return self.read_hex(),
            b'c' => {
                let Some(x) = self.next_byte() else {
                    return err(PCRS_ERR_BACKSLASH_C_AT_END, self.pat.len());
                };
                if !x.is_ascii() {
                    return err(PCRS_ERR_BACKSLASH_C_NOT_ASCII, self.pos);
                }
                x.to_ascii_uppercase() ^ 0x40
            }
            _ => c,
        };
        Ok(value)
    }

    /// `\xhh` (zero to two digits) or `\x{h...}`.
    fn read_hex(&mut self) -> ParseResult<u8> {
        if self.peek() == Some(b'{') {
            let mut p = self.pos + 1;
            let mut value: u32 = 0;
            while let Some(d) = self.pat.get(p).and_then(|d| (*d as char).to_digit(16)) {
                value = value.saturating_mul(16).saturating_add(d);
                p += 1;
            }
            if p > self.pos + 1 && self.pat.get(p) == Some(&b'}') {
                self.pos = p + 1;
                return u8::try_from(value).or_else(|_| err(PCRS_ERR_CHAR_VALUE_TOO_LARGE, self.pos));
            }
            // not a valid braced form: "\x" is NUL and "{" is literal
            return Ok(0);
        }
        let mut value: u8 = 0;
        for _ in 0..2 {
            match self.peek().and_then(|d| (d as char).to_digit(16)) {
                Some(d) => {
                    value = value * 16 + d as u8;
                    self.pos += 1;
                }
                None => break,
            }
        }
        Ok(value)
    }

    // --- character classes ---

    fn parse_cclass(&mut self) -> ParseResult<Node> {
        if self.peek() == Some(b':') && self.posix_class_follows(self.pos - 1) {
            return err(PCRS_ERR_POSIX_OUTSIDE_CLASS, self.pos);
        }
        let mut bs = EMPTY_BITSET;
        let negate = self.peek() == Some(b'^');
        if negate {
            self.pos += 1;
        }
        let mut first = true;
        loop {
            let Some(c) = self.peek() else {
                return err(PCRS_ERR_MISSING_CLASS_TERMINATOR, self.pat.len());
            };
            if c == b']' && !first {
                self.pos += 1;
                break;
            }
            first = false;

            if c == b'[' && self.posix_class_follows(self.pos) {
                let set = self.parse_posix_class()?;
                bitset_or(&mut bs, &set);
                continue;
            }

            let lo = match self.class_atom()? {
                ClassAtom::Set(set) => {
                    bitset_or(&mut bs, &set);
                    continue;
                }
                ClassAtom::Byte(b) => b,
            };

            let is_range = self.peek() == Some(b'-')
                && self.peek_at(1).is_some_and(|n| n != b']')
                && !(self.peek_at(1) == Some(b'[') && self.posix_class_follows(self.pos + 1));
            if !is_range {
                bitset_set(&mut bs, lo);
                continue;
            }
            self.pos += 1;
            match self.class_atom()? {
                ClassAtom::Byte(hi) => {
                    if hi < lo {
                        return err(PCRS_ERR_CLASS_RANGE_OUT_OF_ORDER, self.pos);
                    }
                    bitset_set_range(&mut bs, lo, hi);
                }
                ClassAtom::Set(set) => {
                    // "[a-\d]": the hyphen is literal
                    bitset_set(&mut bs, lo);
                    bitset_set(&mut bs, b'-');
                    bitset_or(&mut bs, &set);
                }
            }
        }

        if self.env.ignore_case() {
            bitset_fold_ascii_case(&mut bs);
        }
        if negate {
            bitset_invert(&mut bs);
        }
        Ok(Node::CClass(Box::new(bs)))
    }

    fn class_atom(&mut self) -> ParseResult<ClassAtom> {
        let Some(c) = self.next_byte() else {
            return err(PCRS_ERR_MISSING_CLASS_TERMINATOR, self.pat.len());
        };
        if c != b'\\' {
            return Ok(ClassAtom::Byte(c));
        }
        let Some(e) = self.next_byte() else {
            return err(PCRS_ERR_BACKSLASH_AT_END, self.pat.len());
        };
        match e {
            b'd' | b'D' | b'w' | b'W' | b's' | b'S' | b'h' | b'H' | b'v' | b'V' => {
                Ok(ClassAtom::Set(escape_class(e)))
            }
            b'b' => Ok(ClassAtom::Byte(0x08)),
            b'p' | b'P' | b'X' => err(PCRS_ERR_UNSUPPORTED_PROPERTY, self.pos),
            b'8' | b'9' => Ok(ClassAtom::Byte(e)),
            _ => Ok(ClassAtom::Byte(self.escape_char(e)?)),
        }
    }

    /// `[:name:]` or `[:^name:]` starting at `at` (which holds the `[`).
    fn posix_class_follows(&self, at: usize) -> bool {
        if self.pat.get(at + 1) != Some(&b':') {
            return false;
        }
        let mut p = at + 2;
        if self.pat.get(p) == Some(&b'^') {
            p += 1;
        }
        let name_start = p;
        while self.pat.get(p).is_some_and(u8::is_ascii_alphabetic) {
            p += 1;
        }
        p > name_start && self.pat.get(p) == Some(&b':') && self.pat.get(p + 1) == Some(&b']')
    }

    fn parse_posix_class(&mut self) -> ParseResult<BitSet> {
        self.pos += 2; // "[:"
        let negate = self.peek() == Some(b'^');
        if negate {
            self.pos += 1;
        }
        let name_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let name = &self.pat[name_start..self.pos];
        let Some(mut set) = posix_class(name) else {
            return err(PCRS_ERR_UNKNOWN_POSIX_CLASS, name_start);
        };
        self.pos += 2; // ":]"
        if negate {
            bitset_invert(&mut set);
        }
        Ok(set)
    }

    // --- groups ---

    fn parse_group(&mut self) -> ParseResult<Option<Node>> {
        let open = self.pos - 1;
        if self.env.depth >= DEFAULT_PARSE_DEPTH_LIMIT {
            return err(PCRS_ERR_PARENTHESES_TOO_DEEP, open);
        }

        let kind = if self.peek() == Some(b'?') {
            self.pos += 1;
            self.parse_group_kind()?
        } else if self.env.options.contains(Options::NO_AUTO_CAPTURE) {
            GroupKind::NonCapture(None)
        } else {
            GroupKind::Capture(None)
        };

        let (mem, scoped) = match &kind {
            GroupKind::Comment => return Ok(None),
            GroupKind::SetOptions(options) => {
                self.env.options = *options;
                return Ok(None);
            }
            GroupKind::NamedBackRef(name, offset) => {
                return Ok(Some(Node::BackRef {
                    mem: 0,
                    name: Some(name.clone()),
                    ignore_case: self.env.ignore_case(),
                    offset: *offset,
                }));
            }
            GroupKind::Capture(name) => {
                self.env.num_mem += 1;
                let mem = self.env.num_mem;
                if let Some(name) = name {
                    if self.env.names.iter().any(|(n, _)| n == name) {
                        return err(PCRS_ERR_DUPLICATE_NAME, self.pos);
                    }
                    self.env.names.push((name.clone(), mem));
                }
                (mem, None)
            }
            GroupKind::NonCapture(scoped) => (0, *scoped),
            GroupKind::Atomic | GroupKind::Look(_) => (0, None),
        };

        let saved = self.env.options;
        if let Some(options) = scoped {
            self.env.options = options;
        }
        self.env.depth += 1;
        let body = self.parse_alts()?;
        self.env.depth -= 1;
        self.env.options = saved;

        if self.peek() != Some(b')') {
            return err(PCRS_ERR_MISSING_PARENTHESIS, self.pat.len());
        }
        self.pos += 1;

        let node = match kind {
            GroupKind::Capture(_) => Node::Capture {
                mem,
                body: Box::new(body),
            },
            GroupKind::Atomic => Node::Atomic(Box::new(body)),
            GroupKind::Look(kind @ (LookKind::Behind | LookKind::NegBehind)) => {
                make_lookbehind(kind, body, self.pos)?
            }
            GroupKind::Look(kind) => Node::Look {
                kind,
                body: Box::new(body),
            },
            _ => body,
        };
        Ok(Some(node))
    }

    /// Classify the construct after `(?`.
    fn parse_group_kind(&mut self) -> ParseResult<GroupKind> {
        let Some(c) = self.next_byte() else {
            return err(PCRS_ERR_UNRECOGNIZED_AFTER_QUERY, self.pat.len());
        };
        let kind = match c {
            b':' => GroupKind::NonCapture(None),
            b'>' => GroupKind::Atomic,
            b'=' => GroupKind::Look(LookKind::Ahead),
            b'!' => GroupKind::Look(LookKind::NegAhead),
            b'#' => {
                loop {
                    match self.next_byte() {
                        Some(b')') => break,
                        Some(_) => {}
                        None => {
                            return err(PCRS_ERR_MISSING_COMMENT_PARENTHESIS, self.pat.len())
                        }
                    }
                }
                GroupKind::Comment
            }
            b'<' => match self.peek() {
                Some(b'=') => {
                    self.pos += 1;
                    GroupKind::Look(LookKind::Behind)
                }
                Some(b'!') => {
                    self.pos += 1;
                    GroupKind::Look(LookKind::NegBehind)
                }
                Some(c) if is_word_byte(c) => GroupKind::Capture(Some(self.read_name(b'>')?)),
                _ => return err(PCRS_ERR_UNRECOGNIZED_AFTER_QUERY_LT, self.pos),
            },
            b'\'' => GroupKind::Capture(Some(self.read_name(b'\'')?)),
            b'P' => match self.next_byte() {
                Some(b'<') => GroupKind::Capture(Some(self.read_name(b'>')?)),
                Some(b'=') => {
                    let offset = self.pos;
                    let name = self.read_name(b')')?;
                    // read_name consumed the closing parenthesis
                    return Ok(GroupKind::NamedBackRef(name, offset));
                }
                _ => return err(PCRS_ERR_UNRECOGNIZED_AFTER_QUERY, self.pos),
            },
            b'i' | b'm' | b's' | b'x' | b'U' | b'-' => {
                self.pos -= 1;
                return self.parse_option_letters();
            }
            _ => return err(PCRS_ERR_UNRECOGNIZED_AFTER_QUERY, self.pos),
        };
        Ok(kind)
    }

    /// `(?imsxU-imsxU)` or `(?imsxU-imsxU:`.
    fn parse_option_letters(&mut self) -> ParseResult<GroupKind> {
        let mut options = self.env.options;
        let mut unset = false;
        loop {
            let Some(c) = self.next_byte() else {
                return err(PCRS_ERR_UNRECOGNIZED_AFTER_QUERY, self.pat.len());
            };
            let flag = match c {
                b'i' => Options::CASELESS,
                b'm' => Options::MULTILINE,
                b's' => Options::DOTALL,
                b'x' => Options::EXTENDED,
                b'U' => Options::UNGREEDY,
                b'-' if !unset => {
                    unset = true;
                    continue;
                }
                b')' => return Ok(GroupKind::SetOptions(options)),
                b':' => return Ok(GroupKind::NonCapture(Some(options))),
                _ => return err(PCRS_ERR_UNRECOGNIZED_AFTER_QUERY, self.pos),
            };
            options.set(flag, !unset);
        }
    }

    /// Group name terminated by `term`; the terminator is consumed.
    fn read_name(&mut self, term: u8) -> ParseResult<String> {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => return err(PCRS_ERR_NAME_STARTS_WITH_DIGIT, self.pos),
            Some(c) if is_word_byte(c) => {}
            _ => return err(PCRS_ERR_NAME_EXPECTED, self.pos),
        }
        let start = self.pos;
        while self.peek().is_some_and(is_word_byte) {
            self.pos += 1;
        }
        if self.pos - start > PCRS_MAX_NAME_LEN {
            return err(PCRS_ERR_NAME_TOO_LONG, self.pos);
        }
        if self.peek() != Some(term) {
            return err(PCRS_ERR_NAME_MISSING_TERMINATOR, self.pos);
        }
        // word bytes are ASCII
        let name = String::from_utf8_lossy(&self.pat[start..self.pos]).into_owned();
        self.pos += 1;
        Ok(name)
    }
}

// === Helpers ===

/// Build a sequence node, merging adjacent literals.
fn build_list(items: Vec<Node>) -> Node {
    let mut out: Vec<Node> = Vec::with_capacity(items.len());
    for item in items {
        if let (
            Some(Node::Str {
                bytes,
                ignore_case: prev_ic,
            }),
            Node::Str {
                bytes: next,
                ignore_case,
            },
        ) = (out.last_mut(), &item)
        {
            if *prev_ic == *ignore_case {
                bytes.extend_from_slice(next);
                continue;
            }
        }
        out.push(item);
    }
    match out.len() {
        0 => Node::Empty,
        1 => out.swap_remove(0),
        _ => Node::List(out),
    }
}

/// Look-behind bodies must have a fixed length. A top-level alternation of
/// fixed-length branches with different lengths is split into one
/// look-behind per branch.
fn make_lookbehind(kind: LookKind, body: Node, offset: usize) -> ParseResult<Node> {
    if body.fixed_len().is_some() {
        return Ok(Node::Look {
            kind,
            body: Box::new(body),
        });
    }
    let Node::Alt(branches) = body else {
        return err(PCRS_ERR_LOOKBEHIND_NOT_FIXED_LENGTH, offset);
    };
    if branches.iter().any(|b| b.fixed_len().is_none()) {
        return err(PCRS_ERR_LOOKBEHIND_NOT_FIXED_LENGTH, offset);
    }
    let looks: Vec<Node> = branches
        .into_iter()
        .map(|b| Node::Look {
            kind,
            body: Box::new(b),
        })
        .collect();
    Ok(match kind {
        LookKind::Behind => Node::Alt(looks),
        _ => Node::List(looks),
    })
}

/// `\R`: `\r\n` or any single vertical-space byte, atomically.
fn newline_sequence() -> Node {
    Node::Atomic(Box::new(Node::Alt(vec![
        Node::Str {
            bytes: b"\r\n".to_vec(),
            ignore_case: false,
        },
        Node::CClass(Box::new(escape_class(b'v'))),
    ])))
}

/// Sets for `\d \w \s \h \v` and their negations.
fn escape_class(c: u8) -> BitSet {
    let mut bs = EMPTY_BITSET;
    let pred: fn(u8) -> bool = match c.to_ascii_lowercase() {
        b'd' => |b: u8| b.is_ascii_digit(),
        b'w' => is_word_byte,
        b's' => is_space_byte,
        b'h' => is_hspace_byte,
        _ => |b: u8| matches!(b, b'\n' | 0x0b | 0x0c | b'\r' | 0x85),
    };
    for b in 0..=255u8 {
        if pred(b) {
            bitset_set(&mut bs, b);
        }
    }
    if c.is_ascii_uppercase() {
        bitset_invert(&mut bs);
    }
    bs
}

fn posix_class(name: &[u8]) -> Option<BitSet> {
    let pred: fn(u8) -> bool = match name {
        b"alnum" => |b: u8| b.is_ascii_alphanumeric(),
        b"alpha" => |b: u8| b.is_ascii_alphabetic(),
        b"ascii" => |b: u8| b.is_ascii(),
        b"blank" => |b: u8| b == b' ' || b == b'\t',
        b"cntrl" => |b: u8| b.is_ascii_control(),
        b"digit" => |b: u8| b.is_ascii_digit(),
        b"graph" => |b: u8| b.is_ascii_graphic(),
        b"lower" => |b: u8| b.is_ascii_lowercase(),
        b"print" => |b: u8| b.is_ascii_graphic() || b == b' ',
        b"punct" => |b: u8| b.is_ascii_punctuation(),
        b"space" => is_space_byte,
        b"upper" => |b: u8| b.is_ascii_uppercase(),
        b"word" => is_word_byte,
        b"xdigit" => |b: u8| b.is_ascii_hexdigit(),
        _ => return None,
    };
    let mut bs = EMPTY_BITSET;
    for b in 0..=255u8 {
        if pred(b) {
            bitset_set(&mut bs, b);
        }
    }
    Some(bs)
}

/// Resolve named back-references and check every reference names a group
/// that exists in the finished pattern.
fn resolve_backrefs(node: &mut Node, env: &mut ParseEnv) -> ParseResult<()> {
    match node {
        Node::BackRef {
            mem, name, offset, ..
        } => {
            if let Some(name) = name {
                match env.names.iter().find(|(n, _)| n == name) {
                    Some((_, num)) => *mem = *num,
                    None => return err(PCRS_ERR_NONEXISTENT_SUBPATTERN, *offset),
                }
            }
            if *mem == 0 || *mem > env.num_mem {
                return err(PCRS_ERR_NONEXISTENT_SUBPATTERN, *offset);
            }
            env.backref_max = env.backref_max.max(*mem);
        }
        Node::Capture { body, .. }
        | Node::Look { body, .. }
        | Node::Atomic(body)
        | Node::Quant { body, .. } => resolve_backrefs(body, env)?,
        Node::List(items) | Node::Alt(items) => {
            for item in items {
                resolve_backrefs(item, env)?;
            }
        }
        _ => {}
    }
    Ok(())
}
