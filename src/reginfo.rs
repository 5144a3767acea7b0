// reginfo.rs - Information about a compiled pattern.

use crate::regint::CompiledPattern;

/// What [`pcrs_fullinfo`] should report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InfoKind {
    /// Number of capturing groups.
    CaptureCount,
    /// Highest group number used in a back-reference, 0 if none.
    BackrefMax,
    /// Byte every match starts with, or -1.
    FirstByte,
    /// Minimum length of a match in bytes.
    MinLength,
    /// Number of named groups.
    NameCount,
    /// Compile options as raw bits.
    Options,
    /// Number of compiled operations.
    Size,
}

/// Number of capturing groups in the pattern, group 0 excluded.
///
/// Fixed for the lifetime of the handle.
pub fn pcrs_captured_count(reg: &CompiledPattern) -> usize {
    reg.capture_count()
}

pub fn pcrs_fullinfo(reg: &CompiledPattern, what: InfoKind) -> isize {
    match what {
        InfoKind::CaptureCount => reg.num_mem as isize,
        InfoKind::BackrefMax => reg.backref_max as isize,
        InfoKind::FirstByte => pcrs_first_byte(reg).map_or(-1, isize::from),
        InfoKind::MinLength => reg.optimize.min_len as isize,
        InfoKind::NameCount => reg.names.len() as isize,
        InfoKind::Options => reg.options.bits() as isize,
        InfoKind::Size => reg.ops.len() as isize,
    }
}

/// The byte every match starts with, if the pattern fixes one. For a
/// caseless first letter the lower-case form is reported.
pub fn pcrs_first_byte(reg: &CompiledPattern) -> Option<u8> {
    reg.optimize.first_byte
}

/// Group number for a named group.
pub fn pcrs_get_stringnumber(reg: &CompiledPattern, name: &str) -> Option<usize> {
    reg.names
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, group)| *group)
}
