//! Push result flags and push progress opcodes.
//!
//! Both are fixed-width words whose bits are read most-significant first
//! against an ordered name table. The bit values follow the conventions of
//! the common git bindings, so the words recorded by older workers decode
//! the same way.

// =============================================================================
// Push result flags
// =============================================================================

bitflags::bitflags! {
    /// Outcome bits for one pushed ref (11 bits).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PushFlags: u16 {
        const NEW_TAG = 1 << 0;
        const NEW_HEAD = 1 << 1;
        const NO_MATCH = 1 << 2;
        const REJECTED = 1 << 3;
        const REMOTE_REJECTED = 1 << 4;
        const REMOTE_FAILURE = 1 << 5;
        const DELETED = 1 << 6;
        const FORCED_UPDATE = 1 << 7;
        const FAST_FORWARD = 1 << 8;
        const UP_TO_DATE = 1 << 9;
        const ERROR = 1 << 10;
    }
}

/// Push flag names, most-significant bit first.
pub const PUSH_FLAG_NAMES: [&str; 11] = [
    "ERROR",
    "UP_TO_DATE",
    "FAST_FORWARD",
    "FORCED_UPDATE",
    "DELETED",
    "REMOTE_FAILURE",
    "REMOTE_REJECTED",
    "REJECTED",
    "NO_MATCH",
    "NEW_HEAD",
    "NEW_TAG",
];

// =============================================================================
// Progress opcodes
// =============================================================================

bitflags::bitflags! {
    /// Stage bits reported while a push or fetch is running (9 bits).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct OpCodes: u16 {
        const BEGIN = 1 << 0;
        const END = 1 << 1;
        const COUNTING = 1 << 2;
        const COMPRESSING = 1 << 3;
        const WRITING = 1 << 4;
        const RECEIVING = 1 << 5;
        const RESOLVING = 1 << 6;
        const FINDING_SOURCES = 1 << 7;
        const CHECKING_OUT = 1 << 8;
    }
}

/// Progress opcode names, most-significant bit first.
pub const OPCODE_NAMES: [&str; 9] = [
    "CHECKING_OUT",
    "FINDING_SOURCES",
    "RESOLVING",
    "RECEIVING",
    "WRITING",
    "COMPRESSING",
    "COUNTING",
    "END",
    "BEGIN",
];

/// Names of the bits set in `word`, scanning `names.len()` bits MSB-first.
/// Bits above the table width are ignored.
fn decode_msb_first(word: u16, names: &[&'static str]) -> Vec<&'static str> {
    let width = names.len();
    names
        .iter()
        .enumerate()
        .filter(|(i, _)| word & (1 << (width - 1 - i)) != 0)
        .map(|(_, name)| *name)
        .collect()
}

/// Decode an 11-bit push result word into flag names.
pub fn decode_push_flags(word: u16) -> Vec<&'static str> {
    decode_msb_first(word, &PUSH_FLAG_NAMES)
}

/// Decode a 9-bit progress opcode word into opcode names.
pub fn decode_opcodes(word: u16) -> Vec<&'static str> {
    decode_msb_first(word, &OPCODE_NAMES)
}
