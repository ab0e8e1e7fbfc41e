//! Parsers for `git push --porcelain` results and `--progress` output.

use super::flags::{OpCodes, PushFlags};
use super::{ProgressEvent, PushInfo};
use std::collections::HashSet;

// =============================================================================
// Push results
// =============================================================================

/// Parse one porcelain result line: `<flag>\t<from>:<to>\t<summary>`.
pub fn parse_push_line(line: &str) -> Option<PushInfo> {
    let mut parts = line.splitn(3, '\t');
    let control = parts.next()?;
    let from_to = parts.next()?;
    let summary = parts.next().unwrap_or("").trim().to_string();

    let mut chars = control.chars();
    let control = chars.next()?;
    if chars.next().is_some() {
        return None;
    }

    let mut flags = match control {
        ' ' => PushFlags::FAST_FORWARD,
        '+' => PushFlags::FORCED_UPDATE,
        '-' => PushFlags::DELETED,
        '*' => PushFlags::empty(),
        '=' => PushFlags::UP_TO_DATE,
        '!' => PushFlags::ERROR,
        'X' => PushFlags::NO_MATCH,
        _ => return None,
    };

    if summary.contains("[rejected]") {
        flags |= PushFlags::REJECTED;
    } else if summary.contains("[remote rejected]") {
        flags |= PushFlags::REMOTE_REJECTED;
    } else if summary.contains("[remote failure]") {
        flags |= PushFlags::REMOTE_FAILURE;
    } else if summary.contains("[no match]") {
        flags |= PushFlags::ERROR;
    } else if summary.contains("[new tag]") {
        flags |= PushFlags::NEW_TAG;
    } else if summary.contains("[new branch]") {
        flags |= PushFlags::NEW_HEAD;
    }

    let (from, to) = from_to.split_once(':')?;
    let local_ref = if flags.contains(PushFlags::DELETED) || from.is_empty() {
        None
    } else {
        Some(from.to_string())
    };

    Some(PushInfo {
        flags,
        local_ref,
        remote_ref: to.to_string(),
        summary,
    })
}

/// Parse the stdout of `git push --porcelain`, skipping `To ...` and `Done` lines.
pub fn parse_push_output(stdout: &str) -> Vec<PushInfo> {
    stdout.lines().filter_map(parse_push_line).collect()
}

// =============================================================================
// Progress
// =============================================================================

fn opcode_for(operation: &str) -> Option<OpCodes> {
    match operation {
        "Counting objects" => Some(OpCodes::COUNTING),
        "Compressing objects" => Some(OpCodes::COMPRESSING),
        "Writing objects" => Some(OpCodes::WRITING),
        "Receiving objects" => Some(OpCodes::RECEIVING),
        "Resolving deltas" => Some(OpCodes::RESOLVING),
        "Finding sources" => Some(OpCodes::FINDING_SOURCES),
        "Checking out files" => Some(OpCodes::CHECKING_OUT),
        _ => None,
    }
}

/// Turns git's human-readable progress lines into [`ProgressEvent`]s.
///
/// The first line seen for a stage carries BEGIN, a line ending in `done.`
/// carries END.
#[derive(Debug, Default)]
pub struct ProgressParser {
    seen: HashSet<u16>,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_line(&mut self, line: &str) -> Option<ProgressEvent> {
        let line = line.trim();
        let line = line.strip_prefix("remote:").map(str::trim).unwrap_or(line);
        let (operation, rest) = line.split_once(':')?;
        let stage = opcode_for(operation.trim())?;
        let rest = rest.trim();

        let mut op_code = stage;
        if self.seen.insert(stage.bits()) {
            op_code |= OpCodes::BEGIN;
        }

        let (cur_count, max_count, tail) = parse_counts(rest)?;

        let mut message = tail.trim().trim_start_matches(',').trim().to_string();
        if let Some(stripped) = message.strip_suffix("done.") {
            op_code |= OpCodes::END;
            message = stripped.trim().trim_end_matches(',').trim().to_string();
        }

        Some(ProgressEvent {
            op_code: op_code.bits(),
            cur_count,
            max_count,
            message,
        })
    }
}

/// `"50% (1/2), 3 KiB | 1 MiB/s"` -> (1, Some(2), ", 3 KiB | 1 MiB/s")
/// `"12, done."` -> (12, None, ", done.")
fn parse_counts(rest: &str) -> Option<(u64, Option<u64>, &str)> {
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let first: u64 = rest[..digits_end].parse().ok()?;
    let after = &rest[digits_end..];

    if let Some(after_pct) = after.strip_prefix('%') {
        let open = after_pct.find('(')?;
        let close = after_pct.find(')')?;
        let (cur, max) = after_pct[open + 1..close].split_once('/')?;
        let cur = cur.trim().parse().ok()?;
        let max = max.trim().parse().ok()?;
        Some((cur, Some(max), &after_pct[close + 1..]))
    } else {
        Some((first, None, after))
    }
}

/// Split raw progress output on both `\r` and `\n`, dropping empty pieces.
pub fn split_progress(buf: &str) -> impl Iterator<Item = &str> {
    buf.split(['\r', '\n']).filter(|piece| !piece.trim().is_empty())
}
