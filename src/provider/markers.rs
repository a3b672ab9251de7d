// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Conflict-marker scanning shared by both providers.
//!
//! ```text
//! <<<<<<< ours        <- hunk.start
//! ...
//! ||||||| base        (optional, diff3 style)
//! ...
//! =======
//! ...
//! >>>>>>> theirs      <- hunk.end (after the newline)
//! ```

use super::types::Hunk;

const MARKER_LEN: usize = 7;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Marker {
    Open,
    Base,
    Separator,
    Close,
}

/// Classifies a line (without its newline) as a conflict marker.
fn classify(line: &[u8]) -> Option<Marker> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.len() < MARKER_LEN {
        return None;
    }
    let (head, rest) = line.split_at(MARKER_LEN);
    let labelled = rest.is_empty() || rest[0] == b' ';
    match head {
        b"<<<<<<<" if labelled => Some(Marker::Open),
        b"|||||||" if labelled => Some(Marker::Base),
        b">>>>>>>" if labelled => Some(Marker::Close),
        b"=======" if rest.iter().all(u8::is_ascii_whitespace) => Some(Marker::Separator),
        _ => None,
    }
}

/// Iterates `(offset, line_without_newline, end_offset)`.
fn lines(content: &[u8]) -> impl Iterator<Item = (usize, &[u8], usize)> {
    let mut offset = 0;
    content.split_inclusive(|&b| b == b'\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.strip_suffix(b"\n").unwrap_or(raw);
        (start, line, offset)
    })
}

/// Returns the byte range of every complete conflict-marker block.
#[must_use]
pub fn scan_markers(content: &[u8]) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut open: Option<usize> = None;
    let mut separated = false;

    for (start, line, end) in lines(content) {
        match classify(line) {
            Some(Marker::Open) => {
                open = Some(start);
                separated = false;
            }
            Some(Marker::Separator) if open.is_some() => separated = true,
            Some(Marker::Close) if separated => {
                if let Some(begin) = open.take() {
                    hunks.push(Hunk { start: begin, end });
                }
                separated = false;
            }
            _ => {}
        }
    }
    hunks
}

/// True when any opening, base or closing marker line is present.
///
/// Separator lines alone do not count; `=======` is common in text files.
#[must_use]
pub fn contains_markers(content: &[u8]) -> bool {
    lines(content).any(|(_, line, _)| {
        matches!(
            classify(line),
            Some(Marker::Open | Marker::Base | Marker::Close)
        )
    })
}
