// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Deterministic line-based three-way merge.
//!
//! ```text
//! base ──LCS──> ours        sync points: base lines matched on both sides
//! base ──LCS──> theirs
//!
//!   stable | chunk | stable | chunk ...
//!
//! chunk:  ours == base    -> theirs
//!         theirs == base  -> ours
//!         ours == theirs  -> ours
//!         otherwise       -> <<<<<<< ours / ======= / >>>>>>> theirs
//! ```
//!
//! Lines keep their terminators, so files without a trailing newline and
//! CRLF files merge byte-exactly.

/// Upper bound for the LCS table; larger middles are treated as one change.
const MAX_LCS_CELLS: usize = 16 * 1024 * 1024;

/// Bytes inspected when sniffing for binary content.
const BINARY_SNIFF_LEN: usize = 8000;

/// Labels written after the opening and closing markers.
#[derive(Debug, Clone, Copy)]
pub struct MarkerLabels<'a> {
    pub ours: &'a str,
    pub theirs: &'a str,
}

impl Default for MarkerLabels<'_> {
    fn default() -> Self {
        Self {
            ours: "ours",
            theirs: "theirs",
        }
    }
}

/// Result of a blob merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutput {
    /// Merged content, with conflict markers when `conflicts > 0`.
    pub content: Vec<u8>,
    /// Number of conflicting regions.
    pub conflicts: usize,
}

impl MergeOutput {
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.conflicts == 0
    }
}

/// True when the content looks binary (NUL within the first 8000 bytes).
#[must_use]
pub fn is_binary(content: &[u8]) -> bool {
    content[..content.len().min(BINARY_SNIFF_LEN)].contains(&0)
}

fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    content.split_inclusive(|&b| b == b'\n').collect()
}

/// Matching line pairs `(a_index, b_index)` in increasing order.
fn matching_lines(a: &[&[u8]], b: &[&[u8]]) -> Vec<(usize, usize)> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut pairs: Vec<(usize, usize)> = (0..prefix).map(|i| (i, i)).collect();

    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];
    pairs.extend(
        lcs(a_mid, b_mid)
            .into_iter()
            .map(|(i, j)| (i + prefix, j + prefix)),
    );

    let a_tail = a.len() - suffix;
    let b_tail = b.len() - suffix;
    pairs.extend((0..suffix).map(|k| (a_tail + k, b_tail + k)));
    pairs
}

/// Classic dynamic-programming LCS over lines.
fn lcs(a: &[&[u8]], b: &[&[u8]]) -> Vec<(usize, usize)> {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 || n.saturating_mul(m) > MAX_LCS_CELLS {
        return Vec::new();
    }

    // table[i][j] = LCS length of a[i..] and b[j..]
    let width = m + 1;
    let mut table = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if a[i] == b[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

fn push_lines(out: &mut Vec<u8>, lines: &[&[u8]]) {
    for line in lines {
        out.extend_from_slice(line);
    }
}

fn push_marker(out: &mut Vec<u8>, marker: &str, label: &str) {
    if out.last().is_some_and(|&b| b != b'\n') {
        out.push(b'\n');
    }
    out.extend_from_slice(marker.as_bytes());
    if !label.is_empty() {
        out.push(b' ');
        out.extend_from_slice(label.as_bytes());
    }
    out.push(b'\n');
}

/// Merges `ours` and `theirs` relative to `base`.
///
/// Identical changes on both sides merge cleanly; overlapping different
/// changes produce one marker block each.
#[must_use]
pub fn merge3(base: &[u8], ours: &[u8], theirs: &[u8], labels: MarkerLabels<'_>) -> MergeOutput {
    if ours == theirs || theirs == base {
        return MergeOutput {
            content: ours.to_vec(),
            conflicts: 0,
        };
    }
    if ours == base {
        return MergeOutput {
            content: theirs.to_vec(),
            conflicts: 0,
        };
    }

    let base_lines = split_lines(base);
    let ours_lines = split_lines(ours);
    let theirs_lines = split_lines(theirs);

    let mut in_ours = vec![None; base_lines.len()];
    for (b, o) in matching_lines(&base_lines, &ours_lines) {
        in_ours[b] = Some(o);
    }
    let mut in_theirs = vec![None; base_lines.len()];
    for (b, t) in matching_lines(&base_lines, &theirs_lines) {
        in_theirs[b] = Some(t);
    }

    let mut out = Vec::with_capacity(ours.len().max(theirs.len()));
    let mut conflicts = 0;
    let (mut ib, mut io, mut it) = (0, 0, 0);

    loop {
        // Next base line present on both sides, past the cursors
        let sync = (ib..base_lines.len()).find_map(|b| match (in_ours[b], in_theirs[b]) {
            (Some(o), Some(t)) if o >= io && t >= it => Some((b, o, t)),
            _ => None,
        });
        let (sb, so, st) = sync.unwrap_or((base_lines.len(), ours_lines.len(), theirs_lines.len()));

        let base_chunk = &base_lines[ib..sb];
        let ours_chunk = &ours_lines[io..so];
        let theirs_chunk = &theirs_lines[it..st];

        if ours_chunk == base_chunk {
            push_lines(&mut out, theirs_chunk);
        } else if theirs_chunk == base_chunk || ours_chunk == theirs_chunk {
            push_lines(&mut out, ours_chunk);
        } else {
            conflicts += 1;
            push_marker(&mut out, "<<<<<<<", labels.ours);
            push_lines(&mut out, ours_chunk);
            push_marker(&mut out, "=======", "");
            push_lines(&mut out, theirs_chunk);
            push_marker(&mut out, ">>>>>>>", labels.theirs);
        }

        if sync.is_none() {
            break;
        }
        out.extend_from_slice(base_lines[sb]);
        ib = sb + 1;
        io = so + 1;
        it = st + 1;
    }

    MergeOutput {
        content: out,
        conflicts,
    }
}
