//! Reorder-tolerant diffing between two verified sources.
//!
//! A standard diff asks what was added or removed; this one first asks
//! whether either line is known *anywhere* on the opposite side, using the
//! sides' membership sketches, and only then falls back to add/remove. The
//! walk is linear in the merged length, not an LCS alignment.

use std::io::Write;

use rustc_hash::FxHashSet;

use crate::hash::RecordDigest;
use crate::source::Source;

/// Emit a reorder-tolerant diff of `left` against `right` to the sink.
///
/// Every output line carries exactly one prefix character and no trailing
/// punctuation:
///
/// - space: equal on both sides at this position
/// - `*`: present on both sides, but displaced
/// - `+`: added on the right
/// - `-`: removed from the left
///
/// Left-side ordering is preferred for displaced lines. Returns `true` iff
/// every record resolved as an exact positional match or an in-walk
/// displacement match; any drained leftover or add/remove clears it.
///
/// # Errors
///
/// Propagates write errors from the sink.
#[allow(clippy::too_many_lines)]
pub fn diff<W: Write>(left: &Source, right: &Source, mut out: W) -> std::io::Result<bool> {
    let lseq = left.lines();
    let rseq = right.lines();
    let lsketch = left.checksummer().sketch();
    let rsketch = right.checksummer().sketch();

    let mut emitted: FxHashSet<&str> = FxHashSet::default();
    let mut allmatch = true;
    let (mut i, mut j) = (0usize, 0usize);

    while i < lseq.len() && j < rseq.len() {
        let lline = lseq[i].as_str();
        let rline = rseq[j].as_str();

        // Easy match.
        if lline == rline {
            writeln!(out, " {lline}")?;
            emitted.insert(lline);
            i += 1;
            j += 1;
            continue;
        }

        // Before calling anything added or removed, check whether either
        // line is known somewhere on the opposite side, out of order.
        let lhash = RecordDigest::compute(lline.as_bytes(), None);
        let rhash = RecordDigest::compute(rline.as_bytes(), None);
        let right_has_left = rsketch.contains(&lhash);
        let left_has_right = lsketch.contains(&rhash);

        if right_has_left && left_has_right {
            // Both sides know both lines; they are merely out of order.
            if emitted.contains(rline) {
                // The right line was already output; skipping it gives the
                // left side a chance to exact-match the next right line.
                j += 1;
                continue;
            }
            if emitted.contains(lline) {
                i += 1;
                continue;
            }
            // Neither was output yet; keep left-side ordering.
            writeln!(out, "*{lline}")?;
            emitted.insert(lline);
            i += 1;
            // The left side holds the right line somewhere, safe to skip.
            j += 1;
            continue;
        }

        if right_has_left {
            // The left side has no knowledge of the right line: added.
            writeln!(out, "+{rline}")?;
            emitted.insert(rline);
            j += 1;
            allmatch = false;
            continue;
        }

        if left_has_right {
            // The right side has no knowledge of the left line: removed.
            writeln!(out, "-{lline}")?;
            emitted.insert(lline);
            i += 1;
            allmatch = false;
            continue;
        }

        // Both sides are unknown to the other.
        writeln!(out, "-{lline}")?;
        writeln!(out, "+{rline}")?;
        emitted.insert(lline);
        emitted.insert(rline);
        i += 1;
        j += 1;
        allmatch = false;
    }

    // Drain the left remainder: displaced if the right side knows the line,
    // removed otherwise.
    while i < lseq.len() {
        let lline = lseq[i].as_str();
        i += 1;
        let lhash = RecordDigest::compute(lline.as_bytes(), None);
        if rsketch.contains(&lhash) {
            if emitted.contains(lline) {
                continue;
            }
            writeln!(out, "*{lline}")?;
            emitted.insert(lline);
        } else {
            writeln!(out, "-{lline}")?;
            emitted.insert(lline);
        }
        allmatch = false;
    }

    // Drain the right remainder symmetrically.
    while j < rseq.len() {
        let rline = rseq[j].as_str();
        j += 1;
        let rhash = RecordDigest::compute(rline.as_bytes(), None);
        if lsketch.contains(&rhash) {
            if emitted.contains(rline) {
                continue;
            }
            writeln!(out, "*{rline}")?;
            emitted.insert(rline);
        } else {
            writeln!(out, "+{rline}")?;
            emitted.insert(rline);
        }
        allmatch = false;
    }

    Ok(allmatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    use tempfile::TempDir;

    use crate::checksum::Checksummer;
    use crate::sketch::SketchKind;

    fn source(dir: &TempDir, name: &str, content: &str) -> Source {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();

        let mut ck = Checksummer::with_sketch(SketchKind::Small);
        ck.sum(Cursor::new(content)).unwrap();
        fs::write(
            dir.path().join(format!("{name}.qcd")),
            serde_json::to_vec(&ck.info().unwrap()).unwrap(),
        )
        .unwrap();

        Source::open(&path).unwrap()
    }

    fn run_diff(left: &Source, right: &Source) -> (bool, Vec<String>) {
        let mut out = Vec::new();
        let allmatch = diff(left, right, &mut out).unwrap();
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        (allmatch, lines)
    }

    #[test]
    fn identical_sources_all_match() {
        let dir = TempDir::new().unwrap();
        let left = source(&dir, "l.txt", "a\nb\nc\n");
        let right = source(&dir, "r.txt", "a\nb\nc\n");

        let (allmatch, lines) = run_diff(&left, &right);
        assert!(allmatch);
        assert_eq!(lines, [" a", " b", " c"]);
    }

    #[test]
    fn displaced_lines_marked_star() {
        let dir = TempDir::new().unwrap();
        let left = source(&dir, "l.txt", "a\nb\nc\n");
        let right = source(&dir, "r.txt", "a\nc\nb\n");

        let (allmatch, lines) = run_diff(&left, &right);
        // Displacement resolved entirely through the sketches: b and c are
        // present on both sides, only their order differs.
        assert!(!allmatch);
        assert_eq!(lines, [" a", "*b", "*c"]);
    }

    #[test]
    fn added_line_marked_plus() {
        let dir = TempDir::new().unwrap();
        let left = source(&dir, "l.txt", "a\nc\n");
        let right = source(&dir, "r.txt", "a\nb\nc\n");

        let (allmatch, lines) = run_diff(&left, &right);
        assert!(!allmatch);
        assert_eq!(lines, [" a", "+b", " c"]);
    }

    #[test]
    fn removed_line_marked_minus() {
        let dir = TempDir::new().unwrap();
        let left = source(&dir, "l.txt", "a\nb\nc\n");
        let right = source(&dir, "r.txt", "a\nc\n");

        let (allmatch, lines) = run_diff(&left, &right);
        assert!(!allmatch);
        assert_eq!(lines, [" a", "-b", " c"]);
    }

    #[test]
    fn changed_line_marked_both_ways() {
        let dir = TempDir::new().unwrap();
        let left = source(&dir, "l.txt", "a\nb\nc\n");
        let right = source(&dir, "r.txt", "a\nB\nc\n");

        let (allmatch, lines) = run_diff(&left, &right);
        assert!(!allmatch);
        assert_eq!(lines, [" a", "-b", "+B", " c"]);
    }

    #[test]
    fn trailing_addition_drained() {
        let dir = TempDir::new().unwrap();
        let left = source(&dir, "l.txt", "a\n");
        let right = source(&dir, "r.txt", "a\nb\n");

        let (allmatch, lines) = run_diff(&left, &right);
        assert!(!allmatch);
        assert_eq!(lines, [" a", "+b"]);
    }

    #[test]
    fn trailing_removal_drained() {
        let dir = TempDir::new().unwrap();
        let left = source(&dir, "l.txt", "a\nb\n");
        let right = source(&dir, "r.txt", "a\n");

        let (allmatch, lines) = run_diff(&left, &right);
        assert!(!allmatch);
        assert_eq!(lines, [" a", "-b"]);
    }

    #[test]
    fn drained_duplicate_of_emitted_line_skipped() {
        // The rotated copy leaves "a" for the drain after it was already
        // output as displaced; the drain must not repeat it.
        let dir = TempDir::new().unwrap();
        let left = source(&dir, "l.txt", "a\nb\nc\n");
        let right = source(&dir, "r.txt", "c\na\nb\n");

        let (allmatch, lines) = run_diff(&left, &right);
        assert!(!allmatch);
        for line in &lines {
            assert!(
                line.starts_with([' ', '*', '+', '-']),
                "bad prefix in {line:?}"
            );
        }
        // Every line of the multiset appears exactly once.
        let mut bodies: Vec<&str> = lines.iter().map(|l| &l[1..]).collect();
        bodies.sort_unstable();
        assert_eq!(bodies, ["a", "b", "c"]);
    }

    #[test]
    fn prefix_alphabet_only() {
        let dir = TempDir::new().unwrap();
        let left = source(&dir, "l.txt", "a\nx\nb\nq\n");
        let right = source(&dir, "r.txt", "b\na\ny\n");

        let (_, lines) = run_diff(&left, &right);
        for line in &lines {
            assert!(
                line.starts_with([' ', '*', '+', '-']),
                "bad prefix in {line:?}"
            );
        }
    }

    #[test]
    fn empty_left_side() {
        let dir = TempDir::new().unwrap();
        let left = source(&dir, "l.txt", "");
        let right = source(&dir, "r.txt", "a\n");

        let (allmatch, lines) = run_diff(&left, &right);
        assert!(!allmatch);
        assert_eq!(lines, ["+a"]);
    }

    #[test]
    fn empty_both_sides_match() {
        let dir = TempDir::new().unwrap();
        let left = source(&dir, "l.txt", "");
        let right = source(&dir, "r.txt", "");

        let (allmatch, lines) = run_diff(&left, &right);
        assert!(allmatch);
        assert!(lines.is_empty());
    }
}
