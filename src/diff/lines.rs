use similar::{capture_diff_slices, Algorithm, DiffTag};

/// Non-empty lines in `content`, splitting on both CR and LF.
pub fn count_lines(content: &str) -> i64 {
    content
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .count() as i64
}

/// Delta of a newly added file.
pub fn added_delta(target: &str) -> i64 {
    count_lines(target)
}

/// Delta of a deleted file.
pub fn deleted_delta(base: &str) -> i64 {
    -count_lines(base)
}

/// Line classification counts of an inline diff.
///
/// A replaced line shows up as one deletion plus one insertion; unchanged
/// lines are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineTally {
    pub inserted: usize,
    pub deleted: usize,
}

impl LineTally {
    /// Inserted minus deleted lines.
    pub fn net(&self) -> i64 {
        self.inserted as i64 - self.deleted as i64
    }
}

/// Split into lines on CRLF, CR or LF, keeping blank lines. Lines are
/// trimmed so whitespace-only edits compare equal.
fn diff_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split("\r\n")
        .flat_map(|chunk| chunk.split(['\r', '\n']))
        .map(str::trim)
        .collect()
}

/// Myers line diff between two revisions of a file.
pub fn tally(base: &str, target: &str) -> LineTally {
    let old = diff_lines(base);
    let new = diff_lines(target);

    let mut tally = LineTally::default();
    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {}
            DiffTag::Delete => tally.deleted += old_range.len(),
            DiffTag::Insert => tally.inserted += new_range.len(),
            DiffTag::Replace => {
                tally.deleted += old_range.len();
                tally.inserted += new_range.len();
            }
        }
    }
    tally
}

/// Delta of an edited (or renamed and edited) file.
pub fn edited_delta(base: &str, target: &str) -> i64 {
    tally(base, target).net()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "using System;\r\n\r\nnamespace Billing\r\n{\r\n    class Invoice {}\r\n}\r\n";

    #[test]
    fn test_count_lines_skips_empty_segments() {
        assert_eq!(count_lines(SAMPLE), 5);
        assert_eq!(count_lines("a\nb\n\n\nc"), 3);
        assert_eq!(count_lines("a\rb"), 2);
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("\r\n\r\n"), 0);
    }

    #[test]
    fn test_add_then_delete_cancels_out() {
        for content in [SAMPLE, "", "single", "x\n\ny\r\nz\r"] {
            assert_eq!(added_delta(content) + deleted_delta(content), 0);
        }
    }

    #[test]
    fn test_identical_texts_have_zero_delta() {
        assert_eq!(edited_delta(SAMPLE, SAMPLE), 0);
        let t = tally(SAMPLE, SAMPLE);
        assert_eq!(t.inserted, 0);
        assert_eq!(t.deleted, 0);
    }

    #[test]
    fn test_inserted_lines() {
        let base = "a\nb\nc\n";
        let target = "a\nb\nx\ny\nc\n";
        let t = tally(base, target);
        assert_eq!(t.inserted, 2);
        assert_eq!(t.deleted, 0);
        assert_eq!(edited_delta(base, target), 2);
    }

    #[test]
    fn test_deleted_lines() {
        let base = "a\nb\nc\nd\n";
        let target = "a\nd\n";
        assert_eq!(edited_delta(base, target), -2);
    }

    #[test]
    fn test_replaced_line_is_net_zero() {
        let base = "a\nb\nc";
        let target = "a\nB\nc";
        let t = tally(base, target);
        assert_eq!(t.inserted, 1);
        assert_eq!(t.deleted, 1);
        assert_eq!(t.net(), 0);
    }

    #[test]
    fn test_whitespace_only_changes_are_ignored() {
        let base = "fn main() {\n    run();\n}\n";
        let target = "fn main() {\n\trun();   \n}\r\n";
        assert_eq!(edited_delta(base, target), 0);
    }

    #[test]
    fn test_ten_lines_added_to_existing_file() {
        let base = "header\nfooter\n";
        let body: String = (0..10).map(|i| format!("line {i}\n")).collect();
        let target = format!("header\n{body}footer\n");
        assert_eq!(edited_delta(base, &target), 10);
    }

    #[test]
    fn test_edit_from_empty_file() {
        assert_eq!(edited_delta("", "a\nb"), 2);
        assert_eq!(edited_delta("a\nb", ""), -2);
    }
}
