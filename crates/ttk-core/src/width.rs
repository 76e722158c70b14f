//! Display-width classification for grid cells.
//!
//! The grid only distinguishes single-width and double-width graphemes; a
//! cluster that measures wider than one column occupies two cells, everything
//! else (including zero-width clusters) occupies one.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// True when the grapheme occupies two monospace cells.
pub fn is_wide(grapheme: &str) -> bool {
    UnicodeWidthStr::width(grapheme) >= 2
}

/// Number of cells a grapheme occupies: 1 or 2.
pub fn cell_width(grapheme: &str) -> usize {
    if is_wide(grapheme) {
        2
    } else {
        1
    }
}

/// Total display width of a string in cells.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(cell_width).sum()
}

/// Iterate the grapheme clusters of a string with their cell widths.
pub fn clusters(s: &str) -> impl Iterator<Item = (&str, usize)> {
    s.graphemes(true).map(|g| (g, cell_width(g)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_narrow() {
        assert!(!is_wide("a"));
        assert_eq!(display_width("hello"), 5);
    }

    #[test]
    fn cjk_is_wide() {
        assert!(is_wide("あ"));
        assert!(is_wide("漢"));
        assert_eq!(display_width("あいう"), 6);
        assert_eq!(display_width("aあb"), 4);
    }

    #[test]
    fn combining_sequences_stay_one_cluster() {
        // e + combining acute accent
        let s = "e\u{301}";
        let clusters: Vec<_> = clusters(s).collect();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0], ("e\u{301}", 1));
    }

    #[test]
    fn zero_width_clusters_occupy_one_cell() {
        assert_eq!(cell_width("\u{200b}"), 1);
    }
}
