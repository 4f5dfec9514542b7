//! Reading-order assembly: turn unordered OCR detections into text.
//!
//! OCR engines return one detection per recognised text fragment, in no
//! useful order, and scanned academic material is frequently set in two or
//! three columns. Sorting detections by `y` alone interleaves the columns;
//! sorting by `(y, x)` breaks on the natural jitter of OCR bounding boxes,
//! where two fragments on the same printed line differ by a few pixels of
//! `y`.
//!
//! ## Algorithm
//!
//! 1. Reduce each detection to its top-left corner `(x, y)` and box height
//!    `h`.
//! 2. Sort by `y` ascending.
//! 3. Greedily partition into visual lines: a detection joins the current
//!    line when its `y` is within `0.6 × max(h, 1)` of the line's most
//!    recently added detection, otherwise it closes the line and starts a
//!    new one.
//! 4. Sort each line by `x` ascending and join fragments with spaces.
//! 5. Join lines with newlines, in close order.
//!
//! The 0.6-line-height band absorbs bounding-box jitter within a printed
//! line. Multi-column pages come out approximately column-major: fragments
//! from different columns rarely share a vertical band, and within a band
//! the left-to-right sort restores intra-line order. Pathological layouts
//! (two columns whose lines sit at nearly equal `y`) can still interleave —
//! this is an accepted approximation, not an exact layout analyser.

use crate::pipeline::ocr::Detection;

/// A detection reduced to the coordinates the banding pass needs.
struct Fragment<'a> {
    x: f32,
    y: f32,
    h: f32,
    text: &'a str,
}

impl<'a> Fragment<'a> {
    fn from_detection(det: &'a Detection) -> Self {
        let xs = det.bbox.iter().map(|p| p[0]);
        let ys = det.bbox.iter().map(|p| p[1]);
        let x = xs.fold(f32::INFINITY, f32::min);
        let min_y = ys.clone().fold(f32::INFINITY, f32::min);
        let max_y = ys.fold(f32::NEG_INFINITY, f32::max);
        Fragment {
            x,
            y: min_y,
            h: max_y - min_y,
            text: &det.text,
        }
    }
}

/// Reconstruct reading-order text from unordered OCR detections.
///
/// Returns the empty string for zero detections. Never fails: any set of
/// boxes produces *some* ordering, and garbage boxes degrade to garbage
/// order rather than an error.
pub fn assemble_text(detections: &[Detection]) -> String {
    if detections.is_empty() {
        return String::new();
    }

    let mut fragments: Vec<Fragment<'_>> =
        detections.iter().map(Fragment::from_detection).collect();
    fragments.sort_by(|a, b| a.y.total_cmp(&b.y));

    // Greedy banding against the most recently added fragment. Comparing
    // against the last addition (not the line's first) lets a line of
    // slightly drifting baselines stay together.
    let mut lines: Vec<Vec<Fragment<'_>>> = Vec::new();
    let mut current: Vec<Fragment<'_>> = Vec::new();

    for fragment in fragments {
        match current.last() {
            Some(last) if (fragment.y - last.y).abs() < 0.6 * last.h.max(1.0) => {
                current.push(fragment);
            }
            Some(_) => {
                lines.push(std::mem::take(&mut current));
                current.push(fragment);
            }
            None => current.push(fragment),
        }
    }
    lines.push(current);

    let mut assembled: Vec<String> = Vec::with_capacity(lines.len());
    for mut line in lines {
        line.sort_by(|a, b| a.x.total_cmp(&b.x));
        assembled.push(
            line.iter()
                .map(|f| f.text)
                .collect::<Vec<_>>()
                .join(" "),
        );
    }

    assembled.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Axis-aligned box helper: corners in the order OCR engines emit them.
    fn det(x: f32, y: f32, w: f32, h: f32, text: &str) -> Detection {
        Detection {
            bbox: [[x, y], [x + w, y], [x + w, y + h], [x, y + h]],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn empty_detections_yield_empty_string() {
        assert_eq!(assemble_text(&[]), "");
    }

    #[test]
    fn single_detection_passes_through() {
        assert_eq!(assemble_text(&[det(10.0, 10.0, 80.0, 20.0, "Hello")]), "Hello");
    }

    #[test]
    fn same_band_sorts_left_to_right_then_next_line() {
        let detections = vec![
            det(0.0, 0.0, 40.0, 20.0, "Left"),
            det(60.0, 0.0, 40.0, 20.0, "Right"),
            det(0.0, 100.0, 40.0, 20.0, "Below"),
        ];
        assert_eq!(assemble_text(&detections), "Left Right\nBelow");
    }

    #[test]
    fn input_order_does_not_matter() {
        let detections = vec![
            det(0.0, 100.0, 40.0, 20.0, "Below"),
            det(60.0, 0.0, 40.0, 20.0, "Right"),
            det(0.0, 0.0, 40.0, 20.0, "Left"),
        ];
        assert_eq!(assemble_text(&detections), "Left Right\nBelow");
    }

    #[test]
    fn jittered_baselines_stay_on_one_line() {
        // 20 px tall boxes; 0.6 × 20 = 12 px band. Jitter of a few px is
        // well inside it.
        let detections = vec![
            det(0.0, 50.0, 30.0, 20.0, "one"),
            det(40.0, 53.0, 30.0, 20.0, "two"),
            det(80.0, 48.0, 30.0, 20.0, "three"),
        ];
        assert_eq!(assemble_text(&detections), "one two three");
    }

    #[test]
    fn two_column_layout_reads_column_wise_lines() {
        // Two columns, two printed lines. Raw y-order interleaves the
        // columns; banding + x-sort restores each printed line.
        let detections = vec![
            det(300.0, 0.0, 100.0, 20.0, "col2-line1"),
            det(0.0, 2.0, 100.0, 20.0, "col1-line1"),
            det(0.0, 40.0, 100.0, 20.0, "col1-line2"),
            det(300.0, 41.0, 100.0, 20.0, "col2-line2"),
        ];
        assert_eq!(
            assemble_text(&detections),
            "col1-line1 col2-line1\ncol1-line2 col2-line2"
        );
    }

    #[test]
    fn degenerate_zero_height_boxes_use_unit_band() {
        // h = 0 would collapse the band to nothing; the max(h, 1) floor
        // keeps exactly-equal y values together.
        let detections = vec![
            det(50.0, 10.0, 30.0, 0.0, "b"),
            det(0.0, 10.0, 30.0, 0.0, "a"),
            det(0.0, 30.0, 30.0, 0.0, "c"),
        ];
        assert_eq!(assemble_text(&detections), "a b\nc");
    }

    #[test]
    fn band_is_relative_to_most_recent_fragment() {
        // Each step is 10 px with 20 px boxes (band 12 px): a drifting
        // sequence chains into one line even though first-to-last exceeds
        // the band.
        let detections = vec![
            det(0.0, 0.0, 30.0, 20.0, "a"),
            det(40.0, 10.0, 30.0, 20.0, "b"),
            det(80.0, 20.0, 30.0, 20.0, "c"),
        ];
        assert_eq!(assemble_text(&detections), "a b c");
    }
}
