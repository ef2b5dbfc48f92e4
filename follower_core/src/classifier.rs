//! Pattern classification over the raw IR array, independent of the
//! numeric position estimate.

use crate::config::Thresholds;

/// Special array patterns, in fixed evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    None,
    Intersection,
    WideLine,
    LineLost,
}

/// Classify the IR array.
///
/// Evaluation order is Intersection, then WideLine, then LineLost; the
/// first match wins. The order matters: a flooded array (>=4 sensors
/// high) can also satisfy the wide-line span test, and an intersection
/// must not be mistaken for a wide line.
pub fn classify(ir: &[u16; 5], t: &Thresholds) -> Pattern {
    let flooded = ir
        .iter()
        .filter(|&&v| v >= t.intersection_threshold)
        .count();
    if flooded >= 4 {
        return Pattern::Intersection;
    }

    if is_wide_line(ir, t) {
        return Pattern::WideLine;
    }

    if ir.iter().all(|&v| v < t.line_detected) {
        return Pattern::LineLost;
    }

    Pattern::None
}

/// Wide line: the three center sensors (at least) read strong while both
/// outermost stay clear, and the strong run spans `wide_line_span` or
/// more consecutive sensors. The clear outer sensors are what separate
/// this from an intersection.
fn is_wide_line(ir: &[u16; 5], t: &Thresholds) -> bool {
    if ir[0] >= t.line_detected || ir[4] >= t.line_detected {
        return false;
    }
    if !(ir[1] >= t.strong_line && ir[2] >= t.strong_line && ir[3] >= t.strong_line) {
        return false;
    }
    longest_strong_run(ir, t.strong_line) >= usize::from(t.wide_line_span)
}

fn longest_strong_run(ir: &[u16; 5], strong: u16) -> usize {
    let mut best = 0;
    let mut run = 0;
    for &v in ir {
        if v >= strong {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}
