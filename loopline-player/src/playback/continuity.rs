//! Loop-region continuity check
//!
//! Decides whether a set of time intervals unions into a single gap-free
//! span. Intervals sharing an exact endpoint value are directly linked
//! (regions produced by splitting are edge-adjacent, so linkage is exact
//! float equality, not tolerance-based); linked intervals collapse into
//! connected components, and the component spans must then chain into one
//! covering span with no strictly positive gap.

/// Merge `intervals` into a single contiguous span.
///
/// Returns the `(min, max)` of the union when it is gap-free, `None` when
/// the intervals split into parts separated by a strictly positive gap or
/// when the input is empty. Each interval must satisfy `start <= end`.
/// The verdict does not depend on input order: components are sorted by
/// their span minimum before the merge sweep.
pub fn merge_contiguous(intervals: &[(f64, f64)]) -> Option<(f64, f64)> {
    if intervals.is_empty() {
        return None;
    }

    let mut parent: Vec<usize> = (0..intervals.len()).collect();

    for i in 0..intervals.len() {
        for j in (i + 1)..intervals.len() {
            let (a, b) = (intervals[i], intervals[j]);
            if a.0 == b.0 || a.0 == b.1 || a.1 == b.0 || a.1 == b.1 {
                union(&mut parent, i, j);
            }
        }
    }

    // Span of each endpoint-linked component.
    let mut spans: Vec<Option<(f64, f64)>> = vec![None; intervals.len()];
    for i in 0..intervals.len() {
        let root = find(&mut parent, i);
        let (start, end) = intervals[i];
        spans[root] = Some(match spans[root] {
            Some((s, e)) => (s.min(start), e.max(end)),
            None => (start, end),
        });
    }

    let mut spans: Vec<(f64, f64)> = spans.into_iter().flatten().collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut connector = spans[0];
    for &(start, end) in &spans[1..] {
        if start > connector.1 {
            // strictly positive gap between maximal components
            return None;
        }
        connector.1 = connector.1.max(end);
    }

    Some(connector)
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[rb] = ra;
    }
}
