//! align::distance
//!
//! Character-level edit distance for near matching.

/// Levenshtein distance between `a` and `b`, counted in characters.
///
/// # Example
///
/// ```
/// use collatio::align::distance::edit_distance;
///
/// assert_eq!(edit_distance("near", "nar"), 1);
/// assert_eq!(edit_distance("фрк0", "фрц0"), 1);
/// assert_eq!(edit_distance("", "abc"), 3);
/// ```
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let bound = a.len().max(b.len());
    distance_within(&a, &b, bound).unwrap_or(bound)
}

/// Levenshtein distance if it does not exceed `bound`.
///
/// Only cells within `bound` of the diagonal are computed, and the scan
/// stops once a whole band row exceeds the bound, so comparing a token
/// against a far-off candidate costs O(len × bound) at worst.
///
/// # Example
///
/// ```
/// use collatio::align::distance::bounded_edit_distance;
///
/// assert_eq!(bounded_edit_distance("matching", "matchin", 1), Some(1));
/// assert_eq!(bounded_edit_distance("matching", "yeah", 2), None);
/// ```
pub fn bounded_edit_distance(a: &str, b: &str, bound: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    distance_within(&a, &b, bound)
}

fn distance_within(a: &[char], b: &[char], bound: usize) -> Option<usize> {
    if a.len().abs_diff(b.len()) > bound {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        return Some(a.len().max(b.len()));
    }

    // No distance exceeds the longer length.
    let bound = bound.min(a.len().max(b.len()));
    // Cells off the band hold `over`; their true value is larger still.
    let over = bound + 1;
    let mut previous: Vec<usize> = (0..=b.len()).map(|j| j.min(over)).collect();
    let mut current = vec![over; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        let row = i + 1;
        let low = row.saturating_sub(bound).max(1);
        let high = (row + bound).min(b.len());

        current[low - 1] = if low == 1 { row.min(over) } else { over };
        let mut row_min = current[low - 1];
        for j in low..=high {
            let substitution = previous[j - 1] + usize::from(*ca != b[j - 1]);
            current[j] = substitution
                .min(previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(over);
            row_min = row_min.min(current[j]);
        }
        if high < b.len() {
            current[high + 1] = over;
        }
        if row_min > bound {
            return None;
        }
        std::mem::swap(&mut previous, &mut current);
    }

    let distance = previous[b.len()];
    (distance <= bound).then_some(distance)
}
