//! Similarity measures over sequences and context vectors.
//!
//! Sequence similarity is the Dice-normalised longest common subsequence:
//!
//! ```text
//! sim(a, b) = 2 · LCS(a, b) / (|a| + |b|)
//! ```
//!
//! Element equality is supplied by the [`SequenceElement`] trait so any
//! element type can be stored; floats match within [`FLOAT_TOLERANCE`].

/// Absolute tolerance used when comparing floating-point elements.
pub const FLOAT_TOLERANCE: f64 = 1e-6;

/// Equality capability for the elements of a stored sequence.
pub trait SequenceElement: Clone {
    /// Whether two elements should be treated as the same symbol.
    fn matches(&self, other: &Self) -> bool;
}

macro_rules! strict_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl SequenceElement for $t {
                fn matches(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

strict_element!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, char, String,
);

impl SequenceElement for &str {
    fn matches(&self, other: &Self) -> bool {
        self == other
    }
}

impl SequenceElement for f64 {
    fn matches(&self, other: &Self) -> bool {
        (self - other).abs() < FLOAT_TOLERANCE
    }
}

impl SequenceElement for f32 {
    fn matches(&self, other: &Self) -> bool {
        (f64::from(*self) - f64::from(*other)).abs() < FLOAT_TOLERANCE
    }
}

impl<T: SequenceElement> SequenceElement for Option<T> {
    fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.matches(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: SequenceElement> SequenceElement for Vec<T> {
    fn matches(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.matches(b))
    }
}

/// Length of the longest common subsequence of `a` and `b`.
///
/// Two-row dynamic programme: O(|a|·|b|) time, O(|b|) space.
#[must_use]
pub fn lcs_length<E: SequenceElement>(a: &[E], b: &[E]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0_usize; b.len() + 1];
    let mut curr = vec![0_usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x.matches(y) {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Dice-normalised LCS similarity in `[0, 1]`. Two empty sequences score 0.
#[must_use]
pub fn sequence_similarity<E: SequenceElement>(a: &[E], b: &[E]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    2.0 * lcs_length(a, b) as f64 / total as f64
}

/// Whether `needle` occurs as a contiguous run inside `haystack`.
///
/// The empty needle is contained in every sequence.
#[must_use]
pub fn contains_subsequence<E: SequenceElement>(haystack: &[E], needle: &[E]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack
        .windows(needle.len())
        .any(|window| window.iter().zip(needle).all(|(a, b)| a.matches(b)))
}

/// Cosine similarity between two context vectors.
///
/// Returns 0.0 if the vectors differ in length, are empty, or either has
/// zero norm.
#[must_use]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

/// Cosine similarity clamped to `[0, 1]`; opposed contexts count as unrelated.
#[must_use]
pub fn context_similarity(a: &[f64], b: &[f64]) -> f64 {
    cosine_similarity(a, b).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcs_of_classic_pair() {
        let a: Vec<char> = "ABCBDAB".chars().collect();
        let b: Vec<char> = "BDCABA".chars().collect();
        assert_eq!(lcs_length(&a, &b), 4);
    }

    #[test]
    fn identical_sequences_are_fully_similar() {
        let s = vec![1, 2, 3];
        assert!((sequence_similarity(&s, &s) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn disjoint_sequences_score_zero() {
        assert!(sequence_similarity(&[1, 2], &[3, 4]).abs() < 1e-12);
        let empty: [i32; 0] = [];
        assert!(sequence_similarity(&empty, &empty).abs() < 1e-12);
    }

    #[test]
    fn dice_normalisation_uses_both_lengths() {
        // LCS([1,2,3], [1,2]) = 2 → 2·2 / 5
        assert!((sequence_similarity(&[1, 2, 3], &[1, 2]) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn floats_match_within_tolerance() {
        assert!(1.0_f64.matches(&(1.0 + 5e-7)));
        assert!(!1.0_f64.matches(&1.001));
        assert_eq!(lcs_length(&[0.1_f64, 0.2, 0.3], &[0.1, 0.2 + 1e-9, 0.3]), 3);
    }

    #[test]
    fn strings_compare_strictly() {
        let a = vec!["walk".to_string(), "run".to_string()];
        let b = vec!["walk".to_string(), "Run".to_string()];
        assert_eq!(lcs_length(&a, &b), 1);
    }

    #[test]
    fn contiguous_containment() {
        assert!(contains_subsequence(&[1, 2, 3, 4], &[2, 3]));
        assert!(!contains_subsequence(&[1, 2, 3, 4], &[2, 4]));
        let empty: [i32; 0] = [];
        assert!(contains_subsequence(&[1, 2], &empty));
        assert!(!contains_subsequence(&[1], &[1, 2]));
    }

    #[test]
    fn cosine_handles_degenerate_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).abs() < 1e-12);
        assert!(context_similarity(&[1.0, 0.0], &[-1.0, 0.0]).abs() < 1e-12);
    }
}
