// Round-trip similarity — cosine of two embeddings, bounded to [0, 1]

use crate::errors::{AgentError, AgentResult};

/// Floating-point slack tolerated at either bound before a score counts as
/// out of range. Scores inside the slack are snapped onto the bound.
pub const SCORE_TOLERANCE: f64 = 1e-6;

/// Cosine similarity of two embedding vectors.
///
/// Vectors are normalised here rather than trusting the backend to do it;
/// for unit vectors this is exactly their dot product. Identical vectors
/// score exactly 1.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> AgentResult<f64> {
    if a.is_empty() || b.is_empty() {
        return Err(AgentError::malformed("embedding vector is empty"));
    }
    if a.len() != b.len() {
        return Err(AgentError::malformed(format!(
            "embedding dimensions differ: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let mut dot = 0.0f64;
    let mut sq_a = 0.0f64;
    let mut sq_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        sq_a += x * x;
        sq_b += y * y;
    }

    if sq_a == 0.0 || sq_b == 0.0 {
        return Err(AgentError::malformed("embedding vector has zero length"));
    }
    if !dot.is_finite() || !sq_a.is_finite() || !sq_b.is_finite() {
        return Err(AgentError::malformed("embedding vector is not finite"));
    }

    check_score(dot / (sq_a * sq_b).sqrt())
}

/// Enforce the `[0, 1]` contract on a similarity score.
///
/// Never clamps a genuinely out-of-range value: a score of 1.5 (or a
/// negative cosine) is a `ScoreOutOfRange` failure.
pub fn check_score(score: f64) -> AgentResult<f64> {
    if score.is_nan() || score > 1.0 + SCORE_TOLERANCE || score < -SCORE_TOLERANCE {
        return Err(AgentError::ScoreOutOfRange { score });
    }
    Ok(score.clamp(0.0, 1.0))
}

/// True when `similarity` is close enough to 1.0 to stop refining.
///
/// With `epsilon == 0.0` this is the exact `similarity == 1.0` test.
pub fn is_converged(similarity: f64, epsilon: f64) -> bool {
    1.0 - similarity <= epsilon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_score_exactly_one() {
        let v = [0.12f32, -0.5, 0.33, 0.9];
        assert_eq!(cosine_similarity(&v, &v).unwrap(), 1.0);
    }

    #[test]
    fn test_unnormalised_vectors_are_normalised() {
        let a = [3.0f32, 4.0];
        let b = [6.0f32, 8.0];
        assert_eq!(cosine_similarity(&a, &b).unwrap(), 1.0);
    }

    #[test]
    fn test_partial_overlap() {
        let a = [1.0f32, 0.0];
        let b = [0.6f32, 0.8];
        let score = cosine_similarity(&a, &b).unwrap();
        assert!((score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_opposite_vectors_out_of_range() {
        let err = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap_err();
        assert!(matches!(err, AgentError::ScoreOutOfRange { .. }));
    }

    #[test]
    fn test_dimension_mismatch_is_malformed() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0]).unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse { .. }));
    }

    #[test]
    fn test_zero_vector_is_malformed() {
        let err = cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse { .. }));
    }

    #[test]
    fn test_check_score_rejects_out_of_range() {
        assert!(matches!(
            check_score(1.5),
            Err(AgentError::ScoreOutOfRange { .. })
        ));
        assert!(matches!(
            check_score(-0.2),
            Err(AgentError::ScoreOutOfRange { .. })
        ));
        assert!(check_score(f64::NAN).is_err());
    }

    #[test]
    fn test_check_score_snaps_rounding_noise() {
        assert_eq!(check_score(1.0 + 1e-12).unwrap(), 1.0);
        assert_eq!(check_score(-1e-12).unwrap(), 0.0);
        assert_eq!(check_score(0.42).unwrap(), 0.42);
    }

    #[test]
    fn test_is_converged() {
        assert!(is_converged(1.0, 0.0));
        assert!(!is_converged(0.999_999, 0.0));
        assert!(is_converged(0.995, 0.01));
        assert!(!is_converged(0.0, 0.0));
    }
}
