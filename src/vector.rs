//! # Vector Math
//!
//! Cosine similarity and centroid primitives shared by every component.
//!
//! All functions are pure and tolerate malformed input instead of failing:
//! - unequal lengths compare over the shorter length,
//! - NaN components count as 0,
//! - a zero-norm operand yields similarity 0 (never NaN).
//!
//! Accumulation is done in `f64` so that 1536-dimensional `f32` embeddings
//! stay within 1e-6 of the exact result.

/// Cosine similarity in `[-1, 1]`.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let n = a.len().min(b.len());
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for i in 0..n {
        let x = component(a[i]);
        let y = component(b[i]);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let denom = na.sqrt() * nb.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// Cosine mapped from `[-1, 1]` to `[0, 1]`.
pub fn cos01(a: &[f32], b: &[f32]) -> f64 {
    (cosine(a, b) + 1.0) / 2.0
}

/// Euclidean norm.
pub fn norm(v: &[f32]) -> f64 {
    v.iter().map(|&x| component(x).powi(2)).sum::<f64>().sqrt()
}

/// Elementwise mean. Dimensionality follows the first vector; shorter
/// vectors contribute 0 to the missing components. Empty input → empty vector.
pub fn centroid<V: AsRef<[f32]>>(vectors: &[V]) -> Vec<f32> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };
    let dim = first.as_ref().len();
    let mut acc = vec![0.0f64; dim];
    for v in vectors {
        for (slot, &x) in acc.iter_mut().zip(v.as_ref().iter()) {
            *slot += component(x);
        }
    }
    let n = vectors.len() as f64;
    acc.into_iter().map(|s| (s / n) as f32).collect()
}

/// One-vs-many cosine. `vectors` is row-major, `dim` = `base.len()`.
///
/// Trailing elements that do not fill a whole row are ignored.
pub fn batch_cosine(base: &[f32], vectors: &[f32]) -> Vec<f64> {
    let dim = base.len();
    if dim == 0 {
        return Vec::new();
    }
    vectors.chunks_exact(dim).map(|row| cosine(base, row)).collect()
}

#[inline]
fn component(x: f32) -> f64 {
    if x.is_nan() { 0.0 } else { x as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cosine_identity_and_opposite() {
        let v = vec![0.3f32, -1.2, 4.0, 0.0, 2.5];
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        assert!((cosine(&v, &v) - 1.0).abs() < 1e-6);
        assert!((cosine(&v, &neg) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm_is_zero() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine(&[], &[1.0]), 0.0);
    }

    #[test]
    fn test_cosine_unequal_lengths_uses_shorter() {
        // Only the first two components are compared.
        let a = [1.0f32, 0.0];
        let b = [1.0f32, 0.0, 99.0];
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_nan_component_is_zero() {
        let a = [f32::NAN, 1.0];
        let b = [5.0f32, 1.0];
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid() {
        let c = centroid(&[vec![1.0f32, 2.0], vec![3.0, 4.0]]);
        assert_eq!(c, vec![2.0, 3.0]);
        assert!(centroid::<Vec<f32>>(&[]).is_empty());
    }

    #[test]
    fn test_batch_cosine() {
        let base = [1.0f32, 0.0];
        let flat = [1.0f32, 0.0, 0.0, 1.0, -1.0, 0.0];
        let out = batch_cosine(&base, &flat);
        assert_eq!(out.len(), 3);
        assert!((out[0] - 1.0).abs() < 1e-9);
        assert!(out[1].abs() < 1e-9);
        assert!((out[2] + 1.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_cosine_bounded(a in prop::collection::vec(-1e3f32..1e3, 1..64),
                               b in prop::collection::vec(-1e3f32..1e3, 1..64)) {
            let c = cosine(&a, &b);
            prop_assert!(c.is_finite());
            prop_assert!((-1.0..=1.0).contains(&c));
        }

        #[test]
        fn prop_cosine_self_is_one(v in prop::collection::vec(-10f32..10.0, 128..512)) {
            prop_assume!(norm(&v) > 1e-3);
            prop_assert!((cosine(&v, &v) - 1.0).abs() < 1e-6);
        }
    }
}
