//! Deterministic hash-based pseudo-embeddings.
//!
//! No model is involved: a token's embedding is a pure function of its
//! UTF-16 code units, so the same string always lands on the same unit
//! vector and similarity between two tokens never changes over time.

use crate::constants::{EMBEDDING_DIM, EMBEDDING_PHASE_STEP};

pub type Embedding = [f64; EMBEDDING_DIM];

/// 32-bit rolling hash: h = h * 31 + unit, wrapping, over UTF-16 code units.
pub fn string_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32)
    })
}

/// Embed text as a unit vector: component i = sin(hash + i * 1.1), normalized.
pub fn embed(text: &str) -> Embedding {
    let hash = string_hash(text) as f64;
    let mut vec = [0.0; EMBEDDING_DIM];
    for (i, v) in vec.iter_mut().enumerate() {
        *v = (hash + i as f64 * EMBEDDING_PHASE_STEP).sin();
    }
    normalize(vec)
}

/// Scale to unit L2 norm. The zero vector is returned unchanged.
pub fn normalize(mut vec: Embedding) -> Embedding {
    let norm = vec.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm == 0.0 {
        return vec;
    }
    for v in &mut vec {
        *v /= norm;
    }
    vec
}

/// Cosine similarity. Returns 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

pub fn l2_norm(vec: &Embedding) -> f64 {
    vec.iter().map(|v| v * v).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_hash_matches_rolling_formula() {
        assert_eq!(string_hash(""), 0);
        assert_eq!(string_hash("a"), 97);
        // 97 * 31 + 98
        assert_eq!(string_hash("ab"), 3105);
    }

    #[test]
    fn test_hash_wraps_without_panicking() {
        let long = "overflow ".repeat(1000);
        let _ = string_hash(&long);
    }

    #[test]
    fn test_empty_text_is_well_defined() {
        let e = embed("");
        assert_relative_eq!(l2_norm(&e), 1.0, epsilon = 1e-12);
        // hash 0 → component 0 is sin(0) = 0
        assert_eq!(e[0], 0.0);
    }

    #[test]
    fn test_unicode_input() {
        let e = embed("память 🧠 música");
        assert_relative_eq!(l2_norm(&e), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_self_similarity_is_one() {
        let e = embed("resonance");
        assert_relative_eq!(cosine_similarity(&e, &e), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_vector_similarity() {
        let zero = [0.0; EMBEDDING_DIM];
        let e = embed("anything");
        assert_eq!(cosine_similarity(&zero, &e), 0.0);
        assert_eq!(cosine_similarity(&e, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_normalize_zero_unchanged() {
        let zero = [0.0; EMBEDDING_DIM];
        assert_eq!(normalize(zero), zero);
    }

    proptest! {
        #[test]
        fn prop_embed_deterministic(s in ".*") {
            prop_assert_eq!(embed(&s), embed(&s));
        }

        #[test]
        fn prop_embed_unit_norm(s in ".+") {
            let n = l2_norm(&embed(&s));
            prop_assert!((n - 1.0).abs() < 1e-9, "norm {} for {:?}", n, s);
        }

        #[test]
        fn prop_similarity_bounded(a in ".*", b in ".*") {
            let sim = cosine_similarity(&embed(&a), &embed(&b));
            prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&sim));
        }
    }
}
