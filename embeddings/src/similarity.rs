//! Vector math for embeddings.

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() || a.is_empty() {
        return Err(EmbeddingError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

// Sums run in f64: squares of f32 values neither overflow nor underflow there.
fn dot_f64(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

fn magnitude(v: &[f32]) -> f64 {
    dot_f64(v, v).sqrt()
}

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
///
/// Fails with [`EmbeddingError::DimensionMismatch`] if the lengths differ or
/// both are empty, and with [`EmbeddingError::DegenerateVector`] if either
/// vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;

    let dot_product = dot_f64(a, b);
    let magnitude_a = magnitude(a);
    let magnitude_b = magnitude(b);

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Err(EmbeddingError::DegenerateVector);
    }

    // Rounding can push parallel vectors a hair past 1.0.
    Ok((dot_product / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0) as f32)
}

/// Compute the dot product between two embeddings.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    Ok(dot_f64(a, b) as f32)
}

/// Normalize an embedding to unit length.
pub fn normalize(embedding: &mut Embedding) -> Result<()> {
    let magnitude = magnitude(embedding);
    if magnitude == 0.0 {
        return Err(EmbeddingError::DegenerateVector);
    }
    for x in embedding.iter_mut() {
        *x = (f64::from(*x) / magnitude) as f32;
    }
    Ok(())
}
