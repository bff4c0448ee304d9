// Vector math module
// Pure numeric helpers shared by fusion, search and recommendation flows


use crate::{MatchError, Result};

/// Decimal places used when hashing vectors for cache keys
pub const DEFAULT_HASH_PRECISION: u32 = 4;

/// A vector paired with a non-negative weight, used as fusion input
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedVector {
    pub vector: Vec<f32>,
    pub weight: f32,
}

impl WeightedVector {
    #[inline]
    pub fn new(vector: Vec<f32>, weight: f32) -> Self {
        Self { vector, weight }
    }
}

fn ensure_same_len(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(MatchError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        })
    }
}

#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    ensure_same_len(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

#[inline]
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity in [-1, 1]; zero when either operand has no magnitude
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let magnitude_a = magnitude(a);
    let magnitude_b = magnitude(b);

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0))
}

#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    ensure_same_len(a, b)?;
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt())
}

/// Scale to unit length. The zero vector comes back as a zero vector,
/// which callers treat as "no signal".
#[inline]
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let mag = magnitude(v);
    if mag == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / mag).collect()
}

#[inline]
pub fn add(a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    ensure_same_len(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x + y).collect())
}

#[inline]
pub fn subtract(a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    ensure_same_len(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x - y).collect())
}

#[inline]
pub fn scale(v: &[f32], factor: f32) -> Vec<f32> {
    v.iter().map(|x| x * factor).collect()
}

/// Weight-normalized average of the inputs.
///
/// When every weight is zero the zero-initialized accumulator is returned
/// unnormalized; guarding against that input is the caller's job.
#[inline]
pub fn weighted_average(inputs: &[WeightedVector]) -> Result<Vec<f32>> {
    let first = inputs
        .first()
        .ok_or_else(|| MatchError::InvalidInput("weighted average of no vectors".to_string()))?;
    let dimension = first.vector.len();

    let mut accumulator = vec![0.0_f32; dimension];
    let mut total_weight = 0.0_f32;

    for input in inputs {
        if input.vector.len() != dimension {
            return Err(MatchError::DimensionMismatch {
                expected: dimension,
                actual: input.vector.len(),
            });
        }
        if !input.weight.is_finite() || input.weight < 0.0 {
            return Err(MatchError::InvalidInput(format!(
                "weight must be finite and non-negative, got {}",
                input.weight
            )));
        }

        for (acc, value) in accumulator.iter_mut().zip(&input.vector) {
            *acc = value.mul_add(input.weight, *acc);
        }
        total_weight += input.weight;
    }

    if total_weight == 0.0 {
        return Ok(accumulator);
    }

    Ok(accumulator.into_iter().map(|x| x / total_weight).collect())
}

/// Unweighted mean of the given vectors
#[inline]
pub fn centroid(vectors: &[Vec<f32>]) -> Result<Vec<f32>> {
    let weighted: Vec<WeightedVector> = vectors
        .iter()
        .map(|v| WeightedVector::new(v.clone(), 1.0))
        .collect();
    weighted_average(&weighted)
}

/// A vector is usable when it has at least one component and every
/// component is finite
#[inline]
pub fn is_valid_vector(v: &[f32]) -> bool {
    !v.is_empty() && v.iter().all(|x| x.is_finite())
}

#[inline]
pub fn is_zero_vector(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 0.0)
}

/// Hash of the vector rounded to `precision` decimals, so near-duplicate
/// vectors share cache keys
#[inline]
pub fn hash_vector(v: &[f32], precision: u32) -> String {
    let factor = 10_f64.powi(precision as i32);
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(v.len() as u64).to_le_bytes());

    for value in v {
        let mut rounded = (f64::from(*value) * factor).round() / factor;
        if rounded == 0.0 {
            // fold -0.0 into 0.0
            rounded = 0.0;
        }
        hasher.update(&rounded.to_le_bytes());
    }

    hasher.finalize().to_hex().to_string()
}
