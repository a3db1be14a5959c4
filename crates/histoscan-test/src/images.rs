//! Synthetic inputs and the naive reference histogram
//!
//! All random generators are seeded so every run sees the same pixels.

use histoscan_core::{ImageView, MaskView, Sample};
use rand::SeedableRng;
use rand::distr::uniform::SampleUniform;
use rand::distr::{Bernoulli, Distribution, Uniform};
use rand::rngs::StdRng;

use crate::error::{TestError, TestResult};

/// Odd multiplier; `i * SCRAMBLE mod 2^k` permutes `0..2^k`.
const SCRAMBLE: usize = 7919;

/// `len` samples drawn uniformly from `[0, max_value]`.
///
/// # Arguments
///
/// * `len` - Number of samples
/// * `max_value` - Largest value to generate
/// * `seed` - RNG seed
pub fn random_samples<T>(len: usize, max_value: T, seed: u64) -> TestResult<Vec<T>>
where
    T: Sample + SampleUniform + From<u8>,
{
    let dist = Uniform::new_inclusive(T::from(0u8), max_value)
        .map_err(|e| TestError::Generator(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok((0..len).map(|_| dist.sample(&mut rng)).collect())
}

/// A mask of `len` values where each position is included with
/// probability `density`.
///
/// Included positions carry assorted nonzero values, not just 1.
pub fn random_mask(len: usize, density: f64, seed: u64) -> TestResult<Vec<u8>> {
    let dist = Bernoulli::new(density).map_err(|e| TestError::Generator(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok((0..len)
        .map(|i| {
            if dist.sample(&mut rng) {
                (i % 255 + 1) as u8
            } else {
                0
            }
        })
        .collect())
}

/// `len` copies of `value`.
pub fn constant_samples<T: Sample>(len: usize, value: T) -> Vec<T> {
    vec![value; len]
}

/// Every 8-bit value exactly `repeats` times, in scrambled order.
pub fn all_values_u8(repeats: usize) -> Vec<u8> {
    (0..256 * repeats)
        .map(|i| ((i * SCRAMBLE) % 256) as u8)
        .collect()
}

/// Every `bits`-bit value exactly `repeats` times, in scrambled order.
///
/// # Panics
///
/// Panics if `bits > 16`.
pub fn all_values_u16(bits: u32, repeats: usize) -> Vec<u16> {
    assert!(bits <= 16, "bits must be <= 16");
    let n = 1usize << bits;
    (0..n * repeats)
        .map(|i| ((i * SCRAMBLE) % n) as u16)
        .collect()
}

/// Count samples pixel by pixel with no striping or threading.
///
/// The result has one row of `bins` per entry of `components`. Samples
/// `>= bins` are not counted.
pub fn reference_histogram<T: Sample>(
    image: &ImageView<'_, T>,
    mask: Option<&MaskView<'_>>,
    components: &[usize],
    bins: usize,
) -> Vec<u32> {
    let mut out = vec![0u32; components.len() * bins];
    for row in 0..image.height() {
        for col in 0..image.width() {
            if mask.is_some_and(|m| !m.is_included(row, col)) {
                continue;
            }
            for (i, &c) in components.iter().enumerate() {
                let value = image.sample(row, col, c).to_index();
                if value < bins {
                    out[i * bins + value] += 1;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_samples_bounded_and_seeded() {
        let a = random_samples(1000, 4095u16, 7).unwrap();
        let b = random_samples(1000, 4095u16, 7).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|&v| v <= 4095));
    }

    #[test]
    fn test_random_mask_density() {
        let all = random_mask(100, 1.0, 1).unwrap();
        assert!(all.iter().all(|&v| v != 0));
        let none = random_mask(100, 0.0, 1).unwrap();
        assert!(none.iter().all(|&v| v == 0));
        assert!(random_mask(10, 1.5, 1).is_err());
    }

    #[test]
    fn test_all_values_is_permutation() {
        let mut values = all_values_u16(12, 1);
        values.sort_unstable();
        assert!(values.iter().enumerate().all(|(i, &v)| v as usize == i));

        let bytes = all_values_u8(3);
        assert_eq!(bytes.iter().filter(|&&v| v == 200).count(), 3);
    }

    #[test]
    fn test_reference_histogram() {
        let data = [0u8, 1, 2, 3];
        let mask_data = [1u8, 0, 1, 0];
        let image = ImageView::from_shape(&data, &[2, 2]).unwrap();
        let mask = MaskView::new(&mask_data, 2, 2).unwrap();
        let counts = reference_histogram(&image, Some(&mask), &[0], 4);
        assert_eq!(counts, vec![1, 0, 1, 0]);
    }
}
