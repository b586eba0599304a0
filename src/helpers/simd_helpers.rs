#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    _mm256_add_pd, _mm256_loadu_pd, _mm256_mul_pd, _mm256_set1_pd, _mm256_setzero_pd,
    _mm256_storeu_pd, _mm256_sub_pd,
};

/// Sum of an f64 slice using AVX2 or scalar fallback
pub fn sum_f64(values: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { sum_f64_avx2(values) };
        }
    }
    values.iter().sum()
}

/// Sum of `(v - mean)^2` using AVX2 or scalar fallback
pub fn sum_squared_deviations(values: &[f64], mean: f64) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { sum_squared_deviations_avx2(values, mean) };
        }
    }
    values.iter().map(|v| (v - mean) * (v - mean)).sum()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_f64_avx2(values: &[f64]) -> f64 {
    const LANES: usize = 4; // __m256d holds 4 f64s
    let mut sum = _mm256_setzero_pd();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        sum = _mm256_add_pd(sum, v);
    }

    // horizontal reduction
    let mut sum_arr = [0f64; LANES];
    unsafe { _mm256_storeu_pd(sum_arr.as_mut_ptr(), sum) };

    sum_arr.iter().sum::<f64>() + remainder.iter().sum::<f64>()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_squared_deviations_avx2(values: &[f64], mean: f64) -> f64 {
    const LANES: usize = 4;
    let mut sum = _mm256_setzero_pd();
    let centre = _mm256_set1_pd(mean);

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        let d = _mm256_sub_pd(v, centre);
        sum = _mm256_add_pd(sum, _mm256_mul_pd(d, d));
    }

    let mut sum_arr = [0f64; LANES];
    unsafe { _mm256_storeu_pd(sum_arr.as_mut_ptr(), sum) };

    let tail: f64 = remainder.iter().map(|v| (v - mean) * (v - mean)).sum();
    sum_arr.iter().sum::<f64>() + tail
}
