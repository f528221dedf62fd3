use gradcodec::{DataType, Tensor};

/// Deterministic pseudo-gradient with mixed signs, a zero, and a wide
/// magnitude range.
pub fn gradient(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            if i % 17 == 0 {
                0.0
            } else {
                let mag = ((i * 7919) % 1000) as f64 / 1000.0;
                let v = mag * mag * 3.0;
                if i % 3 == 0 { -v } else { v }
            }
        })
        .collect()
}

pub fn tensor(values: &[f64], shape: &[usize], dtype: DataType) -> Tensor {
    Tensor::from_values(values, shape, dtype).unwrap()
}

/// Assert every `|v| / scale` lies within `tol` of some level.
pub fn assert_levels(out: &[f64], scale: f64, levels: &[f64], tol: f64) {
    for &v in out {
        let y = v.abs() / scale;
        assert!(
            levels.iter().any(|l| (l - y).abs() <= tol),
            "{v} (normalized {y}) is not on the level set {levels:?}"
        );
    }
}
