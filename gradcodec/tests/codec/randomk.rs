use gradcodec::{
    CodecError, CompressionDispatcher, CompressionParams, CompressorKind, DataType, Sampling,
    Tensor, XorShift128Plus,
};

use super::helpers::{gradient, tensor};

fn randomk(k: u32) -> CompressionDispatcher {
    CompressionDispatcher::new(
        CompressionParams::new(CompressorKind::RandomK)
            .with_k(k)
            .with_seed(3),
    )
    .unwrap()
}

#[test]
fn test_scenario_n4_k2_seed3() {
    let dispatcher = randomk(2);
    let values = [0.5f32, -1.5, 2.0, 4.0];
    let input = Tensor::from_f32(&values);
    let mut rng = XorShift128Plus::new(3);

    let out = dispatcher.compress(&input, &mut rng).unwrap().to_f32_vec();
    let nonzero: Vec<usize> = (0..4).filter(|&i| out[i] != 0.0).collect();
    assert_eq!(nonzero.len(), 2);
    for i in nonzero {
        assert_eq!(out[i], values[i] * 2.0);
    }
}

#[test]
fn test_cardinality_and_mass() {
    let values: Vec<f64> = gradient(200).into_iter().map(|v| v + 0.01).collect();
    let input = tensor(&values, &[10, 20], DataType::F64);
    let dispatcher = randomk(25);
    let mut rng = dispatcher.rng_for_parameter(0);

    let out = dispatcher.compress(&input, &mut rng).unwrap().to_f64_vec();
    let kept: Vec<usize> = (0..out.len()).filter(|&i| out[i] != 0.0).collect();
    assert!(kept.len() <= 25);

    let scale = 200.0 / 25.0;
    let sampled_mass: f64 = kept.iter().map(|&i| values[i].abs()).sum();
    let out_mass: f64 = out.iter().map(|v| v.abs()).sum();
    assert!((out_mass - scale * sampled_mass).abs() < 1e-9);
}

#[test]
fn test_with_replacement_at_most_k() {
    let dispatcher = CompressionDispatcher::new(
        CompressionParams::new(CompressorKind::RandomK)
            .with_k(8)
            .with_sampling(Sampling::WithReplacement),
    )
    .unwrap();
    let input = Tensor::from_f32(&[1.0; 10]);
    let mut rng = XorShift128Plus::new(12);
    let out = dispatcher.compress(&input, &mut rng).unwrap().to_f32_vec();
    let kept = out.iter().filter(|&&v| v != 0.0).count();
    assert!((1..=8).contains(&kept));
    for v in out {
        assert!(v == 0.0 || v == 1.25);
    }
}

#[test]
fn test_k_exceeds_length() {
    let dispatcher = randomk(5);
    let input = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0]);
    let mut rng = XorShift128Plus::new(3);
    let err = dispatcher.compress(&input, &mut rng).unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, CodecError::KExceedsLength { k: 5, len: 4, .. }));
}

#[test]
fn test_deterministic_across_dispatchers() {
    let input = tensor(&gradient(300), &[300], DataType::F16);
    let a = randomk(30);
    let b = randomk(30);
    let out_a = a.compress(&input, &mut a.rng_for_parameter(9)).unwrap();
    let out_b = b.compress(&input, &mut b.rng_for_parameter(9)).unwrap();
    assert_eq!(out_a.as_bytes(), out_b.as_bytes());
}

#[test]
fn test_default_seed_first_parameter_varies_selection() {
    // Seed 0 is the default; the stream for parameter 0 must still mix.
    let dispatcher =
        CompressionDispatcher::new(CompressionParams::new(CompressorKind::RandomK).with_k(2))
            .unwrap();
    assert_eq!(dispatcher.params().seed(), 0);
    let input = Tensor::from_f32(&[1.0; 8]);
    let mut rng = dispatcher.rng_for_parameter(0);

    let mut kept = [0usize; 8];
    for _ in 0..1000 {
        let out = dispatcher.compress(&input, &mut rng).unwrap().to_f32_vec();
        for (count, v) in kept.iter_mut().zip(out) {
            if v != 0.0 {
                *count += 1;
            }
        }
    }
    for (i, count) in kept.iter().enumerate() {
        assert!((150..350).contains(count), "index {i} kept {count} times");
    }
}
