use gradcodec::{
    CodecConfig, CompressionDispatcher, CompressionParams, CompressorKind, DataType,
    DeterministicRng, DitheringCompressor, NormalizeMode, Partition, Tensor, XorShift128Plus,
};

use super::helpers::{assert_levels, gradient, tensor};

fn dithering(k: u32, partition: Partition, normalize: NormalizeMode) -> CompressionDispatcher {
    CompressionDispatcher::new(
        CompressionParams::new(CompressorKind::Dithering)
            .with_k(k)
            .with_partition(partition)
            .with_normalize(normalize)
            .with_seed(7),
    )
    .unwrap()
}

#[test]
fn test_scenario_linear_k2_seed7() {
    let dispatcher = dithering(2, Partition::Linear, NormalizeMode::Max);
    let input = Tensor::from_f32(&[1.0, -0.5, 0.25, 0.0]);

    let mut rng = XorShift128Plus::new(7);
    let out = dispatcher.compress(&input, &mut rng).unwrap();
    for v in out.to_f32_vec() {
        assert!([0.0, 0.5, 1.0].contains(&v.abs()), "got {v}");
    }

    let mut replay = XorShift128Plus::new(7);
    let again = dispatcher.compress(&input, &mut replay).unwrap();
    assert_eq!(out.as_bytes(), again.as_bytes());
    assert_eq!(rng, replay);
}

#[test]
fn test_shape_and_dtype_preserved() {
    let values = gradient(24);
    for dtype in [DataType::F32, DataType::F64, DataType::F16, DataType::BF16] {
        for partition in [Partition::Linear, Partition::Natural] {
            let dispatcher = dithering(4, partition, NormalizeMode::L2);
            let input = tensor(&values, &[2, 3, 4], dtype);
            let mut rng = dispatcher.rng_for_parameter(0);
            let out = dispatcher.compress(&input, &mut rng).unwrap();
            assert_eq!(out.shape(), &[2, 3, 4]);
            assert_eq!(out.dtype(), dtype);
            assert_eq!(out.as_bytes().len(), input.as_bytes().len());
        }
    }
}

#[test]
fn test_linear_levels_f32() {
    let values = gradient(500);
    let input = tensor(&values, &[500], DataType::F32);
    let codec = DitheringCompressor::new(8, Partition::Linear, NormalizeMode::Max).unwrap();
    let scale = gradcodec::normalize::scale(&input, NormalizeMode::Max);
    let mut rng = XorShift128Plus::new(1);

    let out = gradcodec::Compressor::compress(&codec, &input, &mut rng).unwrap();
    assert_levels(&out.to_f64_vec(), scale, &codec.level_set(), 1e-6);
}

#[test]
fn test_natural_levels_f64_l2() {
    let values = gradient(500);
    let input = tensor(&values, &[500], DataType::F64);
    let codec = DitheringCompressor::new(6, Partition::Natural, NormalizeMode::L2).unwrap();
    let scale = NormalizeMode::L2.scale(&values);
    let mut rng = XorShift128Plus::new(2);

    let out = gradcodec::Compressor::compress(&codec, &input, &mut rng).unwrap();
    assert_levels(&out.to_f64_vec(), scale, &codec.level_set(), 1e-12);
}

#[test]
fn test_stream_persists_across_calls() {
    // A parameter's stream keeps advancing call after call; replaying from
    // the same starting state reproduces the whole sequence.
    let dispatcher = dithering(3, Partition::Natural, NormalizeMode::Max);
    let input = tensor(&gradient(64), &[64], DataType::F32);

    let mut rng = dispatcher.rng_for_parameter(3);
    let first = dispatcher.compress(&input, &mut rng).unwrap();
    let second = dispatcher.compress(&input, &mut rng).unwrap();
    assert_ne!(first.as_bytes(), second.as_bytes());

    let mut replay = dispatcher.rng_for_parameter(3);
    assert_eq!(dispatcher.compress(&input, &mut replay).unwrap(), first);
    assert_eq!(dispatcher.compress(&input, &mut replay).unwrap(), second);
}

#[test]
fn test_zero_tensor() {
    let dispatcher = dithering(4, Partition::Linear, NormalizeMode::L2);
    let input = Tensor::zeros(&[3, 3], DataType::F16);
    let mut rng = XorShift128Plus::new(9);
    let before = rng;
    let out = dispatcher.compress(&input, &mut rng).unwrap();
    assert_eq!(out, input);
    assert_eq!(rng, before);
}

#[test]
fn test_keyed_parallel_equals_sequential_cursor() {
    let params = CompressionParams::new(CompressorKind::Dithering)
        .with_k(4)
        .with_partition(Partition::Natural)
        .with_seed(99);
    let parallel = CompressionDispatcher::new(params.clone())
        .unwrap()
        .with_config(CodecConfig::always_parallel());
    let sequential = CompressionDispatcher::new(params)
        .unwrap()
        .with_config(CodecConfig::sequential());

    let input = tensor(&gradient(10_000), &[100, 100], DataType::F32);
    let keyed = parallel.keyed_rng_for_parameter(4);

    let a = parallel.compress_keyed(&input, &keyed).unwrap();
    let b = sequential.compress_keyed(&input, &keyed).unwrap();
    let c = sequential.compress(&input, &mut keyed.cursor()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);
}

#[test]
fn test_keyed_single_element_recompute() {
    // Any element's draw can be recomputed without replaying earlier ones.
    let keyed = gradcodec::KeyedRng::new(5, 1);
    let mut cursor = keyed.cursor();
    cursor.skip(1234);
    assert_eq!(cursor.draw_uniform(), keyed.uniform_at(1234));
}

#[test]
fn test_default_seed_first_parameter_unbiased() {
    let dispatcher = CompressionDispatcher::new(
        CompressionParams::new(CompressorKind::Dithering)
            .with_k(1)
            .with_partition(Partition::Linear),
    )
    .unwrap();
    assert_eq!(dispatcher.params().seed(), 0);
    let input = tensor(&[0.01, 1.0], &[2], DataType::F64);
    let mut rng = dispatcher.rng_for_parameter(0);

    let rounds = 2000;
    let mut sum = 0.0;
    for _ in 0..rounds {
        sum += dispatcher.compress(&input, &mut rng).unwrap().to_f64_vec()[0];
    }
    let mean = sum / rounds as f64;
    assert!((mean - 0.01).abs() < 0.01, "mean {mean}");
}
