use rayon::prelude::*;

use gradcodec::{CompressionDispatcher, CompressionParams, CompressorKind, DataType, Partition};

use super::helpers::{gradient, tensor};

#[test]
fn test_parameters_compress_concurrently() {
    // One shared dispatcher, one stream per parameter: the parallel run must
    // match a plain sequential loop bit for bit.
    let dispatcher = CompressionDispatcher::new(
        CompressionParams::new(CompressorKind::Dithering)
            .with_k(4)
            .with_partition(Partition::Natural)
            .with_seed(17),
    )
    .unwrap();
    let params: Vec<_> = (0..16)
        .map(|i| tensor(&gradient(100 + i * 10), &[100 + i * 10], DataType::F32))
        .collect();

    let run = |(i, t): (usize, &gradcodec::Tensor)| {
        let mut rng = dispatcher.rng_for_parameter(i as u64);
        (0..3)
            .map(|_| dispatcher.compress(t, &mut rng).unwrap())
            .collect::<Vec<_>>()
    };

    let sequential: Vec<_> = params.iter().enumerate().map(run).collect();
    let parallel: Vec<_> = params.par_iter().enumerate().map(run).collect();
    assert_eq!(sequential, parallel);
}
