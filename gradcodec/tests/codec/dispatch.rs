use gradcodec::{
    CodecError, CompressionDispatcher, CompressionParams, CompressorKind, Kwargs, Tensor,
    XorShift128Plus, build_compressor, deserialize_kwargs, serialize_kwargs,
};

fn kwargs(pairs: &[(&str, &str)]) -> Kwargs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_from_kwargs_routes_dithering() {
    let dispatcher = CompressionDispatcher::from_kwargs(&kwargs(&[
        ("compressor", "dithering"),
        ("k", "2"),
        ("partition", "natural"),
        ("normalize", "l2"),
        ("seed", "11"),
    ]))
    .unwrap();
    assert_eq!(dispatcher.compressor().name(), "dithering");
    assert_eq!(dispatcher.params().seed(), 11);
}

#[test]
fn test_serialized_config_reaches_same_output() {
    // Worker and server build their dispatchers from the same serialized
    // hyper-parameters and must reconstruct identical tensors.
    let params = CompressionParams::new(CompressorKind::Dithering)
        .with_k(4)
        .with_seed(2020)
        .with_ef("vanilla");
    let line = serialize_kwargs(&params.to_kwargs()).unwrap();
    let worker = CompressionDispatcher::new(params).unwrap();
    let server = CompressionDispatcher::from_kwargs(&deserialize_kwargs(&line).unwrap()).unwrap();
    assert_eq!(server.params(), worker.params());

    let input = Tensor::from_f32(&[0.1, -0.2, 0.3, -0.4, 0.5]);
    let a = worker.compress(&input, &mut worker.rng_for_parameter(2)).unwrap();
    let b = server.compress(&input, &mut server.rng_for_parameter(2)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_invalid_configs() {
    let cases: [(Kwargs, fn(&CodecError) -> bool); 6] = [
        (
            kwargs(&[("compressor", "dithering"), ("k", "0")]),
            |e: &CodecError| matches!(e, CodecError::NonPositiveK { .. }),
        ),
        (
            kwargs(&[("compressor", "randomk"), ("k", "0")]),
            |e: &CodecError| matches!(e, CodecError::NonPositiveK { .. }),
        ),
        (
            kwargs(&[("compressor", "dithering")]),
            |e: &CodecError| matches!(e, CodecError::MissingParam { name: "k", .. }),
        ),
        (
            kwargs(&[("compressor", "powersgd"), ("k", "1")]),
            |e: &CodecError| matches!(e, CodecError::UnknownCompressor(_)),
        ),
        (
            kwargs(&[("compressor", "dithering"), ("k", "2"), ("normalize", "l1")]),
            |e: &CodecError| matches!(e, CodecError::UnknownNormalize(_)),
        ),
        (
            kwargs(&[("compressor", "dithering"), ("k", "40"), ("partition", "natural")]),
            |e: &CodecError| matches!(e, CodecError::KTooLarge { .. }),
        ),
    ];
    for (kw, check) in cases {
        let err = CompressionDispatcher::from_kwargs(&kw).err().unwrap();
        assert!(err.is_configuration(), "{err}");
        assert!(check(&err), "unexpected error {err:?} for {kw:?}");
    }
}

#[test]
fn test_deterministic_kinds_leave_stream_untouched() {
    let input = Tensor::from_f32(&[3.0, -1.0, 0.5, 2.0]);
    for kind in [CompressorKind::None, CompressorKind::OneBit, CompressorKind::TopK] {
        let compressor = build_compressor(&CompressionParams::new(kind).with_k(2)).unwrap();
        let mut rng = XorShift128Plus::new(4);
        let before = rng;
        let out = compressor.compress(&input, &mut rng).unwrap();
        assert_eq!(out.shape(), input.shape());
        assert_eq!(rng, before, "{kind} consumed randomness");
    }
}

#[test]
fn test_buffer_errors_are_not_configuration() {
    let err = Tensor::new(vec![0u8; 6], vec![2, 2], gradcodec::DataType::F16).unwrap_err();
    assert!(!err.is_configuration());
    assert!(matches!(
        err,
        CodecError::BufferSizeMismatch {
            expected: 8,
            actual: 6
        }
    ));
}
