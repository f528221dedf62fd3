//! Compress a synthetic gradient with the codec selected on the command line
//! and report how far the averaged reconstruction is from the input.
//!
//! Hyper-parameters are passed as `key=value` arguments (default
//! `compressor=dithering k=4`); tuning knobs come from `GRADCODEC_*`
//! environment variables:
//!
//! ```bash
//! RUST_LOG=gradcodec=debug GRADCODEC_PARALLEL_MIN_ELEMS=256 \
//!     cargo run --example compress -- compressor=dithering k=4 partition=natural
//! ```

use gradcodec::{CodecConfig, CompressionDispatcher, Kwargs, Tensor, serialize_kwargs};
use tracing_subscriber::EnvFilter;

fn main() -> gradcodec::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut kwargs: Kwargs = std::env::args()
        .skip(1)
        .filter_map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect();
    kwargs.entry("compressor".into()).or_insert_with(|| "dithering".into());
    kwargs.entry("k".into()).or_insert_with(|| "4".into());

    let dispatcher =
        CompressionDispatcher::from_kwargs(&kwargs)?.with_config(CodecConfig::from_env());
    println!("config: {}", serialize_kwargs(&dispatcher.params().to_kwargs())?);

    let count = 1024;
    let values: Vec<f64> = (0..count)
        .map(|i| ((i as f64) * 0.113).sin() * (-(i as f64) / 400.0).exp())
        .collect();
    let input = Tensor::from_values(&values, &[32, 32], dispatcher.params().element_type())?;

    // Average several rounds from one parameter stream to show the
    // reconstruction converging on the input.
    let rounds = 64;
    let mut rng = dispatcher.rng_for_parameter(0);
    let mut mean = vec![0.0; count];
    for _ in 0..rounds {
        let out = dispatcher.compress(&input, &mut rng)?.to_f64_vec();
        for (m, v) in mean.iter_mut().zip(out) {
            *m += v / rounds as f64;
        }
    }

    let reference = input.to_f64_vec();
    let max_err = mean
        .iter()
        .zip(&reference)
        .map(|(m, x)| (m - x).abs())
        .fold(0.0f64, f64::max);
    let (a, b) = rng.state();
    println!(
        "{}: {rounds} rounds, max |mean - x| = {max_err:.5}, stream state = ({a:#x}, {b:#x})",
        dispatcher.compressor().name()
    );

    // The keyed path may fan out across threads but must match its cursor.
    let keyed = dispatcher.keyed_rng_for_parameter(0);
    let fanned = dispatcher.compress_keyed(&input, &keyed)?;
    let walked = dispatcher.compress(&input, &mut keyed.cursor())?;
    println!(
        "keyed pass (parallel from {} elements) matches cursor: {}",
        dispatcher.config().parallel_min_elems,
        fanned == walked
    );
    Ok(())
}
