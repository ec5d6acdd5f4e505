//! Per-call cost of the enabled process path at typical host buffer sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use audioshift::effect::abi::{EffectConfig, AUDIO_CHANNEL_OUT_STEREO};
use audioshift::{EffectInstance, SineGenerator};

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_stereo_48k");
    for &frames in &[480usize, 1024, 8192] {
        let mut fx = EffectInstance::new().unwrap();
        fx.set_config(EffectConfig::pcm16(48000, AUDIO_CHANNEL_OUT_STEREO))
            .unwrap();
        fx.enable().unwrap();

        let input = SineGenerator::new(440.0, 48000, 2, 0.5)
            .unwrap()
            .generate_pcm16(frames);
        let mut output = vec![0i16; input.len()];
        // Past priming so every call runs full WSOLA sequences.
        for _ in 0..16 {
            fx.process(&input, &mut output).unwrap();
        }

        group.throughput(Throughput::Elements(frames as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, _| {
            b.iter(|| {
                fx.process(black_box(&input), black_box(&mut output)).unwrap();
            })
        });
    }
    group.finish();
}

fn bench_passthrough(c: &mut Criterion) {
    let mut fx = EffectInstance::new().unwrap();
    fx.set_config(EffectConfig::pcm16(48000, AUDIO_CHANNEL_OUT_STEREO))
        .unwrap();
    let input = vec![1000i16; 8192 * 2];
    let mut output = vec![0i16; input.len()];
    c.bench_function("passthrough_8192", |b| {
        b.iter(|| {
            fx.process(black_box(&input), black_box(&mut output)).unwrap();
        })
    });
}

criterion_group!(benches, bench_process, bench_passthrough);
criterion_main!(benches);
