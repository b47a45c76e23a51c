use criterion::{black_box, criterion_group, criterion_main, Criterion};
use soundmask::synthesis::{synthesize, SoundTexture};

const SAMPLE_RATE: f32 = 48_000.0;

fn bench_textures(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize_1s");
    for texture in SoundTexture::ALL {
        group.bench_function(texture.id(), |b| {
            b.iter(|| synthesize(black_box(texture), black_box(1.0), SAMPLE_RATE));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_textures);
criterion_main!(benches);
