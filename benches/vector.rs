use artisan_match::embeddings::HashEmbedder;
use artisan_match::vector::{WeightedVector, cosine_similarity, hash_vector, weighted_average};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const DIMENSION: usize = 768;

pub fn criterion_benchmark(c: &mut Criterion) {
    let embedder = HashEmbedder::new(DIMENSION);
    let profile = embedder.embed_text("master potter wheel thrown stoneware bowls");
    let skills = embedder.embed_text("glazing wheel throwing kiln firing");
    let portfolio = embedder.embed_text("rustic dinnerware priced 40 to 300 usd");

    c.bench_function("cosine_similarity", |b| {
        b.iter(|| cosine_similarity(black_box(&profile), black_box(&skills)))
    });

    c.bench_function("weighted_average", |b| {
        b.iter(|| {
            weighted_average(black_box(&[
                WeightedVector::new(profile.clone(), 0.4),
                WeightedVector::new(skills.clone(), 0.4),
                WeightedVector::new(portfolio.clone(), 0.2),
            ]))
        })
    });

    c.bench_function("hash_vector", |b| {
        b.iter(|| hash_vector(black_box(&profile), 4))
    });

    c.bench_function("hash_embed", |b| {
        b.iter(|| embedder.embed_text(black_box("hand woven wool rugs in traditional patterns")))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
