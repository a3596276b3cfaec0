use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use rlwe::{Ciphertext, Context, Plaintext, SecretKey};

const L: usize = 64;

fn random_values(ctx: &Context, bound: u64) -> Vec<u64> {
    let mut rng = rand::rng();
    (0..ctx.degree()).map(|_| rng.random_range(0..bound)).collect()
}

fn new_benchmark(c: &mut Criterion) {
    c.bench_function("new", |b| b.iter(|| Context::create().unwrap()));
}

fn encrypt_benchmark(c: &mut Criterion) {
    let ctx = Context::create().unwrap();
    let key = SecretKey::new(&ctx);
    let pt = Plaintext::from_values(&ctx, &random_values(&ctx, ctx.plaintext_modulus())).unwrap();

    c.bench_function("encrypt", |b| b.iter(|| key.encrypt(black_box(&pt))));

    let mut buf = vec![0u8; key.serialize_size_for(&pt).unwrap()];
    c.bench_function("encrypt_to_bytes", |b| {
        b.iter(|| key.encrypt_to_bytes(black_box(&pt), &mut buf))
    });
}

fn decrypt_benchmark(c: &mut Criterion) {
    let ctx = Context::create().unwrap();
    let key = SecretKey::new(&ctx);
    let ct = key
        .encrypt_slice(&random_values(&ctx, ctx.plaintext_modulus()))
        .unwrap();

    c.bench_function("decrypt", |b| b.iter(|| key.decrypt(black_box(&ct))));
}

fn multiply_plain_benchmark(c: &mut Criterion) {
    let ctx = Context::create().unwrap();
    let key = SecretKey::new(&ctx);
    let ct = key.encrypt_slice(&random_values(&ctx, 16)).unwrap();
    let pt = Plaintext::from_values(&ctx, &random_values(&ctx, 2)).unwrap();

    c.bench_function("multiply_plain", |b| {
        b.iter(|| {
            let mut x = ct.clone();
            x.multiply_plain(&ctx, black_box(&pt))
        })
    });

    let mut ct_ntt = ct.clone();
    ct_ntt.to_ntt(&ctx).unwrap();
    let mut pt_ntt = pt.clone();
    pt_ntt.to_ntt(&ctx).unwrap();

    c.bench_function("multiply_plain_ntt", |b| {
        b.iter(|| {
            let mut x = ct_ntt.clone();
            x.multiply_plain(&ctx, black_box(&pt_ntt))
        })
    });
}

fn inner_product_benchmark(c: &mut Criterion) {
    let ctx = Context::create().unwrap();
    let key = SecretKey::new(&ctx);
    let mut cts = Vec::with_capacity(L);
    let mut pts = Vec::with_capacity(L);
    for _ in 0..L {
        let mut ct = key.encrypt_slice(&random_values(&ctx, 16)).unwrap();
        ct.to_ntt(&ctx).unwrap();
        cts.push(ct);
        let mut pt = Plaintext::from_values(&ctx, &random_values(&ctx, 2)).unwrap();
        pt.to_ntt(&ctx).unwrap();
        pts.push(pt);
    }

    let mut out = Ciphertext::new();
    c.bench_function("inner_product", |b| {
        b.iter(|| out.set_inner_product(&ctx, black_box(&cts), black_box(&pts)))
    });
}

criterion_group!(
    benches,
    new_benchmark,
    encrypt_benchmark,
    decrypt_benchmark,
    multiply_plain_benchmark,
    inner_product_benchmark
);
criterion_main!(benches);
