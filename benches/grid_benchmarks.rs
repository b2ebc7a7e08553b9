//! Performance Benchmarks for CIPHERGRID Primitives
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ciphergrid_ahe::{Ciphertext, MaskKey};
use ciphergrid_core::DensityGrid;
use ciphergrid_oracle::{
    decode_cleartexts, encode_cleartexts, CommitteeVerifier, OracleCommittee, ProofVerifier,
    RequestId,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn rng() -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(0xC1F4E9)
}

// =============================================================================
// MASKING SCHEME BENCHMARKS
// =============================================================================

fn bench_encrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheme_encrypt");
    let key = MaskKey::generate(&mut rng());
    let mut rng = rng();

    group.bench_function("single_value", |b| b.iter(|| key.encrypt(42, &mut rng)));

    group.finish();
}

fn bench_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheme_decrypt");
    let key = MaskKey::generate(&mut rng());
    let mut rng = rng();

    // Decryption walks every pad, so cost scales with the number of
    // ciphertexts summed into the value
    for pads in [1usize, 8, 64] {
        let mut ct = key.encrypt(1, &mut rng);
        for _ in 1..pads {
            ct += &key.encrypt(1, &mut rng);
        }

        group.throughput(Throughput::Elements(pads as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pads), &ct, |b, ct| {
            b.iter(|| key.decrypt(ct))
        });
    }

    group.finish();
}

fn bench_ciphertext_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheme_add");
    let key = MaskKey::generate(&mut rng());
    let mut rng = rng();
    let a = key.encrypt(7, &mut rng);
    let b_ct = key.encrypt(35, &mut rng);

    group.bench_function("fresh_pair", |b| b.iter(|| &a + &b_ct));

    group.finish();
}

fn bench_handle_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheme_handle_encode");
    let key = MaskKey::generate(&mut rng());
    let ct = key.encrypt(42, &mut rng());

    group.bench_function("single", |b| b.iter(|| ct.to_handle().unwrap()));

    group.finish();
}

fn bench_handle_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheme_handle_decode");
    let key = MaskKey::generate(&mut rng());
    let handle = key.encrypt(42, &mut rng()).to_handle().unwrap();

    group.bench_function("single", |b| b.iter(|| Ciphertext::from_handle(&handle).unwrap()));

    group.finish();
}

// =============================================================================
// DENSITY GRID BENCHMARKS
// =============================================================================

fn bench_grid_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_allocate");

    for resolution in [10u32, 25, 50] {
        group.throughput(Throughput::Elements(u64::from(resolution).pow(3)));
        group.bench_with_input(
            BenchmarkId::from_parameter(resolution),
            &resolution,
            |b, resolution| {
                b.iter(|| {
                    let mut grid = DensityGrid::new();
                    grid.allocate(*resolution).unwrap();
                    grid
                })
            },
        );
    }

    group.finish();
}

fn bench_grid_accumulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_accumulate");

    let mut grid = DensityGrid::new();
    grid.allocate(10).unwrap();
    let value = Ciphertext::trivial(3);

    group.bench_function("trivial_value", |b| {
        b.iter(|| grid.accumulate(123, 456, 789, &value))
    });

    group.finish();
}

fn bench_grid_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_flatten");

    for resolution in [4u32, 8, 16] {
        let mut grid = DensityGrid::new();
        grid.allocate(resolution).unwrap();
        for i in 0..resolution {
            grid.accumulate(i, i, i, &Ciphertext::trivial(i));
        }

        group.throughput(Throughput::Elements(u64::from(resolution).pow(3)));
        group.bench_with_input(BenchmarkId::from_parameter(resolution), &grid, |b, grid| {
            b.iter(|| grid.flatten_for_reveal().unwrap())
        });
    }

    group.finish();
}

// =============================================================================
// ORACLE BENCHMARKS
// =============================================================================

fn bench_encode_cleartexts(c: &mut Criterion) {
    let mut group = c.benchmark_group("oracle_encode");

    for words in [64usize, 512, 4096] {
        let values: Vec<u32> = (0..words as u32).collect();

        group.throughput(Throughput::Bytes((words * 4) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(words), &values, |b, values| {
            b.iter(|| encode_cleartexts(values))
        });
    }

    group.finish();
}

fn bench_decode_cleartexts(c: &mut Criterion) {
    let mut group = c.benchmark_group("oracle_decode");

    for words in [64usize, 512, 4096] {
        let payload = encode_cleartexts(&(0..words as u32).collect::<Vec<_>>());

        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(words),
            &payload,
            |b, payload| b.iter(|| decode_cleartexts(payload).unwrap()),
        );
    }

    group.finish();
}

fn bench_committee_sign(c: &mut Criterion) {
    let mut group = c.benchmark_group("oracle_sign");
    group.sample_size(20);

    let payload = encode_cleartexts(&(0..1024).collect::<Vec<_>>());

    for (n, t) in [(3usize, 2usize), (5, 3), (7, 5)] {
        let committee = OracleCommittee::generate(n, t, &mut rng()).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_of_{}", t, n)),
            &committee,
            |b, committee| b.iter(|| committee.sign(RequestId::new(1), &payload).unwrap()),
        );
    }

    group.finish();
}

fn bench_proof_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("oracle_verify");
    group.sample_size(20);

    let payload = encode_cleartexts(&(0..1024).collect::<Vec<_>>());

    for (n, t) in [(3usize, 2usize), (5, 3), (7, 5)] {
        let committee = OracleCommittee::generate(n, t, &mut rng()).unwrap();
        let verifier = CommitteeVerifier::new(committee.public());
        let proof = committee.sign(RequestId::new(1), &payload).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_of_{}", t, n)),
            &proof,
            |b, proof| b.iter(|| verifier.verify(RequestId::new(1), &payload, proof)),
        );
    }

    group.finish();
}

// =============================================================================
// BENCHMARK GROUPS
// =============================================================================

criterion_group!(
    scheme,
    bench_encrypt,
    bench_decrypt,
    bench_ciphertext_add,
    bench_handle_encode,
    bench_handle_decode,
);

criterion_group!(
    grid,
    bench_grid_allocate,
    bench_grid_accumulate,
    bench_grid_flatten,
);

criterion_group!(
    oracle,
    bench_encode_cleartexts,
    bench_decode_cleartexts,
    bench_committee_sign,
    bench_proof_verify,
);

criterion_main!(scheme, grid, oracle);
