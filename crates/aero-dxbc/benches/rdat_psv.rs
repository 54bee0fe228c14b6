#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use aero_dxbc::test_utils::{sample_psv, sample_rdat_v2};
#[cfg(not(target_arch = "wasm32"))]
use aero_dxbc::{parse_psv_chunk, parse_rdat_chunk, write_psv_chunk, write_rdat_chunk, PsvVersion};
#[cfg(not(target_arch = "wasm32"))]
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

#[cfg(not(target_arch = "wasm32"))]
fn bench_rdat(c: &mut Criterion) {
    // Repeat the library so the dedup maps see realistic hit rates.
    let mut data = sample_rdat_v2();
    let base = data.clone();
    for _ in 0..32 {
        data.resources.extend(base.resources.iter().cloned());
        data.functions.extend(base.functions.iter().cloned());
        data.subobjects.extend(base.subobjects.iter().cloned());
    }
    let bytes = write_rdat_chunk(&data).unwrap();

    let mut group = c.benchmark_group("rdat");
    group.bench_function("write", |b| {
        b.iter(|| black_box(write_rdat_chunk(black_box(&data)).unwrap().len()))
    });
    group.bench_function("parse", |b| {
        b.iter(|| black_box(parse_rdat_chunk(black_box(&bytes)).unwrap().functions.len()))
    });
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_psv(c: &mut Criterion) {
    let mut group = c.benchmark_group("psv");
    for version in [PsvVersion::V0, PsvVersion::V1, PsvVersion::V3] {
        let data = sample_psv(version);
        let bytes = write_psv_chunk(&data).unwrap();
        let name = format!("{version:?}");
        group.bench_with_input(BenchmarkId::new("write", &name), &data, |b, data| {
            b.iter(|| black_box(write_psv_chunk(black_box(data)).unwrap().len()))
        });
        group.bench_with_input(BenchmarkId::new("parse", &name), &bytes, |b, bytes| {
            b.iter(|| black_box(parse_psv_chunk(black_box(bytes)).unwrap().resources.len()))
        });
    }
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
criterion_group!(benches, bench_rdat, bench_psv);
#[cfg(not(target_arch = "wasm32"))]
criterion_main!(benches);
