//! 콘텐츠 cataloger 벤치마크
//!
//! 디렉토리 소스에 대한 glob 매칭 + base64 수집 성능을 파일 수 /
//! 파일 크기별로 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use drydock_cataloger::{Cataloger, ContentsCataloger};
use drydock_source::DirectoryResolver;

fn fixture_dir(file_count: usize, file_size: usize) -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().unwrap();
    let payload = vec![0x5au8; file_size];
    for i in 0..file_count {
        std::fs::write(dir.path().join(format!("file-{i}.txt")), &payload).unwrap();
    }
    dir
}

fn bench_catalog_by_file_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("contents_by_file_count");
    for file_count in [10, 100, 500] {
        let dir = fixture_dir(file_count, 256);
        let resolver = DirectoryResolver::new(dir.path().to_path_buf());
        let cataloger = ContentsCataloger::new(vec!["**/*.txt".to_owned()], 0);

        group.bench_with_input(
            BenchmarkId::from_parameter(file_count),
            &file_count,
            |b, _| {
                b.iter(|| cataloger.catalog(&resolver).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_catalog_by_file_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("contents_by_file_size");
    for file_size in [1usize << 10, 1 << 16, 1 << 20] {
        let dir = fixture_dir(8, file_size);
        let resolver = DirectoryResolver::new(dir.path().to_path_buf());
        let cataloger = ContentsCataloger::new(vec!["**/*.txt".to_owned()], 0);

        group.throughput(Throughput::Bytes(8 * file_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(file_size),
            &file_size,
            |b, _| {
                b.iter(|| cataloger.catalog(&resolver).unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_catalog_by_file_count, bench_catalog_by_file_size);
criterion_main!(benches);
