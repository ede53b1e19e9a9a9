use std::path::{Path, PathBuf};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kaldiprep::collation::Collation;
use kaldiprep::processing::ArchiveIndexer;

const NB_ARCHIVES: usize = 16;
const NB_MEMBERS: usize = 500;

// bench protocol:
//
// NB_ARCHIVES archives of NB_MEMBERS small members each, indexed with
// an increasing number of jobs. Only listing and sorting is measured.
fn build_archives(dir: &Path) -> Vec<PathBuf> {
    (0..NB_ARCHIVES)
        .map(|i| {
            let path = dir.join(format!("{}.tar", i));
            let mut builder = tar::Builder::new(std::fs::File::create(&path).unwrap());
            for j in 0..NB_MEMBERS {
                let data = vec![0u8; 64 + j % 512];
                let mut header = tar::Header::new_gnu();
                header.set_size(data.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder
                    .append_data(&mut header, format!("spk{}/utt {}.flac", i, j), data.as_slice())
                    .unwrap();
            }
            builder.finish().unwrap();
            path
        })
        .collect()
}

pub fn index_archives(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let archives = build_archives(dir.path());

    let mut group = c.benchmark_group("index archives");
    for nj in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(nj), &nj, |b, &nj| {
            let indexer = ArchiveIndexer::new(archives.clone(), nj).unwrap();
            b.iter(|| black_box(indexer.collect(&Collation::Bytes).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, index_archives);
criterion_main!(benches);
