extern crate bfscriptlib;
extern crate criterion;
extern crate tempfile;

use criterion::{criterion_group, criterion_main, Benchmark, Criterion};
use tempfile::NamedTempFile;

use bfscriptlib::backend::bf::BfBackend;
use bfscriptlib::interpreter::{MachineOptions, TapeMachine};

fn pyramid_benchmark(c: &mut Criterion) {
    let bfsfile = "ctest_pyramid.bfs";
    c.bench(
        bfsfile,
        Benchmark::new("compile", move |b| {
            b.iter(|| {
                let outpath = String::from(
                    NamedTempFile::new()
                        .unwrap()
                        .path()
                        .to_str()
                        .expect("valid tempfile path"),
                );
                bfscriptlib::compile(
                    &format!("bfs_programs/{}", bfsfile)[..],
                    Box::new(BfBackend::default()),
                    false,
                    Some(outpath),
                )
            })
        })
        .with_function("compile_and_run", move |b| {
            b.iter(|| {
                let outpath = String::from(
                    NamedTempFile::new()
                        .unwrap()
                        .path()
                        .to_str()
                        .expect("valid tempfile path"),
                );
                bfscriptlib::compile(
                    &format!("bfs_programs/{}", bfsfile)[..],
                    Box::new(BfBackend::default()),
                    false,
                    Some(outpath.clone()),
                )
                .expect("compilation succeeds");
                let program = std::fs::read_to_string(&outpath).expect("program is readable");
                let mut machine =
                    TapeMachine::new(&program[..], &MachineOptions::default()).unwrap();
                machine.run().expect("execution succeeds");
                machine.output().to_vec()
            })
        })
        .sample_size(20),
    );
}

criterion_group!(benches, pyramid_benchmark);
criterion_main!(benches);
