use std::fs;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use csv_db_loader::db::DatabaseConnection;
use csv_db_loader::error::DatabaseError;
use csv_db_loader::ingestion::format_record;
use csv_db_loader::loader::BatchLoader;
use csv_db_loader::types::{DbType, LoaderConfig, Record};

/// Accepts every batch without doing any work.
struct NullConnection;

impl DatabaseConnection for NullConnection {
    fn db_type(&self) -> DbType {
        DbType::Postgres
    }

    fn execute_batch(&mut self, _table: &str, _columns: &[String], rows: &[Record]) -> Result<u64, DatabaseError> {
        Ok(black_box(rows.len()) as u64)
    }

    fn truncate(&mut self, _table: &str) -> Result<(), DatabaseError> {
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DatabaseError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

fn bench_format_record(c: &mut Criterion) {
    let row: &[&str] = &["  \"Full Name\" ", " 42 ", "2019-01-01", "  some free text, quoted  "];
    c.bench_function("format_record/data_row", |b| b.iter(|| format_record(black_box(row), false)));
    c.bench_function("format_record/header_row", |b| b.iter(|| format_record(black_box(row), true)));
}

fn bench_load_file(c: &mut Criterion) {
    const ROWS: usize = 50_000;
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bench.csv");
    let mut content = String::from("id,name,amount,created at\n");
    for i in 0..ROWS {
        content.push_str(&format!("{i},\"name {i}\",{}.5,2019-01-{:02}\n", i % 1000, i % 28 + 1));
    }
    fs::write(&path, content).expect("write bench file");

    let mut group = c.benchmark_group("load_file");
    group.throughput(Throughput::Elements(ROWS as u64));
    for batch_size in [1_000, 10_000] {
        group.bench_function(format!("batch_size={batch_size}"), |b| {
            b.iter_batched(
                || LoaderConfig {
                    batch_size,
                    ..LoaderConfig::for_table("bench")
                },
                |cfg| {
                    let mut conn = NullConnection;
                    BatchLoader::new(&mut conn, cfg)
                        .expect("valid config")
                        .load_file(&path)
                        .expect("load")
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_format_record, bench_load_file);
criterion_main!(benches);
