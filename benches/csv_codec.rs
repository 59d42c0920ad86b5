//! Benchmarks for the CSV codec.
//!
//! Measures decode and encode throughput over generated ticket exports of
//! increasing size, with and without embedded quotes and newlines.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use impex::backends::csv::codec::{decode, encode};
use impex::backends::csv::{ColumnSeparator, CsvSettings};
use impex::models::{Row, text_row};

fn generate_rows(count: usize, tricky: bool) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let title = if tricky {
                format!("Ticket {i}; says \"help\"\nsecond line")
            } else {
                format!("Ticket {i} title")
            };
            text_row(&[i.to_string(), title, "open".to_string(), "Raw".to_string()])
        })
        .collect()
}

fn encode_all(rows: &[Row], settings: &CsvSettings) -> Vec<u8> {
    let mut out = Vec::new();
    for row in rows {
        out.extend_from_slice(encode(row, settings).unwrap().as_bytes());
        out.push(b'\n');
    }
    out
}

fn bench_decode(c: &mut Criterion) {
    let settings = CsvSettings::new(ColumnSeparator::Semicolon);
    let mut group = c.benchmark_group("csv_decode");

    for size in [100, 1_000, 10_000] {
        for tricky in [false, true] {
            let content = encode_all(&generate_rows(size, tricky), &settings);
            let label = if tricky { "embedded" } else { "plain" };
            group.throughput(Throughput::Bytes(content.len() as u64));
            group.bench_with_input(BenchmarkId::new(label, size), &content, |b, content| {
                b.iter(|| decode(black_box(content), &settings));
            });
        }
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let settings = CsvSettings::new(ColumnSeparator::Semicolon);
    let mut group = c.benchmark_group("csv_encode");

    for size in [100, 1_000, 10_000] {
        let rows = generate_rows(size, true);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| {
                for row in rows {
                    black_box(encode(black_box(row), &settings).unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
