// Intake throughput benchmark
//
// Measures validation alone and validate + enqueue through a running
// pipeline whose sink discards batches, so storage cost is excluded.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sensor2csv_batch::{BatchConfig, BatchSink, IngestPipeline};
use sensor2csv_core::{validate, Batch, FlushSummary};

struct Discard;

impl BatchSink for Discard {
    fn write_batch(&mut self, batch: Batch) -> FlushSummary {
        FlushSummary {
            batch_len: batch.len(),
            written: batch.len() as u64,
            ..FlushSummary::default()
        }
    }
}

fn environmental_payload(seq: u64) -> Vec<u8> {
    format!(
        r#"{{"device_id":3,"sequence":{seq},"uptime":{},"temperature":22.41,"humidity":47.9,"pressure":1011.62,"iaq":58.3,"iaq_accuracy":3,"iaq_label":"Good","static_iaq":55.1,"co2_ppm":612.4,"voc_ppm":0.81,"gas_percent":71.2,"stabilized":true,"run_in_complete":true,"rssi":-74,"snr":9.25}}"#,
        seq * 5
    )
    .into_bytes()
}

fn bench_validate(c: &mut Criterion) {
    let payload = environmental_payload(1);
    let mut group = c.benchmark_group("validate");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("environmental", |b| {
        b.iter(|| validate(black_box(&payload)).unwrap())
    });
    group.finish();
}

fn bench_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit");

    for max_records in [10usize, 100, 1_000] {
        let pipeline = IngestPipeline::start(
            BatchConfig {
                max_records,
                ..BatchConfig::default()
            },
            Discard,
        )
        .unwrap();
        let payloads: Vec<Vec<u8>> = (0..1_000).map(environmental_payload).collect();

        group.throughput(Throughput::Elements(payloads.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(max_records),
            &payloads,
            |b, payloads| {
                b.iter(|| {
                    for payload in payloads {
                        pipeline.submit(black_box(payload)).unwrap();
                    }
                })
            },
        );

        pipeline.shutdown().unwrap();
    }

    group.finish();
}

criterion_group!(benches, bench_validate, bench_submit);
criterion_main!(benches);
