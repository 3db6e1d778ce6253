#[macro_use]
extern crate criterion;
extern crate avrotype;

use criterion::criterion_group;
use criterion::Criterion;
use std::str::FromStr;

use avrotype::{Fingerprint, Type};

fn parse_enum_schema() {
    let _ = Type::from_str(
        r##"{ "type": "enum",
        "name": "Suit",
        "symbols" : ["SPADES", "HEARTS", "DIAMONDS", "CLUBS"]
    }"##,
    )
    .unwrap();
}

fn parse_string_schema() {
    let _ = Type::from_str(r##""string""##).unwrap();
}

const RECORD: &str = r##"{
    "namespace": "sensor_data",
    "type": "record",
    "name": "can",
    "fields" : [
        {"name": "can_id", "type": "int"},
        {"name": "data", "type": "long"},
        {"name": "timestamp", "type": "double"},
        {"name": "seq_num", "type": "int"},
        {"name": "global_seq", "type": "long"}
    ]
}"##;

fn parse_record_schema(c: &mut Criterion) {
    c.bench_function("parse_record_schema", |b| {
        b.iter(|| {
            let _ = Type::from_str(RECORD).unwrap();
        });
    });
}

fn bench_string_schema(c: &mut Criterion) {
    c.bench_function("parse string schema", |b| b.iter(parse_string_schema));
}

fn bench_enum_schema(c: &mut Criterion) {
    c.bench_function("parse enum schema", |b| b.iter(parse_enum_schema));
}

fn bench_canonical_form(c: &mut Criterion) {
    let ty = Type::from_str(RECORD).unwrap();
    c.bench_function("canonical form", move |b| b.iter(|| ty.canonical_form()));
}

fn bench_rabin_fingerprint(c: &mut Criterion) {
    let ty = Type::from_str(RECORD).unwrap();
    c.bench_function("rabin fingerprint", move |b| {
        b.iter(|| ty.fingerprint(Fingerprint::Rabin))
    });
}

criterion_group!(
    benches,
    bench_string_schema,
    bench_enum_schema,
    parse_record_schema,
    bench_canonical_form,
    bench_rabin_fingerprint
);
criterion_main!(benches);
