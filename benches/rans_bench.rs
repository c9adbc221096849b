use criterion::{criterion_group, criterion_main, Criterion};
use rans::{
    decode_with_indexes, encode_with_indexes, BufferedRansEncoder, QuantizedCdf, RansDecoder,
};

fn bench_rans_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("rans_stream");
    // 1000 symbols so per-call overhead does not dominate the measurement
    let input = (0..1000).map(|i| (i % 3) as u16).collect::<Vec<_>>();
    let table = QuantizedCdf::from_pmf(&[2.0, 1.0, 1.0], 8).unwrap();

    group.bench_function("encode", |b| {
        b.iter(|| {
            let mut encoder = BufferedRansEncoder::new();
            encoder.push_stream(&input, &table).unwrap();
            encoder.flush()
        })
    });

    let mut encoder = BufferedRansEncoder::new();
    encoder.push_stream(&input, &table).unwrap();
    let buffer = encoder.flush();

    group.bench_function("decode", |b| {
        b.iter(|| {
            let mut decoder = RansDecoder::new(&buffer).unwrap();
            decoder.decode_stream(input.len(), &table).unwrap()
        })
    });
}

fn bench_rans_indexed(c: &mut Criterion) {
    let mut group = c.benchmark_group("rans_indexed");
    let tables = vec![
        QuantizedCdf::from_pmf(&[8.0, 4.0, 2.0, 1.0, 1.0], 8).unwrap(),
        QuantizedCdf::from_pmf(&[1.0; 16], 12).unwrap(),
        QuantizedCdf::from_pmf(&[3.0, 1.0], 16).unwrap(),
    ];
    let indexes = (0..1000).map(|i| i % tables.len()).collect::<Vec<_>>();
    let symbols = indexes
        .iter()
        .enumerate()
        .map(|(i, &t)| (i % tables[t].alphabet_size()) as u16)
        .collect::<Vec<_>>();

    group.bench_function("encode", |b| {
        b.iter(|| encode_with_indexes(&symbols, &indexes, &tables).unwrap())
    });

    let buffer = encode_with_indexes(&symbols, &indexes, &tables).unwrap();

    group.bench_function("decode", |b| {
        b.iter(|| decode_with_indexes(&buffer, &indexes, &tables).unwrap())
    });
}

criterion_group!(benches, bench_rans_stream, bench_rans_indexed);
criterion_main!(benches);
