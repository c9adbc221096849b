use rans::{BufferedRansEncoder, QuantizedCdf, RansDecoder};

fn main() {
    let weights = (1..=16).map(|i| 1.0 / f64::from(i)).collect::<Vec<_>>();
    let table = QuantizedCdf::from_pmf(&weights, 12).unwrap();
    let input = (0..10000).map(|i| (i % 16) as u16).collect::<Vec<_>>();

    for _ in 0..1000 {
        let mut encoder = BufferedRansEncoder::new();
        encoder.push_stream(&input, &table).unwrap();
        let buffer = encoder.flush();

        let mut decoder = RansDecoder::new(&buffer).unwrap();
        let decoded = decoder.decode_stream(input.len(), &table).unwrap();
        assert_eq!(decoded, input);
    }
}
