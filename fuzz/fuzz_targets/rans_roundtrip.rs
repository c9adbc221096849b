#![no_main]
use libfuzzer_sys::fuzz_target;
use rans::{BufferedRansEncoder, QuantizedCdf, RansDecoder};

fuzz_target!(|data: (Vec<u8>, Vec<u8>, u8)| {
    let (weight_bytes, symbol_bytes, precision) = data;
    let precision = u32::from(precision % 9) + 8; // 8 to 16 bits

    // Alphabet of 1 to 64 symbols, weights strictly positive
    let weights = weight_bytes
        .iter()
        .take(64)
        .map(|&b| f64::from(b) + 0.5)
        .collect::<Vec<_>>();
    if weights.is_empty() {
        return;
    }

    let table = QuantizedCdf::from_pmf(&weights, precision).unwrap();
    let alphabet = table.alphabet_size() as u8;
    let input = symbol_bytes
        .iter()
        .map(|&b| u16::from(b % alphabet))
        .collect::<Vec<_>>();

    let mut encoder = BufferedRansEncoder::new();
    encoder.push_stream(&input, &table).unwrap();
    let buffer = encoder.flush();

    let mut decoder = RansDecoder::new(&buffer).unwrap();
    let output = decoder.decode_stream(input.len(), &table).unwrap();
    assert_eq!(input, output);
});
