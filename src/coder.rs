//! rANS encoder and decoder.
//!
//! Both directions share one byte-stream convention: a 64-bit state held
//! in `[RANS_L, RANS_L << 8)` between symbols, byte-wise renormalization,
//! and a 4-byte state flush at the end of encoding. The encoder works
//! through symbols in reverse of the order the decoder recovers them and
//! reverses the finished buffer, so decoding reads front to back.

use crate::cdf::QuantizedCdf;
use crate::error::{Error, Result};

/// Lower bound of the normalized state interval.
///
/// After every renormalized step the state lies in `[RANS_L, RANS_L << 8)`,
/// so the final flush always fits exactly [`STATE_BYTES`] bytes.
pub const RANS_L: u64 = 1 << 23;

/// Bytes the encoder flushes for the final state and the decoder reads to
/// bootstrap its own.
pub const STATE_BYTES: usize = 4;

/// A symbol resolved against its table: everything one coding step needs.
#[derive(Debug, Clone, Copy)]
struct RansSymbol {
    start: u32,
    freq: u32,
    precision: u32,
}

fn resolve_symbol(symbol: u16, cdf: &QuantizedCdf) -> Result<RansSymbol> {
    if usize::from(symbol) >= cdf.alphabet_size() {
        return Err(Error::SymbolOutOfRange {
            symbol,
            alphabet: cdf.alphabet_size(),
        });
    }
    let (start, freq) = cdf.span(usize::from(symbol));
    if freq == 0 {
        return Err(Error::ImpossibleSymbol(symbol));
    }
    Ok(RansSymbol {
        start,
        freq,
        precision: cdf.precision(),
    })
}

/// One encode step: renormalize, then fold the symbol into the state.
fn put_symbol(state: &mut u64, output: &mut Vec<u8>, sym: RansSymbol) {
    // Largest state that still lands inside the interval after the update.
    let x_max = ((RANS_L >> sym.precision) << 8) * u64::from(sym.freq);
    while *state >= x_max {
        output.push((*state & 0xFF) as u8);
        *state >>= 8;
    }

    // x = (x / freq) * 2^P + (x % freq) + start
    *state = ((*state / u64::from(sym.freq)) << sym.precision)
        + (*state % u64::from(sym.freq))
        + u64::from(sym.start);
    debug_assert!(
        (RANS_L..RANS_L << 8).contains(state),
        "state {state:#x} left the normalized interval"
    );
}

/// Flush the final state, low byte first, then flip the whole buffer so
/// the decoder reads its bootstrap bytes first.
fn seal(mut state: u64, mut output: Vec<u8>) -> Vec<u8> {
    for _ in 0..STATE_BYTES {
        output.push((state & 0xFF) as u8);
        state >>= 8;
    }
    output.reverse();
    output
}

/// Immediate rANS encoder.
///
/// rANS is a stack: the decoder pops symbols in the reverse of the order
/// they were pushed, so symbols must be fed to [`encode_symbol`] in
/// reverse of the order the decoder should recover them. When that
/// bookkeeping is unwelcome, use [`BufferedRansEncoder`], which accepts
/// symbols in recovery order and reverses internally.
///
/// [`encode_symbol`]: RansEncoder::encode_symbol
pub struct RansEncoder {
    state: u64,
    output: Vec<u8>,
}

impl RansEncoder {
    /// Create an encoder with a fresh state and an empty buffer.
    pub fn new() -> Self {
        Self {
            state: RANS_L,
            output: Vec::new(),
        }
    }

    /// Encode one symbol against its table.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the symbol is outside the table's
    /// alphabet or has frequency 0. The state and buffer are untouched on
    /// error.
    pub fn encode_symbol(&mut self, symbol: u16, cdf: &QuantizedCdf) -> Result<()> {
        let sym = resolve_symbol(symbol, cdf)?;
        put_symbol(&mut self.state, &mut self.output, sym);
        Ok(())
    }

    /// Finish encoding and take ownership of the compressed bytes.
    ///
    /// The buffer carries no header or length prefix; the caller keeps the
    /// tables and symbol counts alongside it.
    pub fn finish(self) -> Vec<u8> {
        seal(self.state, self.output)
    }

    /// Current internal state.
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl Default for RansEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// rANS encoder that accepts symbols in the order the decoder will
/// recover them.
///
/// Symbols are validated and resolved against their tables as they are
/// pushed, but no coding happens until [`flush`], which walks the pending
/// symbols backwards. Streams with different tables, alphabet sizes, and
/// precisions may be pushed back to back; the decoder replays the same
/// (table, count) sequence to take them apart.
///
/// [`flush`]: BufferedRansEncoder::flush
pub struct BufferedRansEncoder {
    pending: Vec<RansSymbol>,
}

impl BufferedRansEncoder {
    /// Create an encoder with no pending symbols.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queue one symbol.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the symbol is outside the table's
    /// alphabet or has frequency 0; nothing is queued on error.
    pub fn push_symbol(&mut self, symbol: u16, cdf: &QuantizedCdf) -> Result<()> {
        self.pending.push(resolve_symbol(symbol, cdf)?);
        Ok(())
    }

    /// Queue a whole stream of symbols sharing one table.
    ///
    /// # Errors
    ///
    /// As [`push_symbol`]; symbols before the offending one stay queued.
    ///
    /// [`push_symbol`]: BufferedRansEncoder::push_symbol
    pub fn push_stream(&mut self, symbols: &[u16], cdf: &QuantizedCdf) -> Result<()> {
        for &symbol in symbols {
            self.push_symbol(symbol, cdf)?;
        }
        Ok(())
    }

    /// Queue symbols that each pick their own table from `cdfs` via the
    /// parallel `indexes` slice.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the slices differ in length, an
    /// index points past `cdfs`, or any symbol fails [`push_symbol`]'s
    /// checks.
    ///
    /// [`push_symbol`]: BufferedRansEncoder::push_symbol
    pub fn push_with_indexes(
        &mut self,
        symbols: &[u16],
        indexes: &[usize],
        cdfs: &[QuantizedCdf],
    ) -> Result<()> {
        if symbols.len() != indexes.len() {
            return Err(Error::LengthMismatch {
                symbols: symbols.len(),
                indexes: indexes.len(),
            });
        }
        for (&symbol, &index) in symbols.iter().zip(indexes) {
            let cdf = cdfs.get(index).ok_or(Error::TableIndexOutOfRange {
                index,
                tables: cdfs.len(),
            })?;
            self.push_symbol(symbol, cdf)?;
        }
        Ok(())
    }

    /// Number of symbols queued so far.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no symbols are queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Encode everything queued and take ownership of the compressed
    /// bytes.
    ///
    /// Infallible: every pushed symbol was already validated against its
    /// table.
    pub fn flush(self) -> Vec<u8> {
        let mut state = RANS_L;
        let mut output = Vec::new();
        for &sym in self.pending.iter().rev() {
            put_symbol(&mut state, &mut output, sym);
        }
        seal(state, output)
    }
}

impl Default for BufferedRansEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// rANS decoder over a borrowed compressed buffer.
///
/// The caller must replay the exact (table, count) sequence used at
/// encode time, in the same order. A wrong table or count cannot be
/// detected reliably: it typically yields garbage symbols or an
/// [`Error::UnexpectedEof`], never a clean diagnostic. Trailing bytes
/// beyond what decoding consumes are permitted and ignored.
pub struct RansDecoder<'a> {
    state: u64,
    input: &'a [u8],
    pos: usize,
}

impl<'a> RansDecoder<'a> {
    /// Bootstrap a decoder from the first [`STATE_BYTES`] bytes of the
    /// buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedEof`] if the buffer is shorter than one
    /// flushed state.
    pub fn new(input: &'a [u8]) -> Result<Self> {
        if input.len() < STATE_BYTES {
            return Err(Error::UnexpectedEof { pos: input.len() });
        }
        let mut state = 0u64;
        for &byte in &input[..STATE_BYTES] {
            state = (state << 8) | u64::from(byte);
        }
        Ok(Self {
            state,
            input,
            pos: STATE_BYTES,
        })
    }

    /// Decode one symbol against its table, identifying it by binary
    /// search. For long runs against one table, [`decode_stream`] is
    /// faster.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedEof`] if the buffer runs out while
    /// renormalizing.
    ///
    /// [`decode_stream`]: RansDecoder::decode_stream
    pub fn decode_symbol(&mut self, cdf: &QuantizedCdf) -> Result<u16> {
        let slot = self.slot(cdf);
        let symbol = cdf.symbol_at(slot);
        self.advance(slot, symbol, cdf)?;
        Ok(symbol)
    }

    /// Decode `count` symbols sharing one table, identifying symbols
    /// through a precomputed slot-to-symbol table of `cdf.total()`
    /// entries built once per call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedEof`] if the buffer runs out before
    /// `count` symbols are recovered; no partial output is returned.
    pub fn decode_stream(&mut self, count: usize, cdf: &QuantizedCdf) -> Result<Vec<u16>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let lookup = cdf.slot_table();
        let mut output = Vec::with_capacity(count);
        for _ in 0..count {
            let slot = self.slot(cdf);
            let symbol = lookup[slot as usize];
            self.advance(slot, symbol, cdf)?;
            output.push(symbol);
        }
        Ok(output)
    }

    /// Decode one symbol per entry of `indexes`, each against the table
    /// it names, mirroring [`BufferedRansEncoder::push_with_indexes`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an index past `cdfs`, or
    /// [`Error::UnexpectedEof`] if the buffer runs out; no partial output
    /// is returned.
    pub fn decode_with_indexes(
        &mut self,
        indexes: &[usize],
        cdfs: &[QuantizedCdf],
    ) -> Result<Vec<u16>> {
        let mut output = Vec::with_capacity(indexes.len());
        for &index in indexes {
            let cdf = cdfs.get(index).ok_or(Error::TableIndexOutOfRange {
                index,
                tables: cdfs.len(),
            })?;
            output.push(self.decode_symbol(cdf)?);
        }
        Ok(output)
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Current internal state.
    pub fn state(&self) -> u64 {
        self.state
    }

    fn slot(&self, cdf: &QuantizedCdf) -> u32 {
        (self.state & u64::from(cdf.total() - 1)) as u32
    }

    /// Inverse update for an identified symbol, then refill the state.
    fn advance(&mut self, slot: u32, symbol: u16, cdf: &QuantizedCdf) -> Result<()> {
        let (start, freq) = cdf.span(usize::from(symbol));

        // x = freq * (x >> P) + slot - start
        self.state =
            u64::from(freq) * (self.state >> cdf.precision()) + u64::from(slot - start);

        while self.state < RANS_L {
            match self.input.get(self.pos) {
                Some(&byte) => {
                    self.state = (self.state << 8) | u64::from(byte);
                    self.pos += 1;
                }
                None => return Err(Error::UnexpectedEof { pos: self.pos }),
            }
        }
        Ok(())
    }
}

/// Encode symbols that each pick their own table from `cdfs` via the
/// parallel `indexes` slice, returning the compressed buffer.
///
/// Convenience over [`BufferedRansEncoder::push_with_indexes`] plus
/// [`BufferedRansEncoder::flush`] for one-shot callers.
///
/// # Errors
///
/// As [`BufferedRansEncoder::push_with_indexes`].
pub fn encode_with_indexes(
    symbols: &[u16],
    indexes: &[usize],
    cdfs: &[QuantizedCdf],
) -> Result<Vec<u8>> {
    let mut encoder = BufferedRansEncoder::new();
    encoder.push_with_indexes(symbols, indexes, cdfs)?;
    Ok(encoder.flush())
}

/// Decode one symbol per entry of `indexes` from `buffer`, inverting
/// [`encode_with_indexes`].
///
/// # Errors
///
/// As [`RansDecoder::decode_with_indexes`], plus
/// [`Error::UnexpectedEof`] for a buffer too short to bootstrap from.
pub fn decode_with_indexes(
    buffer: &[u8],
    indexes: &[usize],
    cdfs: &[QuantizedCdf],
) -> Result<Vec<u16>> {
    RansDecoder::new(buffer)?.decode_with_indexes(indexes, cdfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_four_symbol_scenario_roundtrip() {
        let cdf = QuantizedCdf::from_pmf(&[1.0, 1.0, 2.0], 2).unwrap();
        assert_eq!(cdf.as_slice(), &[0, 1, 2, 4]);

        let mut encoder = BufferedRansEncoder::new();
        encoder.push_stream(&[2, 0, 1, 2], &cdf).unwrap();
        let buffer = encoder.flush();
        // Hand-computed: 0x800000 -2-> 0x1000002 -1-> 0x4000009
        // -0-> 0x10000024 -2-> 0x2000004A, no renorm bytes, 4 flush bytes.
        assert_eq!(buffer, [0x20, 0x00, 0x00, 0x4A]);

        let mut decoder = RansDecoder::new(&buffer).unwrap();
        assert_eq!(decoder.decode_stream(4, &cdf).unwrap(), vec![2, 0, 1, 2]);
        assert_eq!(decoder.remaining(), 0);
        assert_eq!(decoder.state(), RANS_L);
    }

    #[test]
    fn test_empty_stream_is_just_the_flushed_state() {
        let buffer = BufferedRansEncoder::new().flush();
        // The initial state 0x0080_0000, high byte first.
        assert_eq!(buffer, [0x00, 0x80, 0x00, 0x00]);

        let cdf = QuantizedCdf::from_pmf(&[1.0, 1.0], 4).unwrap();
        let mut decoder = RansDecoder::new(&buffer).unwrap();
        assert_eq!(decoder.decode_stream(0, &cdf).unwrap(), Vec::<u16>::new());
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn test_degenerate_alphabet_freezes_the_state() {
        let cdf = QuantizedCdf::from_pmf(&[1.0], 16).unwrap();
        let mut encoder = BufferedRansEncoder::new();
        encoder.push_stream(&[0; 100], &cdf).unwrap();
        let buffer = encoder.flush();
        // Frequency 2^P encodes zero bits per symbol.
        assert_eq!(buffer.len(), STATE_BYTES);

        let mut decoder = RansDecoder::new(&buffer).unwrap();
        assert_eq!(decoder.decode_stream(100, &cdf).unwrap(), vec![0; 100]);
    }

    #[test]
    fn test_buffered_matches_reverse_fed_encoder() {
        let cdf = QuantizedCdf::from_pmf(&[5.0, 3.0, 1.0, 1.0], 8).unwrap();
        let symbols = [0u16, 1, 0, 3, 2, 0, 1, 1, 0, 2];

        let mut buffered = BufferedRansEncoder::new();
        buffered.push_stream(&symbols, &cdf).unwrap();

        let mut manual = RansEncoder::new();
        for &symbol in symbols.iter().rev() {
            manual.encode_symbol(symbol, &cdf).unwrap();
        }

        assert_eq!(buffered.flush(), manual.finish());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let cdf = QuantizedCdf::from_pmf(&[0.9, 0.05, 0.05], 16).unwrap();
        let symbols: Vec<u16> = (0..500).map(|i| (i % 3) as u16).collect();

        let mut a = BufferedRansEncoder::new();
        a.push_stream(&symbols, &cdf).unwrap();
        let mut b = BufferedRansEncoder::new();
        b.push_stream(&symbols, &cdf).unwrap();

        assert_eq!(a.flush(), b.flush());
    }

    #[test]
    fn test_streams_with_different_tables_share_one_buffer() {
        let coarse = QuantizedCdf::from_pmf(&[3.0, 1.0], 8).unwrap();
        let fine = QuantizedCdf::from_pmf(&[0.6, 0.2, 0.1, 0.1], 16).unwrap();
        let first = [0u16, 1, 1, 0, 0, 1];
        let second = [3u16, 0, 0, 1, 2, 0, 0, 3];

        let mut encoder = BufferedRansEncoder::new();
        encoder.push_stream(&first, &coarse).unwrap();
        encoder.push_stream(&second, &fine).unwrap();
        let buffer = encoder.flush();

        let mut decoder = RansDecoder::new(&buffer).unwrap();
        assert_eq!(decoder.decode_stream(first.len(), &coarse).unwrap(), first);
        assert_eq!(decoder.decode_stream(second.len(), &fine).unwrap(), second);
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn test_indexed_encode_decode_roundtrip() {
        let tables = [
            QuantizedCdf::from_pmf(&[1.0, 1.0], 8).unwrap(),
            QuantizedCdf::from_pmf(&[8.0, 4.0, 2.0, 1.0, 1.0], 12).unwrap(),
        ];
        let symbols = [1u16, 4, 0, 0, 1, 2, 1, 3];
        let indexes = [0usize, 1, 0, 1, 0, 1, 0, 1];

        let buffer = encode_with_indexes(&symbols, &indexes, &tables).unwrap();
        let decoded = decode_with_indexes(&buffer, &indexes, &tables).unwrap();
        assert_eq!(decoded, symbols);
    }

    #[test]
    fn test_encode_rejects_bad_symbols() {
        let cdf = QuantizedCdf::from_frequencies(&[0, 4], 2).unwrap();
        let mut encoder = BufferedRansEncoder::new();
        assert!(matches!(
            encoder.push_symbol(0, &cdf),
            Err(Error::ImpossibleSymbol(0))
        ));
        assert!(matches!(
            encoder.push_symbol(2, &cdf),
            Err(Error::SymbolOutOfRange {
                symbol: 2,
                alphabet: 2
            })
        ));
        encoder.push_symbol(1, &cdf).unwrap();
        assert_eq!(encoder.len(), 1);
    }

    #[test]
    fn test_indexed_api_rejects_shape_errors() {
        let tables = [QuantizedCdf::from_pmf(&[1.0, 1.0], 8).unwrap()];
        assert!(matches!(
            encode_with_indexes(&[0, 1], &[0], &tables),
            Err(Error::LengthMismatch {
                symbols: 2,
                indexes: 1
            })
        ));
        assert!(matches!(
            encode_with_indexes(&[0], &[3], &tables),
            Err(Error::TableIndexOutOfRange {
                index: 3,
                tables: 1
            })
        ));

        let buffer = encode_with_indexes(&[0, 1], &[0, 0], &tables).unwrap();
        assert!(matches!(
            decode_with_indexes(&buffer, &[0, 5], &tables),
            Err(Error::TableIndexOutOfRange {
                index: 5,
                tables: 1
            })
        ));
    }

    #[test]
    fn test_short_buffer_is_rejected_at_bootstrap() {
        assert!(matches!(
            RansDecoder::new(&[0x00, 0x80]),
            Err(Error::UnexpectedEof { pos: 2 })
        ));
        assert!(matches!(
            RansDecoder::new(&[]),
            Err(Error::UnexpectedEof { pos: 0 })
        ));
    }

    #[test]
    fn test_truncation_is_reported_as_underrun() {
        let cdf = QuantizedCdf::from_pmf(&[1.0, 2.0, 4.0, 8.0], 16).unwrap();
        let symbols: Vec<u16> = (0..300).map(|i| (i % 4) as u16).collect();
        let mut encoder = BufferedRansEncoder::new();
        encoder.push_stream(&symbols, &cdf).unwrap();
        let buffer = encoder.flush();
        assert!(buffer.len() > STATE_BYTES);

        for cut in 1..buffer.len() - STATE_BYTES {
            let short = &buffer[..buffer.len() - cut];
            let mut decoder = RansDecoder::new(short).unwrap();
            assert!(matches!(
                decoder.decode_stream(symbols.len(), &cdf),
                Err(Error::UnexpectedEof { .. })
            ));
        }
    }

    #[test]
    fn test_trailing_pad_bytes_are_ignored() {
        let cdf = QuantizedCdf::from_pmf(&[1.0, 3.0], 8).unwrap();
        let symbols = [1u16, 0, 1, 1, 1, 0];
        let mut encoder = BufferedRansEncoder::new();
        encoder.push_stream(&symbols, &cdf).unwrap();
        let mut buffer = encoder.flush();
        buffer.extend_from_slice(&[0xAB, 0xCD, 0xEF]);

        let mut decoder = RansDecoder::new(&buffer).unwrap();
        assert_eq!(decoder.decode_stream(symbols.len(), &cdf).unwrap(), symbols);
        assert_eq!(decoder.remaining(), 3);
    }

    #[test]
    fn test_single_decode_agrees_with_bulk_decode() {
        let cdf = QuantizedCdf::from_pmf(&[4.0, 3.0, 2.0, 1.0], 12).unwrap();
        let symbols: Vec<u16> = (0..64).map(|i| (i * 7 % 4) as u16).collect();
        let mut encoder = BufferedRansEncoder::new();
        encoder.push_stream(&symbols, &cdf).unwrap();
        let buffer = encoder.flush();

        let mut bulk = RansDecoder::new(&buffer).unwrap();
        let via_stream = bulk.decode_stream(symbols.len(), &cdf).unwrap();

        let mut single = RansDecoder::new(&buffer).unwrap();
        let mut via_symbols = Vec::with_capacity(symbols.len());
        for _ in 0..symbols.len() {
            via_symbols.push(single.decode_symbol(&cdf).unwrap());
        }

        assert_eq!(via_stream, via_symbols);
        assert_eq!(via_stream, symbols);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_roundtrip_over_power_of_two_tables(
            split in 1u32..255,
            symbols in prop::collection::vec(0u16..3, 0..200),
        ) {
            // Three frequencies summing to 256, every one nonzero.
            let f0 = split;
            let f1 = (256 - f0) / 2;
            let f2 = 256 - f0 - f1;
            prop_assume!(f1 > 0 && f2 > 0);
            let cdf = QuantizedCdf::from_frequencies(&[f0, f1, f2], 8).unwrap();

            let mut encoder = BufferedRansEncoder::new();
            encoder.push_stream(&symbols, &cdf).unwrap();
            let buffer = encoder.flush();

            let mut decoder = RansDecoder::new(&buffer).unwrap();
            prop_assert_eq!(decoder.decode_stream(symbols.len(), &cdf).unwrap(), symbols);
            prop_assert_eq!(decoder.remaining(), 0);
        }

        #[test]
        fn prop_mixed_precision_streams_roundtrip(
            first in prop::collection::vec(0u16..2, 0..80),
            second in prop::collection::vec(0u16..5, 0..80),
        ) {
            let narrow = QuantizedCdf::from_pmf(&[1.0, 4.0], 6).unwrap();
            let wide = QuantizedCdf::from_pmf(&[5.0, 4.0, 3.0, 2.0, 1.0], 16).unwrap();

            let mut encoder = BufferedRansEncoder::new();
            encoder.push_stream(&first, &narrow).unwrap();
            encoder.push_stream(&second, &wide).unwrap();
            let buffer = encoder.flush();

            let mut decoder = RansDecoder::new(&buffer).unwrap();
            prop_assert_eq!(decoder.decode_stream(first.len(), &narrow).unwrap(), first);
            prop_assert_eq!(decoder.decode_stream(second.len(), &wide).unwrap(), second);
        }
    }
}
