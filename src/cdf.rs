//! Quantized cumulative distribution tables.
//!
//! The coder never sees floating-point probabilities. Every model is first
//! quantized to integer frequencies summing to exactly `2^P`, and the
//! resulting cumulative table is what both the encoder and the decoder
//! work from. The decoder must be handed the identical table that encoded
//! a stream; tables are never reconstructed from the byte stream itself.

use crate::error::{Error, Result};

/// Highest supported precision, in bits.
///
/// Precisions above 16 would push symbols past `u16`, make the decode
/// lookup table exceed 65536 entries, and overrun the renormalization
/// headroom of the byte-wise state convention.
pub const MAX_PRECISION: u32 = 16;

/// A quantized cumulative distribution over one symbol alphabet.
///
/// Stores `alphabet_size() + 1` cumulative entries with `cdf[0] = 0` and
/// `cdf[A] = 2^P`. The frequency of symbol `s` is `cdf[s+1] - cdf[s]`;
/// a frequency of 0 marks a symbol that can never be encoded. Tables are
/// immutable once built and cheap to clone and share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedCdf {
    cdf: Vec<u32>,
    precision: u32,
}

impl QuantizedCdf {
    /// Quantize a probability mass function to integer frequencies summing
    /// to exactly `2^precision`.
    ///
    /// Weights need not be normalized. Scaled weights are floored and the
    /// rounding shortfall goes to the symbols with the largest remainders
    /// (ties to the lower index, so quantization is deterministic). Every
    /// frequency is then lifted to at least 1, paid for by the largest
    /// frequency, so that any symbol the caller can name stays encodable.
    /// The minimum frequency costs a little compression on near-zero
    /// symbols in exchange for guaranteed losslessness.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `precision` is outside `1..=16`,
    /// the alphabet is empty or larger than `2^precision`, any weight is
    /// negative or non-finite, or the weights sum to zero.
    pub fn from_pmf(pmf: &[f64], precision: u32) -> Result<Self> {
        check_precision(precision)?;
        if pmf.is_empty() {
            return Err(Error::EmptyAlphabet);
        }
        let total = 1u32 << precision;
        if pmf.len() > total as usize {
            return Err(Error::PrecisionTooLow {
                alphabet: pmf.len(),
                precision,
            });
        }

        let mut sum = 0.0;
        for &weight in pmf {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidWeight(weight));
            }
            sum += weight;
        }
        if !sum.is_finite() || sum <= 0.0 {
            return Err(Error::InvalidWeight(sum));
        }

        // Scale to a total mass of 2^P, flooring but keeping the fractional
        // parts so the shortfall can go to the symbols that lost the most.
        // Dividing by the sum first keeps every intermediate within 2^P
        // even when the weights are denormal-small.
        let mut freqs = Vec::with_capacity(pmf.len());
        let mut remainders = Vec::with_capacity(pmf.len());
        let mut assigned = 0u32;
        for (symbol, &weight) in pmf.iter().enumerate() {
            let exact = weight / sum * f64::from(total);
            let floor = exact.floor();
            freqs.push(floor as u32);
            assigned += floor as u32;
            remainders.push((symbol, exact - floor));
        }

        // Stable sort: ties resolve to the lower symbol index, so the same
        // pmf quantizes to the same table on every platform.
        remainders.sort_by(|a, b| b.1.total_cmp(&a.1));
        let shortfall = (total - assigned) as usize;
        debug_assert!(shortfall <= pmf.len());
        for &(symbol, _) in remainders.iter().take(shortfall) {
            freqs[symbol] += 1;
        }

        // Lift zero frequencies to 1, paying out of the largest frequency.
        // 2^P >= A guarantees a donor with at least 2 while any zero exists.
        while let Some(symbol) = freqs.iter().position(|&freq| freq == 0) {
            let mut donor = 0;
            for (candidate, &freq) in freqs.iter().enumerate() {
                if freq > freqs[donor] {
                    donor = candidate;
                }
            }
            debug_assert!(freqs[donor] >= 2);
            freqs[donor] -= 1;
            freqs[symbol] = 1;
        }

        Ok(Self::from_parts(&freqs, precision))
    }

    /// Build a table from integer frequencies that already sum to exactly
    /// `2^precision`.
    ///
    /// Zero frequencies are accepted; the corresponding symbols simply can
    /// never be encoded.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `precision` is outside `1..=16`,
    /// the alphabet is empty or larger than `2^precision`, or the
    /// frequencies do not sum to `2^precision`.
    pub fn from_frequencies(freqs: &[u32], precision: u32) -> Result<Self> {
        check_precision(precision)?;
        if freqs.is_empty() {
            return Err(Error::EmptyAlphabet);
        }
        if freqs.len() > 1 << precision {
            return Err(Error::PrecisionTooLow {
                alphabet: freqs.len(),
                precision,
            });
        }
        let total = 1u64 << precision;
        let sum: u64 = freqs.iter().map(|&freq| u64::from(freq)).sum();
        if sum != total {
            return Err(Error::InvalidTable(format!(
                "frequencies sum to {sum}, expected {total}"
            )));
        }
        Ok(Self::from_parts(freqs, precision))
    }

    /// Adopt a prebuilt cumulative array, e.g. one persisted alongside a
    /// bitstream, after validating the table invariants.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `precision` is outside `1..=16`,
    /// the array has fewer than two entries or more than `2^precision + 1`,
    /// does not start at 0 and end at `2^precision`, or decreases anywhere.
    pub fn from_cdf(cdf: Vec<u32>, precision: u32) -> Result<Self> {
        check_precision(precision)?;
        if cdf.len() < 2 {
            return Err(Error::EmptyAlphabet);
        }
        if cdf.len() - 1 > 1 << precision {
            return Err(Error::PrecisionTooLow {
                alphabet: cdf.len() - 1,
                precision,
            });
        }
        let total = 1u32 << precision;
        if cdf[0] != 0 {
            return Err(Error::InvalidTable(format!(
                "cdf starts at {}, expected 0",
                cdf[0]
            )));
        }
        if cdf[cdf.len() - 1] != total {
            return Err(Error::InvalidTable(format!(
                "cdf ends at {}, expected {total}",
                cdf[cdf.len() - 1]
            )));
        }
        for pair in cdf.windows(2) {
            if pair[1] < pair[0] {
                return Err(Error::InvalidTable(format!(
                    "cdf decreases from {} to {}",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(Self { cdf, precision })
    }

    /// Precision of the table in bits.
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Total probability mass, `1 << precision()`.
    pub fn total(&self) -> u32 {
        1 << self.precision
    }

    /// Number of symbols in the alphabet.
    pub fn alphabet_size(&self) -> usize {
        self.cdf.len() - 1
    }

    /// Frequency of a symbol, or `None` if the index is out of range.
    pub fn frequency(&self, symbol: u16) -> Option<u32> {
        let symbol = usize::from(symbol);
        if symbol >= self.alphabet_size() {
            return None;
        }
        let (_, freq) = self.span(symbol);
        Some(freq)
    }

    /// The raw cumulative entries, `alphabet_size() + 1` of them.
    pub fn as_slice(&self) -> &[u32] {
        &self.cdf
    }

    /// Cumulative start and frequency of a symbol. Callers guarantee the
    /// index is in range.
    pub(crate) fn span(&self, symbol: usize) -> (u32, u32) {
        let start = self.cdf[symbol];
        (start, self.cdf[symbol + 1] - start)
    }

    /// The symbol whose range contains `slot`, by binary search.
    ///
    /// Zero-width ranges can never contain a slot, so they are skipped
    /// automatically. Callers guarantee `slot < total()`.
    pub(crate) fn symbol_at(&self, slot: u32) -> u16 {
        self.cdf[1..].partition_point(|&bound| bound <= slot) as u16
    }

    /// Precomputed slot-to-symbol lookup of `total()` entries, trading
    /// memory for O(1) symbol identification on bulk decodes.
    pub(crate) fn slot_table(&self) -> Vec<u16> {
        let mut table = vec![0u16; self.total() as usize];
        for symbol in 0..self.alphabet_size() {
            let (start, freq) = self.span(symbol);
            for slot in start..start + freq {
                table[slot as usize] = symbol as u16;
            }
        }
        table
    }

    fn from_parts(freqs: &[u32], precision: u32) -> Self {
        let mut cdf = Vec::with_capacity(freqs.len() + 1);
        let mut acc = 0u32;
        cdf.push(0);
        for &freq in freqs {
            acc += freq;
            cdf.push(acc);
        }
        debug_assert_eq!(acc, 1 << precision);
        Self { cdf, precision }
    }
}

fn check_precision(precision: u32) -> Result<()> {
    if precision == 0 || precision > MAX_PRECISION {
        return Err(Error::InvalidPrecision(precision));
    }
    Ok(())
}
