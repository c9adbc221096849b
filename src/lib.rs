//! # Range Asymmetric Numeral Systems (rANS)
//!
//! *Byte-exact entropy coding for learned-compression bitstreams.*
//!
//! ## Intuition First
//!
//! Think of the coder state as one enormous integer used as a stack.
//! Pushing a symbol of probability `p` multiplies the state by roughly
//! `1/p`: likely symbols grow it a little, rare symbols grow it a lot, and
//! the state's length in bits tracks the information content of everything
//! pushed so far. Popping runs the same arithmetic backwards, which is why
//! the decoder recovers symbols in reverse push order and why this crate's
//! encoders take care of the ordering for you.
//!
//! Keeping the whole integer around would be quadratic, so the state is
//! capped at a fixed width: whenever it grows past its interval the low
//! bytes spill into the output buffer, and the decoder pulls them back in
//! at the mirrored moments. That spill-and-refill dance is
//! renormalization, and it is the only place bytes ever move.
//!
//! ## Where This Sits in a Pipeline
//!
//! Learned codecs quantize the output of a neural analysis transform into
//! integer symbols and model each symbol with a discrete distribution
//! predicted by the network. This crate is the stage after all of that:
//! it takes the symbols and the quantized distributions and produces the
//! actual bitstream, then reproduces the symbols exactly on the way back.
//! Nothing here knows about tensors or models; distributions arrive as
//! plain per-alphabet tables ([`QuantizedCdf`]) and symbols as `u16`
//! indices.
//!
//! ## The Byte-Stream Convention
//!
//! ```text
//! state            u64, normalized to [1 << 23, 1 << 31)
//! renormalization  one byte at a time, low byte first
//! final flush      exactly 4 bytes, then the buffer is reversed
//! decode direction front to back, 4 bootstrap bytes first
//! precision        1..=16 bits, fixed per table
//! ```
//!
//! Encoder and decoder must agree on every row of that table bit for bit;
//! both live in [`coder`] so the convention has a single home. The buffer
//! itself is headerless: tables and symbol counts travel out of band,
//! and handing the decoder a different table or count than the encoder
//! used yields garbage or an underrun error, not a diagnostic.
//!
//! ## Quantized Tables
//!
//! Floating-point probabilities never reach the coder. [`QuantizedCdf`]
//! first quantizes each model to integer frequencies summing to `2^P`,
//! guaranteeing every symbol a frequency of at least 1 so that anything
//! the caller can name stays encodable. The clamp costs a fraction of a
//! bit on near-zero symbols and buys unconditional losslessness.
//!
//! ## Complexity
//!
//! - **Time**: O(1) per symbol, a division and a multiply on encode, a
//!   multiply and a table lookup on decode.
//! - **Space**: O(A) per table, plus an optional `2^P`-entry reverse
//!   lookup for bulk decoding.
//!
//! ## Failure Modes
//!
//! 1. **Mismatched tables or counts**: undetectable in general; the
//!    decoder documents this rather than pretending otherwise.
//! 2. **Precision too low**: an alphabet larger than `2^P` cannot give
//!    every symbol a nonzero frequency and is rejected up front.
//! 3. **Truncated buffers**: detected as [`Error::UnexpectedEof`] the
//!    moment the decoder needs a byte that is not there.
//!
//! ## Example
//!
//! ```
//! use rans::{BufferedRansEncoder, QuantizedCdf, RansDecoder};
//!
//! let cdf = QuantizedCdf::from_pmf(&[0.25, 0.25, 0.5], 16)?;
//!
//! let mut encoder = BufferedRansEncoder::new();
//! encoder.push_stream(&[2, 0, 1, 2, 2], &cdf)?;
//! let buffer = encoder.flush();
//!
//! let mut decoder = RansDecoder::new(&buffer)?;
//! assert_eq!(decoder.decode_stream(5, &cdf)?, vec![2, 0, 1, 2, 2]);
//! # Ok::<(), rans::Error>(())
//! ```
//!
//! ## References
//!
//! - Duda, J. (2009). "Asymmetric numeral systems: entropy coding combining
//!   speed of Huffman coding with compression rate of arithmetic coding."
//! - Giesen, F. (2014). `ryg_rans`: public-domain reference rANS coders.
//! - Ballé, J., et al. (2018). "Variational image compression with a scale
//!   hyperprior."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cdf;
pub mod coder;
pub mod error;

pub use cdf::{QuantizedCdf, MAX_PRECISION};
pub use coder::{
    decode_with_indexes, encode_with_indexes, BufferedRansEncoder, RansDecoder, RansEncoder,
};
pub use error::Error;
