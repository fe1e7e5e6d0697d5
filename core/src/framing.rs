//! Frame layout shared by the encoder and the decoder
//!
//! A frame is `START_OF_DATA_MARKER`, then the payload bytes sent most
//! significant bit first, then `END_OF_DATA_MARKER`. There is no header,
//! length field or checksum: the two markers are the only delimiters, so they
//! are chosen so that neither can appear at any bit alignment inside 7-bit
//! ASCII text.

/// Number of bits in each marker
pub const MARKER_BITS: usize = 32;

/// Start marker as a word, transmitted MSB first
pub const START_MARKER_WORD: u32 = 0xF9D6_012E;

/// End marker as a word: the bitwise complement of the start marker
pub const END_MARKER_WORD: u32 = !START_MARKER_WORD;

pub const START_OF_DATA_MARKER: [u8; MARKER_BITS] = word_to_bits(START_MARKER_WORD);
pub const END_OF_DATA_MARKER: [u8; MARKER_BITS] = word_to_bits(END_MARKER_WORD);

const fn word_to_bits(word: u32) -> [u8; MARKER_BITS] {
    let mut bits = [0u8; MARKER_BITS];
    let mut i = 0;
    while i < MARKER_BITS {
        bits[i] = ((word >> (MARKER_BITS - 1 - i)) & 1) as u8;
        i += 1;
    }
    bits
}

/// Expand bytes into bits, MSB first
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Pack bits (MSB first) back into bytes.
///
/// Trailing bits that do not fill a whole byte are dropped.
pub fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | (bit & 1)))
        .collect()
}

/// How demodulated bytes are turned into text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TextFilter {
    /// Decode as UTF-8, replacing invalid sequences with U+FFFD
    #[default]
    Utf8Lossy,
    /// Keep only ASCII alphanumerics, space and common punctuation
    Printable,
}

impl TextFilter {
    pub fn apply(&self, bytes: &[u8]) -> String {
        let text = String::from_utf8_lossy(bytes);
        match self {
            TextFilter::Utf8Lossy => text.into_owned(),
            TextFilter::Printable => text.chars().filter(|&c| is_printable(c)).collect(),
        }
    }
}

fn is_printable(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ' ' || "~`!@#$%^&*()-_=+[]{}|;:'\",.<>/?\\".contains(c)
}
