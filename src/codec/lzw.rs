//! Adaptive-dictionary decoder for feed frames.
//!
//! A frame is UTF-8 text. Every Unicode scalar value in it is one
//! [`Symbol`]: values below 256 stand for a literal byte, larger values
//! reference sequences learned earlier in the same frame.
//!
//! # Algorithm
//!
//! ```text
//! previous = [first symbol]             output = previous
//! for each following symbol c:
//!     entry = c < 256          -> [c]
//!             c is learned     -> dictionary[c]
//!             otherwise        -> previous + previous[0]
//!     output += entry
//!     learn previous + entry[0] at the next free code
//!     previous = entry
//! ```
//!
//! The dictionary is rebuilt for every frame and grows without bound while
//! the frame is decoded.

// ============================================================================
// Imports
// ============================================================================

use tracing::trace;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// One input code of the decoder.
pub type Symbol = u32;

// ============================================================================
// Constants
// ============================================================================

/// Number of seeded single-byte entries.
const SEED_SIZE: usize = 256;

/// Backing storage for the seeded entries; `SINGLETONS[i..=i] == [i]`.
const SINGLETONS: [u8; SEED_SIZE] = {
    let mut table = [0u8; SEED_SIZE];
    let mut i = 0;
    while i < SEED_SIZE {
        table[i] = i as u8;
        i += 1;
    }
    table
};

// ============================================================================
// Dictionary
// ============================================================================

/// Code table of the decoder.
///
/// Codes `0..256` map to the matching single byte. Codes from 256 upwards are
/// learned in order and stored at index `code - 256`; a learned entry is never
/// modified or evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    /// Learned entries, index = code - 256.
    learned: Vec<Vec<u8>>,
}

impl Dictionary {
    /// First code assigned to a learned entry.
    pub const FIRST_LEARNED: Symbol = SEED_SIZE as Symbol;

    /// Creates a dictionary holding only the 256 seed entries.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            learned: Vec::new(),
        }
    }

    /// Returns the byte sequence for `code`, or `None` if it is not assigned yet.
    #[inline]
    #[must_use]
    pub fn get(&self, code: Symbol) -> Option<&[u8]> {
        let code = code as usize;
        if code < SEED_SIZE {
            return Some(&SINGLETONS[code..=code]);
        }
        self.learned.get(code - SEED_SIZE).map(Vec::as_slice)
    }

    /// Code the next learned entry will receive.
    #[inline]
    #[must_use]
    pub fn next_code(&self) -> Symbol {
        Self::FIRST_LEARNED + self.learned.len() as Symbol
    }

    /// Learned entries in assignment order.
    #[inline]
    #[must_use]
    pub fn learned(&self) -> &[Vec<u8>] {
        &self.learned
    }

    /// Appends `sequence` and returns the code it was assigned.
    fn learn(&mut self, sequence: Vec<u8>) -> Symbol {
        let code = self.next_code();
        self.learned.push(sequence);
        code
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Splits a raw frame into decoder symbols.
///
/// Invalid UTF-8 is replaced with U+FFFD before splitting.
#[must_use]
pub fn symbols(frame: &[u8]) -> Vec<Symbol> {
    String::from_utf8_lossy(frame)
        .chars()
        .map(Symbol::from)
        .collect()
}

/// Decodes one raw frame into its payload bytes.
///
/// An empty frame yields an empty payload.
///
/// # Errors
///
/// Returns [`Error::EmptyReference`] if a self-referencing code appears while
/// the previous entry is empty.
pub fn decode(frame: &[u8]) -> Result<Vec<u8>> {
    let (payload, dictionary) = decode_symbols(&symbols(frame))?;

    trace!(
        frame_len = frame.len(),
        payload_len = payload.len(),
        learned = dictionary.learned().len(),
        "Frame decoded"
    );

    Ok(payload)
}

/// Decodes a symbol sequence, returning the payload and the grown dictionary.
///
/// # Errors
///
/// Returns [`Error::EmptyReference`] if a self-referencing code appears while
/// the previous entry is empty.
pub fn decode_symbols(input: &[Symbol]) -> Result<(Vec<u8>, Dictionary)> {
    let mut dictionary = Dictionary::new();

    let Some((&first, rest)) = input.split_first() else {
        return Ok((Vec::new(), dictionary));
    };

    // Only the low byte of the first symbol is meaningful.
    let first = first as u8;
    let mut output = Vec::with_capacity(input.len() * 2);
    output.push(first);
    let mut previous = vec![first];

    for (offset, &code) in rest.iter().enumerate() {
        let entry = match dictionary.get(code) {
            Some(sequence) => sequence.to_vec(),
            None => {
                let Some(&head) = previous.first() else {
                    return Err(Error::empty_reference(offset + 1));
                };
                let mut sequence = previous.clone();
                sequence.push(head);
                sequence
            }
        };

        output.extend_from_slice(&entry);

        if let Some(&head) = entry.first() {
            let mut sequence = previous;
            sequence.push(head);
            dictionary.learn(sequence);
        }

        previous = entry;
    }

    Ok((output, dictionary))
}

// ============================================================================
// Test Encoder
// ============================================================================

/// Encoder matching [`decode_symbols`], used to build fixtures.
#[cfg(test)]
pub(crate) fn encode_symbols(input: &[u8]) -> Vec<Symbol> {
    use std::collections::HashMap;

    let mut codes: HashMap<Vec<u8>, Symbol> =
        (0..=u8::MAX).map(|b| (vec![b], Symbol::from(b))).collect();
    let mut next = Dictionary::FIRST_LEARNED;
    let mut output = Vec::new();
    let mut current: Vec<u8> = Vec::new();

    for &byte in input {
        let mut candidate = current.clone();
        candidate.push(byte);

        if codes.contains_key(&candidate) {
            current = candidate;
        } else {
            output.push(codes[&current]);
            codes.insert(candidate, next);
            next += 1;
            current = vec![byte];
        }
    }

    if !current.is_empty() {
        output.push(codes[&current]);
    }

    output
}

/// Encodes `input` into a raw text frame as the feed sends it.
#[cfg(test)]
pub(crate) fn encode_frame(input: &[u8]) -> Vec<u8> {
    encode_symbols(input)
        .into_iter()
        .map(|code| char::from_u32(code).expect("code outside the surrogate range"))
        .collect::<String>()
        .into_bytes()
}

// ============================================================================
// Tests
// ============================================================================
