//! MiMC permutation hash over the BN254 scalar field.
//!
//! The compression follows the Miyaguchi-Preneel scheme used by gnark: every
//! input element is encrypted with the running state as key and folded back
//! into that state. Round constants are derived from a seed string by
//! repeated legacy Keccak-256.

use std::fmt;

use ark_bn254::Fr;
use ark_ff::{BigInteger, Field, PrimeField, Zero};
use sha3::{Digest, Keccak256};

use crate::budget::StepBudget;
use crate::config::ConfigError;

/// Element of the BN254 scalar field.
pub type FieldElement = Fr;

/// Maps a signed integer into the field; negative values wrap to `p - |v|`.
pub fn field_from_i64(value: i64) -> FieldElement {
    if value < 0 {
        -Fr::from(value.unsigned_abs())
    } else {
        Fr::from(value as u64)
    }
}

/// Big-endian 32 byte encoding of a field element.
pub fn field_to_bytes(value: &FieldElement) -> [u8; 32] {
    let mut out = [0u8; 32];
    let bytes = value.into_bigint().to_bytes_be();
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Lower-case hex, left padded to 64 digits.
pub fn field_to_hex(value: &FieldElement) -> String {
    LocationHash::from_field(value).to_string()
}

/// A hash digest identifying a sector location (and the planet on it).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LocationHash([u8; 32]);

impl LocationHash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_field(value: &FieldElement) -> Self {
        Self(field_to_bytes(value))
    }

    /// Parses up to 64 hex digits; shorter input is treated as left padded.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches("0x");
        if hex.is_empty() || hex.len() > 64 || !hex.is_ascii() {
            return None;
        }
        let padded = format!("{hex:0>64}");
        let mut bytes = [0u8; 32];
        for (index, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&padded[index * 2..index * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Digest reduced modulo 16.
    pub fn low_nibble(&self) -> u8 {
        self.0[31] & 0x0f
    }
}

impl fmt::Display for LocationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for LocationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocationHash({self})")
    }
}

/// Outcome of advancing a [`SumTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Yield,
    Done(FieldElement),
}

/// Seeded MiMC hasher with an input buffer and a running state.
#[derive(Clone)]
pub struct PermutationHash {
    constants: Vec<FieldElement>,
    pending: Vec<FieldElement>,
    state: FieldElement,
}

impl fmt::Debug for PermutationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermutationHash")
            .field("rounds", &self.constants.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl PermutationHash {
    pub fn new(seed: &str, rounds: u32) -> Result<Self, ConfigError> {
        if rounds == 0 {
            return Err(ConfigError::Invalid(format!(
                "hash seeded with {seed:?} needs at least one round"
            )));
        }
        let mut rnd = Keccak256::digest(seed.as_bytes());
        let constants = (0..rounds)
            .map(|_| {
                rnd = Keccak256::digest(rnd.as_slice());
                Fr::from_be_bytes_mod_order(rnd.as_slice())
            })
            .collect();
        Ok(Self {
            constants,
            pending: Vec::new(),
            state: Fr::zero(),
        })
    }

    pub fn rounds(&self) -> usize {
        self.constants.len()
    }

    pub fn constants(&self) -> &[FieldElement] {
        &self.constants
    }

    pub fn state(&self) -> FieldElement {
        self.state
    }

    pub fn write(&mut self, elements: &[FieldElement]) {
        self.pending.extend_from_slice(elements);
    }

    /// Folds all pending input into the state and returns it.
    pub fn sum(&mut self) -> FieldElement {
        match self.start_sum().advance(usize::MAX) {
            Step::Done(digest) => digest,
            Step::Yield => unreachable!("unbounded advance always completes"),
        }
    }

    /// Starts a resumable sum over the pending input.
    ///
    /// The pending buffer is consumed immediately. The state is only updated
    /// once the task reports [`Step::Done`]; dropping it earlier leaves the
    /// state untouched.
    pub fn start_sum(&mut self) -> SumTask<'_> {
        let input = std::mem::take(&mut self.pending);
        let state = self.state;
        let x = input.first().copied().unwrap_or_else(Fr::zero);
        SumTask {
            hasher: self,
            input,
            element: 0,
            round: 0,
            x,
            state,
        }
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.state = Fr::zero();
    }

    /// Hashes `elements` from a zero state and resets afterwards.
    pub fn digest(&mut self, elements: &[FieldElement]) -> FieldElement {
        self.reset();
        self.write(elements);
        let digest = self.sum();
        self.reset();
        digest
    }

    pub fn digest_i64(&mut self, values: &[i64]) -> FieldElement {
        let elements: Vec<FieldElement> = values.iter().copied().map(field_from_i64).collect();
        self.digest(&elements)
    }
}

/// A sum in progress, advanced a bounded number of rounds at a time.
pub struct SumTask<'a> {
    hasher: &'a mut PermutationHash,
    input: Vec<FieldElement>,
    element: usize,
    round: usize,
    x: FieldElement,
    state: FieldElement,
}

impl SumTask<'_> {
    /// Runs at most `max_rounds` permutation rounds.
    pub fn advance(&mut self, max_rounds: usize) -> Step {
        let mut budget = max_rounds;
        while self.element < self.input.len() {
            let constants = &self.hasher.constants;
            while self.round < constants.len() {
                if budget == 0 {
                    return Step::Yield;
                }
                let t = self.x + self.state + constants[self.round];
                self.x = t.square().square() * t;
                self.round += 1;
                budget -= 1;
            }
            let e = self.input[self.element];
            let r = self.x + self.state + e;
            self.state += r;
            self.element += 1;
            self.round = 0;
            if let Some(next) = self.input.get(self.element) {
                self.x = *next;
            }
        }
        self.hasher.state = self.state;
        Step::Done(self.state)
    }

    /// Spends what is left of the frame allowance in `budget`.
    pub fn advance_within(&mut self, budget: &mut StepBudget) -> Step {
        let before = self.remaining_rounds();
        let step = self.advance(budget.remaining());
        budget.charge(before - self.remaining_rounds());
        step
    }

    /// Rounds still to run before completion.
    pub fn remaining_rounds(&self) -> usize {
        let per_element = self.hasher.constants.len();
        let left_elements = self.input.len().saturating_sub(self.element);
        (left_elements * per_element).saturating_sub(self.round)
    }
}
