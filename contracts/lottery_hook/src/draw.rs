use ink::env::hash::{HashOutput, Keccak256};

use crate::constants::{LUCKY_NUMBER, MAX_NUMBER};

/// Block-level inputs mixed into the hashed outcome.
///
/// Predictable by anyone who can see the block. Not a secure random source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode)]
pub struct DrawEntropy {
    pub block_number: u32,
    pub block_timestamp: u64,
}

/// Maps a counter value to a drawn number in `[1, MAX_NUMBER]`.
pub trait OutcomeSource {
    fn outcome(&self, counter: u64, entropy: &DrawEntropy) -> u8;
}

/// Every draw is hashed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedOutcome;

impl OutcomeSource for HashedOutcome {
    fn outcome(&self, counter: u64, entropy: &DrawEntropy) -> u8 {
        hashed_number(counter, entropy)
    }
}

/// Even counter values always draw `LUCKY_NUMBER`; odd ones are hashed.
/// Makes every second swap a winner, which deterministic setups rely on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParityOutcome;

impl OutcomeSource for ParityOutcome {
    fn outcome(&self, counter: u64, entropy: &DrawEntropy) -> u8 {
        if counter % 2 == 0 {
            LUCKY_NUMBER
        } else {
            hashed_number(counter, entropy)
        }
    }
}

/// Outcome source selected when the hook is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub enum DrawMode {
    /// `ParityOutcome`.
    Parity,
    /// `HashedOutcome`.
    Hashed,
}

impl OutcomeSource for DrawMode {
    fn outcome(&self, counter: u64, entropy: &DrawEntropy) -> u8 {
        match self {
            DrawMode::Parity => ParityOutcome.outcome(counter, entropy),
            DrawMode::Hashed => HashedOutcome.outcome(counter, entropy),
        }
    }
}

/// `(keccak256(counter ‖ entropy)[0..8] as u64 % MAX_NUMBER) + 1`
pub fn hashed_number(counter: u64, entropy: &DrawEntropy) -> u8 {
    let mut digest = <Keccak256 as HashOutput>::Type::default();
    ink::env::hash_encoded::<Keccak256, _>(&(counter, entropy), &mut digest);

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[0..8]);
    let raw = u64::from_be_bytes(head);
    // Remainder is below MAX_NUMBER, so the cast cannot truncate.
    (raw % u64::from(MAX_NUMBER)) as u8 + 1
}

/// Result of one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    /// Counter value the draw was taken at.
    pub counter: u64,
    pub number: u8,
    pub won: bool,
}

/// Call counter shared by every swap the hook settles. Never reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct DrawState {
    counter: u64,
}

impl DrawState {
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Advances the counter by one and draws at the new value.
    pub fn draw<S: OutcomeSource + ?Sized>(&mut self, source: &S, entropy: &DrawEntropy) -> Draw {
        self.counter = self.counter.wrapping_add(1);
        let number = source.outcome(self.counter, entropy);
        Draw {
            counter: self.counter,
            number,
            won: number == LUCKY_NUMBER,
        }
    }

    /// Number the next `draw` would produce under the same entropy.
    pub fn preview<S: OutcomeSource + ?Sized>(&self, source: &S, entropy: &DrawEntropy) -> u8 {
        source.outcome(self.counter.wrapping_add(1), entropy)
    }
}
