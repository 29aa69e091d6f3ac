//! Dice Notation Parser
//!
//! Parses the die-roll notation used by `die_roll` distributions:
//! - Single die: d4, d20 (count defaults to 1)
//! - Compound dice: 2d5, 3d8+5, 4d6-2
//! - Percentile: d%, read as d100
//!
//! ## Examples
//!
//! ```rust
//! use raveling::core::distributions::dice::{DiceNotation, DiceRoller};
//!
//! let notation = DiceNotation::parse("2d6+3").unwrap();
//! assert_eq!(notation.count, 2);
//! assert_eq!(notation.sides, 6);
//! assert_eq!(notation.modifier, 3);
//!
//! let result = DiceRoller::new().roll(&notation);
//! assert!(result.total >= 5 && result.total <= 15);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during dice notation parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid die notation: {0}")]
    InvalidNotation(String),

    #[error("Invalid dice count: must be between 1 and {max}, got {got}")]
    InvalidCount { max: u32, got: u32 },

    #[error("Invalid dice sides: must be greater than 0, got {0}")]
    InvalidSides(u32),

    #[error("Empty notation")]
    EmptyNotation,
}

/// Result type for dice operations
pub type DiceResult<T> = Result<T, DiceError>;

// ============================================================================
// Dice Notation
// ============================================================================

/// Parsed dice notation with count, sides, and modifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceNotation {
    /// Number of dice to roll
    pub count: u32,
    /// Faces per die
    pub sides: u32,
    /// Added after summing the dice
    pub modifier: i32,
}

impl DiceNotation {
    /// Maximum number of dice allowed in a single roll
    pub const MAX_DICE_COUNT: u32 = 100;

    pub fn new(count: u32, sides: u32, modifier: i32) -> DiceResult<Self> {
        if count == 0 || count > Self::MAX_DICE_COUNT {
            return Err(DiceError::InvalidCount {
                max: Self::MAX_DICE_COUNT,
                got: count,
            });
        }
        if sides == 0 {
            return Err(DiceError::InvalidSides(sides));
        }
        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    /// Parse a dice notation string
    ///
    /// Supported formats:
    /// - "d20" -> 1d20
    /// - "2d5" -> 2d5
    /// - "3d8+5" -> 3d8+5
    /// - "d20-2" -> 1d20-2
    /// - "d%" -> 1d100
    pub fn parse(notation: &str) -> DiceResult<Self> {
        let notation = notation.trim().to_lowercase();

        if notation.is_empty() {
            return Err(DiceError::EmptyNotation);
        }

        let notation = notation.replace("d%", "d100");
        let invalid = || DiceError::InvalidNotation(notation.clone());

        let d_pos = notation.find('d').ok_or_else(invalid)?;

        let count_str = &notation[..d_pos];
        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str.parse().map_err(|_| invalid())?
        };

        let rest = &notation[d_pos + 1..];

        let (sides_str, modifier) = if let Some(pos) = rest.find('+') {
            let modifier: i32 = rest[pos + 1..].parse().map_err(|_| invalid())?;
            (&rest[..pos], modifier)
        } else if let Some(pos) = rest.rfind('-') {
            if pos == 0 {
                return Err(invalid());
            }
            // Keep the minus sign
            let modifier: i32 = rest[pos..].parse().map_err(|_| invalid())?;
            (&rest[..pos], modifier)
        } else {
            (rest, 0)
        };

        // Reject signs inside the sides field ("d+6") which u32 parsing accepts.
        if sides_str.is_empty() || !sides_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let sides: u32 = sides_str.parse().map_err(|_| invalid())?;

        Self::new(count, sides, modifier)
    }

    /// Smallest possible total
    pub fn min(&self) -> i64 {
        self.count as i64 + self.modifier as i64
    }

    /// Largest possible total
    pub fn max(&self) -> i64 {
        self.count as i64 * self.sides as i64 + self.modifier as i64
    }

    /// Expected total
    pub fn average(&self) -> f64 {
        let die_average = (1.0 + self.sides as f64) / 2.0;
        self.count as f64 * die_average + self.modifier as f64
    }
}

impl fmt::Display for DiceNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.count, self.sides),
            m if m > 0 => write!(f, "{}d{}+{}", self.count, self.sides, m),
            m => write!(f, "{}d{}{}", self.count, self.sides, m),
        }
    }
}

impl std::str::FromStr for DiceNotation {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Roll Result
// ============================================================================

/// Complete result of a dice roll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollResult {
    /// Individual die results
    pub rolls: Vec<u32>,
    /// Sum of all dice (before modifier)
    pub subtotal: i64,
    /// Final total (after modifier)
    pub total: i64,
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rolls: Vec<String> = self.rolls.iter().map(|r| r.to_string()).collect();
        write!(f, "[{}] = {}", rolls.join(", "), self.total)
    }
}

// ============================================================================
// Dice Roller
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct DiceRoller;

impl DiceRoller {
    pub fn new() -> Self {
        Self
    }

    /// Roll with the thread-local RNG
    pub fn roll(&self, notation: &DiceNotation) -> RollResult {
        let mut rng = rand::thread_rng();
        self.roll_with_rng(notation, &mut rng)
    }

    /// Roll dice with a specific RNG (seeded in tests)
    pub fn roll_with_rng<R: Rng + ?Sized>(&self, notation: &DiceNotation, rng: &mut R) -> RollResult {
        let rolls: Vec<u32> = (0..notation.count)
            .map(|_| rng.gen_range(1..=notation.sides))
            .collect();
        let subtotal: i64 = rolls.iter().map(|&v| v as i64).sum();

        RollResult {
            rolls,
            subtotal,
            total: subtotal + notation.modifier as i64,
        }
    }

    /// Parse and roll in one step
    pub fn quick_roll(&self, notation: &str) -> DiceResult<RollResult> {
        let parsed = DiceNotation::parse(notation)?;
        Ok(self.roll(&parsed))
    }
}

// ============================================================================
// Tests
// ============================================================================
