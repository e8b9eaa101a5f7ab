//! Simple truth values: a strength and a confidence, both in [0, 1].

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthValue {
    pub strength: f64,
    pub confidence: f64,
}

impl TruthValue {
    pub const TRUE: TruthValue = TruthValue { strength: 1.0, confidence: 1.0 };
    pub const FALSE: TruthValue = TruthValue { strength: 0.0, confidence: 1.0 };
    /// Assigned to every newly created atom.
    pub const DEFAULT: TruthValue = TruthValue { strength: 1.0, confidence: 0.0 };

    /// Build a truth value, clamping both components into [0, 1].
    /// NaN components become 0.
    pub fn new(strength: f64, confidence: f64) -> Self {
        Self { strength: clamp_unit(strength), confidence: clamp_unit(confidence) }
    }

    pub fn from_bool(b: bool) -> Self {
        if b { Self::TRUE } else { Self::FALSE }
    }

    pub fn is_true(&self) -> bool {
        self.strength > 0.5
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    pub fn negate(&self) -> Self {
        Self { strength: 1.0 - self.strength, confidence: self.confidence }
    }
}

impl Default for TruthValue {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

impl fmt::Display for TruthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(stv {} {})", self.strength, self.confidence)
    }
}
