//! Color pair table.
//!
//! Pairs 1-255 are user-defined (foreground, background) RGB pairs; pair 0
//! is the reserved white-on-black default and cannot be initialized. Lookup
//! misses resolve to the default, and the REVERSE attribute swaps the two at
//! lookup time without touching the table.

use crate::{Attributes, Error, Result, Rgb};

pub const DEFAULT_FG: Rgb = Rgb::WHITE;
pub const DEFAULT_BG: Rgb = Rgb::BLACK;

const PAIR_COUNT: usize = 256;

#[derive(Debug, Clone)]
pub struct ColorPairs {
    pairs: [Option<(Rgb, Rgb)>; PAIR_COUNT],
}

impl ColorPairs {
    pub fn new() -> Self {
        ColorPairs { pairs: [None; PAIR_COUNT] }
    }

    /// Define or overwrite pair `pair` (1-255). Individual pairs cannot be
    /// cleared once set.
    pub fn set(&mut self, pair: u16, fg: Rgb, bg: Rgb) -> Result<()> {
        if pair == 0 || pair as usize >= PAIR_COUNT {
            return Err(Error::InvalidPairId(i64::from(pair)));
        }
        self.pairs[pair as usize] = Some((fg, bg));
        Ok(())
    }

    /// `(fg, bg)` for a pair; misses fall back to the default.
    pub fn get(&self, pair: u16) -> (Rgb, Rgb) {
        self.pairs
            .get(pair as usize)
            .copied()
            .flatten()
            .unwrap_or((DEFAULT_FG, DEFAULT_BG))
    }

    /// `(fg, bg)` for a pair with the REVERSE swap applied.
    pub fn effective(&self, pair: u16, attrs: Attributes) -> (Rgb, Rgb) {
        let (fg, bg) = self.get(pair);
        if attrs.contains(Attributes::REVERSE) {
            (bg, fg)
        } else {
            (fg, bg)
        }
    }

    /// Forget every user-defined pair (backend shutdown).
    pub fn clear(&mut self) {
        self.pairs = [None; PAIR_COUNT];
    }
}

impl Default for ColorPairs {
    fn default() -> Self {
        Self::new()
    }
}
