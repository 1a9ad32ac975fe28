//! Tier color palette.
//!
//! Tiers reference colors by id only; the theme table that maps an id to real
//! colors lives with the renderer. The palette decides which id a tier gets.

use crate::types::ColorId;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

/// Default palette of 12 color ids, in the order default tiers take them.
pub const DEFAULT_PALETTE: &[&str] = &[
    "red", "orange", "amber", "yellow", "lime", "green", "teal", "cyan", "blue", "indigo",
    "violet", "pink",
];

/// An ordered, non-empty set of color ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<ColorId>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.iter().map(|c| ColorId::from(*c)).collect(),
        }
    }
}

impl Palette {
    /// Build a palette from configured ids, falling back to the default when
    /// the list is empty.
    pub fn new<I, S>(colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColorId>,
    {
        let mut unique: Vec<ColorId> = Vec::new();
        for color in colors {
            let color = color.into();
            if !unique.contains(&color) {
                unique.push(color);
            }
        }
        if unique.is_empty() {
            return Self::default();
        }
        Self { colors: unique }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[ColorId] {
        &self.colors
    }

    /// First palette color not in `used`, in palette order
    pub fn first_unused<'a, I>(&self, used: I) -> Option<ColorId>
    where
        I: IntoIterator<Item = &'a ColorId>,
    {
        let used: Vec<&ColorId> = used.into_iter().collect();
        self.colors.iter().find(|c| !used.contains(c)).cloned()
    }

    /// A uniformly random palette color
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> ColorId {
        self.colors
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| ColorId::from(DEFAULT_PALETTE[0]))
    }

    /// Draw `count` colors without replacement, refilling the bag from the
    /// full palette whenever it runs dry. No color repeats until every
    /// color has been used once.
    pub fn draw_distinct<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<ColorId> {
        let mut drawn = Vec::with_capacity(count);
        let mut bag: Vec<ColorId> = Vec::new();
        while drawn.len() < count {
            if bag.is_empty() {
                bag = self.colors.clone();
                bag.shuffle(rng);
            }
            if let Some(color) = bag.pop() {
                drawn.push(color);
            }
        }
        drawn
    }
}
