//! Display price lookup per color preset

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::color::ColorPreset;

/// Static price per preset key
///
/// Unknown keys resolve to the "original" price. There is no currency handling;
/// prices are whole display units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable {
    prices: BTreeMap<String, u32>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::from_pairs([
            ("original", 25_000),
            ("red", 27_000),
            ("green", 26_000),
            ("blue", 28_000),
            ("gray", 25_500),
        ])
    }
}

impl PriceTable {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        Self {
            prices: pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    /// Price of the untouched car
    pub fn original(&self) -> u32 {
        self.prices
            .get(ColorPreset::Original.key())
            .copied()
            .unwrap_or_default()
    }

    /// Price for a preset key, falling back to the original price
    pub fn price_for(&self, key: &str) -> u32 {
        self.prices
            .get(key)
            .copied()
            .unwrap_or_else(|| self.original())
    }

    pub fn price(&self, preset: ColorPreset) -> u32 {
        self.price_for(preset.key())
    }
}

/// Render a price with thousands separators, e.g. `$27,000`
pub fn format_price(price: u32) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
