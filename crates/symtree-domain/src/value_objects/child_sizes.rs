use super::SymbolType;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Per-type size breakdown of everything below a container
///
/// Only types that actually contributed are present, so a type whose
/// contributions cancel out to zero is still distinguishable from one that
/// never appeared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct ChildSizes {
    sizes: [Option<f64>; SymbolType::COUNT],
}

impl ChildSizes {
    /// Empty breakdown
    pub const fn new() -> Self {
        Self {
            sizes: [None; SymbolType::COUNT],
        }
    }

    /// Breakdown with a single contribution
    pub fn single(symbol_type: SymbolType, size: f64) -> Self {
        let mut sizes = Self::new();
        sizes.add(symbol_type, size);
        sizes
    }

    /// Add `size` to the running sum of `symbol_type`
    pub fn add(&mut self, symbol_type: SymbolType, size: f64) {
        let slot = &mut self.sizes[symbol_type.index()];
        *slot = Some(slot.unwrap_or(0.0) + size);
    }

    /// Add every contribution of `other`
    pub fn merge(&mut self, other: &ChildSizes) {
        for (symbol_type, size) in other.iter() {
            self.add(symbol_type, size);
        }
    }

    /// Accumulated size for `symbol_type`, if it ever contributed
    pub fn get(&self, symbol_type: SymbolType) -> Option<f64> {
        self.sizes[symbol_type.index()]
    }

    /// Contributions in canonical type order
    pub fn iter(&self) -> impl Iterator<Item = (SymbolType, f64)> + '_ {
        SymbolType::ALL
            .iter()
            .filter_map(|symbol_type| self.get(*symbol_type).map(|size| (*symbol_type, size)))
    }

    /// Sum of all contributions
    pub fn total(&self) -> f64 {
        self.iter().map(|(_, size)| size).sum()
    }

    /// True when nothing contributed yet
    pub fn is_empty(&self) -> bool {
        self.sizes.iter().all(Option::is_none)
    }

    /// Type with the largest accumulated size.
    ///
    /// Exact ties go to the type that comes first in canonical order, so the
    /// answer does not depend on the order contributions arrived in.
    pub fn dominant(&self) -> Option<SymbolType> {
        let mut best: Option<(SymbolType, f64)> = None;
        for (symbol_type, size) in self.iter() {
            match best {
                Some((_, best_size)) if size <= best_size => {}
                _ => best = Some((symbol_type, size)),
            }
        }
        best.map(|(symbol_type, _)| symbol_type)
    }
}

impl Serialize for ChildSizes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (symbol_type, size) in self.iter() {
            map.serialize_entry(&symbol_type, &size)?;
        }
        map.end()
    }
}

impl TryFrom<BTreeMap<String, f64>> for ChildSizes {
    type Error = String;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut sizes = ChildSizes::new();
        for (code, size) in raw {
            let mut chars = code.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => sizes.add(SymbolType::from_code(c), size),
                _ => return Err(format!("invalid type code `{code}` in child sizes")),
            }
        }
        Ok(sizes)
    }
}
