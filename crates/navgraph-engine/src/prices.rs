//! Dense shared price store.
//!
//! One `f64` per component, indexed by [`Slot`]. NaN marks an unknown price.
//! Writes only ever store finite values, so a known slot never becomes
//! unknown again.

use navgraph_core::Slot;

/// Shared price buffer owned by the valuation graph.
#[derive(Debug, Clone)]
pub struct PriceStore {
    values: Vec<f64>,
}

impl PriceStore {
    /// Creates a store of `len` unknown prices.
    pub fn unknown(len: usize) -> Self {
        Self {
            values: vec![f64::NAN; len],
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the store has no slots.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Price in `slot`, if known.
    pub fn get(&self, slot: Slot) -> Option<f64> {
        let v = self.values[slot.index()];
        (!v.is_nan()).then_some(v)
    }

    /// Raw value, NaN when unknown.
    pub fn raw(&self, slot: Slot) -> f64 {
        self.values[slot.index()]
    }

    /// Returns true once `slot` holds a price.
    pub fn is_known(&self, slot: Slot) -> bool {
        !self.values[slot.index()].is_nan()
    }

    /// Stores `value`; returns true if the slot changed.
    ///
    /// Non-finite values are ignored and reported as unchanged.
    pub fn set(&mut self, slot: Slot, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let current = &mut self.values[slot.index()];
        if *current == value {
            return false;
        }
        *current = value;
        true
    }

    /// Adds `delta` to a known slot; returns true if the slot changed.
    ///
    /// Unknown slots are left untouched.
    pub fn add(&mut self, slot: Slot, delta: f64) -> bool {
        match self.get(slot) {
            Some(current) => self.set(slot, current + delta),
            None => false,
        }
    }

    /// Number of slots holding a price.
    pub fn known_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// Weighted sum over `holdings`, or `None` if any input is unknown.
    pub fn dot<I>(&self, holdings: I) -> Option<f64>
    where
        I: IntoIterator<Item = (Slot, f64)>,
    {
        let mut total = 0.0;
        for (slot, weight) in holdings {
            total += weight * self.get(slot)?;
        }
        Some(total)
    }
}
