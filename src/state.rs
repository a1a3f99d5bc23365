//! Current parameter values per effect channel.

use std::collections::{BTreeMap, HashMap};

use crate::catalog;

/// The live parameter vector for every catalog channel.
///
/// Vectors always have their channel's required length; edits and preset
/// loads clamp to each slot's range, so a vector handed out of here is
/// already dispatchable.
pub struct ChannelBank {
    values: HashMap<String, Vec<u8>>,
}

impl ChannelBank {
    /// Every channel starts with each slot at its minimum.
    pub fn new() -> Self {
        let values = catalog::definitions()
            .iter()
            .map(|def| {
                let vector: Vec<u8> = def.slot_ranges().map(|(min, _)| min).collect();
                (def.name.to_string(), vector)
            })
            .collect();
        Self { values }
    }

    pub fn values(&self, channel: &str) -> Option<&[u8]> {
        self.values.get(channel).map(|v| v.as_slice())
    }

    /// Set one slot, clamped to its range.
    pub fn set_slot(&mut self, channel: &str, slot: usize, value: u8) -> Result<(), String> {
        let def = catalog::find(channel).ok_or_else(|| format!("unknown effect: {channel}"))?;
        let (min, max) = def
            .slot_ranges()
            .nth(slot)
            .ok_or_else(|| format!("{channel} has no slot {slot}"))?;
        if let Some(vector) = self.values.get_mut(channel) {
            vector[slot] = value.clamp(min, max);
        }
        Ok(())
    }

    /// Restore every channel to per-slot minimums.
    pub fn reset(&mut self) {
        for def in catalog::definitions() {
            if let Some(vector) = self.values.get_mut(def.name) {
                for (slot, (min, _)) in def.slot_ranges().enumerate() {
                    vector[slot] = min;
                }
            }
        }
    }

    /// Overwrite channels present in `loaded`, channel by channel, slot by
    /// slot up to `min(existing, loaded)` length, clamping each value.
    /// Channels absent from `loaded` are untouched; names not in the catalog
    /// are skipped. An undersized vector leaves the tail slots as they were.
    pub fn apply_partial(&mut self, loaded: &BTreeMap<String, Vec<u8>>) {
        for (name, incoming) in loaded {
            let Some(def) = catalog::find(name) else {
                log::debug!("preset channel {name:?} not in catalog, skipped");
                continue;
            };
            let Some(existing) = self.values.get_mut(def.name) else {
                continue;
            };
            let n = existing.len().min(incoming.len());
            for (slot, (min, max)) in def.slot_ranges().take(n).enumerate() {
                existing[slot] = incoming[slot].clamp(min, max);
            }
        }
    }

    /// Channel name to vector, in deterministic (sorted) order.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.values
            .iter()
            .map(|(name, vector)| (name.clone(), vector.clone()))
            .collect()
    }
}

impl Default for ChannelBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bank_sits_at_slot_minimums() {
        let bank = ChannelBank::new();
        assert_eq!(bank.values("Feedback").unwrap(), &[0, 0]);
        assert_eq!(bank.values("Weapon").unwrap(), &[2, 3, 0]);
        assert_eq!(bank.values("Multi-Pos Feedback").unwrap().len(), 10);
    }

    #[test]
    fn set_slot_clamps_to_range() {
        let mut bank = ChannelBank::new();
        bank.set_slot("Feedback", 0, 200).unwrap();
        assert_eq!(bank.values("Feedback").unwrap()[0], 9);
        bank.set_slot("Weapon", 0, 0).unwrap();
        assert_eq!(bank.values("Weapon").unwrap()[0], 2);
    }

    #[test]
    fn set_slot_rejects_unknown_channel_and_slot() {
        let mut bank = ChannelBank::new();
        assert!(bank.set_slot("Rumble", 0, 1).is_err());
        assert!(bank.set_slot("Feedback", 2, 1).is_err());
    }

    #[test]
    fn reset_restores_minimums() {
        let mut bank = ChannelBank::new();
        bank.set_slot("Vibration", 2, 180).unwrap();
        bank.reset();
        assert_eq!(bank.values("Vibration").unwrap(), &[0, 0, 0]);
    }

    #[test]
    fn apply_partial_leaves_absent_channels_untouched() {
        let mut bank = ChannelBank::new();
        bank.set_slot("Weapon", 2, 5).unwrap();
        let mut loaded = BTreeMap::new();
        loaded.insert("Feedback".to_string(), vec![3, 4]);
        bank.apply_partial(&loaded);
        assert_eq!(bank.values("Feedback").unwrap(), &[3, 4]);
        assert_eq!(bank.values("Weapon").unwrap(), &[2, 3, 5]);
    }

    #[test]
    fn apply_partial_undersized_vector_keeps_tail() {
        let mut bank = ChannelBank::new();
        bank.set_slot("Vibration", 2, 100).unwrap();
        let mut loaded = BTreeMap::new();
        loaded.insert("Vibration".to_string(), vec![7]);
        bank.apply_partial(&loaded);
        assert_eq!(bank.values("Vibration").unwrap(), &[7, 0, 100]);
    }

    #[test]
    fn apply_partial_truncates_oversized_and_clamps() {
        let mut bank = ChannelBank::new();
        let mut loaded = BTreeMap::new();
        loaded.insert("Feedback".to_string(), vec![255, 255, 255, 255]);
        bank.apply_partial(&loaded);
        assert_eq!(bank.values("Feedback").unwrap(), &[9, 8]);
    }

    #[test]
    fn apply_partial_skips_unknown_channels() {
        let mut bank = ChannelBank::new();
        let mut loaded = BTreeMap::new();
        loaded.insert("Rumble".to_string(), vec![1, 2, 3]);
        bank.apply_partial(&loaded);
        assert_eq!(bank.values("Feedback").unwrap(), &[0, 0]);
    }
}
