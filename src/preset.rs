//! Preset encode/decode and file I/O.
//!
//! A preset is a flat JSON object mapping effect name to byte vector,
//! pretty-printed with deterministic (sorted) key order. Loading returns the
//! raw mapping; applying it to a [`ChannelBank`] is the partial overwrite
//! described on [`ChannelBank::apply_partial`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::state::ChannelBank;

pub fn encode(bank: &ChannelBank) -> Result<String, String> {
    serde_json::to_string_pretty(&bank.snapshot()).map_err(|e| e.to_string())
}

/// Parse a preset document. A malformed document is a single terminal error;
/// nothing is applied from it.
pub fn decode(text: &str) -> Result<BTreeMap<String, Vec<u8>>, String> {
    serde_json::from_str(text).map_err(|e| format!("malformed preset: {e}"))
}

pub fn save_file(path: &Path, bank: &ChannelBank) -> Result<(), String> {
    let text = encode(bank)?;
    fs::write(path, text).map_err(|e| format!("failed to write {}: {e}", path.display()))
}

pub fn load_file(path: &Path) -> Result<BTreeMap<String, Vec<u8>>, String> {
    let text =
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    decode(&text)
}
