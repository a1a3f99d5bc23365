//! Static registry of trigger effect definitions.
//!
//! Every effect the toolkit understands has a fixed, ordered parameter list
//! with a byte range per slot. Definitions are process constants; nothing
//! mutates them after startup.

/// One named parameter, or a run of identical slots when `count > 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Display label, used by the UI and diagnostics only.
    pub label: &'static str,
    pub min: u8,
    pub max: u8,
    /// Number of consecutive byte slots sharing this range. Always >= 1.
    pub count: usize,
}

impl ParamSpec {
    const fn scalar(label: &'static str, min: u8, max: u8) -> Self {
        Self { label, min, max, count: 1 }
    }

    const fn array(label: &'static str, min: u8, max: u8, count: usize) -> Self {
        Self { label, min, max, count }
    }
}

/// Which transport command an effect maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Feedback,
    Weapon,
    Vibration,
    SlopeFeedback,
    MultiPositionFeedback,
    MultiPositionVibration,
}

/// An effect channel: name, command kind, and parameter layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectDef {
    pub name: &'static str,
    pub kind: EffectKind,
    pub params: &'static [ParamSpec],
}

impl EffectDef {
    /// Total byte length of this effect's parameter vector.
    pub fn required_len(&self) -> usize {
        self.params.iter().map(|p| p.count).sum()
    }

    /// Per-slot `(min, max)` ranges with repetition counts expanded.
    pub fn slot_ranges(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.params
            .iter()
            .flat_map(|p| std::iter::repeat((p.min, p.max)).take(p.count))
    }
}

const DEFINITIONS: &[EffectDef] = &[
    EffectDef {
        name: "Feedback",
        kind: EffectKind::Feedback,
        params: &[
            ParamSpec::scalar("Position", 0, 9),
            ParamSpec::scalar("Strength", 0, 8),
        ],
    },
    EffectDef {
        name: "Weapon",
        kind: EffectKind::Weapon,
        params: &[
            ParamSpec::scalar("Start Position", 2, 7),
            ParamSpec::scalar("End Position", 3, 8),
            ParamSpec::scalar("Strength", 0, 8),
        ],
    },
    EffectDef {
        name: "Vibration",
        kind: EffectKind::Vibration,
        params: &[
            ParamSpec::scalar("Position", 0, 9),
            ParamSpec::scalar("Amplitude", 0, 8),
            ParamSpec::scalar("Frequency", 0, 255),
        ],
    },
    EffectDef {
        name: "Slope Feedback",
        kind: EffectKind::SlopeFeedback,
        params: &[
            ParamSpec::scalar("Start Position", 0, 8),
            ParamSpec::scalar("End Position", 1, 9),
            ParamSpec::scalar("Start Strength", 1, 8),
            ParamSpec::scalar("End Strength", 1, 8),
        ],
    },
    EffectDef {
        name: "Multi-Pos Feedback",
        kind: EffectKind::MultiPositionFeedback,
        params: &[ParamSpec::array("Strength", 0, 8, 10)],
    },
    EffectDef {
        name: "Multi-Pos Vibration",
        kind: EffectKind::MultiPositionVibration,
        params: &[
            ParamSpec::scalar("Frequency", 0, 255),
            ParamSpec::array("Amplitude", 0, 8, 10),
        ],
    },
];

/// All effect definitions, in catalog order.
pub fn definitions() -> &'static [EffectDef] {
    DEFINITIONS
}

/// Look up a definition by channel name.
pub fn find(name: &str) -> Option<&'static EffectDef> {
    DEFINITIONS.iter().find(|d| d.name == name)
}

/// Clamp a raw parameter vector against a definition.
///
/// The result always has length `def.required_len()`: missing slots are
/// zero-padded before clamping (so they land on the slot minimum), excess
/// input is truncated, and every byte ends up inside its slot's `[min, max]`.
pub fn clamp_vector(def: &EffectDef, raw: &[u8]) -> Vec<u8> {
    def.slot_ranges()
        .enumerate()
        .map(|(i, (min, max))| raw.get(i).copied().unwrap_or(0).clamp(min, max))
        .collect()
}
