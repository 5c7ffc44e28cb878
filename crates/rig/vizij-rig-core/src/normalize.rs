//! Joint name normalization.
//!
//! Rigs from different tools spell the same joint many ways
//! (`mixamorig:LeftArm`, `Left_Arm`, `left.arm.001`). Normalization folds
//! those spellings into one comparison key; it is pure and idempotent.

use serde::{Deserialize, Serialize};

/// How aggressively names are folded.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// Lower-case, drop namespace prefix and separators.
    Loose,
    /// `Loose` plus dropping ASCII digits (`Spine1` == `spine`).
    #[default]
    Strict,
}

#[inline]
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '_' | '-' | '.')
}

/// Drop an exporter namespace such as `mixamorig:` or `Armature|`.
fn strip_namespace(raw: &str) -> &str {
    match raw.rfind(|c: char| c == ':' || c == '|') {
        Some(pos) => &raw[pos + 1..],
        None => raw,
    }
}

/// Canonicalize a raw joint name for comparison.
pub fn normalize_name(raw: &str, mode: NormalizeMode) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in strip_namespace(raw).chars() {
        if is_separator(c) || (mode == NormalizeMode::Strict && c.is_ascii_digit()) {
            continue;
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Mutual substring containment on normalized names.
///
/// Either direction counts, so the result does not depend on operand order.
/// The contained (shorter) name must have at least `min_len` characters;
/// otherwise one-letter names like `l` would overlap almost everything.
pub fn names_overlap(a: &str, b: &str, min_len: usize) -> bool {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if short.is_empty() || short.chars().count() < min_len {
        return false;
    }
    long.contains(short)
}

/// Left/right side of a joint as far as its name tells.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Infer the side marker of a raw name.
///
/// Checks whole words first (`left`, `hidari`, `左` / `right`, `migi`, `右`),
/// then single-letter tokens such as `L_Arm` or `arm.r`.
pub fn side_of(raw: &str) -> Option<Side> {
    let lowered = strip_namespace(raw).to_lowercase();
    let has_left = lowered.contains("left") || lowered.contains("hidari") || lowered.contains('左');
    let has_right = lowered.contains("right") || lowered.contains("migi") || lowered.contains('右');
    match (has_left, has_right) {
        (true, false) => return Some(Side::Left),
        (false, true) => return Some(Side::Right),
        (true, true) => return None,
        (false, false) => {}
    }
    let mut side = None;
    for token in lowered.split(|c: char| is_separator(c) || c.is_ascii_digit()) {
        let found = match token {
            "l" => Some(Side::Left),
            "r" => Some(Side::Right),
            _ => None,
        };
        if found.is_some() {
            if side.is_some() && side != found {
                return None;
            }
            side = found;
        }
    }
    side
}
