//! Synonym tables and the canonical type classifier.
//!
//! The table is read-only configuration: built once (the standard table is a
//! process-wide `Lazy`) and shared by every resolver through an `Arc`.
//! Entries are tested in priority order and the first type with a contained
//! synonym wins, so specific roles (fingers, upper chest, lower arms) are
//! listed before the general roles their names contain.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::normalize::{normalize_name, NormalizeMode};
use crate::taxonomy::CanonicalType::{self, *};

/// Raw synonym list for one canonical type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynonymEntry {
    pub ty: CanonicalType,
    pub synonyms: Vec<String>,
}

/// Result of classifying one normalized name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub ty: CanonicalType,
    /// The whole name is a synonym, not just a substring of it.
    pub exact: bool,
    /// Characters of the name not covered by the longest matching synonym.
    pub residual: usize,
}

/// Priority-ordered, pre-normalized synonym lists.
#[derive(Clone, Debug, PartialEq)]
pub struct SynonymTable {
    entries: Vec<(CanonicalType, Vec<String>)>,
    helper_markers: Vec<String>,
}

static STANDARD: Lazy<Arc<SynonymTable>> =
    Lazy::new(|| Arc::new(SynonymTable::from_entries(standard_entries(), NormalizeMode::Strict)));

/// Markers of auxiliary joints (twist/roll bones, end nubs) that share a
/// primary joint's name.
pub const HELPER_MARKERS: [&str; 8] = [
    "twist", "roll", "helper", "end", "nub", "adjust", "jiggle", "phys",
];

impl SynonymTable {
    /// Build a table; synonyms are normalized with `mode` and de-duplicated.
    /// Entry order is the classification priority.
    pub fn from_entries(entries: Vec<SynonymEntry>, mode: NormalizeMode) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let mut normalized: Vec<String> = Vec::with_capacity(entry.synonyms.len());
                for raw in &entry.synonyms {
                    let key = normalize_name(raw, mode);
                    if !key.is_empty() && !normalized.contains(&key) {
                        normalized.push(key);
                    }
                }
                (entry.ty, normalized)
            })
            .collect();
        SynonymTable {
            entries,
            helper_markers: HELPER_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// The built-in multilingual table.
    pub fn standard() -> Arc<SynonymTable> {
        Arc::clone(&STANDARD)
    }

    pub fn with_helper_markers(mut self, markers: Vec<String>) -> Self {
        self.helper_markers = markers;
        self
    }

    pub fn synonyms(&self, ty: CanonicalType) -> &[String] {
        self.entries
            .iter()
            .find(|(t, _)| *t == ty)
            .map(|(_, s)| s.as_slice())
            .unwrap_or(&[])
    }

    /// Priority order of the table.
    pub fn priority(&self) -> impl Iterator<Item = CanonicalType> + '_ {
        self.entries.iter().map(|(t, _)| *t)
    }

    /// Classify an already-normalized name.
    pub fn classify(&self, normalized: &str) -> Option<Classification> {
        if normalized.is_empty() {
            return None;
        }
        let name_len = normalized.chars().count();
        for (ty, synonyms) in &self.entries {
            let longest = synonyms
                .iter()
                .filter(|s| contains_synonym(normalized, s))
                .map(|s| s.chars().count())
                .max();
            if let Some(len) = longest {
                return Some(Classification {
                    ty: *ty,
                    exact: len == name_len,
                    residual: name_len - len,
                });
            }
        }
        None
    }

    /// True for twist/roll/end helpers that should lose ties against primary joints.
    pub fn is_helper(&self, normalized: &str) -> bool {
        self.helper_markers
            .iter()
            .any(|m| normalized.contains(m.as_str()))
    }
}

/// Heads of `upper`/`lower` whose trailing `r` would otherwise start a
/// right-side abbreviation (`upperarm` spells `rarm`, `lowerleg` spells `rleg`).
const STEM_HEADS: [&str; 2] = ["uppe", "lowe"];

fn contains_synonym(name: &str, synonym: &str) -> bool {
    name.match_indices(synonym).any(|(at, _)| {
        !(synonym.starts_with('r') && STEM_HEADS.iter().any(|h| name[..at].ends_with(*h)))
    })
}

/// Classifier bound to a synonym table and the name mode used by the run.
#[derive(Clone, Debug)]
pub struct TypeClassifier {
    table: Arc<SynonymTable>,
    mode: NormalizeMode,
}

impl TypeClassifier {
    pub fn new(table: Arc<SynonymTable>, mode: NormalizeMode) -> Self {
        TypeClassifier { table, mode }
    }

    pub fn table(&self) -> &SynonymTable {
        &self.table
    }

    pub fn mode(&self) -> NormalizeMode {
        self.mode
    }

    pub fn classify(&self, normalized: &str) -> Option<Classification> {
        self.table.classify(normalized)
    }

    /// Normalize then classify a raw joint name.
    pub fn classify_raw(&self, raw: &str) -> Option<Classification> {
        self.table.classify(&normalize_name(raw, self.mode))
    }
}

fn entry(ty: CanonicalType, synonyms: &[&str]) -> SynonymEntry {
    SynonymEntry {
        ty,
        synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
    }
}

/// Built-in synonyms: English conventions (Unity/Mixamo/Blender/UE), common
/// abbreviations, Japanese/Chinese labels and their romanizations.
pub fn standard_entries() -> Vec<SynonymEntry> {
    vec![
        // Fingers before hands: `LeftHandIndex1` contains `lefthand`.
        entry(LeftThumb, &["leftthumb", "l_thumb", "thumb_l", "lefthandthumb", "左親指", "親指_左", "hidari_oyayubi"]),
        entry(LeftIndex, &["leftindex", "l_index", "index_l", "lefthandindex", "左人差し指", "人差し指_左", "hidari_hitosashiyubi"]),
        entry(LeftMiddle, &["leftmiddle", "l_middle", "middle_l", "lefthandmiddle", "左中指", "中指_左", "hidari_nakayubi"]),
        entry(LeftRing, &["leftring", "l_ring", "ring_l", "lefthandring", "左薬指", "薬指_左", "hidari_kusuriyubi"]),
        entry(LeftLittle, &["leftlittle", "l_little", "little_l", "leftpinky", "l_pinky", "pinky_l", "lefthandpinky", "左小指", "小指_左", "hidari_koyubi"]),
        entry(RightThumb, &["rightthumb", "r_thumb", "thumb_r", "righthandthumb", "右親指", "親指_右", "migi_oyayubi"]),
        entry(RightIndex, &["rightindex", "r_index", "index_r", "righthandindex", "右人差し指", "人差し指_右", "migi_hitosashiyubi"]),
        entry(RightMiddle, &["rightmiddle", "r_middle", "middle_r", "righthandmiddle", "右中指", "中指_右", "migi_nakayubi"]),
        entry(RightRing, &["rightring", "r_ring", "ring_r", "righthandring", "右薬指", "薬指_右", "migi_kusuriyubi"]),
        entry(RightLittle, &["rightlittle", "r_little", "little_r", "rightpinky", "r_pinky", "pinky_r", "righthandpinky", "右小指", "小指_右", "migi_koyubi"]),
        // Upper chest before chest and spine.
        entry(UpperChest, &["upperchest", "upper_torso", "upperbody", "上胸部"]),
        // Toes before feet.
        entry(LeftToes, &["lefttoebase", "lefttoe", "l_toe", "toe_l", "左つま先", "つま先_左", "hidari_tsumasaki"]),
        entry(RightToes, &["righttoebase", "righttoe", "r_toe", "toe_r", "右つま先", "つま先_右", "migi_tsumasaki"]),
        // Lower arms before upper arms so `lowerarm_l` never reaches `arm_l`.
        entry(LeftLowerArm, &["leftforearm", "leftlowerarm", "l_forearm", "l_lowerarm", "forearm_l", "lowerarm_l", "leftelbow", "l_elbow", "elbow_l", "左前腕", "左下腕", "前腕_左", "下腕_左", "hidari_hiji"]),
        entry(RightLowerArm, &["rightforearm", "rightlowerarm", "r_forearm", "r_lowerarm", "forearm_r", "lowerarm_r", "rightelbow", "r_elbow", "elbow_r", "右前腕", "右下腕", "前腕_右", "下腕_右", "migi_hiji"]),
        entry(LeftHand, &["lefthand", "l_hand", "hand_l", "leftwrist", "l_wrist", "wrist_l", "左手", "手_左", "hidari_te"]),
        entry(RightHand, &["righthand", "r_hand", "hand_r", "rightwrist", "r_wrist", "wrist_r", "右手", "手_右", "migi_te"]),
        entry(LeftShoulder, &["leftshoulder", "l_shoulder", "shoulder_l", "leftclavicle", "l_clavicle", "clavicle_l", "左肩", "左鎖骨", "肩_左", "鎖骨_左", "hidari_kata"]),
        entry(RightShoulder, &["rightshoulder", "r_shoulder", "shoulder_r", "rightclavicle", "r_clavicle", "clavicle_r", "右肩", "右鎖骨", "肩_右", "鎖骨_右", "migi_kata"]),
        entry(LeftUpperArm, &["leftupperarm", "l_upperarm", "upperarm_l", "leftarm", "l_arm", "arm_l", "左上腕", "左腕", "上腕_左", "腕_左", "hidari_ude"]),
        entry(RightUpperArm, &["rightupperarm", "r_upperarm", "upperarm_r", "rightarm", "r_arm", "arm_r", "右上腕", "右腕", "上腕_右", "腕_右", "migi_ude"]),
        // Upper legs before lower legs and hips: `hip_l` names a thigh in some rigs.
        entry(LeftUpperLeg, &["leftupperleg", "leftupleg", "l_upleg", "l_upperleg", "upleg_l", "upperleg_l", "leftthigh", "l_thigh", "thigh_l", "lefthip", "l_hip", "hip_l", "左大腿", "左太もも", "大腿_左", "太もも_左", "hidari_momo"]),
        entry(RightUpperLeg, &["rightupperleg", "rightupleg", "r_upleg", "r_upperleg", "upleg_r", "upperleg_r", "rightthigh", "r_thigh", "thigh_r", "righthip", "r_hip", "hip_r", "右大腿", "右太もも", "大腿_右", "太もも_右", "migi_momo"]),
        entry(LeftLowerLeg, &["leftlowerleg", "leftleg", "l_leg", "l_lowerleg", "leg_l", "lowerleg_l", "leftcalf", "l_calf", "calf_l", "leftknee", "l_knee", "knee_l", "左下腿", "左脛", "下腿_左", "脛_左", "hidari_sune"]),
        entry(RightLowerLeg, &["rightlowerleg", "rightleg", "r_leg", "r_lowerleg", "leg_r", "lowerleg_r", "rightcalf", "r_calf", "calf_r", "rightknee", "r_knee", "knee_r", "右下腿", "右脛", "下腿_右", "脛_右", "migi_sune"]),
        entry(LeftFoot, &["leftfoot", "l_foot", "foot_l", "leftankle", "l_ankle", "ankle_l", "左足", "足_左", "hidari_ashi"]),
        entry(RightFoot, &["rightfoot", "r_foot", "foot_r", "rightankle", "r_ankle", "ankle_r", "右足", "足_右", "migi_ashi"]),
        entry(Chest, &["chest", "torso", "胸", "胸部", "躯干", "brustkorb", "mune", "上半身"]),
        entry(Spine, &["spine", "背骨", "脊椎", "脊柱", "背中", "wirbelsäule", "sebone"]),
        entry(Hips, &["hips", "hip", "pelvis", "腰", "臀部", "hüfte", "骨盤", "koshi"]),
        entry(Neck, &["neck", "首", "颈", "kubi", "くび"]),
        entry(Head, &["head", "頭", "头", "atama"]),
    ]
}
