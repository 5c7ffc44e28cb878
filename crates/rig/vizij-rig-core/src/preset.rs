//! Named mapping presets in name-pair form.
//!
//! A preset remembers how one avatar/costume pair was matched so the mapping
//! can be re-submitted as overrides in a later run. Storage is up to the
//! caller; the library round-trips through JSON.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};
use crate::resolver::Override;
use crate::skeleton::Skeleton;
use crate::table::{CorrespondenceTable, ResolutionMethod};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingPreset {
    pub name: String,
    pub avatar_name: String,
    pub costume_name: String,
    /// Free-form fitting values (offsets, scale tweaks) keyed by label.
    pub adjustments: IndexMap<String, f32>,
    /// Reference joint name -> target joint name.
    pub bone_mapping: IndexMap<String, String>,
}

impl MappingPreset {
    pub fn new(
        name: impl Into<String>,
        avatar_name: impl Into<String>,
        costume_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            avatar_name: avatar_name.into(),
            costume_name: costume_name.into(),
            ..Self::default()
        }
    }

    /// Capture the mapped pairs of a table. Synthesized joints are left out:
    /// they only exist in the target after a run.
    pub fn capture(
        mut self,
        reference: &Skeleton,
        target: &Skeleton,
        table: &CorrespondenceTable,
    ) -> Self {
        self.bone_mapping = table
            .iter()
            .filter(|e| e.method != ResolutionMethod::Synthesized)
            .filter_map(|e| {
                let r = reference.name_of(e.reference)?;
                let t = target.name_of(e.target?)?;
                Some((r.to_string(), t.to_string()))
            })
            .collect();
        self
    }

    pub fn with_adjustment(mut self, key: impl Into<String>, value: f32) -> Self {
        self.adjustments.insert(key.into(), value);
        self
    }

    /// The mapping as override input for a resolver run.
    pub fn overrides(&self) -> Vec<Override> {
        self.bone_mapping
            .iter()
            .map(|(r, t)| Override::new(r.as_str(), t.as_str()))
            .collect()
    }
}

/// In-memory preset collection keyed by preset name, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetLibrary {
    presets: IndexMap<String, MappingPreset>,
}

impl PresetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by name; returns the replaced preset.
    pub fn save(&mut self, preset: MappingPreset) -> Option<MappingPreset> {
        self.presets.insert(preset.name.clone(), preset)
    }

    pub fn load(&self, name: &str) -> Result<&MappingPreset> {
        self.presets.get(name).ok_or_else(|| RigError::PresetNotFound {
            name: name.to_string(),
        })
    }

    pub fn delete(&mut self, name: &str) -> Result<MappingPreset> {
        self.presets
            .shift_remove(name)
            .ok_or_else(|| RigError::PresetNotFound {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    /// First preset saved for this avatar/costume pair.
    pub fn find_for(&self, avatar_name: &str, costume_name: &str) -> Option<&MappingPreset> {
        self.presets
            .values()
            .find(|p| p.avatar_name == avatar_name && p.costume_name == costume_name)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
