//! Joint identifiers.

use serde::{Deserialize, Serialize};

/// Dense arena index of a joint inside one [`crate::Skeleton`].
///
/// Ids are only meaningful for the skeleton that issued them and stay valid
/// for its lifetime (joints are never removed).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct JointId(pub u32);

impl JointId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        JointId(index as u32)
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Selects a joint either by arena id or by its raw name.
///
/// Name lookups resolve to the first joint with that exact name in
/// depth-first order.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JointRef {
    Id(JointId),
    Name(String),
}

impl From<JointId> for JointRef {
    fn from(id: JointId) -> Self {
        JointRef::Id(id)
    }
}

impl From<&str> for JointRef {
    fn from(name: &str) -> Self {
        JointRef::Name(name.to_string())
    }
}

impl From<String> for JointRef {
    fn from(name: String) -> Self {
        JointRef::Name(name)
    }
}

impl std::fmt::Display for JointRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JointRef::Id(id) => write!(f, "{id}"),
            JointRef::Name(name) => write!(f, "'{name}'"),
        }
    }
}
