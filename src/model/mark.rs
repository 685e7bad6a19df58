//! Marks: typed annotations (emphasis, links, …) attached to inline nodes.

use super::{Attrs, MarkType};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A mark is a piece of information that can be attached to a node, such as
/// it being emphasized, in code font, or a link. It has a type and
/// optionally a set of attributes that provide further information (such as
/// the target of the link). Marks compare equal by type name and attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    /// The type of this mark.
    pub r#type: MarkType,
    /// The attributes of this mark.
    pub attrs: Attrs,
}

impl Mark {
    /// True when an equal mark is part of the given set.
    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.iter().any(|other| other == self)
    }

    /// A copy of the given set with this mark added, unless an equal mark is
    /// already present. Marks on a node stay an ordered sequence without
    /// duplicates.
    pub fn add_to_set(&self, set: &[Mark]) -> Vec<Mark> {
        let mut out = set.to_vec();
        if !self.is_in_set(set) {
            out.push(self.clone());
        }
        out
    }

    /// A copy of the given set without any mark equal to this one.
    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|other| *other != self).cloned().collect()
    }
}

impl Serialize for Mark {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.r#type.name())?;
        if !self.attrs.is_empty() {
            map.serialize_entry("attrs", &self.attrs)?;
        }
        map.end()
    }
}
