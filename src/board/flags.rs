//! Per-object flag bitset
//!
//! Search flags (Found, Selected, DRC, Warn) are written by lookups and the
//! DRC driver; the remaining bits describe the object's shape and how it
//! interacts with polygons.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Flag set attached to every board object
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectFlags(u32);

impl ObjectFlags {
    pub const NONE: Self = Self(0);
    /// Reached by the current connection lookup
    pub const FOUND: Self = Self(1 << 0);
    /// Part of a baseline net (or selected by the user)
    pub const SELECTED: Self = Self(1 << 1);
    /// Net already verified by the running DRC scan
    pub const DRC: Self = Self(1 << 2);
    /// Needs the user's attention (violation highlight, hole too close)
    pub const WARN: Self = Self(1 << 3);
    /// Unplated hole: a pin or via without copper
    pub const HOLE: Self = Self(1 << 4);
    /// Square pin, or pad/line with square ends
    pub const SQUARE: Self = Self(1 << 5);
    /// Octagonal pin
    pub const OCTAGON: Self = Self(1 << 6);
    /// Pad or element placed on the solder side
    pub const ON_SOLDER: Self = Self(1 << 7);
    /// Line or arc keeps clear of clearing polygons
    pub const CLEAR_LINE: Self = Self(1 << 8);
    /// Polygon is cut back around clearing objects
    pub const CLEAR_POLY: Self = Self(1 << 9);

    /// Flags owned by searches; cleared between independent lookups
    pub const SEARCH: Self = Self(Self::FOUND.0 | Self::SELECTED.0 | Self::DRC.0);

    const NAMES: &'static [(&'static str, ObjectFlags)] = &[
        ("found", Self::FOUND),
        ("selected", Self::SELECTED),
        ("drc", Self::DRC),
        ("warn", Self::WARN),
        ("hole", Self::HOLE),
        ("square", Self::SQUARE),
        ("octagon", Self::OCTAGON),
        ("onsolder", Self::ON_SOLDER),
        ("clearline", Self::CLEAR_LINE),
        ("clearpoly", Self::CLEAR_POLY),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any bit of `other` is set
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Look up a flag by its serialized name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, f)| f)
    }

    fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .iter()
            .filter(move |(_, f)| self.contains(*f))
            .map(|&(n, _)| n)
    }
}

impl BitOr for ObjectFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ObjectFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ObjectFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for ObjectFlags {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for ObjectFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl Serialize for ObjectFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

impl<'de> Deserialize<'de> for ObjectFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        let mut flags = ObjectFlags::NONE;
        for name in names {
            let flag = ObjectFlags::from_name(&name)
                .ok_or_else(|| D::Error::custom(format!("unknown object flag '{}'", name)))?;
            flags.insert(flag);
        }
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_intersects() {
        let flags = ObjectFlags::FOUND | ObjectFlags::SQUARE;
        assert!(flags.contains(ObjectFlags::FOUND));
        assert!(!flags.contains(ObjectFlags::FOUND | ObjectFlags::SELECTED));
        assert!(flags.intersects(ObjectFlags::SEARCH));
        assert!(!flags.intersects(ObjectFlags::HOLE | ObjectFlags::OCTAGON));
    }

    #[test]
    fn test_remove_keeps_other_bits() {
        let mut flags = ObjectFlags::SEARCH | ObjectFlags::HOLE;
        flags.remove(ObjectFlags::SEARCH);
        assert_eq!(flags, ObjectFlags::HOLE);
    }

    #[test]
    fn test_json_names() {
        let flags: ObjectFlags = serde_json::from_str(r#"["square", "ClearLine"]"#).unwrap();
        assert_eq!(flags, ObjectFlags::SQUARE | ObjectFlags::CLEAR_LINE);
        assert_eq!(serde_json::to_string(&flags).unwrap(), r#"["square","clearline"]"#);
        assert!(serde_json::from_str::<ObjectFlags>(r#"["shiny"]"#).is_err());
    }
}
