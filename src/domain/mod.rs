//! Domain types for recipe management with strong typing.
//!
//! Every owned record is looked up through a `UserId`, so these newtypes keep
//! owner ids from being mixed up with record ids at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an account, used as the owner key for every scoped query.
///
/// # Examples
///
/// ```rust
/// use pantry::domain::UserId;
///
/// let id = UserId::new(7);
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserId(i32);

impl UserId {
    /// Creates a new `UserId` from a raw i32 value.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `id` is negative.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "UserId should be non-negative");
        Self(id)
    }

    /// Returns the underlying i32 value.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

/// Identifier of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RecipeId(i32);

impl RecipeId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for RecipeId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for RecipeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for RecipeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// The two kinds of label a recipe can be linked to.
///
/// Tags and ingredients are structurally identical, so repositories and
/// services take a `LabelKind` instead of duplicating every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Tag,
    Ingredient,
}

impl LabelKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Ingredient => "ingredient",
        }
    }

    /// Field name used for this kind in recipe payloads.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Ingredient => "ingredients",
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_round_trips_through_i32() {
        let id = UserId::from(42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn recipe_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&RecipeId::new(9)).unwrap();
        assert_eq!(json, "9");

        let parsed: RecipeId = serde_json::from_str("9").unwrap();
        assert_eq!(parsed, RecipeId::new(9));
    }

    #[test]
    fn label_kind_names() {
        assert_eq!(LabelKind::Tag.as_str(), "tag");
        assert_eq!(LabelKind::Ingredient.field(), "ingredients");
    }
}
