//! Declarative schema descriptors
//!
//! A domain schema is a static table of fields. Each field names a key,
//! whether it must be present, and what kind of value it must hold.
//! Nested maps carry their own field tables; maps with open key sets
//! describe each entry with a single nested expectation.

/// Whether a key must, may, or must not appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Legacy shapes that are rejected outright.
    Forbidden(&'static str),
}

/// Expected value at a path.
#[derive(Debug, Clone, Copy)]
pub enum Expect {
    /// Presence only, any value.
    Any,
    String,
    Integer,
    /// A list whose every element is a string.
    StringList,
    /// A map with arbitrary contents.
    Map,
    /// A map with at least one entry.
    NonEmptyMap,
    /// A map with a known field table. Unknown keys are allowed.
    Object(&'static [Field]),
    /// A map whose every value matches the nested expectation.
    EachEntry(&'static Expect),
    /// Like `EachEntry`, but the map must not be empty.
    NonEmptyEach(&'static Expect),
}

/// One named field in an object table.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub presence: Presence,
    pub expect: Expect,
}

impl Field {
    pub const fn required(name: &'static str, expect: Expect) -> Self {
        Self {
            name,
            presence: Presence::Required,
            expect,
        }
    }

    pub const fn optional(name: &'static str, expect: Expect) -> Self {
        Self {
            name,
            presence: Presence::Optional,
            expect,
        }
    }

    pub const fn forbidden(name: &'static str, reason: &'static str) -> Self {
        Self {
            name,
            presence: Presence::Forbidden(reason),
            expect: Expect::Any,
        }
    }
}
