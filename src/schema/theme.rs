//! Theme document schema

use super::descriptor::{Expect, Field};

/// Color tokens every theme must define.
pub const REQUIRED_COLORS: [&str; 12] = [
    "primary",
    "primaryMuted",
    "secondary",
    "secondaryMuted",
    "success",
    "warning",
    "error",
    "info",
    "background",
    "surface",
    "textPrimary",
    "border",
];

/// Token categories every theme must define.
pub const TOKEN_CATEGORIES: [&str; 8] = [
    "colors",
    "typography",
    "spacing",
    "radius",
    "shadows",
    "motion",
    "breakpoints",
    "zIndex",
];

const META: &[Field] = &[
    Field::required("id", Expect::String),
    Field::required("name", Expect::String),
    Field::required("version", Expect::String),
    Field::required("category", Expect::String),
    Field::optional("description", Expect::String),
    Field::optional("tags", Expect::StringList),
];

const COLORS: &[Field] = &[
    Field::required(REQUIRED_COLORS[0], Expect::String),
    Field::required(REQUIRED_COLORS[1], Expect::String),
    Field::required(REQUIRED_COLORS[2], Expect::String),
    Field::required(REQUIRED_COLORS[3], Expect::String),
    Field::required(REQUIRED_COLORS[4], Expect::String),
    Field::required(REQUIRED_COLORS[5], Expect::String),
    Field::required(REQUIRED_COLORS[6], Expect::String),
    Field::required(REQUIRED_COLORS[7], Expect::String),
    Field::required(REQUIRED_COLORS[8], Expect::String),
    Field::required(REQUIRED_COLORS[9], Expect::String),
    Field::required(REQUIRED_COLORS[10], Expect::String),
    Field::required(REQUIRED_COLORS[11], Expect::String),
];

const FONT_FAMILY: &[Field] = &[Field::required("primary", Expect::Any)];

const TYPOGRAPHY: &[Field] = &[
    Field::required("fontFamily", Expect::Object(FONT_FAMILY)),
    Field::required("fontSize", Expect::Map),
    Field::required("fontWeight", Expect::Map),
    Field::required("lineHeight", Expect::Map),
];

const MOTION: &[Field] = &[
    Field::required("duration", Expect::Map),
    Field::required("easing", Expect::Map),
];

const Z_INDEX_VALUE: Expect = Expect::Integer;

const TOKENS: &[Field] = &[
    Field::required("colors", Expect::Object(COLORS)),
    Field::required("typography", Expect::Object(TYPOGRAPHY)),
    Field::required("spacing", Expect::Map),
    Field::required("radius", Expect::Map),
    Field::required("shadows", Expect::Map),
    Field::required("motion", Expect::Object(MOTION)),
    Field::required("breakpoints", Expect::Map),
    Field::required("zIndex", Expect::EachEntry(&Z_INDEX_VALUE)),
];

const MODE: &[Field] = &[
    Field::required("name", Expect::Any),
    Field::required("label", Expect::Any),
    Field::required("tokens", Expect::Map),
];

const MODE_ENTRY: Expect = Expect::Object(MODE);

/// Top-level theme document table.
pub const THEME: &[Field] = &[
    Field::required("meta", Expect::Object(META)),
    Field::required("tokens", Expect::Object(TOKENS)),
    Field::optional("modes", Expect::EachEntry(&MODE_ENTRY)),
];
