//! Template document schema

use super::descriptor::{Expect, Field};

const META: &[Field] = &[
    Field::required("id", Expect::String),
    Field::required("name", Expect::String),
    Field::required("version", Expect::String),
    Field::required("category", Expect::String),
    Field::required("tier", Expect::String),
    Field::optional("description", Expect::String),
    Field::optional("tags", Expect::StringList),
];

const PAGE: &[Field] = &[
    Field::forbidden(
        "sections",
        "legacy sections layout is not supported; use template and slots",
    ),
    Field::required("template", Expect::String),
    Field::required("slots", Expect::NonEmptyMap),
];

const PAGE_ENTRY: Expect = Expect::Object(PAGE);

/// Top-level template document table.
pub const TEMPLATE: &[Field] = &[
    Field::required("meta", Expect::Object(META)),
    Field::required("pages", Expect::NonEmptyEach(&PAGE_ENTRY)),
];
