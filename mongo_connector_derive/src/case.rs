//! Serde's `rename_all` conventions, applied to field names.
//!
//! This code was adapted from Serde's `serde_derive_internals` crate.
//!
//! Original license header is reproduced below:

// Copyright 2017 Serde Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::str::FromStr;
use crate::error::{ Error, Result };
use self::RenameRule::*;

/// A renaming convention, as defined by Serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenameRule {
    /// "lowercase"
    LowerCase,
    /// "UPPERCASE"
    UpperCase,
    /// "PascalCase"
    PascalCase,
    /// "camelCase"
    CamelCase,
    /// "snake_case"
    SnakeCase,
    /// "SCREAMING_SNAKE_CASE"
    ScreamingSnakeCase,
    /// "kebab-case"
    KebabCase,
    /// "SCREAMING-KEBAB-CASE"
    ScreamingKebabCase,
}

impl RenameRule {
    /// Renames a `snake_case` field name according to this rule.
    pub fn apply_to_field(self, field: &str) -> String {
        match self {
            LowerCase | SnakeCase => field.to_owned(),
            UpperCase | ScreamingSnakeCase => field.to_ascii_uppercase(),
            PascalCase => {
                let mut pascal = String::with_capacity(field.len());
                let mut capitalize = true;

                for ch in field.chars() {
                    if ch == '_' {
                        capitalize = true;
                    } else if capitalize {
                        pascal.push(ch.to_ascii_uppercase());
                        capitalize = false;
                    } else {
                        pascal.push(ch);
                    }
                }

                pascal
            }
            CamelCase => {
                let pascal = PascalCase.apply_to_field(field);
                let mut chars = pascal.chars();

                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => pascal,
                }
            }
            KebabCase => field.replace('_', "-"),
            ScreamingKebabCase => ScreamingSnakeCase.apply_to_field(field).replace('_', "-"),
        }
    }
}

impl FromStr for RenameRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lowercase"            => Ok(LowerCase),
            "UPPERCASE"            => Ok(UpperCase),
            "PascalCase"           => Ok(PascalCase),
            "camelCase"            => Ok(CamelCase),
            "snake_case"           => Ok(SnakeCase),
            "SCREAMING_SNAKE_CASE" => Ok(ScreamingSnakeCase),
            "kebab-case"           => Ok(KebabCase),
            "SCREAMING-KEBAB-CASE" => Ok(ScreamingKebabCase),
            _ => err_fmt!("unknown `rename_all` rule: {}", s),
        }
    }
}
