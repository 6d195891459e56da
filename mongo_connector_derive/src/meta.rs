//! Helper functions for retrieving and parsing `#[serde(...)]` attributes.

use syn::{ Attribute, Meta, NestedMeta, Lit };
use crate::error::{ Error, Result };

/// Returns the first `key` item inside `#[name(...)]` attributes
/// (like `rename = "foo"` in `#[serde(rename = "foo")]`).
fn meta(attrs: &[Attribute], name: &str, key: &str) -> Result<Option<Meta>> {
    for attr in attrs.iter().filter(|attr| attr.path.is_ident(name)) {
        let list = match attr.parse_meta()? {
            Meta::List(list) => list,
            _ => continue,
        };

        for nested in list.nested {
            if let NestedMeta::Meta(meta) = nested {
                if meta.path().is_ident(key) {
                    return Ok(Some(meta));
                }
            }
        }
    }

    Ok(None)
}

/// Extracts a string value from a literal.
fn lit_as_str(key: &str, lit: &Lit) -> Result<String> {
    match *lit {
        Lit::Str(ref string) => Ok(string.value()),
        _ => Err(Error::spanned(lit, format!("value for key `{}` must be a string", key))),
    }
}

/// Searches for a string-valued Serde attribute, as it applies to
/// deserialization. Both `key = "..."` and `key(deserialize = "...")`
/// are understood; the latter yields `None` if it only names a
/// serialization value.
pub fn serde_deserialize_str(attrs: &[Attribute], key: &str) -> Result<Option<String>> {
    match meta(attrs, "serde", key)? {
        Some(Meta::NameValue(nv)) => lit_as_str(key, &nv.lit).map(Some),
        Some(Meta::List(list)) => {
            for nested in &list.nested {
                match *nested {
                    NestedMeta::Meta(Meta::NameValue(ref nv)) if nv.path.is_ident("deserialize") => {
                        return lit_as_str(key, &nv.lit).map(Some);
                    }
                    _ => {}
                }
            }
            Ok(None)
        }
        Some(meta) => Err(Error::spanned(
            meta,
            format!("attribute must have form `#[serde({} = \"...\")]`", key)
        )),
        None => Ok(None),
    }
}

/// Search for a Serde attribute, provided that it's a single word.
pub fn has_serde_word(attrs: &[Attribute], key: &str) -> Result<bool> {
    match meta(attrs, "serde", key)? {
        Some(Meta::Path(_)) => Ok(true),
        Some(meta) => Err(Error::spanned(
            meta,
            format!("attribute must have form `#[serde({})]`", key)
        )),
        None => Ok(false),
    }
}
