//! Generating `Shape` impls.

use proc_macro2::TokenStream;
use syn::{ DeriveInput, Data, DataStruct, DataEnum, Fields, Field, Ident, parse_quote };
use crate::{
    case::RenameRule,
    meta::{ serde_deserialize_str, has_serde_word },
    error::{ Error, Result },
};

/// Implements `Shape` for the given type.
pub fn impl_shape(input: DeriveInput) -> Result<TokenStream> {
    let name = match serde_deserialize_str(&input.attrs, "rename")? {
        Some(name) => name,
        None => unraw(&input.ident),
    };
    let body = match input.data {
        Data::Struct(ref data) => struct_body(&input, data, &name)?,
        Data::Enum(ref data) => enum_body(&input.ident, data)?,
        Data::Union(_) => return Err(Error::spanned(
            &input.ident,
            "`Shape` can't be derived for unions"
        )),
    };

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::mongo_connector::shape::Shape));
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::mongo_connector::shape::Shape for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn field_type(
                visited: &mut ::mongo_connector::shape::Visited
            ) -> ::mongo_connector::shape::FieldType {
                #body
            }
        }
    })
}

/// The body of `field_type()` for a struct.
fn struct_body(input: &DeriveInput, data: &DataStruct, name: &str) -> Result<TokenStream> {
    if has_serde_word(&input.attrs, "transparent")? {
        let field = data.fields
            .iter()
            .map(|field| Ok((field, is_skipped(field)?)))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .find(|&(_, skipped)| !skipped)
            .map(|(field, _)| field)
            .ok_or_else(|| Error::spanned(&input.ident, "transparent struct has no field"))?;

        return Ok(forward(field));
    }

    match data.fields {
        Fields::Named(ref fields) => {
            let rule = match serde_deserialize_str(&input.attrs, "rename_all")? {
                Some(rule) => Some(rule.parse::<RenameRule>()?),
                None => None,
            };
            let pushes = fields.named
                .iter()
                .map(|field| push_field(field, rule))
                .collect::<Result<Vec<_>>>()?;

            Ok(quote! {
                visited.record(::std::any::type_name::<Self>(), #name, |visited| {
                    #[allow(unused_mut)]
                    let mut shape = ::mongo_connector::shape::TargetShape::new(#name);
                    #(#pushes)*
                    shape
                })
            })
        }
        Fields::Unnamed(ref fields) if fields.unnamed.len() == 1 => {
            Ok(forward(&fields.unnamed[0]))
        }
        Fields::Unnamed(_) => Ok(quote! {
            ::mongo_connector::shape::FieldType::Dynamic
        }),
        Fields::Unit => Ok(quote! {
            ::mongo_connector::shape::FieldType::Primitive(
                ::mongo_connector::shape::Primitive::Null
            )
        }),
    }
}

/// The body of `field_type()` for an enum. Only unit variants are
/// supported, and they are stored as strings.
fn enum_body(ident: &Ident, data: &DataEnum) -> Result<TokenStream> {
    match data.variants.iter().find(|variant| !matches!(variant.fields, Fields::Unit)) {
        Some(variant) => Err(Error::spanned(
            variant,
            format!(
                "`Shape` can only be derived for enums with unit variants; implement it by hand for `{}`",
                ident
            )
        )),
        None => Ok(quote! {
            ::mongo_connector::shape::FieldType::Primitive(
                ::mongo_connector::shape::Primitive::String
            )
        }),
    }
}

/// The statement adding one named field to the shape under construction.
fn push_field(field: &Field, rule: Option<RenameRule>) -> Result<TokenStream> {
    if is_skipped(field)? {
        return Ok(TokenStream::new());
    }

    let ty = &field.ty;

    if has_serde_word(&field.attrs, "flatten")? {
        return Ok(quote! {
            shape.flatten(<#ty as ::mongo_connector::shape::Shape>::field_type(visited));
        });
    }

    let name = match serde_deserialize_str(&field.attrs, "rename")? {
        Some(name) => name,
        None => {
            let ident = field.ident.as_ref().ok_or_else(
                || Error::spanned(field, "expected a named field")
            )?;
            let raw = unraw(ident);
            rule.map_or_else(|| raw.clone(), |rule| rule.apply_to_field(&raw))
        }
    };

    Ok(quote! {
        shape.push_field(#name, <#ty as ::mongo_connector::shape::Shape>::field_type(visited));
    })
}

/// Describes `Self` exactly like the type of the given field.
fn forward(field: &Field) -> TokenStream {
    let ty = &field.ty;

    quote! {
        <#ty as ::mongo_connector::shape::Shape>::field_type(visited)
    }
}

/// Fields that are never read back don't belong to the shape.
fn is_skipped(field: &Field) -> Result<bool> {
    Ok(has_serde_word(&field.attrs, "skip")? || has_serde_word(&field.attrs, "skip_deserializing")?)
}

/// The name of an identifier, without the `r#` prefix of raw identifiers.
fn unraw(ident: &Ident) -> String {
    let name = ident.to_string();

    match name.strip_prefix("r#") {
        Some(stripped) => stripped.to_owned(),
        None => name,
    }
}
