//! Describing the shape of the values a caller expects back from the store.
//!
//! A [`TargetShape`](struct.TargetShape.html) is the ordered list of fields
//! of a record type together with the [`FieldType`](enum.FieldType.html) of
//! each field. It is usually obtained from a Rust type by way of the
//! [`Shape`](trait.Shape.html) trait, which can be `#[derive]`d.

use std::rc::Rc;
use std::sync::{ Arc, Mutex, RwLock };
use std::cell::{ Cell, RefCell };
use std::borrow::{ Cow, ToOwned };
use std::collections::{ HashMap, BTreeMap, HashSet, BTreeSet, VecDeque };
use bson::{ Bson, Document, Binary, DateTime, oid::ObjectId };

/// A scalar type with no inner structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// UTF-8 strings, characters and unit-only enums.
    String,
    /// Integers and floating-point numbers.
    Number,
    /// `true` or `false`.
    Boolean,
    /// A point in time.
    Date,
    /// Raw bytes.
    Binary,
    /// A 12-byte MongoDB object identifier.
    ObjectId,
    /// The unit value / BSON `null`.
    Null,
}

/// The type of a single field in a `TargetShape`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// A scalar.
    Primitive(Primitive),
    /// An embedded document.
    Record(TargetShape),
    /// An array, described by the type of its elements.
    Array(Box<FieldType>),
    /// Any one of the member types.
    Union(Vec<FieldType>),
    /// A reference back to a record type that is already being described.
    /// It is never expanded again.
    Cyclic(String),
    /// Arbitrary, untyped data (maps, raw documents, JSON values).
    Dynamic,
}

impl FieldType {
    /// Convenience constructor for arrays.
    pub fn array(element: FieldType) -> Self {
        FieldType::Array(Box::new(element))
    }

    /// Convenience constructor for "this type or `null`".
    pub fn nullable(ty: FieldType) -> Self {
        FieldType::Union(vec![ty, FieldType::Primitive(Primitive::Null)])
    }

    /// Returns `true` if this is the `null` primitive.
    pub fn is_null(&self) -> bool {
        *self == FieldType::Primitive(Primitive::Null)
    }
}

impl From<Primitive> for FieldType {
    fn from(primitive: Primitive) -> Self {
        FieldType::Primitive(primitive)
    }
}

impl From<TargetShape> for FieldType {
    fn from(shape: TargetShape) -> Self {
        FieldType::Record(shape)
    }
}

/// The description of a record: its name and its fields, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetShape {
    /// Name of the record type, used for cycle detection and diagnostics.
    name: String,
    /// The declared fields in order.
    fields: Vec<(String, FieldType)>,
    /// Whether this record admits arbitrary fields beyond the declared ones.
    dynamic: bool,
}

impl TargetShape {
    /// An empty record with the given name.
    pub fn new<S: Into<String>>(name: S) -> Self {
        TargetShape {
            name: name.into(),
            fields: Vec::new(),
            dynamic: false,
        }
    }

    /// The "any JSON" marker: a shape that accepts documents verbatim.
    pub fn dynamic() -> Self {
        TargetShape {
            name: String::new(),
            fields: Vec::new(),
            dynamic: true,
        }
    }

    /// Builder-style method for appending a field.
    /// ```
    /// # use mongo_connector::shape::{ TargetShape, FieldType, Primitive };
    /// let person = TargetShape::new("Person")
    ///     .field("name", Primitive::String)
    ///     .field("age", Primitive::Number);
    ///
    /// assert_eq!(person.fields().len(), 2);
    /// assert!(person.declares("age"));
    /// ```
    pub fn field<S, T>(mut self, name: S, ty: T) -> Self
        where S: Into<String>,
              T: Into<FieldType>,
    {
        self.push_field(name, ty);
        self
    }

    /// Appends a field. A field with the same name is replaced in place.
    pub fn push_field<S, T>(&mut self, name: S, ty: T)
        where S: Into<String>,
              T: Into<FieldType>,
    {
        let name = name.into();
        let ty = ty.into();

        match self.fields.iter_mut().find(|field| field.0 == name) {
            Some(field) => field.1 = ty,
            None => self.fields.push((name, ty)),
        }
    }

    /// Merges the fields of a record type into this one, the way
    /// `#[serde(flatten)]` does. A non-record type makes this shape dynamic.
    pub fn flatten(&mut self, ty: FieldType) {
        match ty {
            FieldType::Record(shape) => {
                self.dynamic |= shape.dynamic;
                for (name, ty) in shape.fields {
                    self.push_field(name, ty);
                }
            }
            _ => self.dynamic = true,
        }
    }

    /// Marks the shape as accepting arbitrary extra fields.
    pub fn set_dynamic(&mut self, dynamic: bool) {
        self.dynamic = dynamic;
    }

    /// The name of the record type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared fields, in declaration order.
    pub fn fields(&self) -> &[(String, FieldType)] {
        &self.fields
    }

    /// A shape is dynamic if it is explicitly marked so, or if it
    /// declares no fields at all.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic || self.fields.is_empty()
    }

    /// Returns `true` if a field with the given name is declared.
    pub fn declares(&self, name: &str) -> bool {
        self.fields.iter().any(|&(ref n, _)| n == name)
    }
}

/// The set of record types currently being described, used for
/// detecting self-referential types.
#[derive(Debug, Default)]
pub struct Visited {
    /// Fully-qualified Rust type names of the records on the current path.
    types: HashSet<&'static str>,
}

impl Visited {
    /// An empty set.
    pub fn new() -> Self {
        Visited::default()
    }

    /// Describes the record type `key` (named `name`) by invoking `describe`,
    /// unless that type is already being described further up, in which case
    /// it returns a `FieldType::Cyclic` reference instead.
    pub fn record<F>(&mut self, key: &'static str, name: &str, describe: F) -> FieldType
        where F: FnOnce(&mut Self) -> TargetShape
    {
        if !self.types.insert(key) {
            return FieldType::Cyclic(name.to_owned());
        }

        let shape = describe(self);
        self.types.remove(key);

        FieldType::Record(shape)
    }
}

/// Types that can describe their own stored representation.
///
/// This is normally `#[derive]`d; the derive honors Serde's `rename`,
/// `rename_all`, `skip`, `skip_deserializing` and `flatten` attributes.
pub trait Shape {
    /// The field type of `Self` when it appears as a field (or as the root).
    fn field_type(visited: &mut Visited) -> FieldType;

    /// The shape of `Self` as a top-level document.
    /// Types that are not records are described as the dynamic shape.
    fn target_shape() -> TargetShape {
        match Self::field_type(&mut Visited::new()) {
            FieldType::Record(shape) => shape,
            _ => TargetShape::dynamic(),
        }
    }
}

/// Implements `Shape` for types that map to a single primitive.
macro_rules! impl_shape_primitive {
    ($($ty:ty),* => $primitive:ident) => {$(
        impl Shape for $ty {
            fn field_type(_: &mut Visited) -> FieldType {
                FieldType::Primitive(Primitive::$primitive)
            }
        }
    )*}
}

impl_shape_primitive! { String, str, char => String }
impl_shape_primitive! { i8, i16, i32, i64, i128, isize => Number }
impl_shape_primitive! { u8, u16, u32, u64, u128, usize => Number }
impl_shape_primitive! { f32, f64 => Number }
impl_shape_primitive! { bool => Boolean }
impl_shape_primitive! { DateTime => Date }
impl_shape_primitive! { Binary => Binary }
impl_shape_primitive! { ObjectId => ObjectId }
impl_shape_primitive! { () => Null }

/// Implements `Shape` for untyped containers.
macro_rules! impl_shape_dynamic {
    ($($ty:ty),*) => {$(
        impl Shape for $ty {
            fn field_type(_: &mut Visited) -> FieldType {
                FieldType::Dynamic
            }
        }
    )*}
}

impl_shape_dynamic! { Document, Bson, serde_json::Value }

impl<K, V, S> Shape for HashMap<K, V, S> {
    fn field_type(_: &mut Visited) -> FieldType {
        FieldType::Dynamic
    }
}

impl<K, V> Shape for BTreeMap<K, V> {
    fn field_type(_: &mut Visited) -> FieldType {
        FieldType::Dynamic
    }
}

impl<T: Shape> Shape for Option<T> {
    fn field_type(visited: &mut Visited) -> FieldType {
        FieldType::nullable(T::field_type(visited))
    }
}

/// Implements `Shape` for homogeneous sequences.
macro_rules! impl_shape_sequence {
    ($($ty:ident),*) => {$(
        impl<T: Shape> Shape for $ty<T> {
            fn field_type(visited: &mut Visited) -> FieldType {
                FieldType::array(T::field_type(visited))
            }
        }
    )*}
}

impl_shape_sequence! { Vec, VecDeque, BTreeSet }

impl<T: Shape, S> Shape for HashSet<T, S> {
    fn field_type(visited: &mut Visited) -> FieldType {
        FieldType::array(T::field_type(visited))
    }
}

impl<T: Shape> Shape for [T] {
    fn field_type(visited: &mut Visited) -> FieldType {
        FieldType::array(T::field_type(visited))
    }
}

impl<T: Shape, const N: usize> Shape for [T; N] {
    fn field_type(visited: &mut Visited) -> FieldType {
        FieldType::array(T::field_type(visited))
    }
}

/// Implements `Shape` for smart pointers and cells by forwarding
/// to the wrapped type.
macro_rules! impl_shape_wrapper {
    ($($ty:ident),*) => {$(
        impl<T: Shape + ?Sized> Shape for $ty<T> {
            fn field_type(visited: &mut Visited) -> FieldType {
                T::field_type(visited)
            }
        }
    )*}
}

impl_shape_wrapper! { Box, Rc, Arc, RefCell, Mutex, RwLock }

impl<T: Shape + Copy> Shape for Cell<T> {
    fn field_type(visited: &mut Visited) -> FieldType {
        T::field_type(visited)
    }
}

impl<'a, T: Shape + ToOwned + ?Sized> Shape for Cow<'a, T> {
    fn field_type(visited: &mut Visited) -> FieldType {
        T::field_type(visited)
    }
}

impl<'a, T: Shape + ?Sized> Shape for &'a T {
    fn field_type(visited: &mut Visited) -> FieldType {
        T::field_type(visited)
    }
}

/// Implements `Shape` for tuples, which are stored as heterogeneous arrays.
macro_rules! impl_shape_tuple {
    ($($name:ident),*) => {
        impl<$($name),*> Shape for ($($name,)*) {
            fn field_type(_: &mut Visited) -> FieldType {
                FieldType::Dynamic
            }
        }
    }
}

impl_shape_tuple! { A }
impl_shape_tuple! { A, B }
impl_shape_tuple! { A, B, C }
impl_shape_tuple! { A, B, C, D }
impl_shape_tuple! { A, B, C, D, E }
impl_shape_tuple! { A, B, C, D, E, F }
