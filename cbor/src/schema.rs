//! Typed-schema combinators lifting a [`CborValue`] into validated domain
//! types and back.
//!
//! A [`Schema<Source, Target>`] is a fallible, invertible pair of functions;
//! [`compose`] chains two schemas sharing a middle type, and the remaining
//! combinators build the rest of the pipeline described in the module
//! overview: `brand`, `filter`, `tag`, `union`, `tuple`, `array`, `map`,
//! `struct_`, `literal`, `null_or`, `optional`. Concrete instances built from
//! these (order-preserving maps, tag-258 sets, hex-wrapped byte strings, ...)
//! live in [`crate::utils`].

use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;

use crate::options::CodecOptions;
use crate::value::{decode_cbor, encode_cbor, CborValue};

/// The kind of failure a schema operation produced, independent of the
/// concrete error type used to describe it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Declared length exceeds available bytes.
    #[error("input truncated")]
    InputTruncated,
    /// Top-level decode did not consume the full buffer.
    #[error("trailing input")]
    TrailingInput,
    /// Reserved `ai` value, nested indefinite string, break in illegal position.
    #[error("malformed header")]
    MalformedHeader,
    /// Text string is not valid UTF-8.
    #[error("invalid utf-8")]
    InvalidUtf8,
    /// Tag 2/3 inner was not `Bytes`, or a structural tag's inner did not match.
    #[error("invalid tag payload")]
    InvalidTagPayload,
    /// Integer/byte-length violates a refinement.
    #[error("value out of range")]
    OutOfRange,
    /// No union arm matched; carries the attempted discriminator.
    #[error("no union variant matched (tried: {discriminator})")]
    InvalidVariant { discriminator: String },
    /// An invariant such as "non-zero" or "non-empty" was violated.
    #[error("invariant violated")]
    InvariantViolation,
    /// Attempt to encode a value that cannot be represented.
    #[error("value cannot be encoded")]
    EncoderRefusal,
}

/// A structured schema error: a kind, a human-readable message, and an
/// optional cause from a lower layer of a [`compose`]d pipeline.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}{}", cause_suffix(cause))]
pub struct SchemaError {
    pub kind: ErrorKind,
    pub message: String,
    #[source]
    pub cause: Option<Box<SchemaError>>,
}

fn cause_suffix(cause: &Option<Box<SchemaError>>) -> String {
    match cause {
        Some(c) => format!(" (caused by: {c})"),
        None => String::new(),
    }
}

impl SchemaError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        SchemaError { kind, message: message.into(), cause: None }
    }

    pub fn with_cause(mut self, cause: SchemaError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// A fallible, invertible codec pair lifting `Source` to `Target`.
pub trait Schema<Source, Target> {
    fn decode(&self, source: Source) -> SchemaResult<Target>;
    fn encode(&self, target: Target) -> SchemaResult<Source>;
}

/// Chains two schemas sharing a middle type: `compose(compose(a, b), c) ==
/// compose(a, compose(b, c))` in effect, since both associate the same way.
pub struct Compose<A, B, M> {
    a: A,
    b: B,
    _marker: PhantomData<fn(M) -> M>,
}

pub fn compose<A, B, S, M, T>(a: A, b: B) -> Compose<A, B, M>
where
    A: Schema<S, M>,
    B: Schema<M, T>,
{
    Compose {
        a,
        b,
        _marker: PhantomData,
    }
}

impl<A, B, S, M, T> Schema<S, T> for Compose<A, B, M>
where
    A: Schema<S, M>,
    B: Schema<M, T>,
{
    fn decode(&self, source: S) -> SchemaResult<T> {
        let mid = self.a.decode(source).map_err(|e| SchemaError::new(e.kind.clone(), "compose: inner decode failed").with_cause(e))?;
        self.b.decode(mid)
    }

    fn encode(&self, target: T) -> SchemaResult<S> {
        let mid = self.b.encode(target).map_err(|e| SchemaError::new(e.kind.clone(), "compose: inner encode failed").with_cause(e))?;
        self.a.encode(mid)
    }
}

/// Lifts a pair of fallible functions into a schema.
pub struct TransformOrFail<S, T, D, E> {
    decode_fn: D,
    encode_fn: E,
    _marker: PhantomData<fn(S) -> T>,
}

pub fn transform_or_fail<S, T, D, E>(decode_fn: D, encode_fn: E) -> TransformOrFail<S, T, D, E>
where
    D: Fn(S) -> SchemaResult<T>,
    E: Fn(T) -> SchemaResult<S>,
{
    TransformOrFail { decode_fn, encode_fn, _marker: PhantomData }
}

impl<S, T, D, E> Schema<S, T> for TransformOrFail<S, T, D, E>
where
    D: Fn(S) -> SchemaResult<T>,
    E: Fn(T) -> SchemaResult<S>,
{
    fn decode(&self, source: S) -> SchemaResult<T> {
        (self.decode_fn)(source)
    }

    fn encode(&self, target: T) -> SchemaResult<S> {
        (self.encode_fn)(target)
    }
}

/// A nominal-only wrapper: distinguishes e.g. `PolicyId` from `ScriptHash`
/// at the type level without changing the wire payload or runtime identity.
pub struct Brand<Marker, T>(pub T, PhantomData<Marker>);

impl<Marker, T> Brand<Marker, T> {
    pub fn new(value: T) -> Self {
        Brand(value, PhantomData)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<Marker, T: Clone> Clone for Brand<Marker, T> {
    fn clone(&self) -> Self {
        Brand(self.0.clone(), PhantomData)
    }
}

impl<Marker, T: fmt::Debug> fmt::Debug for Brand<Marker, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<Marker, T: PartialEq> PartialEq for Brand<Marker, T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<Marker, T: Eq> Eq for Brand<Marker, T> {}

/// A schema wrapping an inner schema's target in a [`Brand`].
pub struct Branded<Marker, Inner> {
    inner: Inner,
    _marker: PhantomData<Marker>,
}

pub fn brand<Marker, Inner, S, T>(inner: Inner) -> Branded<Marker, Inner>
where
    Inner: Schema<S, T>,
{
    Branded { inner, _marker: PhantomData }
}

impl<Marker, Inner, S, T> Schema<S, Brand<Marker, T>> for Branded<Marker, Inner>
where
    Inner: Schema<S, T>,
{
    fn decode(&self, source: S) -> SchemaResult<Brand<Marker, T>> {
        self.inner.decode(source).map(Brand::new)
    }

    fn encode(&self, target: Brand<Marker, T>) -> SchemaResult<S> {
        self.inner.encode(target.into_inner())
    }
}

/// A refinement that fails decode when `predicate` does not hold.
pub struct Filter<T, P> {
    predicate: P,
    message: &'static str,
    _marker: PhantomData<T>,
}

pub fn filter<T, P>(predicate: P, message: &'static str) -> Filter<T, P>
where
    P: Fn(&T) -> bool,
{
    Filter { predicate, message, _marker: PhantomData }
}

impl<T, P> Schema<T, T> for Filter<T, P>
where
    P: Fn(&T) -> bool,
{
    fn decode(&self, source: T) -> SchemaResult<T> {
        if (self.predicate)(&source) {
            Ok(source)
        } else {
            Err(SchemaError::new(ErrorKind::InvariantViolation, self.message))
        }
    }

    fn encode(&self, target: T) -> SchemaResult<T> {
        self.decode(target)
    }
}

/// Decodes only values whose outer node is `CborValue::Tag { tag: n, .. }`;
/// encode wraps its argument in that tag.
pub struct TagSchema {
    pub tag: u64,
}

pub fn tag(n: u64) -> TagSchema {
    TagSchema { tag: n }
}

impl Schema<CborValue, CborValue> for TagSchema {
    fn decode(&self, source: CborValue) -> SchemaResult<CborValue> {
        match source {
            CborValue::Tag { tag, inner } if tag == self.tag => Ok(*inner),
            other => Err(SchemaError::new(
                ErrorKind::InvalidTagPayload,
                format!("expected tag {}, got {other:?}", self.tag),
            )),
        }
    }

    fn encode(&self, target: CborValue) -> SchemaResult<CborValue> {
        Ok(CborValue::Tag { tag: self.tag, inner: Box::new(target) })
    }
}

/// Tries each variant in declaration order on decode; a union member
/// supplies its own discriminator logic for encode via `dispatch`.
pub struct Union<T> {
    variants: Vec<Box<dyn Schema<CborValue, T>>>,
    dispatch: Box<dyn Fn(&T) -> usize>,
}

pub fn union<T>(variants: Vec<Box<dyn Schema<CborValue, T>>>, dispatch: impl Fn(&T) -> usize + 'static) -> Union<T> {
    Union { variants, dispatch: Box::new(dispatch) }
}

impl<T> Schema<CborValue, T> for Union<T> {
    fn decode(&self, source: CborValue) -> SchemaResult<T> {
        for variant in &self.variants {
            if let Ok(value) = variant.decode(clone_cbor(&source)) {
                return Ok(value);
            }
        }
        Err(SchemaError::new(
            ErrorKind::InvalidVariant { discriminator: format!("{source:?}") },
            "no union variant matched",
        ))
    }

    fn encode(&self, target: T) -> SchemaResult<CborValue> {
        let index = (self.dispatch)(&target);
        self.variants
            .get(index)
            .ok_or_else(|| SchemaError::new(ErrorKind::InvalidVariant { discriminator: index.to_string() }, "dispatch returned an unknown variant index"))?
            .encode(target)
    }
}

fn clone_cbor(v: &CborValue) -> CborValue {
    // CborValue is Clone; kept as a named helper so union's retry loop reads
    // as "try this candidate against a fresh copy" rather than a bare clone.
    v.clone()
}

/// Decodes a `CborValue::Array` of exactly `schemas.len()` elements, one
/// schema per position.
pub fn tuple<T: 'static>(schemas: Vec<Box<dyn Schema<CborValue, T>>>) -> Tuple<T> {
    Tuple { schemas }
}

pub struct Tuple<T> {
    schemas: Vec<Box<dyn Schema<CborValue, T>>>,
}

impl<T> Schema<CborValue, Vec<T>> for Tuple<T> {
    fn decode(&self, source: CborValue) -> SchemaResult<Vec<T>> {
        let items = match source {
            CborValue::Array(items) => items,
            other => return Err(SchemaError::new(ErrorKind::InvalidVariant { discriminator: format!("{other:?}") }, "expected an array")),
        };
        if items.len() != self.schemas.len() {
            return Err(SchemaError::new(
                ErrorKind::OutOfRange,
                format!("expected a {}-tuple, got {} elements", self.schemas.len(), items.len()),
            ));
        }
        items.into_iter().zip(&self.schemas).map(|(item, schema)| schema.decode(item)).collect()
    }

    fn encode(&self, target: Vec<T>) -> SchemaResult<CborValue> {
        let items = target.into_iter().zip(&self.schemas).map(|(item, schema)| schema.encode(item)).collect::<SchemaResult<Vec<_>>>()?;
        Ok(CborValue::Array(items))
    }
}

/// Applies `item` to every element of a `CborValue::Array`.
pub struct ArraySchema<Item> {
    item: Item,
}

pub fn array<Item>(item: Item) -> ArraySchema<Item> {
    ArraySchema { item }
}

impl<Item, T> Schema<CborValue, Vec<T>> for ArraySchema<Item>
where
    Item: Schema<CborValue, T>,
{
    fn decode(&self, source: CborValue) -> SchemaResult<Vec<T>> {
        match source {
            CborValue::Array(items) => items.into_iter().map(|item| self.item.decode(item)).collect(),
            other => Err(SchemaError::new(ErrorKind::InvalidVariant { discriminator: format!("{other:?}") }, "expected an array")),
        }
    }

    fn encode(&self, target: Vec<T>) -> SchemaResult<CborValue> {
        let items = target.into_iter().map(|item| self.item.encode(item)).collect::<SchemaResult<Vec<_>>>()?;
        Ok(CborValue::Array(items))
    }
}

/// Applies `key`/`value` to every pair of a `CborValue::Map`, preserving
/// wire order.
pub struct MapSchema<K, V> {
    key: K,
    value: V,
}

pub fn map<K, V>(key: K, value: V) -> MapSchema<K, V> {
    MapSchema { key, value }
}

impl<K, V, KT, VT> Schema<CborValue, Vec<(KT, VT)>> for MapSchema<K, V>
where
    K: Schema<CborValue, KT>,
    V: Schema<CborValue, VT>,
{
    fn decode(&self, source: CborValue) -> SchemaResult<Vec<(KT, VT)>> {
        match source {
            CborValue::Map(pairs) => pairs.into_iter().map(|(k, v)| Ok((self.key.decode(k)?, self.value.decode(v)?))).collect(),
            other => Err(SchemaError::new(ErrorKind::InvalidVariant { discriminator: format!("{other:?}") }, "expected a map")),
        }
    }

    fn encode(&self, target: Vec<(KT, VT)>) -> SchemaResult<CborValue> {
        let pairs = target
            .into_iter()
            .map(|(k, v)| Ok((self.key.encode(k)?, self.value.encode(v)?)))
            .collect::<SchemaResult<Vec<_>>>()?;
        Ok(CborValue::Map(pairs))
    }
}

/// One field of a [`struct_`] schema: the integer key it appears under in
/// the CBOR map, and whether its absence is acceptable.
pub struct StructField {
    pub key: i64,
    pub optional: bool,
}

/// A required field at map key `key`.
pub fn field(key: i64) -> StructField {
    StructField { key, optional: false }
}

/// A field that may be entirely absent from the map; absent fields decode
/// as `None`.
pub fn optional_field(key: i64) -> StructField {
    StructField { key, optional: true }
}

/// Decodes a `CborValue::Map` with integer keys into one raw slot per
/// declared field, in declaration order (`None` for an absent optional
/// field); keys not named by any field are ignored. Per-field validation
/// into a concrete domain type is left to the caller, composed on top via
/// [`transform_or_fail`] — this combinator only enforces map shape.
pub struct StructSchema {
    fields: Vec<StructField>,
}

pub fn struct_(fields: Vec<StructField>) -> StructSchema {
    StructSchema { fields }
}

impl Schema<CborValue, Vec<Option<CborValue>>> for StructSchema {
    fn decode(&self, source: CborValue) -> SchemaResult<Vec<Option<CborValue>>> {
        let pairs = match source {
            CborValue::Map(pairs) => pairs,
            other => {
                return Err(SchemaError::new(
                    ErrorKind::InvalidVariant { discriminator: format!("{other:?}") },
                    "expected a map",
                ))
            }
        };

        self.fields
            .iter()
            .map(|f| {
                let found = pairs.iter().find(|(k, _)| k.as_i64() == Some(f.key)).map(|(_, v)| v.clone());
                match (found, f.optional) {
                    (Some(v), _) => Ok(Some(v)),
                    (None, true) => Ok(None),
                    (None, false) => Err(SchemaError::new(
                        ErrorKind::OutOfRange,
                        format!("missing required field at key {}", f.key),
                    )),
                }
            })
            .collect()
    }

    fn encode(&self, target: Vec<Option<CborValue>>) -> SchemaResult<CborValue> {
        let pairs = self
            .fields
            .iter()
            .zip(target)
            .filter_map(|(f, v)| v.map(|v| (CborValue::uint(f.key as u64), v)))
            .collect();
        Ok(CborValue::Map(pairs))
    }
}

/// A schema that only accepts one exact value, returning it unchanged.
/// Used as a discriminator arm inside [`union`].
pub struct Literal<T> {
    value: T,
}

pub fn literal<T>(value: T) -> Literal<T> {
    Literal { value }
}

impl<T> Schema<T, T> for Literal<T>
where
    T: PartialEq + Clone + fmt::Debug,
{
    fn decode(&self, source: T) -> SchemaResult<T> {
        if source == self.value {
            Ok(source)
        } else {
            Err(SchemaError::new(
                ErrorKind::InvalidVariant { discriminator: format!("{source:?}") },
                format!("expected literal {:?}", self.value),
            ))
        }
    }

    fn encode(&self, target: T) -> SchemaResult<T> {
        self.decode(target)
    }
}

/// `Option<T>`: `Null` decodes to `None`, anything else decodes via `inner`.
pub struct NullOr<Inner> {
    inner: Inner,
}

pub fn null_or<Inner>(inner: Inner) -> NullOr<Inner> {
    NullOr { inner }
}

impl<Inner, T> Schema<CborValue, Option<T>> for NullOr<Inner>
where
    Inner: Schema<CborValue, T>,
{
    fn decode(&self, source: CborValue) -> SchemaResult<Option<T>> {
        match source {
            CborValue::Simple(crate::value::Simple::Null) => Ok(None),
            other => self.inner.decode(other).map(Some),
        }
    }

    fn encode(&self, target: Option<T>) -> SchemaResult<CborValue> {
        match target {
            None => Ok(CborValue::Simple(crate::value::Simple::Null)),
            Some(v) => self.inner.encode(v),
        }
    }
}

/// A field that may be entirely absent from its enclosing struct map,
/// as opposed to [`NullOr`]'s explicit `null` on the wire.
pub use NullOr as Optional;
pub use null_or as optional;

/// `FromHex`: lower-case hex string, even length, round-tripped to raw bytes.
pub fn decode_hex(s: &str) -> SchemaResult<Vec<u8>> {
    hex::decode(s).map_err(|e| SchemaError::new(ErrorKind::OutOfRange, format!("invalid hex: {e}")))
}

pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// `FromBytes(T) = bytes <-> CborValue <-> T`.
pub fn from_cbor_bytes<T>(bytes: &[u8], options: &CodecOptions) -> SchemaResult<T>
where
    T: for<'b> minicbor::Decode<'b, CodecOptions>,
{
    let mut opts = *options;
    minicbor::decode_with(bytes, &mut opts).map_err(|e| SchemaError::new(ErrorKind::MalformedHeader, e.to_string()))
}

pub fn to_cbor_bytes<T>(value: &T, options: &CodecOptions) -> Vec<u8>
where
    T: minicbor::Encode<CodecOptions>,
{
    let mut opts = *options;
    minicbor::to_vec_with(value, &mut opts).expect("encoding into a Vec<u8> is infallible")
}

/// `FromCBORHex(T) = HexString <-> bytes <-> CborValue <-> T`.
pub fn from_cbor_hex<T>(hex_str: &str, options: &CodecOptions) -> SchemaResult<T>
where
    T: for<'b> minicbor::Decode<'b, CodecOptions>,
{
    let bytes = decode_hex(hex_str)?;
    from_cbor_bytes(&bytes, options)
}

pub fn to_cbor_hex<T>(value: &T, options: &CodecOptions) -> String
where
    T: minicbor::Encode<CodecOptions>,
{
    encode_hex(&to_cbor_bytes(value, options))
}

/// Round-trips a `CborValue` tree itself through bytes, independent of any
/// domain type: the innermost layer every other `from_cbor_*` helper
/// bottoms out on.
pub fn cbor_value_from_bytes(bytes: &[u8], options: &CodecOptions) -> SchemaResult<CborValue> {
    decode_cbor(bytes, options).map_err(|e| SchemaError::new(ErrorKind::MalformedHeader, e.to_string()))
}

pub fn cbor_value_to_bytes(value: &CborValue, options: &CodecOptions) -> Vec<u8> {
    encode_cbor(value, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn filter_rejects_and_accepts() {
        let schema = filter(|n: &i64| *n != 0, "must be non-zero");
        assert!(schema.decode(0).is_err());
        assert_eq!(schema.decode(5).unwrap(), 5);
    }

    #[test]
    fn compose_chains_and_propagates_cause() {
        let to_string = transform_or_fail(|n: i64| Ok::<_, SchemaError>(n.to_string()), |s: String| s.parse().map_err(|_| SchemaError::new(ErrorKind::OutOfRange, "not an int")));
        let non_zero = filter(|n: &i64| *n != 0, "must be non-zero");
        let composed = compose(non_zero, to_string);
        assert_eq!(composed.decode(5).unwrap(), "5");
        let err = composed.decode(0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvariantViolation);
    }

    #[test]
    fn brand_round_trips_through_inner() {
        struct PolicyMarker;
        let schema: Branded<PolicyMarker, _> = brand(transform_or_fail(|b: Vec<u8>| Ok::<_, SchemaError>(b), |b: Vec<u8>| Ok::<_, SchemaError>(b)));
        let branded = schema.decode(vec![1, 2, 3]).unwrap();
        assert_eq!(schema.encode(branded).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn tag_wraps_and_unwraps() {
        let schema = tag(258);
        let wrapped = schema.encode(CborValue::uint(1)).unwrap();
        assert_eq!(schema.decode(wrapped).unwrap(), CborValue::uint(1));
        assert!(schema.decode(CborValue::uint(1)).is_err());
    }

    #[test]
    fn array_and_map_combinators() {
        let elems = array(transform_or_fail(|v: CborValue| v.as_u64().ok_or_else(|| SchemaError::new(ErrorKind::OutOfRange, "not a uint")), |n: u64| Ok::<_, SchemaError>(CborValue::uint(n))));
        let decoded = elems.decode(CborValue::Array(vec![CborValue::uint(1), CborValue::uint(2)])).unwrap();
        assert_eq!(decoded, vec![1, 2]);
        assert_eq!(elems.encode(decoded).unwrap(), CborValue::Array(vec![CborValue::uint(1), CborValue::uint(2)]));
    }

    #[test]
    fn null_or_round_trips() {
        let schema = null_or(transform_or_fail(|v: CborValue| v.as_u64().ok_or_else(|| SchemaError::new(ErrorKind::OutOfRange, "not a uint")), |n: u64| Ok::<_, SchemaError>(CborValue::uint(n))));
        assert_eq!(schema.decode(CborValue::Simple(crate::value::Simple::Null)).unwrap(), None);
        assert_eq!(schema.decode(CborValue::uint(7)).unwrap(), Some(7));
        assert_eq!(schema.encode(None).unwrap(), CborValue::Simple(crate::value::Simple::Null));
    }

    #[test]
    fn literal_accepts_only_its_value() {
        let schema = literal(CborValue::uint(2));
        assert_eq!(schema.decode(CborValue::uint(2)).unwrap(), CborValue::uint(2));
        assert!(schema.decode(CborValue::uint(3)).is_err());
        assert_eq!(schema.encode(CborValue::uint(2)).unwrap(), CborValue::uint(2));
    }

    #[test]
    fn struct_decodes_required_and_optional_fields_and_ignores_extras() {
        let schema = struct_(vec![field(0), optional_field(1), optional_field(2)]);
        let map = CborValue::Map(vec![
            (CborValue::uint(0), CborValue::uint(10)),
            (CborValue::uint(1), CborValue::uint(11)),
            (CborValue::uint(99), CborValue::uint(999)),
        ]);
        let slots = schema.decode(map).unwrap();
        assert_eq!(slots, vec![Some(CborValue::uint(10)), Some(CborValue::uint(11)), None]);

        let re_encoded = schema.encode(slots).unwrap();
        assert_eq!(
            re_encoded,
            CborValue::Map(vec![
                (CborValue::uint(0), CborValue::uint(10)),
                (CborValue::uint(1), CborValue::uint(11)),
            ])
        );
    }

    #[test]
    fn struct_fails_when_a_required_field_is_missing() {
        let schema = struct_(vec![field(0)]);
        let map = CborValue::Map(vec![]);
        let err = schema.decode(map).unwrap_err();
        assert_eq!(err.kind, ErrorKind::OutOfRange);
    }

    proptest::proptest! {
        #[test]
        fn compose_filter_transform_round_trips_any_nonzero_i64(n in any::<i64>().prop_filter("nonzero", |n| *n != 0)) {
            let non_zero = filter(|n: &i64| *n != 0, "must be non-zero");
            let to_string = transform_or_fail(
                |n: i64| Ok::<_, SchemaError>(n.to_string()),
                |s: String| s.parse().map_err(|_| SchemaError::new(ErrorKind::OutOfRange, "not an int")),
            );
            let composed = compose(non_zero, to_string);
            let decoded = composed.decode(n).unwrap();
            let back = composed.encode(decoded).unwrap();
            prop_assert_eq!(back, n);
        }

        #[test]
        fn array_schema_round_trips_any_u64_vec(xs in proptest::collection::vec(any::<u64>(), 0..16)) {
            let elems = array(transform_or_fail(
                |v: CborValue| v.as_u64().ok_or_else(|| SchemaError::new(ErrorKind::OutOfRange, "not a uint")),
                |n: u64| Ok::<_, SchemaError>(CborValue::uint(n)),
            ));
            let source = CborValue::Array(xs.iter().copied().map(CborValue::uint).collect());
            let decoded = elems.decode(source.clone()).unwrap();
            prop_assert_eq!(decoded.clone(), xs);
            prop_assert_eq!(elems.encode(decoded).unwrap(), source);
        }
    }
}
