//! A self-describing CBOR value tree, decoded and encoded under the
//! control of a [`CodecOptions`].
//!
//! `CborValue` is the bridge between raw wire bytes and the typed-schema
//! layer in [`crate::schema`]: every domain type ultimately decodes from,
//! and encodes to, one of these nodes.

use std::cmp::Ordering;

use half::f16;
use minicbor::data::{IanaTag, Tag, Type};
use minicbor::encode::Write as EncodeWrite;
use minicbor::{decode, encode, Decode, Decoder, Encode, Encoder};
use num_bigint::BigUint;

use crate::options::{CodecOptions, Mode};

/// A CBOR simple value (major type 7) that is not a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simple {
    False,
    True,
    Null,
    Undefined,
    /// An unassigned simple value, carried as its raw numeric code
    /// (0..=19 or 32..=255).
    Unassigned(u8),
}

/// A recursive CBOR value.
///
/// `Uint`/`Nint` hold arbitrary-precision magnitudes: values up to
/// `2^64 - 1` round-trip through native widths, larger ones through the
/// tag-2/tag-3 bignum forms, which the reader folds transparently into
/// these variants.
#[derive(Debug, Clone, PartialEq)]
pub enum CborValue {
    /// Non-negative integer.
    Uint(BigUint),
    /// Negative integer, stored as `n` where the represented value is
    /// `-1 - n`.
    Nint(BigUint),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<CborValue>),
    /// Ordered key/value pairs, in wire order. Duplicate keys are
    /// preserved as decoded; the writer may reorder them per options.
    Map(Vec<(CborValue, CborValue)>),
    Tag {
        tag: u64,
        inner: Box<CborValue>,
    },
    Simple(Simple),
    /// Always the widened 64-bit value; the writer picks the narrowest
    /// width that round-trips under canonical mode.
    Float(f64),
}

impl CborValue {
    pub fn uint(v: u64) -> Self {
        CborValue::Uint(BigUint::from(v))
    }

    /// A negative integer with the ordinary CBOR value `v` (must be negative).
    pub fn nint(v: i64) -> Self {
        assert!(v < 0, "nint() requires a negative value");
        CborValue::Nint(BigUint::from((-1 - v) as u64))
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            CborValue::Uint(n) => biguint_to_u64(n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CborValue::Uint(n) => biguint_to_u64(n).and_then(|n| i64::try_from(n).ok()),
            CborValue::Nint(n) => {
                let n = biguint_to_u64(n)?;
                i64::try_from(n).ok().map(|n| -1 - n)
            }
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CborValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CborValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[CborValue]> {
        match self {
            CborValue::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(CborValue, CborValue)]> {
        match self {
            CborValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

fn biguint_to_u64(n: &BigUint) -> Option<u64> {
    let bytes = n.to_bytes_be();
    if bytes.len() > 8 {
        return None;
    }
    let mut buf = [0u8; 8];
    buf[8 - bytes.len()..].copy_from_slice(&bytes);
    Some(u64::from_be_bytes(buf))
}

/// Decode a full CBOR item, as a standalone entry point.
///
/// Fails with a trailing-input error if `bytes` is not fully consumed.
pub fn decode_cbor(bytes: &[u8], options: &CodecOptions) -> Result<CborValue, decode::Error> {
    let mut opts = *options;
    let mut d = Decoder::new(bytes);
    let value = CborValue::decode(&mut d, &mut opts)?;
    if d.position() != bytes.len() {
        return Err(decode::Error::message("trailing input after top-level value"));
    }
    Ok(value)
}

/// Encode a full CBOR item, as a standalone entry point.
pub fn encode_cbor(value: &CborValue, options: &CodecOptions) -> Vec<u8> {
    let mut opts = *options;
    let mut buf = Vec::new();
    let mut e = Encoder::new(&mut buf);
    value
        .encode(&mut e, &mut opts)
        .expect("encoding into a Vec<u8> is infallible");
    buf
}

fn put<W: EncodeWrite>(e: &mut Encoder<W>, bytes: &[u8]) -> Result<(), encode::Error<W::Error>> {
    e.writer_mut().write_all(bytes).map_err(encode::Error::write)
}

/// Writes the header for major type `mt` (0 or 1) carrying length/value `v`,
/// honouring `minimal`. When `minimal` is false the writer still emits `v`
/// unwidened when it fits the initial byte (there is no separate length
/// field to widen in that case); otherwise it always widens to the full
/// 8-byte form.
fn write_header<W: EncodeWrite>(e: &mut Encoder<W>, mt: u8, v: u64, minimal: bool) -> Result<(), encode::Error<W::Error>> {
    let top = mt << 5;
    if minimal {
        match v {
            0..=0x17 => put(e, &[top | v as u8]),
            0x18..=0xff => put(e, &[top | 24, v as u8]),
            0x100..=0xffff => {
                put(e, &[top | 25])?;
                put(e, &(v as u16).to_be_bytes())
            }
            0x1_0000..=0xffff_ffff => {
                put(e, &[top | 26])?;
                put(e, &(v as u32).to_be_bytes())
            }
            _ => {
                put(e, &[top | 27])?;
                put(e, &v.to_be_bytes())
            }
        }
    } else if v < 24 {
        put(e, &[top | v as u8])
    } else {
        put(e, &[top | 27])?;
        put(e, &v.to_be_bytes())
    }
}

fn write_biguint<W: EncodeWrite>(e: &mut Encoder<W>, mt: u8, n: &BigUint, minimal: bool) -> Result<(), encode::Error<W::Error>> {
    match biguint_to_u64(n) {
        Some(v) => write_header(e, mt, v, minimal),
        None => {
            let tag = if mt == 0 { IanaTag::PosBignum } else { IanaTag::NegBignum };
            e.tag(tag)?;
            e.bytes(&n.to_bytes_be())?;
            Ok(())
        }
    }
}

fn at_break(d: &Decoder) -> Result<bool, decode::Error> {
    Ok(d.datatype()? == Type::Break)
}

fn consume_break(d: &mut Decoder) {
    d.set_position(d.position() + 1);
}

impl<'b> Decode<'b, CodecOptions> for CborValue {
    fn decode(d: &mut Decoder<'b>, ctx: &mut CodecOptions) -> Result<Self, decode::Error> {
        match d.datatype()? {
            Type::U8 | Type::U16 | Type::U32 | Type::U64 | Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Int => {
                let i = d.int()?;
                let v = i128::from(i);
                if v >= 0 {
                    Ok(CborValue::Uint(BigUint::from(v as u128)))
                } else {
                    let n = (-1i128 - v) as u128;
                    Ok(CborValue::Nint(BigUint::from(n)))
                }
            }
            Type::Bytes | Type::BytesIndef => {
                let mut out = Vec::new();
                for chunk in d.bytes_iter()? {
                    out.extend_from_slice(chunk?);
                }
                Ok(CborValue::Bytes(out))
            }
            Type::String | Type::StringIndef => {
                let mut out = String::new();
                for chunk in d.str_iter()? {
                    out.push_str(chunk?);
                }
                Ok(CborValue::Text(out))
            }
            Type::Array | Type::ArrayIndef => {
                let mut items = Vec::new();
                match d.array()? {
                    Some(n) => {
                        for _ in 0..n {
                            items.push(CborValue::decode(d, ctx)?);
                        }
                    }
                    None => {
                        while !at_break(d)? {
                            items.push(CborValue::decode(d, ctx)?);
                        }
                        consume_break(d);
                    }
                }
                Ok(CborValue::Array(items))
            }
            Type::Map | Type::MapIndef => {
                let mut pairs = Vec::new();
                match d.map()? {
                    Some(n) => {
                        for _ in 0..n {
                            let k = CborValue::decode(d, ctx)?;
                            let v = CborValue::decode(d, ctx)?;
                            pairs.push((k, v));
                        }
                    }
                    None => {
                        while !at_break(d)? {
                            let k = CborValue::decode(d, ctx)?;
                            let v = CborValue::decode(d, ctx)?;
                            pairs.push((k, v));
                        }
                        consume_break(d);
                    }
                }
                Ok(CborValue::Map(pairs))
            }
            Type::Tag => {
                let tag = d.tag()?.as_u64();
                if tag == 2 || tag == 3 {
                    let inner = CborValue::decode(d, ctx)?;
                    let bytes = match inner {
                        CborValue::Bytes(b) => b,
                        _ => return Err(decode::Error::message("bignum tag requires a byte string inner value")),
                    };
                    let n = BigUint::from_bytes_be(&bytes);
                    if tag == 2 {
                        Ok(CborValue::Uint(n))
                    } else {
                        Ok(CborValue::Nint(n))
                    }
                } else {
                    let inner = CborValue::decode(d, ctx)?;
                    Ok(CborValue::Tag { tag, inner: Box::new(inner) })
                }
            }
            Type::Bool => Ok(CborValue::Simple(if d.bool()? { Simple::True } else { Simple::False })),
            Type::Null => {
                d.null()?;
                Ok(CborValue::Simple(Simple::Null))
            }
            Type::Undefined => {
                d.undefined()?;
                Ok(CborValue::Simple(Simple::Undefined))
            }
            Type::Simple => Ok(CborValue::Simple(Simple::Unassigned(d.simple()?))),
            Type::F16 | Type::F32 | Type::F64 => Ok(CborValue::Float(d.f64()?)),
            other => Err(decode::Error::message(format!("unsupported top-level CBOR type: {other}"))),
        }
    }
}

/// Whether a collection of `len` elements should be written indefinite,
/// given the options' indefinite flag and the empty-collection override.
fn use_indefinite(len: usize, indefinite_flag: bool, definite_for_empty: bool) -> bool {
    indefinite_flag && !(len == 0 && definite_for_empty)
}

impl Encode<CodecOptions> for CborValue {
    fn encode<W: EncodeWrite>(&self, e: &mut Encoder<W>, ctx: &mut CodecOptions) -> Result<(), encode::Error<W::Error>> {
        match self {
            CborValue::Uint(n) => write_biguint(e, 0, n, ctx.minimal_encoding()),
            CborValue::Nint(n) => write_biguint(e, 1, n, ctx.minimal_encoding()),
            CborValue::Bytes(b) => {
                e.bytes(b)?;
                Ok(())
            }
            CborValue::Text(s) => {
                e.str(s)?;
                Ok(())
            }
            CborValue::Array(items) => {
                if use_indefinite(items.len(), ctx.indefinite_arrays(), ctx.definite_for_empty()) {
                    e.begin_array()?;
                    for item in items {
                        item.encode(e, ctx)?;
                    }
                    e.end()?;
                } else {
                    e.array(items.len() as u64)?;
                    for item in items {
                        item.encode(e, ctx)?;
                    }
                }
                Ok(())
            }
            CborValue::Map(pairs) => encode_map(e, pairs, ctx),
            CborValue::Tag { tag, inner } => {
                e.tag(Tag::new(*tag))?;
                inner.encode(e, ctx)
            }
            CborValue::Simple(Simple::False) => {
                e.bool(false)?;
                Ok(())
            }
            CborValue::Simple(Simple::True) => {
                e.bool(true)?;
                Ok(())
            }
            CborValue::Simple(Simple::Null) => {
                e.null()?;
                Ok(())
            }
            CborValue::Simple(Simple::Undefined) => {
                e.undefined()?;
                Ok(())
            }
            CborValue::Simple(Simple::Unassigned(n)) => {
                e.simple(*n)?;
                Ok(())
            }
            CborValue::Float(v) => write_float(e, *v, ctx.mode == Mode::Canonical),
        }
    }
}

fn encode_map<W: EncodeWrite>(e: &mut Encoder<W>, pairs: &[(CborValue, CborValue)], ctx: &mut CodecOptions) -> Result<(), encode::Error<W::Error>> {
    // Sorting needs the *encoded* key bytes, so render every pair up front
    // regardless of options; this also lets indefinite vs. definite mode
    // share one code path below.
    let mut encoded: Vec<(Vec<u8>, Vec<u8>)> = pairs
        .iter()
        .map(|(k, v)| (encode_cbor(k, ctx), encode_cbor(v, ctx)))
        .collect();
    if ctx.sorts_map_keys() {
        let tie_break = ctx.canonical_tie_break();
        encoded.sort_by(|a, b| {
            let by_len = a.0.len().cmp(&b.0.len());
            if tie_break && by_len == Ordering::Equal {
                a.0.cmp(&b.0)
            } else {
                by_len
            }
        });
    }
    if use_indefinite(encoded.len(), ctx.indefinite_maps(), ctx.definite_for_empty()) {
        e.begin_map()?;
        for (k, v) in &encoded {
            put(e, k)?;
            put(e, v)?;
        }
        e.end()?;
    } else {
        e.map(encoded.len() as u64)?;
        for (k, v) in &encoded {
            put(e, k)?;
            put(e, v)?;
        }
    }
    Ok(())
}

/// Canonical float selection: try half, then single, then double, keeping
/// the narrowest width that round-trips exactly. `NaN` and the infinities
/// always use the canonical half-precision encodings.
fn write_float<W: EncodeWrite>(e: &mut Encoder<W>, v: f64, canonical: bool) -> Result<(), encode::Error<W::Error>> {
    if !canonical {
        e.f64(v)?;
        return Ok(());
    }
    if v.is_nan() {
        return put(e, &[0xf9, 0x7e, 0x00]);
    }
    if v.is_infinite() {
        let bits: u16 = if v.is_sign_positive() { 0x7c00 } else { 0xfc00 };
        put(e, &[0xf9])?;
        return put(e, &bits.to_be_bytes());
    }
    let half = f16::from_f64(v);
    if f64::from(half.to_f32()) == v {
        put(e, &[0xf9])?;
        return put(e, &half.to_bits().to_be_bytes());
    }
    let single = v as f32;
    if f64::from(single) == v {
        put(e, &[0xfa])?;
        return put(e, &single.to_bits().to_be_bytes());
    }
    put(e, &[0xfb])?;
    put(e, &v.to_bits().to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rt(v: &CborValue, opts: &CodecOptions) -> CborValue {
        let bytes = encode_cbor(v, opts);
        decode_cbor(&bytes, opts).unwrap()
    }

    #[test]
    fn integer_boundary_grid() {
        let opts = CodecOptions::cml();
        let cases: Vec<(CborValue, &str)> = vec![
            (CborValue::uint(0), "00"),
            (CborValue::uint(23), "17"),
            (CborValue::uint(24), "1818"),
            (CborValue::uint(255), "18ff"),
            (CborValue::uint(256), "190100"),
            (CborValue::uint(u64::MAX), "1bffffffffffffffff"),
            (CborValue::Uint(BigUint::from(u64::MAX) + 1u8), "c249010000000000000000"),
            (CborValue::nint(-1), "20"),
            (CborValue::Nint(BigUint::from(u64::MAX)), "3bffffffffffffffff"),
            (CborValue::Nint(BigUint::from(u64::MAX) + 1u8), "c349010000000000000000"),
        ];
        for (value, hex) in &cases {
            let bytes = encode_cbor(value, &opts);
            assert_eq!(hex::encode(&bytes), *hex, "encoding {value:?}");
            assert_eq!(&decode_cbor(&bytes, &opts).unwrap(), value);
        }
    }

    #[test]
    fn rejects_trailing_input() {
        let opts = CodecOptions::default();
        let mut bytes = encode_cbor(&CborValue::uint(1), &opts);
        bytes.push(0x00);
        assert!(decode_cbor(&bytes, &opts).is_err());
    }

    #[test]
    fn rejects_truncation() {
        let opts = CodecOptions::default();
        let bytes = encode_cbor(&CborValue::Array(vec![CborValue::uint(1), CborValue::uint(2)]), &opts);
        assert!(decode_cbor(&bytes[..bytes.len() - 1], &opts).is_err());
    }

    #[test]
    fn bignum_fold_round_trip() {
        let opts = CodecOptions::default();
        let n = BigUint::from(u64::MAX) + 100u32;
        let v = CborValue::Uint(n);
        assert_eq!(rt(&v, &opts), v);
    }

    #[test]
    fn indefinite_string_streaming() {
        let bytes = hex::decode("7f657374726561646d696e67ff").unwrap();
        let opts = CodecOptions::default();
        let v = decode_cbor(&bytes, &opts).unwrap();
        assert_eq!(v, CborValue::Text("streaming".to_string()));
    }

    #[test]
    fn nested_indefinite_string_chunk_fails() {
        // An indefinite string chunk that is itself indefinite-length is malformed.
        let bytes = hex::decode("7f7f657374726561646d696e67ffff").unwrap();
        let opts = CodecOptions::default();
        assert!(decode_cbor(&bytes, &opts).is_err());
    }

    #[test]
    fn indefinite_equivalence() {
        let v = CborValue::Array(vec![CborValue::uint(1), CborValue::uint(2), CborValue::uint(3)]);
        let def = CodecOptions::default();
        let indef = CodecOptions { use_indefinite_arrays: true, use_definite_for_empty: false, ..CodecOptions::default() };
        assert_eq!(decode_cbor(&encode_cbor(&v, &indef), &indef).unwrap(), decode_cbor(&encode_cbor(&v, &def), &def).unwrap());
    }

    #[test]
    fn universal_round_trip_nested() {
        let opts = CodecOptions::default();
        let v = CborValue::Map(vec![
            (CborValue::Text("a".into()), CborValue::Array(vec![CborValue::uint(1), CborValue::Simple(Simple::Null)])),
            (CborValue::uint(2), CborValue::Bytes(vec![1, 2, 3])),
        ]);
        assert_eq!(rt(&v, &opts), v);
    }

    #[test]
    fn sort_map_keys_by_encoded_length_not_lexicographic() {
        // key `1000` encodes as three bytes (19 03 e8), key `1` as one (01);
        // length-only sort must place the short key first even though `1000`
        // is numerically smaller... no, larger: the point is length, not value.
        let opts = CodecOptions { mode: Mode::Custom, sort_map_keys: true, ..CodecOptions::cml() };
        let v = CborValue::Map(vec![
            (CborValue::uint(1000), CborValue::uint(1)),
            (CborValue::uint(1), CborValue::uint(2)),
        ]);
        let bytes = encode_cbor(&v, &opts);
        let expected_key_order = [encode_cbor(&CborValue::uint(1), &opts), encode_cbor(&CborValue::uint(1000), &opts)];
        let mut expected = vec![0xa2u8];
        expected.extend_from_slice(&expected_key_order[0]);
        expected.extend_from_slice(&encode_cbor(&CborValue::uint(2), &opts));
        expected.extend_from_slice(&expected_key_order[1]);
        expected.extend_from_slice(&encode_cbor(&CborValue::uint(1), &opts));
        assert_eq!(bytes, expected);
    }
}
