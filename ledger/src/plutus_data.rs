//! The Plutus `Data` subcodec: the five-shape value tree Plutus scripts see
//! for datums and redeemers, plus the constructor-tag encoding Cardano uses
//! to pack small `Constr` indices directly into the CBOR tag.

use cardano_cbor::minicbor::{
    self,
    data::{IanaTag, Tag},
    Encode,
};
use cardano_cbor::utils::{Int, KeyValuePairs};
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref};

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum PlutusData {
    Constr(Constr<PlutusData>),
    Map(KeyValuePairs<PlutusData, PlutusData>),
    Int(PlutusInt),
    ByteArray(ByteArray),
    List(Vec<PlutusData>),
}

impl<'b, C> minicbor::decode::Decode<'b, C> for PlutusData {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let type_ = d.datatype()?;

        match type_ {
            minicbor::data::Type::Tag => {
                let mut probe = d.probe();
                let tag = probe.tag()?;

                if tag == IanaTag::PosBignum.tag() || tag == IanaTag::NegBignum.tag() {
                    Ok(Self::Int(d.decode_with(ctx)?))
                } else {
                    match tag.as_u64() {
                        (121..=127) | (1280..=1400) | 102 => Ok(Self::Constr(d.decode_with(ctx)?)),
                        _ => Err(minicbor::decode::Error::message(
                            "unknown tag for plutus data tag",
                        )),
                    }
                }
            }
            minicbor::data::Type::U8
            | minicbor::data::Type::U16
            | minicbor::data::Type::U32
            | minicbor::data::Type::U64
            | minicbor::data::Type::I8
            | minicbor::data::Type::I16
            | minicbor::data::Type::I32
            | minicbor::data::Type::I64
            | minicbor::data::Type::Int => Ok(Self::Int(d.decode_with(ctx)?)),
            minicbor::data::Type::Map | minicbor::data::Type::MapIndef => {
                Ok(Self::Map(d.decode_with(ctx)?))
            }
            minicbor::data::Type::Bytes => Ok(Self::ByteArray(d.decode_with(ctx)?)),
            minicbor::data::Type::BytesIndef => {
                let mut full = Vec::new();

                for slice in d.bytes_iter()? {
                    full.extend(slice?);
                }

                Ok(Self::ByteArray(ByteArray::from(full)))
            }
            minicbor::data::Type::Array | minicbor::data::Type::ArrayIndef => {
                Ok(Self::List(d.decode_with(ctx)?))
            }

            any => Err(minicbor::decode::Error::message(format!(
                "bad cbor data type ({any:?}) for plutus data"
            ))),
        }
    }
}

impl<C> minicbor::encode::Encode<C> for PlutusData {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            Self::Constr(a) => {
                e.encode_with(a, ctx)?;
            }
            Self::Map(a) => {
                // definite-length map, matching the canonical plutus implementation
                // https://github.com/input-output-hk/plutus/blob/9538fc9829426b2ecb0628d352e2d7af96ec8204/plutus-core/plutus-core/src/PlutusCore/Data.hs#L152
                e.map(a.len().try_into().unwrap())?;
                for (k, v) in a.iter() {
                    k.encode(e, ctx)?;
                    v.encode(e, ctx)?;
                }
            }
            Self::Int(a) => {
                e.encode_with(a, ctx)?;
            }
            Self::ByteArray(a) => {
                e.encode_with(a, ctx)?;
            }
            Self::List(a) => {
                encode_list(a, e, ctx)?;
            }
        };

        Ok(())
    }
}

/*
big_int = int / big_uint / big_nint ; New
big_uint = #6.2(bounded_bytes) ; New
big_nint = #6.3(bounded_bytes) ; New
 */

/// An arbitrary-precision Plutus `Data` integer: a native CBOR int when it
/// fits, otherwise a tag-2/3 big_uint/big_nint fallback.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum PlutusInt {
    Int(Int),
    BigUInt(ByteArray),
    BigNInt(ByteArray),
}

impl<'b, C> minicbor::decode::Decode<'b, C> for PlutusInt {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let datatype = d.datatype()?;

        match datatype {
            minicbor::data::Type::U8
            | minicbor::data::Type::U16
            | minicbor::data::Type::U32
            | minicbor::data::Type::U64
            | minicbor::data::Type::I8
            | minicbor::data::Type::I16
            | minicbor::data::Type::I32
            | minicbor::data::Type::I64
            | minicbor::data::Type::Int => Ok(Self::Int(d.decode_with(ctx)?)),
            minicbor::data::Type::Tag => {
                let tag = d.tag()?;
                if tag == IanaTag::PosBignum.tag() {
                    Ok(Self::BigUInt(d.decode_with(ctx)?))
                } else if tag == IanaTag::NegBignum.tag() {
                    Ok(Self::BigNInt(d.decode_with(ctx)?))
                } else {
                    Err(minicbor::decode::Error::message(
                        "invalid cbor tag for plutus int",
                    ))
                }
            }
            _ => Err(minicbor::decode::Error::message(
                "invalid cbor data type for plutus int",
            )),
        }
    }
}

impl<C> minicbor::encode::Encode<C> for PlutusInt {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            PlutusInt::Int(x) => {
                e.encode_with(x, ctx)?;
            }
            PlutusInt::BigUInt(x) => {
                e.tag(IanaTag::PosBignum)?;
                e.encode_with(x, ctx)?;
            }
            PlutusInt::BigNInt(x) => {
                e.tag(IanaTag::NegBignum)?;
                e.encode_with(x, ctx)?;
            }
        };

        Ok(())
    }
}

/// A Plutus `Constr`: a constructor tag plus its field list.
///
/// `tag` holds the raw CBOR tag number. Tags 121-127 and 1280-1400 encode
/// the constructor index directly (`any_constructor` is `None`); tag 102 is
/// the general escape for indices outside that range, carrying the index as
/// the first array element (`any_constructor` is `Some`).
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct Constr<A> {
    pub tag: u64,
    pub any_constructor: Option<u64>,
    pub fields: Vec<A>,
}

impl<A> Constr<A> {
    /// The constructor index this `Constr` represents, regardless of which
    /// tag scheme was used to encode it.
    pub fn constructor_index(&self) -> u64 {
        match self.any_constructor {
            Some(i) => i,
            None if (121..=127).contains(&self.tag) => self.tag - 121,
            None => self.tag - 1280 + 7,
        }
    }
}

impl<'b, C, A> minicbor::decode::Decode<'b, C> for Constr<A>
where
    A: minicbor::decode::Decode<'b, C>,
{
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let tag = d.tag()?;
        let x = tag.as_u64();
        match x {
            121..=127 | 1280..=1400 => Ok(Constr {
                tag: x,
                fields: d.decode_with(ctx)?,
                any_constructor: None,
            }),
            102 => {
                d.array()?;

                Ok(Constr {
                    tag: x,
                    any_constructor: Some(d.decode_with(ctx)?),
                    fields: d.decode_with(ctx)?,
                })
            }
            _ => Err(minicbor::decode::Error::message(
                "bad tag code for plutus data",
            )),
        }
    }
}

impl<C, A> minicbor::encode::Encode<C> for Constr<A>
where
    A: minicbor::encode::Encode<C>,
{
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.tag(Tag::new(self.tag))?;

        match self.tag {
            102 => {
                e.array(2)?;
                e.encode_with(self.any_constructor.unwrap_or_default(), ctx)?;
                encode_list(&self.fields, e, ctx)?;
                Ok(())
            }
            _ => {
                encode_list(&self.fields, e, ctx)?;
                Ok(())
            }
        }
    }
}

/// A Plutus `Data` byte string. Chunked into 64-byte indefinite segments
/// above that length to match the canonical Plutus implementation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(into = "String")]
#[serde(try_from = "String")]
pub struct ByteArray(Vec<u8>);

impl From<Vec<u8>> for ByteArray {
    fn from(xs: Vec<u8>) -> Self {
        ByteArray(xs)
    }
}

impl From<ByteArray> for Vec<u8> {
    fn from(b: ByteArray) -> Self {
        b.0
    }
}

impl Deref for ByteArray {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<String> for ByteArray {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let v = hex::decode(value)?;
        Ok(ByteArray(v))
    }
}

impl From<ByteArray> for String {
    fn from(b: ByteArray) -> Self {
        hex::encode(b.deref())
    }
}

impl fmt::Display for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes: Vec<u8> = self.clone().into();

        f.write_str(&hex::encode(bytes))
    }
}

impl<C> Encode<C> for ByteArray {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        const CHUNK_SIZE: usize = 64;
        let bs: &Vec<u8> = self.deref();
        if bs.len() <= 64 {
            e.bytes(bs)?;
        } else {
            e.begin_bytes()?;
            for b in bs.chunks(CHUNK_SIZE) {
                e.bytes(b)?;
            }
            e.end()?;
        }
        Ok(())
    }
}

impl<'b, C> minicbor::decode::Decode<'b, C> for ByteArray {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let mut res = Vec::new();
        for chunk in d.bytes_iter()? {
            let bs = chunk?;
            res.extend_from_slice(bs);
        }
        Ok(ByteArray::from(res))
    }
}

fn encode_list<C, W: minicbor::encode::Write, A: minicbor::encode::Encode<C>>(
    a: &Vec<A>,
    e: &mut minicbor::Encoder<W>,
    ctx: &mut C,
) -> Result<(), minicbor::encode::Error<W::Error>> {
    // indefinite for non-empty arrays, definite 0-length for empty, matching
    // the default haskell cborg list encoding
    if a.is_empty() {
        e.array(0)?;
    } else {
        e.begin_array()?;
        for v in a {
            e.encode_with(v, ctx)?;
        }
        e.end()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &PlutusData) -> PlutusData {
        let bytes = minicbor::to_vec(data).unwrap();
        minicbor::decode(&bytes).unwrap()
    }

    #[test]
    fn constr_small_index_roundtrips() {
        let data = PlutusData::Constr(Constr {
            tag: 121,
            any_constructor: None,
            fields: vec![PlutusData::Int(PlutusInt::Int(1.into()))],
        });
        assert_eq!(roundtrip(&data), data);
    }

    #[test]
    fn constr_constructor_index_small_tag() {
        let c: Constr<PlutusData> = Constr {
            tag: 125,
            any_constructor: None,
            fields: vec![],
        };
        assert_eq!(c.constructor_index(), 4);
    }

    #[test]
    fn constr_general_escape_roundtrips() {
        let data = PlutusData::Constr(Constr {
            tag: 102,
            any_constructor: Some(42),
            fields: vec![PlutusData::Int(PlutusInt::Int(1.into()))],
        });
        assert_eq!(roundtrip(&data), data);

        if let PlutusData::Constr(c) = &data {
            assert_eq!(c.constructor_index(), 42);
        }
    }

    #[test]
    fn constr_index_42_encodes_indefinite_and_accepts_definite_on_decode() {
        // index 42 falls in the secondary range: tag = 1280 + (42 - 7) = 1315 (0x0523).
        let constr = Constr {
            tag: 1280 + (42 - 7),
            any_constructor: None,
            fields: vec![PlutusData::Int(PlutusInt::Int(1.into()))],
        };
        assert_eq!(constr.constructor_index(), 42);

        let data = PlutusData::Constr(constr);
        let encoded = minicbor::to_vec(&data).unwrap();
        // D9 0523 tags the two-byte constructor range, 9F 01 FF is the
        // indefinite one-element array CML expects for Plutus-data fields.
        assert_eq!(encoded, vec![0xD9, 0x05, 0x23, 0x9F, 0x01, 0xFF]);

        // the definite-length form of the same value must still decode.
        let definite = vec![0xD9, 0x05, 0x23, 0x81, 0x01];
        let decoded: PlutusData = minicbor::decode(&definite).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn long_bytearray_chunks_indefinite() {
        let data = PlutusData::ByteArray(ByteArray::from(vec![7u8; 100]));
        let bytes = minicbor::to_vec(&data).unwrap();
        // 0x5f starts an indefinite byte string
        assert_eq!(bytes[0], 0x5f);
        assert_eq!(roundtrip(&data), data);
    }
}
