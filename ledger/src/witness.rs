//! Transaction witnesses: signatures, scripts, and redeemers that
//! authorize and justify a transaction's inputs and minting.

use std::collections::BTreeMap;

use cardano_cbor::codec_by_datatype;
use cardano_cbor::minicbor::{self, Decode, Encode};
use cardano_cbor::utils::{Bytes, KeepRaw, NonEmptySet};
use serde::{Deserialize, Serialize};

use crate::{AddrKeyhash, ExUnits};
use crate::plutus_data::PlutusData;

/// A key-signature pair authorizing a transaction input.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, PartialEq, Eq, Ord, PartialOrd, Clone)]
pub struct VKeyWitness {
    #[n(0)]
    pub vkey: Bytes,

    #[n(1)]
    pub signature: Bytes,
}

/// A Byron-era bootstrap witness, carrying the extra chain-code/attributes
/// fields needed to derive the spending key from an HD wallet root.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, PartialEq, Eq, Ord, PartialOrd, Clone)]
pub struct BootstrapWitness {
    #[n(0)]
    pub public_key: Bytes,

    #[n(1)]
    pub signature: Bytes,

    #[n(2)]
    pub chain_code: Bytes,

    #[n(3)]
    pub attributes: Bytes,
}

/// A Plutus script's raw bytes, tagged at the type level by its language version.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, PartialEq, Eq, Ord, PartialOrd, Clone)]
#[cbor(transparent)]
pub struct PlutusScript<const VERSION: usize>(#[n(0)] pub Bytes);

impl<const VERSION: usize> AsRef<[u8]> for PlutusScript<VERSION> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A multisig script, recursively combining key and sub-script conditions.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum NativeScript {
    ScriptPubkey(AddrKeyhash),
    ScriptAll(Vec<NativeScript>),
    ScriptAny(Vec<NativeScript>),
    ScriptNOfK(u32, Vec<NativeScript>),
    InvalidBefore(u64),
    InvalidHereafter(u64),
}

impl<'b, C> minicbor::decode::Decode<'b, C> for NativeScript {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        d.array()?;
        let variant = d.u32()?;

        match variant {
            0 => Ok(NativeScript::ScriptPubkey(d.decode_with(ctx)?)),
            1 => Ok(NativeScript::ScriptAll(d.decode_with(ctx)?)),
            2 => Ok(NativeScript::ScriptAny(d.decode_with(ctx)?)),
            3 => Ok(NativeScript::ScriptNOfK(
                d.decode_with(ctx)?,
                d.decode_with(ctx)?,
            )),
            4 => Ok(NativeScript::InvalidBefore(d.decode_with(ctx)?)),
            5 => Ok(NativeScript::InvalidHereafter(d.decode_with(ctx)?)),
            _ => Err(minicbor::decode::Error::message(
                "unknown variant id for native script",
            )),
        }
    }
}

impl<C> minicbor::encode::Encode<C> for NativeScript {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(2)?;

        match self {
            NativeScript::ScriptPubkey(v) => {
                e.encode_with(0, ctx)?;
                e.encode_with(v, ctx)?;
            }
            NativeScript::ScriptAll(v) => {
                e.encode_with(1, ctx)?;
                e.encode_with(v, ctx)?;
            }
            NativeScript::ScriptAny(v) => {
                e.encode_with(2, ctx)?;
                e.encode_with(v, ctx)?;
            }
            NativeScript::ScriptNOfK(a, b) => {
                e.encode_with(3, ctx)?;
                e.encode_with(a, ctx)?;
                e.encode_with(b, ctx)?;
            }
            NativeScript::InvalidBefore(v) => {
                e.encode_with(4, ctx)?;
                e.encode_with(v, ctx)?;
            }
            NativeScript::InvalidHereafter(v) => {
                e.encode_with(5, ctx)?;
                e.encode_with(v, ctx)?;
            }
        }

        Ok(())
    }
}

#[derive(
    Serialize, Deserialize, Encode, Decode, Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord,
)]
#[cbor(index_only)]
pub enum RedeemerTag {
    #[n(0)]
    Spend,
    #[n(1)]
    Mint,
    #[n(2)]
    Cert,
    #[n(3)]
    Reward,
    #[n(4)]
    Vote,
    #[n(5)]
    Propose,
}

/// One redeemer: the script purpose it justifies, the input/mint/etc. index
/// it applies to, the Plutus `Data` argument, and its execution budget.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, PartialEq, Clone)]
pub struct Redeemer {
    #[n(0)]
    pub tag: RedeemerTag,

    #[n(1)]
    pub index: u32,

    #[n(2)]
    pub data: PlutusData,

    #[n(3)]
    pub ex_units: ExUnits,
}

#[derive(Serialize, Deserialize, Encode, Decode, Debug, PartialEq, Eq, Clone, PartialOrd, Ord)]
pub struct RedeemersKey {
    #[n(0)]
    pub tag: RedeemerTag,
    #[n(1)]
    pub index: u32,
}

#[derive(Serialize, Deserialize, Encode, Decode, Debug, PartialEq, Clone)]
pub struct RedeemersValue {
    #[n(0)]
    pub data: PlutusData,
    #[n(1)]
    pub ex_units: ExUnits,
}

/// Redeemers appear either as a flat list (legacy) or as a map keyed by
/// purpose/index (Conway onward); both wire forms decode to this type.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Redeemers {
    List(Vec<Redeemer>),
    Map(BTreeMap<RedeemersKey, RedeemersValue>),
}

codec_by_datatype! {
    Redeemers,
    Array | ArrayIndef => List,
    Map | MapIndef => Map,
    ()
}

impl From<BTreeMap<RedeemersKey, RedeemersValue>> for Redeemers {
    fn from(value: BTreeMap<RedeemersKey, RedeemersValue>) -> Self {
        Redeemers::Map(value)
    }
}

/// All witnesses attached to a transaction, by kind. Every field is optional
/// since a transaction need only carry the witnesses its inputs/scripts require.
///
/// Only `Serialize` derives, not `Deserialize`: the `KeepRaw` fields preserve
/// CBOR bytes that a JSON representation has no way to reconstruct.
#[derive(Serialize, Encode, Decode, Debug, PartialEq, Clone)]
#[cbor(map)]
pub struct TransactionWitnessSet<'b> {
    #[n(0)]
    pub vkeywitness: Option<NonEmptySet<VKeyWitness>>,

    #[n(1)]
    pub native_script: Option<NonEmptySet<KeepRaw<'b, NativeScript>>>,

    #[n(2)]
    pub bootstrap_witness: Option<NonEmptySet<BootstrapWitness>>,

    #[n(3)]
    pub plutus_v1_script: Option<NonEmptySet<PlutusScript<1>>>,

    #[b(4)]
    pub plutus_data: Option<KeepRaw<'b, NonEmptySet<KeepRaw<'b, PlutusData>>>>,

    #[n(5)]
    pub redeemer: Option<KeepRaw<'b, Redeemers>>,

    #[n(6)]
    pub plutus_v2_script: Option<NonEmptySet<PlutusScript<2>>>,

    #[n(7)]
    pub plutus_v3_script: Option<NonEmptySet<PlutusScript<3>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardano_cbor::minicbor::data::Tag;

    #[test]
    fn vkey_witness_set_accepts_tag_258_and_bare_array() {
        let witness = VKeyWitness {
            vkey: Bytes::from(vec![1u8; 32]),
            signature: Bytes::from(vec![2u8; 64]),
        };

        let mut bare = Vec::new();
        minicbor::encode(vec![witness.clone()], &mut bare).unwrap();
        let decoded: NonEmptySet<VKeyWitness> = minicbor::decode(&bare).unwrap();
        assert_eq!(decoded.clone().to_vec(), vec![witness.clone()]);

        let mut tagged = Vec::new();
        {
            let mut e = minicbor::Encoder::new(&mut tagged);
            e.tag(Tag::new(258)).unwrap();
            e.encode(vec![witness.clone()]).unwrap();
        }
        let decoded: NonEmptySet<VKeyWitness> = minicbor::decode(&tagged).unwrap();
        assert_eq!(decoded.to_vec(), vec![witness]);
    }

    #[test]
    fn witness_set_with_one_vkey_witness_decodes_and_reencodes_identically() {
        let hex_str = "A100D90102818241004100";
        let bytes = hex::decode(hex_str).unwrap();

        let witness_set: TransactionWitnessSet = minicbor::decode(&bytes).unwrap();
        let vkeywitness = witness_set.vkeywitness.as_ref().unwrap();
        let witnesses = vkeywitness.clone().to_vec();
        assert_eq!(witnesses.len(), 1);
        assert_eq!(witnesses[0].vkey.to_vec(), vec![0x00]);
        assert_eq!(witnesses[0].signature.to_vec(), vec![0x00]);
        assert!(witness_set.native_script.is_none());
        assert!(witness_set.redeemer.is_none());

        let re_encoded = minicbor::to_vec(&witness_set).unwrap();
        assert_eq!(hex::encode_upper(re_encoded), hex_str);
    }

    #[test]
    fn redeemers_accept_both_list_and_map_forms() {
        let list = Redeemers::List(vec![Redeemer {
            tag: RedeemerTag::Spend,
            index: 0,
            data: PlutusData::List(vec![]),
            ex_units: ExUnits { mem: 100, steps: 200 },
        }]);
        let bytes = minicbor::to_vec(&list).unwrap();
        let back: Redeemers = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, list);

        let mut map = BTreeMap::new();
        map.insert(
            RedeemersKey { tag: RedeemerTag::Mint, index: 1 },
            RedeemersValue { data: PlutusData::List(vec![]), ex_units: ExUnits { mem: 1, steps: 1 } },
        );
        let map_form = Redeemers::Map(map);
        let bytes = minicbor::to_vec(&map_form).unwrap();
        let back: Redeemers = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, map_form);
    }
}
