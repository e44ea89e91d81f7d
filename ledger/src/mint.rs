//! Multi-asset values: policy/asset-keyed amount maps, and the transaction
//! `Mint`/`Value` fields built from them.

use std::collections::BTreeMap;

use cardano_cbor::codec_by_datatype;
use cardano_cbor::minicbor;
use cardano_cbor::utils::{KeyValuePairs, NonZeroInt, PositiveCoin};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AssetName, Coin, PolicyId};

/// A policy/asset-keyed amount map, generic over the amount type: `Mint`
/// uses signed non-zero deltas, `Value`'s multi-asset bundle uses positive
/// coin amounts. Order-preserving, matching the wire's map-of-maps shape.
pub type Multiasset<A> = KeyValuePairs<PolicyId, KeyValuePairs<AssetName, A>>;

/// A transaction's minting/burning field: positive amounts mint, negative
/// amounts burn, zero is never valid per asset ([`NonZeroInt`]'s invariant).
pub type Mint = Multiasset<NonZeroInt>;

/// A transaction output's value: either pure ADA, or ADA plus a bundle of
/// native tokens.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum Value {
    Coin(Coin),
    Multiasset(Coin, Multiasset<PositiveCoin>),
}

codec_by_datatype! {
    Value,
    U8 | U16 | U32 | U64 => Coin,
    (coin, multi => Multiasset)
}

impl Value {
    /// The ADA component, regardless of whether native tokens are present.
    pub fn coin(&self) -> Coin {
        match self {
            Value::Coin(c) => *c,
            Value::Multiasset(c, _) => *c,
        }
    }
}

/// An [`add`]/[`subtract`] result overflowed `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("mint amount overflowed i64 range")]
pub struct MintOverflow;

/// `a + b`: sums matching policy/asset amounts, dropping any asset whose
/// sum is exactly zero, and dropping any policy left with no assets —
/// preserving [`Mint`]'s non-zero and non-empty-inner-map invariants.
pub fn add(a: &Mint, b: &Mint) -> Result<Mint, MintOverflow> {
    merge(a, b, 1)
}

/// `a - b`, with the same invariant-preserving behavior as [`add`].
pub fn subtract(a: &Mint, b: &Mint) -> Result<Mint, MintOverflow> {
    merge(a, b, -1)
}

fn merge(a: &Mint, b: &Mint, sign: i64) -> Result<Mint, MintOverflow> {
    let mut totals: BTreeMap<PolicyId, BTreeMap<AssetName, i64>> = BTreeMap::new();

    for (policy, assets) in a.clone().to_vec() {
        let by_asset = totals.entry(policy).or_default();
        for (asset, amount) in assets.to_vec() {
            let slot = by_asset.entry(asset).or_insert(0);
            *slot = slot.checked_add(i64::from(amount)).ok_or(MintOverflow)?;
        }
    }

    for (policy, assets) in b.clone().to_vec() {
        let by_asset = totals.entry(policy).or_default();
        for (asset, amount) in assets.to_vec() {
            let slot = by_asset.entry(asset).or_insert(0);
            *slot = slot.checked_add(sign * i64::from(amount)).ok_or(MintOverflow)?;
        }
    }

    let policies = totals
        .into_iter()
        .filter_map(|(policy, by_asset)| {
            let non_zero: Vec<_> = by_asset
                .into_iter()
                .filter(|(_, amount)| *amount != 0)
                .map(|(asset, amount)| {
                    (asset, NonZeroInt::try_from(amount).expect("filtered out zero above"))
                })
                .collect();

            if non_zero.is_empty() {
                None
            } else {
                Some((policy, KeyValuePairs::from(non_zero)))
            }
        })
        .collect::<Vec<_>>();

    Ok(KeyValuePairs::from(policies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::Strategy;

    fn lookup<'a>(mint: &'a Mint, policy: &PolicyId, asset: &AssetName) -> Option<&'a NonZeroInt> {
        mint.iter()
            .find(|(p, _)| p == policy)
            .and_then(|(_, by_asset)| by_asset.iter().find(|(a, _)| a == asset))
            .map(|(_, amount)| amount)
    }

    #[test]
    fn coin_only_value_roundtrips() {
        let v = Value::Coin(1_000_000);
        let bytes = minicbor::to_vec(&v).unwrap();
        let back: Value = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, v);
        assert_eq!(back.coin(), 1_000_000);
    }

    #[test]
    fn multiasset_value_roundtrips() {
        let by_name = vec![(AssetName::from(vec![0x41, 0x42]), PositiveCoin::try_from(5u64).unwrap())];
        let assets = vec![(PolicyId::from([1u8; 28]), KeyValuePairs::from(by_name))];

        let v = Value::Multiasset(2_000_000, KeyValuePairs::from(assets));
        let bytes = minicbor::to_vec(&v).unwrap();
        let back: Value = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn single_policy_single_asset_mint_decodes_and_reencodes_identically() {
        let policy_hex = "00".repeat(28);
        let hex_str = format!("A1581C{policy_hex}A1416101");
        let bytes = hex::decode(&hex_str).unwrap();

        let mint: Mint = minicbor::decode(&bytes).unwrap();
        let policy = PolicyId::from([0u8; 28]);
        let amount = lookup(&mint, &policy, &AssetName::from(vec![0x61])).unwrap();
        assert_eq!(i64::from(amount), 1);

        let re_encoded = minicbor::to_vec(&mint).unwrap();
        assert_eq!(hex::encode_upper(re_encoded), hex_str);
    }

    #[test]
    fn non_zero_int_rejects_zero() {
        assert_eq!(NonZeroInt::try_from(0i64), Err(0));
    }

    #[test]
    fn positive_coin_rejects_zero() {
        assert_eq!(PositiveCoin::try_from(0u64), Err(0));
    }

    fn mint_of(entries: Vec<(PolicyId, Vec<(AssetName, i64)>)>) -> Mint {
        let policies = entries
            .into_iter()
            .map(|(policy, assets)| {
                let by_asset = assets
                    .into_iter()
                    .map(|(asset, amount)| (asset, NonZeroInt::try_from(amount).unwrap()))
                    .collect::<Vec<_>>();
                (policy, KeyValuePairs::from(by_asset))
            })
            .collect::<Vec<_>>();
        KeyValuePairs::from(policies)
    }

    #[test]
    fn add_sums_amounts_across_two_policies() {
        let policy_a = PolicyId::from([1u8; 28]);
        let policy_b = PolicyId::from([2u8; 28]);
        let asset = AssetName::from(vec![0x61]);

        let a = mint_of(vec![(policy_a, vec![(asset.clone(), 3)])]);
        let b = mint_of(vec![(policy_a, vec![(asset.clone(), 4)]), (policy_b, vec![(asset.clone(), 1)])]);

        let sum = add(&a, &b).unwrap();
        assert_eq!(i64::from(lookup(&sum, &policy_a, &asset).unwrap()), 7);
        assert_eq!(i64::from(lookup(&sum, &policy_b, &asset).unwrap()), 1);
    }

    #[test]
    fn subtract_removes_asset_and_policy_when_the_result_is_zero() {
        let policy = PolicyId::from([3u8; 28]);
        let asset = AssetName::from(vec![0x61]);

        let a = mint_of(vec![(policy, vec![(asset.clone(), 5)])]);
        let b = mint_of(vec![(policy, vec![(asset.clone(), 5)])]);

        let diff = subtract(&a, &b).unwrap();
        assert!(lookup(&diff, &policy, &asset).is_none());
        assert!(diff.to_vec().is_empty(), "policy with no remaining assets must be dropped entirely");
    }

    #[test]
    fn subtract_keeps_other_assets_when_only_one_asset_of_a_policy_cancels() {
        let policy = PolicyId::from([4u8; 28]);
        let cancels = AssetName::from(vec![0x61]);
        let survives = AssetName::from(vec![0x62]);

        let a = mint_of(vec![(policy, vec![(cancels.clone(), 5), (survives.clone(), 2)])]);
        let b = mint_of(vec![(policy, vec![(cancels.clone(), 5)])]);

        let diff = subtract(&a, &b).unwrap();
        assert!(lookup(&diff, &policy, &cancels).is_none());
        assert_eq!(i64::from(lookup(&diff, &policy, &survives).unwrap()), 2);
    }

    #[test]
    fn add_fails_on_i64_overflow() {
        let policy = PolicyId::from([5u8; 28]);
        let asset = AssetName::from(vec![0x61]);

        let a = mint_of(vec![(policy, vec![(asset.clone(), i64::MAX)])]);
        let b = mint_of(vec![(policy, vec![(asset.clone(), 1)])]);

        assert_eq!(add(&a, &b), Err(MintOverflow));
    }

    proptest::proptest! {
        #[test]
        fn subtract_undoes_add(amounts in proptest::collection::vec(
            (-1_000_000i64..=1_000_000i64).prop_filter("nonzero", |n| *n != 0),
            1..8,
        )) {
            let policy = PolicyId::from([7u8; 28]);
            let a = mint_of(vec![(policy, amounts.iter().enumerate()
                .map(|(i, n)| (AssetName::from(vec![i as u8]), *n))
                .collect())]);

            let sum = add(&a, &a).unwrap();
            let back = subtract(&sum, &a).unwrap();
            proptest::prop_assert_eq!(back.to_vec(), a.to_vec());
        }
    }
}
