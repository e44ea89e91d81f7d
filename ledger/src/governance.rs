//! Conway-era on-chain governance: votes cast against a governance action,
//! and the identity of the voter casting them.

use std::collections::BTreeMap;

use cardano_cbor::minicbor::{self, Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::{AddrKeyhash, Hash, ScriptHash};

#[derive(Encode, Decode, Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[cbor(index_only)]
pub enum Vote {
    #[n(0)]
    No,
    #[n(1)]
    Yes,
    #[n(2)]
    Abstain,
}

/// One voter's recorded position on one governance action.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct VotingProcedure {
    #[n(0)]
    pub vote: Vote,
    #[n(1)]
    pub anchor: Option<Anchor>,
}

/// All votes cast in a transaction, keyed by voter then by the action voted on.
pub type VotingProcedures = BTreeMap<Voter, BTreeMap<GovActionId, VotingProcedure>>;

/// The constitutional committee, DRep, or stake pool casting a vote.
#[derive(
    Encode, Decode, Serialize, Deserialize, Debug, PartialEq, PartialOrd, Eq, Ord, Clone,
)]
#[cbor(flat)]
pub enum Voter {
    #[n(1)]
    ConstitutionalCommitteeScript(#[n(0)] ScriptHash),
    #[n(0)]
    ConstitutionalCommitteeKey(#[n(0)] AddrKeyhash),
    #[n(3)]
    DRepScript(#[n(0)] ScriptHash),
    #[n(2)]
    DRepKey(#[n(0)] AddrKeyhash),
    #[n(4)]
    StakePoolKey(#[n(0)] AddrKeyhash),
}

/// A delegation representative: a credential, or one of the two reserved
/// "always" sentinels used in delegation certificates.
///
/// The sentinel variants cannot identify a voter; converting one into a
/// [`Voter`] fails rather than silently picking a credential.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DRep {
    KeyHash(AddrKeyhash),
    ScriptHash(ScriptHash),
    AlwaysAbstain,
    AlwaysNoConfidence,
}

/// [`DRep`] has no voting identity to carry, so it cannot become a [`Voter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotAVoter;

impl TryFrom<DRep> for Voter {
    type Error = NotAVoter;

    fn try_from(drep: DRep) -> Result<Self, Self::Error> {
        match drep {
            DRep::KeyHash(h) => Ok(Voter::DRepKey(h)),
            DRep::ScriptHash(h) => Ok(Voter::DRepScript(h)),
            DRep::AlwaysAbstain | DRep::AlwaysNoConfidence => Err(NotAVoter),
        }
    }
}

/// A pointer to supporting off-chain rationale: a URL plus the hash of its content.
#[derive(
    Encode, Decode, Serialize, Deserialize, Debug, PartialEq, PartialOrd, Eq, Ord, Clone,
)]
pub struct Anchor {
    #[n(0)]
    pub url: String,
    #[n(1)]
    pub content_hash: Hash<32>,
}

/// Identifies a governance action: the transaction that proposed it, and
/// that transaction's index among any it proposed.
#[derive(
    Encode, Decode, Serialize, Deserialize, Debug, PartialEq, Eq, Clone, PartialOrd, Ord,
)]
pub struct GovActionId {
    #[n(0)]
    pub transaction_id: Hash<32>,
    #[n(1)]
    pub action_index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardano_cbor::minicbor;

    #[test]
    fn voting_procedures_roundtrip() {
        let mut by_action = BTreeMap::new();
        by_action.insert(
            GovActionId {
                transaction_id: Hash::from([9u8; 32]),
                action_index: 0,
            },
            VotingProcedure {
                vote: Vote::Yes,
                anchor: None,
            },
        );
        let mut procedures = VotingProcedures::new();
        procedures.insert(Voter::DRepKey(AddrKeyhash::from([1u8; 28])), by_action);

        let bytes = minicbor::to_vec(&procedures).unwrap();
        let back: VotingProcedures = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, procedures);
    }

    #[test]
    fn drep_sentinels_cannot_become_voters() {
        assert_eq!(Voter::try_from(DRep::AlwaysAbstain), Err(NotAVoter));
        assert_eq!(Voter::try_from(DRep::AlwaysNoConfidence), Err(NotAVoter));
        assert_eq!(
            Voter::try_from(DRep::KeyHash(AddrKeyhash::from([3u8; 28]))),
            Ok(Voter::DRepKey(AddrKeyhash::from([3u8; 28])))
        );
    }
}

#[cfg(test)]
mod tests_voter {
    use super::Voter;
    use crate::AddrKeyhash;
    use std::cmp::Ordering;
    use test_case::test_case;

    fn fake_hash(prefix: &str) -> AddrKeyhash {
        let null_hash: [u8; 28] = [0; 28];
        let bytes: [u8; 28] = [prefix.as_bytes(), &null_hash].concat()[0..28]
            .try_into()
            .unwrap();
        AddrKeyhash::from(bytes)
    }

    fn cc_script(prefix: &str) -> Voter {
        Voter::ConstitutionalCommitteeScript(fake_hash(prefix))
    }

    fn cc_key(prefix: &str) -> Voter {
        Voter::ConstitutionalCommitteeKey(fake_hash(prefix))
    }

    fn drep_script(prefix: &str) -> Voter {
        Voter::DRepScript(fake_hash(prefix))
    }

    fn drep_key(prefix: &str) -> Voter {
        Voter::DRepKey(fake_hash(prefix))
    }

    fn spo(prefix: &str) -> Voter {
        Voter::StakePoolKey(fake_hash(prefix))
    }

    #[test_case(cc_script("alice"), cc_script("alice") => Ordering::Equal)]
    #[test_case(cc_script("alice"), cc_key("alice") => Ordering::Less)]
    #[test_case(cc_script("alice"), drep_script("alice") => Ordering::Less)]
    #[test_case(cc_script("alice"), drep_key("alice") => Ordering::Less)]
    #[test_case(cc_script("alice"), spo("alice") => Ordering::Less)]
    #[test_case(cc_script("bob"), cc_script("alice") => Ordering::Greater)]
    #[test_case(drep_script("alice"), cc_script("alice") => Ordering::Greater)]
    #[test_case(drep_script("alice"), cc_key("alice") => Ordering::Greater)]
    #[test_case(drep_script("alice"), drep_script("alice") => Ordering::Equal)]
    #[test_case(drep_script("alice"), drep_key("alice") => Ordering::Less)]
    #[test_case(drep_script("alice"), spo("alice") => Ordering::Less)]
    #[test_case(drep_script("bob"), drep_script("alice") => Ordering::Greater)]
    fn voter_ordering(left: Voter, right: Voter) -> Ordering {
        left.cmp(&right)
    }
}
