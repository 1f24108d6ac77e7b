use ink::env::hash::{HashOutput, Keccak256};
use ink::primitives::{AccountId, Hash};

use crate::errors::{Error, Result};
use crate::fixed_point::ONE;

/// Opaque referral link handle carried in swap `user_data`.
pub type LinkId = Hash;

/// Encoded size of a `LinkId` inside `user_data`.
pub const LINK_ID_LEN: usize = 32;

/// The null identity. Never a valid referrer.
pub const ZERO_ACCOUNT: [u8; 32] = [0u8; 32];

/// Fee parameters a referrer attaches to swaps tagged with its link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct ReferralLink {
    pub referrer: AccountId,
    /// Share of the computed swap amount taken as hook fee, 18-decimal.
    pub fee_fraction: u128,
    /// Share of each paid-out pot token routed to the referrer, 18-decimal.
    pub referrer_share: u128,
}

impl ReferralLink {
    pub fn new(referrer: AccountId, fee_fraction: u128, referrer_share: u128) -> Result<Self> {
        ensure_referrer(&referrer)?;
        ensure_fractions(fee_fraction, referrer_share)?;
        Ok(Self { referrer, fee_fraction, referrer_share })
    }

    /// A link with no fee or no referrer does not tag swaps.
    pub fn is_active(&self) -> bool {
        self.fee_fraction != 0 && !is_zero_account(&self.referrer)
    }
}

/// Looks up a link for settlement.
pub fn resolve(link: Option<ReferralLink>) -> Result<ReferralLink> {
    match link {
        Some(link) if link.is_active() => Ok(link),
        _ => Err(Error::InvalidReferralLink),
    }
}

/// `keccak256(referrer ‖ timestamp)`.
///
/// Two links created by the same referrer within one timestamp share an id.
pub fn derive_link_id(referrer: &AccountId, timestamp: u64) -> LinkId {
    let mut digest = <Keccak256 as HashOutput>::Type::default();
    ink::env::hash_encoded::<Keccak256, _>(&(referrer, timestamp), &mut digest);
    Hash::from(digest)
}

/// Reads the link id out of the swap's `user_data`.
pub fn decode_link_id(user_data: &[u8]) -> Result<LinkId> {
    let bytes: [u8; LINK_ID_LEN] = user_data
        .try_into()
        .map_err(|_| Error::InvalidReferralLink)?;
    Ok(Hash::from(bytes))
}

pub fn is_zero_account(account: &AccountId) -> bool {
    *account == AccountId::from(ZERO_ACCOUNT)
}

pub fn ensure_referrer(referrer: &AccountId) -> Result<()> {
    if is_zero_account(referrer) {
        return Err(Error::ZeroAddressReferrer);
    }
    Ok(())
}

pub fn ensure_fractions(fee_fraction: u128, referrer_share: u128) -> Result<()> {
    if fee_fraction > ONE || referrer_share > ONE {
        return Err(Error::FractionOutOfRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::from([1u8; 32])
    }

    #[ink::test]
    fn link_id_depends_on_referrer_and_time() {
        let bob = AccountId::from([2u8; 32]);
        let a = derive_link_id(&alice(), 1_000);
        assert_eq!(a, derive_link_id(&alice(), 1_000));
        assert_ne!(a, derive_link_id(&alice(), 1_001));
        assert_ne!(a, derive_link_id(&bob, 1_000));
    }

    #[ink::test]
    fn link_id_roundtrips_through_user_data() {
        let id = derive_link_id(&alice(), 77);
        let user_data: &[u8] = id.as_ref();
        assert_eq!(decode_link_id(user_data), Ok(id));
    }

    #[ink::test]
    fn malformed_user_data_is_invalid_link() {
        assert_eq!(decode_link_id(&[]), Err(Error::InvalidReferralLink));
        assert_eq!(decode_link_id(&[7u8; 31]), Err(Error::InvalidReferralLink));
        assert_eq!(decode_link_id(&[7u8; 33]), Err(Error::InvalidReferralLink));
    }

    #[ink::test]
    fn new_rejects_null_referrer_and_wide_fractions() {
        assert_eq!(
            ReferralLink::new(AccountId::from(ZERO_ACCOUNT), ONE / 10, ONE / 2),
            Err(Error::ZeroAddressReferrer)
        );
        assert_eq!(
            ReferralLink::new(alice(), ONE + 1, 0),
            Err(Error::FractionOutOfRange)
        );
        assert_eq!(
            ReferralLink::new(alice(), 0, ONE + 1),
            Err(Error::FractionOutOfRange)
        );
        assert!(ReferralLink::new(alice(), ONE, ONE).is_ok());
    }

    #[ink::test]
    fn resolve_requires_fee_and_referrer() {
        let link = ReferralLink::new(alice(), ONE / 10, ONE / 2).unwrap();
        assert_eq!(resolve(Some(link)), Ok(link));
        assert_eq!(resolve(None), Err(Error::InvalidReferralLink));

        let feeless = ReferralLink { fee_fraction: 0, ..link };
        assert_eq!(resolve(Some(feeless)), Err(Error::InvalidReferralLink));

        let orphan = ReferralLink { referrer: AccountId::from(ZERO_ACCOUNT), ..link };
        assert_eq!(resolve(Some(orphan)), Err(Error::InvalidReferralLink));
    }
}
