use ink::prelude::vec::Vec;
use ink::primitives::AccountId;

/// Tokens that currently hold undistributed fees in hook custody.
///
/// Membership only. The pending amount per token is whatever the hook
/// custodies when the pot is paid out, so fees that arrive out of band are
/// swept along with accrued ones.
#[derive(Debug, Default, Clone, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct AccruedFeeLedger {
    tokens: Vec<AccountId>,
}

impl AccruedFeeLedger {
    /// Inserts `token` once. Returns `true` if it was not tracked yet.
    pub fn mark_accrued(&mut self, token: AccountId) -> bool {
        if self.contains(&token) {
            return false;
        }
        self.tokens.push(token);
        true
    }

    /// Returns every tracked token and leaves the set empty.
    pub fn drain_all(&mut self) -> Vec<AccountId> {
        core::mem::take(&mut self.tokens)
    }

    pub fn contains(&self, token: &AccountId) -> bool {
        self.tokens.contains(token)
    }

    pub fn tokens(&self) -> &[AccountId] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
