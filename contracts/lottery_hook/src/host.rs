use ink::env::call::{build_call, ExecutionInput, Selector};
use ink::env::DefaultEnvironment;
use ink::prelude::vec::Vec;
use ink::primitives::AccountId;

use crate::errors::{Error, Result};
use crate::Balance;

/// What the hook needs from the exchange it is registered with.
///
/// Every failure surfaces as `Error::HostTransferFailure` and fails the
/// swap being settled. Nothing is retried.
pub trait HostExchange {
    /// Amount of `token` held in hook custody.
    fn custody_balance_of(&self, token: AccountId) -> Result<Balance>;

    /// Moves `amount` of `token` from the vault into hook custody.
    fn pull_into_custody(&mut self, token: AccountId, amount: Balance) -> Result<()>;

    /// Pays `amount` of `token` out of hook custody to `to`.
    fn transfer_from_custody(&mut self, token: AccountId, to: AccountId, amount: Balance) -> Result<()>;

    /// Account that initiated the swap through `router`.
    fn originating_sender(&self, router: AccountId) -> Result<AccountId>;
}

/// Production host: the vault, its router, and PSP22 tokens, reached
/// through cross-contract calls.
pub struct VaultHost {
    vault: AccountId,
    hook: AccountId,
}

/// Error payloads from the vault and tokens are not decoded further.
type RemoteUnit = core::result::Result<(), ()>;

impl VaultHost {
    pub fn new(vault: AccountId, hook: AccountId) -> Self {
        Self { vault, hook }
    }
}

impl HostExchange for VaultHost {
    fn custody_balance_of(&self, token: AccountId) -> Result<Balance> {
        let result = build_call::<DefaultEnvironment>()
            .call(token)
            .exec_input(
                ExecutionInput::new(Selector::new(ink::selector_bytes!("PSP22::balance_of")))
                    .push_arg(self.hook),
            )
            .returns::<Balance>()
            .try_invoke();

        match result {
            Ok(Ok(balance)) => Ok(balance),
            _ => Err(Error::HostTransferFailure),
        }
    }

    fn pull_into_custody(&mut self, token: AccountId, amount: Balance) -> Result<()> {
        let result = build_call::<DefaultEnvironment>()
            .call(self.vault)
            .exec_input(
                ExecutionInput::new(Selector::new(ink::selector_bytes!("send_to")))
                    .push_arg(token)
                    .push_arg(self.hook)
                    .push_arg(amount),
            )
            .returns::<RemoteUnit>()
            .try_invoke();

        match result {
            Ok(Ok(Ok(()))) => Ok(()),
            _ => Err(Error::HostTransferFailure),
        }
    }

    fn transfer_from_custody(&mut self, token: AccountId, to: AccountId, amount: Balance) -> Result<()> {
        let result = build_call::<DefaultEnvironment>()
            .call(token)
            .exec_input(
                ExecutionInput::new(Selector::new(ink::selector_bytes!("PSP22::transfer")))
                    .push_arg(to)
                    .push_arg(amount)
                    .push_arg(Vec::<u8>::new()),
            )
            .returns::<RemoteUnit>()
            .try_invoke();

        match result {
            Ok(Ok(Ok(()))) => Ok(()),
            _ => Err(Error::HostTransferFailure),
        }
    }

    fn originating_sender(&self, router: AccountId) -> Result<AccountId> {
        let result = build_call::<DefaultEnvironment>()
            .call(router)
            .exec_input(ExecutionInput::new(Selector::new(ink::selector_bytes!("get_sender"))))
            .returns::<AccountId>()
            .try_invoke();

        match result {
            Ok(Ok(sender)) => Ok(sender),
            _ => Err(Error::HostTransferFailure),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use ink::prelude::collections::BTreeMap;

    /// In-memory vault: token balances per holder, custody held by `hook`.
    pub struct MemoryHost {
        pub hook: AccountId,
        pub sender: AccountId,
        pub balances: BTreeMap<(AccountId, AccountId), Balance>,
        /// Every `pull_into_custody` call, in order.
        pub pulls: Vec<(AccountId, Balance)>,
        /// Every `transfer_from_custody` call, in order.
        pub transfers: Vec<(AccountId, AccountId, Balance)>,
        pub fail_transfers: bool,
    }

    impl MemoryHost {
        pub fn new(hook: AccountId, sender: AccountId) -> Self {
            Self {
                hook,
                sender,
                balances: BTreeMap::new(),
                pulls: Vec::new(),
                transfers: Vec::new(),
                fail_transfers: false,
            }
        }

        pub fn balance(&self, token: AccountId, holder: AccountId) -> Balance {
            self.balances.get(&(token, holder)).copied().unwrap_or(0)
        }

        pub fn custody(&self, token: AccountId) -> Balance {
            self.balance(token, self.hook)
        }

        /// Credits hook custody without going through a swap.
        pub fn seed_custody(&mut self, token: AccountId, amount: Balance) {
            *self.balances.entry((token, self.hook)).or_insert(0) += amount;
        }

        pub fn token_movements(&self) -> usize {
            self.pulls.len() + self.transfers.len()
        }
    }

    impl HostExchange for MemoryHost {
        fn custody_balance_of(&self, token: AccountId) -> Result<Balance> {
            Ok(self.custody(token))
        }

        fn pull_into_custody(&mut self, token: AccountId, amount: Balance) -> Result<()> {
            if self.fail_transfers {
                return Err(Error::HostTransferFailure);
            }
            self.pulls.push((token, amount));
            self.seed_custody(token, amount);
            Ok(())
        }

        fn transfer_from_custody(&mut self, token: AccountId, to: AccountId, amount: Balance) -> Result<()> {
            let held = self.custody(token);
            if self.fail_transfers || held < amount {
                return Err(Error::HostTransferFailure);
            }
            self.transfers.push((token, to, amount));
            self.balances.insert((token, self.hook), held - amount);
            *self.balances.entry((token, to)).or_insert(0) += amount;
            Ok(())
        }

        fn originating_sender(&self, _router: AccountId) -> Result<AccountId> {
            Ok(self.sender)
        }
    }
}
