#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub mod draw;
pub mod errors;
pub mod fixed_point;
pub mod host;
pub mod ledger;
pub mod referral;
pub mod settlement;

pub type Balance = u128;

pub mod constants {
    /// Drawn number that wins the pot.
    pub const LUCKY_NUMBER: u8 = 10;
    /// Upper bound of the drawn range `[1, MAX_NUMBER]`. One win in 20 draws.
    pub const MAX_NUMBER: u8 = 20;
    /// Storage key of the settlement-in-progress flag.
    pub const SETTLING_KEY: u32 = 0x6c6f_7474;
}

pub use crate::draw::DrawMode;
pub use crate::errors::{Error, Result};
pub use crate::referral::{LinkId, ReferralLink};
pub use crate::settlement::{AfterSwapParams, SwapKind};
pub use crate::lottery_hook::{HookFlags, LotteryHook};

/// # Lottery Swap Hook
///
/// **Role:** After-swap hook registered with the vault. Every swap tagged
/// with a referral link either pays the link's fee into hook custody or,
/// on a winning draw, walks away with the whole accrued pot.
///
/// ```text
///   trader ──► router ──► vault ──on_after_swap──► LotteryHook
///                           ▲                          │
///                           └──── adjusted amount ─────┘
///
///   draw lost:  fee = amount × link.fee_fraction
///               fee pulled into custody, fee token marked in ledger
///               vault settles amount − fee (exact in) / amount + fee (exact out)
///
///   draw won:   for each ledger token with custody balance B:
///                 referrer ← B × link.referrer_share
///                 trader   ← B − referrer share
///               ledger emptied, this swap pays no fee
/// ```
///
/// The amount moved into custody always equals the difference between the
/// vault's computed amount and the amount handed back, so the vault's own
/// books balance.
///
/// The draw is not secure randomness. It is derived from a call counter and
/// block data, both visible to anyone submitting a swap.
#[ink::contract]
mod lottery_hook {
    use super::*;
    use ink::prelude::vec::Vec;
    use ink::storage::traits::ManualKey;
    use ink::storage::{Lazy, Mapping};

    use crate::constants::SETTLING_KEY;
    use crate::draw::{DrawEntropy, DrawState};
    use crate::host::{HostExchange, VaultHost};
    use crate::ledger::AccruedFeeLedger;
    use crate::referral::{self, decode_link_id, derive_link_id};
    use crate::settlement::{self as engine, Outcome, Settlement, SwapContext};

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct LotteryHook {
        /// Deployer / admin.
        owner: AccountId,
        /// Vault this hook is registered with. Only caller of the hook callbacks.
        vault: AccountId,
        /// Router swaps must enter the vault through.
        trusted_router: AccountId,
        /// Factory whose pools may register this hook.
        allowed_factory: AccountId,

        // ── Referral links ────────────────────────────────────────────────
        links: Mapping<LinkId, ReferralLink>,
        /// Referrer → its current link. Re-creating overwrites the pointer only.
        link_of: Mapping<AccountId, LinkId>,

        // ── Lottery ───────────────────────────────────────────────────────
        /// Only settlement and `accrued_tokens` load it.
        ledger: Lazy<AccruedFeeLedger>,
        draw_state: DrawState,
        draw_mode: DrawMode,

        /// Set for the duration of `on_after_swap`. Lives in its own cell so
        /// the write lands in contract storage before any host call.
        settling: Lazy<bool, ManualKey<SETTLING_KEY>>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct ReferralLinkCreated {
        #[ink(topic)]
        referrer: AccountId,
        #[ink(topic)]
        link_id: Hash,
        fee_fraction: u128,
        referrer_share: u128,
    }

    #[ink(event)]
    pub struct ReferralLinkUpdated {
        #[ink(topic)]
        referrer: AccountId,
        #[ink(topic)]
        link_id: Hash,
        fee_fraction: u128,
        referrer_share: u128,
    }

    #[ink(event)]
    pub struct ReferralLinkRemoved {
        #[ink(topic)]
        referrer: AccountId,
        #[ink(topic)]
        link_id: Hash,
    }

    /// Emitted when a losing draw moves a nonzero fee into custody.
    #[ink(event)]
    pub struct FeeAccrued {
        #[ink(topic)]
        token: AccountId,
        #[ink(topic)]
        link_id: Hash,
        sender: AccountId,
        amount: Balance,
        draw_counter: u64,
    }

    /// Emitted once per pot token on a winning draw.
    #[ink(event)]
    pub struct LotteryWinningsPaid {
        #[ink(topic)]
        winner: AccountId,
        #[ink(topic)]
        token: AccountId,
        amount_won: Balance,
        referrer: AccountId,
        referrer_amount: Balance,
    }

    #[ink(event)]
    pub struct HookRegistered {
        #[ink(topic)]
        factory: AccountId,
        #[ink(topic)]
        pool: AccountId,
    }

    #[ink(event)]
    pub struct TrustedRouterUpdated {
        #[ink(topic)]
        router: AccountId,
    }

    // =========================================================================
    // TYPES
    // =========================================================================

    /// Callbacks the vault should route to this hook.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub struct HookFlags {
        pub enable_hook_adjusted_amounts: bool,
        pub should_call_after_swap: bool,
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl LotteryHook {
        #[ink(constructor)]
        pub fn new(
            vault: AccountId,
            trusted_router: AccountId,
            allowed_factory: AccountId,
            draw_mode: DrawMode,
        ) -> Self {
            Self {
                owner: Self::env().caller(),
                vault,
                trusted_router,
                allowed_factory,
                links: Mapping::default(),
                link_of: Mapping::default(),
                ledger: Lazy::new(),
                draw_state: DrawState::default(),
                draw_mode,
                settling: Lazy::new(),
            }
        }

        // =====================================================================
        // REFERRAL LINKS
        // =====================================================================

        /// Create a link owned by the caller.
        ///
        /// Points the caller at the new link unconditionally. A link created
        /// earlier and not removed keeps resolving under its old id.
        #[ink(message)]
        pub fn create_referral_link(&mut self, fee_fraction: u128, referrer_share: u128) -> Result<LinkId> {
            let referrer = self.env().caller();
            let link = ReferralLink::new(referrer, fee_fraction, referrer_share)?;
            let link_id = derive_link_id(&referrer, self.env().block_timestamp());

            self.links.insert(link_id, &link);
            self.link_of.insert(referrer, &link_id);

            self.env().emit_event(ReferralLinkCreated {
                referrer,
                link_id,
                fee_fraction,
                referrer_share,
            });

            Ok(link_id)
        }

        /// Drop the caller's current link.
        ///
        /// Without a current link nothing changes and the event carries the
        /// zero id.
        #[ink(message)]
        pub fn remove_referral_link(&mut self) {
            let referrer = self.env().caller();
            let link_id = match self.link_of.take(referrer) {
                Some(link_id) => {
                    self.links.remove(link_id);
                    link_id
                }
                None => Hash::default(),
            };

            self.env().emit_event(ReferralLinkRemoved { referrer, link_id });
        }

        /// Change fee and share of the caller's current link in place.
        #[ink(message)]
        pub fn change_referral_fee_percentage(&mut self, fee_fraction: u128, referrer_share: u128) -> Result<()> {
            let referrer = self.env().caller();
            let link_id = self.link_of.get(referrer).ok_or(Error::UnauthorizedCaller)?;
            let mut link = self.links.get(link_id).ok_or(Error::UnauthorizedCaller)?;
            if link.referrer != referrer {
                return Err(Error::UnauthorizedCaller);
            }
            referral::ensure_fractions(fee_fraction, referrer_share)?;

            link.fee_fraction = fee_fraction;
            link.referrer_share = referrer_share;
            self.links.insert(link_id, &link);

            self.env().emit_event(ReferralLinkUpdated {
                referrer,
                link_id,
                fee_fraction,
                referrer_share,
            });

            Ok(())
        }

        #[ink(message)]
        pub fn resolve_referral_link(&self, link_id: LinkId) -> Result<ReferralLink> {
            referral::resolve(self.links.get(link_id))
        }

        #[ink(message)]
        pub fn referral_link(&self, link_id: LinkId) -> Option<ReferralLink> {
            self.links.get(link_id)
        }

        #[ink(message)]
        pub fn referral_link_of(&self, referrer: AccountId) -> Option<LinkId> {
            self.link_of.get(referrer)
        }

        #[ink(message)]
        pub fn referral_fee_of(&self, referrer: AccountId) -> u128 {
            self.current_link(referrer).map_or(0, |link| link.fee_fraction)
        }

        #[ink(message)]
        pub fn referrer_share_of(&self, referrer: AccountId) -> u128 {
            self.current_link(referrer).map_or(0, |link| link.referrer_share)
        }

        fn current_link(&self, referrer: AccountId) -> Option<ReferralLink> {
            self.link_of.get(referrer).and_then(|id| self.links.get(id))
        }

        // =====================================================================
        // VAULT CALLBACKS
        // =====================================================================

        /// Accept registration only for pools from the allowed factory.
        #[ink(message)]
        pub fn on_register(&mut self, factory: AccountId, pool: AccountId) -> Result<bool> {
            self.only_vault()?;
            if factory != self.allowed_factory {
                return Ok(false);
            }
            self.env().emit_event(HookRegistered { factory, pool });
            Ok(true)
        }

        #[ink(message)]
        pub fn hook_flags(&self) -> HookFlags {
            HookFlags {
                enable_hook_adjusted_amounts: true,
                should_call_after_swap: true,
            }
        }

        /// Settle one swap and return the amount the vault should use in
        /// place of `params.amount_calculated`.
        #[ink(message)]
        pub fn on_after_swap(&mut self, params: AfterSwapParams) -> Result<Balance> {
            let mut host = VaultHost::new(self.vault, self.env().account_id());
            self.settle(&mut host, params)
        }

        // =====================================================================
        // VIEW FUNCTIONS
        // =====================================================================

        /// Number the next settlement would draw in the current block.
        #[ink(message)]
        pub fn next_draw_number(&self) -> u8 {
            self.draw_state.preview(&self.draw_mode, &self.entropy())
        }

        #[ink(message)]
        pub fn draw_counter(&self) -> u64 {
            self.draw_state.counter()
        }

        #[ink(message)]
        pub fn accrued_tokens(&self) -> Vec<AccountId> {
            self.ledger.get().unwrap_or_default().tokens().to_vec()
        }

        #[ink(message)]
        pub fn get_draw_mode(&self) -> DrawMode { self.draw_mode }

        #[ink(message)]
        pub fn get_owner(&self) -> AccountId { self.owner }

        #[ink(message)]
        pub fn get_vault(&self) -> AccountId { self.vault }

        #[ink(message)]
        pub fn get_trusted_router(&self) -> AccountId { self.trusted_router }

        // =====================================================================
        // ADMIN
        // =====================================================================

        #[ink(message)]
        pub fn set_trusted_router(&mut self, router: AccountId) -> Result<()> {
            self.only_owner()?;
            self.trusted_router = router;
            self.env().emit_event(TrustedRouterUpdated { router });
            Ok(())
        }

        // =====================================================================
        // INTERNAL: SETTLEMENT
        // =====================================================================

        fn settle<H: HostExchange>(&mut self, host: &mut H, params: AfterSwapParams) -> Result<Balance> {
            self.only_vault()?;
            if params.router != self.trusted_router {
                return Err(Error::UnauthorizedCaller);
            }
            if self.is_settling() {
                return Err(Error::ReentrantCall);
            }

            self.settling.set(&true);
            let result = self.settle_swap(host, params);
            self.settling.set(&false);
            result
        }

        fn is_settling(&self) -> bool {
            self.settling.get().unwrap_or(false)
        }

        fn settle_swap<H: HostExchange>(&mut self, host: &mut H, params: AfterSwapParams) -> Result<Balance> {
            let link_id = decode_link_id(&params.user_data)?;
            let link = referral::resolve(self.links.get(link_id))?;
            let sender = host.originating_sender(params.router)?;
            let ctx = SwapContext::from_params(params, sender, link_id, link);

            let entropy = self.entropy();
            let mut ledger = self.ledger.get().unwrap_or_default();
            let receipt = engine::settle(
                host,
                &self.draw_mode,
                &mut ledger,
                &mut self.draw_state,
                &entropy,
                &ctx,
            )?;
            self.ledger.set(&ledger);

            self.emit_settlement(&ctx, &receipt);
            Ok(receipt.adjusted_amount)
        }

        fn emit_settlement(&self, ctx: &SwapContext, receipt: &Settlement) {
            match &receipt.outcome {
                Outcome::Paid(payouts) => {
                    for payout in payouts {
                        self.env().emit_event(LotteryWinningsPaid {
                            winner: ctx.sender,
                            token: payout.token,
                            amount_won: payout.winner_amount,
                            referrer: ctx.link.referrer,
                            referrer_amount: payout.referrer_amount,
                        });
                    }
                }
                Outcome::Accrued { token, fee } if *fee > 0 => {
                    self.env().emit_event(FeeAccrued {
                        token: *token,
                        link_id: ctx.link_id,
                        sender: ctx.sender,
                        amount: *fee,
                        draw_counter: receipt.draw.counter,
                    });
                }
                Outcome::Accrued { .. } => {}
            }
        }

        fn entropy(&self) -> DrawEntropy {
            DrawEntropy {
                block_number: self.env().block_number(),
                block_timestamp: self.env().block_timestamp(),
            }
        }

        // =====================================================================
        // ACCESS CONTROL
        // =====================================================================

        fn only_vault(&self) -> Result<()> {
            if self.env().caller() != self.vault {
                return Err(Error::UnauthorizedCaller);
            }
            Ok(())
        }

        fn only_owner(&self) -> Result<()> {
            if self.env().caller() != self.owner {
                return Err(Error::NotOwner);
            }
            Ok(())
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
