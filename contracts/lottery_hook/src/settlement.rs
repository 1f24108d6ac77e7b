//! Per-swap fee, draw, and payout.
//!
//! ```text
//!   Start ──► FeeComputed ──► Drawn ──┬──► Paid ────┬──► Done
//!                                     └──► Accrued ─┘
//! ```
//!
//! Everything that can fail for reasons other than the host happens before
//! the first token movement. Host failures propagate as-is and leave the
//! ledger and draw counter untouched.

use ink::prelude::vec::Vec;
use ink::primitives::AccountId;

use crate::draw::{Draw, DrawEntropy, DrawState, OutcomeSource};
use crate::errors::{Error, Result};
use crate::fixed_point::mul_down;
use crate::host::HostExchange;
use crate::ledger::AccruedFeeLedger;
use crate::referral::{LinkId, ReferralLink};
use crate::Balance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum SwapKind {
    /// `amount_given` is the input; the vault computed the output.
    ExactIn,
    /// `amount_given` is the output; the vault computed the input.
    ExactOut,
}

/// Swap data handed to the hook by the vault after it computed amounts.
#[derive(Debug, Clone, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub struct AfterSwapParams {
    pub kind: SwapKind,
    pub pool: AccountId,
    /// Router the swap entered the vault through.
    pub router: AccountId,
    pub token_in: AccountId,
    pub token_out: AccountId,
    pub amount_given: Balance,
    pub amount_calculated: Balance,
    pub limit: Balance,
    /// Carries the encoded `LinkId`.
    pub user_data: Vec<u8>,
}

/// Resolved view of one swap. `router` invoked the vault; `sender` is the
/// account the router acted for and the one a winning draw pays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapContext {
    pub kind: SwapKind,
    pub pool: AccountId,
    pub router: AccountId,
    pub sender: AccountId,
    pub token_in: AccountId,
    pub token_out: AccountId,
    pub amount_given: Balance,
    pub amount_calculated: Balance,
    pub limit: Balance,
    pub link_id: LinkId,
    pub link: ReferralLink,
}

impl SwapContext {
    pub fn from_params(
        params: AfterSwapParams,
        sender: AccountId,
        link_id: LinkId,
        link: ReferralLink,
    ) -> Self {
        Self {
            kind: params.kind,
            pool: params.pool,
            router: params.router,
            sender,
            token_in: params.token_in,
            token_out: params.token_out,
            amount_given: params.amount_given,
            amount_calculated: params.amount_calculated,
            limit: params.limit,
            link_id,
            link,
        }
    }

    /// Token the hook fee is charged in: the computed side of the swap.
    pub fn fee_token(&self) -> AccountId {
        match self.kind {
            SwapKind::ExactIn => self.token_out,
            SwapKind::ExactOut => self.token_in,
        }
    }
}

/// One token paid out of the pot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub token: AccountId,
    pub balance: Balance,
    pub winner_amount: Balance,
    pub referrer_amount: Balance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The pot went to the swap sender and the referrer. Only tokens with a
    /// nonzero custody balance are listed.
    Paid(Vec<Payout>),
    /// `fee` of `token` was pulled into custody.
    Accrued { token: AccountId, fee: Balance },
}

/// Receipt of one settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub draw: Draw,
    /// Fee the link charges on this swap.
    pub hook_fee: Balance,
    /// Fee actually charged: `hook_fee`, or zero on a win.
    pub fee_paid: Balance,
    /// Amount handed back to the vault in place of `amount_calculated`.
    pub adjusted_amount: Balance,
    pub outcome: Outcome,
}

/// Amount the vault settles with once `fee` is charged on the computed side.
///
/// Exact-in swaps hand out `fee` less; exact-out swaps take `fee` more.
pub fn adjust_amount(kind: SwapKind, amount_calculated: Balance, fee: Balance) -> Result<Balance> {
    match kind {
        SwapKind::ExactIn => amount_calculated.checked_sub(fee),
        SwapKind::ExactOut => amount_calculated.checked_add(fee),
    }
    .ok_or(Error::MathOverflow)
}

/// Splits a pot balance into `(winner_amount, referrer_amount)`.
pub fn split_pot(balance: Balance, referrer_share: u128) -> Result<(Balance, Balance)> {
    let referrer_amount = mul_down(balance, referrer_share)?;
    let winner_amount = balance.checked_sub(referrer_amount).ok_or(Error::MathOverflow)?;
    Ok((winner_amount, referrer_amount))
}

/// Runs one settlement against `host`.
///
/// Draws exactly once. On a win every ledger token's custody balance is
/// paid out and this swap is charged nothing; otherwise the fee is pulled
/// into custody and the fee token marked.
///
/// `ledger` and `draw_state` are only written once every host call has
/// succeeded. An `Err` leaves both as they were.
pub fn settle<H, S>(
    host: &mut H,
    source: &S,
    ledger: &mut AccruedFeeLedger,
    draw_state: &mut DrawState,
    entropy: &DrawEntropy,
    ctx: &SwapContext,
) -> Result<Settlement>
where
    H: HostExchange + ?Sized,
    S: OutcomeSource + ?Sized,
{
    let hook_fee = mul_down(ctx.amount_calculated, ctx.link.fee_fraction)?;
    let accrued_amount = adjust_amount(ctx.kind, ctx.amount_calculated, hook_fee)?;

    let mut next_state = *draw_state;
    let draw = next_state.draw(source, entropy);

    if draw.won {
        let payouts = pay_out_pot(host, ledger.tokens(), ctx)?;
        ledger.drain_all();
        *draw_state = next_state;
        return Ok(Settlement {
            draw,
            hook_fee,
            fee_paid: 0,
            adjusted_amount: ctx.amount_calculated,
            outcome: Outcome::Paid(payouts),
        });
    }

    let token = ctx.fee_token();
    if hook_fee > 0 {
        host.pull_into_custody(token, hook_fee)?;
    }
    ledger.mark_accrued(token);
    *draw_state = next_state;

    Ok(Settlement {
        draw,
        hook_fee,
        fee_paid: hook_fee,
        adjusted_amount: accrued_amount,
        outcome: Outcome::Accrued { token, fee: hook_fee },
    })
}

/// Splits every pot token, then transfers. The caller drains the ledger.
fn pay_out_pot<H>(host: &mut H, tokens: &[AccountId], ctx: &SwapContext) -> Result<Vec<Payout>>
where
    H: HostExchange + ?Sized,
{
    let mut payouts = Vec::new();
    for &token in tokens {
        let balance = host.custody_balance_of(token)?;
        if balance == 0 {
            continue;
        }
        let (winner_amount, referrer_amount) = split_pot(balance, ctx.link.referrer_share)?;
        payouts.push(Payout { token, balance, winner_amount, referrer_amount });
    }

    for payout in &payouts {
        if payout.winner_amount > 0 {
            host.transfer_from_custody(payout.token, ctx.sender, payout.winner_amount)?;
        }
        if payout.referrer_amount > 0 {
            host.transfer_from_custody(payout.token, ctx.link.referrer, payout.referrer_amount)?;
        }
    }

    Ok(payouts)
}
