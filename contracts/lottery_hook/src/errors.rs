/// Failures raised by the hook. Every variant aborts the swap that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum Error {
    /// Link id is unknown, carries a zero fee, or has no referrer.
    InvalidReferralLink,
    /// Settlement not invoked by the vault through the trusted router, or a
    /// link mutation by someone other than its referrer.
    UnauthorizedCaller,
    /// Referrer is the null account.
    ZeroAddressReferrer,
    /// A vault, router, or token call failed. The payload is not inspected.
    HostTransferFailure,
    /// A fee or share fraction above `ONE`.
    FractionOutOfRange,
    /// Arithmetic overflow.
    MathOverflow,
    /// Settlement entered while another settlement is in progress.
    ReentrantCall,
    /// Caller is not the contract owner.
    NotOwner,
}

pub type Result<T> = core::result::Result<T, Error>;
