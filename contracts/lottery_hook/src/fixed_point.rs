use crate::errors::{Error, Result};

/// 18-decimal fixed-point unit. A fraction of `ONE` is 100%.
pub const ONE: u128 = 1_000_000_000_000_000_000;

/// `a * b / ONE`, rounded down.
///
/// `a` is split into whole and fractional units so the intermediate product
/// stays inside `u128` for any `b <= ONE`:
///
/// ```text
///   a = q·ONE + r
///   a·b / ONE = q·b + ⌊r·b / ONE⌋
/// ```
pub fn mul_down(a: u128, b: u128) -> Result<u128> {
    let whole = (a / ONE).checked_mul(b).ok_or(Error::MathOverflow)?;
    let part = (a % ONE).checked_mul(b).ok_or(Error::MathOverflow)? / ONE;
    whole.checked_add(part).ok_or(Error::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TENTH: u128 = ONE / 10;
    const HALF: u128 = ONE / 2;

    #[test]
    fn mul_down_exact_fraction() {
        assert_eq!(mul_down(19 * ONE, TENTH), Ok(19 * ONE / 10));
        assert_eq!(mul_down(1_000, HALF), Ok(500));
    }

    #[test]
    fn mul_down_rounds_toward_zero() {
        // 19 × 0.1 = 1.9 → 1
        assert_eq!(mul_down(19, TENTH), Ok(1));
        // 3 × 0.5 = 1.5 → 1
        assert_eq!(mul_down(3, HALF), Ok(1));
        assert_eq!(mul_down(1, TENTH), Ok(0));
    }

    #[test]
    fn mul_down_identity_and_zero() {
        assert_eq!(mul_down(123_456_789, ONE), Ok(123_456_789));
        assert_eq!(mul_down(123_456_789, 0), Ok(0));
        assert_eq!(mul_down(0, TENTH), Ok(0));
    }

    #[test]
    fn mul_down_large_amount_does_not_overflow() {
        // Far above what a naive a * b in u128 could hold.
        let a = u128::MAX;
        let expected_whole = (a / ONE) * (ONE / 4);
        let expected_part = (a % ONE) * (ONE / 4) / ONE;
        assert_eq!(mul_down(a, ONE / 4), Ok(expected_whole + expected_part));
        assert_eq!(mul_down(a, ONE), Ok(a));
    }

    #[test]
    fn mul_down_overflow_reported() {
        assert_eq!(mul_down(u128::MAX, 2 * ONE), Err(Error::MathOverflow));
    }
}
