//! Linear (non-compounding) interest over whole calendar months.
//!
//! Everything in here is pure: no I/O, no shared state.

use super::{round_currency, Amount, Rate, RATE_PRECISION};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// The only accepted textual date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum InterestError {
    /// The date is not a calendar date written as `YYYY-MM-DD`.
    #[error("invalid date {0:?}, expected a calendar date formatted as YYYY-MM-DD")]
    InvalidDate(String),

    /// Principal, rate or months are outside of their domain.
    #[error("{0}")]
    InvalidInput(&'static str),
}

/// Result of accruing interest on a principal.
#[derive(Debug, Clone, PartialEq)]
pub struct Accrual {
    pub principal: Amount,
    pub yearly_rate: Rate,

    /// `yearly_rate / 12 / 100`, rounded to [RATE_PRECISION] places.
    /// Reporting only: the interest is computed from the exact rate.
    pub monthly_rate: Rate,
    pub months: i32,
    pub interest_earned: Amount,
    pub ending_balance: Amount,
}

/// Parse a `YYYY-MM-DD` date.
///
/// chrono alone is too lenient here (it accepts `2023-1-5` or `+2023-01-05`),
/// so the shape is checked first: 4 digits, dash, 2 digits, dash, 2 digits.
pub fn parse_date(raw: &str) -> Result<NaiveDate, InterestError> {
    let bytes = raw.as_bytes();
    let well_shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });

    if !well_shaped {
        return Err(InterestError::InvalidDate(raw.to_string()));
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| InterestError::InvalidDate(raw.to_string()))
}

/// Whole calendar months from `start` to `end`; the day of the month is ignored.
///
/// 2023-01-31 to 2023-02-01 is one month, 2023-01-01 to 2023-01-31 is zero.
/// Negative when `end` is in an earlier month than `start`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32)
}

/// Same as [months_between], on raw `YYYY-MM-DD` strings.
pub fn months_between_str(start: &str, end: &str) -> Result<i32, InterestError> {
    Ok(months_between(parse_date(start)?, parse_date(end)?))
}

/// Accrue simple interest: `principal × yearly_rate / 1200 × months`.
///
/// The interest is rounded to currency precision first, and the ending
/// balance is derived from the rounded interest.
pub fn accrue(principal: Amount, yearly_rate: Rate, months: i32) -> Result<Accrual, InterestError> {
    if principal < Decimal::ZERO {
        return Err(InterestError::InvalidInput("principal cannot be negative"));
    }
    if yearly_rate < Decimal::ZERO || yearly_rate > dec!(100) {
        return Err(InterestError::InvalidInput(
            "yearly rate must be between 0 and 100",
        ));
    }
    if months < 0 {
        return Err(InterestError::InvalidInput("months held cannot be negative"));
    }

    // Multiplying before dividing keeps the result exact for every
    // realistic rate; dividing by 12 first would truncate at 28 digits.
    let interest = principal
        .checked_mul(yearly_rate)
        .and_then(|v| v.checked_mul(Decimal::from(months)))
        .and_then(|v| v.checked_div(dec!(1200)))
        .ok_or(InterestError::InvalidInput("interest overflows"))?;
    let interest_earned = round_currency(interest);

    let ending_balance = principal
        .checked_add(interest_earned)
        .map(round_currency)
        .ok_or(InterestError::InvalidInput("interest overflows"))?;

    Ok(Accrual {
        principal,
        yearly_rate,
        monthly_rate: (yearly_rate / dec!(12) / dec!(100)).round_dp(RATE_PRECISION),
        months,
        interest_earned,
        ending_balance,
    })
}

/// Whether `available` covers `requested`, compared at currency precision.
pub fn sufficient_funds(available: Amount, requested: Amount) -> bool {
    round_currency(available) >= round_currency(requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(raw: &str) -> NaiveDate {
        parse_date(raw).unwrap()
    }

    #[test]
    fn test_parse_date_ok() {
        assert_eq!(
            NaiveDate::from_ymd_opt(2023, 1, 10).unwrap(),
            date("2023-01-10")
        );
        assert_eq!(
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            date("2024-02-29")
        );
    }

    #[test]
    fn test_parse_date_invalid() {
        for raw in vec![
            "",
            "2023-1-10",
            "2023-01-1",
            "23-01-10",
            "2023/01/10",
            "2023-01-10T00:00:00",
            " 2023-01-10",
            "abcd-ef-gh",
            "2023-02-30",
            "2023-13-01",
            "2023-00-10",
        ] {
            assert_eq!(
                Err(InterestError::InvalidDate(raw.to_string())),
                parse_date(raw),
                "{:?}",
                raw
            );
        }
    }

    #[test]
    fn test_months_between() {
        for (start, end, want) in vec![
            ("2023-01-10", "2023-07-10", 6),
            ("2023-01-10", "2023-01-31", 0),
            ("2023-01-31", "2023-02-01", 1),
            ("2023-01-10", "2023-07-01", 6),
            ("2022-11-15", "2023-02-15", 3),
            ("2020-01-01", "2023-01-01", 36),
            ("2023-07-10", "2023-01-10", -6),
            ("2023-01-10", "2022-12-31", -1),
        ] {
            assert_eq!(want, months_between(date(start), date(end)), "{} -> {}", start, end);
        }
    }

    #[test]
    fn test_months_between_str_invalid() {
        assert_eq!(
            Err(InterestError::InvalidDate("2023-7-10".to_string())),
            months_between_str("2023-01-10", "2023-7-10")
        );
        assert_eq!(Ok(6), months_between_str("2023-01-10", "2023-07-10"));
    }

    #[test]
    fn test_accrue() {
        let got = accrue(dec!(1000.00), dec!(12.00), 6).unwrap();
        assert_eq!(dec!(60.00), got.interest_earned);
        assert_eq!(dec!(1060.00), got.ending_balance);
        assert_eq!(dec!(0.01), got.monthly_rate);
        assert_eq!(6, got.months);
    }

    #[test]
    fn test_accrue_rounding() {
        for (principal, rate, months, want_interest, want_ending) in vec![
            // 1000 × 5 / 1200 = 4.1666..
            (dec!(1000), dec!(5), 1, dec!(4.17), dec!(1004.17)),
            // 100.50 × 3 × 1 / 1200 = 0.25125
            (dec!(100.50), dec!(3), 1, dec!(0.25), dec!(100.75)),
            // 10 × 1.5 / 1200 = 0.0125, half away from zero
            (dec!(10), dec!(1.5), 1, dec!(0.01), dec!(10.01)),
            // 30 × 1 × 2 / 1200 = 0.05
            (dec!(30), dec!(1), 2, dec!(0.05), dec!(30.05)),
            (dec!(1000), dec!(0), 12, dec!(0), dec!(1000)),
            (dec!(0), dec!(12), 12, dec!(0), dec!(0)),
            (dec!(1000), dec!(12), 0, dec!(0), dec!(1000)),
        ] {
            let got = accrue(principal, rate, months).unwrap();
            assert_eq!(want_interest, got.interest_earned, "{} {} {}", principal, rate, months);
            assert_eq!(want_ending, got.ending_balance, "{} {} {}", principal, rate, months);
        }
    }

    #[test]
    fn test_accrue_monthly_rate_precision() {
        let got = accrue(dec!(1000), dec!(5), 1).unwrap();
        assert_eq!(dec!(0.004167), got.monthly_rate);
    }

    #[test]
    fn test_accrue_invalid_input() {
        for (principal, rate, months) in vec![
            (dec!(-0.01), dec!(12), 1),
            (dec!(100), dec!(-1), 1),
            (dec!(100), dec!(100.01), 1),
            (dec!(100), dec!(12), -1),
        ] {
            assert!(
                matches!(
                    accrue(principal, rate, months),
                    Err(InterestError::InvalidInput(_))
                ),
                "{} {} {}",
                principal,
                rate,
                months
            );
        }
    }

    #[test]
    fn test_sufficient_funds() {
        for (available, requested, want) in vec![
            (dec!(1060.00), dec!(1060.00), true),
            (dec!(1060.00), dec!(1059.99), true),
            (dec!(1060.00), dec!(1060.01), false),
            (dec!(1060.00), dec!(2000), false),
            (dec!(0), dec!(0.01), false),
        ] {
            assert_eq!(want, sufficient_funds(available, requested));
        }
    }
}
