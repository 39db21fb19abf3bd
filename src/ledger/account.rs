use super::error::LedgerError;
use super::{round_currency, AccountId, Amount, CustomerId, DepositTypeId, Rate};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A kind of savings product. It fixes the yearly interest rate of the
/// accounts opened with it.
#[derive(Debug, Clone, PartialEq)]
pub struct DepositType {
    pub id: DepositTypeId,
    pub name: String,

    /// Percent, in `(0, 100]`, with 2 decimal places.
    pub yearly_rate: Rate,
}

impl DepositType {
    pub fn new(id: DepositTypeId, name: &str, yearly_rate: Rate) -> Result<Self, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "deposit type name cannot be empty".to_string(),
            ));
        }
        // Rates are stored like amounts, to the hundredth of a percent.
        let rounded = round_currency(yearly_rate);
        if rounded <= Decimal::ZERO || rounded > dec!(100) {
            return Err(LedgerError::Validation(format!(
                "yearly rate must be greater than 0 and at most 100, got {}",
                yearly_rate
            )));
        }

        Ok(Self {
            id,
            name: name.to_string(),
            yearly_rate: rounded,
        })
    }
}

/// A savings account.
///
/// The balance is never negative, and only the engine changes it. `version`
/// is bumped on every commit, which lets the store refuse a commit computed
/// from a stale read.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub customer_id: CustomerId,
    pub deposit_type_id: DepositTypeId,
    pub balance: Amount,
    pub version: u64,
}

impl Account {
    pub fn open(
        id: AccountId,
        customer_id: CustomerId,
        deposit_type_id: DepositTypeId,
        opening_balance: Amount,
    ) -> Result<Self, LedgerError> {
        if opening_balance < Decimal::ZERO {
            return Err(LedgerError::Validation(
                "balance cannot be negative".to_string(),
            ));
        }

        Ok(Self {
            id,
            customer_id,
            deposit_type_id,
            balance: round_currency(opening_balance),
            version: 0,
        })
    }
}

/// What the engine reads about an account: its balance and the current
/// rate of its deposit type.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub balance: Amount,
    pub yearly_rate: Rate,
    pub version: u64,
}

/// The balance write half of a commit.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdate {
    pub account_id: AccountId,

    /// The version the new balance was computed from.
    pub expected_version: u64,
    pub balance: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deposit_type_ok() {
        let got = DepositType::new(1, " Gold ", dec!(12.00)).unwrap();
        assert_eq!("Gold", got.name);
        assert_eq!(dec!(12), got.yearly_rate);

        assert!(DepositType::new(2, "Max", dec!(100)).is_ok());
    }

    #[test]
    fn test_deposit_type_rate_rounded_to_cents() {
        for (rate, want) in vec![
            (dec!(3.125), "3.13"),
            (dec!(3.124), "3.12"),
            (dec!(12), "12.00"),
            (dec!(100.004), "100.00"),
        ] {
            let got = DepositType::new(1, "Gold", rate).unwrap();
            assert_eq!(want, got.yearly_rate.to_string());
        }
    }

    #[test]
    fn test_deposit_type_invalid() {
        for (name, rate) in vec![
            ("", dec!(5)),
            ("   ", dec!(5)),
            ("Zero", dec!(0)),
            ("Negative", dec!(-1)),
            ("Too much", dec!(100.01)),
            ("Rounds to zero", dec!(0.004)),
            ("Rounds above 100", dec!(100.005)),
        ] {
            assert!(
                matches!(
                    DepositType::new(1, name, rate),
                    Err(LedgerError::Validation(_))
                ),
                "{:?} {}",
                name,
                rate
            );
        }
    }

    #[test]
    fn test_open_account() {
        let acc = Account::open(1, 2, 3, dec!(10.005)).unwrap();
        assert_eq!(dec!(10.01), acc.balance);
        assert_eq!(0, acc.version);

        assert_eq!(
            Err(LedgerError::Validation(
                "balance cannot be negative".to_string()
            )),
            Account::open(1, 2, 3, dec!(-1))
        );
    }
}
