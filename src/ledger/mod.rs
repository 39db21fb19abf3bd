//! Savings accounts ledger.
//!
//! Account: the current balance, mutated only by the engine.
//! Transaction: the append-only record written alongside every balance change.
//! Interest: linear monthly interest accrued between the anchoring deposit and a withdrawal.

pub mod account;
pub mod engine;
pub mod error;
pub mod interest;
pub mod lock;
pub mod memory;
pub mod store;
pub mod transaction;

// Named types don't provide any compiler help, but they help a lot with
// readability: HashMap<AccountId, Account> is self-explanatory where
// HashMap<u32, Account> is not.
pub type AccountId = u32;
pub type CustomerId = u32;
pub type DepositTypeId = u32;
pub type TransactionId = u64;

// A decimal library instead of f64, so that cents never drift when
// interest is computed over and over.
pub type Amount = rust_decimal::Decimal;

/// A yearly rate, in percent (e.g. `12` for 12%).
pub type Rate = rust_decimal::Decimal;

/// Currency precision: every stored amount has at most 2 decimal places.
pub const CURRENCY_PRECISION: u32 = 2;

/// Precision used when reporting the monthly rate.
pub const RATE_PRECISION: u32 = 6;

/// Round an amount to currency precision, half away from zero, and give it
/// exactly that many decimal places (`5` becomes `5.00`).
///
/// `Decimal::round_dp` rounds half to even, which would turn 0.125 into 0.12.
pub fn round_currency(amount: Amount) -> Amount {
    let mut rounded = amount.round_dp_with_strategy(
        CURRENCY_PRECISION,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    );
    rounded.rescale(CURRENCY_PRECISION);
    rounded
}

pub use engine::{DepositReceipt, EngineConfig, Ledger, Receipt, WithdrawalReceipt};
pub use error::{LedgerError, StoreError};
pub use memory::InMemoryStore;
pub use store::LedgerStore;

#[test]
fn test_round_currency() {
    use rust_decimal_macros::dec;

    for (raw, want) in vec![
        (dec!(1.0), dec!(1.00)),
        (dec!(0.125), dec!(0.13)),
        (dec!(0.135), dec!(0.14)),
        (dec!(0.004), dec!(0.00)),
        (dec!(1060.005), dec!(1060.01)),
        (dec!(-0.125), dec!(-0.13)),
    ] {
        assert_eq!(want, round_currency(raw));
    }

    assert_eq!("5.00", round_currency(dec!(5)).to_string());
    assert_eq!("0.00", round_currency(dec!(0)).to_string());
}
