//! [`Patch`] of a [`Contract`].

use common::Currency;
use rust_decimal::Decimal;

use crate::domain::{index, Note};

use super::{
    Contract, Deposit, EndDate, Frequency, Kind, PaymentDate, StartDate,
    Violation,
};

/// Partial update of a [`Contract`].
///
/// Only the [`Some`] fields overwrite the stored values, the [`None`] ones
/// leave them untouched.
#[derive(Clone, Debug, Default)]
pub struct Patch {
    /// New [`Kind`] of the [`Contract`].
    pub kind: Option<Kind>,

    /// New start date of the [`Contract`].
    pub start_date: Option<StartDate>,

    /// New end date of the [`Contract`].
    pub end_date: Option<EndDate>,

    /// New [`Currency`] of the [`Contract`].
    pub currency: Option<Currency>,

    /// New initial rent amount of the [`Contract`].
    pub initial_amount: Option<Decimal>,

    /// New adjustment index of the [`Contract`].
    pub adjustment_index_id: Option<index::Id>,

    /// New adjustment [`Frequency`] of the [`Contract`].
    pub adjustment_frequency: Option<Frequency>,

    /// New last paid amount of the [`Contract`].
    pub last_paid_amount: Option<Decimal>,

    /// New last payment date of the [`Contract`].
    pub last_paid_date: Option<PaymentDate>,

    /// New [`Note`] of the [`Contract`].
    pub note: Option<Note>,

    /// Whether the [`Contract`] has a [`Deposit`].
    pub has_deposit: Option<bool>,

    /// New [`Deposit`] amount.
    pub deposit_amount: Option<Decimal>,

    /// New [`Deposit`] [`Note`].
    pub deposit_note: Option<Note>,
}

impl Patch {
    /// Merges this [`Patch`] onto the provided [`Contract`], returning the
    /// resulting one.
    ///
    /// # Errors
    ///
    /// If the resulting [`Contract`] violates any of its invariants.
    pub fn apply(self, contract: &Contract) -> Result<Contract, Violation> {
        let Self {
            kind,
            start_date,
            end_date,
            currency,
            initial_amount,
            adjustment_index_id,
            adjustment_frequency,
            last_paid_amount,
            last_paid_date,
            note,
            has_deposit,
            deposit_amount,
            deposit_note,
        } = self;

        let mut merged = contract.clone();
        if let Some(kind) = kind {
            merged.kind = kind;
        }
        if let Some(date) = start_date {
            merged.start_date = date;
        }
        if let Some(date) = end_date {
            merged.end_date = date;
        }
        if let Some(currency) = currency {
            merged.initial_amount.currency = currency;
        }
        if let Some(amount) = initial_amount {
            merged.initial_amount.amount = amount;
        }
        if let Some(id) = adjustment_index_id {
            merged.adjustment_index_id = id;
        }
        if let Some(freq) = adjustment_frequency {
            merged.adjustment_frequency = freq;
        }
        if let Some(amount) = last_paid_amount {
            merged.last_paid_amount = Some(amount);
        }
        if let Some(date) = last_paid_date {
            merged.last_paid_date = Some(date);
        }
        if let Some(note) = note {
            merged.note = Some(note);
        }
        merged.deposit = merge_deposit(
            contract.deposit.as_ref(),
            has_deposit,
            deposit_amount,
            deposit_note,
        )?;

        merged.validate()?;
        Ok(merged)
    }
}

/// Merges the [`Deposit`]-related fields of a [`Patch`] onto the `current`
/// [`Deposit`].
fn merge_deposit(
    current: Option<&Deposit>,
    has_deposit: Option<bool>,
    amount: Option<Decimal>,
    note: Option<Note>,
) -> Result<Option<Deposit>, Violation> {
    let has_deposit = has_deposit.unwrap_or(current.is_some());
    let amount = amount.or_else(|| {
        has_deposit.then(|| current.map(|d| d.amount)).flatten()
    });
    let note = note.or_else(|| current.and_then(|d| d.note.clone()));
    Deposit::from_parts(has_deposit, amount, note)
}

#[cfg(test)]
mod spec {
    use common::Currency;
    use rust_decimal::Decimal;

    use crate::domain::{
        contract::{spec::contract, spec::date, Deposit, Violation},
        index, Note,
    };

    use super::{Frequency, Kind, Patch};

    fn note(s: &str) -> Note {
        Note::new(s).unwrap()
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let c = contract("2024-01-01", "2025-01-01");

        assert_eq!(Patch::default().apply(&c).unwrap(), c);
    }

    #[test]
    fn overwrites_only_given_fields() {
        let mut c = contract("2024-01-01", "2025-01-01");
        c.note = Some(note("keys delivered"));
        c.last_paid_amount = Some(Decimal::from(900));

        let patched = Patch {
            end_date: Some(date("2026-01-01").coerce()),
            ..Patch::default()
        }
        .apply(&c)
        .unwrap();

        assert_eq!(patched.end_date, date("2026-01-01").coerce());
        assert_eq!(patched.note, Some(note("keys delivered")));
        assert_eq!(patched.last_paid_amount, Some(Decimal::from(900)));
        assert_eq!(patched.start_date, c.start_date);
        assert_eq!(patched.id, c.id);
        assert_eq!(patched.status, c.status);
    }

    #[test]
    fn merges_every_field() {
        let c = contract("2024-01-01", "2025-01-01");
        let index_id = index::Id::new();

        let patched = Patch {
            kind: Some(Kind::Commercial),
            start_date: Some(date("2024-02-01").coerce()),
            end_date: Some(date("2025-02-01").coerce()),
            currency: Some(Currency::Usd),
            initial_amount: Some(Decimal::from(500)),
            adjustment_index_id: Some(index_id),
            adjustment_frequency: Frequency::new(6),
            last_paid_amount: Some(Decimal::from(450)),
            last_paid_date: Some(date("2024-03-01").coerce()),
            note: Some(note("renewed")),
            has_deposit: Some(true),
            deposit_amount: Some(Decimal::from(1000)),
            deposit_note: Some(note("cash")),
        }
        .apply(&c)
        .unwrap();

        assert_eq!(patched.kind, Kind::Commercial);
        assert_eq!(patched.start_date, date("2024-02-01").coerce());
        assert_eq!(patched.end_date, date("2025-02-01").coerce());
        assert_eq!(patched.currency(), Currency::Usd);
        assert_eq!(patched.initial_amount.amount, Decimal::from(500));
        assert_eq!(patched.adjustment_index_id, index_id);
        assert_eq!(patched.adjustment_frequency, Frequency::new(6).unwrap());
        assert_eq!(patched.last_paid_amount, Some(Decimal::from(450)));
        assert_eq!(
            patched.last_paid_date,
            Some(date("2024-03-01").coerce()),
        );
        assert_eq!(patched.note, Some(note("renewed")));
        assert_eq!(
            patched.deposit,
            Some(Deposit {
                amount: Decimal::from(1000),
                note: Some(note("cash")),
            }),
        );
    }

    #[test]
    fn rejects_inverted_period() {
        let c = contract("2024-01-01", "2025-01-01");

        let res = Patch {
            end_date: Some(date("2023-12-31").coerce()),
            ..Patch::default()
        }
        .apply(&c);

        assert_eq!(res, Err(Violation::InvertedPeriod));
    }

    #[test]
    fn rejects_negative_amount() {
        let c = contract("2024-01-01", "2025-01-01");

        let res = Patch {
            initial_amount: Some(Decimal::from(-1)),
            ..Patch::default()
        }
        .apply(&c);

        assert_eq!(res, Err(Violation::NegativeAmount));
    }

    #[test]
    fn keeps_existing_deposit_amount() {
        let mut c = contract("2024-01-01", "2025-01-01");
        c.deposit = Some(Deposit {
            amount: Decimal::from(700),
            note: None,
        });

        let patched = Patch {
            deposit_note: Some(note("bank transfer")),
            ..Patch::default()
        }
        .apply(&c)
        .unwrap();

        assert_eq!(
            patched.deposit,
            Some(Deposit {
                amount: Decimal::from(700),
                note: Some(note("bank transfer")),
            }),
        );
    }

    #[test]
    fn removes_deposit() {
        let mut c = contract("2024-01-01", "2025-01-01");
        c.deposit = Some(Deposit {
            amount: Decimal::from(700),
            note: None,
        });

        let patched = Patch {
            has_deposit: Some(false),
            ..Patch::default()
        }
        .apply(&c)
        .unwrap();

        assert_eq!(patched.deposit, None);
    }

    #[test]
    fn rejects_inconsistent_deposit() {
        let c = contract("2024-01-01", "2025-01-01");

        let res = Patch {
            has_deposit: Some(true),
            ..Patch::default()
        }
        .apply(&c);
        assert_eq!(res, Err(Violation::DepositAmountMissing));

        let res = Patch {
            deposit_amount: Some(Decimal::from(100)),
            ..Patch::default()
        }
        .apply(&c);
        assert_eq!(res, Err(Violation::DepositAmountUnexpected));

        let res = Patch {
            has_deposit: Some(false),
            deposit_amount: Some(Decimal::from(100)),
            ..Patch::default()
        }
        .apply(&c);
        assert_eq!(res, Err(Violation::DepositAmountUnexpected));
    }
}
