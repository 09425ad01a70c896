use crate::{
    error::{AmountKind, SplitError},
    model::{MemberId, Money, Share},
};
use indexmap::IndexSet;
use rust_decimal::Decimal;

/// Equal split with the rounding remainder assigned to the first participant.
pub struct SplitAllocator;

impl SplitAllocator {
    /// Splits `amount` across `participants` so that the shares sum exactly to
    /// `amount`.
    ///
    /// Participants are de-duplicated keeping their first position. Each one
    /// receives `round(amount / n)`; the first also receives whatever cent
    /// difference remains.
    ///
    /// # Errors
    /// * [`SplitError::NegativeAmount`] if `amount < 0`
    /// * [`SplitError::EmptyParticipants`] if no participant is given
    pub fn allocate<I>(amount: Money, participants: I) -> Result<Vec<Share>, SplitError>
    where
        I: IntoIterator<Item = MemberId>,
    {
        if amount.is_negative() {
            return Err(SplitError::NegativeAmount {
                kind: AmountKind::Expense,
                amount,
            });
        }

        let participants: IndexSet<MemberId> = participants.into_iter().collect();
        if participants.is_empty() {
            return Err(SplitError::EmptyParticipants { expense_id: None });
        }

        let count = participants.len();
        let (base, remainder) = Self::base_and_remainder(amount, count);

        Ok(participants
            .into_iter()
            .enumerate()
            .map(|(idx, member)| Share {
                member,
                amount: if idx == 0 { base + remainder } else { base },
            })
            .collect())
    }

    fn base_and_remainder(amount: Money, count: usize) -> (Money, Money) {
        let n = Decimal::from(count);
        let base = amount.divide_rounded(count);
        let remainder = (amount - base * n).round_to_cents();
        if !(base + remainder).is_negative() {
            return (base, remainder);
        }

        // Rounding up a few cents over many participants can overshoot the
        // amount by more than the first share; truncating keeps it positive.
        let base = amount.divide_truncated(count);
        (base, amount - base * n)
    }
}
