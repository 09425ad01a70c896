use indexmap::IndexMap;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};
use thiserror::Error;

/// Net balance per member, in first-appearance order.
pub type MemberBalances = IndexMap<MemberId, Money>;

const MONEY_SCALE: u32 = 2;

/// Signed currency amount with two fractional digits.
///
/// Backed by a [`Decimal`] so that sums of cents never drift. Division is the
/// only operation that can produce extra digits; [`Money::divide_rounded`]
/// brings the result back to cents (half away from zero), which is the
/// `round(x * 100) / 100` discipline applied at every allocation step.
///
/// ```
/// use tripsplit_domain::Money;
///
/// let amount: Money = "100".parse().unwrap();
/// assert_eq!(amount.divide_rounded(3).to_string(), "33.33");
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyParseError {
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount {0} has more than two decimal places")]
    TooPrecise(Decimal),
}

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Amounts whose magnitude is at most one cent are treated as zero.
    pub const TOLERANCE: Money = Money(Decimal::from_parts(1, 0, 0, false, MONEY_SCALE));

    pub fn new(num: i64, scale: u32) -> Self {
        Self(Decimal::new(num, scale))
    }

    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, MONEY_SCALE))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// `true` when the amount is within one cent of zero.
    pub fn is_negligible(self) -> bool {
        self.abs() <= Self::TOLERANCE
    }

    /// `true` when both amounts differ by at most one cent.
    pub fn approx_eq(self, other: Money) -> bool {
        (self - other).is_negligible()
    }

    pub fn round_to_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Divides into `parts` and rounds to cents, half away from zero.
    pub fn divide_rounded(self, parts: usize) -> Self {
        debug_assert!(parts > 0);
        Self(self.0 / Decimal::from(parts)).round_to_cents()
    }

    /// Divides into `parts` and truncates toward zero at cent precision.
    pub fn divide_truncated(self, parts: usize) -> Self {
        debug_assert!(parts > 0);
        Self(
            (self.0 / Decimal::from(parts))
                .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero),
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_zero() {
            return f.write_str("0.00");
        }
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| MoneyParseError::Invalid(s.to_string()))?;
        Self::try_from(value)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyParseError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.normalize().scale() > MONEY_SCALE {
            return Err(MoneyParseError::TooPrecise(value));
        }
        Ok(Self(value))
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Opaque member identifier supplied by the ledger.
    MemberId
);
string_id!(ExpenseId);
string_id!(TripId);

/// One paid transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub trip_id: TripId,
    pub amount: Money,
    pub payer_id: MemberId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One participant's stored share of one expense, as persisted by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSplit {
    pub expense_id: ExpenseId,
    pub user_id: MemberId,
    pub amount: Money,
}

/// An authoritative share produced by allocation or reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub member: MemberId,
    pub amount: Money,
}

impl Share {
    pub fn new(member: impl Into<MemberId>, amount: Money) -> Self {
        Self {
            member: member.into(),
            amount,
        }
    }

    pub fn into_split(self, expense_id: &ExpenseId) -> ExpenseSplit {
        ExpenseSplit {
            expense_id: expense_id.clone(),
            user_id: self.member,
            amount: self.amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}
