use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{AddAssign, Sub, SubAssign};

/// Amount carried by a single output, in the smallest indivisible unit.
///
/// Signed so that a malformed output can be represented and then rejected.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Value(i64);

impl Value {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Value> for i64 {
    fn from(value: Value) -> Self {
        value.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Running sum of values. Wide enough that no realistic number of
/// `Value`s can overflow it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Balance(i128);

impl Balance {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn balanced(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn as_i128(&self) -> i128 {
        self.0
    }
}

impl From<Value> for Balance {
    fn from(value: Value) -> Self {
        Self(i128::from(value.0))
    }
}

impl From<i128> for Balance {
    fn from(value: i128) -> Self {
        Self(value)
    }
}

impl AddAssign<&Value> for Balance {
    fn add_assign(&mut self, rhs: &Value) {
        self.0 += i128::from(rhs.0);
    }
}

impl SubAssign<&Value> for Balance {
    fn sub_assign(&mut self, rhs: &Value) {
        self.0 -= i128::from(rhs.0);
    }
}

impl AddAssign<&Balance> for Balance {
    fn add_assign(&mut self, rhs: &Balance) {
        self.0 += rhs.0;
    }
}

impl Sub for Balance {
    type Output = Balance;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
