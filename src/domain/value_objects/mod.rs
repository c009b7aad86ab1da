//! Value Objects for the store

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store currency. Everything is priced in rupiah.
pub const IDR: &str = "IDR";

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn idr(amount: Decimal) -> Self { Self::new(amount, IDR) }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_positive(&self) -> bool { self.amount > Decimal::ZERO }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }

    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }

    /// Sums amounts in the given currency. Entries in another currency are an error.
    pub fn sum<'a>(currency: &str, items: impl IntoIterator<Item = &'a Money>) -> Result<Money, MoneyError> {
        items.into_iter().try_fold(Money::zero(currency), |acc, m| acc.add(m))
    }

    /// Whole rupiah, as the payment gateway expects `gross_amount`.
    pub fn whole_units(&self) -> i64 {
        self.amount.round().to_i64().unwrap_or_default()
    }

    /// `Rp 45.000` style rendering used in customer messages.
    pub fn format_idr(&self) -> String {
        let units = self.whole_units();
        let digits = units.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if units < 0 { "-" } else { "" };
        format!("Rp {sign}{grouped}")
    }
}

impl Default for Money { fn default() -> Self { Self::zero(IDR) } }

#[derive(Debug, Clone)] pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Currency mismatch") }
}

/// Quantity value object, used for stock levels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    /// Removes up to `other` units, bottoming out at zero.
    pub fn saturating_sub(&self, other: u32) -> Self { Self(self.0.saturating_sub(other)) }
    pub fn covers(&self, requested: u32) -> bool { requested <= self.0 }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

/// Normalized e-mail address
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, ContactError> {
        let value = value.as_ref().trim().to_lowercase();
        let (local, domain) = value.split_once('@').ok_or(ContactError::InvalidEmail)?;
        if local.is_empty() || domain.contains('@') || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(ContactError::InvalidEmail);
        }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Phone number as entered by the customer
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, ContactError> {
        let value = value.as_ref().trim();
        if !value.chars().any(|c| c.is_ascii_digit()) { return Err(ContactError::InvalidPhone); }
        Ok(Self(value.to_string()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    /// Digits only; the form the messaging API accepts as a target.
    pub fn digits(&self) -> String { self.0.chars().filter(char::is_ascii_digit).collect() }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ContactError { InvalidEmail, InvalidPhone }
impl std::error::Error for ContactError {}
impl fmt::Display for ContactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::InvalidEmail => write!(f, "Invalid email address"), Self::InvalidPhone => write!(f, "Invalid phone number") }
    }
}
