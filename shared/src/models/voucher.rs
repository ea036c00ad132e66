//! Voucher Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a voucher's `discount` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    /// `discount` is a percentage of the subtotal
    Percentage,
    /// `discount` is a flat amount, independent of the subtotal
    Fixed,
}

impl VoucherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }

    /// Parse the stored kind. Anything other than `percentage` is a fixed amount.
    pub fn from_db(value: &str) -> Self {
        if value.eq_ignore_ascii_case("percentage") {
            Self::Percentage
        } else {
            Self::Fixed
        }
    }
}

/// A discount code with an activity window and a usage budget
///
/// `start_at`/`end_at` are Unix millis; the window is half-open `[start_at, end_at)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub kind: VoucherKind,
    pub discount: Decimal,
    pub remaining_usage: i32,
    pub start_at: i64,
    pub end_at: i64,
    pub published: bool,
}

impl Voucher {
    /// Published and `now` inside `[start_at, end_at)`
    pub fn is_active_at(&self, now: i64) -> bool {
        self.published && self.start_at <= now && now < self.end_at
    }

    pub fn has_remaining_usage(&self) -> bool {
        self.remaining_usage > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voucher(start_at: i64, end_at: i64, published: bool) -> Voucher {
        Voucher {
            id: 1,
            code: "HELLO".into(),
            name: "Hello".into(),
            kind: VoucherKind::Fixed,
            discount: Decimal::TEN,
            remaining_usage: 1,
            start_at,
            end_at,
            published,
        }
    }

    #[test]
    fn test_window_is_half_open() {
        let v = voucher(100, 200, true);
        assert!(!v.is_active_at(99));
        assert!(v.is_active_at(100));
        assert!(v.is_active_at(199));
        assert!(!v.is_active_at(200));
    }

    #[test]
    fn test_unpublished_is_never_active() {
        let v = voucher(100, 200, false);
        assert!(!v.is_active_at(150));
    }

    #[test]
    fn test_kind_from_db() {
        assert_eq!(VoucherKind::from_db("percentage"), VoucherKind::Percentage);
        assert_eq!(VoucherKind::from_db("PERCENTAGE"), VoucherKind::Percentage);
        assert_eq!(VoucherKind::from_db("fixed"), VoucherKind::Fixed);
        assert_eq!(VoucherKind::from_db("nominal"), VoucherKind::Fixed);
    }
}
