//! Money calculation utilities using rust_decimal for precision

use rust_decimal::prelude::*;
use shared::models::{CartLine, OrderLine, Voucher, VoucherKind};

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// A priced line: cart lines and order lines both sum the same way
pub trait LineAmount {
    fn quantity(&self) -> i32;
    fn unit_price(&self) -> Decimal;

    fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity())
    }
}

impl LineAmount for CartLine {
    fn quantity(&self) -> i32 {
        self.quantity
    }
    fn unit_price(&self) -> Decimal {
        self.unit_price
    }
}

impl LineAmount for OrderLine {
    fn quantity(&self) -> i32 {
        self.quantity
    }
    fn unit_price(&self) -> Decimal {
        self.unit_price
    }
}

/// Σ(quantity × unit_price)
pub fn subtotal<L: LineAmount>(lines: &[L]) -> Decimal {
    lines.iter().map(LineAmount::line_total).sum()
}

/// Discount a voucher grants against `subtotal`, never negative.
///
/// Percentage vouchers take `discount` percent of the subtotal; fixed vouchers
/// give their flat amount whatever the subtotal.
pub fn voucher_discount(voucher: &Voucher, subtotal: Decimal) -> Decimal {
    let discount = match voucher.kind {
        VoucherKind::Percentage => (subtotal * voucher.discount / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero),
        VoucherKind::Fixed => voucher.discount,
    };
    discount.max(Decimal::ZERO)
}

/// `max(subtotal - discount, 0)`
pub fn apply_discount(subtotal: Decimal, discount: Decimal) -> Decimal {
    (subtotal - discount).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, price: i64) -> CartLine {
        CartLine {
            product_variant_id: 1,
            quantity,
            unit_price: Decimal::from(price),
        }
    }

    fn voucher(kind: VoucherKind, discount: Decimal) -> Voucher {
        Voucher {
            id: 1,
            code: "V".into(),
            name: String::new(),
            kind,
            discount,
            remaining_usage: 1,
            start_at: 0,
            end_at: i64::MAX,
            published: true,
        }
    }

    #[test]
    fn test_subtotal() {
        assert_eq!(subtotal(&[line(2, 50), line(1, 30)]), Decimal::from(130));
        assert_eq!(subtotal::<CartLine>(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_percentage_discount() {
        let v = voucher(VoucherKind::Percentage, Decimal::from(10));
        let discount = voucher_discount(&v, Decimal::from(100));
        assert_eq!(discount, Decimal::from(10));
        assert_eq!(apply_discount(Decimal::from(100), discount), Decimal::from(90));
    }

    #[test]
    fn test_percentage_discount_rounds_half_away_from_zero() {
        // 15% of 0.30 = 0.045
        let v = voucher(VoucherKind::Percentage, Decimal::from(15));
        assert_eq!(
            voucher_discount(&v, Decimal::new(30, 2)),
            Decimal::new(5, 2)
        );
    }

    #[test]
    fn test_fixed_discount_ignores_subtotal() {
        let v = voucher(VoucherKind::Fixed, Decimal::from(50));
        assert_eq!(voucher_discount(&v, Decimal::from(20)), Decimal::from(50));
        assert_eq!(voucher_discount(&v, Decimal::from(500)), Decimal::from(50));
    }

    #[test]
    fn test_total_clamped_at_zero() {
        assert_eq!(
            apply_discount(Decimal::from(20), Decimal::from(50)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_negative_discount_clamped() {
        let v = voucher(VoucherKind::Fixed, Decimal::from(-5));
        assert_eq!(voucher_discount(&v, Decimal::from(20)), Decimal::ZERO);
    }
}
