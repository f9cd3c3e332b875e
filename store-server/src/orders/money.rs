//! Money calculation utilities using rust_decimal for precision
//!
//! All order totals are computed using `Decimal` internally, then converted
//! to `f64` for storage and serialization. Line prices are captured from the
//! variant at placement time and never recomputed from the catalog.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price per line
pub const MAX_PRICE: f64 = 1_000_000_000.0;

/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i64 = 9999;

/// Convert f64 to Decimal (lossless for values within monetary range)
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Convert Decimal back to f64, rounded to 2 decimal places
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp(DECIMAL_PLACES)
        .to_f64()
        .unwrap_or(0.0)
}

/// Line total: unit price × quantity
pub fn line_total(price: f64, quantity: i64) -> Decimal {
    to_decimal(price) * Decimal::from(quantity)
}

/// Order total: exact sum of line totals
pub fn order_total<'a, I>(lines: I) -> f64
where
    I: IntoIterator<Item = (f64, i64)>,
{
    let total = lines
        .into_iter()
        .fold(Decimal::ZERO, |acc, (price, qty)| {
            acc + line_total(price, qty)
        });
    to_f64(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_decimal_precision() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let a = 0.1_f64;
        let b = 0.2_f64;
        let sum_f64 = a + b;

        // f64 fails
        assert_ne!(sum_f64, 0.3);

        // Decimal succeeds
        let sum_dec = to_decimal(a) + to_decimal(b);
        assert_eq!(to_f64(sum_dec), 0.3);
    }

    #[test]
    fn test_accumulation_precision() {
        // Sum 0.01 one thousand times
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += to_decimal(0.01);
        }
        assert_eq!(to_f64(total), 10.0);
    }

    #[test]
    fn test_line_total() {
        assert_eq!(to_f64(line_total(100_000.0, 2)), 200_000.0);
        assert_eq!(to_f64(line_total(10.99, 3)), 32.97);
    }

    #[test]
    fn test_order_total() {
        let total = order_total([(100_000.0, 2), (59_000.0, 1)]);
        assert_eq!(total, 259_000.0);
    }

    #[test]
    fn test_order_total_empty() {
        assert_eq!(order_total([]), 0.0);
    }
}
