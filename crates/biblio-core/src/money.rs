//! Integer-cent money and its display form.
//!
//! All monetary amounts are signed `i64` cents. The `"D.CC"` string form
//! exists only at the response boundary; arithmetic never touches it.

/// Format signed cents as `"D.CC"`, e.g. `1550 → "15.50"`, `-700 → "-7.00"`.
pub fn format_cents(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let magnitude = cents.unsigned_abs();
  format!("{sign}{}.{:02}", magnitude / 100, magnitude % 100)
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn formats_common_amounts() {
    assert_eq!(format_cents(0), "0.00");
    assert_eq!(format_cents(5), "0.05");
    assert_eq!(format_cents(100), "1.00");
    assert_eq!(format_cents(1550), "15.50");
    assert_eq!(format_cents(-700), "-7.00");
    assert_eq!(format_cents(-5), "-0.05");
    assert_eq!(format_cents(200_000), "2000.00");
  }

  #[test]
  fn formats_extremes_without_overflow() {
    assert_eq!(format_cents(i64::MAX), "92233720368547758.07");
    assert_eq!(format_cents(i64::MIN), "-92233720368547758.08");
  }

  proptest! {
    /// The string form always round-trips back to the original cents.
    #[test]
    fn roundtrips_through_string(cents in i64::MIN..=i64::MAX) {
      let s = format_cents(cents);
      let (whole, frac) = s.rsplit_once('.').unwrap();
      let negative = whole.starts_with('-');
      let whole: i128 = whole.parse().unwrap();
      let frac: i128 = frac.parse().unwrap();
      let magnitude = whole.abs() * 100 + frac;
      let signed = if negative { -magnitude } else { magnitude };
      prop_assert_eq!(signed, cents as i128);
    }
  }
}
