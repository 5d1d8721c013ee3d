use rdis_core::ZxFloat;

/// Expand a condensed literal held in `bytes`.
fn condensed(bytes: &[u8]) -> Result<ZxFloat, usize> {
    ZxFloat::from_condensed(|k| bytes.get(k).copied().ok_or(k))
}

// ── Full form ────────────────────────────────────────────────

#[test]
fn full_form_values() {
    assert_eq!(ZxFloat([0x81, 0x00, 0, 0, 0]).value(), 1.0);
    assert_eq!(ZxFloat([0x80, 0x00, 0, 0, 0]).value(), 0.5);
    assert_eq!(ZxFloat([0x81, 0x80, 0, 0, 0]).value(), -1.0);
    assert_eq!(ZxFloat([0x84, 0x20, 0, 0, 0]).value(), 10.0);
}

#[test]
fn small_integer_form() {
    assert_eq!(ZxFloat([0, 0x00, 0x0A, 0x00, 0]).value(), 10.0);
    assert_eq!(ZxFloat([0, 0x00, 0xFF, 0xFF, 0]).value(), 65535.0);
    assert_eq!(ZxFloat([0, 0xFF, 0xFF, 0xFF, 0]).value(), -1.0);
    assert_eq!(ZxFloat([0, 0xFF, 0x00, 0x00, 0]).value(), -65536.0);
    assert_eq!(ZxFloat([0; 5]).value(), 0.0);
}

// ── Condensed form ───────────────────────────────────────────

#[test]
fn calculator_constants() {
    // stk-one, stk-half, stk-pi/2, stk-ten
    assert_eq!(condensed(&[0x31, 0x00]).unwrap().value(), 1.0);
    assert_eq!(condensed(&[0x30, 0x00]).unwrap().value(), 0.5);
    let half_pi = condensed(&[0xF1, 0x49, 0x0F, 0xDA, 0xA2]).unwrap();
    assert_eq!(half_pi, ZxFloat([0x81, 0x49, 0x0F, 0xDA, 0xA2]));
    assert_eq!(half_pi.to_string(), "1.5707963267341256");
    let ten = condensed(&[0x40, 0xB0, 0x00, 0x0A]).unwrap();
    assert_eq!(ten, ZxFloat([0x00, 0x00, 0x0A, 0x00, 0x00]));
    assert_eq!(ten.to_string(), "10");
}

#[test]
fn zero_exponent_field_reads_the_next_byte() {
    let n = condensed(&[0x00, 0xB0, 0x00]).unwrap();
    assert_eq!(n, ZxFloat([0; 5]));
    assert_eq!(n.to_string(), "0");
}

#[test]
fn truncated_literal_reports_the_missing_offset() {
    assert_eq!(condensed(&[0xF1, 0x49, 0x0F]), Err(3));
    assert_eq!(condensed(&[0x00]), Err(1));
}

// ── Display ──────────────────────────────────────────────────

#[test]
fn tiny_and_huge_values_use_exponents() {
    let tiny = condensed(&[0x41, 0x20, 0x00]).unwrap();
    assert_eq!(tiny.to_string(), "4.440892098500626e-15");
    let huge = ZxFloat([0xB7, 0x00, 0, 0, 0]);
    assert_eq!(huge.to_string(), "1.8014398509481984e16");
    assert_eq!(ZxFloat([0x82, 0xC0, 0, 0, 0]).to_string(), "-3");
}
