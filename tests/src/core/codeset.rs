use proptest::prelude::*;
use rdis_core::{CodeSet, CodeSetError};

fn set(s: &str) -> CodeSet {
    CodeSet::parse(s).unwrap()
}

// ── Matching ─────────────────────────────────────────────────

#[test]
fn hex_wildcard_low_nibble() {
    let s = set("0x0?");
    assert!(s.matches(0x05));
    assert!(s.matches(0x00));
    assert!(s.matches(0x0F));
    assert!(!s.matches(0x15));
}

#[test]
fn difference_removes_value() {
    let s = set("0x0?-0x08");
    assert!(!s.matches(0x08));
    assert!(s.matches(0x05));
    assert_eq!(s.bytes().count(), 15);
}

#[test]
fn chained_difference_folds_left() {
    let s = set("0b11000???-0xC6-0xC7");
    let got: Vec<u8> = s.bytes().collect();
    assert_eq!(got, vec![0xC0, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5]);
}

#[test]
fn binary_pattern_with_hole() {
    let s = set("0b01??????-0x76");
    assert_eq!(s.bytes().count(), 63);
    assert!(s.matches(0x40));
    assert!(s.matches(0x7F));
    assert!(!s.matches(0x76));
    assert!(!s.matches(0x80));
}

#[test]
fn octal_digits_are_three_bits() {
    let s = set("0o1?");
    let got: Vec<u8> = s.bytes().collect();
    assert_eq!(got, (8..16).collect::<Vec<u8>>());
}

#[test]
fn underscore_is_ignored() {
    assert_eq!(set("0b0100_0000"), set("0x40"));
}

#[test]
fn bits_above_written_digits_must_be_zero() {
    let s = set("0x?");
    assert!(s.matches(0x0F));
    assert!(!s.matches(0x10));
    assert!(!s.matches(0x100));
}

#[test]
fn full_byte_wildcard() {
    assert_eq!(set("0x??").bytes().count(), 256);
}

// ── Errors ───────────────────────────────────────────────────

#[test]
fn missing_prefix() {
    assert_eq!(
        CodeSet::parse("12"),
        Err(CodeSetError::BadPrefix("12".into()))
    );
}

#[test]
fn no_digits() {
    assert_eq!(
        CodeSet::parse("0x"),
        Err(CodeSetError::NoDigits("0x".into()))
    );
    assert!(matches!(
        CodeSet::parse("0b__"),
        Err(CodeSetError::NoDigits(_))
    ));
}

#[test]
fn digit_outside_radix() {
    assert_eq!(
        CodeSet::parse("0o8"),
        Err(CodeSetError::BadDigit {
            value: "0o8".into(),
            digit: '8',
        })
    );
    assert!(matches!(
        CodeSet::parse("0b012"),
        Err(CodeSetError::BadDigit { digit: '2', .. })
    ));
}

#[test]
fn error_in_subtrahend() {
    assert!(matches!(
        CodeSet::parse("0x0?-0xZ"),
        Err(CodeSetError::BadDigit { digit: 'Z', .. })
    ));
}

proptest! {
    #[test]
    fn exact_value_matches_only_itself(b in any::<u8>(), c in any::<u8>()) {
        let s = CodeSet::parse(&format!("0x{b:02X}")).unwrap();
        prop_assert_eq!(s.matches(c as u32), b == c);
    }

    #[test]
    fn high_nibble_pattern(hi in 0u8..16, c in any::<u8>()) {
        let s = CodeSet::parse(&format!("0x{hi:X}?")).unwrap();
        prop_assert_eq!(s.matches(c as u32), c >> 4 == hi);
    }

    #[test]
    fn difference_never_matches_subtrahend(b in any::<u8>()) {
        let s = CodeSet::parse(&format!("0x??-0x{b:02X}")).unwrap();
        prop_assert!(!s.matches(b as u32));
        prop_assert_eq!(s.bytes().count(), 255);
    }
}
