use rdis_core::bytecode::*;
use rdis_core::{compile, LangError, Minitable, ParseErrorKind};

/// Compile `src` and return the error kind and line number.
fn parse_err(src: &str) -> (usize, ParseErrorKind) {
    match compile("t", src) {
        Err(LangError::Parse { lang, line, kind }) => {
            assert_eq!(lang, "t");
            (line, kind)
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

fn kind(src: &str) -> ParseErrorKind {
    parse_err(src).1
}

// ── Headers ──────────────────────────────────────────────────

#[test]
fn defaults() {
    let lang = compile("t", "[0x00] nop").unwrap();
    assert_eq!(lang.name(), "t");
    assert_eq!(lang.default_countdown(), 0);
    assert_eq!(lang.dispatch_suboffset(), 0);
    assert!(!lang.is_trivial());
    assert!(!lang.is_terminal());
}

#[test]
fn header_lines() {
    let src = "\
# header test
Dispatch-suboffset: 1
Default-countdown: 3
Trivial: true
[0x00] x
";
    let lang = compile("t", src).unwrap();
    assert_eq!(lang.dispatch_suboffset(), 1);
    assert_eq!(lang.default_countdown(), 3);
    assert!(lang.is_trivial());
}

#[test]
fn bad_header_values() {
    assert_eq!(
        kind("Trivial: maybe"),
        ParseErrorKind::BadHeader("maybe".into())
    );
    assert_eq!(
        kind("Dispatch-suboffset: 8"),
        ParseErrorKind::BadHeader("8".into())
    );
    assert_eq!(
        kind("Default-countdown: -1"),
        ParseErrorKind::BadHeader("-1".into())
    );
    assert_eq!(kind("Colour: blue"), ParseErrorKind::Syntax);
}

#[test]
fn unrecognised_line() {
    assert_eq!(parse_err("\n\nbogus line"), (3, ParseErrorKind::Syntax));
}

// ── Programs ─────────────────────────────────────────────────

#[test]
fn literal_program() {
    let lang = compile("nop", "[0x00] nop").unwrap();
    assert_eq!(lang.entry(0x00), Some(0));
    assert_eq!(lang.entry(0x01), None);
    assert_eq!(lang.program(), b"nop\0");
    assert_eq!(lang.coverage(), 1);
}

#[test]
fn codeset_shares_one_program() {
    let lang = compile("t", "[0x0?-0x08] x\n[0x08] y").unwrap();
    assert_eq!(lang.coverage(), 16);
    assert_eq!(lang.entry(0x00), lang.entry(0x0F));
    assert_eq!(lang.entry(0x08), Some(2));
    assert_eq!(lang.program(), b"x\0y\0");
}

#[test]
fn format_step_follows_width() {
    let lang = compile(
        "t",
        "[0x00] <byte 0, unsigned>\n[0x01] <lewyde 0, unsigned>",
    )
    .unwrap();
    assert_eq!(
        lang.program(),
        &[
            GET_BYTE_0,
            UNSIGNED_BYTE,
            COMPLETE,
            GET_LEWYDE_0,
            UNSIGNED_WYDE,
            COMPLETE
        ]
    );
}

#[test]
fn signedrel_widens_to_wyde() {
    let lang =
        compile("t", "[0x18] jr <byte 1, signedrel 2, unsigned>").unwrap();
    let mut expected = b"jr ".to_vec();
    expected.extend([GET_BYTE_0 + 1, SIGNEDREL, 2, UNSIGNED_WYDE, COMPLETE]);
    assert_eq!(lang.program(), expected.as_slice());
}

#[test]
fn immediate_operands() {
    let lang = compile("t", "[0x00] <byte 0, shr 3, and 0x1234, decimal>")
        .unwrap();
    assert_eq!(
        lang.program(),
        &[GET_BYTE_0, SHR, 3, AND, 0x34, 0x12, DECIMAL, COMPLETE]
    );
}

#[test]
fn zxs_float_step() {
    let src = "[0x00] <byte 0, unsigned> // <zxs-float>";
    let lang = compile("t", src).unwrap();
    let mut expected = vec![GET_BYTE_0, UNSIGNED_BYTE];
    expected.extend_from_slice(b" // ");
    expected.extend([ZXS_FLOAT, COMPLETE]);
    assert_eq!(lang.program(), expected.as_slice());
    assert!(matches!(
        kind("[0x00] <zxs-float 1>"),
        ParseErrorKind::OperandForm { .. }
    ));
    assert!(matches!(
        kind("[0x00] <byte 0, zxs-float>"),
        ParseErrorKind::StepType { .. }
    ));
}

#[test]
fn value_may_be_used_twice() {
    let lang =
        compile("t", "[0xCD] call <lewyde 1, subrentry, unsigned>").unwrap();
    assert!(lang.program().ends_with(&[
        GET_LEWYDE_0 + 1,
        SUBRENTRY,
        UNSIGNED_WYDE,
        COMPLETE
    ]));
}

#[test]
fn self_reference_with_terminate() {
    let lang = compile("t", "[0x00] <byte 0, entry><terminate>").unwrap();
    assert_eq!(lang.program(), &[GET_BYTE_0, ENTRY, TERMINATE, COMPLETE]);
}

#[test]
fn referred_languages_get_slots() {
    let src = "\
[0xCB] <byte 1, dispatch sub>
[0xED] <byte 1, dispatch other>
[0x34] x<tempswitch sub, set-countdown 6>
[0x00] <lewyde 1, entry byte>
";
    let lang = compile("t", src).unwrap();
    assert_eq!(lang.linkage().referred(), &["sub", "other", "byte"]);
    let tempswitch = lang.entry(0x34).unwrap();
    assert_eq!(
        &lang.program()[tempswitch..tempswitch + 5],
        &[b'x', TEMPSWITCH_0, SET_COUNTDOWN, 6, COMPLETE]
    );
    let entry = lang.entry(0x00).unwrap();
    assert_eq!(lang.program()[entry + 1], ENTRY_0 + 2);
}

#[test]
fn comments_and_blank_lines() {
    let src = "# one\n\n   # two\n[0x00] nop\n";
    assert_eq!(compile("t", src).unwrap().coverage(), 1);
}

// ── Minitables ───────────────────────────────────────────────

#[test]
fn minitable_lookup_masks_index() {
    let t = Minitable::new(
        "t",
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
    )
    .unwrap();
    assert_eq!(t.lookup(5), "b");
    assert_eq!(t.lookup(3), "d");
    assert!(Minitable::new("t", vec!["a".into(), "b".into(), "c".into()])
        .is_none());
    assert!(Minitable::new("t", vec![]).is_none());
}

#[test]
fn minitable_is_compiled_as_lookup() {
    let src = "r[] b, c, d, e, h, l, (hl), a\n[0x??] <byte 0, r>";
    let lang = compile("t", src).unwrap();
    assert_eq!(lang.linkage().minitables()[0].entries()[6], "(hl)");
    assert_eq!(lang.program(), &[GET_BYTE_0, MINITABLE_0, COMPLETE]);
}

#[test]
fn minitable_size_not_power_of_two() {
    assert_eq!(
        parse_err("# x\nr[] a, b, c"),
        (
            2,
            ParseErrorKind::MinitableSize {
                name: "r".into(),
                len: 3
            }
        )
    );
}

#[test]
fn duplicate_minitable() {
    assert_eq!(
        kind("r[] a, b\nr[] c, d"),
        ParseErrorKind::DuplicateMinitable("r".into())
    );
}

#[test]
fn too_many_minitables() {
    let src: String = (0..9).map(|i| format!("m{i}[] a\n")).collect();
    assert_eq!(parse_err(&src), (9, ParseErrorKind::TooManyMinitables));
}

#[test]
fn minitable_needs_a_value() {
    assert!(matches!(
        kind("r[] a, b\n[0x00] <r>"),
        ParseErrorKind::StepType { .. }
    ));
}

// ── Step errors ──────────────────────────────────────────────

#[test]
fn unknown_step() {
    assert_eq!(
        kind("[0x00] <byte 0, frob>"),
        ParseErrorKind::UnknownStep("frob".into())
    );
}

#[test]
fn operand_form() {
    assert_eq!(
        kind("[0x00] <byte, unsigned>"),
        ParseErrorKind::OperandForm {
            step: "byte".into()
        }
    );
    assert!(matches!(
        kind("[0x00] <byte 0, unsigned 2>"),
        ParseErrorKind::OperandForm { .. }
    ));
}

#[test]
fn bad_operands() {
    assert!(matches!(
        kind("[0x00] <byte 8, unsigned>"),
        ParseErrorKind::BadOperand { .. }
    ));
    assert!(matches!(
        kind("[0x00] <byte 0, shr 256, unsigned>"),
        ParseErrorKind::BadOperand { .. }
    ));
    assert!(matches!(
        kind("[0x00] <byte 0, and 0x10000, unsigned>"),
        ParseErrorKind::BadOperand { .. }
    ));
    assert!(matches!(
        kind("[0x00] <byte 1, dispatch Bad_Name>"),
        ParseErrorKind::BadOperand { .. }
    ));
}

#[test]
fn type_mismatches() {
    for src in [
        "[0x00] <unsigned>",
        "[0x00] <byte 0, byte 1, unsigned>",
        "[0x00] <lewyde 0, signedrel 2, unsigned>",
        "[0x00] <lewyde 1, dispatch x>",
        "[0x00] <byte 0, terminate, unsigned>",
    ] {
        assert!(
            matches!(kind(src), ParseErrorKind::StepType { .. }),
            "{src}"
        );
    }
}

#[test]
fn unconsumed_value() {
    assert_eq!(kind("[0x00] <byte 0>"), ParseErrorKind::UnconsumedValue);
    assert_eq!(
        kind("[0x00] <byte 0, unsigned, shr 1>"),
        ParseErrorKind::UnconsumedValue
    );
}

#[test]
fn too_many_referred_languages() {
    let src: String = (0..9)
        .map(|i| format!("[0x0{i}] <byte 1, dispatch l{i}>\n"))
        .collect();
    assert_eq!(parse_err(&src), (9, ParseErrorKind::TooManyReferredLangs));
}

// ── Decipherer errors ────────────────────────────────────────

#[test]
fn duplicate_opcode() {
    assert_eq!(
        parse_err("[0x0?] a\n[0x05] b"),
        (2, ParseErrorKind::DuplicateOpcode(0x05))
    );
}

#[test]
fn empty_codeset() {
    assert_eq!(kind("[0x01-0x01] x"), ParseErrorKind::EmptyCodeSet);
}

#[test]
fn bad_codeset() {
    assert!(matches!(kind("[0xZZ] x"), ParseErrorKind::CodeSet(_)));
    assert_eq!(kind("[0x00 nop"), ParseErrorKind::UnterminatedCodeSet);
}

#[test]
fn unterminated_step_list() {
    assert_eq!(
        kind("[0x00] ld a, <byte 1, unsigned"),
        ParseErrorKind::UnterminatedStepList
    );
}

#[test]
fn non_printable_literal() {
    assert_eq!(
        kind("[0x00] caf\u{e9}"),
        ParseErrorKind::NonPrintable('\u{e9}')
    );
    assert_eq!(kind("[0x00] a\tb"), ParseErrorKind::NonPrintable('\t'));
}

#[test]
fn error_message_names_language_and_line() {
    let err = compile("demo", "[0x00] nop\n[0x00] again").unwrap_err();
    assert_eq!(err.to_string(), "demo:2: opcode 0x00 already deciphered");
}
