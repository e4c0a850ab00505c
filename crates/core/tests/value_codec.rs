use facts_core::value::{
    encode_bytes, parse_address, parse_bytes, parse_integer, parse_word, MalformedScalar, ScalarKind,
};

#[test]
fn parse_integer_accepts_hex_decimal_and_native() {
    assert_eq!(parse_integer("0x10").expect("lower prefix"), 16);
    assert_eq!(parse_integer("0X1f").expect("upper prefix"), 31);
    assert_eq!(parse_integer("0xFFFFFFFFFFFFFFFF").expect("u64 max"), i128::from(u64::MAX));
    assert_eq!(parse_integer("4096").expect("decimal"), 4096);
    assert_eq!(parse_integer(7u64).expect("native"), 7);
    assert_eq!(parse_integer("0").expect("zero"), 0);
}

#[test]
fn parse_integer_rejects_non_numeric_text() {
    for bad in ["", "abc", "0x", "0xZZ", "12z", "1.5", "-", "0x-1", "-0x1"] {
        let err = parse_integer(bad).expect_err(bad);
        assert_eq!(err, MalformedScalar { input: bad.to_string(), expected: ScalarKind::Integer });
    }
}

#[test]
fn parse_integer_keeps_negative_values() {
    assert_eq!(parse_integer("-1").expect("negative decimal"), -1);
    assert_eq!(parse_integer("-4096").expect("negative decimal"), -4096);
    assert_eq!(parse_integer(-1i64).expect("negative native"), -1);
    assert_eq!(parse_integer(i64::MIN).expect("i64 min"), i128::from(i64::MIN));
}

#[test]
fn parse_address_rejects_negative_and_oversized_values() {
    assert_eq!(parse_address("0xFFFFFFFFFFFFFFFF").expect("u64 max"), u64::MAX);
    assert_eq!(parse_address(4096u64).expect("native"), 4096);

    let negative = parse_address("-1").expect_err("negative");
    assert_eq!(negative, MalformedScalar { input: "-1".into(), expected: ScalarKind::Address });
    let native = parse_address(-5i64).expect_err("negative native");
    assert_eq!(native.input, "-5");
    let wide = parse_address("0x10000000000000000").expect_err("65 bits");
    assert_eq!(wide.expected, ScalarKind::Address);

    // Text that is not a number at all stays an integer error.
    assert_eq!(parse_address("zz").expect_err("junk").expected, ScalarKind::Integer);
}

#[test]
fn parse_word_covers_signed_and_unsigned_64_bit_ranges() {
    assert_eq!(parse_word("-1").expect("negative"), -1);
    assert_eq!(parse_word(i64::MIN).expect("i64 min"), i64::MIN);
    assert_eq!(parse_word("0x7FFFFFFFFFFFFFFF").expect("i64 max"), i64::MAX);
    assert_eq!(parse_word("0xFFFFFFFFFFFFFFFF").expect("u64 max"), -1);
    assert_eq!(parse_word("0x8000000000000000").expect("sign bit"), i64::MIN);

    let wide = parse_word("-9223372036854775809").expect_err("below i64 min");
    assert_eq!(wide.expected, ScalarKind::Word);
}

#[test]
fn parse_integer_does_not_treat_bare_hex_digits_as_hex() {
    // Without the prefix, text is decimal only.
    assert!(parse_integer("ff").is_err());
    assert_eq!(parse_integer("10").expect("decimal"), 10);
}

#[test]
fn parse_bytes_decodes_hex_and_passes_raw_through() {
    assert_eq!(parse_bytes("deadbeef").expect("lower"), vec![0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(parse_bytes("DEADBEEF").expect("upper"), vec![0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(parse_bytes("").expect("empty"), Vec::<u8>::new());

    let raw: &[u8] = &[1, 2, 3];
    assert_eq!(parse_bytes(raw).expect("raw"), vec![1, 2, 3]);
}

#[test]
fn parse_bytes_rejects_odd_length_and_non_hex() {
    let odd = parse_bytes("abc").expect_err("odd length");
    assert_eq!(odd.expected, ScalarKind::HexBytes);
    assert_eq!(odd.input, "abc");

    let junk = parse_bytes("zz").expect_err("non-hex");
    assert_eq!(junk.expected, ScalarKind::HexBytes);
}

#[test]
fn encode_bytes_is_lowercase() {
    assert_eq!(encode_bytes(&[0xDE, 0xAD, 0x00, 0x0f]), "dead000f");
    assert_eq!(encode_bytes(&[]), "");
}

#[test]
fn malformed_scalar_message_names_input_and_expectation() {
    let err = parse_integer("nope").expect_err("malformed");
    let msg = err.to_string();
    assert!(msg.contains("\"nope\""), "message was: {msg}");
    assert!(msg.contains("integer"), "message was: {msg}");
}
