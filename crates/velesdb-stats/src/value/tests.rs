//! Tests for `value` module

use super::*;

#[test]
fn test_convert_integers_of_every_width() {
    assert_eq!(try_convert_to_f64(&Value::Int64(-42)), Some(-42.0));
    assert_eq!(try_convert_to_f64(&Value::UInt64(42)), Some(42.0));
    assert_eq!(try_convert_to_f64(&Value::Int128(-7)), Some(-7.0));
    assert_eq!(try_convert_to_f64(&Value::UInt128(7)), Some(7.0));
    assert_eq!(
        try_convert_to_f64(&Value::Int256(I256::from(-3_i128))),
        Some(-3.0)
    );
    assert_eq!(
        try_convert_to_f64(&Value::UInt256(U256::from(3_u128))),
        Some(3.0)
    );
}

#[test]
fn test_convert_float_passes_through() {
    assert_eq!(try_convert_to_f64(&Value::Float64(1.5)), Some(1.5));
    let nan = try_convert_to_f64(&Value::Float64(f64::NAN)).expect("float converts");
    assert!(nan.is_nan());
}

#[test]
fn test_convert_non_numeric_is_absent() {
    assert_eq!(try_convert_to_f64(&Value::Null), None);
    assert_eq!(try_convert_to_f64(&Value::Bool(true)), None);
    assert_eq!(try_convert_to_f64(&Value::from("12")), None);
}

#[test]
fn test_convert_to_string_only_for_strings() {
    assert_eq!(try_convert_to_string(&Value::from("abc")), Some("abc"));
    assert_eq!(try_convert_to_string(&Value::Int64(1)), None);
    assert_eq!(try_convert_to_string(&Value::Null), None);
}

#[test]
fn test_wide_integers_fold_high_half() {
    // 2^128 + 1
    let big = U256::from_parts(1, 1);
    assert!((big.to_f64() - 2f64.powi(128)).abs() <= 2f64.powi(128) * f64::EPSILON);

    // -(2^128)
    let negative = I256::from_parts(-1, 0);
    assert_eq!(negative.to_f64(), -(2f64.powi(128)));

    let minus_one = I256::from(-1_i128);
    assert_eq!(minus_one.to_f64(), -1.0);
}

#[test]
fn test_value_from_conversions() {
    assert_eq!(Value::from(5_i8), Value::Int64(5));
    assert_eq!(Value::from(5_u16), Value::UInt64(5));
    assert_eq!(Value::from(2.5_f32), Value::Float64(2.5));
    assert_eq!(Value::from(None::<i32>), Value::Null);
    assert_eq!(Value::from(Some("x")), Value::String("x".to_string()));
    assert!(Value::default().is_null());
}

#[test]
fn test_data_type_parse_and_display() {
    let parsed: DataType = "LowCardinality(Nullable(String))".parse().expect("parse");
    assert_eq!(
        parsed,
        DataType::LowCardinality(Box::new(DataType::Nullable(Box::new(DataType::String))))
    );
    assert_eq!(parsed.to_string(), "LowCardinality(Nullable(String))");
    assert_eq!(parsed.inner(), &DataType::String);
    assert!(parsed.is_nullable());

    let fixed: DataType = "FixedString(16)".parse().expect("parse");
    assert_eq!(fixed, DataType::FixedString(16));
    assert!(fixed.is_string_like());
}

#[test]
fn test_data_type_parse_rejects_unknown() {
    let err = "Decimal(10, 2)".parse::<DataType>().unwrap_err();
    assert_eq!(err.code(), "STATS-005");
    assert!("FixedString(0)".parse::<DataType>().is_err());
    assert!("Nullable(Int64".parse::<DataType>().is_err());
}

#[test]
fn test_data_type_numeric_classification() {
    assert!(DataType::Nullable(Box::new(DataType::UInt32)).is_value_represented_by_number());
    assert!(DataType::Date.is_value_represented_by_number());
    assert!(!DataType::String.is_value_represented_by_number());
    assert!(!DataType::Float64.is_string_like());
}

#[test]
fn test_parse_wide_integers() {
    assert_eq!("0".parse::<U256>().unwrap(), U256::from(0_u128));
    assert_eq!(
        u128::MAX.to_string().parse::<U256>().unwrap(),
        U256::from(u128::MAX)
    );
    // 2^128
    assert_eq!(
        "340282366920938463463374607431768211456".parse::<U256>().unwrap(),
        U256::from_parts(1, 0)
    );
    // 2^256 - 1
    let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
    assert_eq!(
        max.parse::<U256>().unwrap(),
        U256::from_parts(u128::MAX, u128::MAX)
    );

    assert_eq!("-1".parse::<I256>().unwrap(), I256::from(-1_i128));
    assert_eq!(
        i128::MIN.to_string().parse::<I256>().unwrap(),
        I256::from(i128::MIN)
    );
    // -2^255
    let min = "-57896044618658097711785492504343953926634992332820282019728792003956564819968";
    assert_eq!(min.parse::<I256>().unwrap(), I256::from_parts(i128::MIN, 0));
    assert_eq!(
        "-340282366920938463463374607431768211456".parse::<I256>().unwrap(),
        I256::from_parts(-1, 0)
    );
}

#[test]
fn test_parse_wide_integers_rejects_bad_text() {
    // 2^256
    let overflow = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
    assert!(overflow.parse::<U256>().is_err());
    // 2^255
    let too_big = "57896044618658097711785492504343953926634992332820282019728792003956564819968";
    assert!(too_big.parse::<I256>().is_err());
    assert!("".parse::<U256>().is_err());
    assert!("-".parse::<I256>().is_err());
    assert!("-1".parse::<U256>().is_err());
    let err = "1x".parse::<I256>().unwrap_err();
    assert_eq!(err.to_string(), "invalid 256-bit integer literal '1x'");
}
