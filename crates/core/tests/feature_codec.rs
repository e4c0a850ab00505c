use facts_core::features::{
    freeze, thaw, thaw_json, thaw_value, Feature, FeatureError, FeatureKind, FeatureRecord,
    FeatureType, PropertyAccess,
};
use serde_json::{json, Number};

/// One feature of every kind, in discriminator order.
fn every_kind() -> Vec<Feature> {
    vec![
        Feature::new(FeatureKind::Os("windows".into())),
        Feature::new(FeatureKind::Arch("amd64".into())),
        Feature::new(FeatureKind::Format("pe".into())),
        Feature::new(FeatureKind::Match("create file".into())),
        Feature::new(FeatureKind::Characteristic("nzxor".into())),
        Feature::new(FeatureKind::Export("DllMain".into())),
        Feature::new(FeatureKind::Import("kernel32.CreateFileW".into())),
        Feature::new(FeatureKind::Section(".text".into())),
        Feature::new(FeatureKind::FunctionName("WinMain".into())),
        Feature::new(FeatureKind::Substring("cmd.exe".into())),
        Feature::new(FeatureKind::Regex("/http:\\/\\//i".into())),
        Feature::new(FeatureKind::String("hello".into())),
        Feature::new(FeatureKind::Class("System.IO.File".into())),
        Feature::new(FeatureKind::Namespace("System.IO".into())),
        Feature::new(FeatureKind::BasicBlock),
        Feature::new(FeatureKind::Api("kernel32.CreateFileW".into())),
        Feature::new(FeatureKind::Property {
            name: "System.IO.FileInfo::Length".into(),
            access: Some(PropertyAccess::Read),
        }),
        Feature::new(FeatureKind::Number(Number::from(0x10))),
        Feature::new(FeatureKind::Bytes(vec![0xde, 0xad, 0xbe, 0xef])),
        Feature::new(FeatureKind::Offset(-8)),
        Feature::new(FeatureKind::Mnemonic("xor".into())),
        Feature::new(FeatureKind::OperandNumber { index: 1, value: 0xff }),
        Feature::new(FeatureKind::OperandOffset { index: 0, value: 0x30 }),
    ]
}

#[test]
fn every_kind_is_covered_once() {
    let types: Vec<FeatureType> = every_kind().iter().map(Feature::feature_type).collect();
    assert_eq!(types, FeatureType::ALL.to_vec());
}

#[test]
fn freeze_then_thaw_round_trips_every_kind() {
    for feature in every_kind() {
        let thawed = thaw(freeze(&feature)).expect("thaw frozen feature");
        assert_eq!(thawed, feature);

        let described = feature.clone().with_description("seen in stage two");
        assert_eq!(thaw(freeze(&described)).expect("thaw described"), described);
    }
}

#[test]
fn round_trip_survives_json_text() {
    for feature in every_kind() {
        let text = freeze(&feature).to_json().expect("encode");
        let record = FeatureRecord::from_json(&text).expect("decode");
        assert_eq!(record, freeze(&feature), "record for {feature}");
        assert_eq!(thaw_json(&text).expect("thaw"), feature);
    }
}

#[test]
fn wire_tags_match_discriminator_strings() {
    for feature in every_kind() {
        let value = freeze(&feature).to_value().expect("encode");
        assert_eq!(value["type"], json!(feature.feature_type().as_str()));
        assert!(value.get("description").is_some(), "description always emitted");
    }
}

#[test]
fn description_absent_and_empty_stay_distinct() {
    let bare = Feature::new(FeatureKind::Mnemonic("mov".into()));
    let empty = bare.clone().with_description("");

    let bare_value = freeze(&bare).to_value().expect("encode");
    let empty_value = freeze(&empty).to_value().expect("encode");
    assert_eq!(bare_value["description"], json!(null));
    assert_eq!(empty_value["description"], json!(""));

    assert_eq!(thaw_value(bare_value).expect("thaw").description, None);
    assert_eq!(thaw_value(empty_value).expect("thaw").description, Some(String::new()));

    // A record that omits the key entirely is also "no description".
    let omitted = thaw_value(json!({"type": "mnemonic", "mnemonic": "mov"})).expect("thaw");
    assert_eq!(omitted, bare);
}

#[test]
fn documented_examples_decode() {
    let api = thaw_json(r#"{"type":"api","api":"kernel32.CreateFileW","description":null}"#)
        .expect("api record");
    assert_eq!(api, Feature::new(FeatureKind::Api("kernel32.CreateFileW".into())));

    let bytes = thaw_json(r#"{"type":"bytes","bytes":"deadbeef","description":"shellcode stub"}"#)
        .expect("bytes record");
    assert_eq!(
        bytes,
        Feature::new(FeatureKind::Bytes(vec![0xde, 0xad, 0xbe, 0xef]))
            .with_description("shellcode stub")
    );
}

#[test]
fn dispatch_follows_the_tag_not_the_shape() {
    let string = thaw_value(json!({"type": "string", "string": "hello"})).expect("string");
    assert_eq!(string.kind, FeatureKind::String("hello".into()));

    let substring = thaw_value(json!({"type": "substring", "substring": "hello"})).expect("sub");
    assert_eq!(substring.kind, FeatureKind::Substring("hello".into()));

    let regex = thaw_value(json!({"type": "regex", "regex": "hello"})).expect("regex");
    assert_eq!(regex.kind, FeatureKind::Regex("hello".into()));
}

#[test]
fn renamed_fields_use_literal_wire_names() {
    let value = freeze(&Feature::new(FeatureKind::FunctionName("main".into())))
        .to_value()
        .expect("encode");
    assert_eq!(value, json!({"type": "function name", "function name": "main", "description": null}));

    let value = freeze(&Feature::new(FeatureKind::Match("persistence".into())))
        .to_value()
        .expect("encode");
    assert_eq!(value["match"], json!("persistence"));

    let value = freeze(&Feature::new(FeatureKind::OperandNumber { index: 2, value: 16 }))
        .to_value()
        .expect("encode");
    assert_eq!(value["operand number"], json!(16));
    assert_eq!(value["index"], json!(2));

    let value = freeze(&Feature::new(FeatureKind::Class("Foo".into()))).to_value().expect("encode");
    assert_eq!(value["class"], json!("Foo"));

    let value =
        freeze(&Feature::new(FeatureKind::Import("ws2_32.#1".into()))).to_value().expect("encode");
    assert_eq!(value["import"], json!("ws2_32.#1"));
}

#[test]
fn unknown_tag_is_recoverable_and_names_the_tag() {
    let err = thaw_value(json!({"type": "future-kind"})).expect_err("unknown tag");
    assert_eq!(err, FeatureError::UnknownFeatureType("future-kind".to_string()));
}

#[test]
fn missing_or_non_string_tag_is_missing_type() {
    assert_eq!(thaw_value(json!({"api": "x"})).expect_err("no tag"), FeatureError::MissingType);
    assert_eq!(thaw_value(json!({"type": 3})).expect_err("numeric tag"), FeatureError::MissingType);
    assert_eq!(thaw_value(json!("api")).expect_err("not an object"), FeatureError::MissingType);
}

#[test]
fn known_tag_with_wrong_payload_is_malformed() {
    let err = thaw_value(json!({"type": "offset", "offset": "0x10"})).expect_err("string offset");
    assert!(matches!(err, FeatureError::MalformedRecord { feature_type: FeatureType::Offset, .. }));

    let err = thaw_value(json!({"type": "api"})).expect_err("no payload");
    assert!(matches!(err, FeatureError::MalformedRecord { feature_type: FeatureType::Api, .. }));
}

#[test]
fn bytes_payload_accepts_uppercase_and_rejects_bad_hex() {
    let upper = thaw_value(json!({"type": "bytes", "bytes": "DEADBEEF"})).expect("uppercase");
    assert_eq!(upper.kind, FeatureKind::Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
    // Re-frozen bytes are canonical lowercase.
    assert_eq!(freeze(&upper).to_value().expect("encode")["bytes"], json!("deadbeef"));

    let err = thaw_value(json!({"type": "bytes", "bytes": "abc"})).expect_err("odd length");
    assert!(matches!(err, FeatureError::MalformedBytes(_)));
}

#[test]
fn property_access_is_optional_and_checked() {
    let plain = thaw_value(json!({"type": "property", "property": "Length"})).expect("no access");
    assert_eq!(plain.kind, FeatureKind::Property { name: "Length".into(), access: None });

    let write = thaw_value(json!({"type": "property", "access": "write", "property": "Length"}))
        .expect("write access");
    assert_eq!(
        write.kind,
        FeatureKind::Property { name: "Length".into(), access: Some(PropertyAccess::Write) }
    );
    assert_eq!(freeze(&write).to_value().expect("encode")["access"], json!("write"));

    let err = thaw_value(json!({"type": "property", "access": "exec", "property": "Length"}))
        .expect_err("bad access");
    assert!(matches!(err, FeatureError::MalformedRecord { feature_type: FeatureType::Property, .. }));
}

#[test]
fn numbers_keep_integer_or_float_form() {
    let int = thaw_value(json!({"type": "number", "number": 4096})).expect("int");
    let float = thaw_value(json!({"type": "number", "number": 1.5})).expect("float");
    let negative = thaw_value(json!({"type": "number", "number": -1})).expect("negative");

    assert_eq!(freeze(&int).to_value().expect("encode")["number"], json!(4096));
    assert_eq!(freeze(&float).to_value().expect("encode")["number"], json!(1.5));
    assert_eq!(freeze(&negative).to_value().expect("encode")["number"], json!(-1));
}

#[test]
fn record_round_trips_through_thaw_and_freeze() {
    let records = [
        json!({"type": "basic block", "description": null}),
        json!({"type": "offset", "offset": -16, "description": "frame"}),
        json!({"type": "operand offset", "index": 1, "operand offset": 8, "description": null}),
        json!({"type": "characteristic", "characteristic": "loop", "description": ""}),
    ];
    for value in records {
        let record = FeatureRecord::from_value(value.clone()).expect("decode");
        let refrozen = freeze(&thaw(record.clone()).expect("thaw"));
        assert_eq!(refrozen, record);
        assert_eq!(refrozen.to_value().expect("encode"), value);
    }
}

#[test]
fn display_is_compact() {
    let feature = Feature::new(FeatureKind::OperandOffset { index: 1, value: -8 })
        .with_description("stack slot");
    assert_eq!(feature.to_string(), "operand offset[1](-0x8) = stack slot");
    assert_eq!(Feature::new(FeatureKind::BasicBlock).to_string(), "basic block");
    assert_eq!(
        Feature::new(FeatureKind::Bytes(vec![0xAB])).to_string(),
        "bytes(ab)"
    );
}

#[test]
fn invalid_json_text_is_reported() {
    let err = thaw_json("{").expect_err("truncated");
    assert!(matches!(err, FeatureError::InvalidJson(_)));
}
