#![allow(missing_docs)]

use shapecode::{
    Fingerprint, Member, MultiArray, Primitive, Result, Shape, Shapecode, ShapecodeError, ShapecodeObject,
    Shaped, Value, ViolationKind, format, shape_of,
};

#[derive(Debug, PartialEq, ShapecodeObject)]
struct Account {
    id: u64,
    owner: String,
}

#[derive(Debug, PartialEq, ShapecodeObject)]
struct Ledger {
    id: u64,
    owner: String,
}

#[derive(Debug, PartialEq, ShapecodeObject)]
enum Holder {
    Account(Account),
    Ledger(Ledger),
}

#[derive(Debug, PartialEq, ShapecodeObject)]
struct Scalarless {
    grid: MultiArray<u8, 0>,
}

#[derive(Debug, PartialEq, ShapecodeObject)]
#[shapecode(custom, name = "fingerprint_tests::Unregistered")]
struct Unregistered {
    raw: u32,
}

#[test]
fn structurally_equal_types_with_different_names_do_not_mix() -> Result<()> {
    let codec = Shapecode::new();
    let bytes = codec.encode(&Account {
        id: 1,
        owner: "ann".into(),
    })?;
    match codec.decode::<Ledger>(&bytes) {
        Err(ShapecodeError::FingerprintMismatch {
            type_name,
            expected,
            found,
        }) => {
            assert_eq!(type_name, "fingerprint_tests::Ledger");
            assert_ne!(expected, found);
        }
        other => panic!("expected a fingerprint mismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn root_mismatch_is_an_error_not_a_skip() -> Result<()> {
    let codec = Shapecode::new();
    let bytes = codec.encode(&"text".to_owned())?;
    assert!(matches!(
        codec.decode::<Vec<String>>(&bytes),
        Err(ShapecodeError::FingerprintMismatch { .. })
    ));
    Ok(())
}

#[test]
fn tampered_member_stamp_is_reported_for_the_member() -> Result<()> {
    let codec = Shapecode::new();
    let envelope = Shape::composite(
        "fingerprint_tests::Envelope",
        vec![Member::new("body", Shape::Text)],
    );
    let value = Value::Composite(vec![Value::from("hi")]);
    let mut bytes = codec.serialize(&envelope, &value)?;

    // Header, then the composite's own tag and stamp, then the member's tag.
    let stamp_at = format::HEADER_SIZE + 1 + format::FINGERPRINT_WIDTH + 1;
    let foreign = Fingerprint::of(&Shape::sequence(Shape::Text))?;
    bytes[stamp_at..stamp_at + format::FINGERPRINT_WIDTH].copy_from_slice(foreign.as_bytes());

    match codec.read(&bytes, &envelope) {
        Err(ShapecodeError::FingerprintMismatch {
            type_name, found, ..
        }) => {
            assert_eq!(type_name, "string");
            assert_eq!(found, foreign);
        }
        other => panic!("expected a member mismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn union_dispatches_on_the_variant_stamp() -> Result<()> {
    let codec = Shapecode::new();
    let holder = codec.encode(&Holder::Ledger(Ledger {
        id: 2,
        owner: "l".into(),
    }))?;
    let (back, _): (Holder, usize) = codec.decode(&holder)?;
    assert!(matches!(back, Holder::Ledger(Ledger { id: 2, .. })));

    let stray = codec.encode(&vec![1u8])?;
    assert!(matches!(
        codec.decode::<Holder>(&stray),
        Err(ShapecodeError::FingerprintMismatch { .. })
    ));
    Ok(())
}

#[test]
fn corrupt_presence_tag_is_a_format_error() -> Result<()> {
    let codec = Shapecode::new();
    let mut bytes = codec.encode(&Account {
        id: 3,
        owner: "x".into(),
    })?;
    bytes[format::HEADER_SIZE] = 7;
    assert!(matches!(
        codec.decode::<Account>(&bytes),
        Err(ShapecodeError::Format(_))
    ));
    Ok(())
}

#[test]
fn negative_text_length_is_a_format_error() -> Result<()> {
    let codec = Shapecode::new();
    let mut bytes = codec.encode(&"abc".to_owned())?;
    let len_at = format::HEADER_SIZE + 1 + format::FINGERPRINT_WIDTH;
    bytes[len_at..len_at + 4].copy_from_slice(&(-1i32).to_le_bytes());
    assert!(matches!(
        codec.decode::<String>(&bytes),
        Err(ShapecodeError::Format(_))
    ));
    Ok(())
}

#[test]
fn derived_shapes_validate_cleanly() {
    let codec = Shapecode::new();
    assert!(codec.validate(&shape_of::<Holder>()).is_empty());
    assert!(codec.validate(&Account::shape()).is_empty());
}

#[test]
fn ambiguous_union_is_flagged() {
    let codec = Shapecode::new();
    let twice = Shape::union(
        "fingerprint_tests::Twice",
        vec![Account::shape(), Account::shape()],
    );
    let violations = codec.validate(&twice);
    assert_eq!(violations.len(), 1);
    assert!(matches!(
        violations[0].kind,
        ViolationKind::AmbiguousVariants(_)
    ));
    assert_eq!(violations[0].path, "fingerprint_tests::Twice.variants[1]");
}

#[test]
fn rank_zero_array_is_flagged_at_its_member() {
    let violations = Shapecode::new().validate(&Scalarless::shape());
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::InvalidRank(0));
    assert_eq!(
        violations[0].path,
        "fingerprint_tests::Scalarless.members[grid]"
    );
}

#[test]
fn unregistered_custom_type_is_flagged_and_refused() {
    let codec = Shapecode::new();
    let violations = codec.validate(&Unregistered::shape());
    assert_eq!(
        violations[0].kind,
        ViolationKind::MissingStrategy("fingerprint_tests::Unregistered".into())
    );
    assert!(matches!(
        codec.encode(&Unregistered { raw: 1 }),
        Err(ShapecodeError::UnsupportedShape(_))
    ));
}

#[test]
fn reused_name_with_different_members_is_a_mismatch() -> Result<()> {
    let codec = Shapecode::new();
    let pair = Shape::composite(
        "fingerprint_tests::Reused",
        vec![
            Member::new("a", Shape::Primitive(Primitive::I32)),
            Member::new("b", Shape::Primitive(Primitive::I32)),
        ],
    );
    let wide = Shape::composite(
        "fingerprint_tests::Reused",
        vec![Member::new("b", Shape::Primitive(Primitive::U64))],
    );
    assert_ne!(Fingerprint::of(&pair)?, Fingerprint::of(&wide)?);

    let value = Value::Composite(vec![Value::I32(1), Value::I32(2)]);
    let bytes = codec.serialize(&pair, &value)?;
    assert!(matches!(
        codec.read(&bytes, &wide),
        Err(ShapecodeError::FingerprintMismatch { .. })
    ));
    Ok(())
}
