#![allow(missing_docs)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use shapecode::{MultiArray, Shape, Shapecode, ShapecodeObject, Value, format};

#[derive(Clone, Copy, Debug, PartialEq, ShapecodeObject)]
#[shapecode(fixed)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Clone, Debug, PartialEq, ShapecodeObject)]
struct Line {
    from: Point,
    to: Point,
}

#[derive(Clone, Debug, PartialEq, ShapecodeObject)]
struct Label {
    text: String,
}

#[derive(Clone, Debug, PartialEq, ShapecodeObject)]
enum Mark {
    Line(Line),
    Label(Label),
}

#[derive(Clone, Debug, PartialEq, ShapecodeObject)]
struct Sample {
    label: Option<String>,
    count: i32,
    ports: Vec<u16>,
    weight: Option<f64>,
    tags: Vec<String>,
    history: Option<Vec<i64>>,
    window: Option<Box<[u8]>>,
    rows: Vec<Vec<String>>,
    grid: MultiArray<u16, 2>,
    lookup: BTreeMap<String, Option<u32>>,
    anchor: Option<Point>,
    marks: Vec<Option<Mark>>,
}

fn arb_point() -> impl Strategy<Value = Point> {
    (any::<i32>(), any::<i32>()).prop_map(|(x, y)| Point { x, y })
}

fn arb_mark() -> impl Strategy<Value = Mark> {
    prop_oneof![
        (arb_point(), arb_point()).prop_map(|(from, to)| Mark::Line(Line { from, to })),
        "\\PC{0,8}".prop_map(|text| Mark::Label(Label { text })),
    ]
}

fn arb_grid() -> impl Strategy<Value = MultiArray<u16, 2>> {
    (0usize..4, 0usize..4).prop_flat_map(|(rows, cols)| {
        proptest::collection::vec(any::<u16>(), rows * cols).prop_map(move |items| {
            MultiArray::new([rows, cols], items).expect("items match the dimensions")
        })
    })
}

fn arb_sample() -> impl Strategy<Value = Sample> {
    (
        (
            proptest::option::of("[a-zA-Z0-9 ]{0,24}"),
            any::<i32>(),
            proptest::collection::vec(any::<u16>(), 0..32),
            proptest::option::of(-1e9f64..1e9f64),
            proptest::collection::vec("\\PC{0,8}", 0..6),
            proptest::option::of(proptest::collection::vec(any::<i64>(), 0..8)),
        ),
        (
            proptest::option::of(
                proptest::collection::vec(any::<u8>(), 0..16).prop_map(Vec::into_boxed_slice),
            ),
            proptest::collection::vec(proptest::collection::vec("[a-z]{0,4}", 0..3), 0..4),
            arb_grid(),
            proptest::collection::btree_map(
                "[a-z]{1,6}",
                proptest::option::of(any::<u32>()),
                0..5,
            ),
            proptest::option::of(arb_point()),
            proptest::collection::vec(proptest::option::of(arb_mark()), 0..5),
        ),
    )
        .prop_map(
            |(
                (label, count, ports, weight, tags, history),
                (window, rows, grid, lookup, anchor, marks),
            )| Sample {
                label,
                count,
                ports,
                weight,
                tags,
                history,
                window,
                rows,
                grid,
                lookup,
                anchor,
                marks,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn size_matches_bytes_and_value_survives(sample in arb_sample()) {
        let codec = Shapecode::new();
        let bytes = codec.encode(&sample).unwrap();
        prop_assert_eq!(bytes.len(), codec.expected_size_of(&sample).unwrap());
        prop_assert_eq!(format::peek_frame_len(&bytes).unwrap(), bytes.len());

        let (back, read): (Sample, usize) = codec.decode(&bytes).unwrap();
        prop_assert_eq!(read, bytes.len());
        prop_assert_eq!(back, sample);
    }

    #[test]
    fn text_size_is_header_slot_length_and_utf8(text in "\\PC{0,64}") {
        let codec = Shapecode::new();
        let size = codec.expected_size(&Shape::Text, &Value::from(text.as_str())).unwrap();
        prop_assert_eq!(size, 4 + 1 + format::FINGERPRINT_WIDTH + 4 + text.len());
    }

    #[test]
    fn truncated_frames_never_decode(sample in arb_sample(), cut in 1usize..64) {
        let codec = Shapecode::new();
        let bytes = codec.encode(&sample).unwrap();
        let keep = bytes.len().saturating_sub(cut);
        prop_assert!(codec.decode::<Sample>(&bytes[..keep]).is_err());
    }
}
