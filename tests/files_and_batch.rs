#![allow(missing_docs)]

use std::io::Write;

use shapecode::{Result, Shapecode, ShapecodeError, ShapecodeObject, Shaped, Value, shape_of};
use tempfile::{NamedTempFile, tempdir};

#[derive(Clone, Debug, PartialEq, ShapecodeObject)]
struct Reading {
    sensor: String,
    samples: Vec<f32>,
    note: Option<String>,
}

fn reading(i: usize) -> Reading {
    Reading {
        sensor: format!("s-{i}"),
        samples: (0..i).map(|n| n as f32 * 0.5).collect(),
        note: (i % 2 == 0).then(|| "even".to_owned()),
    }
}

#[test]
fn save_and_load_a_single_frame() -> Result<()> {
    let codec = Shapecode::new();
    let dir = tempdir()?;
    let path = dir.path().join("reading.bin");
    let shape = shape_of::<Reading>();
    let value = reading(3).to_value();

    let written = codec.save(&path, &shape, &value)?;
    assert_eq!(written, codec.expected_size(&shape, &value)?);
    assert_eq!(std::fs::metadata(&path)?.len() as usize, written);
    assert_eq!(Reading::from_value(codec.load(&path, &shape)?)?, reading(3));
    Ok(())
}

#[test]
fn trailing_bytes_after_a_single_frame_are_rejected() -> Result<()> {
    let codec = Shapecode::new();
    let shape = shape_of::<Reading>();
    let mut file = NamedTempFile::new()?;
    file.write_all(&codec.serialize(&shape, &reading(1).to_value())?)?;
    file.write_all(&[0xAB])?;
    file.flush()?;
    assert!(matches!(
        codec.load(file.path(), &shape),
        Err(ShapecodeError::Format(_))
    ));
    Ok(())
}

#[test]
fn batch_frames_sit_back_to_back_in_input_order() -> Result<()> {
    let codec = Shapecode::new();
    let shape = shape_of::<Reading>();
    let values: Vec<Value> = (0..64).map(|i| reading(i).to_value()).collect();

    let (buffer, sizes) = codec.serialize_batch(&shape, &values)?;
    assert_eq!(sizes.len(), values.len());
    assert_eq!(buffer.len(), sizes.iter().sum::<usize>());

    let mut offset = 0;
    for (i, size) in sizes.iter().enumerate() {
        let frame = &buffer[offset..offset + size];
        assert_eq!(frame, codec.serialize(&shape, &values[i])?.as_slice());
        offset += size;
    }
    Ok(())
}

#[test]
fn batch_surfaces_the_first_bad_value() {
    let codec = Shapecode::new();
    let shape = shape_of::<Reading>();
    let values = vec![reading(1).to_value(), Value::U8(0), reading(2).to_value()];
    assert!(matches!(
        codec.serialize_batch(&shape, &values),
        Err(ShapecodeError::ValueMismatch { .. })
    ));
}

#[test]
fn save_all_and_load_all() -> Result<()> {
    let codec = Shapecode::new();
    let shape = shape_of::<Reading>();
    let originals: Vec<Reading> = (0..10).map(reading).collect();
    let values: Vec<Value> = originals.iter().map(Shaped::to_value).collect();

    let file = NamedTempFile::new()?;
    let bytes = codec.save_all(file.path(), &shape, &values)?;
    assert_eq!(std::fs::read(file.path())?.len(), bytes);

    let loaded = codec
        .load_all(file.path(), &shape)?
        .into_iter()
        .map(Reading::from_value)
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(loaded, originals);

    let empty = NamedTempFile::new()?;
    assert_eq!(codec.save_all(empty.path(), &shape, &[])?, 0);
    assert!(codec.load_all(empty.path(), &shape)?.is_empty());
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let codec = Shapecode::new();
    let dir = tempdir().unwrap();
    assert!(matches!(
        codec.load(dir.path().join("absent.bin"), &shape_of::<Reading>()),
        Err(ShapecodeError::Io(_))
    ));
}
