//! File persistence.
//!
//! Files hold one or more frames back-to-back with no extra header. Saving goes through
//! a `BufWriter`; loading memory-maps the file and walks frames by bytes consumed.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use memmap2::Mmap;

use crate::api::Shapecode;
use crate::error::{Result, ShapecodeError};
use crate::shape::Shape;
use crate::value::Value;

fn map_file(path: &Path) -> Result<Option<Mmap>> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(None);
    }
    // Safety: the mapping is only read, and the file is assumed not to be modified by
    // another process while it is mapped.
    #[allow(unsafe_code)]
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Some(mmap))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}

impl Shapecode {
    /// Writes one frame to a new file at `path`, truncating any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P, shape: &Shape, value: &Value) -> Result<usize> {
        let path = path.as_ref();
        let frame = self.serialize(shape, value)?;
        write_file(path, &frame)?;
        tracing::debug!(path = %path.display(), bytes = frame.len(), "saved frame");
        Ok(frame.len())
    }

    /// Reads the single frame stored at `path`.
    ///
    /// # Errors
    /// [`ShapecodeError::Format`] if the file is empty or holds bytes past the frame.
    pub fn load<P: AsRef<Path>>(&self, path: P, shape: &Shape) -> Result<Value> {
        let path = path.as_ref();
        let mmap = map_file(path)?
            .ok_or_else(|| ShapecodeError::Format(format!("{} is empty", path.display())))?;
        let (value, read) = self.read(&mmap, shape)?;
        if read != mmap.len() {
            return Err(ShapecodeError::Format(format!(
                "{} trailing bytes after the frame",
                mmap.len() - read
            )));
        }
        Ok(value)
    }

    /// Encodes `values` in parallel and writes them back-to-back to `path`.
    pub fn save_all<P: AsRef<Path>>(&self, path: P, shape: &Shape, values: &[Value]) -> Result<usize> {
        let path = path.as_ref();
        let (buffer, _) = self.serialize_batch(shape, values)?;
        write_file(path, &buffer)?;
        tracing::debug!(
            path = %path.display(),
            frames = values.len(),
            bytes = buffer.len(),
            "saved frames"
        );
        Ok(buffer.len())
    }

    /// Reads every frame stored at `path`, in order. An empty file holds no frames.
    pub fn load_all<P: AsRef<Path>>(&self, path: P, shape: &Shape) -> Result<Vec<Value>> {
        let Some(mmap) = map_file(path.as_ref())? else {
            return Ok(Vec::new());
        };
        let mut values = Vec::new();
        let mut offset = 0;
        while offset < mmap.len() {
            let (value, read) = self.read(&mmap[offset..], shape)?;
            values.push(value);
            offset += read;
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyRegistry;
    use std::sync::Arc;

    #[test]
    fn empty_file_handling() {
        let codec = Shapecode::builder()
            .registry(Arc::new(StrategyRegistry::new()))
            .build();
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            codec.load(file.path(), &Shape::Text),
            Err(ShapecodeError::Format(_))
        ));
        assert!(codec.load_all(file.path(), &Shape::Text).unwrap().is_empty());
    }
}
