//! Deduplicating buffers shared by the RDAT and PSV codecs.
//!
//! Tables never embed variable-length data inline. Strings, index lists and raw
//! byte blobs live in one of the buffers below and rows refer to them by offset.

use hashbrown::HashMap;

use crate::DxbcError;

/// Sentinel reference for an absent index array.
pub const NULL_REF: u32 = u32::MAX;

/// Blob of NUL-terminated strings. Offset 0 is always the empty string.
#[derive(Debug, Clone)]
pub struct StringBuffer {
    data: Vec<u8>,
    dedup: bool,
    starts: HashMap<String, u32>,
}

impl StringBuffer {
    /// Creates an empty buffer. With `dedup` set, identical strings share storage.
    pub fn new(dedup: bool) -> Self {
        Self {
            data: vec![0],
            dedup,
            starts: HashMap::new(),
        }
    }

    /// Wraps raw buffer contents read from a chunk.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            dedup: false,
            starts: HashMap::new(),
        }
    }

    /// Returns the offset of `s`, appending it unless an identical string was
    /// already stored and deduplication is enabled.
    pub fn make_ref(&mut self, s: &str) -> Result<u32, DxbcError> {
        if s.is_empty() {
            return Ok(0);
        }
        if s.as_bytes().contains(&0) {
            return Err(DxbcError::invalid_data(format!(
                "string {s:?} contains an interior NUL"
            )));
        }
        if self.dedup {
            if let Some(&offset) = self.starts.get(s) {
                return Ok(offset);
            }
        }

        let offset = u32::try_from(self.data.len())
            .map_err(|_| DxbcError::invalid_data("string buffer exceeds 4 GiB"))?;
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);
        if self.dedup {
            self.starts.insert(s.to_owned(), offset);
        }
        Ok(offset)
    }

    /// Reads the string starting at `offset`.
    pub fn get(&self, offset: u32) -> Result<&str, DxbcError> {
        let start = offset as usize;
        let tail = self.data.get(start..).ok_or_else(|| {
            DxbcError::out_of_bounds(format!(
                "string offset {offset} is outside string buffer length {}",
                self.data.len()
            ))
        })?;
        let nul = tail.iter().position(|&b| b == 0).ok_or_else(|| {
            DxbcError::invalid_chunk(format!(
                "string at offset {offset} is missing a null terminator"
            ))
        })?;
        core::str::from_utf8(&tail[..nul]).map_err(|_| {
            DxbcError::invalid_chunk(format!("string at offset {offset} is not valid UTF-8"))
        })
    }

    /// Raw buffer contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Storage layout of an [`IndexArrays`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexArrayLayout {
    /// Each array is preceded by its element count.
    LengthPrefixed,
    /// Arrays carry no count; readers supply the length out of band.
    Unprefixed,
}

/// Buffer of `u32` index lists, referenced by word offset.
#[derive(Debug, Clone)]
pub struct IndexArrays {
    data: Vec<u32>,
    layout: IndexArrayLayout,
    starts: HashMap<Vec<u32>, u32>,
}

impl IndexArrays {
    /// Creates an empty buffer with the given layout.
    pub fn new(layout: IndexArrayLayout) -> Self {
        Self {
            data: Vec::new(),
            layout,
            starts: HashMap::new(),
        }
    }

    /// Decodes a buffer from little-endian words.
    pub fn from_bytes(bytes: &[u8], layout: IndexArrayLayout) -> Result<Self, DxbcError> {
        if bytes.len() % 4 != 0 {
            return Err(DxbcError::invalid_chunk(format!(
                "index array buffer length {} is not a multiple of 4",
                bytes.len()
            )));
        }
        let data = bytes
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect();
        Ok(Self {
            data,
            layout,
            starts: HashMap::new(),
        })
    }

    /// Returns the layout this buffer was created with.
    pub fn layout(&self) -> IndexArrayLayout {
        self.layout
    }

    /// Returns a reference to `indices`, storing them if no reusable run exists.
    ///
    /// With `empty_is_null`, an empty list maps to [`NULL_REF`] and nothing is stored.
    pub fn make_ref(&mut self, indices: &[u32], empty_is_null: bool) -> Result<u32, DxbcError> {
        if empty_is_null && indices.is_empty() {
            return Ok(NULL_REF);
        }

        match self.layout {
            IndexArrayLayout::LengthPrefixed => {
                if let Some(&offset) = self.starts.get(indices) {
                    return Ok(offset);
                }
                let offset = self.next_offset()?;
                let count = u32::try_from(indices.len())
                    .map_err(|_| DxbcError::invalid_data("index array is too long"))?;
                self.data.push(count);
                self.data.extend_from_slice(indices);
                self.starts.insert(indices.to_vec(), offset);
                Ok(offset)
            }
            IndexArrayLayout::Unprefixed => {
                // Any run already in the buffer can be reused, including the
                // leading part of a longer array stored earlier.
                let n = indices.len();
                if n <= self.data.len() {
                    if let Some(pos) = (0..=self.data.len() - n)
                        .find(|&i| self.data[i..i + n] == *indices)
                    {
                        return u32::try_from(pos)
                            .map_err(|_| DxbcError::invalid_data("index array buffer is too long"));
                    }
                }
                let offset = self.next_offset()?;
                self.data.extend_from_slice(indices);
                Ok(offset)
            }
        }
    }

    /// Reads a length-prefixed array. [`NULL_REF`] yields an empty list.
    pub fn get(&self, offset: u32) -> Result<Vec<u32>, DxbcError> {
        if offset == NULL_REF {
            return Ok(Vec::new());
        }
        let start = offset as usize;
        let count = *self.data.get(start).ok_or_else(|| {
            DxbcError::out_of_bounds(format!(
                "index array offset {offset} is outside buffer of {} words",
                self.data.len()
            ))
        })?;
        self.get_sized(offset.saturating_add(1), count)
    }

    /// Reads `len` words starting at `offset`.
    pub fn get_sized(&self, offset: u32, len: u32) -> Result<Vec<u32>, DxbcError> {
        if offset == NULL_REF {
            return Ok(Vec::new());
        }
        let start = offset as usize;
        let end = start.checked_add(len as usize).ok_or_else(|| {
            DxbcError::out_of_bounds(format!("index array {offset}+{len} overflows"))
        })?;
        self.data
            .get(start..end)
            .map(<[u32]>::to_vec)
            .ok_or_else(|| {
                DxbcError::out_of_bounds(format!(
                    "index array {start}..{end} is outside buffer of {} words",
                    self.data.len()
                ))
            })
    }

    /// Number of stored words.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stored words.
    pub fn words(&self) -> &[u32] {
        &self.data
    }

    /// Little-endian encoding of the stored words.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn next_offset(&self) -> Result<u32, DxbcError> {
        u32::try_from(self.data.len())
            .map_err(|_| DxbcError::invalid_data("index array buffer is too long"))
    }
}

/// Reference to a blob in a [`BytesBuffer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BytesRef {
    /// Byte offset of the blob.
    pub offset: u32,
    /// Blob length in bytes.
    pub size: u32,
}

/// Buffer of raw byte blobs such as serialized root signatures.
#[derive(Debug, Clone, Default)]
pub struct BytesBuffer {
    data: Vec<u8>,
    blobs: HashMap<Vec<u8>, u32>,
}

impl BytesBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps raw buffer contents read from a chunk.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            blobs: HashMap::new(),
        }
    }

    /// Stores `blob` unless an identical blob was stored before.
    pub fn make_ref(&mut self, blob: &[u8]) -> Result<BytesRef, DxbcError> {
        let size = u32::try_from(blob.len())
            .map_err(|_| DxbcError::invalid_data("byte blob exceeds 4 GiB"))?;
        if blob.is_empty() {
            return Ok(BytesRef { offset: 0, size });
        }
        if let Some(&offset) = self.blobs.get(blob) {
            return Ok(BytesRef { offset, size });
        }
        let offset = u32::try_from(self.data.len())
            .map_err(|_| DxbcError::invalid_data("byte buffer exceeds 4 GiB"))?;
        self.data.extend_from_slice(blob);
        self.blobs.insert(blob.to_vec(), offset);
        Ok(BytesRef { offset, size })
    }

    /// Returns the bytes named by `r`.
    pub fn get(&self, r: BytesRef) -> Result<&[u8], DxbcError> {
        let start = r.offset as usize;
        let end = start
            .checked_add(r.size as usize)
            .ok_or_else(|| DxbcError::out_of_bounds("byte reference overflows"))?;
        self.data.get(start..end).ok_or_else(|| {
            DxbcError::out_of_bounds(format!(
                "byte reference {start}..{end} is outside buffer length {}",
                self.data.len()
            ))
        })
    }

    /// Raw buffer contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn string_buffer_starts_with_empty_string() {
        let mut strings = StringBuffer::new(true);
        assert_eq!(strings.as_bytes(), &[0]);
        assert_eq!(strings.make_ref("").unwrap(), 0);
        assert_eq!(strings.get(0).unwrap(), "");
    }

    #[test]
    fn string_buffer_dedups_only_when_enabled() {
        let mut dedup = StringBuffer::new(true);
        let a = dedup.make_ref("tex").unwrap();
        let b = dedup.make_ref("tex").unwrap();
        assert_eq!(a, b);
        assert_eq!(dedup.as_bytes(), b"\0tex\0");

        let mut plain = StringBuffer::new(false);
        let a = plain.make_ref("tex").unwrap();
        let b = plain.make_ref("tex").unwrap();
        assert_ne!(a, b);
        assert_eq!(plain.get(b).unwrap(), "tex");
        assert_eq!(plain.as_bytes(), b"\0tex\0tex\0");
    }

    #[test]
    fn string_buffer_does_not_match_string_suffixes() {
        let mut strings = StringBuffer::new(true);
        strings.make_ref("mytex").unwrap();
        let tex = strings.make_ref("tex").unwrap();
        assert_eq!(tex, 7);
    }

    #[test]
    fn string_buffer_rejects_bad_offsets() {
        let strings = StringBuffer::from_bytes(b"\0abc");
        assert!(matches!(strings.get(1), Err(DxbcError::InvalidChunk { .. })));
        assert!(matches!(strings.get(9), Err(DxbcError::OutOfBounds { .. })));
    }

    #[test]
    fn prefixed_arrays_dedup_exact_matches() {
        let mut arrays = IndexArrays::new(IndexArrayLayout::LengthPrefixed);
        let a = arrays.make_ref(&[1, 2, 3], true).unwrap();
        let b = arrays.make_ref(&[1, 2], true).unwrap();
        let c = arrays.make_ref(&[1, 2, 3], true).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 4);
        assert_eq!(c, a);
        assert_eq!(arrays.words(), &[3, 1, 2, 3, 2, 1, 2]);
        assert_eq!(arrays.get(b).unwrap(), vec![1, 2]);
    }

    #[test]
    fn empty_arrays_can_be_null() {
        let mut arrays = IndexArrays::new(IndexArrayLayout::LengthPrefixed);
        assert_eq!(arrays.make_ref(&[], true).unwrap(), NULL_REF);
        assert!(arrays.is_empty());
        assert_eq!(arrays.get(NULL_REF).unwrap(), Vec::<u32>::new());

        assert_eq!(arrays.make_ref(&[], false).unwrap(), 0);
        assert_eq!(arrays.words(), &[0]);
    }

    #[test]
    fn unprefixed_arrays_reuse_any_matching_run() {
        let mut arrays = IndexArrays::new(IndexArrayLayout::Unprefixed);
        let long = arrays.make_ref(&[0, 1, 2, 3], false).unwrap();
        let prefix = arrays.make_ref(&[0, 1], false).unwrap();
        let inner = arrays.make_ref(&[2, 3], false).unwrap();
        let fresh = arrays.make_ref(&[3, 4], false).unwrap();
        assert_eq!(long, 0);
        assert_eq!(prefix, 0);
        assert_eq!(inner, 2);
        assert_eq!(fresh, 4);
        assert_eq!(arrays.words(), &[0, 1, 2, 3, 3, 4]);
        assert_eq!(arrays.get_sized(inner, 2).unwrap(), vec![2, 3]);
    }

    #[test]
    fn bytes_buffer_dedups_whole_blobs() {
        let mut bytes = BytesBuffer::new();
        let a = bytes.make_ref(&[1, 2, 3]).unwrap();
        let b = bytes.make_ref(&[4, 5]).unwrap();
        let c = bytes.make_ref(&[1, 2, 3]).unwrap();
        let d = bytes.make_ref(&[2, 3]).unwrap();
        assert_eq!(a, BytesRef { offset: 0, size: 3 });
        assert_eq!(b, BytesRef { offset: 3, size: 2 });
        assert_eq!(c, a);
        assert_eq!(d, BytesRef { offset: 5, size: 2 });
        assert_eq!(bytes.get(b).unwrap(), &[4, 5]);
    }
}
