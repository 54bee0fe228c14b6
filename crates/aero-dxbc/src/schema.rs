//! Row schemas shared by the table encoder and decoder.
//!
//! Every fixed-stride table row implements [`Row`] once, listing its fields in
//! physical order. The same `walk` drives [`RowWriter`], [`RowReader`] and
//! [`RowSizer`], so the encoded layout and the decoded layout cannot drift apart.

use crate::buffers::{BytesBuffer, BytesRef, IndexArrayLayout, IndexArrays, StringBuffer};
use crate::DxbcError;

/// Variable-length storage referenced from table rows.
#[derive(Debug, Clone)]
pub(crate) struct Buffers {
    pub strings: StringBuffer,
    pub indices: IndexArrays,
    pub bytes: BytesBuffer,
}

impl Buffers {
    pub fn new(dedup_strings: bool, layout: IndexArrayLayout) -> Self {
        Self {
            strings: StringBuffer::new(dedup_strings),
            indices: IndexArrays::new(layout),
            bytes: BytesBuffer::new(),
        }
    }
}

/// A table row whose fields are described by a single `walk`.
///
/// Rows may grow over versions. `W::version()` tells the row which layout is
/// being processed so newer trailing fields can be skipped for older layouts.
pub(crate) trait Row: Default + Clone {
    fn walk<W: FieldWalker>(&mut self, w: &mut W) -> Result<(), DxbcError>;
}

pub(crate) trait FieldWalker {
    /// Layout version of the row being walked.
    fn version(&self) -> u32;

    fn u8(&mut self, name: &'static str, v: &mut u8) -> Result<(), DxbcError>;
    fn u16(&mut self, name: &'static str, v: &mut u16) -> Result<(), DxbcError>;
    fn u32(&mut self, name: &'static str, v: &mut u32) -> Result<(), DxbcError>;
    /// Reserved bytes: written as zero, ignored when read.
    fn skip(&mut self, name: &'static str, len: usize) -> Result<(), DxbcError>;

    fn string(&mut self, name: &'static str, v: &mut String) -> Result<(), DxbcError>;
    fn index_array(
        &mut self,
        name: &'static str,
        v: &mut Vec<u32>,
        empty_is_null: bool,
    ) -> Result<(), DxbcError>;
    fn string_array(
        &mut self,
        name: &'static str,
        v: &mut Vec<String>,
        empty_is_null: bool,
    ) -> Result<(), DxbcError>;
    fn bytes(&mut self, name: &'static str, v: &mut Vec<u8>) -> Result<(), DxbcError>;
    /// An unprefixed index array whose length is stored in the `u8` at byte
    /// `count_at` of the same row.
    fn counted_index_array(
        &mut self,
        name: &'static str,
        v: &mut Vec<u32>,
        count_at: usize,
    ) -> Result<(), DxbcError>;
}

/// Walks a `u32` field stored through a conversion pair (enums, bitflags).
pub(crate) fn raw_u32<W, T>(
    w: &mut W,
    name: &'static str,
    v: &mut T,
    to_raw: impl Fn(&T) -> u32,
    from_raw: impl Fn(u32) -> T,
) -> Result<(), DxbcError>
where
    W: FieldWalker,
{
    let mut raw = to_raw(v);
    w.u32(name, &mut raw)?;
    *v = from_raw(raw);
    Ok(())
}

/// Walks a `u8` field stored through a conversion pair.
pub(crate) fn raw_u8<W, T>(
    w: &mut W,
    name: &'static str,
    v: &mut T,
    to_raw: impl Fn(&T) -> u8,
    from_raw: impl Fn(u8) -> T,
) -> Result<(), DxbcError>
where
    W: FieldWalker,
{
    let mut raw = to_raw(v);
    w.u8(name, &mut raw)?;
    *v = from_raw(raw);
    Ok(())
}

/// Byte size of `R` at layout `version`.
pub(crate) fn row_size<R: Row>(version: u32) -> usize {
    let mut sizer = RowSizer { version, size: 0 };
    // The sizer never fails.
    let _ = R::default().walk(&mut sizer);
    sizer.size
}

/// Picks the newest layout version (up to `max_version`) that fits in `stride`.
pub(crate) fn version_for_stride<R: Row>(stride: usize, max_version: u32) -> Option<u32> {
    (0..=max_version)
        .rev()
        .find(|&version| row_size::<R>(version) <= stride)
}

/// Encodes `rows` back to back at layout `version`.
pub(crate) fn encode_rows<R: Row>(
    rows: &[R],
    version: u32,
    buffers: &mut Buffers,
) -> Result<Vec<u8>, DxbcError> {
    let stride = row_size::<R>(version);
    let mut out = Vec::with_capacity(stride * rows.len());
    for row in rows {
        let start = out.len();
        let mut row = row.clone();
        let mut writer = RowWriter {
            version,
            out: &mut out,
            start,
            buffers: &mut *buffers,
        };
        row.walk(&mut writer)?;
        debug_assert_eq!(out.len() - start, stride);
    }
    Ok(out)
}

/// Decodes `count` rows of `stride` bytes, skipping bytes past the known layout.
pub(crate) fn decode_rows<R: Row>(
    table: &[u8],
    count: u32,
    stride: usize,
    version: u32,
    buffers: &Buffers,
    what: &'static str,
) -> Result<Vec<R>, DxbcError> {
    let count = count as usize;
    let needed = count
        .checked_mul(stride)
        .ok_or_else(|| DxbcError::malformed_header(format!("{what} table size overflows")))?;
    if needed > table.len() {
        return Err(DxbcError::out_of_bounds(format!(
            "{what} table needs {needed} bytes ({count} rows of {stride}), but only {} are present",
            table.len()
        )));
    }

    let mut rows = Vec::new();
    rows.try_reserve_exact(count).map_err(|_| {
        DxbcError::malformed_header(format!("{what} row count {count} is too large to allocate"))
    })?;
    for index in 0..count {
        let start = index * stride;
        let mut reader = RowReader {
            version,
            row: &table[start..start + stride],
            pos: 0,
            buffers,
            what,
            index,
        };
        let mut row = R::default();
        row.walk(&mut reader)?;
        rows.push(row);
    }
    Ok(rows)
}

/// Serializes fields as little-endian bytes, registering variable-length data.
pub(crate) struct RowWriter<'a> {
    version: u32,
    out: &'a mut Vec<u8>,
    start: usize,
    buffers: &'a mut Buffers,
}

impl<'a> RowWriter<'a> {
    /// Writer for a single row that is not part of a table (chunk headers).
    pub fn new(version: u32, out: &'a mut Vec<u8>, buffers: &'a mut Buffers) -> Self {
        let start = out.len();
        Self {
            version,
            out,
            start,
            buffers,
        }
    }
}

impl FieldWalker for RowWriter<'_> {
    fn version(&self) -> u32 {
        self.version
    }

    fn u8(&mut self, _name: &'static str, v: &mut u8) -> Result<(), DxbcError> {
        self.out.push(*v);
        Ok(())
    }

    fn u16(&mut self, _name: &'static str, v: &mut u16) -> Result<(), DxbcError> {
        self.out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn u32(&mut self, _name: &'static str, v: &mut u32) -> Result<(), DxbcError> {
        self.out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn skip(&mut self, _name: &'static str, len: usize) -> Result<(), DxbcError> {
        self.out.resize(self.out.len() + len, 0);
        Ok(())
    }

    fn string(&mut self, name: &'static str, v: &mut String) -> Result<(), DxbcError> {
        let mut offset = self.buffers.strings.make_ref(v)?;
        self.u32(name, &mut offset)
    }

    fn index_array(
        &mut self,
        name: &'static str,
        v: &mut Vec<u32>,
        empty_is_null: bool,
    ) -> Result<(), DxbcError> {
        let mut offset = self.buffers.indices.make_ref(v, empty_is_null)?;
        self.u32(name, &mut offset)
    }

    fn string_array(
        &mut self,
        name: &'static str,
        v: &mut Vec<String>,
        empty_is_null: bool,
    ) -> Result<(), DxbcError> {
        let offsets = v
            .iter()
            .map(|s| self.buffers.strings.make_ref(s))
            .collect::<Result<Vec<_>, _>>()?;
        let mut offset = self.buffers.indices.make_ref(&offsets, empty_is_null)?;
        self.u32(name, &mut offset)
    }

    fn bytes(&mut self, name: &'static str, v: &mut Vec<u8>) -> Result<(), DxbcError> {
        let BytesRef {
            mut offset,
            mut size,
        } = self.buffers.bytes.make_ref(v)?;
        self.u32(name, &mut offset)?;
        self.u32(name, &mut size)
    }

    fn counted_index_array(
        &mut self,
        name: &'static str,
        v: &mut Vec<u32>,
        count_at: usize,
    ) -> Result<(), DxbcError> {
        debug_assert!(self.out.len() - self.start < count_at);
        let mut offset = self.buffers.indices.make_ref(v, false)?;
        self.u32(name, &mut offset)
    }
}

/// Reads fields from one row, resolving references against decoded buffers.
pub(crate) struct RowReader<'a> {
    version: u32,
    row: &'a [u8],
    pos: usize,
    buffers: &'a Buffers,
    what: &'static str,
    index: usize,
}

impl<'a> RowReader<'a> {
    /// Reader for a single row that is not part of a table (chunk headers).
    pub fn new(version: u32, row: &'a [u8], buffers: &'a Buffers, what: &'static str) -> Self {
        Self {
            version,
            row,
            pos: 0,
            buffers,
            what,
            index: 0,
        }
    }

    fn take(&mut self, name: &'static str, len: usize) -> Result<&'a [u8], DxbcError> {
        let end = self.pos + len;
        let bytes = self.row.get(self.pos..end).ok_or_else(|| {
            DxbcError::out_of_bounds(format!(
                "{} row {} field {name} at {}..{end} is outside row of {} bytes",
                self.what,
                self.index,
                self.pos,
                self.row.len()
            ))
        })?;
        self.pos = end;
        Ok(bytes)
    }

    fn ref_error(&self, name: &'static str, err: DxbcError) -> DxbcError {
        DxbcError::invalid_chunk(format!(
            "{} row {} field {name}: {}",
            self.what,
            self.index,
            err.context()
        ))
    }
}

impl FieldWalker for RowReader<'_> {
    fn version(&self) -> u32 {
        self.version
    }

    fn u8(&mut self, name: &'static str, v: &mut u8) -> Result<(), DxbcError> {
        *v = self.take(name, 1)?[0];
        Ok(())
    }

    fn u16(&mut self, name: &'static str, v: &mut u16) -> Result<(), DxbcError> {
        let b = self.take(name, 2)?;
        *v = u16::from_le_bytes([b[0], b[1]]);
        Ok(())
    }

    fn u32(&mut self, name: &'static str, v: &mut u32) -> Result<(), DxbcError> {
        let b = self.take(name, 4)?;
        *v = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        Ok(())
    }

    fn skip(&mut self, name: &'static str, len: usize) -> Result<(), DxbcError> {
        self.take(name, len).map(|_| ())
    }

    fn string(&mut self, name: &'static str, v: &mut String) -> Result<(), DxbcError> {
        let mut offset = 0;
        self.u32(name, &mut offset)?;
        let s = self
            .buffers
            .strings
            .get(offset)
            .map_err(|e| self.ref_error(name, e))?;
        *v = s.to_owned();
        Ok(())
    }

    fn index_array(
        &mut self,
        name: &'static str,
        v: &mut Vec<u32>,
        _empty_is_null: bool,
    ) -> Result<(), DxbcError> {
        let mut offset = 0;
        self.u32(name, &mut offset)?;
        *v = self
            .buffers
            .indices
            .get(offset)
            .map_err(|e| self.ref_error(name, e))?;
        Ok(())
    }

    fn string_array(
        &mut self,
        name: &'static str,
        v: &mut Vec<String>,
        empty_is_null: bool,
    ) -> Result<(), DxbcError> {
        let mut offsets = Vec::new();
        self.index_array(name, &mut offsets, empty_is_null)?;
        *v = offsets
            .into_iter()
            .map(|offset| self.buffers.strings.get(offset).map(str::to_owned))
            .collect::<Result<_, _>>()
            .map_err(|e| self.ref_error(name, e))?;
        Ok(())
    }

    fn bytes(&mut self, name: &'static str, v: &mut Vec<u8>) -> Result<(), DxbcError> {
        let mut offset = 0;
        let mut size = 0;
        self.u32(name, &mut offset)?;
        self.u32(name, &mut size)?;
        *v = self
            .buffers
            .bytes
            .get(BytesRef { offset, size })
            .map_err(|e| self.ref_error(name, e))?
            .to_vec();
        Ok(())
    }

    fn counted_index_array(
        &mut self,
        name: &'static str,
        v: &mut Vec<u32>,
        count_at: usize,
    ) -> Result<(), DxbcError> {
        let mut offset = 0;
        self.u32(name, &mut offset)?;
        let count = *self.row.get(count_at).ok_or_else(|| {
            DxbcError::out_of_bounds(format!(
                "{} row {} count for {name} at byte {count_at} is outside the row",
                self.what, self.index
            ))
        })?;
        *v = self
            .buffers
            .indices
            .get_sized(offset, u32::from(count))
            .map_err(|e| self.ref_error(name, e))?;
        Ok(())
    }
}

/// Computes the encoded size of a row without touching any buffer.
struct RowSizer {
    version: u32,
    size: usize,
}

impl FieldWalker for RowSizer {
    fn version(&self) -> u32 {
        self.version
    }

    fn u8(&mut self, _: &'static str, _: &mut u8) -> Result<(), DxbcError> {
        self.size += 1;
        Ok(())
    }

    fn u16(&mut self, _: &'static str, _: &mut u16) -> Result<(), DxbcError> {
        self.size += 2;
        Ok(())
    }

    fn u32(&mut self, _: &'static str, _: &mut u32) -> Result<(), DxbcError> {
        self.size += 4;
        Ok(())
    }

    fn skip(&mut self, _: &'static str, len: usize) -> Result<(), DxbcError> {
        self.size += len;
        Ok(())
    }

    fn string(&mut self, _: &'static str, _: &mut String) -> Result<(), DxbcError> {
        self.size += 4;
        Ok(())
    }

    fn index_array(&mut self, _: &'static str, _: &mut Vec<u32>, _: bool) -> Result<(), DxbcError> {
        self.size += 4;
        Ok(())
    }

    fn string_array(
        &mut self,
        _: &'static str,
        _: &mut Vec<String>,
        _: bool,
    ) -> Result<(), DxbcError> {
        self.size += 4;
        Ok(())
    }

    fn bytes(&mut self, _: &'static str, _: &mut Vec<u8>) -> Result<(), DxbcError> {
        self.size += 8;
        Ok(())
    }

    fn counted_index_array(
        &mut self,
        _: &'static str,
        _: &mut Vec<u32>,
        _: usize,
    ) -> Result<(), DxbcError> {
        self.size += 4;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Sample {
        id: u32,
        name: String,
        tags: Vec<u32>,
        extra: u16,
    }

    impl Row for Sample {
        fn walk<W: FieldWalker>(&mut self, w: &mut W) -> Result<(), DxbcError> {
            w.u32("id", &mut self.id)?;
            w.string("name", &mut self.name)?;
            w.index_array("tags", &mut self.tags, true)?;
            if w.version() >= 1 {
                w.u16("extra", &mut self.extra)?;
                w.skip("pad", 2)?;
            }
            Ok(())
        }
    }

    #[test]
    fn sizes_follow_version() {
        assert_eq!(row_size::<Sample>(0), 12);
        assert_eq!(row_size::<Sample>(1), 16);
        assert_eq!(version_for_stride::<Sample>(12, 1), Some(0));
        assert_eq!(version_for_stride::<Sample>(20, 1), Some(1));
        assert_eq!(version_for_stride::<Sample>(8, 1), None);
    }

    #[test]
    fn rows_survive_encode_and_decode() {
        let rows = vec![
            Sample {
                id: 7,
                name: "alpha".into(),
                tags: vec![1, 2],
                extra: 3,
            },
            Sample {
                id: 9,
                name: String::new(),
                tags: Vec::new(),
                extra: 0,
            },
        ];
        let mut buffers = Buffers::new(true, IndexArrayLayout::LengthPrefixed);
        let bytes = encode_rows(&rows, 1, &mut buffers).unwrap();
        assert_eq!(bytes.len(), 32);

        let decoded: Vec<Sample> = decode_rows(&bytes, 2, 16, 1, &buffers, "sample").unwrap();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn older_layout_skips_newer_fields_and_wider_strides_are_tolerated() {
        let row = Sample {
            id: 1,
            name: "x".into(),
            tags: vec![4],
            extra: 5,
        };
        let mut buffers = Buffers::new(true, IndexArrayLayout::LengthPrefixed);
        let mut bytes = encode_rows(&[row.clone()], 1, &mut buffers).unwrap();
        bytes.extend_from_slice(&[0xAA; 4]);

        let decoded: Vec<Sample> = decode_rows(&bytes, 1, 20, 0, &buffers, "sample").unwrap();
        assert_eq!(
            decoded,
            vec![Sample {
                extra: 0,
                ..row
            }]
        );
    }

    #[test]
    fn truncated_tables_are_rejected() {
        let buffers = Buffers::new(true, IndexArrayLayout::LengthPrefixed);
        let err = decode_rows::<Sample>(&[0; 10], 1, 12, 0, &buffers, "sample").unwrap_err();
        assert!(matches!(err, DxbcError::OutOfBounds { .. }));
    }
}
