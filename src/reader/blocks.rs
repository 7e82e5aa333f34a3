use std::cmp;

use crate::types::ColorTable;

use super::cursor::ByteCursor;
use super::decoder::DecodingError;

/// Initial capacity of a sub-block buffer, one maximal sub-block
const SUB_BLOCK_CAPACITY: usize = 256;

/// Makes room for `additional` bytes, at least doubling the capacity when it runs out
pub(crate) fn grow(buf: &mut Vec<u8>, additional: usize) {
    let needed = buf.len() + additional;
    if needed > buf.capacity() {
        let capacity = cmp::max(buf.capacity() * 2, needed);
        buf.reserve_exact(capacity - buf.len());
    }
}

/// Reads length prefixed sub-blocks up to and including the zero length terminator
/// and returns their concatenated contents.
pub fn read_sub_blocks(
    cursor: &mut ByteCursor,
    limit: Option<usize>,
) -> Result<Vec<u8>, DecodingError> {
    let mut data = Vec::with_capacity(SUB_BLOCK_CAPACITY);
    loop {
        let size = usize::from(cursor.read_byte()?);
        if size == 0 {
            break;
        }
        if let Some(limit) = limit {
            if data.len() + size > limit {
                return Err(DecodingError::LimitsExceeded { limit });
            }
        }
        grow(&mut data, size);
        data.extend_from_slice(cursor.read_bytes(size)?);
    }
    Ok(data)
}

/// Reads `entries` RGB triplets
pub fn read_color_table(
    cursor: &mut ByteCursor,
    entries: usize,
) -> Result<ColorTable, DecodingError> {
    let mut table = Vec::with_capacity(entries);
    for _ in 0..entries {
        table.push(cursor.read_array::<3>()?);
    }
    Ok(ColorTable { entries: table })
}
