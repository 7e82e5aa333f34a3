use std::borrow::Cow;

use super::decoder::DecodingError;

/// Sequential reader over an immutable byte buffer
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: Cow<'a, [u8]>,
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new<D: Into<Cow<'a, [u8]>>>(data: D) -> ByteCursor<'a> {
        ByteCursor {
            data: data.into(),
            pos: 0,
        }
    }

    /// Offset of the next byte to be read
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodingError> {
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => Err(DecodingError::OutOfBounds { offset: self.pos }),
        }
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8], DecodingError> {
        if n > self.remaining() {
            return Err(DecodingError::OutOfBounds { offset: self.pos });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodingError> {
        let mut arr = [0; N];
        arr.copy_from_slice(self.read_bytes(N)?);
        Ok(arr)
    }

    /// Reads `n` bytes, one character per byte
    pub fn read_string(&mut self, n: usize) -> Result<String, DecodingError> {
        Ok(self.read_bytes(n)?.iter().map(|&b| char::from(b)).collect())
    }

    pub fn read_u16_le(&mut self) -> Result<u16, DecodingError> {
        let [lo, hi] = self.read_array::<2>()?;
        Ok(u16::from(lo) | u16::from(hi) << 8)
    }
}
