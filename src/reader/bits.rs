//! Unpacking of flag bytes

/// Splits a byte into its bits, most significant first
pub fn byte_to_bits(byte: u8) -> [bool; 8] {
    let mut bits = [false; 8];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = byte & (0x80 >> i) != 0;
    }
    bits
}

/// Reads bits as an unsigned big-endian number
pub fn bits_to_uint(bits: &[bool]) -> u32 {
    bits.iter().fold(0, |value, &bit| value * 2 + u32::from(bit))
}

/// Consumes the fields of a packed flag byte from left to right
#[derive(Debug)]
pub struct FlagBits {
    bits: [bool; 8],
    pos: usize,
}

impl FlagBits {
    pub fn new(byte: u8) -> FlagBits {
        FlagBits {
            bits: byte_to_bits(byte),
            pos: 0,
        }
    }

    pub fn flag(&mut self) -> bool {
        let bit = self.bits.get(self.pos).copied().unwrap_or(false);
        self.pos += 1;
        bit
    }

    /// Next `n` bits as a number
    pub fn uint(&mut self, n: usize) -> u8 {
        let start = self.pos.min(self.bits.len());
        let end = (self.pos + n).min(self.bits.len());
        self.pos += n;
        bits_to_uint(&self.bits[start..end]) as u8
    }
}
