//! GIF flavoured LZW decompression
use log::{trace, warn};

use super::blocks::grow;
use super::decoder::DecodingError;

type Code = u16;

const MAX_CODE_SIZE: u8 = 12;
/// Codes are at most 12 bits wide
const MAX_ENTRIES: usize = 1 << MAX_CODE_SIZE;
/// Pixel indices are bytes, so larger alphabets cannot be represented
const MAX_MIN_CODE_SIZE: u8 = 8;
const ARENA_CAPACITY: usize = 4096;

/// Dictionary entry, a view into the arena
#[derive(Debug, Copy, Clone)]
struct Entry {
    offset: usize,
    len: usize,
}

impl Entry {
    fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Reads variable width codes, least significant bit first
struct CodeReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u32,
    bits: u8,
}

impl<'a> CodeReader<'a> {
    fn new(data: &'a [u8]) -> CodeReader<'a> {
        CodeReader {
            data,
            pos: 0,
            acc: 0,
            bits: 0,
        }
    }

    /// Returns `None` once the data cannot fill a whole code
    fn read(&mut self, size: u8) -> Option<Code> {
        while self.bits < size {
            let byte = *self.data.get(self.pos)?;
            self.pos += 1;
            self.acc |= u32::from(byte) << self.bits;
            self.bits += 8;
        }
        let code = (self.acc & ((1 << size) - 1)) as Code;
        self.acc >>= size;
        self.bits -= size;
        Some(code)
    }
}

/// LZW decoder for one image
///
/// The dictionary is a list of `(offset, len)` views into a single byte arena.
/// The first `clear_code` bytes of the arena hold the single-byte roots; every
/// entry added while decoding is appended behind them and dropped again on a
/// clear code. State carries over between calls to [`decode`](LzwDecoder::decode).
#[derive(Debug)]
pub struct LzwDecoder {
    min_code_size: u8,
    clear_code: Code,
    end_code: Code,
    code_size: u8,
    dict: Vec<Entry>,
    arena: Vec<u8>,
    limit: Option<usize>,
    stop_after: Option<usize>,
}

impl LzwDecoder {
    pub fn new(min_code_size: u8) -> Result<LzwDecoder, DecodingError> {
        if min_code_size == 0 || min_code_size > MAX_MIN_CODE_SIZE {
            return Err(DecodingError::Format("invalid LZW minimum code size"));
        }
        let clear_code: Code = 1 << min_code_size;
        let mut arena = Vec::with_capacity(ARENA_CAPACITY);
        let mut dict = Vec::with_capacity(MAX_ENTRIES);
        for i in 0..clear_code {
            arena.push(i as u8);
            dict.push(Entry {
                offset: usize::from(i),
                len: 1,
            });
        }
        // empty entry for the clear code, placeholder for the end code
        dict.push(Entry { offset: 0, len: 0 });
        dict.push(Entry { offset: 0, len: 0 });
        Ok(LzwDecoder {
            min_code_size,
            clear_code,
            end_code: clear_code + 1,
            code_size: min_code_size + 1,
            dict,
            arena,
            limit: None,
            stop_after: None,
        })
    }

    /// Fails with `LimitsExceeded` instead of producing more than `limit` bytes
    pub fn with_limit(mut self, limit: Option<usize>) -> LzwDecoder {
        self.limit = limit;
        self
    }

    /// Ends decoding once `len` bytes have been produced, dropping any surplus
    pub fn stop_after(mut self, len: Option<usize>) -> LzwDecoder {
        self.stop_after = len;
        self
    }

    pub fn code_size(&self) -> u8 {
        self.code_size
    }

    /// Number of dictionary entries, including the clear and end codes
    pub fn dict_len(&self) -> usize {
        self.dict.len()
    }

    fn reset(&mut self) {
        let roots = usize::from(self.clear_code);
        self.dict.truncate(roots + 2);
        self.arena.truncate(roots);
        self.code_size = self.min_code_size + 1;
    }

    /// Appends `dict[prev]` extended by `first`. Full tables stay full until the next clear code.
    fn push_entry(&mut self, prev: Code, first: u8) {
        if self.dict.len() >= MAX_ENTRIES {
            return;
        }
        let base = self.dict[usize::from(prev)];
        let offset = self.arena.len();
        grow(&mut self.arena, base.len + 1);
        self.arena.extend_from_within(base.range());
        self.arena.push(first);
        self.dict.push(Entry {
            offset,
            len: base.len + 1,
        });
    }

    fn first_byte(&self, code: Code) -> u8 {
        let entry = self.dict[usize::from(code)];
        self.arena[entry.offset]
    }

    /// Decodes a complete code stream. `size_hint` is the expected output length.
    pub fn decode(&mut self, data: &[u8], size_hint: usize) -> Result<Vec<u8>, DecodingError> {
        let mut reader = CodeReader::new(data);
        let mut output = Vec::with_capacity(size_hint);
        let mut prev: Option<Code> = None;
        loop {
            let code = match reader.read(self.code_size) {
                Some(code) => code,
                None => {
                    warn!(
                        "LZW data ended without end code after {} bytes",
                        output.len()
                    );
                    break;
                }
            };
            if code == self.clear_code {
                trace!("LZW clear code after {} bytes", output.len());
                self.reset();
                prev = None;
                continue;
            }
            if code == self.end_code {
                break;
            }
            let next = self.dict.len();
            let index = usize::from(code);
            if index < next {
                if let Some(prev) = prev {
                    let first = self.first_byte(code);
                    self.push_entry(prev, first);
                }
            } else if index == next {
                let prev = prev.ok_or(DecodingError::InvalidCode { code, next })?;
                let first = self.first_byte(prev);
                self.push_entry(prev, first);
            } else {
                return Err(DecodingError::InvalidCode { code, next });
            }
            let entry = *self
                .dict
                .get(index)
                .ok_or(DecodingError::InvalidCode { code, next })?;
            let take = match self.stop_after {
                Some(len) => entry.len.min(len.saturating_sub(output.len())),
                None => entry.len,
            };
            if let Some(limit) = self.limit {
                if output.len() + take > limit {
                    return Err(DecodingError::LimitsExceeded { limit });
                }
            }
            grow(&mut output, take);
            output.extend_from_slice(&self.arena[entry.offset..entry.offset + take]);

            if self.dict.len() == 1 << self.code_size && self.code_size < MAX_CODE_SIZE {
                self.code_size += 1;
                trace!("LZW code size now {}", self.code_size);
            }
            prev = Some(code);

            if let Some(len) = self.stop_after {
                if output.len() >= len {
                    if take < entry.len || reader.read(self.code_size) != Some(self.end_code) {
                        warn!("LZW data continues past {} bytes", len);
                    }
                    break;
                }
            }
        }
        Ok(output)
    }
}

/// Decodes a complete code stream with a fresh dictionary
pub fn decode(min_code_size: u8, data: &[u8]) -> Result<Vec<u8>, DecodingError> {
    LzwDecoder::new(min_code_size)?.decode(data, data.len() * 2)
}

#[cfg(test)]
mod test {
    use super::*;

    /// Packs `(code, width)` pairs least significant bit first
    fn pack(codes: &[(u16, u8)]) -> Vec<u8> {
        let mut out = Vec::new();
        let (mut acc, mut bits) = (0u32, 0u8);
        for &(code, size) in codes {
            acc |= u32::from(code) << bits;
            bits += size;
            while bits >= 8 {
                out.push(acc as u8);
                acc >>= 8;
                bits -= 8;
            }
        }
        if bits > 0 {
            out.push(acc as u8);
        }
        out
    }

    #[test]
    fn clear_then_end_is_empty() {
        let mut decoder = LzwDecoder::new(2).unwrap();
        let out = decoder.decode(&pack(&[(4, 3), (5, 3)]), 0).unwrap();
        assert!(out.is_empty());
        assert_eq!(decoder.dict_len(), 6);
    }

    #[test]
    fn repeat_case() {
        // 1, then the not yet known code 6 = [1, 1], then 1 again
        let data = pack(&[(4, 3), (1, 3), (6, 3), (1, 3), (5, 4)]);
        let mut decoder = LzwDecoder::new(2).unwrap();
        assert_eq!(decoder.decode(&data, 4).unwrap(), vec![1, 1, 1, 1]);
        assert_eq!(decoder.dict_len(), 8);
        assert_eq!(decoder.code_size(), 4);
    }

    #[test]
    fn clear_resets_mid_stream() {
        let without_clear = pack(&[(4, 3), (1, 3), (1, 3), (1, 3), (5, 4)]);
        let mut decoder = LzwDecoder::new(2).unwrap();
        assert_eq!(decoder.decode(&without_clear, 3).unwrap(), vec![1, 1, 1]);
        assert_eq!(decoder.dict_len(), 8);
        assert_eq!(decoder.code_size(), 4);

        let with_clear = pack(&[(4, 3), (1, 3), (1, 3), (1, 3), (4, 4), (2, 3), (5, 3)]);
        let mut decoder = LzwDecoder::new(2).unwrap();
        assert_eq!(decoder.decode(&with_clear, 4).unwrap(), vec![1, 1, 1, 2]);
        assert_eq!(decoder.dict_len(), 6);
        assert_eq!(decoder.code_size(), 3);
    }

    #[test]
    fn first_code_after_clear_adds_nothing() {
        let data = pack(&[(4, 3), (0, 3), (4, 3), (3, 3), (5, 3)]);
        let mut decoder = LzwDecoder::new(2).unwrap();
        assert_eq!(decoder.decode(&data, 2).unwrap(), vec![0, 3]);
        assert_eq!(decoder.dict_len(), 6);
    }

    #[test]
    fn skipped_index_is_invalid() {
        // the dictionary holds 6 entries after the first code, so 7 skips one
        let data = pack(&[(4, 3), (1, 3), (7, 3), (5, 3)]);
        match LzwDecoder::new(2).unwrap().decode(&data, 0) {
            Err(DecodingError::InvalidCode { code: 7, next: 6 }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn repeat_without_previous_code_is_invalid() {
        let data = pack(&[(4, 3), (6, 3)]);
        assert!(matches!(
            decode(2, &data),
            Err(DecodingError::InvalidCode { code: 6, next: 6 })
        ));
    }

    #[test]
    fn missing_end_code() {
        // 6 bits of codes padded to a byte, the 2 padding bits are not a whole code
        let data = pack(&[(4, 3), (2, 3)]);
        assert_eq!(decode(2, &data).unwrap(), vec![2]);
    }

    #[test]
    fn rejects_unusable_code_sizes() {
        assert!(LzwDecoder::new(0).is_err());
        assert!(LzwDecoder::new(9).is_err());
        assert!(LzwDecoder::new(1).is_ok());
    }

    #[test]
    fn output_limit() {
        let data = pack(&[(4, 3), (1, 3), (6, 3), (1, 3), (5, 4)]);
        let mut decoder = LzwDecoder::new(2).unwrap().with_limit(Some(2));
        assert!(matches!(
            decoder.decode(&data, 0),
            Err(DecodingError::LimitsExceeded { limit: 2 })
        ));
    }

    #[test]
    fn full_table_stays_full() {
        // every code after the first is the entry it creates, 6 = [0, 0], 7 = [0, 0, 0] ...
        let mut codes = vec![(4, 3), (0, 3)];
        let (mut len, mut size) = (6usize, 3u8);
        for code in 6..4096u16 {
            codes.push((code, size));
            len += 1;
            if len == 1 << size && size < 12 {
                size += 1;
            }
        }
        assert_eq!(size, 12);
        codes.extend_from_slice(&[(4095, 12), (4095, 12), (1, 12), (5, 12)]);
        let mut decoder = LzwDecoder::new(2).unwrap();
        let out = decoder.decode(&pack(&codes), 0).unwrap();
        let created: usize = (6..4096).map(|code| code - 4).sum();
        assert_eq!(out.len(), 1 + created + 2 * 4091 + 1);
        assert_eq!(out.len(), 8_378_369);
        assert!(out[..out.len() - 1].iter().all(|&b| b == 0));
        assert_eq!(out.last(), Some(&1));
        assert_eq!(decoder.dict_len(), 4096);
        assert_eq!(decoder.code_size(), 12);
    }

    #[test]
    fn stops_after_expected_output() {
        // 7 is not a valid code here but is never reached
        let data = pack(&[(4, 3), (1, 3), (7, 3), (5, 3)]);
        let mut decoder = LzwDecoder::new(2).unwrap().stop_after(Some(1));
        assert_eq!(decoder.decode(&data, 1).unwrap(), vec![1]);

        let data = pack(&[(4, 3), (1, 3), (6, 3), (1, 3), (5, 4)]);
        let mut decoder = LzwDecoder::new(2).unwrap().stop_after(Some(2));
        assert_eq!(decoder.decode(&data, 2).unwrap(), vec![1, 1]);
    }

    fn encode(min_code_size: u8, data: &[u8]) -> Vec<u8> {
        weezl::encode::Encoder::new(weezl::BitOrder::Lsb, min_code_size)
            .encode(data)
            .unwrap()
    }

    #[test]
    fn long_stream_matches_encoder() {
        // pseudo random bytes fill the table up to 12 bit codes and force clears
        let mut state = 0x2545_f491u32;
        let input: Vec<u8> = (0..100_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect();
        assert_eq!(decode(8, &encode(8, &input)).unwrap(), input);
    }

    #[test]
    fn runs_match_encoder() {
        let input: Vec<u8> = (0..20_000u32).map(|i| ((i / 97) % 4) as u8).collect();
        assert_eq!(decode(2, &encode(2, &input)).unwrap(), input);
    }
}
