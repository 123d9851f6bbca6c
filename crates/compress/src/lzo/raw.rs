//! Raw LZO1X block encoder and decoder.
//!
//! Blocks produced here are plain LZO1X streams: a sequence of literal-run
//! and match instructions terminated by the three-byte end marker
//! `0x11 0x00 0x00`. They are readable by any LZO1X decompressor, and the
//! decoder accepts blocks produced by the reference `lzo1x_1` compressor.
//!
//! # Instruction set
//!
//! ```text
//! 0000LLLL                  literal run of L+3 bytes (L = 0: extended length)
//! 0001HLLL  DDDDDDSS DDDDDDDD   M4 match, distance 16385..=49151
//! 001LLLLL  DDDDDDSS DDDDDDDD   M3 match, distance 1..=16384
//! LLLDDDSS  DDDDDDDD            M2 match, length 3..=8, distance 1..=2048
//! ```
//!
//! `SS` is the number of literals (0..=3) copied straight after a match.
//! Longer runs use a separate literal instruction.
//!
//! The encoder is a greedy single-probe hash matcher. It emits only matches
//! of at least [`MIN_MATCH`] bytes, every one of which is shorter than the
//! bytes it replaces, which keeps the output within [`max_compressed_len`].

use crate::codec::CodecError;

/// Shortest match the encoder emits.
pub const MIN_MATCH: usize = 4;

/// Largest match distance representable in the format.
pub const MAX_OFFSET: usize = 0xBFFF;

/// Three-byte end-of-stream marker.
pub const END_MARKER: [u8; 3] = [0x11, 0x00, 0x00];

/// Number of index bits in the encoder's hash table.
pub const DICT_BITS: u32 = 14;

const DICT_SIZE: usize = 1 << DICT_BITS;
const M2_MAX_LEN: usize = 8;
const M2_MAX_OFFSET: usize = 0x0800;
const M3_MAX_LEN: usize = 33;
const M3_MAX_OFFSET: usize = 0x4000;
const M4_MAX_LEN: usize = 9;
const M3_MARKER: u8 = 0x20;
const M4_MARKER: u8 = 0x10;
const FIRST_LITERAL_MAX: usize = 238;
const SHORT_LITERAL_MAX: usize = 18;

/// Worst-case size of an LZO1X block holding `len` input bytes.
#[must_use]
pub const fn max_compressed_len(len: usize) -> usize {
    len + len / 16 + 64 + 3
}

/// Hash table mapping four-byte sequences to their last position.
///
/// Allocated once per codec instance and cleared at the start of every block.
#[derive(Clone, Debug)]
pub struct Dictionary {
    table: Vec<u32>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary {
    /// Allocates an empty hash table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: vec![0; DICT_SIZE],
        }
    }

    fn reset(&mut self) {
        self.table.fill(0);
    }
}

/// Compresses `src` into `dst`, returning the compressed length.
///
/// Fails with [`CodecError::OutputOverrun`] if `dst` runs out of space; a
/// buffer of [`max_compressed_len`] bytes never does.
pub fn compress_into(
    src: &[u8],
    dst: &mut [u8],
    dict: &mut Dictionary,
) -> Result<usize, CodecError> {
    // Positions are stored biased by one in a u32 table.
    if src.len() >= u32::MAX as usize {
        return Err(CodecError::Error);
    }
    dict.reset();

    let mut out = Output::new(dst);
    let mut ip = 0;
    let mut anchor = 0;

    if src.len() >= MIN_MATCH {
        let last = src.len() - MIN_MATCH;
        while ip <= last {
            let sequence = read_u32(src, ip);
            let slot = hash(sequence);
            let candidate = dict.table[slot] as usize;
            dict.table[slot] = (ip + 1) as u32;

            if candidate != 0 {
                let candidate = candidate - 1;
                let distance = ip - candidate;
                if distance <= MAX_OFFSET && read_u32(src, candidate) == sequence {
                    let mut len = MIN_MATCH;
                    while ip + len < src.len() && src[candidate + len] == src[ip + len] {
                        len += 1;
                    }
                    out.literals(&src[anchor..ip])?;
                    out.copy_match(distance, len)?;
                    ip += len;
                    anchor = ip;
                    continue;
                }
            }
            ip += 1;
        }
    }

    out.literals(&src[anchor..])?;
    out.extend(&END_MARKER)?;
    Ok(out.pos)
}

/// Compresses `src` into a new [`Vec`].
pub fn compress_to_vec(src: &[u8], dict: &mut Dictionary) -> Result<Vec<u8>, CodecError> {
    let mut output = vec![0u8; max_compressed_len(src.len())];
    let written = compress_into(src, &mut output, dict)?;
    output.truncate(written);
    Ok(output)
}

/// Decompresses one LZO1X block from `src` into `dst`.
///
/// Every read and write is bounds-checked: malformed input yields an error
/// and never touches memory outside `dst`.
pub fn decompress_into(src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
    let mut input = Input { src, pos: 0 };
    let mut op = 0;
    let mut state = 0;

    match src.first() {
        None => return Err(CodecError::InputOverrun),
        Some(&first) if first > 17 => {
            input.pos = 1;
            let run = usize::from(first - 17);
            copy_literals(&mut input, dst, &mut op, run)?;
            state = run.min(4);
        }
        Some(_) => {}
    }

    loop {
        if input.pos == src.len() {
            return Err(CodecError::EofNotFound);
        }
        let t = usize::from(input.byte()?);
        let (distance, len, trailing);

        if t < 16 {
            match state {
                0 => {
                    let run = if t == 0 {
                        SHORT_LITERAL_MAX + input.extended_length()?
                    } else {
                        t + 3
                    };
                    copy_literals(&mut input, dst, &mut op, run)?;
                    state = 4;
                    continue;
                }
                4 => {
                    trailing = t & 3;
                    let high = usize::from(input.byte()?);
                    distance = 1 + M2_MAX_OFFSET + (t >> 2) + (high << 2);
                    len = 3;
                }
                _ => {
                    trailing = t & 3;
                    let high = usize::from(input.byte()?);
                    distance = 1 + (t >> 2) + (high << 2);
                    len = 2;
                }
            }
        } else if t >= 64 {
            trailing = t & 3;
            let high = usize::from(input.byte()?);
            distance = 1 + ((t >> 2) & 7) + (high << 3);
            len = (t >> 5) + 1;
        } else if t >= 32 {
            let code = t & 31;
            len = 2 + if code == 0 {
                31 + input.extended_length()?
            } else {
                code
            };
            let word = usize::from(input.u16()?);
            distance = 1 + (word >> 2);
            trailing = word & 3;
        } else {
            let code = t & 7;
            len = 2 + if code == 0 {
                7 + input.extended_length()?
            } else {
                code
            };
            let word = usize::from(input.u16()?);
            let offset = ((t & 8) << 11) + (word >> 2);
            if offset == 0 {
                if len != 3 {
                    return Err(CodecError::Error);
                }
                return if input.pos == src.len() {
                    Ok(op)
                } else {
                    Err(CodecError::InputNotConsumed)
                };
            }
            distance = offset + M3_MAX_OFFSET;
            trailing = word & 3;
        }

        copy_match(dst, &mut op, distance, len)?;
        copy_literals(&mut input, dst, &mut op, trailing)?;
        state = trailing;
    }
}

/// Decompresses `src` into a new [`Vec`] of at most `max_len` bytes.
pub fn decompress_to_vec(src: &[u8], max_len: usize) -> Result<Vec<u8>, CodecError> {
    let mut output = vec![0u8; max_len];
    let written = decompress_into(src, &mut output)?;
    output.truncate(written);
    Ok(output)
}

fn hash(sequence: u32) -> usize {
    (sequence.wrapping_mul(0x9E37_79B1) >> (32 - DICT_BITS)) as usize
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

struct Output<'a> {
    buf: &'a mut [u8],
    pos: usize,
    // Index of the byte whose low two bits count the literals after the last match.
    trailing_slot: Option<usize>,
}

impl<'a> Output<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            trailing_slot: None,
        }
    }

    fn push(&mut self, byte: u8) -> Result<(), CodecError> {
        let slot = self.buf.get_mut(self.pos).ok_or(CodecError::OutputOverrun)?;
        *slot = byte;
        self.pos += 1;
        Ok(())
    }

    fn extend(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        let end = self.pos + bytes.len();
        self.buf
            .get_mut(self.pos..end)
            .ok_or(CodecError::OutputOverrun)?
            .copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    fn extended_length(&mut self, mut remaining: usize) -> Result<(), CodecError> {
        while remaining > 255 {
            self.push(0)?;
            remaining -= 255;
        }
        self.push(remaining as u8)
    }

    fn literals(&mut self, run: &[u8]) -> Result<(), CodecError> {
        if run.is_empty() {
            return Ok(());
        }
        match self.trailing_slot.take() {
            Some(slot) if run.len() <= 3 => self.buf[slot] |= run.len() as u8,
            _ if self.pos == 0 && run.len() <= FIRST_LITERAL_MAX => {
                self.push((17 + run.len()) as u8)?;
            }
            _ if run.len() <= SHORT_LITERAL_MAX => self.push((run.len() - 3) as u8)?,
            _ => {
                self.push(0)?;
                self.extended_length(run.len() - SHORT_LITERAL_MAX)?;
            }
        }
        self.extend(run)
    }

    fn copy_match(&mut self, distance: usize, len: usize) -> Result<(), CodecError> {
        if len <= M2_MAX_LEN && distance <= M2_MAX_OFFSET {
            let d = distance - 1;
            self.trailing_slot = Some(self.pos);
            self.push((((len - 1) << 5) | ((d & 7) << 2)) as u8)?;
            self.push((d >> 3) as u8)
        } else if distance <= M3_MAX_OFFSET {
            let d = distance - 1;
            if len <= M3_MAX_LEN {
                self.push(M3_MARKER | (len - 2) as u8)?;
            } else {
                self.push(M3_MARKER)?;
                self.extended_length(len - M3_MAX_LEN)?;
            }
            self.trailing_slot = Some(self.pos);
            self.push((d << 2) as u8)?;
            self.push((d >> 6) as u8)
        } else {
            let d = distance - M3_MAX_OFFSET;
            let high = ((d >> 11) & 8) as u8;
            if len <= M4_MAX_LEN {
                self.push(M4_MARKER | high | (len - 2) as u8)?;
            } else {
                self.push(M4_MARKER | high)?;
                self.extended_length(len - M4_MAX_LEN)?;
            }
            let low = d & 0x3FFF;
            self.trailing_slot = Some(self.pos);
            self.push((low << 2) as u8)?;
            self.push((low >> 6) as u8)
        }
    }
}

struct Input<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Input<'a> {
    fn byte(&mut self) -> Result<u8, CodecError> {
        let byte = *self.src.get(self.pos).ok_or(CodecError::InputOverrun)?;
        self.pos += 1;
        Ok(byte)
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        let low = self.byte()?;
        let high = self.byte()?;
        Ok(u16::from_le_bytes([low, high]))
    }

    fn extended_length(&mut self) -> Result<usize, CodecError> {
        let mut zeros = 0usize;
        loop {
            match self.byte()? {
                0 => zeros += 1,
                byte => return Ok(zeros * 255 + usize::from(byte)),
            }
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self.pos.checked_add(len).ok_or(CodecError::InputOverrun)?;
        let bytes = self
            .src
            .get(self.pos..end)
            .ok_or(CodecError::InputOverrun)?;
        self.pos = end;
        Ok(bytes)
    }
}

fn copy_literals(
    input: &mut Input<'_>,
    dst: &mut [u8],
    op: &mut usize,
    len: usize,
) -> Result<(), CodecError> {
    if len == 0 {
        return Ok(());
    }
    let literals = input.take(len)?;
    let end = *op + len;
    dst.get_mut(*op..end)
        .ok_or(CodecError::OutputOverrun)?
        .copy_from_slice(literals);
    *op = end;
    Ok(())
}

fn copy_match(
    dst: &mut [u8],
    op: &mut usize,
    distance: usize,
    len: usize,
) -> Result<(), CodecError> {
    if distance > *op {
        return Err(CodecError::LookBehindOverrun);
    }
    let end = *op + len;
    if end > dst.len() {
        return Err(CodecError::OutputOverrun);
    }
    let start = *op - distance;
    if distance >= len {
        dst.copy_within(start..start + len, *op);
    } else {
        // Overlapping copy: each byte may come from this same match.
        for i in 0..len {
            dst[*op + i] = dst[start + i];
        }
    }
    *op = end;
    Ok(())
}
