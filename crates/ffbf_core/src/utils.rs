use byteorder::{LittleEndian as LE, WriteBytesExt};
use std::io::{self, ErrorKind, Read, Write};

pub fn write_u32<W: Write>(w: &mut W, v: u32) -> io::Result<()> { w.write_u32::<LE>(v) }

/// Reads one little-endian u32. `Ok(None)` on a clean end of stream;
/// a stream ending inside the word is `UnexpectedEof`.
pub fn read_u32_opt<R: Read>(r: &mut R) -> io::Result<Option<u32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0usize;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    match filled {
        0 => Ok(None),
        4 => Ok(Some(u32::from_le_bytes(buf))),
        _ => Err(io::Error::new(ErrorKind::UnexpectedEof, format!("truncated u32 ({filled} of 4 bytes)"))),
    }
}

#[inline]
pub fn rol32(word: u32, shift: u32) -> u32 { word.rotate_left(shift % 32) }

#[inline]
pub fn is_pow2(n: u64) -> bool { n != 0 && n & (n - 1) == 0 }
