//! Wire primitives: little-endian fixed-width integers, length-encoded
//! integers and strings, NUL-terminated strings. Readers take a slice and
//! return the value plus the unread remainder.

use crate::error::{Error, Result};

fn eof() -> Error {
    Error::Interface("unexpected end of packet".to_string())
}

pub fn read_int_1(data: &[u8]) -> Result<(u8, &[u8])> {
    match data.split_first() {
        Some((&b, rest)) => Ok((b, rest)),
        None => Err(eof()),
    }
}

pub fn read_int_2(data: &[u8]) -> Result<(u16, &[u8])> {
    if data.len() < 2 {
        return Err(eof());
    }
    Ok((u16::from_le_bytes([data[0], data[1]]), &data[2..]))
}

pub fn read_int_3(data: &[u8]) -> Result<(u32, &[u8])> {
    if data.len() < 3 {
        return Err(eof());
    }
    Ok((u32::from_le_bytes([data[0], data[1], data[2], 0]), &data[3..]))
}

pub fn read_int_4(data: &[u8]) -> Result<(u32, &[u8])> {
    if data.len() < 4 {
        return Err(eof());
    }
    Ok((
        u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
        &data[4..],
    ))
}

pub fn read_int_6(data: &[u8]) -> Result<(u64, &[u8])> {
    if data.len() < 6 {
        return Err(eof());
    }
    let value = u64::from_le_bytes([data[0], data[1], data[2], data[3], data[4], data[5], 0, 0]);
    Ok((value, &data[6..]))
}

pub fn read_int_8(data: &[u8]) -> Result<(u64, &[u8])> {
    if data.len() < 8 {
        return Err(eof());
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[..8]);
    Ok((u64::from_le_bytes(bytes), &data[8..]))
}

/// Length-encoded integer: 1, 3, 4, or 9 bytes depending on magnitude.
/// 0xFB (NULL marker) and 0xFF (ERR header) are not valid first bytes.
pub fn read_int_lenenc(data: &[u8]) -> Result<(u64, &[u8])> {
    let (first, rest) = read_int_1(data)?;
    match first {
        0xFC => {
            let (val, rest) = read_int_2(rest)?;
            Ok((val as u64, rest))
        }
        0xFD => {
            let (val, rest) = read_int_3(rest)?;
            Ok((val as u64, rest))
        }
        0xFE => {
            let (val, rest) = read_int_8(rest)?;
            Ok((val, rest))
        }
        0xFB | 0xFF => Err(Error::Interface(format!(
            "invalid length-encoded integer prefix 0x{first:02X}"
        ))),
        val => Ok((val as u64, rest)),
    }
}

pub fn read_bytes_fix(data: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    if data.len() < len {
        return Err(eof());
    }
    Ok(data.split_at(len))
}

pub fn read_bytes_null(data: &[u8]) -> Result<(&[u8], &[u8])> {
    match data.iter().position(|&b| b == 0) {
        Some(idx) => Ok((&data[..idx], &data[idx + 1..])),
        None => Err(eof()),
    }
}

pub fn read_bytes_lenenc(data: &[u8]) -> Result<(&[u8], &[u8])> {
    let (len, rest) = read_int_lenenc(data)?;
    read_bytes_fix(rest, len as usize)
}

pub fn write_int_1(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

pub fn write_int_2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_int_3(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..3]);
}

pub fn write_int_4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_int_lenenc(out: &mut Vec<u8>, value: u64) {
    if value < 251 {
        out.push(value as u8);
    } else if value < (1 << 16) {
        out.push(0xFC);
        write_int_2(out, value as u16);
    } else if value < (1 << 24) {
        out.push(0xFD);
        write_int_3(out, value as u32);
    } else {
        out.push(0xFE);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

pub fn write_bytes_null(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(data);
    out.push(0);
}

pub fn write_bytes_lenenc(out: &mut Vec<u8>, data: &[u8]) {
    write_int_lenenc(out, data.len() as u64);
    out.extend_from_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fixed_width_ints() {
        assert_eq!(read_int_1(&[0x7F, 1]).unwrap(), (0x7F, &[1u8][..]));
        assert_eq!(read_int_2(&[0x34, 0x12]).unwrap().0, 0x1234);
        assert_eq!(read_int_3(&[0x56, 0x34, 0x12]).unwrap().0, 0x123456);
        assert_eq!(read_int_4(&[0x78, 0x56, 0x34, 0x12]).unwrap().0, 0x12345678);
        assert_eq!(
            read_int_6(&[1, 0, 0, 0, 0, 0x80]).unwrap().0,
            0x800000000001
        );
        assert_eq!(read_int_8(&[1, 0, 0, 0, 0, 0, 0, 0x80]).unwrap().0, 1 | (0x80u64 << 56));
        assert!(read_int_4(&[1, 2, 3]).is_err());
    }

    #[test]
    fn lenenc_int_round_trip() {
        for value in [0u64, 250, 251, 0xFFFF, 0x10000, 0xFFFFFF, 0x1000000, u64::MAX] {
            let mut buf = Vec::new();
            write_int_lenenc(&mut buf, value);
            let (read, rest) = read_int_lenenc(&buf).unwrap();
            assert_eq!(read, value);
            assert!(rest.is_empty());
        }
    }

    #[test]
    fn lenenc_int_rejects_packet_markers() {
        assert!(read_int_lenenc(&[0xFB]).is_err());
        assert!(read_int_lenenc(&[0xFF]).is_err());
    }

    #[test]
    fn strings() {
        let (s, rest) = read_bytes_null(b"abc\0def").unwrap();
        assert_eq!(s, b"abc");
        assert_eq!(rest, b"def");
        assert!(read_bytes_null(b"abc").is_err());

        let mut buf = Vec::new();
        write_bytes_lenenc(&mut buf, b"hello");
        let (s, rest) = read_bytes_lenenc(&buf).unwrap();
        assert_eq!(s, b"hello");
        assert!(rest.is_empty());
    }
}
