use zerocopy::byteorder::little_endian::U16 as U16LE;
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::constant::ServerStatusFlags;
use crate::error::{Error, Result, ServerError};
use crate::protocol::packet::Packet;

/// A decoded OK packet: `0x00`, lenenc affected rows, lenenc insert id,
/// status flags, warning count, then a human-readable message.
#[derive(Debug, Clone)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status_flags: ServerStatusFlags,
    pub warnings: u16,
    pub message: String,
}

impl OkPacket {
    pub fn parse(packet: &mut Packet) -> Result<Self> {
        let header = packet.read_u8()?;
        if header != 0x00 {
            return Err(Error::Interface(format!(
                "expected OK packet, got first byte 0x{header:02X}"
            )));
        }
        let affected_rows = packet.read_lenenc_int()?;
        let last_insert_id = packet.read_lenenc_int()?;
        let status = packet.read_u16()?;
        let warnings = packet.read_u16()?;
        let message = String::from_utf8_lossy(&packet.read_rest()).into_owned();
        Ok(Self {
            affected_rows,
            last_insert_id,
            status_flags: ServerStatusFlags::from_bits_truncate(status),
            warnings,
            message,
        })
    }
}

/// Decode an ERR packet into the SQLSTATE-classified [`ServerError`].
/// The `#`-prefixed SQLSTATE marker is only present under CLIENT_PROTOCOL_41.
pub fn parse_err_packet(packet: &mut Packet) -> Result<ServerError> {
    let header = packet.read_u8()?;
    if header != 0xFF {
        return Err(Error::Interface(format!(
            "expected ERR packet, got first byte 0x{header:02X}"
        )));
    }
    let code = packet.read_u16()?;
    let sql_state = if packet.remaining().first() == Some(&b'#') {
        let _ = packet.read_u8()?;
        let state = packet.read_bytes(5)?;
        Some(String::from_utf8_lossy(&state).into_owned())
    } else {
        None
    };
    let message = String::from_utf8_lossy(&packet.read_rest()).into_owned();
    Ok(ServerError::new(code, sql_state, message))
}

/// Fixed tail of the legacy EOF packet (after the 0xFE marker).
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
pub struct EofTail {
    warnings: U16LE,
    status_flags: U16LE,
}

#[derive(Debug, Clone, Copy)]
pub struct EofPacket {
    pub warnings: u16,
    pub status_flags: ServerStatusFlags,
}

/// Parse a legacy EOF packet: 0xFE marker, length < 9, then warnings and
/// status flags.
pub fn parse_eof_packet(packet: &Packet) -> Result<EofPacket> {
    if !packet.is_eof_packet() {
        return Err(Error::Interface(format!(
            "expected EOF packet, got first byte {:?}",
            packet.first_byte()
        )));
    }
    let body = &packet.as_bytes()[1..];
    if body.len() < 4 {
        // Ancient servers may omit the tail entirely.
        return Ok(EofPacket {
            warnings: 0,
            status_flags: ServerStatusFlags::empty(),
        });
    }
    let tail = EofTail::read_from_bytes(&body[..4])
        .map_err(|_| Error::Interface("malformed EOF packet".to_string()))?;
    Ok(EofPacket {
        warnings: tail.warnings.get(),
        status_flags: ServerStatusFlags::from_bits_truncate(tail.status_flags.get()),
    })
}
