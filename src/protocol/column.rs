use crate::constant::{ColumnFlags, ColumnType};
use crate::error::{Error, Result};
use crate::protocol::packet::Packet;

/// Per-column metadata decoded from a ColumnDefinition41 packet.
///
/// Only `name`, `column_type`, `flags`, `charset`, and `column_length`
/// influence row decoding; the rest is retained for the user-visible
/// description tuple.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub org_table: String,
    pub name: String,
    pub org_name: String,
    pub charset: u16,
    pub column_length: u32,
    pub column_type: ColumnType,
    pub flags: ColumnFlags,
    pub decimals: u8,
}

impl FieldDescriptor {
    pub fn parse(packet: &mut Packet) -> Result<Self> {
        let catalog = lossy(packet.read_lenenc_bytes()?);
        let schema = lossy(packet.read_lenenc_bytes()?);
        let table = lossy(packet.read_lenenc_bytes()?);
        let org_table = lossy(packet.read_lenenc_bytes()?);
        let name = lossy(packet.read_lenenc_bytes()?);
        let org_name = lossy(packet.read_lenenc_bytes()?);

        // length of the fixed tail, always 0x0c
        let _fixed_len = packet.read_lenenc_int()?;

        let charset = packet.read_u16()?;
        let column_length = packet.read_u32()?;
        let type_byte = packet.read_u8()?;
        let column_type = ColumnType::from_u8(type_byte)
            .ok_or_else(|| Error::Interface(format!("unknown column type 0x{type_byte:02X}")))?;
        let flags = ColumnFlags::from_bits_truncate(packet.read_u16()?);
        let decimals = packet.read_u8()?;

        Ok(Self {
            catalog,
            schema,
            table,
            org_table,
            name,
            org_name,
            charset,
            column_length,
            column_type,
            flags,
            decimals,
        })
    }

    pub fn null_ok(&self) -> bool {
        !self.flags.contains(ColumnFlags::NOT_NULL_FLAG)
    }

    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(ColumnFlags::UNSIGNED_FLAG)
    }

    /// Whether the cell bytes are opaque binary rather than text in the
    /// column's charset. Collation id 63 is the dedicated binary pseudo
    /// charset.
    pub fn is_binary(&self) -> bool {
        self.charset == 63 || self.flags.contains(ColumnFlags::BINARY_FLAG)
    }

    pub fn description(&self) -> ColumnDescription {
        ColumnDescription {
            name: self.name.clone(),
            type_code: self.column_type,
            display_size: None,
            internal_size: self.column_length,
            precision: self.column_length,
            scale: self.decimals,
            null_ok: self.null_ok(),
        }
    }
}

/// The user-visible seven-field projection of a column descriptor.
#[derive(Debug, Clone)]
pub struct ColumnDescription {
    pub name: String,
    pub type_code: ColumnType,
    pub display_size: Option<u32>,
    pub internal_size: u32,
    pub precision: u32,
    pub scale: u8,
    pub null_ok: bool,
}

fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}
