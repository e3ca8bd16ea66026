use crate::constant::CapabilityFlags;
use crate::error::{Error, Result};
use crate::protocol::packet::Packet;
use crate::protocol::primitive::*;
use crate::protocol::response::parse_err_packet;

pub const DEFAULT_AUTH_PLUGIN: &str = "mysql_native_password";

/// Initial handshake packet from the server (Protocol::HandshakeV10).
///
/// ```text
/// 1   protocol version (10)
/// n   server version (null-terminated)
/// 4   thread id
/// 8   auth-plugin-data part 1
/// 1   [00] filler
/// 2   capability flags (lower)
/// --- everything below is optional ---
/// 1   character set
/// 2   status flags
/// 2   capability flags (upper)
/// 1   auth plugin data length
/// 10  reserved
/// n   auth-plugin-data part 2: max(13, len - 8) bytes, trailing NUL dropped
/// n   auth plugin name (null-terminated)
/// ```
#[derive(Debug, Clone)]
pub struct InitialHandshake {
    pub protocol_version: u8,
    pub server_version: String,
    pub thread_id: u32,
    pub salt: Vec<u8>,
    pub capabilities: CapabilityFlags,
    pub charset: u8,
    pub status_flags: u16,
    pub auth_plugin_name: String,
}

impl InitialHandshake {
    pub fn parse(packet: &mut Packet) -> Result<Self> {
        // A server refusing the connection outright greets with ERR.
        if packet.is_err_packet() {
            return Err(parse_err_packet(packet)?.into());
        }

        let protocol_version = packet.read_u8()?;
        let server_version = String::from_utf8_lossy(&packet.read_null_terminated()?).into_owned();
        let thread_id = packet.read_u32()?;
        let mut salt = packet.read_bytes(8)?;
        let _filler = packet.read_u8()?;
        let capabilities_lo = packet.read_u16()?;

        let mut capabilities = capabilities_lo as u32;
        let mut charset = 0;
        let mut status_flags = 0;
        let mut auth_plugin_name = String::new();

        if !packet.remaining().is_empty() {
            charset = packet.read_u8()?;
            status_flags = packet.read_u16()?;
            capabilities |= (packet.read_u16()? as u32) << 16;

            let salt_len = packet.read_u8()?;
            let _reserved = packet.read_bytes(10)?;

            if salt_len > 0 {
                let rest_len = (salt_len as usize).saturating_sub(8).max(13);
                let part2 = packet.read_bytes(rest_len)?;
                salt.extend_from_slice(&part2[..rest_len - 1]);
            }
            if !packet.remaining().is_empty() {
                auth_plugin_name =
                    String::from_utf8_lossy(&packet.read_null_terminated()?).into_owned();
            }
        }

        if auth_plugin_name.is_empty() {
            auth_plugin_name = DEFAULT_AUTH_PLUGIN.to_string();
        }

        Ok(Self {
            protocol_version,
            server_version,
            thread_id,
            salt,
            capabilities: CapabilityFlags::from_bits_retain(capabilities),
            charset,
            status_flags,
            auth_plugin_name,
        })
    }
}

/// The fixed 32-byte prefix shared by SSLRequest and HandshakeResponse41:
/// client flags, max packet size (always 1), charset id, 23 zero bytes.
fn write_response_header(out: &mut Vec<u8>, capabilities: CapabilityFlags, charset_id: u8) {
    write_int_4(out, capabilities.bits());
    write_int_4(out, 1);
    write_int_1(out, charset_id);
    out.extend_from_slice(&[0u8; 23]);
}

/// The short SSLRequest frame sent before upgrading the transport to TLS.
pub fn write_ssl_request(out: &mut Vec<u8>, capabilities: CapabilityFlags, charset_id: u8) {
    write_response_header(out, capabilities, charset_id);
}

pub struct HandshakeResponse<'a> {
    pub capabilities: CapabilityFlags,
    pub server_capabilities: CapabilityFlags,
    pub charset_id: u8,
    pub user: &'a [u8],
    pub auth_response: &'a [u8],
    pub database: Option<&'a [u8]>,
    pub auth_plugin_name: &'a str,
    pub zstd_compression_level: u8,
}

/// Serialize HandshakeResponse41. The auth response is length-prefixed when
/// the server speaks CLIENT_SECURE_CONNECTION, NUL-terminated otherwise.
pub fn write_handshake_response(out: &mut Vec<u8>, response: &HandshakeResponse<'_>) {
    write_response_header(out, response.capabilities, response.charset_id);
    write_bytes_null(out, response.user);

    if response
        .server_capabilities
        .contains(CapabilityFlags::CLIENT_SECURE_CONNECTION)
    {
        write_int_1(out, response.auth_response.len() as u8);
        out.extend_from_slice(response.auth_response);
    } else {
        write_bytes_null(out, response.auth_response);
    }

    if let Some(db) = response.database {
        if response
            .server_capabilities
            .contains(CapabilityFlags::CLIENT_CONNECT_WITH_DB)
        {
            write_bytes_null(out, db);
        }
    }

    if response
        .server_capabilities
        .contains(CapabilityFlags::CLIENT_PLUGIN_AUTH)
    {
        write_bytes_null(out, response.auth_plugin_name.as_bytes());
    }

    if response
        .capabilities
        .contains(CapabilityFlags::CLIENT_ZSTD_COMPRESSION_ALGORITHM)
    {
        write_int_1(out, response.zstd_compression_level);
    }
}

/// Server-initiated change of authentication plugin mid-handshake:
/// `0xFE || plugin name (null-terminated) || new salt`.
#[derive(Debug, Clone)]
pub struct AuthSwitchRequest {
    pub plugin_name: String,
    pub salt: Vec<u8>,
}

impl AuthSwitchRequest {
    pub fn parse(packet: &mut Packet) -> Result<Self> {
        let header = packet.read_u8()?;
        if header != 0xFE {
            return Err(Error::Interface(format!(
                "expected AuthSwitchRequest, got first byte 0x{header:02X}"
            )));
        }
        let plugin_name = String::from_utf8_lossy(&packet.read_null_terminated()?).into_owned();
        let mut salt = packet.read_rest();
        if salt.last() == Some(&0) {
            salt.pop();
        }
        Ok(Self { plugin_name, salt })
    }
}
