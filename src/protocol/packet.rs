use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::Result;
use crate::protocol::primitive::*;

/// MySQL frame header: 3-byte little-endian payload length plus sequence id.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable, IntoBytes)]
pub struct PacketHeader {
    pub length: [u8; 3],
    pub sequence_id: u8,
}

impl PacketHeader {
    pub fn encode(length: usize, sequence_id: u8) -> Self {
        let len = (length as u32).to_le_bytes();
        Self {
            length: [len[0], len[1], len[2]],
            sequence_id,
        }
    }

    pub fn length(&self) -> usize {
        u32::from_le_bytes([self.length[0], self.length[1], self.length[2], 0]) as usize
    }
}

/// Compressed-protocol envelope header: compressed length, compression
/// sequence id, and uncompressed length (0 when the body is stored raw).
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable, IntoBytes)]
pub struct CompressedHeader {
    pub compressed_length: [u8; 3],
    pub sequence_id: u8,
    pub uncompressed_length: [u8; 3],
}

impl CompressedHeader {
    pub fn encode(compressed: usize, sequence_id: u8, uncompressed: usize) -> Self {
        let c = (compressed as u32).to_le_bytes();
        let u = (uncompressed as u32).to_le_bytes();
        Self {
            compressed_length: [c[0], c[1], c[2]],
            sequence_id,
            uncompressed_length: [u[0], u[1], u[2]],
        }
    }

    pub fn compressed_length(&self) -> usize {
        u32::from_le_bytes([
            self.compressed_length[0],
            self.compressed_length[1],
            self.compressed_length[2],
            0,
        ]) as usize
    }

    pub fn uncompressed_length(&self) -> usize {
        u32::from_le_bytes([
            self.uncompressed_length[0],
            self.uncompressed_length[1],
            self.uncompressed_length[2],
            0,
        ]) as usize
    }
}

/// One reassembled logical message plus a monotonic read cursor.
///
/// The first payload byte classifies the packet: `0x00` OK, `0xFF` ERR,
/// `0xFE` with a short payload EOF, anything else generic (a result-set
/// header, a row, or auth plugin data).
#[derive(Debug)]
pub struct Packet {
    payload: Vec<u8>,
    pos: usize,
}

impl Packet {
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn first_byte(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Unread portion of the payload.
    pub fn remaining(&self) -> &[u8] {
        &self.payload[self.pos..]
    }

    pub fn is_ok_packet(&self) -> bool {
        self.first_byte() == Some(0x00) && self.len() >= 7
    }

    pub fn is_err_packet(&self) -> bool {
        self.first_byte() == Some(0xFF)
    }

    pub fn is_eof_packet(&self) -> bool {
        self.first_byte() == Some(0xFE) && self.len() < 9
    }

    /// `0x01`-prefixed extra data during the auth phase (caching_sha2 status,
    /// RSA public key).
    pub fn is_auth_more_data(&self) -> bool {
        self.first_byte() == Some(0x01)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let (value, rest) = read_int_1(&self.payload[self.pos..])?;
        self.pos = self.payload.len() - rest.len();
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let (value, rest) = read_int_2(&self.payload[self.pos..])?;
        self.pos = self.payload.len() - rest.len();
        Ok(value)
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let (value, rest) = read_int_3(&self.payload[self.pos..])?;
        self.pos = self.payload.len() - rest.len();
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let (value, rest) = read_int_4(&self.payload[self.pos..])?;
        self.pos = self.payload.len() - rest.len();
        Ok(value)
    }

    pub fn read_u48(&mut self) -> Result<u64> {
        let (value, rest) = read_int_6(&self.payload[self.pos..])?;
        self.pos = self.payload.len() - rest.len();
        Ok(value)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let (value, rest) = read_int_8(&self.payload[self.pos..])?;
        self.pos = self.payload.len() - rest.len();
        Ok(value)
    }

    pub fn read_lenenc_int(&mut self) -> Result<u64> {
        let (value, rest) = read_int_lenenc(&self.payload[self.pos..])?;
        self.pos = self.payload.len() - rest.len();
        Ok(value)
    }

    pub fn read_lenenc_bytes(&mut self) -> Result<Vec<u8>> {
        let (bytes, rest) = read_bytes_lenenc(&self.payload[self.pos..])?;
        let bytes = bytes.to_vec();
        self.pos = self.payload.len() - rest.len();
        Ok(bytes)
    }

    pub fn read_null_terminated(&mut self) -> Result<Vec<u8>> {
        let (bytes, rest) = read_bytes_null(&self.payload[self.pos..])?;
        let bytes = bytes.to_vec();
        self.pos = self.payload.len() - rest.len();
        Ok(bytes)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let (bytes, rest) = read_bytes_fix(&self.payload[self.pos..], len)?;
        let bytes = bytes.to_vec();
        self.pos = self.payload.len() - rest.len();
        Ok(bytes)
    }

    /// Consume and return everything left in the packet.
    pub fn read_rest(&mut self) -> Vec<u8> {
        let rest = self.payload[self.pos..].to_vec();
        self.pos = self.payload.len();
        rest
    }
}
