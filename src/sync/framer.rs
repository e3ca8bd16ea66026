use std::io::{Read, Write};

use zerocopy::{FromZeros, IntoBytes};

use crate::error::{Error, Result};
use crate::opts::{Compress, SslOpts};
use crate::protocol::packet::{CompressedHeader, PacketHeader};
use crate::sync::stream::Stream;

/// Largest payload one frame can carry; longer messages continue in
/// follow-up frames, including a trailing empty frame when the length is an
/// exact multiple.
pub const MAX_PAYLOAD_LENGTH: usize = 0xFFFFFF;

/// Envelopes shorter than this are cheaper to send uncompressed.
const MIN_COMPRESS_LENGTH: usize = 50;

enum Codec {
    Plain,
    Zlib,
    Zstd { level: i32 },
}

/// Adds and removes the `len(3 LE) || seq(1)` frame header, and the
/// compressed envelope around frames once compression is negotiated.
///
/// One sequence counter is shared by both directions of a command exchange
/// and checked on every received frame; the compressed envelopes keep a
/// second, independent counter. Both reset together at command boundaries.
pub struct Framer {
    stream: Stream,
    sequence_id: u8,
    compressed_sequence_id: u8,
    codec: Codec,
    /// Decompressed envelope bytes not yet consumed as frames.
    inflated: Vec<u8>,
    inflated_pos: usize,
}

impl Framer {
    pub fn new(stream: Stream) -> Self {
        Self {
            stream,
            sequence_id: 0,
            compressed_sequence_id: 0,
            codec: Codec::Plain,
            inflated: Vec::new(),
            inflated_pos: 0,
        }
    }

    /// Switch the logical send/recv paths to the negotiated compression.
    /// Only call between command exchanges (in practice: right after the
    /// handshake completes).
    pub fn enable_compression(&mut self, algorithm: Compress, zstd_level: i32) {
        self.codec = match algorithm {
            Compress::Zlib => Codec::Zlib,
            Compress::Zstd => Codec::Zstd { level: zstd_level },
        };
    }

    /// Reset both sequence counters to zero, as required before every
    /// command and before the handshake response.
    pub fn reset_sequence(&mut self) {
        self.sequence_id = 0;
        self.compressed_sequence_id = 0;
    }

    pub fn sequence_id(&self) -> u8 {
        self.sequence_id
    }

    pub fn is_secure(&self) -> bool {
        self.stream.is_secure()
    }

    pub fn upgrade_to_tls(&mut self, host: &str, ssl: &SslOpts) -> Result<()> {
        let stream = std::mem::replace(&mut self.stream, Stream::Closed);
        self.stream = stream.upgrade_to_tls(host, ssl)?;
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.stream.shutdown();
    }

    // ─── Raw path (handshake) ────────────────────────────────────────────

    /// Write one logical message as raw frames, bypassing compression.
    pub fn send_raw(&mut self, payload: &[u8]) -> Result<()> {
        let mut offset = 0;
        loop {
            let end = (offset + MAX_PAYLOAD_LENGTH).min(payload.len());
            let chunk = &payload[offset..end];
            let header = PacketHeader::encode(chunk.len(), self.sequence_id);
            self.sequence_id = self.sequence_id.wrapping_add(1);
            self.stream.write_all(header.as_bytes())?;
            self.stream.write_all(chunk)?;
            offset = end;
            if chunk.len() < MAX_PAYLOAD_LENGTH {
                break;
            }
        }
        self.stream.flush()?;
        Ok(())
    }

    /// Read one logical message as raw frames, reassembling continuations.
    pub fn recv_raw(&mut self) -> Result<Vec<u8>> {
        let mut payload = self.read_raw_frame()?;
        let mut last_len = payload.len();
        while last_len == MAX_PAYLOAD_LENGTH {
            let next = self.read_raw_frame()?;
            last_len = next.len();
            payload.extend_from_slice(&next);
        }
        Ok(payload)
    }

    fn read_raw_frame(&mut self) -> Result<Vec<u8>> {
        let mut header = PacketHeader::new_zeroed();
        self.stream.read_exact(header.as_mut_bytes())?;
        self.check_sequence(header.sequence_id)?;
        let mut chunk = vec![0u8; header.length()];
        self.stream.read_exact(&mut chunk)?;
        Ok(chunk)
    }

    fn check_sequence(&mut self, received: u8) -> Result<()> {
        if received != self.sequence_id {
            return Err(Error::Interface(format!(
                "packets out of order: expected sequence {}, got {}",
                self.sequence_id, received
            )));
        }
        self.sequence_id = self.sequence_id.wrapping_add(1);
        Ok(())
    }

    // ─── Logical path (after handshake) ──────────────────────────────────

    /// Write one logical message, compressing when negotiated.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        if matches!(self.codec, Codec::Plain) {
            return self.send_raw(payload);
        }

        let mut offset = 0;
        loop {
            let end = (offset + MAX_PAYLOAD_LENGTH).min(payload.len());
            let chunk = &payload[offset..end];
            let mut framed = Vec::with_capacity(4 + chunk.len());
            framed.extend_from_slice(PacketHeader::encode(chunk.len(), self.sequence_id).as_bytes());
            self.sequence_id = self.sequence_id.wrapping_add(1);
            framed.extend_from_slice(chunk);

            // An envelope body is itself capped at 3 length bytes; a full
            // 16 MiB frame plus header must span two envelopes.
            for piece in framed.chunks(MAX_PAYLOAD_LENGTH) {
                self.write_envelope(piece)?;
            }

            offset = end;
            if chunk.len() < MAX_PAYLOAD_LENGTH {
                break;
            }
        }
        self.stream.flush()?;
        Ok(())
    }

    /// Read one logical message, transparently decompressing envelopes.
    pub fn recv(&mut self) -> Result<Vec<u8>> {
        if matches!(self.codec, Codec::Plain) {
            return self.recv_raw();
        }

        let mut payload = Vec::new();
        loop {
            let header_bytes = self.take_inflated(4)?;
            let mut header = PacketHeader::new_zeroed();
            header.as_mut_bytes().copy_from_slice(&header_bytes);
            self.check_sequence(header.sequence_id)?;

            let len = header.length();
            let chunk = self.take_inflated(len)?;
            payload.extend_from_slice(&chunk);
            if len < MAX_PAYLOAD_LENGTH {
                break;
            }
        }
        Ok(payload)
    }

    fn write_envelope(&mut self, body: &[u8]) -> Result<()> {
        if body.len() < MIN_COMPRESS_LENGTH {
            self.write_envelope_parts(body, 0)?;
        } else {
            let compressed = self.compress(body)?;
            if compressed.len() < body.len() {
                let uncompressed_len = body.len();
                let header =
                    CompressedHeader::encode(compressed.len(), self.compressed_sequence_id, uncompressed_len);
                self.compressed_sequence_id = self.compressed_sequence_id.wrapping_add(1);
                self.stream.write_all(header.as_bytes())?;
                self.stream.write_all(&compressed)?;
            } else {
                // Incompressible data travels as-is with uncomplen = 0.
                self.write_envelope_parts(body, 0)?;
            }
        }
        Ok(())
    }

    fn write_envelope_parts(&mut self, body: &[u8], uncompressed_len: usize) -> Result<()> {
        let header =
            CompressedHeader::encode(body.len(), self.compressed_sequence_id, uncompressed_len);
        self.compressed_sequence_id = self.compressed_sequence_id.wrapping_add(1);
        self.stream.write_all(header.as_bytes())?;
        self.stream.write_all(body)?;
        Ok(())
    }

    /// Pull `n` bytes out of the decompressed stream, reading further
    /// envelopes as needed. Frames may span envelope boundaries.
    fn take_inflated(&mut self, n: usize) -> Result<Vec<u8>> {
        while self.inflated.len() - self.inflated_pos < n {
            self.read_envelope()?;
        }
        let start = self.inflated_pos;
        self.inflated_pos += n;
        let out = self.inflated[start..self.inflated_pos].to_vec();
        if self.inflated_pos == self.inflated.len() {
            self.inflated.clear();
            self.inflated_pos = 0;
        }
        Ok(out)
    }

    fn read_envelope(&mut self) -> Result<()> {
        let mut header = CompressedHeader::new_zeroed();
        self.stream.read_exact(header.as_mut_bytes())?;
        if header.sequence_id != self.compressed_sequence_id {
            return Err(Error::Interface(format!(
                "compressed packets out of order: expected sequence {}, got {}",
                self.compressed_sequence_id, header.sequence_id
            )));
        }
        self.compressed_sequence_id = self.compressed_sequence_id.wrapping_add(1);

        let mut body = vec![0u8; header.compressed_length()];
        self.stream.read_exact(&mut body)?;

        let uncompressed_len = header.uncompressed_length();
        if uncompressed_len == 0 {
            self.inflated.extend_from_slice(&body);
        } else {
            let inflated = self.decompress(&body, uncompressed_len)?;
            if inflated.len() != uncompressed_len {
                return Err(Error::Interface(format!(
                    "compressed envelope declared {} bytes but inflated to {}",
                    uncompressed_len,
                    inflated.len()
                )));
            }
            self.inflated.extend_from_slice(&inflated);
        }
        Ok(())
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match &self.codec {
            Codec::Plain => unreachable_codec(),
            Codec::Zlib => {
                let mut encoder =
                    flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
            Codec::Zstd { level } => Ok(zstd::bulk::compress(data, *level)?),
        }
    }

    fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        match &self.codec {
            Codec::Plain => unreachable_codec(),
            Codec::Zlib => {
                let mut out = Vec::with_capacity(expected_len);
                flate2::read::ZlibDecoder::new(data)
                    .read_to_end(&mut out)
                    .map_err(|e| Error::Interface(format!("zlib inflate failed: {e}")))?;
                Ok(out)
            }
            Codec::Zstd { .. } => zstd::bulk::decompress(data, expected_len)
                .map_err(|e| Error::Interface(format!("zstd decompress failed: {e}"))),
        }
    }
}

fn unreachable_codec() -> Result<Vec<u8>> {
    Err(Error::Interface(
        "compression codec used before negotiation".to_string(),
    ))
}
