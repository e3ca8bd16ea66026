//! Compressed-session tests. The server side re-implements the envelope
//! framing directly on top of flate2/zstd so the client is checked against
//! an independent encoding, not its own framer.

mod common;

use std::io::{Read, Write};
use std::net::TcpStream;

use common::*;
use lean_mysql::sync::Conn;
use lean_mysql::{Compress, Value};
use pretty_assertions::assert_eq;

const CLIENT_COMPRESS: u32 = 0x0000_0020;
const CLIENT_ZSTD: u32 = 0x0400_0000;

#[derive(Clone, Copy)]
enum Algo {
    Zlib,
    Zstd,
}

/// Shared compressed-sequence state for one command exchange. Both
/// directions advance the same counter, mirroring the frame sequence rule.
struct Envelopes {
    algo: Algo,
    cseq: u8,
    pending: Vec<u8>,
    saw_compressed: bool,
}

impl Envelopes {
    fn new(algo: Algo) -> Self {
        Self {
            algo,
            cseq: 0,
            pending: Vec::new(),
            saw_compressed: false,
        }
    }

    fn read_frame(&mut self, stream: &mut TcpStream) -> (u8, Vec<u8>) {
        while self.pending.len() < 4 {
            self.read_envelope(stream);
        }
        let len = u32::from_le_bytes([self.pending[0], self.pending[1], self.pending[2], 0]) as usize;
        let seq = self.pending[3];
        while self.pending.len() < 4 + len {
            self.read_envelope(stream);
        }
        let payload = self.pending[4..4 + len].to_vec();
        self.pending.drain(..4 + len);
        (seq, payload)
    }

    fn read_envelope(&mut self, stream: &mut TcpStream) {
        let mut header = [0u8; 7];
        stream.read_exact(&mut header).expect("envelope header");
        let compressed_len = u32::from_le_bytes([header[0], header[1], header[2], 0]) as usize;
        assert_eq!(header[3], self.cseq, "compressed sequence out of order");
        self.cseq = self.cseq.wrapping_add(1);
        let uncompressed_len = u32::from_le_bytes([header[4], header[5], header[6], 0]) as usize;

        let mut body = vec![0u8; compressed_len];
        stream.read_exact(&mut body).expect("envelope body");

        if uncompressed_len == 0 {
            self.pending.extend_from_slice(&body);
        } else {
            self.saw_compressed = true;
            let inflated = match self.algo {
                Algo::Zlib => {
                    let mut out = Vec::new();
                    flate2::read::ZlibDecoder::new(&body[..])
                        .read_to_end(&mut out)
                        .expect("inflate");
                    out
                }
                Algo::Zstd => zstd::bulk::decompress(&body, uncompressed_len).expect("unzstd"),
            };
            assert_eq!(inflated.len(), uncompressed_len);
            self.pending.extend_from_slice(&inflated);
        }
    }

    fn write_frame(&mut self, stream: &mut TcpStream, seq: u8, payload: &[u8]) {
        let mut frame = Vec::with_capacity(4 + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes()[..3]);
        frame.push(seq);
        frame.extend_from_slice(payload);

        let (body, uncompressed_len) = if frame.len() >= 50 {
            let compressed = match self.algo {
                Algo::Zlib => {
                    let mut enc = flate2::write::ZlibEncoder::new(
                        Vec::new(),
                        flate2::Compression::default(),
                    );
                    enc.write_all(&frame).unwrap();
                    enc.finish().unwrap()
                }
                Algo::Zstd => zstd::bulk::compress(&frame, 3).unwrap(),
            };
            (compressed, frame.len())
        } else {
            (frame, 0)
        };

        let mut header = [0u8; 7];
        header[..3].copy_from_slice(&(body.len() as u32).to_le_bytes()[..3]);
        header[3] = self.cseq;
        self.cseq = self.cseq.wrapping_add(1);
        header[4..].copy_from_slice(&(uncompressed_len as u32).to_le_bytes()[..3]);
        stream.write_all(&header).unwrap();
        stream.write_all(&body).unwrap();
        stream.flush().unwrap();
    }
}

fn compressed_session(algo: Algo, capability: u32) -> (MockServer, &'static str) {
    let salt = [0x0Au8; 20];
    let filler: &'static str = "the quick brown fox jumps over the lazy dog; \
         the quick brown fox jumps over the lazy dog; \
         the quick brown fox jumps over the lazy dog; \
         the quick brown fox jumps over the lazy dog";
    let server = MockServer::start(move |mut stream| {
        // Handshake stays on raw frames even when compression is negotiated.
        write_frame(
            &mut stream,
            0,
            &greeting_payload(
                &salt,
                "mysql_native_password",
                default_capabilities() | capability,
                9,
            ),
        );
        let (seq, _response) = read_frame(&mut stream);
        assert_eq!(seq, 1);
        write_frame(&mut stream, 2, &ok_payload(0, 0, STATUS_AUTOCOMMIT, 0));

        // From here on every exchange is enveloped.
        for expected in ["SET NAMES utf8mb4", "SET AUTOCOMMIT = 0"] {
            let mut io = Envelopes::new(algo);
            let (seq, command) = io.read_frame(&mut stream);
            assert_eq!(seq, 0);
            assert_eq!(command[0], COM_QUERY);
            assert_eq!(std::str::from_utf8(&command[1..]).unwrap(), expected);
            io.write_frame(&mut stream, 1, &ok_payload(0, 0, STATUS_AUTOCOMMIT, 0));
        }

        let mut io = Envelopes::new(algo);
        let (seq, command) = io.read_frame(&mut stream);
        assert_eq!(seq, 0);
        assert!(std::str::from_utf8(&command[1..])
            .unwrap()
            .starts_with("SELECT"));
        assert!(
            io.saw_compressed,
            "a long query should arrive in a compressed envelope"
        );

        io.write_frame(&mut stream, 1, &[0x01]);
        io.write_frame(
            &mut stream,
            2,
            &column_payload("filler", TYPE_VAR_STRING, 45, 0),
        );
        io.write_frame(&mut stream, 3, &eof_payload(0, STATUS_AUTOCOMMIT));
        io.write_frame(&mut stream, 4, &row_payload(&[Some(filler)]));
        io.write_frame(&mut stream, 5, &eof_payload(0, STATUS_AUTOCOMMIT));
    });
    (server, filler)
}

fn run_compressed_query(algo: Algo, compress: Compress, capability: u32) {
    let (server, filler) = compressed_session(algo, capability);

    let mut opts = server.opts();
    opts.compress = Some(compress);
    let mut conn = Conn::connect(opts).unwrap();
    {
        let mut result = conn
            .query(&format!("SELECT '{filler}' AS filler"))
            .unwrap();
        let row = result.fetch_row().unwrap().unwrap();
        assert_eq!(row, vec![Value::Text(filler.to_string())]);
        assert_eq!(result.fetch_row().unwrap(), None);
    }
    server.join();
}

#[test]
fn zlib_compressed_session() {
    run_compressed_query(Algo::Zlib, Compress::Zlib, CLIENT_COMPRESS);
}

#[test]
fn zstd_compressed_session() {
    run_compressed_query(Algo::Zstd, Compress::Zstd, CLIENT_ZSTD);
}
