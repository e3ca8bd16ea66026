//! A scripted MySQL server speaking just enough of the wire protocol over
//! real TCP to drive the client through handshake, authentication, and the
//! command phase.
#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::JoinHandle;

use lean_mysql::constant::CapabilityFlags;
use lean_mysql::Opts;

pub const COM_QUIT: u8 = 0x01;
pub const COM_QUERY: u8 = 0x03;
pub const COM_PROCESS_KILL: u8 = 0x0C;
pub const COM_PING: u8 = 0x0E;

pub const STATUS_AUTOCOMMIT: u16 = 0x0002;
pub const STATUS_IN_TRANS: u16 = 0x0001;
pub const STATUS_MORE_RESULTS: u16 = 0x0008;

pub const TYPE_LONGLONG: u8 = 0x08;
pub const TYPE_VAR_STRING: u8 = 0xFD;

pub fn default_capabilities() -> u32 {
    (CapabilityFlags::CLIENT_LONG_PASSWORD
        | CapabilityFlags::CLIENT_LONG_FLAG
        | CapabilityFlags::CLIENT_CONNECT_WITH_DB
        | CapabilityFlags::CLIENT_PROTOCOL_41
        | CapabilityFlags::CLIENT_TRANSACTIONS
        | CapabilityFlags::CLIENT_SECURE_CONNECTION
        | CapabilityFlags::CLIENT_MULTI_STATEMENTS
        | CapabilityFlags::CLIENT_MULTI_RESULTS
        | CapabilityFlags::CLIENT_PLUGIN_AUTH)
        .bits()
}

// ── Frame plumbing ───────────────────────────────────────────────────────

pub fn write_frame(stream: &mut TcpStream, seq: u8, payload: &[u8]) {
    let mut header = [0u8; 4];
    header[..3].copy_from_slice(&(payload.len() as u32).to_le_bytes()[..3]);
    header[3] = seq;
    stream.write_all(&header).expect("write frame header");
    stream.write_all(payload).expect("write frame payload");
    stream.flush().expect("flush frame");
}

pub fn read_frame(stream: &mut TcpStream) -> (u8, Vec<u8>) {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).expect("read frame header");
    let len = u32::from_le_bytes([header[0], header[1], header[2], 0]) as usize;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).expect("read frame payload");
    (header[3], payload)
}

// ── Canned payloads ──────────────────────────────────────────────────────

fn push_lenenc(out: &mut Vec<u8>, bytes: &[u8]) {
    assert!(bytes.len() < 251, "test payloads stay below one lenenc byte");
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
}

/// HandshakeV10 greeting with a 20-byte salt split 8 + 12.
pub fn greeting_payload(salt: &[u8; 20], plugin: &str, capabilities: u32, thread_id: u32) -> Vec<u8> {
    let mut out = vec![10];
    out.extend_from_slice(b"8.0.36-mock\0");
    out.extend_from_slice(&thread_id.to_le_bytes());
    out.extend_from_slice(&salt[..8]);
    out.push(0);
    out.extend_from_slice(&(capabilities as u16).to_le_bytes());
    out.push(45); // utf8mb4
    out.extend_from_slice(&STATUS_AUTOCOMMIT.to_le_bytes());
    out.extend_from_slice(&((capabilities >> 16) as u16).to_le_bytes());
    out.push(21);
    out.extend_from_slice(&[0u8; 10]);
    out.extend_from_slice(&salt[8..]);
    out.push(0);
    out.extend_from_slice(plugin.as_bytes());
    out.push(0);
    out
}

pub fn ok_payload(affected: u8, insert_id: u8, status: u16, warnings: u16) -> Vec<u8> {
    let mut out = vec![0x00, affected, insert_id];
    out.extend_from_slice(&status.to_le_bytes());
    out.extend_from_slice(&warnings.to_le_bytes());
    out
}

pub fn eof_payload(warnings: u16, status: u16) -> Vec<u8> {
    let mut out = vec![0xFE];
    out.extend_from_slice(&warnings.to_le_bytes());
    out.extend_from_slice(&status.to_le_bytes());
    out
}

pub fn err_payload(code: u16, sql_state: &str, message: &str) -> Vec<u8> {
    let mut out = vec![0xFF];
    out.extend_from_slice(&code.to_le_bytes());
    out.push(b'#');
    assert_eq!(sql_state.len(), 5);
    out.extend_from_slice(sql_state.as_bytes());
    out.extend_from_slice(message.as_bytes());
    out
}

pub fn column_payload(name: &str, type_code: u8, charset: u16, flags: u16) -> Vec<u8> {
    let mut out = Vec::new();
    push_lenenc(&mut out, b"def");
    push_lenenc(&mut out, b"test");
    push_lenenc(&mut out, b"t");
    push_lenenc(&mut out, b"t");
    push_lenenc(&mut out, name.as_bytes());
    push_lenenc(&mut out, name.as_bytes());
    out.push(0x0C);
    out.extend_from_slice(&charset.to_le_bytes());
    out.extend_from_slice(&21u32.to_le_bytes());
    out.push(type_code);
    out.extend_from_slice(&flags.to_le_bytes());
    out.push(0);
    out.extend_from_slice(&[0, 0]);
    out
}

/// A text-protocol row: lenenc cells, 0xFB for NULL.
pub fn row_payload(cells: &[Option<&str>]) -> Vec<u8> {
    let mut out = Vec::new();
    for cell in cells {
        match cell {
            Some(text) => push_lenenc(&mut out, text.as_bytes()),
            None => out.push(0xFB),
        }
    }
    out
}

// ── Server-side handshake ────────────────────────────────────────────────

/// Greet, consume the handshake response, reply OK, then absorb the session
/// bootstrap the client always performs (SET NAMES + SET AUTOCOMMIT).
pub fn accept_handshake(stream: &mut TcpStream, salt: &[u8; 20]) {
    write_frame(
        stream,
        0,
        &greeting_payload(salt, "mysql_native_password", default_capabilities(), 42),
    );
    let (seq, _response) = read_frame(stream);
    assert_eq!(seq, 1, "handshake response must carry sequence 1");
    write_frame(stream, 2, &ok_payload(0, 0, STATUS_AUTOCOMMIT, 0));
    expect_setup_commands(stream);
}

/// The two statements Conn::connect always issues after authentication.
pub fn expect_setup_commands(stream: &mut TcpStream) {
    expect_query(stream, "SET NAMES utf8mb4");
    expect_query(stream, "SET AUTOCOMMIT = 0");
}

/// Read one command frame, assert it is COM_QUERY with the given SQL, and
/// reply OK.
pub fn expect_query(stream: &mut TcpStream, sql: &str) {
    let (seq, command) = read_frame(stream);
    assert_eq!(seq, 0, "commands reset the sequence counter");
    assert_eq!(command[0], COM_QUERY);
    assert_eq!(
        std::str::from_utf8(&command[1..]).unwrap(),
        sql,
        "unexpected SQL text"
    );
    write_frame(stream, 1, &ok_payload(0, 0, STATUS_AUTOCOMMIT, 0));
}

// ── The server harness ───────────────────────────────────────────────────

pub struct MockServer {
    pub addr: SocketAddr,
    handle: Option<JoinHandle<()>>,
}

impl MockServer {
    /// Accept one connection and run the script against it. Panics inside
    /// the script surface in [`MockServer::join`].
    pub fn start(script: impl FnOnce(TcpStream) + Send + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            script(stream);
        });
        Self {
            addr,
            handle: Some(handle),
        }
    }

    /// Accept `count` consecutive connections, invoking the script with the
    /// connection index.
    pub fn start_serial(
        count: usize,
        script: impl Fn(usize, TcpStream) + Send + 'static,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let handle = std::thread::spawn(move || {
            for index in 0..count {
                let (stream, _) = listener.accept().expect("accept");
                script(index, stream);
            }
        });
        Self {
            addr,
            handle: Some(handle),
        }
    }

    pub fn opts(&self) -> Opts {
        let mut opts = Opts::default();
        opts.host = "127.0.0.1".to_string();
        opts.port = self.addr.port();
        opts.user = Some("root".to_string());
        opts.passwd = "secret".to_string();
        opts
    }

    /// Wait for the script to finish, propagating its panics into the test.
    pub fn join(mut self) {
        self.handle
            .take()
            .expect("already joined")
            .join()
            .expect("mock server script panicked");
    }
}
