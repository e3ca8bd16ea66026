use std::collections::VecDeque;

use crate::constant::ServerStatusFlags;
use crate::error::{Error, Result};
use crate::protocol::column::{ColumnDescription, FieldDescriptor};
use crate::protocol::packet::Packet;
use crate::protocol::response::{parse_eof_packet, parse_err_packet, OkPacket};
use crate::value::{decode_text_value, Value};

use super::conn::Conn;

/// One decoded text-protocol row.
pub type Row = Vec<Value>;

/// The active result of a query, borrowing the connection while rows are
/// read.
///
/// A query answers either with a bare OK (`has_result()` is false; affected
/// rows, insert id and message are populated) or with a result set
/// (`fields()` describe the columns, [`QueryResult::fetch_row`] streams the
/// rows). When the terminating EOF carries `SERVER_MORE_RESULTS_EXISTS`,
/// [`QueryResult::next_result`] moves on to the following result set without
/// sending another command.
///
/// Dropping the reader drains whatever the server still has in flight so the
/// connection stays usable.
pub struct QueryResult<'conn> {
    conn: &'conn mut Conn,
    field_count: usize,
    fields: Vec<FieldDescriptor>,
    affected_rows: u64,
    insert_id: u64,
    server_status: ServerStatusFlags,
    warning_count: u16,
    message: String,
    has_result: bool,
    has_next: bool,
    rows_done: bool,
    buffered: Option<VecDeque<Row>>,
}

impl<'conn> QueryResult<'conn> {
    pub(crate) fn read(conn: &'conn mut Conn) -> Result<Self> {
        let mut result = Self {
            conn,
            field_count: 0,
            fields: Vec::new(),
            affected_rows: 0,
            insert_id: 0,
            server_status: ServerStatusFlags::empty(),
            warning_count: 0,
            message: String::new(),
            has_result: false,
            has_next: false,
            rows_done: true,
            buffered: None,
        };
        result.read_result_set()?;
        Ok(result)
    }

    /// Consume one response: OK, ERR, or `field_count` followed by the
    /// column descriptors and their EOF. Rows stay on the wire until fetched.
    fn read_result_set(&mut self) -> Result<()> {
        self.buffered = None;
        self.has_next = false;

        let mut packet = self.conn.recv_packet()?;
        if packet.is_err_packet() {
            let parsed = parse_err_packet(&mut packet);
            return Err(self.conn.check(parsed)?.into());
        }
        if packet.first_byte() == Some(0xFB) {
            return Err(Error::NotSupported(
                "LOCAL INFILE requests are not supported".to_string(),
            ));
        }
        if packet.is_ok_packet() {
            let parsed = OkPacket::parse(&mut packet);
            let ok = self.conn.check(parsed)?;
            self.apply_ok(ok);
            return Ok(());
        }

        let parsed = packet.read_lenenc_int();
        let field_count = self.conn.check(parsed)? as usize;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            let mut column_packet = self.conn.recv_packet()?;
            let parsed = FieldDescriptor::parse(&mut column_packet);
            fields.push(self.conn.check(parsed)?);
        }
        let eof_packet = self.conn.recv_packet()?;
        let parsed = parse_eof_packet(&eof_packet);
        let eof = self.conn.check(parsed)?;

        self.field_count = field_count;
        self.fields = fields;
        self.warning_count = eof.warnings;
        self.has_result = true;
        self.rows_done = false;
        Ok(())
    }

    fn apply_ok(&mut self, ok: OkPacket) {
        self.field_count = 0;
        self.fields = Vec::new();
        self.affected_rows = ok.affected_rows;
        self.insert_id = ok.last_insert_id;
        self.server_status = ok.status_flags;
        self.warning_count = ok.warnings;
        self.message = ok.message;
        self.has_result = false;
        self.has_next = ok
            .status_flags
            .contains(ServerStatusFlags::SERVER_MORE_RESULTS_EXISTS);
        self.rows_done = true;
        self.conn.note_status(ok.status_flags);
    }

    /// Fetch the next row, or `None` once the result set is exhausted.
    /// Rows buffered by [`QueryResult::buffer_remaining`] are replayed first.
    pub fn fetch_row(&mut self) -> Result<Option<Row>> {
        if !self.has_result {
            return Ok(None);
        }
        if let Some(buffer) = &mut self.buffered {
            return Ok(buffer.pop_front());
        }
        if self.rows_done {
            return Ok(None);
        }
        self.read_row_from_wire()
    }

    fn read_row_from_wire(&mut self) -> Result<Option<Row>> {
        let mut packet = self.conn.recv_packet()?;
        if packet.is_err_packet() {
            // The server aborts the result set; nothing follows the ERR.
            self.rows_done = true;
            let parsed = parse_err_packet(&mut packet);
            return Err(self.conn.check(parsed)?.into());
        }
        if packet.is_eof_packet() {
            let parsed = parse_eof_packet(&packet);
            let eof = self.conn.check(parsed)?;
            self.warning_count = eof.warnings;
            self.server_status = eof.status_flags;
            self.has_next = eof
                .status_flags
                .contains(ServerStatusFlags::SERVER_MORE_RESULTS_EXISTS);
            self.conn.note_status(eof.status_flags);
            self.rows_done = true;
            return Ok(None);
        }
        let row = self.decode_row(&mut packet);
        self.conn.check(row).map(Some)
    }

    /// A row is `field_count` cells, each a lenenc string or the 0xFB NULL
    /// marker.
    fn decode_row(&self, packet: &mut Packet) -> Result<Row> {
        let encoding = self.conn.session_encoding();
        let mut row = Vec::with_capacity(self.field_count);
        for field in &self.fields {
            let raw = if packet.remaining().first() == Some(&0xFB) {
                let _ = packet.read_u8()?;
                None
            } else {
                Some(packet.read_lenenc_bytes()?)
            };
            row.push(decode_text_value(raw.as_deref(), field, encoding)?);
        }
        if !packet.remaining().is_empty() {
            return Err(Error::Interface(format!(
                "row packet has {} trailing bytes",
                packet.remaining().len()
            )));
        }
        Ok(row)
    }

    /// Eagerly read and decode all remaining rows; later
    /// [`QueryResult::fetch_row`] calls replay them from memory.
    pub fn buffer_remaining(&mut self) -> Result<()> {
        if !self.has_result || self.buffered.is_some() {
            return Ok(());
        }
        let mut rows = VecDeque::new();
        while !self.rows_done {
            match self.read_row_from_wire()? {
                Some(row) => rows.push_back(row),
                None => break,
            }
        }
        self.buffered = Some(rows);
        Ok(())
    }

    /// Finish the current result set and, when the server flagged more
    /// results, start reading the next one. Returns `false` when no further
    /// result set exists.
    pub fn next_result(&mut self) -> Result<bool> {
        while !self.rows_done {
            self.read_row_from_wire()?;
        }
        if !self.has_next {
            return Ok(false);
        }
        self.read_result_set()?;
        Ok(true)
    }

    /// Discard all remaining rows and result sets.
    pub fn drain(&mut self) -> Result<()> {
        loop {
            while !self.rows_done {
                self.read_row_from_wire()?;
            }
            if self.has_next {
                self.read_result_set()?;
            } else {
                return Ok(());
            }
        }
    }

    // ─── Metadata ────────────────────────────────────────────────────────

    /// False for OK-only responses.
    pub fn has_result(&self) -> bool {
        self.has_result
    }

    /// Whether the terminating EOF announced another result set.
    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The user-visible description tuple, one entry per column.
    pub fn description(&self) -> Vec<ColumnDescription> {
        self.fields.iter().map(FieldDescriptor::description).collect()
    }

    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    pub fn insert_id(&self) -> u64 {
        self.insert_id
    }

    pub fn warning_count(&self) -> u16 {
        self.warning_count
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn server_status(&self) -> ServerStatusFlags {
        self.server_status
    }
}

impl std::fmt::Debug for QueryResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResult")
            .field("field_count", &self.field_count)
            .field("fields", &self.fields)
            .field("affected_rows", &self.affected_rows)
            .field("insert_id", &self.insert_id)
            .field("server_status", &self.server_status)
            .field("warning_count", &self.warning_count)
            .field("message", &self.message)
            .field("has_result", &self.has_result)
            .field("has_next", &self.has_next)
            .field("rows_done", &self.rows_done)
            .field("buffered", &self.buffered)
            .finish()
    }
}

impl Drop for QueryResult<'_> {
    fn drop(&mut self) {
        if self.conn.is_broken() || self.conn.is_closed() {
            return;
        }
        if let Err(e) = self.drain() {
            tracing::debug!(error = %e, "failed to drain dropped result");
        }
    }
}
