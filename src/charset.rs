//! Character-set lookups used during the handshake and for decoding text
//! cells. Both lookups are total over the finite table below; an unknown
//! charset name fails before any network I/O.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// How bytes of a given charset are turned into Rust strings and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
    Ascii,
    Binary,
}

impl Encoding {
    pub fn decode<'a>(self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            Encoding::Utf8 => match simdutf8::basic::from_utf8(bytes) {
                Ok(s) => Cow::Borrowed(s),
                Err(_) => String::from_utf8_lossy(bytes),
            },
            // Latin-1 maps each byte to the code point of the same value.
            Encoding::Latin1 | Encoding::Ascii | Encoding::Binary => {
                if bytes.is_ascii() {
                    // ASCII is valid UTF-8 as-is.
                    Cow::Borrowed(std::str::from_utf8(bytes).unwrap_or_default())
                } else {
                    Cow::Owned(bytes.iter().map(|&b| b as char).collect())
                }
            }
        }
    }

    pub fn encode<'a>(self, text: &'a str) -> Result<Cow<'a, [u8]>> {
        match self {
            Encoding::Utf8 | Encoding::Binary => Ok(Cow::Borrowed(text.as_bytes())),
            Encoding::Latin1 | Encoding::Ascii => {
                if text.is_ascii() {
                    return Ok(Cow::Borrowed(text.as_bytes()));
                }
                let mut out = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    let cp = ch as u32;
                    if cp > 0xFF {
                        return Err(Error::programming(format!(
                            "cannot encode {ch:?} in charset {self:?}"
                        )));
                    }
                    out.push(cp as u8);
                }
                Ok(Cow::Owned(out))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Charset {
    pub name: &'static str,
    pub id: u8,
    pub encoding: Encoding,
}

/// Charsets this client can encode and decode. The id is the collation id
/// sent in the handshake response.
const CHARSETS: &[Charset] = &[
    Charset {
        name: "ascii",
        id: 11,
        encoding: Encoding::Ascii,
    },
    Charset {
        name: "latin1",
        id: 8,
        encoding: Encoding::Latin1,
    },
    Charset {
        name: "utf8",
        id: 33,
        encoding: Encoding::Utf8,
    },
    Charset {
        name: "utf8mb3",
        id: 33,
        encoding: Encoding::Utf8,
    },
    Charset {
        name: "utf8mb4",
        id: 45,
        encoding: Encoding::Utf8,
    },
    Charset {
        name: "binary",
        id: 63,
        encoding: Encoding::Binary,
    },
];

pub fn charset_by_name(name: &str) -> Result<&'static Charset> {
    CHARSETS
        .iter()
        .find(|cs| cs.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::programming(format!("unknown charset: {name:?}")))
}

pub fn encoding_by_charset(name: &str) -> Result<Encoding> {
    charset_by_name(name).map(|cs| cs.encoding)
}

/// Encoding for a column's collation id, used when decoding text cells.
/// Ids outside the table fall back to the caller-supplied session encoding.
pub fn encoding_by_collation_id(id: u16, fallback: Encoding) -> Encoding {
    match id {
        8 => Encoding::Latin1,
        11 => Encoding::Ascii,
        63 => Encoding::Binary,
        33 | 45 | 46 | 224..=247 | 255 => Encoding::Utf8,
        _ => fallback,
    }
}
