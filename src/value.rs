use crate::charset::{encoding_by_collation_id, Encoding};
use crate::constant::ColumnType;
use crate::error::{Error, Result};
use crate::protocol::column::FieldDescriptor;

/// A decoded cell of a textual result-set row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    UInt(u64),
    Double(f64),
    Bytes(Vec<u8>),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

fn corrupt(field: &FieldDescriptor, raw: &[u8]) -> Error {
    Error::Interface(format!(
        "malformed {:?} value for column {:?}: {:?}",
        field.column_type,
        field.name,
        String::from_utf8_lossy(raw)
    ))
}

/// Decode one raw text-protocol cell. `None` is the NULL marker (0xFB).
///
/// The decoder is chosen by the column's type code and flags; textual types
/// are decoded in the column's charset, falling back to the session encoding
/// for collations outside the known table.
pub fn decode_text_value(
    raw: Option<&[u8]>,
    field: &FieldDescriptor,
    session_encoding: Encoding,
) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };

    match field.column_type {
        ColumnType::MYSQL_TYPE_NULL => Ok(Value::Null),

        ColumnType::MYSQL_TYPE_TINY
        | ColumnType::MYSQL_TYPE_SHORT
        | ColumnType::MYSQL_TYPE_INT24
        | ColumnType::MYSQL_TYPE_LONG
        | ColumnType::MYSQL_TYPE_LONGLONG
        | ColumnType::MYSQL_TYPE_YEAR => {
            let text = std::str::from_utf8(raw).map_err(|_| corrupt(field, raw))?;
            if field.is_unsigned() {
                text.parse::<u64>()
                    .map(Value::UInt)
                    .map_err(|_| corrupt(field, raw))
            } else {
                text.parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| corrupt(field, raw))
            }
        }

        ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
            let text = std::str::from_utf8(raw).map_err(|_| corrupt(field, raw))?;
            text.parse::<f64>()
                .map(Value::Double)
                .map_err(|_| corrupt(field, raw))
        }

        // DECIMAL stays textual so no precision is lost; temporal types keep
        // the server's text form.
        ColumnType::MYSQL_TYPE_DECIMAL
        | ColumnType::MYSQL_TYPE_NEWDECIMAL
        | ColumnType::MYSQL_TYPE_TIMESTAMP
        | ColumnType::MYSQL_TYPE_TIMESTAMP2
        | ColumnType::MYSQL_TYPE_DATE
        | ColumnType::MYSQL_TYPE_NEWDATE
        | ColumnType::MYSQL_TYPE_TIME
        | ColumnType::MYSQL_TYPE_TIME2
        | ColumnType::MYSQL_TYPE_DATETIME
        | ColumnType::MYSQL_TYPE_DATETIME2 => Ok(Value::Text(
            std::str::from_utf8(raw)
                .map_err(|_| corrupt(field, raw))?
                .to_string(),
        )),

        ColumnType::MYSQL_TYPE_BIT => Ok(Value::Bytes(raw.to_vec())),

        _ => {
            if field.is_binary() {
                Ok(Value::Bytes(raw.to_vec()))
            } else {
                let encoding = encoding_by_collation_id(field.charset, session_encoding);
                if encoding == Encoding::Binary {
                    Ok(Value::Bytes(raw.to_vec()))
                } else {
                    Ok(Value::Text(encoding.decode(raw).into_owned()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ColumnFlags;
    use pretty_assertions::assert_eq;

    fn field(ty: ColumnType, charset: u16, flags: ColumnFlags) -> FieldDescriptor {
        FieldDescriptor {
            catalog: "def".into(),
            schema: String::new(),
            table: String::new(),
            org_table: String::new(),
            name: "c".into(),
            org_name: "c".into(),
            charset,
            column_length: 0,
            column_type: ty,
            flags,
            decimals: 0,
        }
    }

    #[test]
    fn decodes_integers() {
        let signed = field(ColumnType::MYSQL_TYPE_LONGLONG, 63, ColumnFlags::empty());
        assert_eq!(
            decode_text_value(Some(b"-42"), &signed, Encoding::Utf8).unwrap(),
            Value::Int(-42)
        );

        let unsigned = field(
            ColumnType::MYSQL_TYPE_LONGLONG,
            63,
            ColumnFlags::UNSIGNED_FLAG,
        );
        assert_eq!(
            decode_text_value(Some(b"18446744073709551615"), &unsigned, Encoding::Utf8).unwrap(),
            Value::UInt(u64::MAX)
        );
    }

    #[test]
    fn decodes_null_and_floats() {
        let f = field(ColumnType::MYSQL_TYPE_DOUBLE, 63, ColumnFlags::empty());
        assert_eq!(
            decode_text_value(None, &f, Encoding::Utf8).unwrap(),
            Value::Null
        );
        assert_eq!(
            decode_text_value(Some(b"1.5"), &f, Encoding::Utf8).unwrap(),
            Value::Double(1.5)
        );
    }

    #[test]
    fn decimal_stays_textual() {
        let f = field(ColumnType::MYSQL_TYPE_NEWDECIMAL, 63, ColumnFlags::empty());
        assert_eq!(
            decode_text_value(Some(b"3.14159"), &f, Encoding::Utf8).unwrap(),
            Value::Text("3.14159".into())
        );
    }

    #[test]
    fn strings_respect_column_charset() {
        let text = field(ColumnType::MYSQL_TYPE_VAR_STRING, 45, ColumnFlags::empty());
        assert_eq!(
            decode_text_value(Some("héllo".as_bytes()), &text, Encoding::Utf8).unwrap(),
            Value::Text("héllo".into())
        );

        let blob = field(
            ColumnType::MYSQL_TYPE_BLOB,
            63,
            ColumnFlags::BINARY_FLAG | ColumnFlags::BLOB_FLAG,
        );
        assert_eq!(
            decode_text_value(Some(&[0xDE, 0xAD]), &blob, Encoding::Utf8).unwrap(),
            Value::Bytes(vec![0xDE, 0xAD])
        );
    }

    #[test]
    fn garbage_integer_is_a_protocol_error() {
        let f = field(ColumnType::MYSQL_TYPE_LONG, 63, ColumnFlags::empty());
        assert!(decode_text_value(Some(b"not-a-number"), &f, Encoding::Utf8).is_err());
    }
}
