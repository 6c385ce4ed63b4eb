//! Whole-file binary codec for OpalDB
//!
//! Every mutating statement rewrites the complete catalog to a single
//! file; there are no incremental updates. The layout is little-endian:
//!
//! ```text
//! u32 tableCount
//! repeat tableCount times:
//!   string tableName
//!   u32 columnCount
//!   repeat columnCount times:
//!     string columnName
//!     string dataTypeTag
//!     bool isPrimaryKey
//!     bool isNullable          (forced false when isPrimaryKey)
//!   u32 recordCount
//!   repeat recordCount times, for each column in declared order:
//!     bool isNull
//!     if !isNull: value bytes per type
//! ```
//!
//! Strings are u32-length-prefixed UTF-8. INT is i32, DECIMAL is the
//! 16-byte little-endian `rust_decimal` form, BOOLEAN is one byte,
//! DATETIME is i64 microseconds since the Unix epoch, DATE is i32 days
//! since the Unix epoch.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::row::{Row, Value};
use super::table::Table;
use crate::catalog::schema::Column;
use crate::catalog::types::DataType;
use crate::catalog::Database;
use crate::error::{Error, Result};

fn unix_epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("the Unix epoch is a valid date")
}

fn corrupt(detail: impl Into<String>) -> Error {
    Error::CorruptDatabase(detail.into())
}

/// Serialize the whole catalog to `path`, replacing any previous content.
pub fn save(db: &Database, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    write_u32(&mut w, db.tables().len() as u32)?;
    for table in db.tables() {
        write_string(&mut w, table.name())?;
        write_u32(&mut w, table.schema().len() as u32)?;
        for column in table.schema().columns() {
            write_string(&mut w, &column.name)?;
            write_string(&mut w, column.data_type.tag())?;
            write_bool(&mut w, column.primary_key)?;
            write_bool(&mut w, column.nullable && !column.primary_key)?;
        }
        write_u32(&mut w, table.len() as u32)?;
        for (_, row) in table.store().iter() {
            for column in table.schema().columns() {
                let value = row.get(&column.name).unwrap_or(&Value::Null);
                write_value(&mut w, column, value)?;
            }
        }
    }
    w.flush()?;
    tracing::debug!(path = %path.display(), tables = db.tables().len(), "database saved");
    Ok(())
}

/// Deserialize a catalog from `path`, re-validating every table invariant.
pub fn load(path: &Path) -> Result<Database> {
    let file = File::open(path)?;
    let mut r = BufReader::new(file);

    let mut db = Database::new();
    let table_count = read_u32(&mut r)?;
    for _ in 0..table_count {
        let name = read_string(&mut r)?;
        let column_count = read_u32(&mut r)?;
        let mut columns = Vec::with_capacity(column_count as usize);
        for _ in 0..column_count {
            let col_name = read_string(&mut r)?;
            let tag = read_string(&mut r)?;
            let data_type = DataType::from_tag(&tag)
                .ok_or_else(|| corrupt(format!("unknown data type tag '{}'", tag)))?;
            let primary_key = read_bool(&mut r)?;
            let nullable = read_bool(&mut r)? && !primary_key;
            columns.push(
                Column::new(col_name, data_type)
                    .primary_key(primary_key)
                    .nullable(nullable),
            );
        }

        // Table construction re-runs the schema invariants.
        let mut table = Table::new(name, columns).map_err(|e| corrupt(e.to_string()))?;

        let record_count = read_u32(&mut r)?;
        let columns = table.schema().columns().to_vec();
        for _ in 0..record_count {
            let mut row = Row::new();
            for column in &columns {
                let value = read_value(&mut r, column)?;
                row.set(column.name.clone(), value);
            }
            table.insert(row).map_err(|e| corrupt(e.to_string()))?;
        }
        // An upsert during load means two records shared a primary key.
        if table.len() != record_count as usize {
            return Err(corrupt(format!(
                "table '{}' contains duplicate primary keys",
                table.name()
            )));
        }

        db.create_table(table).map_err(|e| corrupt(e.to_string()))?;
    }

    tracing::debug!(path = %path.display(), tables = db.len(), "database loaded");
    Ok(db)
}

// ========== Value encoding ==========

fn write_value<W: Write>(w: &mut W, column: &Column, value: &Value) -> Result<()> {
    write_bool(w, value.is_null())?;
    if value.is_null() {
        return Ok(());
    }

    let mismatch = || Error::TypeMismatch {
        from: value.type_name().to_string(),
        to: column.data_type.tag().to_string(),
    };

    match (column.data_type, value) {
        (DataType::Int, Value::Integer(i)) => w.write_all(&i.to_le_bytes())?,
        (DataType::Decimal, Value::Decimal(d)) => w.write_all(&d.serialize())?,
        (DataType::Varchar | DataType::Text, Value::String(s)) => write_string(w, s)?,
        (DataType::Boolean, Value::Boolean(b)) => write_bool(w, *b)?,
        (DataType::DateTime, Value::DateTime(t)) => {
            w.write_all(&t.and_utc().timestamp_micros().to_le_bytes())?
        }
        (DataType::Date, Value::Date(d)) => {
            let days = d.signed_duration_since(unix_epoch_date()).num_days() as i32;
            w.write_all(&days.to_le_bytes())?
        }
        _ => return Err(mismatch()),
    }
    Ok(())
}

fn read_value<R: Read>(r: &mut R, column: &Column) -> Result<Value> {
    if read_bool(r)? {
        return Ok(Value::Null);
    }

    let value = match column.data_type {
        DataType::Int => Value::Integer(read_i32(r)?),
        DataType::Decimal => {
            let mut buf = [0u8; 16];
            read_exact(r, &mut buf)?;
            Value::Decimal(rust_decimal::Decimal::deserialize(buf))
        }
        DataType::Varchar | DataType::Text => Value::String(read_string(r)?),
        DataType::Boolean => Value::Boolean(read_bool(r)?),
        DataType::DateTime => {
            let micros = read_i64(r)?;
            let instant = DateTime::<Utc>::from_timestamp_micros(micros)
                .ok_or_else(|| corrupt(format!("datetime out of range: {}", micros)))?;
            Value::DateTime(instant.naive_utc())
        }
        DataType::Date => {
            let days = read_i32(r)?;
            let date = unix_epoch_date()
                .checked_add_signed(Duration::days(days as i64))
                .ok_or_else(|| corrupt(format!("date out of range: {}", days)))?;
            Value::Date(date)
        }
    };
    Ok(value)
}

// ========== Primitive encoding ==========

fn write_u32<W: Write>(w: &mut W, v: u32) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_bool<W: Write>(w: &mut W, v: bool) -> Result<()> {
    w.write_all(&[v as u8])?;
    Ok(())
}

fn write_string<W: Write>(w: &mut W, s: &str) -> Result<()> {
    write_u32(w, s.len() as u32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf)
        .map_err(|_| corrupt("unexpected end of file"))
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_i64<R: Read>(r: &mut R) -> Result<i64> {
    let mut buf = [0u8; 8];
    read_exact(r, &mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn read_bool<R: Read>(r: &mut R) -> Result<bool> {
    let mut buf = [0u8; 1];
    read_exact(r, &mut buf)?;
    match buf[0] {
        0 => Ok(false),
        1 => Ok(true),
        b => Err(corrupt(format!("invalid boolean byte {}", b))),
    }
}

fn read_string<R: Read>(r: &mut R) -> Result<String> {
    let len = read_u32(r)? as usize;
    let mut buf = vec![0u8; len];
    read_exact(r, &mut buf)?;
    String::from_utf8(buf).map_err(|_| corrupt("invalid UTF-8 in string"))
}
