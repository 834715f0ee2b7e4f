use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{ErrorKind, SmallError, SmallResult};
use crate::expr::Expr;
use crate::types::{DBType, DBValue, FieldType, Ordered};

/// Identifies a tuple's physical location within a heap file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct RecordId {
    pub page_no: u32,
    pub slot_no: u32,
}

impl RecordId {
    pub fn new(page_no: u32, slot_no: u32) -> RecordId {
        RecordId { page_no, slot_no }
    }
}

/// Ordered schema: the "type" of a tuple. Descriptors are treated as
/// logically immutable once built; `set_table_alias`/`copy` always return a
/// fresh instance rather than mutate in place.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct TupleDesc {
    pub fields: Vec<FieldType>,
}

impl TupleDesc {
    pub fn new(fields: Vec<FieldType>) -> TupleDesc {
        TupleDesc { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Concatenate `self`'s fields followed by `other`'s.
    pub fn merge(&self, other: &TupleDesc) -> TupleDesc {
        let mut fields = Vec::with_capacity(self.fields.len() + other.fields.len());
        fields.extend(self.fields.iter().cloned());
        fields.extend(other.fields.iter().cloned());
        TupleDesc::new(fields)
    }

    pub fn copy(&self) -> TupleDesc {
        TupleDesc::new(self.fields.clone())
    }

    /// Returns a copy of this descriptor with every field's table qualifier
    /// set to `alias`.
    pub fn set_table_alias(&self, alias: &str) -> TupleDesc {
        let fields = self
            .fields
            .iter()
            .map(|f| FieldType::new(&f.name, alias, f.ty))
            .collect();
        TupleDesc::new(fields)
    }

    /// Best match for `wanted` within `self`, following `project`'s lookup
    /// rule: same name and (same type, or `wanted.ty == Unknown`); prefer a
    /// table-qualifier match; ambiguous if `wanted`'s qualifier is empty and
    /// more than one field shares the name.
    fn find_field(&self, wanted: &FieldType) -> SmallResult<usize> {
        let mut best: Option<usize> = None;
        for (i, f) in self.fields.iter().enumerate() {
            if f.name == wanted.name && (f.ty == wanted.ty || wanted.ty == DBType::Unknown) {
                if wanted.table_qualifier.is_empty() && best.is_some() {
                    return Err(SmallError::new(
                        ErrorKind::AmbiguousName,
                        &format!("select name {} is ambiguous", f.name),
                    ));
                }
                if f.table_qualifier == wanted.table_qualifier || best.is_none() {
                    best = Some(i);
                }
            }
        }
        best.ok_or_else(|| {
            SmallError::new(
                ErrorKind::IncompatibleTypes,
                &format!(
                    "field {}.{} not found",
                    wanted.table_qualifier, wanted.name
                ),
            )
        })
    }

    pub fn bytes_per_tuple(&self, string_length: usize) -> usize {
        self.fields
            .iter()
            .map(|f| match f.ty {
                DBType::Int => 8,
                DBType::String => string_length,
                DBType::Unknown => 0,
            })
            .sum()
    }
}

impl std::fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|ft| format!("{}.{}({})", ft.table_qualifier, ft.name, ft.ty))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// A single row: a descriptor, the field values it carries, and (if the
/// tuple was produced by a heap-file iterator) the record id it came from.
#[derive(Clone, Debug)]
pub struct Tuple {
    pub desc: TupleDesc,
    pub fields: Vec<DBValue>,
    pub rid: Option<RecordId>,
}

impl Tuple {
    pub fn new(desc: TupleDesc, fields: Vec<DBValue>) -> Tuple {
        debug_assert_eq!(desc.len(), fields.len());
        Tuple {
            desc,
            fields,
            rid: None,
        }
    }

    pub fn with_rid(desc: TupleDesc, fields: Vec<DBValue>, rid: RecordId) -> Tuple {
        Tuple {
            desc,
            fields,
            rid: Some(rid),
        }
    }

    /// Concatenate two tuples' descriptors and field values.
    pub fn join(left: &Tuple, right: &Tuple) -> Tuple {
        let desc = left.desc.merge(&right.desc);
        let mut fields = Vec::with_capacity(left.fields.len() + right.fields.len());
        fields.extend(left.fields.iter().cloned());
        fields.extend(right.fields.iter().cloned());
        Tuple::new(desc, fields)
    }

    pub fn equals(&self, other: &Tuple) -> bool {
        self.desc == other.desc && self.fields == other.fields
    }

    /// Build a new tuple containing exactly `wanted`'s fields, in order.
    pub fn project(&self, wanted: &[FieldType]) -> SmallResult<Tuple> {
        let mut fields = Vec::with_capacity(wanted.len());
        let mut out_fields = Vec::with_capacity(wanted.len());
        for w in wanted {
            let idx = self.desc.find_field(w)?;
            fields.push(self.fields[idx].clone());
            out_fields.push(FieldType::new(&w.name, &self.desc.fields[idx].table_qualifier, self.desc.fields[idx].ty));
        }
        Ok(Tuple::new(TupleDesc::new(out_fields), fields))
    }

    /// Evaluate `expr` on both `self` and `other` and compare the results.
    pub fn compare_field(&self, other: &Tuple, expr: &dyn Expr) -> SmallResult<Ordered> {
        let lhs = expr.eval(Some(self))?;
        let rhs = expr.eval(Some(other))?;
        match (&lhs, &rhs) {
            (DBValue::Int(a), DBValue::Int(b)) => Ok(if a < b {
                Ordered::Less
            } else if a > b {
                Ordered::Greater
            } else {
                Ordered::Equal
            }),
            (DBValue::String(a), DBValue::String(b)) => Ok(if a < b {
                Ordered::Less
            } else if a > b {
                Ordered::Greater
            } else {
                Ordered::Equal
            }),
            _ => Err(SmallError::new(
                ErrorKind::TypeMismatch,
                "compare_field: mismatched field types",
            )),
        }
    }

    /// Serialize this tuple's fields, in declaration order, into `buf`.
    /// Integers are 8-byte little-endian; strings are left-aligned and
    /// zero-padded to exactly `string_length` bytes.
    pub fn write_to(&self, buf: &mut Vec<u8>, string_length: usize) -> SmallResult {
        for (field, val) in self.desc.fields.iter().zip(self.fields.iter()) {
            match (field.ty, val) {
                (DBType::Int, DBValue::Int(v)) => buf.extend_from_slice(&v.to_le_bytes()),
                (DBType::String, DBValue::String(s)) => {
                    let bytes = s.as_bytes();
                    if bytes.len() > string_length {
                        return Err(SmallError::new(
                            ErrorKind::TypeMismatch,
                            "string field exceeds configured string_length",
                        ));
                    }
                    let mut padded = vec![0u8; string_length];
                    padded[..bytes.len()].copy_from_slice(bytes);
                    buf.extend_from_slice(&padded);
                }
                _ => {
                    return Err(SmallError::new(
                        ErrorKind::TypeMismatch,
                        "tuple field does not match its descriptor's declared type",
                    ))
                }
            }
        }
        Ok(())
    }

    /// Inverse of `write_to`: read a tuple matching `desc` out of `buf`
    /// starting at `offset`. Trailing NUL bytes are stripped from strings.
    pub fn read_from(buf: &[u8], offset: usize, desc: &TupleDesc, string_length: usize) -> SmallResult<Tuple> {
        let mut pos = offset;
        let mut fields = Vec::with_capacity(desc.len());
        for field in &desc.fields {
            match field.ty {
                DBType::Int => {
                    let mut arr = [0u8; 8];
                    arr.copy_from_slice(&buf[pos..pos + 8]);
                    fields.push(DBValue::Int(i64::from_le_bytes(arr)));
                    pos += 8;
                }
                DBType::String => {
                    let raw = &buf[pos..pos + string_length];
                    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                    let s = String::from_utf8_lossy(&raw[..end]).into_owned();
                    fields.push(DBValue::String(s));
                    pos += string_length;
                }
                DBType::Unknown => {
                    return Err(SmallError::new(
                        ErrorKind::MalformedData,
                        "cannot decode a field of Unknown type",
                    ))
                }
            }
        }
        Ok(Tuple::new(desc.copy(), fields))
    }

    /// Stable hash over `(desc, fields)`, suitable as a map key for DISTINCT
    /// projection or group-by.
    pub fn tuple_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.desc.hash(&mut hasher);
        self.fields.hash(&mut hasher);
        hasher.finish()
    }
}
