use std::fmt;

/// The type of a tuple field. `Unknown` is a wildcard used only while a field
/// reference is being resolved against a schema (see `Tuple::project`).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum DBType {
    Int,
    String,
    Unknown,
}

impl fmt::Display for DBType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DBType::Int => write!(f, "int"),
            DBType::String => write!(f, "string"),
            DBType::Unknown => write!(f, "unknown"),
        }
    }
}

/// `(name, table_qualifier, type)`. Equality requires all three to match;
/// `Unknown` is only ever used on the "wanted" side of a lookup.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct FieldType {
    pub name: String,
    pub table_qualifier: String,
    pub ty: DBType,
}

impl FieldType {
    pub fn new(name: &str, table_qualifier: &str, ty: DBType) -> FieldType {
        FieldType {
            name: name.to_string(),
            table_qualifier: table_qualifier.to_string(),
            ty,
        }
    }
}

/// A closed tagged union over the two field types the engine supports. Per
/// the spec's design notes this replaces a type-parameterized/trait-object
/// representation with monomorphized comparison.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DBValue {
    Int(i64),
    String(String),
}

impl DBValue {
    pub fn ty(&self) -> DBType {
        match self {
            DBValue::Int(_) => DBType::Int,
            DBValue::String(_) => DBType::String,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            DBValue::Int(v) => Some(*v),
            DBValue::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DBValue::String(s) => Some(s.as_str()),
            DBValue::Int(_) => None,
        }
    }
}

impl fmt::Display for DBValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DBValue::Int(v) => write!(f, "{}", v),
            DBValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// The outcome of comparing two field values, used by `OrderBy` and
/// `Tuple::compare_field`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Ordered {
    Less,
    Equal,
    Greater,
}

/// Comparison operators a `Filter` may apply between a field and a constant.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BoolOp {
    LessThan,
    LessThanOrEqual,
    Equals,
    NotEquals,
    GreaterThanOrEqual,
    GreaterThan,
}

impl BoolOp {
    pub fn apply<T: PartialOrd>(&self, lhs: &T, rhs: &T) -> bool {
        match self {
            BoolOp::LessThan => lhs < rhs,
            BoolOp::LessThanOrEqual => lhs <= rhs,
            BoolOp::Equals => lhs == rhs,
            BoolOp::NotEquals => lhs != rhs,
            BoolOp::GreaterThanOrEqual => lhs >= rhs,
            BoolOp::GreaterThan => lhs > rhs,
        }
    }
}
