use crate::error::{ErrorKind, SmallError, SmallResult};
use crate::tuple::Tuple;
use crate::types::{DBType, DBValue, FieldType};

/// A field reference or constant, evaluated against an optional tuple.
/// Operators hold `Box<dyn Expr>` and never depend on a concrete variant;
/// `ConstExpr`/`FieldExpr` below are the two realizations needed to exercise
/// and test them. A full expression language (arithmetic, functions, SQL
/// parsing) is out of scope here.
pub trait Expr: std::fmt::Debug {
    fn eval(&self, tuple: Option<&Tuple>) -> SmallResult<DBValue>;

    /// The field this expression resolves to, if it names exactly one.
    fn field(&self) -> Option<FieldType> {
        None
    }

    /// The type this expression produces, known without evaluating it
    /// against any particular tuple. Used for construction-time type
    /// checks (e.g. `Filter::new`).
    fn result_type(&self) -> DBType;
}

#[derive(Debug, Clone)]
pub struct ConstExpr {
    pub value: DBValue,
}

impl ConstExpr {
    pub fn new(value: DBValue) -> ConstExpr {
        ConstExpr { value }
    }
}

impl Expr for ConstExpr {
    fn eval(&self, _tuple: Option<&Tuple>) -> SmallResult<DBValue> {
        Ok(self.value.clone())
    }

    fn result_type(&self) -> DBType {
        self.value.ty()
    }
}

#[derive(Debug, Clone)]
pub struct FieldExpr {
    pub field: FieldType,
}

impl FieldExpr {
    pub fn new(name: &str, table_qualifier: &str, ty: DBType) -> FieldExpr {
        FieldExpr {
            field: FieldType::new(name, table_qualifier, ty),
        }
    }
}

impl Expr for FieldExpr {
    fn eval(&self, tuple: Option<&Tuple>) -> SmallResult<DBValue> {
        let t = tuple.ok_or_else(|| {
            SmallError::new(ErrorKind::TypeMismatch, "FieldExpr::eval requires a tuple, got None")
        })?;
        let projected = t.project(&[self.field.clone()])?;
        Ok(projected.fields[0].clone())
    }

    fn field(&self) -> Option<FieldType> {
        Some(self.field.clone())
    }

    fn result_type(&self) -> DBType {
        self.field.ty
    }
}
