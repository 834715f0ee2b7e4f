use crate::error::{ErrorKind, SmallError, SmallResult};
use crate::expr::Expr;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{DBType, DBValue, FieldType};

/// Incremental aggregation state for one group (or for the whole relation,
/// when there is no GROUP BY). `Aggregator` holds one `AggState` per group
/// and folds tuples into it one at a time, rather than materializing every
/// group's tuples before computing a result.
pub trait AggState: std::fmt::Debug {
    /// A fresh accumulator of the same kind as `self`, for a new group.
    fn init(&self) -> Box<dyn AggState>;

    fn add_tuple(&mut self, expr: &dyn Expr, tuple: &Tuple) -> SmallResult;

    /// The descriptor of the single field this aggregate produces.
    fn descriptor(&self, field_name: &str) -> FieldType;

    fn finalize(&self) -> DBValue;
}

#[derive(Debug, Clone, Default)]
pub struct CountAgg {
    count: i64,
}

impl AggState for CountAgg {
    fn init(&self) -> Box<dyn AggState> {
        Box::new(CountAgg::default())
    }

    fn add_tuple(&mut self, _expr: &dyn Expr, _tuple: &Tuple) -> SmallResult {
        self.count += 1;
        Ok(())
    }

    fn descriptor(&self, field_name: &str) -> FieldType {
        FieldType::new(field_name, "", DBType::Int)
    }

    fn finalize(&self) -> DBValue {
        DBValue::Int(self.count)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SumAgg {
    int_sum: i64,
    saw_int: bool,
    string_values: Vec<String>,
}

impl AggState for SumAgg {
    fn init(&self) -> Box<dyn AggState> {
        Box::new(SumAgg::default())
    }

    fn add_tuple(&mut self, expr: &dyn Expr, tuple: &Tuple) -> SmallResult {
        match expr.eval(Some(tuple))? {
            DBValue::Int(v) => {
                self.int_sum += v;
                self.saw_int = true;
                Ok(())
            }
            DBValue::String(s) => {
                // Strings have no arithmetic sum; concatenation is the
                // closest analogue and is what this engine reports.
                self.string_values.push(s);
                Ok(())
            }
        }
    }

    fn descriptor(&self, field_name: &str) -> FieldType {
        let ty = if self.string_values.is_empty() {
            DBType::Int
        } else {
            DBType::String
        };
        FieldType::new(field_name, "", ty)
    }

    fn finalize(&self) -> DBValue {
        if !self.string_values.is_empty() {
            DBValue::String(self.string_values.concat())
        } else {
            DBValue::Int(self.int_sum)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AvgAgg {
    sum: SumAgg,
    count: i64,
}

impl AggState for AvgAgg {
    fn init(&self) -> Box<dyn AggState> {
        Box::new(AvgAgg::default())
    }

    fn add_tuple(&mut self, expr: &dyn Expr, tuple: &Tuple) -> SmallResult {
        self.sum.add_tuple(expr, tuple)?;
        self.count += 1;
        Ok(())
    }

    fn descriptor(&self, field_name: &str) -> FieldType {
        FieldType::new(field_name, "", DBType::Int)
    }

    fn finalize(&self) -> DBValue {
        if self.count == 0 {
            return DBValue::Int(0);
        }
        match self.sum.finalize() {
            DBValue::Int(total) => DBValue::Int(total / self.count),
            // Averaging concatenated strings is meaningless; report the
            // concatenation itself rather than fabricate a number.
            s @ DBValue::String(_) => s,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MinAgg {
    current: Option<DBValue>,
}

impl Default for MinAgg {
    fn default() -> Self {
        MinAgg { current: None }
    }
}

impl AggState for MinAgg {
    fn init(&self) -> Box<dyn AggState> {
        Box::new(MinAgg::default())
    }

    fn add_tuple(&mut self, expr: &dyn Expr, tuple: &Tuple) -> SmallResult {
        let val = expr.eval(Some(tuple))?;
        self.current = Some(match self.current.take() {
            None => val,
            Some(cur) => pick_min(cur, val)?,
        });
        Ok(())
    }

    fn descriptor(&self, field_name: &str) -> FieldType {
        let ty = match &self.current {
            Some(DBValue::String(_)) => DBType::String,
            _ => DBType::Int,
        };
        FieldType::new(field_name, "", ty)
    }

    fn finalize(&self) -> DBValue {
        self.current.clone().unwrap_or(DBValue::Int(0))
    }
}

#[derive(Debug, Clone)]
pub struct MaxAgg {
    current: Option<DBValue>,
}

impl Default for MaxAgg {
    fn default() -> Self {
        MaxAgg { current: None }
    }
}

impl AggState for MaxAgg {
    fn init(&self) -> Box<dyn AggState> {
        Box::new(MaxAgg::default())
    }

    fn add_tuple(&mut self, expr: &dyn Expr, tuple: &Tuple) -> SmallResult {
        let val = expr.eval(Some(tuple))?;
        self.current = Some(match self.current.take() {
            None => val,
            Some(cur) => pick_max(cur, val)?,
        });
        Ok(())
    }

    fn descriptor(&self, field_name: &str) -> FieldType {
        let ty = match &self.current {
            Some(DBValue::String(_)) => DBType::String,
            _ => DBType::Int,
        };
        FieldType::new(field_name, "", ty)
    }

    fn finalize(&self) -> DBValue {
        self.current.clone().unwrap_or(DBValue::Int(0))
    }
}

fn pick_min(a: DBValue, b: DBValue) -> SmallResult<DBValue> {
    match (&a, &b) {
        (DBValue::Int(x), DBValue::Int(y)) => Ok(if x <= y { a } else { b }),
        (DBValue::String(x), DBValue::String(y)) => Ok(if x <= y { a } else { b }),
        _ => Err(SmallError::new(ErrorKind::TypeMismatch, "min: mismatched types within a group")),
    }
}

fn pick_max(a: DBValue, b: DBValue) -> SmallResult<DBValue> {
    match (&a, &b) {
        (DBValue::Int(x), DBValue::Int(y)) => Ok(if x >= y { a } else { b }),
        (DBValue::String(x), DBValue::String(y)) => Ok(if x >= y { a } else { b }),
        _ => Err(SmallError::new(ErrorKind::TypeMismatch, "max: mismatched types within a group")),
    }
}

/// The kind of aggregate an `Aggregator` operator computes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AggOp {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggOp {
    pub fn new_state(&self) -> Box<dyn AggState> {
        match self {
            AggOp::Count => Box::new(CountAgg::default()),
            AggOp::Sum => Box::new(SumAgg::default()),
            AggOp::Avg => Box::new(AvgAgg::default()),
            AggOp::Min => Box::new(MinAgg::default()),
            AggOp::Max => Box::new(MaxAgg::default()),
        }
    }
}

/// Group-by field types, prepended to the concatenation of each aggregate
/// template's own output descriptor (one field per `agg_templates` entry).
pub fn result_descriptor(group_fields: &[FieldType], agg_descs: Vec<FieldType>) -> TupleDesc {
    let mut fields = Vec::with_capacity(group_fields.len() + agg_descs.len());
    fields.extend(group_fields.iter().cloned());
    fields.extend(agg_descs);
    TupleDesc::new(fields)
}
