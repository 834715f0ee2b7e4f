use std::collections::HashSet;

use crate::error::{ErrorKind, SmallError, SmallResult};
use crate::expr::Expr;
use crate::operators::Operator;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::FieldType;

/// Evaluates `select_exprs` against each input tuple and assembles the
/// results under a descriptor renamed to `output_names`, in order. With
/// `distinct` set, only the first occurrence of each resulting tuple (by
/// `tuple_key`) is forwarded.
pub struct Project {
    child: Box<dyn Operator>,
    select_exprs: Vec<Box<dyn Expr>>,
    desc: TupleDesc,
    distinct: bool,
    seen: HashSet<u64>,
}

impl Project {
    /// Fails with `ParseError` if `select_exprs` and `output_names` have
    /// different lengths.
    pub fn new(
        child: Box<dyn Operator>,
        select_exprs: Vec<Box<dyn Expr>>,
        output_names: Vec<String>,
        distinct: bool,
    ) -> SmallResult<Project> {
        if select_exprs.len() != output_names.len() {
            return Err(SmallError::new(
                ErrorKind::ParseError,
                "project: select_exprs and output_names have different lengths",
            ));
        }
        let fields = select_exprs
            .iter()
            .zip(output_names.iter())
            .map(|(e, name)| FieldType::new(name, "", e.result_type()))
            .collect();
        Ok(Project {
            child,
            select_exprs,
            desc: TupleDesc::new(fields),
            distinct,
            seen: HashSet::new(),
        })
    }
}

impl Operator for Project {
    fn open(&mut self) -> SmallResult {
        self.child.open()
    }

    fn next(&mut self) -> SmallResult<Option<Tuple>> {
        loop {
            match self.child.next()? {
                None => return Ok(None),
                Some(tuple) => {
                    let mut fields = Vec::with_capacity(self.select_exprs.len());
                    for expr in &self.select_exprs {
                        fields.push(expr.eval(Some(&tuple))?);
                    }
                    let projected = Tuple::new(self.desc.copy(), fields);
                    if self.distinct {
                        let key = projected.tuple_key();
                        if !self.seen.insert(key) {
                            continue;
                        }
                    }
                    return Ok(Some(projected));
                }
            }
        }
    }

    fn rewind(&mut self) -> SmallResult {
        self.seen.clear();
        self.child.rewind()
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn close(&mut self) {
        self.child.close()
    }
}
