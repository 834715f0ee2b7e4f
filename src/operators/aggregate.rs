use std::collections::HashMap;

use crate::agg_state::{result_descriptor, AggOp, AggState};
use crate::error::SmallResult;
use crate::expr::Expr;
use crate::operators::Operator;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{DBValue, FieldType};

/// One aggregate to compute per group: the expression to fold into it, the
/// kind of accumulator, and the name of its output field.
pub struct AggTemplate {
    pub expr: Box<dyn Expr>,
    pub op: AggOp,
    pub field_name: String,
}

impl AggTemplate {
    pub fn new(expr: Box<dyn Expr>, op: AggOp, field_name: &str) -> AggTemplate {
        AggTemplate {
            expr,
            op,
            field_name: field_name.to_string(),
        }
    }
}

/// Groups its input by `group_exprs` (or treats the whole input as one group
/// when empty) and folds every `agg_templates` entry into its own `AggState`
/// per group. Like `OrderBy`, this must consume its entire input before
/// producing a single output tuple.
pub struct Aggregator {
    child: Box<dyn Operator>,
    group_exprs: Vec<Box<dyn Expr>>,
    agg_templates: Vec<AggTemplate>,
    desc: TupleDesc,
    results: Vec<Tuple>,
    index: usize,
}

impl Aggregator {
    pub fn new(
        child: Box<dyn Operator>,
        group_exprs: Vec<Box<dyn Expr>>,
        group_fields: Vec<FieldType>,
        agg_templates: Vec<AggTemplate>,
    ) -> Aggregator {
        let agg_descs = agg_templates
            .iter()
            .map(|t| t.op.new_state().descriptor(&t.field_name))
            .collect();
        let desc = result_descriptor(&group_fields, agg_descs);
        Aggregator {
            child,
            group_exprs,
            agg_templates,
            desc,
            results: Vec::new(),
            index: 0,
        }
    }

    /// Evaluate every group-by expression against `tuple`, forming the key
    /// tuple (as a plain field vector) that identifies its group.
    fn group_key(&self, tuple: &Tuple) -> SmallResult<Vec<DBValue>> {
        self.group_exprs.iter().map(|expr| expr.eval(Some(tuple))).collect()
    }

    fn run(&mut self) -> SmallResult {
        self.child.rewind()?;
        let mut groups: HashMap<Vec<DBValue>, Vec<Box<dyn AggState>>> = HashMap::new();
        let mut order: Vec<Vec<DBValue>> = Vec::new();

        while let Some(tuple) = self.child.next()? {
            let key = self.group_key(&tuple)?;
            if !groups.contains_key(&key) {
                order.push(key.clone());
                let states = self.agg_templates.iter().map(|t| t.op.new_state()).collect();
                groups.insert(key.clone(), states);
            }
            let states = groups.get_mut(&key).unwrap();
            for (state, template) in states.iter_mut().zip(self.agg_templates.iter()) {
                state.add_tuple(template.expr.as_ref(), &tuple)?;
            }
        }

        self.results.clear();
        for key in order {
            let states = groups.get(&key).unwrap();
            let mut fields = Vec::with_capacity(key.len() + states.len());
            fields.extend(key.into_iter());
            for state in states {
                fields.push(state.finalize());
            }
            self.results.push(Tuple::new(self.desc.copy(), fields));
        }
        self.index = 0;
        Ok(())
    }
}

impl Operator for Aggregator {
    fn open(&mut self) -> SmallResult {
        self.child.open()?;
        self.run()
    }

    fn next(&mut self) -> SmallResult<Option<Tuple>> {
        if self.index < self.results.len() {
            let t = self.results[self.index].clone();
            self.index += 1;
            return Ok(Some(t));
        }
        Ok(None)
    }

    fn rewind(&mut self) -> SmallResult {
        self.run()
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn close(&mut self) {
        self.results.clear();
        self.child.close()
    }
}
