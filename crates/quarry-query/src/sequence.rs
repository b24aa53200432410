//! Eager in-memory query source.

use std::sync::Arc;

use quarry_ast::{Lambda, Ty, Value};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::context::{grouping_value, join_row_value, QueryContext, GROUPING, GROUP_FIELD, OUTER_FIELD};
use crate::error::QueryError;
use crate::source::{
    check_predicate, check_same_elements, check_unary, correlated_ty, flattened_ty, QuerySource,
};

/// Hash table from join key to inner row indices, in inner order.
type KeyTable = FxHashMap<Value, Vec<usize>>;

/// A materialized list of values of one element type.
#[derive(Clone, Debug)]
pub struct Sequence {
    ctx: Arc<QueryContext>,
    elem_ty: Ty,
    rows: Vec<Value>,
}

impl Sequence {
    pub fn new(ctx: &Arc<QueryContext>, elem_ty: Ty, rows: Vec<Value>) -> Self {
        Sequence {
            ctx: Arc::clone(ctx),
            elem_ty,
            rows,
        }
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn with_rows(&self, elem_ty: Ty, rows: Vec<Value>) -> Self {
        Sequence::new(&self.ctx, elem_ty, rows)
    }
}

fn build_key_table(rows: &[Value], key: &Lambda, null_keys_match: bool) -> Result<KeyTable, QueryError> {
    let key = key.compile();
    let mut table = KeyTable::default();
    for (idx, row) in rows.iter().enumerate() {
        let k = key.call(std::slice::from_ref(row))?;
        if k.is_null() && !null_keys_match {
            continue;
        }
        table.entry(k).or_default().push(idx);
    }
    Ok(table)
}

impl QuerySource for Sequence {
    fn context(&self) -> &Arc<QueryContext> {
        &self.ctx
    }

    fn element_ty(&self) -> &Ty {
        &self.elem_ty
    }

    fn correlate(self, inner: Self, outer_key: &Lambda, inner_key: &Lambda) -> Result<Self, QueryError> {
        let ty = correlated_ty(&self.elem_ty, &inner.elem_ty, outer_key, inner_key)?;
        let null_keys_match = self.ctx.join_options().null_keys_match;
        let table = build_key_table(&inner.rows, inner_key, null_keys_match)?;
        let outer_key = outer_key.compile();

        let mut out = Vec::with_capacity(self.rows.len());
        let mut matched = 0usize;
        for row in &self.rows {
            let k = outer_key.call(std::slice::from_ref(row))?;
            // Null keys never reach the table unless they are allowed to match.
            let group: Vec<Value> = table
                .get(&k)
                .map(|indices| indices.iter().map(|&i| inner.rows[i].clone()).collect())
                .unwrap_or_default();
            if !group.is_empty() {
                matched += 1;
            }
            out.push(grouping_value(row.clone(), group));
        }
        debug!(
            outer = self.rows.len(),
            inner = inner.rows.len(),
            distinct_keys = table.len(),
            matched,
            "correlated"
        );
        Ok(self.with_rows(ty, out))
    }

    fn flatten_with_default(self) -> Result<Self, QueryError> {
        let ty = flattened_ty(&self.elem_ty)?;
        let mut out = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let record = row.as_record().ok_or(QueryError::MalformedRow(GROUPING))?;
            let outer = record.get(OUTER_FIELD).ok_or(QueryError::MalformedRow(GROUPING))?;
            match record.get(GROUP_FIELD) {
                Some(Value::List(group)) if group.is_empty() => {
                    out.push(join_row_value(outer.clone(), Value::Null));
                }
                Some(Value::List(group)) => {
                    out.extend(group.iter().map(|inner| join_row_value(outer.clone(), inner.clone())));
                }
                _ => return Err(QueryError::MalformedRow(GROUPING)),
            }
        }
        Ok(self.with_rows(ty, out))
    }

    fn project(self, selector: &Lambda) -> Result<Self, QueryError> {
        check_unary("project", selector, &self.elem_ty)?;
        let f = selector.compile();
        let rows = self
            .rows
            .iter()
            .map(|row| f.call(std::slice::from_ref(row)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with_rows(selector.ret_ty(), rows))
    }

    fn filter(self, predicate: &Lambda) -> Result<Self, QueryError> {
        check_predicate(predicate, &self.elem_ty)?;
        let f = predicate.compile();
        let mut rows = Vec::new();
        for row in self.rows {
            if f.call(std::slice::from_ref(&row))? == Value::Bool(true) {
                rows.push(row);
            }
        }
        Ok(Sequence {
            ctx: self.ctx,
            elem_ty: self.elem_ty,
            rows,
        })
    }

    fn union(self, other: Self) -> Result<Self, QueryError> {
        check_same_elements("union", &self.elem_ty, &other.elem_ty)?;
        let mut seen = FxHashSet::default();
        let rows = self
            .rows
            .into_iter()
            .chain(other.rows)
            .filter(|row| seen.insert(row.clone()))
            .collect();
        Ok(Sequence {
            ctx: self.ctx,
            elem_ty: self.elem_ty,
            rows,
        })
    }

    fn concat(mut self, other: Self) -> Result<Self, QueryError> {
        check_same_elements("concat", &self.elem_ty, &other.elem_ty)?;
        self.rows.extend(other.rows);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_ast::{Expr, Param, TypeRegistry};

    fn ints(ctx: &Arc<QueryContext>, xs: &[i64]) -> Sequence {
        Sequence::new(ctx, Ty::int(), xs.iter().map(|&x| Value::Int(x)).collect())
    }

    fn identity() -> Lambda {
        let x = Param::new("x", Ty::int());
        Lambda::new(vec![x.clone()], Expr::param(&x))
    }

    #[test]
    fn flatten_keeps_group_order_and_pads_empty_groups() {
        let ctx = QueryContext::new(TypeRegistry::new()).unwrap();
        let rows = ints(&ctx, &[2, 9])
            .correlate(ints(&ctx, &[2, 5, 2]), &identity(), &identity())
            .unwrap()
            .flatten_with_default()
            .unwrap();
        assert_eq!(rows.element_ty().to_string(), "JoinRow<Int, Option<Int>>");
        let rendered: Vec<String> = rows.rows().iter().map(Value::to_string).collect();
        assert_eq!(
            rendered,
            [
                "JoinRow { outer: 2, inner: 2 }",
                "JoinRow { outer: 2, inner: 2 }",
                "JoinRow { outer: 9, inner: null }",
            ]
        );
    }

    #[test]
    fn union_keeps_first_occurrences_in_order() {
        let ctx = QueryContext::new(TypeRegistry::new()).unwrap();
        let out = ints(&ctx, &[3, 1, 3]).union(ints(&ctx, &[2, 1])).unwrap();
        assert_eq!(out.rows(), &[Value::Int(3), Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn concat_requires_matching_elements() {
        let ctx = QueryContext::new(TypeRegistry::new()).unwrap();
        let strings = Sequence::new(&ctx, Ty::string(), vec!["a".into()]);
        assert!(matches!(
            ints(&ctx, &[1]).concat(strings),
            Err(QueryError::ElementTypeMismatch { op: "concat", .. })
        ));
    }
}
