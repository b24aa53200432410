//! Lazy query plans.
//!
//! A [`Plan`] records the operations composed on it as a tree of
//! [`PlanNode`]s. Types are checked while the tree is built; rows are only
//! produced by [`Plan::execute`], which runs the tree against a [`Catalog`]
//! of named in-memory tables.
//!
//! Plans are persistent: composing one never changes it, so the same subplan
//! can feed several parents (a full outer join reads both inputs twice).
//! One execution evaluates each shared node once.

use std::fmt;
use std::sync::Arc;

use quarry_ast::{Lambda, Ty};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::context::QueryContext;
use crate::error::QueryError;
use crate::sequence::Sequence;
use crate::source::{
    check_predicate, check_same_elements, check_unary, correlated_ty, flattened_ty, QuerySource,
};

/// Named tables a plan's scans read from.
pub type Catalog = FxHashMap<String, Sequence>;

#[derive(Clone, Debug)]
pub struct Plan {
    ctx: Arc<QueryContext>,
    ty: Ty,
    node: Arc<PlanNode>,
}

#[derive(Debug)]
pub enum PlanNode {
    Scan {
        table: String,
    },
    Correlate {
        outer: Plan,
        inner: Plan,
        outer_key: Lambda,
        inner_key: Lambda,
    },
    FlattenWithDefault {
        input: Plan,
    },
    Project {
        input: Plan,
        selector: Lambda,
    },
    Filter {
        input: Plan,
        predicate: Lambda,
    },
    Union {
        left: Plan,
        right: Plan,
    },
    Concat {
        left: Plan,
        right: Plan,
    },
}

impl PlanNode {
    fn kind(&self) -> &'static str {
        match self {
            PlanNode::Scan { .. } => "scan",
            PlanNode::Correlate { .. } => "correlate",
            PlanNode::FlattenWithDefault { .. } => "flatten_with_default",
            PlanNode::Project { .. } => "project",
            PlanNode::Filter { .. } => "filter",
            PlanNode::Union { .. } => "union",
            PlanNode::Concat { .. } => "concat",
        }
    }

    fn inputs(&self) -> Vec<&Plan> {
        match self {
            PlanNode::Scan { .. } => vec![],
            PlanNode::Correlate { outer, inner, .. } => vec![outer, inner],
            PlanNode::FlattenWithDefault { input }
            | PlanNode::Project { input, .. }
            | PlanNode::Filter { input, .. } => vec![input],
            PlanNode::Union { left, right } | PlanNode::Concat { left, right } => vec![left, right],
        }
    }
}

/// Identity of a node within one execution.
type NodeKey = *const PlanNode;

/// State for one [`Plan::execute`] call.
struct Executor<'c> {
    catalog: &'c Catalog,
    /// How many parents read each node; only nodes read more than once are
    /// kept in `done`.
    uses: FxHashMap<NodeKey, usize>,
    done: FxHashMap<NodeKey, Sequence>,
    evaluated: usize,
}

impl<'c> Executor<'c> {
    fn new(catalog: &'c Catalog, root: &Plan) -> Self {
        let mut exec = Executor {
            catalog,
            uses: FxHashMap::default(),
            done: FxHashMap::default(),
            evaluated: 0,
        };
        exec.count_uses(root);
        exec
    }

    fn count_uses(&mut self, plan: &Plan) {
        let seen = self.uses.entry(plan.key()).or_insert(0);
        *seen += 1;
        if *seen == 1 {
            for input in plan.node.inputs() {
                self.count_uses(input);
            }
        }
    }

    fn run(&mut self, plan: &Plan) -> Result<Sequence, QueryError> {
        let key = plan.key();
        if let Some(rows) = self.done.get(&key) {
            trace!(node = plan.node.kind(), "reusing shared plan node");
            return Ok(rows.clone());
        }
        let rows = self.eval(plan)?;
        if self.uses.get(&key).copied().unwrap_or(0) > 1 {
            self.done.insert(key, rows.clone());
        }
        Ok(rows)
    }

    fn eval(&mut self, plan: &Plan) -> Result<Sequence, QueryError> {
        trace!(node = plan.node.kind(), ty = %plan.ty, "executing plan node");
        self.evaluated += 1;
        match &*plan.node {
            PlanNode::Scan { table } => {
                let rows = self
                    .catalog
                    .get(table)
                    .ok_or_else(|| QueryError::UnknownTable(table.clone()))?;
                check_same_elements("scan", &plan.ty, rows.element_ty())?;
                Ok(rows.clone())
            }
            PlanNode::Correlate {
                outer,
                inner,
                outer_key,
                inner_key,
            } => {
                let outer = self.run(outer)?;
                outer.correlate(self.run(inner)?, outer_key, inner_key)
            }
            PlanNode::FlattenWithDefault { input } => self.run(input)?.flatten_with_default(),
            PlanNode::Project { input, selector } => self.run(input)?.project(selector),
            PlanNode::Filter { input, predicate } => self.run(input)?.filter(predicate),
            PlanNode::Union { left, right } => {
                let left = self.run(left)?;
                left.union(self.run(right)?)
            }
            PlanNode::Concat { left, right } => {
                let left = self.run(left)?;
                left.concat(self.run(right)?)
            }
        }
    }
}

impl Plan {
    /// Read table `table` from the catalog; its rows must be of type `ty`.
    pub fn scan(ctx: &Arc<QueryContext>, table: impl Into<String>, ty: Ty) -> Self {
        Plan {
            ctx: Arc::clone(ctx),
            ty,
            node: Arc::new(PlanNode::Scan {
                table: table.into(),
            }),
        }
    }

    pub fn node(&self) -> &PlanNode {
        &self.node
    }

    fn derive(&self, ty: Ty, node: PlanNode) -> Self {
        Plan {
            ctx: Arc::clone(&self.ctx),
            ty,
            node: Arc::new(node),
        }
    }

    fn key(&self) -> NodeKey {
        Arc::as_ptr(&self.node)
    }

    pub fn execute(&self, catalog: &Catalog) -> Result<Sequence, QueryError> {
        let mut exec = Executor::new(catalog, self);
        let rows = exec.run(self)?;
        debug!(
            nodes = exec.evaluated,
            shared = exec.done.len(),
            rows = rows.len(),
            "executed plan"
        );
        Ok(rows)
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:width$}", "", width = depth * 2)?;
        let children: Vec<&Plan> = match &*self.node {
            PlanNode::Scan { table } => {
                return write!(f, "Scan {}: {}", table, self.ty);
            }
            PlanNode::Correlate {
                outer,
                inner,
                outer_key,
                inner_key,
            } => {
                write!(f, "Correlate {} = {}", outer_key, inner_key)?;
                vec![outer, inner]
            }
            PlanNode::FlattenWithDefault { input } => {
                write!(f, "FlattenWithDefault: {}", self.ty)?;
                vec![input]
            }
            PlanNode::Project { input, selector } => {
                write!(f, "Project {}", selector)?;
                vec![input]
            }
            PlanNode::Filter { input, predicate } => {
                write!(f, "Filter {}", predicate)?;
                vec![input]
            }
            PlanNode::Union { left, right } => {
                write!(f, "Union")?;
                vec![left, right]
            }
            PlanNode::Concat { left, right } => {
                write!(f, "Concat")?;
                vec![left, right]
            }
        };
        for child in children {
            writeln!(f)?;
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl QuerySource for Plan {
    fn context(&self) -> &Arc<QueryContext> {
        &self.ctx
    }

    fn element_ty(&self) -> &Ty {
        &self.ty
    }

    fn correlate(self, inner: Self, outer_key: &Lambda, inner_key: &Lambda) -> Result<Self, QueryError> {
        let ty = correlated_ty(&self.ty, &inner.ty, outer_key, inner_key)?;
        let node = PlanNode::Correlate {
            outer: self.clone(),
            inner,
            outer_key: outer_key.clone(),
            inner_key: inner_key.clone(),
        };
        Ok(self.derive(ty, node))
    }

    fn flatten_with_default(self) -> Result<Self, QueryError> {
        let ty = flattened_ty(&self.ty)?;
        let node = PlanNode::FlattenWithDefault { input: self.clone() };
        Ok(self.derive(ty, node))
    }

    fn project(self, selector: &Lambda) -> Result<Self, QueryError> {
        check_unary("project", selector, &self.ty)?;
        let node = PlanNode::Project {
            input: self.clone(),
            selector: selector.clone(),
        };
        Ok(self.derive(selector.ret_ty(), node))
    }

    fn filter(self, predicate: &Lambda) -> Result<Self, QueryError> {
        check_predicate(predicate, &self.ty)?;
        let node = PlanNode::Filter {
            input: self.clone(),
            predicate: predicate.clone(),
        };
        Ok(self.derive(self.ty.clone(), node))
    }

    fn union(self, other: Self) -> Result<Self, QueryError> {
        check_same_elements("union", &self.ty, &other.ty)?;
        let node = PlanNode::Union {
            left: self.clone(),
            right: other,
        };
        Ok(self.derive(self.ty.clone(), node))
    }

    fn concat(self, other: Self) -> Result<Self, QueryError> {
        check_same_elements("concat", &self.ty, &other.ty)?;
        let node = PlanNode::Concat {
            left: self.clone(),
            right: other,
        };
        Ok(self.derive(self.ty.clone(), node))
    }
}
