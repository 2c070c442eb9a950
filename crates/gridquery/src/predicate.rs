//! Filter tree compilation.
//!
//! [`Predicate::compile`] turns a wire [`FilterNode`] into a flat list of
//! typed [`Condition`]s plus an expression over their indices:
//!
//! 1. Leaves are visited in pre-order and checked against the field registry.
//! 2. Literals are coerced to the field kind; string leaves compare
//!    lower-cased and `eq` on a date/time becomes a whole-day range.
//! 3. A leaf identical to the leaf visited just before it reuses that leaf's
//!    parameter instead of adding a new one.
//! 4. The tree is rebuilt over parameter indices, honoring nested `and`/`or`.
//!
//! The compiled predicate renders as an expression such as
//! `age >= @0 and (name.lower().contains(@1) or name.lower().contains(@2))`.

use std::fmt;

use chrono::NaiveTime;
use tracing::{debug, trace};

use crate::clause::Condition;
use crate::config::QueryOptions;
use crate::error::Result;
use crate::filter::{FilterLeaf, FilterNode, Logic};
use crate::op::Operator;
use crate::traits::{resolve_field, FieldDef, FieldKind, Record};
use crate::value::Scalar;

/// Boolean structure of a compiled predicate. Leaves index into
/// [`Predicate::conditions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Matches every record.
    Always,
    Leaf(usize),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    fn combine(logic: Logic, mut children: Vec<Expr>) -> Expr {
        // `a and a` reads the same as `a`.
        children.dedup();
        match children.len() {
            0 => Expr::Always,
            1 => children.remove(0),
            _ => match logic {
                Logic::And => Expr::And(children),
                Logic::Or => Expr::Or(children),
            },
        }
    }

    fn eval(&self, test: &impl Fn(usize) -> bool) -> bool {
        match self {
            Expr::Always => true,
            Expr::Leaf(index) => test(*index),
            Expr::And(children) => children.iter().all(|child| child.eval(test)),
            Expr::Or(children) => children.iter().any(|child| child.eval(test)),
        }
    }
}

/// A compiled, executable filter.
#[derive(Debug, Clone)]
pub struct Predicate {
    expr: Expr,
    conditions: Vec<Condition>,
}

impl Predicate {
    /// A predicate that matches every record.
    pub fn always() -> Self {
        Predicate {
            expr: Expr::Always,
            conditions: Vec::new(),
        }
    }

    /// Compiles a filter tree against a record type's field registry.
    ///
    /// An absent filter, or a composite without children, compiles to
    /// [`Predicate::always`].
    ///
    /// # Errors
    ///
    /// Fails with [`crate::QueryError::FieldNotFound`] for unknown fields,
    /// [`crate::QueryError::UnsupportedOperator`] for unknown or ill-kinded
    /// operators and [`crate::QueryError::TypeCoercion`] for literals that
    /// don't fit the field.
    pub fn compile(
        filter: Option<&FilterNode>,
        fields: &'static [FieldDef],
        options: &QueryOptions,
    ) -> Result<Self> {
        let Some(filter) = filter.filter(|node| !node.is_empty()) else {
            return Ok(Predicate::always());
        };

        let mut compiler = Compiler {
            fields,
            options,
            conditions: Vec::new(),
            previous: None,
        };
        let expr = compiler.node(filter)?;
        let predicate = Predicate {
            expr,
            conditions: compiler.conditions,
        };

        debug!(
            conditions = predicate.conditions.len(),
            expression = %predicate,
            "compiled filter"
        );
        Ok(predicate)
    }

    /// Compiles a filter tree for the record type `T`.
    pub fn for_record<T: Record>(filter: Option<&FilterNode>, options: &QueryOptions) -> Result<Self> {
        Predicate::compile(filter, T::fields(), options)
    }

    /// Returns `true` if the predicate matches every record.
    pub fn is_always(&self) -> bool {
        self.expr == Expr::Always
    }

    /// Tests a record against the predicate.
    pub fn matches<T: Record + ?Sized>(&self, record: &T) -> bool {
        self.expr.eval(&|index| {
            let condition = &self.conditions[index];
            condition.matches(&record.field_value(condition.field))
        })
    }

    /// The boolean structure over condition indices.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The compiled conditions, in parameter order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// The parameter values, in the order of their `@n` indices.
    pub fn values(&self) -> impl Iterator<Item = &Scalar> {
        self.conditions.iter().map(|condition| &condition.value)
    }

    fn write_expr(&self, f: &mut fmt::Formatter<'_>, expr: &Expr, nested: bool) -> fmt::Result {
        let (children, joiner) = match expr {
            Expr::Always => return write!(f, "true"),
            Expr::Leaf(index) => return write!(f, "{}", self.conditions[*index].render(*index)),
            Expr::And(children) => (children, " and "),
            Expr::Or(children) => (children, " or "),
        };

        if nested {
            write!(f, "(")?;
        }
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", joiner)?;
            }
            self.write_expr(f, child, true)?;
        }
        if nested {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_expr(f, &self.expr, false)
    }
}

struct Compiler<'o> {
    fields: &'static [FieldDef],
    options: &'o QueryOptions,
    conditions: Vec<Condition>,
    /// The last leaf visited in pre-order and the expression it compiled to.
    previous: Option<(Condition, Expr)>,
}

impl Compiler<'_> {
    fn node(&mut self, node: &FilterNode) -> Result<Expr> {
        match node {
            FilterNode::Leaf(leaf) => self.leaf(leaf),
            FilterNode::Composite { logic, filters } => {
                let mut children = Vec::with_capacity(filters.len());
                for child in filters.iter().filter(|child| !child.is_empty()) {
                    children.push(self.node(child)?);
                }
                Ok(Expr::combine(logic.unwrap_or_default(), children))
            }
        }
    }

    fn leaf(&mut self, leaf: &FilterLeaf) -> Result<Expr> {
        let def = resolve_field(self.fields, &leaf.field)?;
        let condition = Condition::compile(leaf, def, self.options)?;

        if let Some((previous, expr)) = &self.previous {
            if previous.same_as(&condition) {
                trace!(field = def.name, operator = %condition.operator, "reusing adjacent duplicate condition");
                return Ok(expr.clone());
            }
        }

        let expr = match self.day_range(def, &condition) {
            Some((start, end)) => Expr::And(vec![self.push(start), self.push(end)]),
            None => self.push(condition.clone()),
        };
        self.previous = Some((condition, expr.clone()));
        Ok(expr)
    }

    /// `eq` on a date/time matches the whole calendar day.
    fn day_range(&self, def: &FieldDef, condition: &Condition) -> Option<(Condition, Condition)> {
        if !self.options.expand_date_equality
            || def.kind != FieldKind::DateTime
            || condition.operator != Operator::Eq
        {
            return None;
        }
        let Scalar::DateTime(dt) = condition.value else {
            return None;
        };

        let date = dt.date();
        let start = date.and_time(NaiveTime::default());
        let end = date.and_hms_opt(23, 59, 59)?;
        Some((
            Condition::typed(def.name, Operator::Gte, Scalar::DateTime(start)),
            Condition::typed(def.name, Operator::Lte, Scalar::DateTime(end)),
        ))
    }

    fn push(&mut self, condition: Condition) -> Expr {
        self.conditions.push(condition);
        Expr::Leaf(self.conditions.len() - 1)
    }
}
