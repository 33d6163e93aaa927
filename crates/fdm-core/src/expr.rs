//! The Expression Model: a tagged sum of constants, property references,
//! n-ary operators, lookup tables, and parameter-bound template calls.
//!
//! Every [`Expression`] carries an optional publishable name and a
//! memoisation slot keyed by the registry's frame counter (see the
//! "Cached evaluation" design note): within one frame, a node's value is
//! computed once and reused by every caller that reaches it again.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::EvalError;
use crate::registry::{PropertyRef, PropertyRegistry};
use crate::table::Table;

/// Operator kinds available inside an [`Expression`] tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// Single-child wrapper used at the root of a built expression tree.
    TopLevel,
    Product,
    Sum,
    Difference,
    Quotient,
    Pow,
    Abs,
    Sin,
    Cos,
    Tan,
    ASin,
    ACos,
    ATan,
    ATan2,
}

impl OperatorKind {
    /// Minimum number of children this operator requires.
    pub fn min_arity(self) -> usize {
        match self {
            OperatorKind::TopLevel
            | OperatorKind::Abs
            | OperatorKind::Sin
            | OperatorKind::Cos
            | OperatorKind::Tan
            | OperatorKind::ASin
            | OperatorKind::ACos
            | OperatorKind::ATan => 1,
            OperatorKind::Quotient | OperatorKind::Pow | OperatorKind::ATan2 => 2,
            OperatorKind::Product | OperatorKind::Sum | OperatorKind::Difference => 2,
        }
    }

    /// Maximum number of children this operator accepts, if bounded.
    pub fn max_arity(self) -> Option<usize> {
        match self {
            OperatorKind::TopLevel
            | OperatorKind::Abs
            | OperatorKind::Sin
            | OperatorKind::Cos
            | OperatorKind::Tan
            | OperatorKind::ASin
            | OperatorKind::ACos
            | OperatorKind::ATan => Some(1),
            OperatorKind::Quotient | OperatorKind::Pow | OperatorKind::ATan2 => Some(2),
            OperatorKind::Product | OperatorKind::Sum | OperatorKind::Difference => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            OperatorKind::TopLevel => "top-level",
            OperatorKind::Product => "product",
            OperatorKind::Sum => "sum",
            OperatorKind::Difference => "difference",
            OperatorKind::Quotient => "quotient",
            OperatorKind::Pow => "pow",
            OperatorKind::Abs => "abs",
            OperatorKind::Sin => "sin",
            OperatorKind::Cos => "cos",
            OperatorKind::Tan => "tan",
            OperatorKind::ASin => "asin",
            OperatorKind::ACos => "acos",
            OperatorKind::ATan => "atan",
            OperatorKind::ATan2 => "atan2",
        }
    }
}

/// A reusable sub-expression parameterised by one late-bound property
/// reference. The body may reference [`ExprKind::Parameter`] wherever the
/// call-site argument should be substituted.
#[derive(Debug)]
pub struct Template {
    pub name: String,
    pub body: Expression,
}

/// Tagged sum of the node kinds an [`Expression`] can hold.
#[derive(Debug)]
pub enum ExprKind {
    Constant(f64),
    PropertyRef(PropertyRef),
    Operator {
        kind: OperatorKind,
        children: Vec<Expression>,
    },
    Table(Table),
    TemplateCall {
        template: Rc<Template>,
        argument: PropertyRef,
    },
    /// Placeholder inside a [`Template`] body, substituted by the calling
    /// `TemplateCall`'s argument value during evaluation.
    Parameter,
}

/// One node of an expression tree.
///
/// `name` is set only on nodes the builder published into the Property
/// Registry as a tied node (typically the tree root). The memoisation
/// slot is private and transparent to callers: [`Expression::evaluate`]
/// consults the registry's current frame to decide whether to reuse it.
#[derive(Debug)]
pub struct Expression {
    pub name: Option<String>,
    pub kind: ExprKind,
    memo: Cell<Option<(u64, f64)>>,
}

impl Expression {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            name: None,
            kind,
            memo: Cell::new(None),
        }
    }

    pub fn named(name: impl Into<String>, kind: ExprKind) -> Self {
        Self {
            name: Some(name.into()),
            kind,
            memo: Cell::new(None),
        }
    }

    pub fn constant(v: f64) -> Self {
        Self::new(ExprKind::Constant(v))
    }

    pub fn property_ref(r: PropertyRef) -> Self {
        Self::new(ExprKind::PropertyRef(r))
    }

    pub fn operator(kind: OperatorKind, children: Vec<Expression>) -> Self {
        Self::new(ExprKind::Operator { kind, children })
    }

    pub fn table(table: Table) -> Self {
        Self::new(ExprKind::Table(table))
    }

    /// Whether this node's value is independent of any property read,
    /// i.e. safe to fold at build time. Property references, tables, and
    /// template calls are never constant; an operator is constant only
    /// when every child is.
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            ExprKind::Constant(_) => true,
            ExprKind::PropertyRef(_) | ExprKind::Table(_) | ExprKind::TemplateCall { .. } | ExprKind::Parameter => {
                false
            }
            ExprKind::Operator { children, .. } => children.iter().all(Expression::is_constant),
        }
    }

    /// Evaluate this node against `registry`, honoring the frame-keyed
    /// memoisation slot. A failed evaluation is never cached.
    pub fn evaluate(&self, registry: &PropertyRegistry) -> Result<f64, EvalError> {
        self.evaluate_with_param(registry, None)
    }

    fn evaluate_with_param(&self, registry: &PropertyRegistry, param: Option<f64>) -> Result<f64, EvalError> {
        if param.is_none() {
            if let Some((frame, value)) = self.memo.get() {
                if frame == registry.current_frame() {
                    return Ok(value);
                }
            }
        }

        let value = self.compute(registry, param)?;

        if param.is_none() {
            self.memo.set(Some((registry.current_frame(), value)));
        }
        Ok(value)
    }

    fn compute(&self, registry: &PropertyRegistry, param: Option<f64>) -> Result<f64, EvalError> {
        match &self.kind {
            ExprKind::Constant(v) => Ok(*v),
            ExprKind::Parameter => {
                param.ok_or_else(|| EvalError::NumericFailure {
                    op: "parameter",
                    detail: "referenced outside a template call".to_owned(),
                })
            }
            ExprKind::PropertyRef(r) => Ok(r.read(registry)?),
            ExprKind::Table(t) => Ok(t.get_value(registry)?),
            ExprKind::Operator { kind, children } => {
                let values = children
                    .iter()
                    .map(|c| c.evaluate_with_param(registry, param))
                    .collect::<Result<Vec<_>, _>>()?;
                eval_operator(*kind, &values)
            }
            ExprKind::TemplateCall { template, argument } => {
                let arg_value = argument.read(registry)?;
                template.body.evaluate_with_param(registry, Some(arg_value))
            }
        }
    }
}

fn eval_operator(kind: OperatorKind, values: &[f64]) -> Result<f64, EvalError> {
    match kind {
        OperatorKind::TopLevel => Ok(values[0]),
        OperatorKind::Product => Ok(values.iter().product()),
        OperatorKind::Sum => Ok(values.iter().sum()),
        OperatorKind::Difference => Ok(values[0] - values[1..].iter().sum::<f64>()),
        OperatorKind::Quotient => {
            if values[1] == 0.0 {
                return Err(EvalError::NumericFailure {
                    op: kind.name(),
                    detail: "division by zero".to_owned(),
                });
            }
            Ok(values[0] / values[1])
        }
        OperatorKind::Pow => {
            let result = values[0].powf(values[1]);
            if result.is_finite() {
                Ok(result)
            } else {
                Err(EvalError::NumericFailure {
                    op: kind.name(),
                    detail: format!("{}^{} is not finite", values[0], values[1]),
                })
            }
        }
        OperatorKind::Abs => Ok(values[0].abs()),
        OperatorKind::Sin => Ok(values[0].sin()),
        OperatorKind::Cos => Ok(values[0].cos()),
        OperatorKind::Tan => Ok(values[0].tan()),
        OperatorKind::ASin => Ok(values[0].clamp(-1.0, 1.0).asin()),
        OperatorKind::ACos => Ok(values[0].clamp(-1.0, 1.0).acos()),
        OperatorKind::ATan => Ok(values[0].atan()),
        OperatorKind::ATan2 => Ok(values[0].atan2(values[1])),
    }
}

#[cfg(test)]
mod expr_tests;
