//! Converts a parsed [`Element`] tree into typed [`Expression`]/[`Table`]
//! values, the same raw-tree-then-convert shape used elsewhere in this
//! workspace for turning a document format into an in-memory model.

use std::rc::{Rc, Weak};

use fdm_core::document::Element;
use fdm_core::{ExprKind, Expression, OperatorKind, PropertyRef, PropertyRegistry, Table, TableBuilder};

use crate::error::BuildError;

/// A `<function>` element built and published into the registry: its path
/// and the expression tree backing it.
pub struct BuiltFunction {
    pub name: String,
    pub expr: Rc<Expression>,
}

fn operator_kind(tag: &str) -> Option<OperatorKind> {
    Some(match tag {
        "product" => OperatorKind::Product,
        "sum" => OperatorKind::Sum,
        "difference" => OperatorKind::Difference,
        "quotient" => OperatorKind::Quotient,
        "pow" => OperatorKind::Pow,
        "abs" => OperatorKind::Abs,
        "sin" => OperatorKind::Sin,
        "cos" => OperatorKind::Cos,
        "tan" => OperatorKind::Tan,
        "asin" => OperatorKind::ASin,
        "acos" => OperatorKind::ACos,
        "atan" => OperatorKind::ATan,
        "atan2" => OperatorKind::ATan2,
        _ => return None,
    })
}

/// Build and publish every top-level `<function>` element of `root`.
pub fn build_document(registry: &Rc<PropertyRegistry>, root: &Element) -> Result<Vec<BuiltFunction>, BuildError> {
    root.children_named("function")
        .map(|elem| build_function(registry, elem))
        .collect()
}

/// Build a single `<function name="...">` element and tie it into the
/// registry under `name`, backed by its own evaluation.
pub fn build_function(registry: &Rc<PropertyRegistry>, elem: &Element) -> Result<BuiltFunction, BuildError> {
    let name = elem
        .attr("name")
        .ok_or_else(|| BuildError::MalformedDocument {
            element: "function".to_owned(),
            detail: "missing required `name` attribute".to_owned(),
        })?
        .to_owned();

    let body = build_sole_child(elem, "function")?;
    let tree = Rc::new(Expression::named(
        name.clone(),
        ExprKind::Operator {
            kind: OperatorKind::TopLevel,
            children: vec![body],
        },
    ));

    let weak: Weak<PropertyRegistry> = Rc::downgrade(registry);
    let supplier_tree = Rc::clone(&tree);
    let supplier_name = name.clone();
    registry.tie(&name, move || {
        let registry = weak
            .upgrade()
            .expect("registry dropped while a tied function outlived it");
        supplier_tree.evaluate(&registry).unwrap_or_else(|e| {
            tracing::warn!(function = %supplier_name, error = %e, "function evaluation failed");
            f64::NAN
        })
    })?;

    tracing::debug!(name, "published function");
    Ok(BuiltFunction { name, expr: tree })
}

/// Build a single expression without publishing it, for tables and
/// templates that embed a sub-expression inline. `context` names the
/// enclosing element, for error messages.
fn build_sole_child(parent: &Element, context: &str) -> Result<Expression, BuildError> {
    let mut candidates = parent.children.iter().filter(|c| c.tag != "description");
    let first = candidates.next().ok_or_else(|| BuildError::MalformedDocument {
        element: context.to_owned(),
        detail: "expected exactly one value-producing child".to_owned(),
    })?;
    if candidates.next().is_some() {
        return Err(BuildError::MalformedDocument {
            element: context.to_owned(),
            detail: "expected exactly one value-producing child, found more than one".to_owned(),
        });
    }
    build_expr_node(first)
}

fn build_expr_node(elem: &Element) -> Result<Expression, BuildError> {
    match elem.tag.as_str() {
        "property" => {
            let path = elem.text.trim();
            if path.is_empty() {
                return Err(BuildError::MalformedDocument {
                    element: "property".to_owned(),
                    detail: "empty property path".to_owned(),
                });
            }
            Ok(Expression::property_ref(PropertyRef::new(path)))
        }
        "value" => {
            let v = elem.text_as_f64().ok_or_else(|| BuildError::MalformedDocument {
                element: "value".to_owned(),
                detail: format!("`{}` is not a number", elem.text.trim()),
            })?;
            Ok(Expression::constant(v))
        }
        "table" => Ok(Expression::table(build_table(elem)?)),
        "function" => {
            // A nested function reuses the same build path but is not tied:
            // only top-level functions publish into the registry.
            let body = build_sole_child(elem, "function")?;
            Ok(Expression::operator(OperatorKind::TopLevel, vec![body]))
        }
        tag => {
            let Some(kind) = operator_kind(tag) else {
                return Err(BuildError::UnknownOperator { tag: tag.to_owned() });
            };
            let children = elem
                .children
                .iter()
                .filter(|c| c.tag != "description")
                .map(build_expr_node)
                .collect::<Result<Vec<_>, _>>()?;
            validate_arity(kind, children.len(), tag)?;
            Ok(Expression::operator(kind, children))
        }
    }
}

fn validate_arity(kind: OperatorKind, n: usize, tag: &str) -> Result<(), BuildError> {
    if n < kind.min_arity() {
        return Err(BuildError::MalformedDocument {
            element: tag.to_owned(),
            detail: format!("requires at least {} children, found {n}", kind.min_arity()),
        });
    }
    if let Some(max) = kind.max_arity() {
        if n > max {
            return Err(BuildError::MalformedDocument {
                element: tag.to_owned(),
                detail: format!("accepts at most {max} children, found {n}"),
            });
        }
    }
    Ok(())
}

fn parse_numbers(line: &str) -> Result<Vec<f64>, BuildError> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| BuildError::MalformedDocument {
                element: "tableData".to_owned(),
                detail: format!("invalid number `{tok}`"),
            })
        })
        .collect()
}

/// Parse a 2D `tableData` block: the first non-empty line holds the column
/// keys, every following line holds a row key followed by one value per
/// column.
fn parse_2d_block(text: &str) -> Result<(Vec<f64>, Vec<f64>, Vec<Vec<f64>>), BuildError> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() < 2 {
        return Err(BuildError::MalformedDocument {
            element: "tableData".to_owned(),
            detail: "2D table data requires a column-key line and at least one row".to_owned(),
        });
    }

    let col_keys = parse_numbers(lines[0])?;
    let mut row_keys = Vec::with_capacity(lines.len() - 1);
    let mut data = Vec::with_capacity(lines.len() - 1);
    for line in &lines[1..] {
        let nums = parse_numbers(line)?;
        if nums.len() != col_keys.len() + 1 {
            return Err(BuildError::MalformedDocument {
                element: "tableData".to_owned(),
                detail: format!("row has {} values, expected {}", nums.len().saturating_sub(1), col_keys.len()),
            });
        }
        row_keys.push(nums[0]);
        data.push(nums[1..].to_vec());
    }
    Ok((row_keys, col_keys, data))
}

fn infer_internal_rank(text: &str) -> Result<usize, BuildError> {
    let first_line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| BuildError::MalformedDocument {
            element: "tableData".to_owned(),
            detail: "empty table data".to_owned(),
        })?;
    match first_line.split_whitespace().count() {
        2 => Ok(1),
        n if n > 2 => Ok(2),
        n => Err(BuildError::MalformedDocument {
            element: "tableData".to_owned(),
            detail: format!("cannot infer table rank from a {n}-column first line"),
        }),
    }
}

/// Build a [`Table`] from a `<table>` element per the lookup-table
/// construction rules: `independentVar` children declare axes (bare =
/// row), `type="internal"` tables take their axes from their owning
/// aggregator instead, and multiple `tableData` blocks (each carrying a
/// `breakPoint`) make a rank-3 table.
pub fn build_table(elem: &Element) -> Result<Table, BuildError> {
    let is_internal = elem.attr("type") == Some("internal");
    let ivars: Vec<&Element> = elem.children_named("independentVar").collect();
    if is_internal && !ivars.is_empty() {
        return Err(BuildError::MalformedDocument {
            element: "table".to_owned(),
            detail: "type=\"internal\" may not combine with explicit independentVar elements".to_owned(),
        });
    }

    let mut row_ref = None;
    let mut col_ref = None;
    let mut table_ref = None;
    for iv in &ivars {
        let lookup = iv.attr("lookup").unwrap_or("row");
        let path = iv.text.trim();
        if path.is_empty() {
            return Err(BuildError::MalformedDocument {
                element: "independentVar".to_owned(),
                detail: "empty axis property path".to_owned(),
            });
        }
        let r = PropertyRef::new(path);
        match lookup {
            "row" => row_ref = Some(r),
            "column" => col_ref = Some(r),
            "table" => table_ref = Some(r),
            other => {
                return Err(BuildError::MalformedDocument {
                    element: "independentVar".to_owned(),
                    detail: format!("unknown lookup axis `{other}`"),
                })
            }
        }
    }

    let blocks: Vec<&Element> = elem.children_named("tableData").collect();
    if blocks.is_empty() {
        return Err(BuildError::MalformedDocument {
            element: "table".to_owned(),
            detail: "no tableData element present".to_owned(),
        });
    }

    let name = elem.attr("name").unwrap_or("table").to_owned();
    let mut builder = TableBuilder::new(name);
    if let Some(r) = row_ref {
        builder = builder.row_ref(r);
    }
    if let Some(r) = col_ref {
        builder = builder.col_ref(r);
    }
    if let Some(r) = table_ref {
        builder = builder.table_ref(r);
    }

    let table = if blocks.len() > 1 {
        let mut breakpoints = Vec::with_capacity(blocks.len());
        let mut subtables = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let bp = block
                .attr("breakPoint")
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| BuildError::MalformedDocument {
                    element: "tableData".to_owned(),
                    detail: "missing or invalid breakPoint attribute".to_owned(),
                })?;
            breakpoints.push(bp);
            subtables.push(parse_2d_block(&block.text)?);
        }
        builder.build_rank3(breakpoints, subtables)?
    } else {
        let rank = if !ivars.is_empty() {
            ivars.len()
        } else {
            infer_internal_rank(&blocks[0].text)?
        };
        match rank {
            1 => {
                let nums = blocks[0].text_as_f64_list();
                if nums.is_empty() || nums.len() % 2 != 0 {
                    return Err(BuildError::MalformedDocument {
                        element: "tableData".to_owned(),
                        detail: "1D table data must be an even count of key/value pairs".to_owned(),
                    });
                }
                let keys: Vec<f64> = nums.iter().step_by(2).copied().collect();
                let values: Vec<f64> = nums.iter().skip(1).step_by(2).copied().collect();
                builder.build_rank1(keys, values)?
            }
            2 => {
                let (rows, cols, data) = parse_2d_block(&blocks[0].text)?;
                builder.build_rank2(rows, cols, data)?
            }
            other => {
                return Err(BuildError::MalformedDocument {
                    element: "table".to_owned(),
                    detail: format!("unsupported table rank {other}"),
                })
            }
        }
    };
    Ok(table)
}

#[cfg(test)]
mod builder_tests;
