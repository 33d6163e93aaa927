//! Converts a parsed `<script>` [`Element`] tree into a [`Script`].

use fdm_core::document::Element;
use fdm_core::PropertyRef;

use crate::error::ScriptError;
use crate::model::{Action, Comparator, Condition, Operand, Script, WhenBlock};

fn malformed(element: &str, detail: impl Into<String>) -> ScriptError {
    ScriptError::MalformedScript {
        detail: format!("<{element}>: {}", detail.into()),
    }
}

/// Build a [`Script`] from a parsed `<script>` document. Property
/// existence is not checked here; callers validate against a registry at
/// load time (see `fdm_script::engine::load_script`).
pub fn build_script(root: &Element) -> Result<Script, ScriptError> {
    if root.tag != "script" {
        return Err(malformed("script", format!("expected <script> root, found <{}>", root.tag)));
    }

    let end_time = root
        .child_named("run")
        .and_then(|r| r.attr("end-time"))
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| malformed("run", "`end-time` is not a number"))
        })
        .transpose()?;

    let when_blocks = root
        .children_named("when")
        .map(build_when_block)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Script { when_blocks, end_time })
}

fn build_when_block(elem: &Element) -> Result<WhenBlock, ScriptError> {
    let persistent = matches!(elem.attr("persistent"), Some("true") | Some("1"));

    let conditions = elem
        .children_named("condition")
        .map(build_condition)
        .collect::<Result<Vec<_>, _>>()?;
    if conditions.is_empty() {
        return Err(malformed("when", "requires at least one <condition>"));
    }

    let actions = elem
        .children_named("action")
        .map(build_action)
        .collect::<Result<Vec<_>, _>>()?;
    if actions.is_empty() {
        return Err(malformed("when", "requires at least one <action>"));
    }

    Ok(WhenBlock::new(conditions, actions, persistent))
}

fn build_condition(elem: &Element) -> Result<Condition, ScriptError> {
    let property = elem
        .attr("property")
        .ok_or_else(|| malformed("condition", "missing `property` attribute"))?;
    let comparator = parse_comparator(
        elem.attr("comparator")
            .ok_or_else(|| malformed("condition", "missing `comparator` attribute"))?,
    )?;

    let rhs = if let Some(v) = elem.attr("value") {
        let v: f64 = v
            .parse()
            .map_err(|_| malformed("condition", "`value` is not a number"))?;
        Operand::Constant(v)
    } else if let Some(p) = elem.attr("property2") {
        Operand::Property(PropertyRef::new(p))
    } else {
        return Err(malformed("condition", "requires either `value` or `property2`"));
    };

    Ok(Condition {
        lhs: PropertyRef::new(property),
        comparator,
        rhs,
    })
}

fn parse_comparator(s: &str) -> Result<Comparator, ScriptError> {
    Ok(match s {
        "lt" => Comparator::Lt,
        "le" => Comparator::Le,
        "eq" => Comparator::Eq,
        "ne" => Comparator::Ne,
        "ge" => Comparator::Ge,
        "gt" => Comparator::Gt,
        other => return Err(malformed("condition", format!("unknown comparator `{other}`"))),
    })
}

fn build_action(elem: &Element) -> Result<Action, ScriptError> {
    let target = elem
        .attr("target")
        .ok_or_else(|| malformed("action", "missing `target` attribute"))?;
    let value: f64 = elem
        .attr("value")
        .ok_or_else(|| malformed("action", "missing `value` attribute"))?
        .parse()
        .map_err(|_| malformed("action", "`value` is not a number"))?;
    let tc = elem
        .attr("tc")
        .map(|s| s.parse::<f64>().map_err(|_| malformed("action", "`tc` is not a number")))
        .transpose()?;

    match elem.attr("type").unwrap_or("step") {
        "step" => Ok(Action::step(PropertyRef::new(target), Operand::Constant(value))),
        "ramp" => Ok(Action::ramp(
            PropertyRef::new(target),
            Operand::Constant(value),
            tc.ok_or_else(|| malformed("action", "ramp requires `tc`"))?,
        )),
        "exp" => Ok(Action::exp(
            PropertyRef::new(target),
            Operand::Constant(value),
            tc.ok_or_else(|| malformed("action", "exp requires `tc`"))?,
        )),
        other => Err(malformed("action", format!("unknown action type `{other}`"))),
    }
}

#[cfg(test)]
mod builder_tests;
