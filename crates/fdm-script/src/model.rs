//! The script data model: `WhenBlock`/`Condition`/`Action`, matching
//! `spec.md` §3's description of a script as an ordered list of guarded
//! action rules.

use std::cell::Cell;

use fdm_core::{PropertyRef, PropertyRegistry, RegistryError};

use crate::error::ScriptError;

/// Comparison operators available in a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl Comparator {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Lt => lhs < rhs,
            Comparator::Le => lhs <= rhs,
            Comparator::Eq => lhs == rhs,
            Comparator::Ne => lhs != rhs,
            Comparator::Ge => lhs >= rhs,
            Comparator::Gt => lhs > rhs,
        }
    }
}

/// The right-hand side of a [`Condition`], or the value an [`Action`]
/// drives its target toward: either a literal constant or another
/// property's current value.
#[derive(Debug)]
pub enum Operand {
    Constant(f64),
    Property(PropertyRef),
}

impl Operand {
    pub fn read(&self, registry: &PropertyRegistry) -> Result<f64, RegistryError> {
        match self {
            Operand::Constant(v) => Ok(*v),
            Operand::Property(r) => r.read(registry),
        }
    }
}

/// One comparison: `lhs ⋈ rhs`, where `rhs` may itself be a property.
#[derive(Debug)]
pub struct Condition {
    pub lhs: PropertyRef,
    pub comparator: Comparator,
    pub rhs: Operand,
}

impl Condition {
    pub fn evaluate(&self, registry: &PropertyRegistry) -> Result<bool, RegistryError> {
        let lhs = self.lhs.read(registry)?;
        let rhs = self.rhs.read(registry)?;
        Ok(self.comparator.apply(lhs, rhs))
    }
}

/// Which of the three action kinds an [`Action`] performs on firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Step,
    Ramp,
    Exp,
}

/// A single assignment to a target property, performed when its owning
/// [`WhenBlock`] fires.
///
/// `ramp`'s progress is tracked in `ramp_state`: `(start_value,
/// elapsed_seconds)`, reset whenever the action starts firing again after
/// having been inactive. `exp` needs no such state — its formula is
/// purely a function of the target's current value.
#[derive(Debug)]
pub struct Action {
    pub kind: ActionKind,
    pub target: PropertyRef,
    pub value: Operand,
    pub tc: Option<f64>,
    ramp_state: Cell<Option<(f64, f64)>>,
}

impl Action {
    pub fn step(target: PropertyRef, value: Operand) -> Self {
        Self {
            kind: ActionKind::Step,
            target,
            value,
            tc: None,
            ramp_state: Cell::new(None),
        }
    }

    pub fn ramp(target: PropertyRef, value: Operand, tc: f64) -> Self {
        Self {
            kind: ActionKind::Ramp,
            target,
            value,
            tc: Some(tc),
            ramp_state: Cell::new(None),
        }
    }

    pub fn exp(target: PropertyRef, value: Operand, tc: f64) -> Self {
        Self {
            kind: ActionKind::Exp,
            target,
            value,
            tc: Some(tc),
            ramp_state: Cell::new(None),
        }
    }

    /// Apply this action for one tick of width `dt`. `rising_edge` marks
    /// the first tick the owning block's guard has been true since it
    /// last was false, which restarts a ramp's progress.
    pub fn fire(&self, registry: &PropertyRegistry, dt: f64, rising_edge: bool) -> Result<(), ScriptError> {
        let value = self.value.read(registry)?;
        let node = self.target.resolve(registry)?;

        match self.kind {
            ActionKind::Step => {
                registry.write(node, value)?;
            }
            ActionKind::Ramp => {
                let tc = self.tc.unwrap_or(1.0).max(f64::EPSILON);
                if rising_edge || self.ramp_state.get().is_none() {
                    self.ramp_state.set(Some((registry.read(node), 0.0)));
                }
                let (start, elapsed) = self.ramp_state.get().expect("just initialised above");
                let elapsed = elapsed + dt;
                self.ramp_state.set(Some((start, elapsed)));
                let frac = (elapsed / tc).clamp(0.0, 1.0);
                registry.write(node, start + frac * (value - start))?;
            }
            ActionKind::Exp => {
                let tc = self.tc.unwrap_or(1.0).max(f64::EPSILON);
                let current = registry.read(node);
                let next = current + (value - current) * (1.0 - (-dt / tc).exp());
                registry.write(node, next)?;
            }
        }
        Ok(())
    }
}

/// A guard plus the actions it fires. Fires on the rising edge of its
/// conjunction of conditions, or every tick the conjunction holds when
/// `persistent`.
#[derive(Debug)]
pub struct WhenBlock {
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    pub persistent: bool,
    was_true: Cell<bool>,
}

impl WhenBlock {
    pub fn new(conditions: Vec<Condition>, actions: Vec<Action>, persistent: bool) -> Self {
        Self {
            conditions,
            actions,
            persistent,
            was_true: Cell::new(false),
        }
    }

    fn guard(&self, registry: &PropertyRegistry) -> Result<bool, RegistryError> {
        for condition in &self.conditions {
            if !condition.evaluate(registry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether the guard was true as of the most recent `tick` call.
    pub fn last_guard(&self) -> bool {
        self.was_true.get()
    }

    /// Evaluate the guard and fire actions per the rising-edge/persistent
    /// rule. Returns whether it fired this tick.
    pub fn tick(&self, registry: &PropertyRegistry, dt: f64) -> Result<bool, ScriptError> {
        let guard = self.guard(registry)?;
        let rising_edge = guard && !self.was_true.get();
        let should_fire = guard && (self.persistent || rising_edge);
        if should_fire {
            for action in &self.actions {
                action.fire(registry, dt, rising_edge)?;
            }
            tracing::debug!(persistent = self.persistent, rising_edge, "when block fired");
        }
        self.was_true.set(guard);
        Ok(should_fire)
    }
}

/// An ordered collection of [`WhenBlock`]s plus an optional configured
/// end time, parsed from a script document.
#[derive(Debug)]
pub struct Script {
    pub when_blocks: Vec<WhenBlock>,
    pub end_time: Option<f64>,
}

#[cfg(test)]
mod model_tests;
