//! Drives the simulation clock and runs a [`Script`] one tick at a time.

use std::rc::Rc;

use fdm_core::document::Element;
use fdm_core::{NodeId, PropertyRegistry};

use crate::builder::build_script;
use crate::error::ScriptError;
use crate::model::{Operand, Script, WhenBlock};

/// Outcome of one [`ScriptEngine::run_one_tick`] call.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub sim_time: f64,
    /// Indices into the script's `when_blocks` that fired this tick.
    pub fired: Vec<usize>,
    pub done: bool,
}

/// Loads a [`Script`] against a registry and steps it tick by tick,
/// advancing `sim-time-sec` and firing `when` blocks per the rising-edge
/// / persistent rule.
pub struct ScriptEngine {
    registry: Rc<PropertyRegistry>,
    script: Script,
    sim_time_node: NodeId,
    ever_fired: Vec<bool>,
}

impl ScriptEngine {
    fn new(registry: Rc<PropertyRegistry>, script: Script) -> Self {
        let sim_time_node = registry.get_or_create_node("sim-time-sec");
        let ever_fired = vec![false; script.when_blocks.len()];
        Self {
            registry,
            script,
            sim_time_node,
            ever_fired,
        }
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Advance `sim-time-sec` by `dt`, evaluate every `when` block, and
    /// fire the ones whose guard demands it.
    pub fn run_one_tick(&mut self, dt: f64) -> Result<TickReport, ScriptError> {
        self.registry.begin_frame();

        let sim_time = self.registry.read(self.sim_time_node) + dt;
        self.registry.write(self.sim_time_node, sim_time)?;

        let mut fired = Vec::new();
        for (i, block) in self.script.when_blocks.iter().enumerate() {
            if block.tick(&self.registry, dt)? {
                fired.push(i);
                self.ever_fired[i] = true;
            }
        }

        tracing::debug!(sim_time, fired = fired.len(), "script tick complete");

        Ok(TickReport {
            sim_time,
            fired,
            done: self.is_done(sim_time),
        })
    }

    /// Whether the configured end time has been reached, or every block
    /// has fired at least once and none is currently re-triggerable.
    /// This is a heuristic approximation of "none remain firable": a
    /// persistent block whose guard holds right now could still fire on
    /// the next tick, so it is treated as still firable.
    fn is_done(&self, sim_time: f64) -> bool {
        if let Some(end) = self.script.end_time {
            if sim_time >= end {
                return true;
            }
        }
        !self.ever_fired.is_empty()
            && self.ever_fired.iter().all(|f| *f)
            && self
                .script
                .when_blocks
                .iter()
                .all(|b| !(b.persistent && b.last_guard()))
    }
}

/// Parse `doc` into a [`Script`] and verify every property it references
/// already exists in `registry`, per script-load failure semantics.
pub fn load_script(registry: &Rc<PropertyRegistry>, doc: &Element) -> Result<ScriptEngine, ScriptError> {
    let script = build_script(doc)?;
    validate_resolves(&script, registry)?;
    Ok(ScriptEngine::new(Rc::clone(registry), script))
}

fn validate_resolves(script: &Script, registry: &PropertyRegistry) -> Result<(), ScriptError> {
    for block in &script.when_blocks {
        for condition in &block.conditions {
            resolve_or_err(condition.lhs.path(), registry)?;
            if let Operand::Property(p) = &condition.rhs {
                resolve_or_err(p.path(), registry)?;
            }
        }
        for action in &block.actions {
            resolve_or_err(action.target.path(), registry)?;
        }
    }
    Ok(())
}

fn resolve_or_err(path: &str, registry: &PropertyRegistry) -> Result<(), ScriptError> {
    if registry.has_node(path) {
        Ok(())
    } else {
        Err(ScriptError::UnresolvedProperty { path: path.to_owned() })
    }
}

#[cfg(test)]
mod engine_tests;
