//! `fdm run-script <script> --ticks N --dt SEC` — step a script document.

use std::path::Path;
use std::rc::Rc;

use fdm_core::{document, PropertyRegistry};

use super::read_to_string;
use crate::error::CliError;

pub fn run(script_path: &Path, ticks: u32, dt: f64) -> Result<(), CliError> {
    let text = read_to_string(script_path)?;
    let root = document::parse(&text)?;

    let registry = Rc::new(PropertyRegistry::new());
    let mut engine = fdm_script::load_script(&registry, &root)?;

    for tick in 1..=ticks {
        let report = engine.run_one_tick(dt)?;
        if report.fired.is_empty() {
            println!("tick {tick}: t={:.3}", report.sim_time);
        } else {
            println!("tick {tick}: t={:.3} fired blocks {:?}", report.sim_time, report.fired);
        }
        if report.done {
            println!("script reports done at t={:.3}", report.sim_time);
            break;
        }
    }
    Ok(())
}
