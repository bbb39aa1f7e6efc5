//! Dependency resolution and evaluation over an exposure set.
//!
//! Evaluation runs in two phases. The first phase computes every raw value
//! in topological order: depth-first over declared dependencies, with
//! declaration order breaking ties. Cycles and references to undeclared
//! names are rejected before anything is evaluated. The second phase shapes
//! the output locals: private exposures are dropped, and truthy values of
//! decorate-enabled exposures are wrapped into parts.

use std::collections::HashMap;

use minijinja::value::Value;

use crate::env::RenderEnv;
use crate::error::{Result, ViewError};
use crate::exposure::ExposureSet;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

/// Evaluation order over the whole set, dependencies first.
pub(crate) fn topological_order(set: &ExposureSet) -> Result<Vec<String>> {
    let mut order = Vec::with_capacity(set.len());
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut trail: Vec<&str> = Vec::new();

    for exposure in set.iter() {
        visit(exposure.name(), set, &mut marks, &mut trail, &mut order)?;
    }
    Ok(order)
}

fn visit<'a>(
    name: &'a str,
    set: &'a ExposureSet,
    marks: &mut HashMap<&'a str, Mark>,
    trail: &mut Vec<&'a str>,
    order: &mut Vec<String>,
) -> Result<()> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = trail.iter().position(|seen| *seen == name).unwrap_or(0);
            let mut cycle: Vec<String> = trail[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(name.to_string());
            return Err(ViewError::CyclicDependency { cycle });
        }
        None => {}
    }

    marks.insert(name, Mark::Visiting);
    trail.push(name);

    let Some(exposure) = set.get(name) else {
        return Ok(());
    };
    for dependency in exposure.dependencies() {
        if !set.contains(dependency) {
            return Err(ViewError::UnknownDependency {
                exposure: name.to_string(),
                dependency: dependency.clone(),
            });
        }
        visit(dependency, set, marks, trail, order)?;
    }

    trail.pop();
    marks.insert(name, Mark::Done);
    order.push(name.to_string());
    Ok(())
}

impl ExposureSet {
    /// Evaluates every exposure against `input`, returning the locals for
    /// rendering: private values dropped, truthy decorate-enabled values
    /// wrapped as parts of the given environment.
    pub fn evaluate(
        &self,
        input: &HashMap<String, Value>,
        env: &RenderEnv,
    ) -> Result<HashMap<String, Value>> {
        let order = topological_order(self)?;

        let mut raw: HashMap<String, Value> = HashMap::with_capacity(order.len());
        for name in &order {
            let Some(exposure) = self.get(name) else {
                continue;
            };
            let deps: Vec<Value> = exposure
                .dependencies()
                .iter()
                .map(|dep| raw[dep].clone())
                .collect();
            let value = exposure.evaluate(&deps, input, self.receiver())?;
            raw.insert(name.clone(), value);
        }

        let mut locals = HashMap::new();
        for exposure in self.iter() {
            if exposure.is_private() {
                continue;
            }
            let value = raw.remove(exposure.name()).unwrap_or(Value::UNDEFINED);
            let value = if exposure.decorate() && value.is_true() {
                env.part_as(exposure.name(), value, exposure.rename())?
            } else {
                value
            };
            locals.insert(exposure.name().to_string(), value);
        }
        Ok(locals)
    }
}
