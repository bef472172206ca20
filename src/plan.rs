//! Schema-driven plan computation shared by every resource.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};
use crate::types::{AttributeChange, PlanResult};

/// The value of `attr` unless it is unset.
fn present<'a>(attr: &Attribute, value: Option<&'a Value>) -> Option<&'a Value> {
    value.filter(|v| !attr.is_unset(Some(v)))
}

/// Compute the plan for moving a resource from `prior` to `proposed`.
///
/// Defaults declared in the schema are applied to the proposal first.
/// Unset values (null, or `""` for strings) compare equal to absent ones.
/// Computed attributes absent from the proposal keep their prior value
/// unless the resource is being replaced. Any change to a force-new
/// attribute marks the plan as a replacement. A null proposal plans a
/// delete.
pub fn plan_resource(
    schema: &Schema,
    prior: Option<&Value>,
    proposed: Value,
) -> Result<PlanResult, ProviderError> {
    let prior = prior.filter(|state| !state.is_null());

    let mut planned = match proposed {
        Value::Null => {
            let changes = match prior {
                Some(Value::Object(prior)) => prior
                    .iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(name, value)| AttributeChange::removed(name.clone(), value.clone()))
                    .collect(),
                _ => Vec::new(),
            };
            return Ok(PlanResult::with_changes(Value::Null, changes, false));
        },
        Value::Object(map) => map,
        other => {
            return Err(ProviderError::Validation(format!(
                "proposed state must be an object, got {other}"
            )))
        },
    };

    for (name, attr) in &schema.attributes {
        if let Some(default) = &attr.default {
            if attr.is_unset(planned.get(name)) {
                planned.insert(name.clone(), default.clone());
            }
        }
    }

    let prior_map = match prior {
        None => None,
        Some(Value::Object(map)) => Some(map),
        Some(other) => {
            return Err(ProviderError::Validation(format!(
                "prior state must be an object, got {other}"
            )))
        },
    };

    let Some(prior_map) = prior_map else {
        let changes = planned
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| AttributeChange::added(name.clone(), value.clone()))
            .collect();
        return Ok(PlanResult::with_changes(Value::Object(planned), changes, false));
    };

    let mut changes = Vec::new();
    let mut requires_replace = false;
    for (name, attr) in &schema.attributes {
        let before = present(attr, prior_map.get(name));
        let after = present(attr, planned.get(name));

        if attr.is_computed() && after.is_none() {
            continue;
        }
        if before == after {
            continue;
        }
        if attr.force_new {
            debug!(attribute = %name, "Change forces replacement");
            requires_replace = true;
        }
        changes.push(AttributeChange::new(name.clone(), before.cloned(), after.cloned()));
    }

    for name in schema.blocks.keys() {
        let before = prior_map.get(name).filter(|v| !v.is_null());
        let after = planned.get(name).filter(|v| !v.is_null());
        if before != after {
            changes.push(AttributeChange::new(name.clone(), before.cloned(), after.cloned()));
        }
    }

    if !requires_replace {
        carry_computed(schema, prior_map, &mut planned);
    }

    if changes.is_empty() {
        return Ok(PlanResult::no_change(Value::Object(planned)));
    }
    Ok(PlanResult::with_changes(
        Value::Object(planned),
        changes,
        requires_replace,
    ))
}

/// Copy computed values the proposal left unset from the prior state.
fn carry_computed(schema: &Schema, prior: &Map<String, Value>, planned: &mut Map<String, Value>) {
    for (name, attr) in &schema.attributes {
        if !attr.is_computed() || !attr.is_unset(planned.get(name)) {
            continue;
        }
        if let Some(value) = present(attr, prior.get(name)) {
            planned.insert(name.clone(), value.clone());
        }
    }
}
