//! Payload builder
//!
//! Projects a draft onto the minimal field set of one save level.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::fields::Field;
use crate::levels::{fields_for, SaveLevel};
use crate::session::ProposalSession;

/// Build the payload submitted at `level`.
///
/// Intervention fields are removed from a copy of the draft first whenever
/// the project type does not call for them, so a stale selection never
/// reaches a later level. Only fields the level owns and the draft defines
/// are copied.
pub fn build_payload(session: &ProposalSession, level: SaveLevel) -> Result<Map<String, Value>> {
    let fields = fields_for(level)?;

    let mut scoped = session.clone();
    let needs_interventions = scoped
        .answers
        .project_type()
        .is_some_and(|t| t.requires_intervention_types());
    if !needs_interventions {
        for field in Field::INTERVENTION_FIELDS {
            scoped.answers.clear(field);
        }
    }

    Ok(fields
        .iter()
        .filter_map(|field| {
            scoped
                .value_of(*field)
                .map(|value| (field.key().to_string(), value))
        })
        .collect())
}
