//! Navigation engine
//!
//! Pure functions over the step registry: which edge a submission takes,
//! where it leads, and what a page's back link is. Nothing here reads or
//! writes a session store; callers pass the draft explicitly.

use crate::error::{ProposalError, Result};
use crate::fields::Answers;
use crate::session::ProposalSession;
use crate::steps::{descriptor, BackRule, Guard, Mode, StepId, Target, Transition};

/// First edge out of `step` whose guard and mode match.
pub fn next_transition(step: StepId, answers: &Answers, mode: Mode) -> Result<&'static Transition> {
    descriptor(step)?
        .transitions
        .iter()
        .find(|t| t.matches(answers, mode))
        .ok_or(ProposalError::NoTransition { step, mode })
}

/// Page reached after a valid submission of `step`.
pub fn next_step(step: StepId, answers: &Answers, mode: Mode) -> Result<Target> {
    next_transition(step, answers, mode).map(|t| t.to)
}

/// Back link for `step`; `None` on the first page of a new proposal.
pub fn back_link(step: StepId, session: &ProposalSession) -> Result<Option<Target>> {
    let mode = session.mode();
    let target = match (descriptor(step)?.back, mode) {
        (BackRule::Previous(previous), _) => Some(Target::Step(previous)),
        (BackRule::Summary, _) | (_, Mode::Edit) => Some(Target::Summary),
        (BackRule::Entry, Mode::Create) => None,
        (BackRule::PreviousOrSummary(previous), Mode::Create) => Some(Target::Step(previous)),
        (BackRule::AfterProjectType, Mode::Create) => {
            Some(Target::Step(last_project_type_page(&session.answers)))
        }
    };
    Ok(target)
}

fn last_project_type_page(answers: &Answers) -> StepId {
    if Guard::InterventionsNotRequired.holds(answers) {
        StepId::ProjectType
    } else if Guard::SingleIntervention.holds(answers) {
        StepId::InterventionTypes
    } else {
        StepId::PrimaryInterventionType
    }
}
