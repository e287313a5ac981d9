//! Step workflow
//!
//! The write path of one page, as a pure function over an explicit draft:
//! merge the form, validate, pick the transition, apply its effect, submit
//! if the transition says so, and report where to go next. The caller owns
//! loading the draft before and storing it afterwards, whatever the outcome,
//! so entered values survive a failed submission.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::backend::{Credential, ProposalBackend};
use crate::error::{ProposalError, Result};
use crate::fields::FormValues;
use crate::levels::SaveLevel;
use crate::navigation::{back_link, next_transition};
use crate::session::ProposalSession;
use crate::steps::{descriptor, Mode, StepDescriptor, StepId, Target};
use crate::submission::submit;
use crate::validation::ValidationContext;

/// Result of a successful page submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Where to redirect
    pub target: Target,
    /// Save level sent to the backend, if any
    pub submitted: Option<SaveLevel>,
}

/// Everything needed to render a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPage {
    /// Page identity
    pub step: StepId,
    /// Journey mode
    pub mode: Mode,
    /// Current values of the fields the page owns
    pub values: Map<String, Value>,
    /// Back link path, if any
    pub back_link: Option<String>,
    /// Proposal reference, once assigned
    pub reference_number: Option<String>,
}

fn ensure_reference(descriptor: &StepDescriptor, session: &ProposalSession) -> Result<()> {
    if descriptor.requires_reference && session.reference().is_none() {
        return Err(ProposalError::MissingReference {
            page: descriptor.id.slug().to_string(),
        });
    }
    Ok(())
}

/// Read model of `step` for the current draft.
pub fn load_step(session: &ProposalSession, step: StepId) -> Result<StepPage> {
    let descriptor = descriptor(step)?;
    ensure_reference(descriptor, session)?;

    let values = descriptor
        .fields
        .iter()
        .filter_map(|field| {
            session
                .value_of(*field)
                .map(|value| (field.key().to_string(), value))
        })
        .collect();

    Ok(StepPage {
        step,
        mode: session.mode(),
        values,
        back_link: back_link(step, session)?.map(Target::path),
        reference_number: session.reference_number().map(str::to_string),
    })
}

/// Handle a submitted form for `step`.
///
/// Validation runs before navigation is computed, so a rejected form never
/// advances the journey and never reaches the network.
pub async fn process_step(
    session: &mut ProposalSession,
    step: StepId,
    form: &FormValues,
    ctx: &ValidationContext,
    credential: &Credential,
    backend: &dyn ProposalBackend,
) -> Result<StepOutcome> {
    let descriptor = descriptor(step)?;
    ensure_reference(descriptor, session)?;

    session.answers.merge_form(descriptor.fields, form);
    if let Err(errors) = descriptor.validator.validate(&session.answers, ctx) {
        debug!(step = %step, errors = %errors, "Step validation failed");
        return Err(ProposalError::Validation(errors));
    }

    let mode = session.mode();
    let transition = next_transition(step, &session.answers, mode).map_err(|err| {
        warn!(step = %step, mode = %mode, error = %err, "No transition matched");
        err
    })?;

    if let Some(effect) = transition.effect {
        effect.apply(&mut session.answers);
    }
    if let Some(level) = transition.submit {
        submit(session, level, credential, backend)
            .await
            .map_err(|err| {
                warn!(step = %step, level = %level, code = err.code(), "Step submission failed");
                err
            })?;
    }

    debug!(step = %step, mode = %mode, to = %transition.to.path(), "Step completed");
    Ok(StepOutcome {
        target: transition.to,
        submitted: transition.submit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendReply, SubmissionRequest, TransportError};
    use crate::fields::{Answer, Field};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBackend {
        seen: Mutex<Vec<SubmissionRequest>>,
    }

    #[async_trait]
    impl ProposalBackend for RecordingBackend {
        async fn submit(
            &self,
            request: &SubmissionRequest,
            _credential: &Credential,
        ) -> std::result::Result<BackendReply, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(BackendReply::from_body(json!({
                "success": true,
                "data": { "referenceNumber": "ANC501E/000A/001A", "slug": "ANC501E-000A-001A" }
            })))
        }
    }

    fn ctx() -> ValidationContext {
        ValidationContext::new(NaiveDate::from_ymd_opt(2026, 10, 18).expect("date"))
    }

    fn form(pairs: &[(&str, &str)]) -> FormValues {
        FormValues::from_pairs(pairs.iter().copied())
    }

    async fn post(
        session: &mut ProposalSession,
        step: StepId,
        pairs: &[(&str, &str)],
        backend: &RecordingBackend,
    ) -> Result<StepOutcome> {
        process_step(session, step, &form(pairs), &ctx(), &Credential::new("t"), backend).await
    }

    #[tokio::test]
    async fn invalid_form_stops_before_navigation_and_network() {
        let backend = RecordingBackend::default();
        let mut session = ProposalSession::with_reference("R/1", "R-1");
        session.is_edit = true;

        let err = post(&mut session, StepId::Name, &[("name", "Weir & sluice")], &backend)
            .await
            .expect_err("invalid");
        assert!(matches!(err, ProposalError::Validation(_)));
        assert!(backend.seen.lock().unwrap().is_empty());
        assert_eq!(session.answers.text(Field::Name), Some("Weir & sluice"));
    }

    #[tokio::test]
    async fn create_journey_saves_once_at_the_end() {
        let backend = RecordingBackend::default();
        let mut session = ProposalSession::new();

        let steps: [(StepId, &[(&str, &str)], Target); 5] = [
            (StepId::Name, &[("name", "Riverside weir")], Target::Step(StepId::Area)),
            (StepId::Area, &[("areaId", "12")], Target::Step(StepId::ProjectType)),
            (
                StepId::ProjectType,
                &[("projectType", "STU")],
                Target::Step(StepId::FinancialStartYear),
            ),
            (
                StepId::FinancialStartYear,
                &[("financialStartYear", "2027")],
                Target::Step(StepId::FinancialEndYear),
            ),
            (StepId::FinancialEndYear, &[("financialEndYear", "2029")], Target::Summary),
        ];
        for (step, pairs, expected) in steps {
            let outcome = post(&mut session, step, pairs, &backend).await.expect("valid");
            assert_eq!(outcome.target, expected, "after {step}");
        }

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, SaveLevel::InitialSave);
        assert_eq!(session.reference_number(), Some("ANC501E/000A/001A"));
    }

    #[tokio::test]
    async fn single_intervention_is_promoted_to_primary() {
        let backend = RecordingBackend::default();
        let mut session = ProposalSession::new();
        session.answers.set(Field::ProjectType, Answer::Text("DEF".into()));

        let outcome = post(
            &mut session,
            StepId::InterventionTypes,
            &[("interventionTypes", "NFM")],
            &backend,
        )
        .await
        .expect("valid");
        assert_eq!(outcome.target, Target::Step(StepId::FinancialStartYear));
        assert_eq!(session.answers.text(Field::PrimaryInterventionType), Some("NFM"));
    }

    #[tokio::test]
    async fn could_start_early_no_drops_earliest_date_and_submits() {
        let backend = RecordingBackend::default();
        let mut session = ProposalSession::with_reference("R/1", "R-1");
        session.answers.set(Field::EarliestStartMonth, Answer::Number(1));
        session.answers.set(Field::EarliestStartYear, Answer::Number(2027));

        let outcome = post(
            &mut session,
            StepId::CouldStartEarly,
            &[("couldStartEarly", "no")],
            &backend,
        )
        .await
        .expect("valid");
        assert_eq!(outcome.target, Target::Summary);
        assert_eq!(outcome.submitted, Some(SaveLevel::ImportantDates));
        assert!(!session.answers.contains(Field::EarliestStartMonth));

        let seen = backend.seen.lock().unwrap();
        assert!(!seen[0].payload.contains_key("earliestStartMonth"));
        assert_eq!(seen[0].payload["couldStartEarly"], json!(false));
    }

    #[tokio::test]
    async fn dated_steps_need_a_reference() {
        let backend = RecordingBackend::default();
        let err = post(
            &mut ProposalSession::new(),
            StepId::Urgency,
            &[("urgencyReason", "not_urgent")],
            &backend,
        )
        .await
        .expect_err("no reference");
        assert_eq!(err.code(), crate::error::REFERENCE_REQUIRED_CODE);
        assert!(load_step(&ProposalSession::new(), StepId::StartWork).is_err());
    }

    #[test]
    fn load_step_shows_owned_values_and_back_link() {
        let mut session = ProposalSession::with_reference("R/1", "R-1");
        session.answers.set(Field::StartWorkMonth, Answer::Number(4));
        session.answers.set(Field::StartWorkYear, Answer::Number(2028));
        session.answers.set(Field::Name, Answer::Text("Weir".into()));

        let page = load_step(&session, StepId::StartWork).expect("page");
        assert_eq!(page.values.len(), 2);
        assert_eq!(page.values["startWorkMonth"], json!(4));
        assert_eq!(page.back_link.as_deref(), Some("/proposal/award-contract"));
        assert_eq!(page.reference_number.as_deref(), Some("R/1"));
    }
}
