//! Summary page read model
//!
//! The summary view starts as a projection of the draft and is then enriched
//! by three independent operations. Any of them may fail without blocking
//! the page; failures come back alongside the partially enriched view.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::backend::{AreaDirectory, Credential};
use crate::enrichment::{enrich, Enrichment, EnrichmentResult, EnrichmentStep};
use crate::fields::{Answers, Field};
use crate::session::{ProposalSession, UploadState};
use crate::upload::UploadService;

/// A block of the summary page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummarySection {
    /// Name, area, type and interventions
    ProjectDetails,
    /// Financial start and end years
    FinancialYears,
    /// Milestone chain
    ImportantDates,
    /// Urgency reason and details
    Urgency,
    /// Benefit-area attachment
    BenefitArea,
}

impl SummarySection {
    /// Every section, in page order.
    pub const ALL: [SummarySection; 5] = [
        SummarySection::ProjectDetails,
        SummarySection::FinancialYears,
        SummarySection::ImportantDates,
        SummarySection::Urgency,
        SummarySection::BenefitArea,
    ];
}

/// Completion flag of one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionStatus {
    /// Section
    pub section: SummarySection,
    /// Every required answer is present
    pub complete: bool,
}

/// Attachment as shown on the summary page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentView {
    /// File-service handle
    pub upload_id: String,
    /// Original file name
    pub filename: Option<String>,
    /// Freshly issued download link
    pub download_url: Option<String>,
}

/// Summary page view model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    /// Assigned reference number
    pub reference_number: Option<String>,
    /// Assigned slug
    pub slug: Option<String>,
    /// Every answer given
    pub answers: Answers,
    /// Display name of the owning area
    pub area_name: Option<String>,
    /// Accepted attachment
    pub attachment: Option<AttachmentView>,
    /// Per-section completion
    pub sections: Vec<SectionStatus>,
}

impl SummaryView {
    /// Unenriched projection of a draft.
    pub fn from_session(session: &ProposalSession) -> Self {
        let attachment = match &session.upload {
            Some(UploadState::Ready {
                upload_id,
                filename,
            }) => Some(AttachmentView {
                upload_id: upload_id.clone(),
                filename: filename.clone(),
                download_url: None,
            }),
            _ => None,
        };
        Self {
            reference_number: session.reference_number().map(str::to_string),
            slug: session.slug().map(str::to_string),
            answers: session.answers.clone(),
            area_name: None,
            attachment,
            sections: Vec::new(),
        }
    }
}

/// Collaborators the summary enrichments call.
pub struct SummaryContext {
    /// Caller's access credential
    pub credential: Credential,
    /// Area reference data
    pub areas: Arc<dyn AreaDirectory>,
    /// File service
    pub uploads: Arc<dyn UploadService>,
}

/// Resolves the area identifier to its display name.
pub struct ResolveAreaName;

#[async_trait]
impl Enrichment<SummaryContext, SummaryView> for ResolveAreaName {
    fn name(&self) -> &'static str {
        "resolve-area-name"
    }

    async fn apply(
        &self,
        ctx: &SummaryContext,
        data: &SummaryView,
    ) -> anyhow::Result<EnrichmentStep<SummaryView>> {
        let Some(id) = data.answers.number(Field::AreaId) else {
            return Ok(EnrichmentStep::Enriched(data.clone()));
        };
        match ctx.areas.area(id, &ctx.credential).await? {
            Some(area) => Ok(EnrichmentStep::Enriched(SummaryView {
                area_name: Some(area.name),
                ..data.clone()
            })),
            None => Ok(EnrichmentStep::Failed(format!("area {id} not found"))),
        }
    }
}

/// Replaces the attachment's download link with a fresh one.
pub struct RefreshDownloadLink;

#[async_trait]
impl Enrichment<SummaryContext, SummaryView> for RefreshDownloadLink {
    fn name(&self) -> &'static str {
        "refresh-download-link"
    }

    async fn apply(
        &self,
        ctx: &SummaryContext,
        data: &SummaryView,
    ) -> anyhow::Result<EnrichmentStep<SummaryView>> {
        let Some(attachment) = &data.attachment else {
            return Ok(EnrichmentStep::Enriched(data.clone()));
        };
        let url = ctx
            .uploads
            .download_url(&attachment.upload_id, &ctx.credential)
            .await?;
        let mut next = data.clone();
        next.attachment = Some(AttachmentView {
            download_url: Some(url),
            ..attachment.clone()
        });
        Ok(EnrichmentStep::Enriched(next))
    }
}

/// Marks which summary sections are complete.
pub struct SectionCompleteness;

impl SectionCompleteness {
    fn complete(section: SummarySection, view: &SummaryView) -> bool {
        let answers = &view.answers;
        let all = |fields: &[Field]| fields.iter().all(|f| answers.contains(*f));
        match section {
            SummarySection::ProjectDetails => {
                let interventions = match answers.project_type() {
                    Some(t) if t.requires_intervention_types() => {
                        !answers.intervention_types().is_empty()
                            && answers.contains(Field::PrimaryInterventionType)
                    }
                    Some(_) => true,
                    None => false,
                };
                all(&[Field::Name, Field::AreaId]) && interventions
            }
            SummarySection::FinancialYears => {
                all(&[Field::FinancialStartYear, Field::FinancialEndYear])
            }
            SummarySection::ImportantDates => {
                let earliest = match answers.flag(Field::CouldStartEarly) {
                    Some(true) => all(&[Field::EarliestStartMonth, Field::EarliestStartYear]),
                    Some(false) => true,
                    None => false,
                };
                all(&[
                    Field::StartOutlineBusinessCaseMonth,
                    Field::StartOutlineBusinessCaseYear,
                    Field::CompleteOutlineBusinessCaseMonth,
                    Field::CompleteOutlineBusinessCaseYear,
                    Field::AwardContractMonth,
                    Field::AwardContractYear,
                    Field::StartWorkMonth,
                    Field::StartWorkYear,
                    Field::StartBenefitsMonth,
                    Field::StartBenefitsYear,
                ]) && earliest
            }
            SummarySection::Urgency => match answers.urgency_reason() {
                Some(reason) if reason.requires_details() => {
                    answers.contains(Field::UrgencyDetails)
                }
                Some(_) => true,
                None => false,
            },
            SummarySection::BenefitArea => view.attachment.is_some(),
        }
    }
}

#[async_trait]
impl Enrichment<SummaryContext, SummaryView> for SectionCompleteness {
    fn name(&self) -> &'static str {
        "section-completeness"
    }

    async fn apply(
        &self,
        _ctx: &SummaryContext,
        data: &SummaryView,
    ) -> anyhow::Result<EnrichmentStep<SummaryView>> {
        let sections = SummarySection::ALL
            .into_iter()
            .map(|section| SectionStatus {
                section,
                complete: Self::complete(section, data),
            })
            .collect();
        Ok(EnrichmentStep::Enriched(SummaryView {
            sections,
            ..data.clone()
        }))
    }
}

/// Build the enriched summary for a draft.
pub async fn build_summary(
    session: &ProposalSession,
    ctx: &SummaryContext,
) -> EnrichmentResult<SummaryView> {
    let operations: Vec<Box<dyn Enrichment<SummaryContext, SummaryView>>> = vec![
        Box::new(ResolveAreaName),
        Box::new(RefreshDownloadLink),
        Box::new(SectionCompleteness),
    ];
    enrich(ctx, SummaryView::from_session(session), &operations).await
}
