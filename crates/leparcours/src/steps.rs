//! Step registry
//!
//! *Le Registre des Étapes* - one table describing the whole authoring
//! journey. Each [`StepDescriptor`] names the fields a page owns, the
//! validator run on submission, its save level, its back-link rule, and an
//! ordered list of guarded [`Transition`]s. Adding or reordering a page is a
//! single edit to [`STEP_REGISTRY`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProposalError, Result};
use crate::fields::{Answer, Answers, Field};
use crate::levels::SaveLevel;
use crate::validation::{
    AreaValidator, CouldStartEarlyValidator, FinancialEndYearValidator,
    FinancialStartYearValidator, InterventionTypesValidator, MilestoneValidator, NameValidator,
    PrimaryInterventionValidator, ProjectTypeValidator, UrgencyValidator, Validator,
};

/// Path prefix shared by every journey page.
pub const ROUTE_PREFIX: &str = "/proposal";

/// Path of the read-only summary page.
pub const SUMMARY_PATH: &str = "/proposal/summary";

/// A page of the authoring journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    /// Project name
    Name,
    /// Owning area
    Area,
    /// Project type
    ProjectType,
    /// Intervention type selection
    InterventionTypes,
    /// Primary intervention type
    PrimaryInterventionType,
    /// First financial year
    FinancialStartYear,
    /// Last financial year
    FinancialEndYear,
    /// Outline business case start
    StartOutlineBusinessCase,
    /// Outline business case completion
    CompleteOutlineBusinessCase,
    /// Contract award
    AwardContract,
    /// Start of work
    StartWork,
    /// Start of benefits
    StartBenefits,
    /// Could the project start early
    CouldStartEarly,
    /// Earliest possible start
    EarliestStartDate,
    /// Urgency
    Urgency,
}

impl StepId {
    /// Every step, in journey order.
    pub const ALL: [StepId; 15] = [
        StepId::Name,
        StepId::Area,
        StepId::ProjectType,
        StepId::InterventionTypes,
        StepId::PrimaryInterventionType,
        StepId::FinancialStartYear,
        StepId::FinancialEndYear,
        StepId::StartOutlineBusinessCase,
        StepId::CompleteOutlineBusinessCase,
        StepId::AwardContract,
        StepId::StartWork,
        StepId::StartBenefits,
        StepId::CouldStartEarly,
        StepId::EarliestStartDate,
        StepId::Urgency,
    ];

    /// URL segment of the step.
    pub fn slug(self) -> &'static str {
        match self {
            StepId::Name => "name",
            StepId::Area => "area",
            StepId::ProjectType => "project-type",
            StepId::InterventionTypes => "intervention-types",
            StepId::PrimaryInterventionType => "primary-intervention-type",
            StepId::FinancialStartYear => "financial-start-year",
            StepId::FinancialEndYear => "financial-end-year",
            StepId::StartOutlineBusinessCase => "start-outline-business-case",
            StepId::CompleteOutlineBusinessCase => "complete-outline-business-case",
            StepId::AwardContract => "award-contract",
            StepId::StartWork => "start-work",
            StepId::StartBenefits => "start-benefits",
            StepId::CouldStartEarly => "could-start-early",
            StepId::EarliestStartDate => "earliest-start-date",
            StepId::Urgency => "urgency",
        }
    }

    /// Full page path, e.g. `/proposal/project-type`.
    pub fn path(self) -> String {
        format!("{ROUTE_PREFIX}/{}", self.slug())
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for StepId {
    type Err = ProposalError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|step| step.slug() == s)
            .ok_or_else(|| ProposalError::UnknownStep(s.to_string()))
    }
}

/// Whether the caseworker is creating the proposal or changing one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Walking the journey for the first time
    Create,
    /// Came from the summary page to change an answer
    Edit,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Create => f.write_str("create"),
            Mode::Edit => f.write_str("edit"),
        }
    }
}

/// Where a transition or back link leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "step", rename_all = "lowercase")]
pub enum Target {
    /// Another journey page
    Step(StepId),
    /// The summary page
    Summary,
}

impl Target {
    /// Redirect path for the target.
    pub fn path(self) -> String {
        match self {
            Target::Step(step) => step.path(),
            Target::Summary => SUMMARY_PATH.to_string(),
        }
    }
}

/// Modes a transition applies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFilter {
    /// Both modes
    Any,
    /// Create mode only
    Create,
    /// Edit mode only
    Edit,
}

impl ModeFilter {
    /// Whether the filter admits `mode`.
    pub fn admits(self, mode: Mode) -> bool {
        matches!(
            (self, mode),
            (ModeFilter::Any, _) | (ModeFilter::Create, Mode::Create) | (ModeFilter::Edit, Mode::Edit)
        )
    }
}

/// Condition on the accumulated answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Always holds
    Always,
    /// The chosen project type has no intervention sub-types
    InterventionsNotRequired,
    /// Exactly one intervention type is selected
    SingleIntervention,
    /// "Could start early" was answered with the given value
    StartsEarly(bool),
}

impl Guard {
    /// Evaluate against the draft.
    pub fn holds(self, answers: &Answers) -> bool {
        match self {
            Guard::Always => true,
            Guard::InterventionsNotRequired => matches!(
                answers.project_type(),
                Some(t) if !t.requires_intervention_types()
            ),
            Guard::SingleIntervention => answers.list(Field::InterventionTypes).len() == 1,
            Guard::StartsEarly(expected) => answers.flag(Field::CouldStartEarly) == Some(expected),
        }
    }
}

/// Answer rewrite applied when a transition is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The only selected intervention type becomes the primary one
    AssignSolePrimary,
    /// Forget a primary type that is no longer among the selected ones
    DropStalePrimary,
    /// Forget the earliest start date
    DropEarliestStart,
}

impl Effect {
    /// Apply the rewrite to the draft.
    pub fn apply(self, answers: &mut Answers) {
        match self {
            Effect::AssignSolePrimary => {
                if let [only] = answers.list(Field::InterventionTypes).as_slice() {
                    answers.set(Field::PrimaryInterventionType, Answer::Text(only.clone()));
                }
            }
            Effect::DropStalePrimary => {
                let selected = answers.list(Field::InterventionTypes);
                let stale = answers
                    .text(Field::PrimaryInterventionType)
                    .is_some_and(|primary| !selected.iter().any(|s| s == primary));
                if stale {
                    answers.clear(Field::PrimaryInterventionType);
                }
            }
            Effect::DropEarliestStart => {
                answers.clear(Field::EarliestStartMonth);
                answers.clear(Field::EarliestStartYear);
            }
        }
    }
}

/// A guarded edge out of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Condition on the answers
    pub guard: Guard,
    /// Modes the edge applies in
    pub mode: ModeFilter,
    /// Rewrite applied before submitting
    pub effect: Option<Effect>,
    /// Save level submitted before moving on
    pub submit: Option<SaveLevel>,
    /// Destination
    pub to: Target,
}

impl Transition {
    /// Unconditional edge to `to`.
    pub const fn goto(to: Target) -> Self {
        Self {
            guard: Guard::Always,
            mode: ModeFilter::Any,
            effect: None,
            submit: None,
            to,
        }
    }

    /// Edge to another step.
    pub const fn step(step: StepId) -> Self {
        Self::goto(Target::Step(step))
    }

    /// Edge to the summary page.
    pub const fn summary() -> Self {
        Self::goto(Target::Summary)
    }

    /// Restrict to answers satisfying `guard`.
    pub const fn when(self, guard: Guard) -> Self {
        Self { guard, ..self }
    }

    /// Restrict to one mode.
    pub const fn only(self, mode: ModeFilter) -> Self {
        Self { mode, ..self }
    }

    /// Rewrite answers when taken.
    pub const fn then(self, effect: Effect) -> Self {
        Self {
            effect: Some(effect),
            ..self
        }
    }

    /// Submit `level` when taken.
    pub const fn submit(self, level: SaveLevel) -> Self {
        Self {
            submit: Some(level),
            ..self
        }
    }

    /// Whether the edge applies to these answers in this mode.
    pub fn matches(&self, answers: &Answers, mode: Mode) -> bool {
        self.mode.admits(mode) && self.guard.holds(answers)
    }
}

/// How a page computes its back link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackRule {
    /// First page: no link when creating, summary when editing
    Entry,
    /// Entered from the summary page only
    Summary,
    /// Always the given step
    Previous(StepId),
    /// The given step when creating, summary when editing
    PreviousOrSummary(StepId),
    /// Whichever project-type page was answered last; summary when editing
    AfterProjectType,
}

/// Configuration of one page.
pub struct StepDescriptor {
    /// Page identity
    pub id: StepId,
    /// Fields written from this page's form
    pub fields: &'static [Field],
    /// Rules run on submission
    pub validator: &'static dyn Validator,
    /// Checkpoint submitted when this page is changed in edit mode
    pub save_level: SaveLevel,
    /// Back-link rule
    pub back: BackRule,
    /// Page edits an already-created proposal
    pub requires_reference: bool,
    /// Ordered edges; the first match wins
    pub transitions: &'static [Transition],
}

impl fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("save_level", &self.save_level)
            .field("back", &self.back)
            .field("requires_reference", &self.requires_reference)
            .field("transitions", &self.transitions)
            .finish_non_exhaustive()
    }
}

static START_OUTLINE_BUSINESS_CASE: MilestoneValidator = MilestoneValidator::new(
    Field::StartOutlineBusinessCaseMonth,
    Field::StartOutlineBusinessCaseYear,
    None,
);
static COMPLETE_OUTLINE_BUSINESS_CASE: MilestoneValidator = MilestoneValidator::new(
    Field::CompleteOutlineBusinessCaseMonth,
    Field::CompleteOutlineBusinessCaseYear,
    Some((
        Field::StartOutlineBusinessCaseMonth,
        Field::StartOutlineBusinessCaseYear,
    )),
);
static AWARD_CONTRACT: MilestoneValidator = MilestoneValidator::new(
    Field::AwardContractMonth,
    Field::AwardContractYear,
    Some((
        Field::CompleteOutlineBusinessCaseMonth,
        Field::CompleteOutlineBusinessCaseYear,
    )),
);
static START_WORK: MilestoneValidator = MilestoneValidator::new(
    Field::StartWorkMonth,
    Field::StartWorkYear,
    Some((Field::AwardContractMonth, Field::AwardContractYear)),
);
static START_BENEFITS: MilestoneValidator = MilestoneValidator::new(
    Field::StartBenefitsMonth,
    Field::StartBenefitsYear,
    Some((Field::StartWorkMonth, Field::StartWorkYear)),
);
static EARLIEST_START: MilestoneValidator =
    MilestoneValidator::new(Field::EarliestStartMonth, Field::EarliestStartYear, None);

/// Every page of the journey.
pub static STEP_REGISTRY: &[StepDescriptor] = &[
    StepDescriptor {
        id: StepId::Name,
        fields: &[Field::Name],
        validator: &NameValidator,
        save_level: SaveLevel::ProjectName,
        back: BackRule::Entry,
        requires_reference: false,
        transitions: &[
            Transition::summary()
                .only(ModeFilter::Edit)
                .submit(SaveLevel::ProjectName),
            Transition::step(StepId::Area),
        ],
    },
    StepDescriptor {
        id: StepId::Area,
        fields: &[Field::AreaId],
        validator: &AreaValidator,
        save_level: SaveLevel::ProjectArea,
        back: BackRule::PreviousOrSummary(StepId::Name),
        requires_reference: false,
        transitions: &[
            Transition::summary()
                .only(ModeFilter::Edit)
                .submit(SaveLevel::ProjectArea),
            Transition::step(StepId::ProjectType),
        ],
    },
    StepDescriptor {
        id: StepId::ProjectType,
        fields: &[Field::ProjectType],
        validator: &ProjectTypeValidator,
        save_level: SaveLevel::ProjectType,
        back: BackRule::PreviousOrSummary(StepId::Area),
        requires_reference: false,
        transitions: &[
            Transition::summary()
                .when(Guard::InterventionsNotRequired)
                .only(ModeFilter::Edit)
                .submit(SaveLevel::ProjectType),
            Transition::step(StepId::FinancialStartYear).when(Guard::InterventionsNotRequired),
            Transition::step(StepId::InterventionTypes),
        ],
    },
    StepDescriptor {
        id: StepId::InterventionTypes,
        fields: &[Field::InterventionTypes],
        validator: &InterventionTypesValidator,
        save_level: SaveLevel::ProjectType,
        back: BackRule::Previous(StepId::ProjectType),
        requires_reference: false,
        transitions: &[
            Transition::summary()
                .when(Guard::InterventionsNotRequired)
                .only(ModeFilter::Edit)
                .submit(SaveLevel::ProjectType),
            Transition::step(StepId::FinancialStartYear).when(Guard::InterventionsNotRequired),
            Transition::summary()
                .when(Guard::SingleIntervention)
                .only(ModeFilter::Edit)
                .then(Effect::AssignSolePrimary)
                .submit(SaveLevel::ProjectType),
            Transition::step(StepId::FinancialStartYear)
                .when(Guard::SingleIntervention)
                .then(Effect::AssignSolePrimary),
            Transition::step(StepId::PrimaryInterventionType).then(Effect::DropStalePrimary),
        ],
    },
    StepDescriptor {
        id: StepId::PrimaryInterventionType,
        fields: &[Field::PrimaryInterventionType],
        validator: &PrimaryInterventionValidator,
        save_level: SaveLevel::ProjectType,
        back: BackRule::Previous(StepId::InterventionTypes),
        requires_reference: false,
        transitions: &[
            Transition::summary()
                .only(ModeFilter::Edit)
                .submit(SaveLevel::ProjectType),
            Transition::step(StepId::FinancialStartYear),
        ],
    },
    StepDescriptor {
        id: StepId::FinancialStartYear,
        fields: &[Field::FinancialStartYear],
        validator: &FinancialStartYearValidator,
        save_level: SaveLevel::FinancialStartYear,
        back: BackRule::AfterProjectType,
        requires_reference: false,
        transitions: &[
            Transition::summary()
                .only(ModeFilter::Edit)
                .submit(SaveLevel::FinancialStartYear),
            Transition::step(StepId::FinancialEndYear),
        ],
    },
    StepDescriptor {
        id: StepId::FinancialEndYear,
        fields: &[Field::FinancialEndYear],
        validator: &FinancialEndYearValidator,
        save_level: SaveLevel::FinancialEndYear,
        back: BackRule::PreviousOrSummary(StepId::FinancialStartYear),
        requires_reference: false,
        transitions: &[
            Transition::summary()
                .only(ModeFilter::Edit)
                .submit(SaveLevel::FinancialEndYear),
            Transition::summary().submit(SaveLevel::InitialSave),
        ],
    },
    StepDescriptor {
        id: StepId::StartOutlineBusinessCase,
        fields: &[
            Field::StartOutlineBusinessCaseMonth,
            Field::StartOutlineBusinessCaseYear,
        ],
        validator: &START_OUTLINE_BUSINESS_CASE,
        save_level: SaveLevel::ImportantDates,
        back: BackRule::Summary,
        requires_reference: true,
        transitions: &[Transition::step(StepId::CompleteOutlineBusinessCase)],
    },
    StepDescriptor {
        id: StepId::CompleteOutlineBusinessCase,
        fields: &[
            Field::CompleteOutlineBusinessCaseMonth,
            Field::CompleteOutlineBusinessCaseYear,
        ],
        validator: &COMPLETE_OUTLINE_BUSINESS_CASE,
        save_level: SaveLevel::ImportantDates,
        back: BackRule::Previous(StepId::StartOutlineBusinessCase),
        requires_reference: true,
        transitions: &[Transition::step(StepId::AwardContract)],
    },
    StepDescriptor {
        id: StepId::AwardContract,
        fields: &[Field::AwardContractMonth, Field::AwardContractYear],
        validator: &AWARD_CONTRACT,
        save_level: SaveLevel::ImportantDates,
        back: BackRule::Previous(StepId::CompleteOutlineBusinessCase),
        requires_reference: true,
        transitions: &[Transition::step(StepId::StartWork)],
    },
    StepDescriptor {
        id: StepId::StartWork,
        fields: &[Field::StartWorkMonth, Field::StartWorkYear],
        validator: &START_WORK,
        save_level: SaveLevel::ImportantDates,
        back: BackRule::Previous(StepId::AwardContract),
        requires_reference: true,
        transitions: &[Transition::step(StepId::StartBenefits)],
    },
    StepDescriptor {
        id: StepId::StartBenefits,
        fields: &[Field::StartBenefitsMonth, Field::StartBenefitsYear],
        validator: &START_BENEFITS,
        save_level: SaveLevel::ImportantDates,
        back: BackRule::Previous(StepId::StartWork),
        requires_reference: true,
        transitions: &[Transition::step(StepId::CouldStartEarly)],
    },
    StepDescriptor {
        id: StepId::CouldStartEarly,
        fields: &[Field::CouldStartEarly],
        validator: &CouldStartEarlyValidator,
        save_level: SaveLevel::ImportantDates,
        back: BackRule::Previous(StepId::StartBenefits),
        requires_reference: true,
        transitions: &[
            Transition::step(StepId::EarliestStartDate).when(Guard::StartsEarly(true)),
            Transition::summary()
                .when(Guard::StartsEarly(false))
                .then(Effect::DropEarliestStart)
                .submit(SaveLevel::ImportantDates),
        ],
    },
    StepDescriptor {
        id: StepId::EarliestStartDate,
        fields: &[Field::EarliestStartMonth, Field::EarliestStartYear],
        validator: &EARLIEST_START,
        save_level: SaveLevel::ImportantDates,
        back: BackRule::Previous(StepId::CouldStartEarly),
        requires_reference: true,
        transitions: &[Transition::summary().submit(SaveLevel::ImportantDates)],
    },
    StepDescriptor {
        id: StepId::Urgency,
        fields: &[Field::UrgencyReason, Field::UrgencyDetails],
        validator: &UrgencyValidator,
        save_level: SaveLevel::Urgency,
        back: BackRule::Summary,
        requires_reference: true,
        transitions: &[Transition::summary().submit(SaveLevel::Urgency)],
    },
];

/// Registry entry for a step.
///
/// A step missing from the table is a misconfiguration and surfaces as
/// [`ProposalError::UnknownStep`].
pub fn descriptor(step: StepId) -> Result<&'static StepDescriptor> {
    STEP_REGISTRY
        .iter()
        .find(|d| d.id == step)
        .ok_or_else(|| ProposalError::UnknownStep(step.slug().to_string()))
}
