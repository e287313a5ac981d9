use crate::error::ValidationErrors;
use crate::fields::{Answers, Field};
use crate::types::{InterventionType, ProjectType, UrgencyReason};

use super::{required_choice, required_integer, required_text, ValidationContext, Validator};

/// Longest accepted project name.
pub const MAX_NAME_LENGTH: usize = 255;

/// Longest accepted urgency explanation.
pub const MAX_URGENCY_DETAILS_LENGTH: usize = 700;

/// Project name: present, bounded, letters/digits/space/`-`/`_`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NameValidator;

impl Validator for NameValidator {
    fn validate(&self, answers: &Answers, _ctx: &ValidationContext) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = required_text(answers, Field::Name, &mut errors) {
            if name.chars().count() > MAX_NAME_LENGTH {
                errors.push(Field::Name, "tooLong");
            } else if !name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
            {
                errors.push(Field::Name, "invalidCharacters");
            }
        }
        errors.into_result()
    }
}

/// Owning area: a positive identifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct AreaValidator;

impl Validator for AreaValidator {
    fn validate(&self, answers: &Answers, _ctx: &ValidationContext) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(id) = required_integer(answers, Field::AreaId, &mut errors) {
            if id <= 0 {
                errors.push(Field::AreaId, "invalid");
            }
        }
        errors.into_result()
    }
}

/// Project type: the shared discriminant of every type-specific rule.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectTypeValidator;

impl Validator for ProjectTypeValidator {
    fn validate(&self, answers: &Answers, _ctx: &ValidationContext) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required_choice(answers, Field::ProjectType, ProjectType::from_code, &mut errors);
        errors.into_result()
    }
}

/// Intervention selection, dispatched on the project type.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterventionTypesValidator;

impl Validator for InterventionTypesValidator {
    fn validate(&self, answers: &Answers, _ctx: &ValidationContext) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let Some(project_type) =
            required_choice(answers, Field::ProjectType, ProjectType::from_code, &mut errors)
        else {
            return errors.into_result();
        };

        if project_type.requires_intervention_types() {
            check_intervention_selection(answers, &mut errors);
        }
        errors.into_result()
    }
}

fn check_intervention_selection(answers: &Answers, errors: &mut ValidationErrors) {
    let selected = answers.list(Field::InterventionTypes);
    if selected.is_empty() {
        errors.push(Field::InterventionTypes, "required");
    } else if selected
        .iter()
        .any(|code| InterventionType::from_code(code).is_none())
    {
        errors.push(Field::InterventionTypes, "invalid");
    }
}

/// Primary intervention: one of the selected intervention types.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimaryInterventionValidator;

impl Validator for PrimaryInterventionValidator {
    fn validate(&self, answers: &Answers, _ctx: &ValidationContext) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(primary) = required_choice(
            answers,
            Field::PrimaryInterventionType,
            InterventionType::from_code,
            &mut errors,
        ) {
            if !answers.intervention_types().contains(&primary) {
                errors.push(Field::PrimaryInterventionType, "notSelected");
            }
        }
        errors.into_result()
    }
}

/// Urgency, dispatched on the reason: anything but `not_urgent` needs details.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrgencyValidator;

impl Validator for UrgencyValidator {
    fn validate(&self, answers: &Answers, _ctx: &ValidationContext) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let Some(reason) = required_choice(
            answers,
            Field::UrgencyReason,
            UrgencyReason::from_code,
            &mut errors,
        ) else {
            return errors.into_result();
        };

        if reason.requires_details() {
            if let Some(details) = required_text(answers, Field::UrgencyDetails, &mut errors) {
                if details.chars().count() > MAX_URGENCY_DETAILS_LENGTH {
                    errors.push(Field::UrgencyDetails, "tooLong");
                }
            }
        }
        errors.into_result()
    }
}
