use crate::error::AppError;
use crate::models::roster::{slot_label, ROSTER_SLOTS};
use crate::registration::form::{RegistrationForm, SlotForm};

/// First rule violation found, carrying the human slot label the client
/// shows verbatim ("Captain: Email is required").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub slot: &'static str,
    pub field: &'static str,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    Duplicate,
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        let message = match e.kind {
            ViolationKind::Missing => format!("{}: {} is required", e.slot, e.field),
            ViolationKind::Duplicate => {
                format!("{}: {} duplicates another slot", e.slot, e.field)
            }
        };
        AppError::Validation {
            slot: e.slot.to_string(),
            field: e.field.to_string(),
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    InGameName,
    GameId,
    ServerId,
    Email,
    Phone,
    City,
    Region,
    Device,
    Picture,
    StudentId,
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::InGameName => "In-game name",
            Field::GameId => "Game ID",
            Field::ServerId => "Server",
            Field::Email => "Email",
            Field::Phone => "Phone number",
            Field::City => "City",
            Field::Region => "Region",
            Field::Device => "Device",
            Field::Picture => "Picture",
            Field::StudentId => "Student ID",
        }
    }
}

const CAPTAIN_FIELDS: &[Field] = &[
    Field::Name,
    Field::InGameName,
    Field::GameId,
    Field::ServerId,
    Field::Email,
    Field::Phone,
];

const PLAYER_FIELDS: &[Field] = &[
    Field::Name,
    Field::InGameName,
    Field::GameId,
    Field::ServerId,
];

const BENCH_FIELDS: &[Field] = &[
    Field::Name,
    Field::InGameName,
    Field::GameId,
    Field::ServerId,
    Field::Email,
    Field::Phone,
    Field::City,
    Field::Region,
    Field::Device,
    Field::Picture,
    Field::StudentId,
];

struct SlotRule {
    required: &'static [Field],
    /// Bench slots are optional but atomic: an entirely empty slot is
    /// skipped, anything filled in makes the whole rule set mandatory.
    skip_when_empty: bool,
}

const SLOT_RULES: [SlotRule; ROSTER_SLOTS] = [
    SlotRule { required: CAPTAIN_FIELDS, skip_when_empty: false },
    SlotRule { required: PLAYER_FIELDS, skip_when_empty: false },
    SlotRule { required: PLAYER_FIELDS, skip_when_empty: false },
    SlotRule { required: PLAYER_FIELDS, skip_when_empty: false },
    SlotRule { required: PLAYER_FIELDS, skip_when_empty: false },
    SlotRule { required: BENCH_FIELDS, skip_when_empty: true },
    SlotRule { required: BENCH_FIELDS, skip_when_empty: true },
];

fn present(slot: &SlotForm, field: Field) -> bool {
    match field {
        Field::Name => !slot.name.is_empty(),
        Field::InGameName => !slot.ign.is_empty(),
        Field::GameId => !slot.game_id.is_empty(),
        Field::ServerId => !slot.server_id.is_empty(),
        Field::Email => !slot.email.is_empty(),
        Field::Phone => !slot.phone.is_empty(),
        Field::City => !slot.city.is_empty(),
        Field::Region => !slot.region.is_empty(),
        Field::Device => !slot.device.is_empty(),
        Field::Picture => slot.picture.is_some() || !slot.picture_url.is_empty(),
        Field::StudentId => slot.student_id.is_some() || !slot.student_id_url.is_empty(),
    }
}

/// Fail-fast over the rule table: slots in order, fields in table order,
/// first violation wins. The game id doubles as the roster's natural key,
/// so a second slot reusing one is rejected at the second slot.
pub fn validate_roster(slots: &[SlotForm; ROSTER_SLOTS]) -> Result<(), ValidationError> {
    let mut seen_keys: Vec<&str> = Vec::with_capacity(ROSTER_SLOTS);
    for (i, rule) in SLOT_RULES.iter().enumerate() {
        let slot = &slots[i];
        if rule.skip_when_empty && slot.is_empty() {
            continue;
        }
        for &field in rule.required {
            if !present(slot, field) {
                return Err(ValidationError {
                    slot: slot_label(i),
                    field: field.label(),
                    kind: ViolationKind::Missing,
                });
            }
        }
        if !slot.game_id.is_empty() {
            if seen_keys.contains(&slot.game_id.as_str()) {
                return Err(ValidationError {
                    slot: slot_label(i),
                    field: Field::GameId.label(),
                    kind: ViolationKind::Duplicate,
                });
            }
            seen_keys.push(&slot.game_id);
        }
    }
    Ok(())
}

fn missing(slot: &'static str, field: &'static str) -> ValidationError {
    ValidationError {
        slot,
        field,
        kind: ViolationKind::Missing,
    }
}

pub fn validate_organization(form: &RegistrationForm) -> Result<(), ValidationError> {
    if form.university.name.is_empty() {
        return Err(missing("University", "Name"));
    }
    if form.university.logo.is_none() && form.university.logo_url.is_empty() {
        return Err(missing("University", "Logo"));
    }
    Ok(())
}

pub fn validate_team(form: &RegistrationForm) -> Result<(), ValidationError> {
    if form.team.name.is_empty() {
        return Err(missing("Team", "Name"));
    }
    if form.team.logo.is_none() && form.team.logo_url.is_empty() {
        return Err(missing("Team", "Logo"));
    }
    Ok(())
}

pub fn validate_submission(form: &RegistrationForm) -> Result<(), ValidationError> {
    validate_organization(form)?;
    validate_team(form)?;
    validate_roster(&form.slots)
}
