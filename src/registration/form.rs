use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::{AppError, AppResult};
use crate::models::roster::ROSTER_SLOTS;

/// A binary part of the submission, kept in memory until the upload phase.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct OrgForm {
    pub name: String,
    pub region: String,
    pub city: String,
    pub logo: Option<Attachment>,
    /// Already-stored logo URL, passed back by the client on update.
    pub logo_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct TeamForm {
    pub name: String,
    pub referral_code: Option<String>,
    pub logo: Option<Attachment>,
    pub logo_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct SlotForm {
    pub name: String,
    pub ign: String,
    pub game_id: String,
    pub server_id: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub region: String,
    pub device: String,
    pub picture: Option<Attachment>,
    pub student_id: Option<Attachment>,
    pub picture_url: String,
    pub student_id_url: String,
}

impl SlotForm {
    /// True when nothing at all was submitted for this slot, which is what
    /// lets the optional bench slots be skipped as a unit.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.ign.is_empty()
            && self.game_id.is_empty()
            && self.server_id.is_empty()
            && self.email.is_empty()
            && self.phone.is_empty()
            && self.city.is_empty()
            && self.region.is_empty()
            && self.device.is_empty()
            && self.picture.is_none()
            && self.student_id.is_none()
            && self.picture_url.is_empty()
            && self.student_id_url.is_empty()
    }
}

/// Typed view of the flat `{entity}_{field}` / `player_{slot}_{field}` map
/// the wizard posts. Decoded once at the boundary; everything downstream
/// works on this, never on raw keys.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub university: OrgForm,
    pub team: TeamForm,
    pub slots: [SlotForm; ROSTER_SLOTS],
}

impl RegistrationForm {
    pub fn set_text(&mut self, key: &str, value: String) {
        let value = value.trim().to_string();
        match key {
            "university_name" => self.university.name = value,
            "university_region" => self.university.region = value,
            "university_city" => self.university.city = value,
            "university_logo_url" => self.university.logo_url = value,
            "team_name" => self.team.name = value,
            "team_logo_url" => self.team.logo_url = value,
            "referral_code" => {
                self.team.referral_code = (!value.is_empty()).then_some(value);
            }
            _ => {
                if let Some((slot, field)) = parse_slot_key(key) {
                    let s = &mut self.slots[slot];
                    match field {
                        "name" => s.name = value,
                        "ign" => s.ign = value,
                        "game_id" => s.game_id = value,
                        "server_id" => s.server_id = value,
                        "email" => s.email = value,
                        "phone" => s.phone = value,
                        "city" => s.city = value,
                        "region" => s.region = value,
                        "device" => s.device = value,
                        "picture_url" => s.picture_url = value,
                        "student_id_url" => s.student_id_url = value,
                        _ => {}
                    }
                }
            }
        }
    }

    pub fn set_file(&mut self, key: &str, attachment: Attachment) {
        match key {
            "university_logo" => self.university.logo = Some(attachment),
            "team_logo" => self.team.logo = Some(attachment),
            _ => {
                if let Some((slot, field)) = parse_slot_key(key) {
                    match field {
                        "picture" => self.slots[slot].picture = Some(attachment),
                        "student_id" => self.slots[slot].student_id = Some(attachment),
                        _ => {}
                    }
                }
            }
        }
    }
}

/// `player_{slot}_{field}` → (slot, field). Slot indices outside the seven
/// roster positions are ignored.
fn parse_slot_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("player_")?;
    let (idx, field) = rest.split_once('_')?;
    let slot: usize = idx.parse().ok()?;
    if slot >= ROSTER_SLOTS {
        return None;
    }
    Some((slot, field))
}

pub async fn from_multipart(multipart: &mut Multipart) -> AppResult<RegistrationForm> {
    let mut form = RegistrationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if let Some(file_name) = field.file_name().map(str::to_owned) {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read {name}: {e}")))?;
            // Browsers submit zero-length parts for untouched file inputs.
            if bytes.is_empty() {
                continue;
            }
            form.set_file(
                &name,
                Attachment {
                    file_name,
                    content_type,
                    bytes,
                },
            );
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read {name}: {e}")))?;
            form.set_text(&name, text);
        }
    }

    Ok(form)
}
