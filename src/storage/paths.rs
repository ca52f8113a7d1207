use crate::models::roster::slot_segment;

/// Replace anything outside `[A-Za-z0-9_.-]` with `_`, then strip leading and
/// trailing separator characters. Idempotent; empty input becomes "unnamed".
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '_' || c == '.' || c == '-');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lowercased extension of an uploaded file name, without the dot.
pub fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .unwrap_or_else(|| "bin".to_string())
}

/// Destination paths for one submission, rooted at
/// `<sanitized org>/<sanitized team>/`.
#[derive(Debug, Clone)]
pub struct AssetPaths {
    org: String,
    team: String,
}

impl AssetPaths {
    pub fn new(org_name: &str, team_name: &str) -> Self {
        Self {
            org: sanitize(org_name),
            team: sanitize(team_name),
        }
    }

    pub fn university_logo(&self, ext: &str) -> String {
        format!("{}/{}/university_logo.{}", self.org, self.team, ext)
    }

    pub fn team_logo(&self, ext: &str) -> String {
        format!("{}/{}/team_logo.{}", self.org, self.team, ext)
    }

    pub fn picture(&self, slot: usize, ext: &str) -> String {
        let seg = slot_segment(slot);
        format!("{}/{}/players/{}/{}_pic.{}", self.org, self.team, seg, seg, ext)
    }

    pub fn student_id(&self, slot: usize, ext: &str) -> String {
        let seg = slot_segment(slot);
        format!("{}/{}/players/{}/{}_id.{}", self.org, self.team, seg, seg, ext)
    }
}

/// Split a full object path into (directory, object name).
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", path),
    }
}
