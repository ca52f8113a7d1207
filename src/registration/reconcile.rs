use std::collections::HashMap;

use uuid::Uuid;

use crate::models::roster::NewRosterEntry;

/// Result of matching submitted roster entries against the stored roster.
/// Stored rows absent from the submission are left alone: the roster only
/// grows or is edited in place per game id, never pruned by a re-submission.
#[derive(Debug, Default)]
pub struct Reconciled {
    pub updates: Vec<(Uuid, NewRosterEntry)>,
    pub inserts: Vec<NewRosterEntry>,
}

/// Match submitted entries to stored `(id, game_id)` pairs by natural key.
pub fn reconcile(submitted: Vec<NewRosterEntry>, existing: &[(Uuid, String)]) -> Reconciled {
    let by_key: HashMap<&str, Uuid> = existing
        .iter()
        .map(|(id, key)| (key.as_str(), *id))
        .collect();

    let mut out = Reconciled::default();
    for entry in submitted {
        match by_key.get(entry.game_id.as_str()) {
            Some(id) => out.updates.push((*id, entry)),
            None => out.inserts.push(entry),
        }
    }
    out
}
