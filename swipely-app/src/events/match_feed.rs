use uuid::Uuid;

use swipely_datastore::ChangeEvent;

use crate::models::MatchRecord;

/// A record that just became a confirmed match involving `me`.
///
/// Only updates count: a record is created pending and flips to confirmed
/// when the other side swipes back.
pub fn new_match_for(event: &ChangeEvent<MatchRecord>, me: Uuid) -> Option<&MatchRecord> {
    match event {
        ChangeEvent::Updated(v) if v.is_match && v.involves(me) => {
            tracing::info!(match_id = %v.id, profile_id = %me, "new match waiting");
            Some(&v.record)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swipely_datastore::Versioned;

    #[test]
    fn only_confirmed_updates_involving_me() {
        let (me, other) = (Uuid::new_v4(), Uuid::new_v4());
        let pending = MatchRecord::pending(other, me);
        let confirmed = MatchRecord { is_match: true, ..pending.clone() };

        let created = ChangeEvent::Created(Versioned::new(pending.clone(), 1));
        assert!(new_match_for(&created, me).is_none());

        let still_pending = ChangeEvent::Updated(Versioned::new(pending, 2));
        assert!(new_match_for(&still_pending, me).is_none());

        let updated = ChangeEvent::Updated(Versioned::new(confirmed.clone(), 2));
        assert_eq!(new_match_for(&updated, me), Some(&confirmed));
        assert!(new_match_for(&updated, Uuid::new_v4()).is_none());

        assert!(new_match_for(&ChangeEvent::Synced, me).is_none());
    }
}
