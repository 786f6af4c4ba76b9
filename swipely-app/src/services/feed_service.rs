use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use swipely_datastore::{Query, RecordStore};
use swipely_shared::errors::AppResult;

use crate::models::{MatchField, MatchRecord, Profile, ProfileField};
use crate::store::DataStore;

/// Confirmed matches involving `me`.
pub fn confirmed_matches_query(me: Uuid) -> Query<MatchField> {
    Query::eq(MatchField::IsMatch, true)
        .and(Query::eq(MatchField::User1Id, me).or(Query::eq(MatchField::User2Id, me)))
}

/// Profiles of the gender `me` is looking for, minus `me` and everyone in
/// `exclude`.
pub fn candidates_query(me: &Profile, exclude: &HashSet<Uuid>) -> Query<ProfileField> {
    let mut ids: Vec<&Uuid> = exclude.iter().collect();
    ids.sort();

    let base = Query::eq(ProfileField::Gender, me.looking_for.as_str())
        .and(Query::ne(ProfileField::Id, me.id));
    ids.into_iter()
        .fold(base, |q, id| q.and(Query::ne(ProfileField::Id, *id)))
}

pub async fn confirmed_matches(
    store: &dyn RecordStore<MatchRecord>,
    me: Uuid,
) -> AppResult<Vec<MatchRecord>> {
    let found = store.query(&confirmed_matches_query(me)).await?;
    Ok(found.into_iter().map(|v| v.into_inner()).collect())
}

/// Ids of everyone `me` is already matched with.
pub async fn matched_ids(
    store: &dyn RecordStore<MatchRecord>,
    me: Uuid,
) -> AppResult<HashSet<Uuid>> {
    Ok(confirmed_matches(store, me)
        .await?
        .iter()
        .map(|m| m.counterpart(me))
        .collect())
}

/// Load the home deck for `me`. The match set is read first so confirmed
/// counterparts never show up as candidates.
pub async fn load_candidates(store: &DataStore, me: &Profile) -> AppResult<Vec<Profile>> {
    let exclude = matched_ids(store.matches.as_ref(), me.id).await?;
    let candidates: Vec<Profile> = store
        .profiles
        .query(&candidates_query(me, &exclude))
        .await?
        .into_iter()
        .map(|v| v.into_inner())
        .collect();

    tracing::info!(
        profile_id = %me.id,
        looking_for = %me.looking_for,
        excluded = exclude.len(),
        candidates = candidates.len(),
        "feed loaded"
    );
    Ok(candidates)
}

/// One row of the matches screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCard {
    pub match_id: Uuid,
    pub profile_id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

pub const UNRESOLVED_MATCH_NAME: &str = "New Match";

/// Confirmed matches resolved to the counterpart's profile. A counterpart
/// not present in the store yet is shown as a placeholder.
pub async fn match_cards(store: &DataStore, me: Uuid) -> AppResult<Vec<MatchCard>> {
    let matches = confirmed_matches(store.matches.as_ref(), me).await?;

    let mut profiles: HashMap<Uuid, Profile> = HashMap::with_capacity(matches.len());
    for m in &matches {
        let other = m.counterpart(me);
        if profiles.contains_key(&other) {
            continue;
        }
        if let Some(found) = store.profiles.get(other).await? {
            profiles.insert(other, found.into_inner());
        }
    }

    Ok(matches
        .iter()
        .map(|m| {
            let other = m.counterpart(me);
            match profiles.get(&other) {
                Some(p) => MatchCard {
                    match_id: m.id,
                    profile_id: other,
                    name: p.name.clone(),
                    image: Some(p.image.clone()),
                },
                None => MatchCard {
                    match_id: m.id,
                    profile_id: other,
                    name: UNRESOLVED_MATCH_NAME.to_string(),
                    image: None,
                },
            }
        })
        .collect())
}
