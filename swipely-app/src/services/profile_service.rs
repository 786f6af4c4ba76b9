use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use swipely_datastore::{Query, RecordStore, Versioned};
use swipely_shared::errors::{AppError, AppResult, ErrorCode};
use swipely_shared::types::auth::AuthUser;

use crate::models::{Gender, Profile, ProfileChanges, ProfileDraft, ProfileField};
use crate::services::auth_service::Authenticator;
use crate::services::media::StagedImage;
use crate::services::storage::ObjectStorage;
use crate::store::DataStore;

/// The signed-in party's profile. Lookups take the first record bound to
/// `sub`.
pub async fn find_by_sub(
    store: &dyn RecordStore<Profile>,
    sub: &str,
) -> AppResult<Option<Versioned<Profile>>> {
    let found = store.query(&Query::eq(ProfileField::Sub, sub)).await?;
    if found.len() > 1 {
        tracing::warn!(sub = %sub, count = found.len(), "more than one profile bound to subject");
    }
    Ok(found.into_iter().next())
}

/// What the editor shows on load.
#[derive(Debug, Clone, Serialize)]
pub struct EditorState {
    pub profile_id: Option<Uuid>,
    pub is_new: bool,
    pub draft: ProfileDraft,
    pub image: Option<String>,
    pub has_staged_image: bool,
}

pub async fn load_editor(store: &dyn RecordStore<Profile>, sub: &str) -> AppResult<EditorState> {
    match find_by_sub(store, sub).await? {
        Some(existing) => Ok(EditorState {
            profile_id: Some(existing.id),
            is_new: false,
            draft: ProfileDraft::from(&existing.record),
            image: Some(existing.image.clone()),
            has_staged_image: false,
        }),
        None => {
            tracing::warn!(sub = %sub, "no profile yet, starting as new user");
            Ok(EditorState {
                profile_id: None,
                is_new: true,
                draft: ProfileDraft::default(),
                image: None,
                has_staged_image: false,
            })
        }
    }
}

fn validate_draft(draft: &ProfileDraft) -> AppResult<(Gender, Gender)> {
    if let Err(errors) = draft.validate() {
        let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        fields.sort_unstable();
        return Err(AppError::with_details(
            ErrorCode::InvalidProfile,
            "all profile fields are required",
            serde_json::json!({ "fields": fields }),
        ));
    }
    Ok((draft.gender.parse()?, draft.looking_for.parse()?))
}

/// Storage key for a freshly picked profile image.
pub fn image_key(sub: &str, image: &StagedImage) -> String {
    format!("profiles/{sub}/{}.{}", Uuid::now_v7(), image.extension)
}

/// Save the editor contents.
///
/// Nothing is written unless every field is filled in. A staged image is
/// uploaded first; if the upload fails the save is aborted.
pub async fn save_profile(
    store: &dyn RecordStore<Profile>,
    storage: &dyn ObjectStorage,
    sub: &str,
    draft: ProfileDraft,
    staged: Option<StagedImage>,
    default_avatar: &str,
) -> AppResult<Versioned<Profile>> {
    let (gender, looking_for) = validate_draft(&draft).map_err(|e| {
        tracing::warn!(sub = %sub, error = %e, "profile save rejected");
        e
    })?;

    let existing = find_by_sub(store, sub).await?;

    let uploaded = match staged {
        Some(image) => {
            let key = image_key(sub, &image);
            let size = image.len();
            let url = storage.put(&key, image.bytes, &image.content_type).await.map_err(|e| {
                tracing::error!(sub = %sub, key = %key, error = %e, "profile image upload failed");
                AppError::from(e)
            })?;
            tracing::info!(sub = %sub, key = %key, bytes = size, "profile image uploaded");
            Some(url)
        }
        None => None,
    };

    let saved = match existing {
        Some(current) => {
            let version = current.version;
            let changes = ProfileChanges {
                name: Some(draft.name),
                bio: Some(draft.bio),
                gender: Some(gender),
                looking_for: Some(looking_for),
                image: uploaded,
            };
            let updated = store.update(changes.apply_to(current.into_inner()), version).await?;
            tracing::info!(profile_id = %updated.id, version = updated.version, "profile updated");
            updated
        }
        None => {
            let profile = Profile {
                id: Uuid::now_v7(),
                name: draft.name,
                bio: draft.bio,
                gender,
                looking_for,
                image: uploaded.unwrap_or_else(|| default_avatar.to_string()),
                sub: sub.to_string(),
            };
            let created = store.insert(profile).await?;
            tracing::info!(profile_id = %created.id, sub = %sub, "profile created");
            created
        }
    };

    Ok(saved)
}

/// Drop the local replica, then end the session.
pub async fn sign_out(
    store: &DataStore,
    auth: &dyn Authenticator,
    user: &AuthUser,
) -> AppResult<()> {
    store.clear().await?;
    auth.sign_out(user).await?;
    tracing::info!(sub = %user.sub, "signed out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::profile;
    use crate::services::storage::MemoryStorage;
    use swipely_datastore::MemoryStore;

    const AVATAR: &str = "https://avatar/default.png";

    fn draft(name: &str, bio: &str, gender: &str, looking_for: &str) -> ProfileDraft {
        ProfileDraft {
            name: name.into(),
            bio: bio.into(),
            gender: gender.into(),
            looking_for: looking_for.into(),
        }
    }

    fn png() -> StagedImage {
        StagedImage::new("image/png", vec![137, 80, 78, 71]).unwrap()
    }

    #[tokio::test]
    async fn any_empty_field_writes_nothing() {
        let ann = profile("ann", Gender::Female, Gender::Male);
        let store = MemoryStore::with_records(vec![ann.clone()]);
        let storage = MemoryStorage::new("http://cdn");

        let cases = [
            draft("", "bio", "FEMALE", "MALE"),
            draft("Ann", "", "FEMALE", "MALE"),
            draft("Ann", "bio", "", "MALE"),
            draft("Ann", "bio", "FEMALE", ""),
        ];
        for case in cases {
            let err = save_profile(&store, &storage, &ann.sub, case, Some(png()), AVATAR)
                .await
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidProfile);
        }

        assert_eq!(store.writes(), 0);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn save_without_image_keeps_stored_reference() {
        let ann = profile("ann", Gender::Female, Gender::Male);
        let store = MemoryStore::with_records(vec![ann.clone()]);
        let storage = MemoryStorage::new("http://cdn");

        let draft = draft("Ann B", "new bio", "female", "male");
        let saved = save_profile(&store, &storage, &ann.sub, draft, None, AVATAR)
            .await
            .unwrap();

        assert_eq!(store.writes(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(saved.version, 2);
        assert_eq!(saved.id, ann.id);
        assert_eq!(saved.image, ann.image);
        assert_eq!(saved.name, "Ann B");
    }

    #[tokio::test]
    async fn new_profile_gets_default_avatar() {
        let store = MemoryStore::<Profile>::new();
        let storage = MemoryStorage::new("http://cdn");

        let draft = draft("Zoe", "hi", "FEMALE", "FEMALE");
        let created = save_profile(&store, &storage, "sub-new", draft, None, AVATAR)
            .await
            .unwrap();
        assert_eq!(created.image, AVATAR);
        assert_eq!(created.sub, "sub-new");
        assert_eq!(created.version, 1);
    }

    #[tokio::test]
    async fn staged_image_is_uploaded_under_subject() {
        let store = MemoryStore::<Profile>::new();
        let storage = MemoryStorage::new("http://cdn");

        let draft = draft("Zoe", "hi", "FEMALE", "MALE");
        let created = save_profile(&store, &storage, "sub-zoe", draft, Some(png()), AVATAR)
            .await
            .unwrap();
        assert!(created.image.starts_with("http://cdn/profiles/sub-zoe/"));
        assert!(created.image.ends_with(".png"));
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn failed_upload_aborts_save() {
        let ann = profile("ann", Gender::Female, Gender::Male);
        let store = MemoryStore::with_records(vec![ann.clone()]);
        let storage = MemoryStorage::new("http://cdn");
        storage.set_failing(true);

        let draft = draft("Ann", "bio", "FEMALE", "MALE");
        let err = save_profile(&store, &storage, &ann.sub, draft, Some(png()), AVATAR)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PhotoUploadFailed);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn invalid_gender_is_rejected() {
        let store = MemoryStore::<Profile>::new();
        let storage = MemoryStorage::new("http://cdn");
        let draft = draft("A", "b", "robot", "MALE");
        let err = save_profile(&store, &storage, "sub", draft, None, AVATAR)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidGender);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn missing_profile_loads_as_new_user() {
        let store = MemoryStore::<Profile>::new();
        let editor = load_editor(&store, "sub-nobody").await.unwrap();
        assert!(editor.is_new);
        assert_eq!(editor.draft, ProfileDraft::default());

        let ann = profile("ann", Gender::Female, Gender::Male);
        let store = MemoryStore::with_records(vec![ann.clone()]);
        let editor = load_editor(&store, &ann.sub).await.unwrap();
        assert_eq!(editor.profile_id, Some(ann.id));
        assert_eq!(editor.draft.gender, "FEMALE");
    }
}
