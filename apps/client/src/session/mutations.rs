//! Profile mutation operations.
//!
//! Each operation calls the API first and patches local state from the server's
//! reply only after it succeeds. On failure the error is returned and the session
//! is left exactly as it was.

use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info};

use super::Session;
use crate::api_client::ApiError;
use crate::errors::AppError;
use crate::models::{Experience, ExperienceInput, ProfilePatch, Skill};

/// Largest accepted avatar image, in decoded bytes.
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

impl Session {
    /// PUT /users, then merge whatever fields the server returned.
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<(), AppError> {
        let ctx = self.context().await?;
        let fields = self.api.update_profile(&ctx.token, patch).await?;
        self.patch_user(ctx.epoch, |user| {
            user.merge_fields(&fields)
                .map_err(|e| AppError::from(ApiError::Decode(e)))
        })
        .await
    }

    /// Uploads a `data:image/...;base64,...` URL and takes the avatar from the reply.
    pub async fn update_profile_picture(&self, data_url: &str) -> Result<(), AppError> {
        check_avatar_data_url(data_url)?;
        let ctx = self.context().await?;
        let fields = self.api.upload_avatar(&ctx.token, data_url).await?;
        let avatar = match fields.get("avatar") {
            Some(value) => serde_json::from_value::<Option<String>>(value.clone())
                .map_err(|e| AppError::from(ApiError::Decode(e)))?,
            None => None,
        };
        self.patch_user(ctx.epoch, |user| {
            user.record.avatar = avatar;
            Ok(())
        })
        .await
    }

    pub async fn add_skill(&self, name: &str) -> Result<Skill, AppError> {
        let ctx = self.context().await?;
        let skill = self.api.create_skill(&ctx.token, name).await?;
        let appended = skill.clone();
        self.patch_user(ctx.epoch, |user| {
            user.skills.push(appended);
            Ok(())
        })
        .await?;
        Ok(skill)
    }

    pub async fn remove_skill(&self, skill_id: i64) -> Result<(), AppError> {
        let ctx = self.context().await?;
        self.api.delete_skill(&ctx.token, skill_id).await?;
        self.patch_user(ctx.epoch, |user| {
            user.skills.retain(|s| s.id != skill_id);
            Ok(())
        })
        .await
    }

    /// Brings the skill list in line with `wanted` (matched by name): adds the
    /// missing names, then removes skills no longer wanted. Stops at the first failure.
    pub async fn sync_skills(&self, wanted: &[String]) -> Result<(), AppError> {
        let current = self
            .user()
            .await
            .map(|u| u.skills)
            .ok_or(AppError::NotAuthenticated)?;
        let plan = plan_skill_sync(&current, wanted);
        debug!(
            "Skill sync: {} to add, {} to remove",
            plan.to_add.len(),
            plan.to_remove.len()
        );

        for name in &plan.to_add {
            self.add_skill(name).await?;
        }
        for skill_id in plan.to_remove {
            self.remove_skill(skill_id).await?;
        }
        Ok(())
    }

    /// All known skill names, for suggestions. Read-only.
    pub async fn skill_catalog(&self) -> Result<Vec<String>, AppError> {
        let ctx = self.context().await?;
        Ok(self.api.fetch_skill_catalog(&ctx.token).await?)
    }

    /// Reloads only the experience list.
    pub async fn fetch_experiences(&self) -> Result<(), AppError> {
        let ctx = self.context().await?;
        let experiences = self.api.fetch_experiences(&ctx.token).await?;
        self.patch_user(ctx.epoch, |user| {
            user.experiences = experiences;
            Ok(())
        })
        .await
    }

    pub async fn add_experience(&self, input: &ExperienceInput) -> Result<Experience, AppError> {
        let ctx = self.context().await?;
        let experience = self.api.create_experience(&ctx.token, input).await?;
        let appended = experience.clone();
        self.patch_user(ctx.epoch, |user| {
            user.experiences.push(appended);
            Ok(())
        })
        .await?;
        Ok(experience)
    }

    pub async fn update_experience(
        &self,
        experience_id: i64,
        input: &ExperienceInput,
    ) -> Result<Experience, AppError> {
        let ctx = self.context().await?;
        let updated = self
            .api
            .update_experience(&ctx.token, experience_id, input)
            .await?;
        let replacement = updated.clone();
        self.patch_user(ctx.epoch, |user| {
            for experience in user.experiences.iter_mut() {
                if experience.id == experience_id {
                    *experience = replacement.clone();
                }
            }
            Ok(())
        })
        .await?;
        Ok(updated)
    }

    pub async fn remove_experience(&self, experience_id: i64) -> Result<(), AppError> {
        let ctx = self.context().await?;
        self.api.delete_experience(&ctx.token, experience_id).await?;
        self.patch_user(ctx.epoch, |user| {
            user.experiences.retain(|e| e.id != experience_id);
            Ok(())
        })
        .await?;
        info!("Removed experience {experience_id}");
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
struct SkillSyncPlan {
    to_add: Vec<String>,
    to_remove: Vec<i64>,
}

fn plan_skill_sync(current: &[Skill], wanted: &[String]) -> SkillSyncPlan {
    let have: HashSet<&str> = current.iter().map(|s| s.name.as_str()).collect();
    let want: HashSet<&str> = wanted.iter().map(String::as_str).collect();

    let mut seen = HashSet::new();
    let to_add = wanted
        .iter()
        .filter(|name| !have.contains(name.as_str()) && seen.insert(name.as_str()))
        .cloned()
        .collect();
    let to_remove = current
        .iter()
        .filter(|s| !want.contains(s.name.as_str()))
        .map(|s| s.id)
        .collect();

    SkillSyncPlan { to_add, to_remove }
}

/// Builds a `data:` URL for an avatar image.
pub fn encode_avatar(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Accepts only `data:image/<type>;base64,<payload>` with a payload of at most
/// `MAX_AVATAR_BYTES` decoded bytes.
fn check_avatar_data_url(data_url: &str) -> Result<(), AppError> {
    let invalid = || AppError::Validation("avatar must be a base64 image data URL".to_string());

    let rest = data_url.strip_prefix("data:").ok_or_else(invalid)?;
    let (meta, payload) = rest.split_once(',').ok_or_else(invalid)?;
    let mime = meta.strip_suffix(";base64").ok_or_else(invalid)?;
    if !mime.starts_with("image/") {
        return Err(invalid());
    }

    let bytes = STANDARD.decode(payload).map_err(|_| invalid())?;
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(AppError::Validation(format!(
            "avatar is {} bytes, limit is {MAX_AVATAR_BYTES}",
            bytes.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(id: i64, name: &str) -> Skill {
        Skill {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_plan_adds_missing_and_removes_unwanted() {
        let current = vec![skill(1, "Rust"), skill(2, "Go"), skill(3, "Go")];
        let wanted = vec!["Rust".to_string(), "SQL".to_string(), "SQL".to_string()];

        let plan = plan_skill_sync(&current, &wanted);
        assert_eq!(plan.to_add, vec!["SQL".to_string()]);
        assert_eq!(plan.to_remove, vec![2, 3]);
    }

    #[test]
    fn test_plan_noop_when_in_sync() {
        let current = vec![skill(1, "Rust")];
        let plan = plan_skill_sync(&current, &["Rust".to_string()]);
        assert!(plan.to_add.is_empty());
        assert!(plan.to_remove.is_empty());
    }

    #[test]
    fn test_avatar_data_url_accepted() {
        let url = encode_avatar(&[0x89, 0x50, 0x4e, 0x47], "image/png");
        assert!(url.starts_with("data:image/png;base64,"));
        assert!(check_avatar_data_url(&url).is_ok());
    }

    #[test]
    fn test_avatar_over_limit_rejected() {
        let url = encode_avatar(&vec![0u8; MAX_AVATAR_BYTES + 1], "image/jpeg");
        assert!(matches!(
            check_avatar_data_url(&url),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_avatar_malformed_rejected() {
        for bad in [
            "https://example.com/me.png",
            "data:image/png,raw",
            "data:text/plain;base64,aGk=",
            "data:image/png;base64,***",
        ] {
            assert!(check_avatar_data_url(bad).is_err(), "{bad}");
        }
    }
}
