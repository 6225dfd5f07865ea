pub mod auth;
pub mod profile;

pub use auth::{AccessToken, Credentials, NewAccount, TokenPair};
pub use profile::{
    Experience, ExperienceInput, ProfilePatch, ProfileRecord, RateType, Skill, UserProfile,
};
