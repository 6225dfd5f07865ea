use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Experience {
    pub id: i64,
    pub name: String,
    pub year: i32,
}

/// Body of experience create/update calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperienceInput {
    pub name: String,
    pub year: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    #[serde(other)]
    Unknown,
}

impl std::str::FromStr for RateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hourly" => Ok(RateType::Hourly),
            "daily" => Ok(RateType::Daily),
            "weekly" => Ok(RateType::Weekly),
            "monthly" => Ok(RateType::Monthly),
            other => Err(format!("unknown rate type '{other}'")),
        }
    }
}

/// The user record as returned by `GET /users`.
///
/// Server-owned fields (`created_at`, `views`, `follows`, `avatar`, `pdf_data`,
/// `pdf_date`) are only ever copied from responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default)]
    pub work_mode: Option<String>,
    #[serde(default)]
    pub work_type: Option<String>,
    #[serde(default)]
    pub work_commitment: Option<String>,
    #[serde(default)]
    pub rate_value: Option<f64>,
    #[serde(default)]
    pub rate_type: Option<RateType>,
    #[serde(default)]
    pub primary_job: Option<String>,
    #[serde(default)]
    pub secondary_job: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub views: Option<i64>,
    #[serde(default)]
    pub follows: Option<i64>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub pdf_data: Option<String>,
    #[serde(default)]
    pub pdf_date: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    /// Overlays the keys present in `fields` onto this record.
    /// Keys absent from `fields` keep their current value; unknown keys are ignored.
    pub fn merge(&mut self, fields: &Map<String, Value>) -> Result<(), serde_json::Error> {
        let mut merged = serde_json::to_value(&*self)?;
        if let Value::Object(map) = &mut merged {
            for (key, value) in fields {
                map.insert(key.clone(), value.clone());
            }
        }
        *self = serde_json::from_value(merged)?;
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Aggregate held by the session: the record plus the user's skills and experiences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(flatten)]
    pub record: ProfileRecord,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub experiences: Vec<Experience>,
}

impl UserProfile {
    pub fn assemble(
        record: ProfileRecord,
        skills: Vec<Skill>,
        experiences: Vec<Experience>,
    ) -> Self {
        Self {
            record,
            skills,
            experiences,
        }
    }

    /// Applies a field map returned by `PUT /users`.
    /// Collections are replaced only when the response carries them.
    pub fn merge_fields(&mut self, fields: &Map<String, Value>) -> Result<(), serde_json::Error> {
        let mut record = self.record.clone();
        record.merge(fields)?;

        let skills = match fields.get("skills") {
            Some(v) if !v.is_null() => Some(serde_json::from_value::<Vec<Skill>>(v.clone())?),
            _ => None,
        };
        let experiences = match fields.get("experiences") {
            Some(v) if !v.is_null() => {
                Some(serde_json::from_value::<Vec<Experience>>(v.clone())?)
            }
            _ => None,
        };

        self.record = record;
        if let Some(skills) = skills {
            self.skills = skills;
        }
        if let Some(experiences) = experiences {
            self.experiences = experiences;
        }
        Ok(())
    }
}

/// Partial update for `PUT /users`. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_commitment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_type: Option<RateType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_job: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_job: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

impl ProfilePatch {
    /// Builds a single-field patch from a camelCase field name, e.g. `workMode`.
    pub fn single(field: &str, value: &str) -> Result<Self, String> {
        let mut patch = ProfilePatch::default();
        let text = Some(value.to_string());
        match field {
            "email" => patch.email = text,
            "firstName" => patch.first_name = text,
            "lastName" => patch.last_name = text,
            "phoneNumber" => patch.phone_number = text,
            "address" => patch.address = text,
            "aboutMe" => patch.about_me = text,
            "workMode" => patch.work_mode = text,
            "workType" => patch.work_type = text,
            "workCommitment" => patch.work_commitment = text,
            "rateValue" => {
                let rate = value
                    .parse::<f64>()
                    .map_err(|_| format!("rateValue must be a number, got '{value}'"))?;
                patch.rate_value = Some(rate);
            }
            "rateType" => patch.rate_type = Some(value.parse()?),
            "primaryJob" => patch.primary_job = text,
            "secondaryJob" => patch.secondary_job = text,
            "facebook" => patch.facebook = text,
            "linkedin" => patch.linkedin = text,
            "instagram" => patch.instagram = text,
            "twitter" => patch.twitter = text,
            other => return Err(format!("'{other}' is not an editable profile field")),
        }
        Ok(patch)
    }
}
