use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCandidatePayload {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub display_name: String,
    #[validate(length(min = 1))]
    pub profession: String,
    #[validate(length(min = 1))]
    pub timezone: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 60))]
    pub experience_years: i32,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub focus_areas: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInterviewerPayload {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub display_name: String,
    #[validate(length(min = 1))]
    pub profession: String,
    #[validate(length(min = 1))]
    pub timezone: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 60))]
    pub experience_years: i32,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
}
