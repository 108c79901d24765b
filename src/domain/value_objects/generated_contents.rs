use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::generated_contents::GeneratedContentEntity;

/// Generation request: either a raw prompt or structured listing details
/// that get composed into one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateTextRequest {
    pub prompt: Option<String>,
    pub property: Option<PropertyDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDetails {
    pub property_type: String,
    pub neighborhood: String,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_sqm: Option<i32>,
    pub price: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    pub target_platform: Option<String>,
    pub tone: Option<String>,
}

impl GenerateTextRequest {
    pub fn to_prompt(&self) -> String {
        if let Some(prompt) = self.prompt.as_deref() {
            let prompt = prompt.trim();
            if !prompt.is_empty() {
                return prompt.to_string();
            }
        }

        let Some(property) = self.property.as_ref() else {
            return String::new();
        };

        let mut parts = vec![format!(
            "Write a marketing post for a {} in {}.",
            property.property_type.trim(),
            property.neighborhood.trim()
        )];
        if let Some(bedrooms) = property.bedrooms {
            parts.push(format!("{} bedrooms.", bedrooms));
        }
        if let Some(bathrooms) = property.bathrooms {
            parts.push(format!("{} bathrooms.", bathrooms));
        }
        if let Some(area) = property.area_sqm {
            parts.push(format!("{} square meters.", area));
        }
        if let Some(price) = property.price.as_deref() {
            parts.push(format!("Asking price: {}.", price.trim()));
        }
        if !property.highlights.is_empty() {
            parts.push(format!("Highlights: {}.", property.highlights.join(", ")));
        }
        if let Some(platform) = property.target_platform.as_deref() {
            parts.push(format!("Target platform: {}.", platform.trim()));
        }
        if let Some(tone) = property.tone.as_deref() {
            parts.push(format!("Tone: {}.", tone.trim()));
        }

        if property.property_type.trim().is_empty() || property.neighborhood.trim().is_empty() {
            return String::new();
        }

        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub is_favorite: Option<bool>,
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedContentDto {
    pub id: i64,
    pub prompt_used: String,
    pub generated_text: String,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl From<GeneratedContentEntity> for GeneratedContentDto {
    fn from(value: GeneratedContentEntity) -> Self {
        Self {
            id: value.id,
            prompt_used: value.prompt_used,
            generated_text: value.generated_text,
            is_favorite: value.is_favorite,
            created_at: value.created_at,
        }
    }
}
