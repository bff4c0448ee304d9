// Artisan profile read model
// Explicit structured view of a provider profile as consumed by enrichment and fusion


use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Expert,
    Master,
}

impl ExperienceLevel {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Expert => "expert",
            ExperienceLevel::Master => "master",
        }
    }

    /// Phrase used in the skills facet text
    #[inline]
    pub fn phrase(self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "emerging artisan",
            ExperienceLevel::Intermediate => "experienced artisan",
            ExperienceLevel::Expert => "expert craftsperson",
            ExperienceLevel::Master => "master craftsperson",
        }
    }

    #[inline]
    pub fn is_advanced(self) -> bool {
        matches!(self, ExperienceLevel::Expert | ExperienceLevel::Master)
    }
}

impl std::fmt::Display for ExperienceLevel {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExperienceLevel {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(ExperienceLevel::Beginner),
            "intermediate" => Ok(ExperienceLevel::Intermediate),
            "expert" => Ok(ExperienceLevel::Expert),
            "master" => Ok(ExperienceLevel::Master),
            other => Err(format!("unknown experience level: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f32,
    pub max: f32,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl PriceRange {
    #[inline]
    pub fn midpoint(&self) -> f32 {
        self.min.midpoint(self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Review {
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub text: String,
}

/// Profile record produced by the profile-management system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ArtisanProfile {
    pub id: String,
    pub name: String,
    pub profession: Option<String>,
    pub description: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub certifications: Vec<String>,
    pub skills: Vec<String>,
    pub materials: Vec<String>,
    pub techniques: Vec<String>,
    pub portfolio_keywords: Vec<String>,
    pub price_range: Option<PriceRange>,
    pub turnaround_days: Option<u32>,
    pub experience_level: Option<ExperienceLevel>,
    pub verified: bool,
    pub rating: Option<f32>,
    pub reviews: Vec<Review>,
}

impl ArtisanProfile {
    #[inline]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Free text of the identity fields, space separated
    #[inline]
    pub fn identity_text(&self) -> String {
        [
            Some(self.name.as_str()),
            self.profession.as_deref(),
            self.description.as_deref(),
            self.bio.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Mean of the review ratings that carry one
    #[inline]
    pub fn mean_review_rating(&self) -> Option<f32> {
        let ratings: Vec<f32> = self.reviews.iter().filter_map(|r| r.rating).collect();
        if ratings.is_empty() {
            return None;
        }
        Some(ratings.iter().sum::<f32>() / ratings.len() as f32)
    }

    /// Hash over the fields that feed enrichment
    ///
    /// Identifier and location do not participate, so moving or re-keying a
    /// profile does not force re-enrichment.
    #[inline]
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hash_str(&mut hasher, &self.name);
        hash_opt_str(&mut hasher, self.profession.as_deref());
        hash_opt_str(&mut hasher, self.description.as_deref());
        hash_opt_str(&mut hasher, self.bio.as_deref());
        hash_list(&mut hasher, &self.certifications);
        hash_list(&mut hasher, &self.skills);
        hash_list(&mut hasher, &self.materials);
        hash_list(&mut hasher, &self.techniques);
        hash_list(&mut hasher, &self.portfolio_keywords);

        match &self.price_range {
            Some(range) => {
                hasher.update(&[1]);
                hasher.update(&range.min.to_le_bytes());
                hasher.update(&range.max.to_le_bytes());
                hash_str(&mut hasher, &range.currency);
            }
            None => {
                hasher.update(&[0]);
            }
        }

        match self.turnaround_days {
            Some(days) => hasher.update(&[1]).update(&days.to_le_bytes()),
            None => hasher.update(&[0]),
        };

        hash_opt_str(&mut hasher, self.experience_level.map(ExperienceLevel::as_str));
        hasher.update(&[u8::from(self.verified)]);

        match self.rating {
            Some(rating) => hasher.update(&[1]).update(&rating.to_le_bytes()),
            None => hasher.update(&[0]),
        };

        hasher.update(&(self.reviews.len() as u64).to_le_bytes());
        for review in &self.reviews {
            match review.rating {
                Some(rating) => hasher.update(&[1]).update(&rating.to_le_bytes()),
                None => hasher.update(&[0]),
            };
            hash_str(&mut hasher, &review.text);
        }

        hasher.finalize().to_hex().to_string()
    }
}

fn hash_str(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn hash_opt_str(hasher: &mut blake3::Hasher, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update(&[1]);
            hash_str(hasher, v);
        }
        None => {
            hasher.update(&[0]);
        }
    }
}

fn hash_list(hasher: &mut blake3::Hasher, values: &[String]) {
    hasher.update(&(values.len() as u64).to_le_bytes());
    for value in values {
        hash_str(hasher, value);
    }
}
