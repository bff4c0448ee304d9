use async_trait::async_trait;

use super::lexicon::{DESCRIPTION_SKILLS, PROFESSION_SKILLS};
use super::{Analyzer, AnalyzerKind, AnalyzerOutput, push_unique};
use crate::Result;
use crate::profile::ArtisanProfile;

/// Infers skills from the profession and description that the profile
/// does not already declare
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillAnalyzer;

impl SkillAnalyzer {
    #[inline]
    pub fn infer(&self, profile: &ArtisanProfile) -> Vec<String> {
        let mut inferred = Vec::new();

        if let Some(profession) = profile.profession.as_deref() {
            let profession = profession.to_lowercase();
            for (fragment, skills) in PROFESSION_SKILLS {
                if profession.contains(fragment) {
                    for skill in *skills {
                        push_unique(&mut inferred, skill);
                    }
                }
            }
        }

        let prose = [profile.description.as_deref(), profile.bio.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        for (fragment, skill) in DESCRIPTION_SKILLS {
            if prose.contains(fragment) {
                push_unique(&mut inferred, skill);
            }
        }

        inferred.retain(|skill| {
            !profile
                .skills
                .iter()
                .any(|declared| declared.trim().eq_ignore_ascii_case(skill))
        });
        inferred
    }
}

#[async_trait]
impl Analyzer for SkillAnalyzer {
    #[inline]
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Skills
    }

    async fn analyze(&self, profile: &ArtisanProfile) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Skills(self.infer(profile)))
    }
}
