use chrono::Weekday;

/// Funding categories the discovery pipeline searches for.
///
/// Categories are grouped into a weekly rotation so that every category
/// gets searched once per week without burning the daily API quotas of the
/// metered engines in a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FundingCategory {
    // Monday: individual funding
    IndividualScholarships,
    StudentFinancialAid,
    TeacherScholarships,
    AcademicFellowships,
    // Tuesday: program funding
    ProgramGrants,
    CurriculumDevelopment,
    AfterSchoolPrograms,
    SummerPrograms,
    ExtracurricularActivities,
    // Wednesday: infrastructure
    InfrastructureFunding,
    TechnologyEquipment,
    LibraryResources,
    // Thursday: professional development
    TeacherDevelopment,
    ProfessionalTraining,
    AdministrativeCapacity,
    // Friday: specialized education
    StemEducation,
    ArtsEducation,
    SpecialNeedsEducation,
    LanguagePrograms,
    // Saturday: community
    CommunityPartnerships,
    ParentEngagement,
    NgoEducationProjects,
    // Sunday: research and innovation
    EducationResearch,
    PilotPrograms,
    InnovationGrants,
    EarlyChildhoodEducation,
    AdultEducation,
    VocationalTraining,
    EducationalTechnology,
    ArtsCulture,
}

impl FundingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundingCategory::IndividualScholarships => "individual_scholarships",
            FundingCategory::StudentFinancialAid => "student_financial_aid",
            FundingCategory::TeacherScholarships => "teacher_scholarships",
            FundingCategory::AcademicFellowships => "academic_fellowships",
            FundingCategory::ProgramGrants => "program_grants",
            FundingCategory::CurriculumDevelopment => "curriculum_development",
            FundingCategory::AfterSchoolPrograms => "after_school_programs",
            FundingCategory::SummerPrograms => "summer_programs",
            FundingCategory::ExtracurricularActivities => "extracurricular_activities",
            FundingCategory::InfrastructureFunding => "infrastructure_funding",
            FundingCategory::TechnologyEquipment => "technology_equipment",
            FundingCategory::LibraryResources => "library_resources",
            FundingCategory::TeacherDevelopment => "teacher_development",
            FundingCategory::ProfessionalTraining => "professional_training",
            FundingCategory::AdministrativeCapacity => "administrative_capacity",
            FundingCategory::StemEducation => "stem_education",
            FundingCategory::ArtsEducation => "arts_education",
            FundingCategory::SpecialNeedsEducation => "special_needs_education",
            FundingCategory::LanguagePrograms => "language_programs",
            FundingCategory::CommunityPartnerships => "community_partnerships",
            FundingCategory::ParentEngagement => "parent_engagement",
            FundingCategory::NgoEducationProjects => "ngo_education_projects",
            FundingCategory::EducationResearch => "education_research",
            FundingCategory::PilotPrograms => "pilot_programs",
            FundingCategory::InnovationGrants => "innovation_grants",
            FundingCategory::EarlyChildhoodEducation => "early_childhood_education",
            FundingCategory::AdultEducation => "adult_education",
            FundingCategory::VocationalTraining => "vocational_training",
            FundingCategory::EducationalTechnology => "educational_technology",
            FundingCategory::ArtsCulture => "arts_culture",
        }
    }

    /// Human phrase used when building search queries for this category.
    pub fn search_phrase(&self) -> &'static str {
        match self {
            FundingCategory::IndividualScholarships => "individual scholarships",
            FundingCategory::StudentFinancialAid => "student financial aid",
            FundingCategory::TeacherScholarships => "teacher scholarships",
            FundingCategory::AcademicFellowships => "academic fellowships",
            FundingCategory::ProgramGrants => "education program grants",
            FundingCategory::CurriculumDevelopment => "curriculum development funding",
            FundingCategory::AfterSchoolPrograms => "after school program funding",
            FundingCategory::SummerPrograms => "summer program grants",
            FundingCategory::ExtracurricularActivities => "extracurricular activity funding",
            FundingCategory::InfrastructureFunding => "school infrastructure funding",
            FundingCategory::TechnologyEquipment => "school technology equipment grants",
            FundingCategory::LibraryResources => "library resource grants",
            FundingCategory::TeacherDevelopment => "teacher development grants",
            FundingCategory::ProfessionalTraining => "professional training funding",
            FundingCategory::AdministrativeCapacity => "administrative capacity grants",
            FundingCategory::StemEducation => "STEM education grants",
            FundingCategory::ArtsEducation => "arts education grants",
            FundingCategory::SpecialNeedsEducation => "special needs education funding",
            FundingCategory::LanguagePrograms => "language program grants",
            FundingCategory::CommunityPartnerships => "community partnership grants",
            FundingCategory::ParentEngagement => "parent engagement funding",
            FundingCategory::NgoEducationProjects => "NGO education project funding",
            FundingCategory::EducationResearch => "education research grants",
            FundingCategory::PilotPrograms => "education pilot program funding",
            FundingCategory::InnovationGrants => "education innovation grants",
            FundingCategory::EarlyChildhoodEducation => "early childhood education grants",
            FundingCategory::AdultEducation => "adult education funding",
            FundingCategory::VocationalTraining => "vocational training grants",
            FundingCategory::EducationalTechnology => "educational technology grants",
            FundingCategory::ArtsCulture => "arts and culture education funding",
        }
    }

    /// The categories searched on a given day of the week.
    ///
    /// Every category appears exactly once across the seven days.
    pub fn for_weekday(weekday: Weekday) -> &'static [FundingCategory] {
        match weekday {
            Weekday::Mon => &[
                FundingCategory::IndividualScholarships,
                FundingCategory::StudentFinancialAid,
                FundingCategory::TeacherScholarships,
                FundingCategory::AcademicFellowships,
            ],
            Weekday::Tue => &[
                FundingCategory::ProgramGrants,
                FundingCategory::CurriculumDevelopment,
                FundingCategory::AfterSchoolPrograms,
                FundingCategory::SummerPrograms,
                FundingCategory::ExtracurricularActivities,
            ],
            Weekday::Wed => &[
                FundingCategory::InfrastructureFunding,
                FundingCategory::TechnologyEquipment,
                FundingCategory::LibraryResources,
            ],
            Weekday::Thu => &[
                FundingCategory::TeacherDevelopment,
                FundingCategory::ProfessionalTraining,
                FundingCategory::AdministrativeCapacity,
            ],
            Weekday::Fri => &[
                FundingCategory::StemEducation,
                FundingCategory::ArtsEducation,
                FundingCategory::SpecialNeedsEducation,
                FundingCategory::LanguagePrograms,
            ],
            Weekday::Sat => &[
                FundingCategory::CommunityPartnerships,
                FundingCategory::ParentEngagement,
                FundingCategory::NgoEducationProjects,
            ],
            Weekday::Sun => &[
                FundingCategory::EducationResearch,
                FundingCategory::PilotPrograms,
                FundingCategory::InnovationGrants,
                FundingCategory::EarlyChildhoodEducation,
                FundingCategory::AdultEducation,
                FundingCategory::VocationalTraining,
                FundingCategory::EducationalTechnology,
                FundingCategory::ArtsCulture,
            ],
        }
    }

    pub fn all() -> Vec<FundingCategory> {
        let weekdays = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ];
        weekdays
            .iter()
            .flat_map(|d| FundingCategory::for_weekday(*d).iter().copied())
            .collect()
    }
}

impl std::fmt::Display for FundingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FundingCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        FundingCategory::all()
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Invalid funding category: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn weekly_rotation_covers_every_category_once() {
        let all = FundingCategory::all();
        assert_eq!(all.len(), 30);

        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), 30);
    }

    #[test]
    fn rotation_sizes_match_schedule() {
        assert_eq!(FundingCategory::for_weekday(Weekday::Mon).len(), 4);
        assert_eq!(FundingCategory::for_weekday(Weekday::Tue).len(), 5);
        assert_eq!(FundingCategory::for_weekday(Weekday::Wed).len(), 3);
        assert_eq!(FundingCategory::for_weekday(Weekday::Thu).len(), 3);
        assert_eq!(FundingCategory::for_weekday(Weekday::Fri).len(), 4);
        assert_eq!(FundingCategory::for_weekday(Weekday::Sat).len(), 3);
        assert_eq!(FundingCategory::for_weekday(Weekday::Sun).len(), 8);
    }

    #[test]
    fn category_strings_round_trip() {
        for category in FundingCategory::all() {
            let parsed: FundingCategory = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }
}
