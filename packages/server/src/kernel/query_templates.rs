use anyhow::Result;
use async_trait::async_trait;

use super::traits::BaseQuerySource;
use crate::domains::discovery::models::FundingCategory;

/// Keyword query templates rendered around each category's search phrase.
///
/// Ordered from broad to application-intent; keyword engines ignore the
/// grammar, they match terms.
const QUERY_TEMPLATES: &[&str] = &[
    "{phrase}",
    "{phrase} apply online",
    "{phrase} eligibility requirements",
];

/// Fixed-template query generation, the production default behind
/// `BaseQuerySource`. An LLM-backed source can replace it without touching
/// the workflow.
pub struct TemplateQuerySource;

impl TemplateQuerySource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TemplateQuerySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseQuerySource for TemplateQuerySource {
    async fn generate(&self, category: FundingCategory) -> Result<Vec<String>> {
        let phrase = category.search_phrase();
        Ok(QUERY_TEMPLATES
            .iter()
            .map(|template| template.replace("{phrase}", phrase))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_category_renders_distinct_queries() {
        let source = TemplateQuerySource::new();
        for category in FundingCategory::all() {
            let queries = source.generate(category).await.unwrap();
            assert_eq!(queries.len(), QUERY_TEMPLATES.len());

            let phrase = category.search_phrase();
            for query in &queries {
                assert!(query.contains(phrase), "query '{}' lost its phrase", query);
            }

            let distinct: std::collections::HashSet<&String> = queries.iter().collect();
            assert_eq!(distinct.len(), queries.len());
        }
    }

    #[tokio::test]
    async fn the_first_query_is_the_bare_phrase() {
        let source = TemplateQuerySource::new();
        let queries = source
            .generate(FundingCategory::StemEducation)
            .await
            .unwrap();
        assert_eq!(queries[0], FundingCategory::StemEducation.search_phrase());
    }
}
