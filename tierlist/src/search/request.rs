//! Search filters and their canonical request form.
//!
//! [`SearchFilters`] is what the user edits. [`SearchRequest`] is the
//! canonical, order-independent descriptor derived from it: trimmed query,
//! sorted and deduplicated facet values, empty values dropped, facets the
//! media type does not support removed. Logically identical searches always
//! produce the same [`SearchRequest::key`].

use crate::types::MediaType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// How the query text is matched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Fuzzy,
    Exact,
}

/// How multiple values of one facet combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetMatch {
    #[default]
    Any,
    All,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fuzzy => "fuzzy",
            Self::Exact => "exact",
        }
    }
}

impl FacetMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::All => "all",
        }
    }
}

/// Editable filter state for one media type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub query: String,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub facets: BTreeMap<String, BTreeSet<String>>,
    pub match_mode: MatchMode,
    pub facet_match: FacetMatch,
}

impl SearchFilters {
    /// Flip one facet value on or off
    pub fn toggle_facet(&mut self, facet: &str, value: &str) {
        let values = self.facets.entry(facet.to_string()).or_default();
        if !values.remove(value) {
            values.insert(value.to_string());
        }
        if values.is_empty() {
            self.facets.remove(facet);
        }
    }

    /// Replace all values of a facet
    pub fn set_facet<I, S>(&mut self, facet: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.facets.remove(facet);
        } else {
            self.facets.insert(facet.to_string(), values);
        }
    }
}

/// Canonical search descriptor sent to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_from: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_to: Option<i32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: BTreeMap<String, BTreeSet<String>>,
    #[serde(rename = "match")]
    pub match_mode: MatchMode,
    pub facet_match: FacetMatch,
}

impl SearchRequest {
    /// Canonicalize `filters` into a page-1 request
    pub fn new(media_type: MediaType, filters: &SearchFilters) -> Self {
        let query = Some(filters.query.trim().to_string()).filter(|q| !q.is_empty());

        let (year_from, year_to) = match (filters.year_from, filters.year_to) {
            (Some(from), Some(to)) if from > to => (Some(to), Some(from)),
            range => range,
        };

        let facets = filters
            .facets
            .iter()
            .map(|(facet, values)| (facet.trim().to_string(), values))
            .filter(|(facet, _)| media_type.supports_facet(facet))
            .map(|(facet, values)| {
                let values: BTreeSet<String> = values
                    .iter()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect();
                (facet, values)
            })
            .filter(|(_, values)| !values.is_empty())
            .collect();

        Self {
            media_type,
            page: 1,
            query,
            year_from,
            year_to,
            facets,
            match_mode: filters.match_mode,
            facet_match: filters.facet_match,
        }
    }

    /// Same request for another page (pages are 1-indexed)
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// True when there is nothing to search for
    pub fn is_empty(&self) -> bool {
        self.query.is_none()
            && self.year_from.is_none()
            && self.year_to.is_none()
            && self.facets.is_empty()
    }

    /// Filter parameters in canonical order, page excluded
    pub fn filter_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("type".to_string(), self.media_type.as_str().to_string())];
        if let Some(query) = &self.query {
            pairs.push(("query".into(), query.clone()));
        }
        if let Some(from) = self.year_from {
            pairs.push(("yearFrom".into(), from.to_string()));
        }
        if let Some(to) = self.year_to {
            pairs.push(("yearTo".into(), to.to_string()));
        }
        for (facet, values) in &self.facets {
            for value in values {
                pairs.push((facet.clone(), value.clone()));
            }
        }
        pairs.push(("match".into(), self.match_mode.as_str().into()));
        pairs.push(("facetMatch".into(), self.facet_match.as_str().into()));
        pairs
    }

    /// Canonical key shared by every page of this search
    pub fn key(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.filter_pairs())
            .finish()
    }
}

impl fmt::Display for SearchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (page {})", self.key(), self.page)
    }
}
