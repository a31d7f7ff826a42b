use scraper::Html;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{info, warn};

use crate::error::{FetchError, StateError};
use crate::extract::fields::{self, ProfileFields};
use crate::extract::repos::{self, RepoMap};
use crate::fetch::{FetchOutcome, PageSource};
use crate::search::{self, Lookup};
use crate::settings::Settings;

/// Stages of one profile construction, in order. RateLimited is terminal
/// for the attempt; retry policy belongs to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Unstarted,
    FetchingProfile,
    RateLimited,
    ProfileFetched,
    FetchingRepos,
    Aggregated,
    Serialized,
}

/// Outcome of fetching the profile page. Transient failures come back as
/// Err; throttling is a branch of its own.
#[derive(Debug)]
pub enum ProfilePage {
    Fetched(ProfileFields),
    RateLimited { retry_after: Option<u64> },
}

/// Language → repository-count mapping, ordered by first occurrence in the
/// repository mapping. That ordering doubles as the tie-break for equal
/// counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageDistribution {
    counts: Vec<(String, u32)>,
}

impl LanguageDistribution {
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(l, n)| (l.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl Serialize for LanguageDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (language, count) in &self.counts {
            map.serialize_entry(language, count)?;
        }
        map.end()
    }
}

/// Count how many repositories use each language. Repositories without a
/// language are not counted; an empty mapping gives an empty distribution.
pub fn build_language_distribution(repos: &RepoMap) -> LanguageDistribution {
    let mut counts: Vec<(String, u32)> = Vec::new();
    for (_, language) in repos.iter() {
        let Some(language) = language else { continue };
        match counts.iter_mut().find(|(l, _)| l == language) {
            Some((_, n)) => *n += 1,
            None => counts.push((language.to_string(), 1)),
        }
    }
    LanguageDistribution { counts }
}

/// Flat record exposed to consumers; field order is the output contract.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProfileRecord {
    pub handle: Option<String>,
    pub canonical_url: Option<String>,
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub link: Option<String>,
    pub followers: Option<i64>,
    pub following: Option<i64>,
    pub star_count: i64,
    pub linkedin_url: Option<String>,
    pub repos: RepoMap,
    pub language_distribution: LanguageDistribution,
}

/// One account's scraped summary. Built by a single fetch-and-parse pass
/// and immutable once aggregated.
#[derive(Debug)]
pub struct Profile {
    handle: Option<String>,
    canonical_url: Option<String>,
    fields: ProfileFields,
    linkedin_url: Option<String>,
    repos: RepoMap,
    languages: LanguageDistribution,
    retry_after: Option<u64>,
    stage: Stage,
}

impl Profile {
    fn unstarted() -> Self {
        Profile {
            handle: None,
            canonical_url: None,
            fields: ProfileFields::default(),
            linkedin_url: None,
            repos: RepoMap::default(),
            languages: LanguageDistribution::default(),
            retry_after: None,
            stage: Stage::Unstarted,
        }
    }

    /// Run the whole pipeline for one handle: profile page, optional
    /// best-effort LinkedIn lookup, repository listing, language
    /// distribution. An empty handle is the explicit no-op mode:
    /// identifier fields stay unset and nothing is fetched.
    pub fn construct(
        source: &dyn PageSource,
        settings: &Settings,
        handle: &str,
        linkedin_lookup: bool,
    ) -> Result<Profile, FetchError> {
        let mut profile = Profile::unstarted();
        if handle.is_empty() {
            profile.stage = Stage::Aggregated;
            return Ok(profile);
        }

        let url = format!("https://{}/{}", settings.host, handle);
        profile.handle = Some(handle.to_string());
        profile.canonical_url = Some(url.clone());

        profile.stage = Stage::FetchingProfile;
        match Self::fetch_profile_page(source, &url)? {
            ProfilePage::Fetched(fields) => {
                profile.fields = fields;
                profile.stage = Stage::ProfileFetched;
            }
            ProfilePage::RateLimited { retry_after } => {
                warn!(handle, ?retry_after, "rate limited by upstream");
                profile.retry_after = retry_after;
                profile.stage = Stage::RateLimited;
                return Ok(profile);
            }
        }

        if linkedin_lookup {
            match search::linkedin_url(
                source,
                profile.fields.full_name.as_deref(),
                profile.fields.location.as_deref(),
            ) {
                Lookup::Found(url) => profile.linkedin_url = Some(url),
                Lookup::Unavailable => info!(handle, "no linkedin profile found"),
            }
        }

        profile.stage = Stage::FetchingRepos;
        let listing_url = format!("{url}?tab=repositories");
        profile.repos = match Self::fetch_repositories(source, &listing_url) {
            Ok(repos) => repos,
            Err(e) => {
                // Absorbed as "no repositories"; callers that need to tell
                // the two apart can call fetch_repositories directly.
                warn!(handle, error = %e, "repository listing unreachable, treating as empty");
                RepoMap::default()
            }
        };
        profile.languages = build_language_distribution(&profile.repos);
        profile.stage = Stage::Aggregated;
        info!(
            handle,
            repos = profile.repos.len(),
            languages = profile.languages.len(),
            "profile aggregated"
        );
        Ok(profile)
    }

    /// Fetch and extract the profile page. Per-field misses are already
    /// absorbed inside the extractor.
    pub fn fetch_profile_page(
        source: &dyn PageSource,
        url: &str,
    ) -> Result<ProfilePage, FetchError> {
        match source.fetch(url)? {
            FetchOutcome::Page(body) => {
                let doc = Html::parse_document(&body);
                Ok(ProfilePage::Fetched(fields::extract(&doc)))
            }
            FetchOutcome::RateLimited { retry_after } => {
                Ok(ProfilePage::RateLimited { retry_after })
            }
        }
    }

    /// Fetch the repository listing. A throttled listing counts as
    /// unreachable here.
    pub fn fetch_repositories(source: &dyn PageSource, url: &str) -> Result<RepoMap, FetchError> {
        match source.fetch(url)? {
            FetchOutcome::Page(body) => Ok(repos::extract(&Html::parse_document(&body))),
            FetchOutcome::RateLimited { .. } => Err(FetchError::Status {
                status: 429,
                url: url.to_string(),
            }),
        }
    }

    /// Produce the flat output record. Only valid once aggregation is done.
    pub fn serialize(&mut self) -> Result<ProfileRecord, StateError> {
        if self.stage < Stage::Aggregated {
            return Err(StateError {
                required: Stage::Aggregated,
                actual: self.stage,
            });
        }
        self.stage = Stage::Serialized;
        Ok(ProfileRecord {
            handle: self.handle.clone(),
            canonical_url: self.canonical_url.clone(),
            full_name: self.fields.full_name.clone(),
            company: self.fields.company.clone(),
            location: self.fields.location.clone(),
            email: self.fields.email.clone(),
            link: self.fields.link.clone(),
            followers: self.fields.followers,
            following: self.fields.following,
            star_count: self.fields.star_count,
            linkedin_url: self.linkedin_url.clone(),
            repos: self.repos.clone(),
            language_distribution: self.languages.clone(),
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn retry_after(&self) -> Option<u64> {
        self.retry_after
    }

    pub fn languages(&self) -> &LanguageDistribution {
        &self.languages
    }
}
