use serde::{Deserialize, Serialize};

/// One row of `GET /list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSummary {
    pub job_id: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub candidate_count: Option<u32>,
    #[serde(default)]
    pub candidates_fetched: bool,
    #[serde(default)]
    pub candidates_ranked: bool,
}

impl JobSummary {
    pub fn title(&self) -> &str {
        self.job_title.as_deref().unwrap_or("Unknown")
    }

    pub fn candidate_count(&self) -> u32 {
        self.candidate_count.unwrap_or(0)
    }

    pub fn badges(&self) -> [Badge; 2] {
        status_badges(self.candidates_fetched, self.candidates_ranked)
    }
}

/// A yes/no status marker shown next to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub on: bool,
}

impl Badge {
    pub fn text(&self) -> &'static str {
        if self.on { "Yes" } else { "No" }
    }
}

pub fn status_badges(fetched: bool, ranked: bool) -> [Badge; 2] {
    [
        Badge { label: "Fetched", on: fetched },
        Badge { label: "Ranked", on: ranked },
    ]
}

/// Full job record as returned by `get-job`, `search-candidates` and
/// `rank-candidates`. The backend answers the two POSTs with partial
/// documents, so every field falls back to its default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobDescription {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub candidates_fetched: bool,
    #[serde(default)]
    pub candidates_ranked: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub candidates: Vec<Candidate>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ranked_candidates: Vec<RankedCandidate>,
    /// Overall ranking summary.
    #[serde(default)]
    pub summary: Option<String>,
}

impl JobDescription {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled job")
    }

    pub fn company(&self) -> &str {
        self.company.as_deref().unwrap_or("Unknown Company")
    }

    pub fn badges(&self) -> [Badge; 2] {
        status_badges(self.candidates_fetched, self.candidates_ranked)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub top_repos: Vec<Repository>,
    #[serde(default)]
    pub followers: Option<u64>,
    #[serde(default)]
    pub public_repos: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub topics: Vec<String>,
}

/// Ranking output for one candidate. Profile fields are optional; when the
/// ranker echoes one it overrides the fetched profile. The outer `Option`
/// tells an absent field (`None`) from an explicit null (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RankedCandidate {
    pub username: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub github_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub skills: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub top_repos: Option<Option<Vec<Repository>>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub followers: Option<Option<u64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub public_repos: Option<Option<u64>>,
}

/// Display-ready candidate: profile plus ranking, with a 1-based rank when
/// the job has been ranked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MergedCandidate {
    pub username: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub github_url: Option<String>,
    pub skills: Vec<String>,
    pub top_repos: Vec<Repository>,
    pub followers: Option<u64>,
    pub public_repos: Option<u64>,
    pub score: Option<f64>,
    pub reasoning: Option<String>,
    pub summary: Option<String>,
    pub rank: Option<usize>,
}

impl MergedCandidate {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }

    pub fn bio_or_placeholder(&self) -> &str {
        self.bio
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or("No bio available")
    }
}

impl From<Candidate> for MergedCandidate {
    fn from(c: Candidate) -> Self {
        Self {
            username: c.username,
            name: c.name,
            avatar_url: c.avatar_url,
            bio: c.bio,
            email: c.email,
            github_url: c.github_url,
            skills: c.skills,
            top_repos: c.top_repos,
            followers: c.followers,
            public_repos: c.public_repos,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJobDescription {
    pub job_title: String,
    pub job_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRef {
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseResponse {
    pub message: String,
    #[serde(default)]
    pub job_id: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// Only runs for keys that are present, so a null becomes `Some(None)`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
