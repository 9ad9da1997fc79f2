use std::collections::HashMap;

use crate::models::{Candidate, JobDescription, MergedCandidate, RankedCandidate};

pub fn is_ranked(job: &JobDescription) -> bool {
    !job.ranked_candidates.is_empty()
}

pub fn candidates_heading(ranked: bool, count: usize) -> String {
    if ranked {
        format!("Ranked Candidates ({})", count)
    } else if count > 0 {
        format!("Fetched Candidates ({})", count)
    } else {
        "Candidates".to_string()
    }
}

/// Combine fetched profiles with ranking results into one display list.
///
/// With no ranking the candidates come back in backend order and unranked.
/// Otherwise the output follows the ranked list, each entry overlaid on its
/// profile (ranked fields win) and numbered from 1. A ranked username with
/// no profile still shows up with only its ranked fields.
pub fn merge_candidates(job: &JobDescription) -> Vec<MergedCandidate> {
    merge(&job.candidates, &job.ranked_candidates)
}

pub fn merge(candidates: &[Candidate], ranked: &[RankedCandidate]) -> Vec<MergedCandidate> {
    if ranked.is_empty() {
        return candidates.iter().cloned().map(MergedCandidate::from).collect();
    }

    let mut by_username: HashMap<&str, &Candidate> = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        // Last profile wins when the backend repeats a username
        by_username.insert(candidate.username.as_str(), candidate);
    }

    ranked
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let base = by_username
                .get(entry.username.as_str())
                .map(|c| MergedCandidate::from((*c).clone()))
                .unwrap_or_default();
            overlay(base, entry, i + 1)
        })
        .collect()
}

/// Any field the ranked entry carries replaces the profile's, even an
/// explicit null. Absent fields keep the profile value.
fn overlay(base: MergedCandidate, entry: &RankedCandidate, rank: usize) -> MergedCandidate {
    MergedCandidate {
        username: entry.username.clone(),
        name: entry.name.clone().unwrap_or(base.name),
        avatar_url: entry.avatar_url.clone().unwrap_or(base.avatar_url),
        bio: entry.bio.clone().unwrap_or(base.bio),
        email: entry.email.clone().unwrap_or(base.email),
        github_url: entry.github_url.clone().unwrap_or(base.github_url),
        skills: entry
            .skills
            .clone()
            .map(Option::unwrap_or_default)
            .unwrap_or(base.skills),
        top_repos: entry
            .top_repos
            .clone()
            .map(Option::unwrap_or_default)
            .unwrap_or(base.top_repos),
        followers: entry.followers.unwrap_or(base.followers),
        public_repos: entry.public_repos.unwrap_or(base.public_repos),
        score: entry.score,
        reasoning: entry.reasoning.clone(),
        summary: entry.summary.clone(),
        rank: Some(rank),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(username: &str, bio: &str) -> Candidate {
        Candidate {
            username: username.to_string(),
            bio: Some(bio.to_string()),
            ..Default::default()
        }
    }

    fn ranked(username: &str, score: f64) -> RankedCandidate {
        RankedCandidate {
            username: username.to_string(),
            score: Some(score),
            ..Default::default()
        }
    }

    #[test]
    fn test_unranked_returns_candidates_unchanged() {
        let candidates = vec![candidate("a", "x")];
        let merged = merge(&candidates, &[]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].username, "a");
        assert_eq!(merged[0].bio.as_deref(), Some("x"));
        assert_eq!(merged[0].rank, None);
        assert_eq!(merged[0].score, None);
    }

    #[test]
    fn test_unranked_keeps_backend_order() {
        let candidates = vec![candidate("c", "1"), candidate("a", "2"), candidate("b", "3")];
        let names: Vec<String> = merge(&candidates, &[])
            .into_iter()
            .map(|m| m.username)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_ranked_follows_rank_order() {
        let candidates = vec![candidate("a", "x"), candidate("b", "y")];
        let ranking = vec![ranked("b", 9.0), ranked("a", 5.0)];
        let merged = merge(&candidates, &ranking);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].username, "b");
        assert_eq!(merged[0].bio.as_deref(), Some("y"));
        assert_eq!(merged[0].score, Some(9.0));
        assert_eq!(merged[0].rank, Some(1));
        assert_eq!(merged[1].username, "a");
        assert_eq!(merged[1].bio.as_deref(), Some("x"));
        assert_eq!(merged[1].score, Some(5.0));
        assert_eq!(merged[1].rank, Some(2));
    }

    #[test]
    fn test_missing_profile_uses_ranked_fields_only() {
        let merged = merge(&[], &[ranked("z", 1.0)]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].username, "z");
        assert_eq!(merged[0].score, Some(1.0));
        assert_eq!(merged[0].rank, Some(1));
        assert_eq!(merged[0].bio, None);
        assert!(merged[0].skills.is_empty());
    }

    #[test]
    fn test_length_matches_ranked_list() {
        // Profiles without a ranking entry drop out once ranked
        let candidates = vec![candidate("a", "x"), candidate("b", "y"), candidate("c", "z")];
        let merged = merge(&candidates, &[ranked("c", 3.0)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].bio.as_deref(), Some("z"));
    }

    #[test]
    fn test_ranked_fields_take_precedence() {
        let mut profile = candidate("a", "old bio");
        profile.name = Some("Ada".to_string());
        profile.skills = vec!["c".to_string()];
        let entry = RankedCandidate {
            username: "a".to_string(),
            score: Some(8.0),
            bio: Some(Some("new bio".to_string())),
            skills: Some(Some(vec!["rust".to_string()])),
            summary: Some("strong".to_string()),
            ..Default::default()
        };

        let merged = merge(&[profile], &[entry]);
        assert_eq!(merged[0].bio.as_deref(), Some("new bio"));
        assert_eq!(merged[0].skills, vec!["rust".to_string()]);
        assert_eq!(merged[0].name.as_deref(), Some("Ada"));
        assert_eq!(merged[0].summary.as_deref(), Some("strong"));
    }

    #[test]
    fn test_duplicate_username_last_profile_wins() {
        let candidates = vec![candidate("a", "first"), candidate("a", "second")];
        let merged = merge(&candidates, &[ranked("a", 1.0)]);
        assert_eq!(merged[0].bio.as_deref(), Some("second"));
    }

    #[test]
    fn test_ranked_null_clears_profile_field() {
        let mut profile = candidate("a", "x");
        profile.followers = Some(10);
        profile.email = Some("a@example.com".to_string());
        let job: JobDescription = serde_json::from_str(
            r#"{"ranked_candidates":[{"username":"a","score":2,"bio":null,"followers":42}]}"#,
        )
        .unwrap();

        let merged = merge(&[profile], &job.ranked_candidates);
        assert_eq!(merged[0].bio, None);
        assert_eq!(merged[0].followers, Some(42));
        assert_eq!(merged[0].email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_merge_candidates_from_job() {
        let job = JobDescription {
            candidates: vec![candidate("a", "x")],
            ranked_candidates: vec![ranked("a", 2.5)],
            ..Default::default()
        };
        assert!(is_ranked(&job));
        let merged = merge_candidates(&job);
        assert_eq!(merged[0].rank, Some(1));

        let unranked = JobDescription {
            candidates: vec![candidate("a", "x")],
            ..Default::default()
        };
        assert!(!is_ranked(&unranked));
    }
}
