//! Small shared helpers.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Best fuzzy match for `query` among `candidates`, for "did you mean" hints
/// on misspelled phase, role, and tool names.
///
/// Matches in both directions so that a query with either missing or extra
/// characters still finds its candidate.
pub fn closest_match<'a, I>(candidates: I, query: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let matcher = SkimMatcherV2::default();
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let forward = matcher.fuzzy_match(candidate, query);
            let reverse = matcher.fuzzy_match(query, candidate);
            forward.max(reverse).map(|score| (score, candidate))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, candidate)| candidate)
}
