//! Version-tag parsing and newest-stable selection

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use tracing::info;

/// Matches the first semver-looking run in a tag name, e.g. `v1.2.3-beta`
/// yields `1.2.3-beta`. The trailing run stops at the first space so decorated
/// tags like `release-1.2.3 final` still parse.
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+[^ ]*").expect("version pattern is valid"));

/// Extracts the version carried by a tag name, if any.
pub fn extract_version(tag_name: &str) -> Option<String> {
    VERSION_RE
        .find(tag_name)
        .map(|found| found.as_str().to_string())
}

/// Picks the newest stable version among the candidates.
///
/// Candidates that do not parse as strict semver are skipped, as are
/// pre-releases. Ordering is semver precedence, not lexicographic, so
/// `0.10.0` ranks above `0.9.0`.
pub fn newest_stable<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter_map(|candidate| match Version::parse(candidate) {
            Ok(parsed) => Some((candidate, parsed)),
            Err(e) => {
                info!("Ignoring unparsable version candidate {candidate:?}: {e}");
                None
            }
        })
        .filter(|(_, parsed)| parsed.pre.is_empty())
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(candidate, _)| candidate.to_string())
}
