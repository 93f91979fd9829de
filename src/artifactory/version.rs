/// Splits a version string into its dot-separated numeric components,
/// ignoring a trailing `*` and any non-numeric suffix on the final
/// component (e.g. `"2.1.0-rc1"` → `[2, 1, 0]`).
fn numeric_prefix(version: &str) -> Vec<u64> {
    version
        .trim_end_matches('*')
        .trim_end_matches('.')
        .split('.')
        .map_while(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                None
            } else {
                digits.parse::<u64>().ok()
            }
        })
        .collect()
}

/// `true` if `candidate`'s numeric components extend `requested`'s: every
/// component of `requested` matches the corresponding component of
/// `candidate`. An empty `requested` extends everything (matches latest).
fn extends(requested: &[u64], candidate: &[u64]) -> bool {
    if requested.len() > candidate.len() {
        return false;
    }
    requested.iter().zip(candidate.iter()).all(|(r, c)| r == c)
}

/// Returns the greatest of `available` whose numeric prefix extends
/// `requested_version`, per the resolver's version grammar (dot-separated
/// numeric prefix, optional trailing `*`, empty matches latest).
pub fn greatest_matching<'a>(requested_version: &str, available: &'a [String]) -> Option<&'a str> {
    let requested = numeric_prefix(requested_version);

    available
        .iter()
        .filter(|candidate| extends(&requested, &numeric_prefix(candidate)))
        .max_by(|a, b| numeric_prefix(a).cmp(&numeric_prefix(b)))
        .map(|s| s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::empty_request_matches_latest("", &["1.0.0", "2.1.0", "2.0.5"], Some("2.1.0"))]
    #[case::partial_prefix_narrows_to_matching_branch("2.1", &["2.0.9", "2.1.0", "2.1.5"], Some("2.1.5"))]
    #[case::single_numeric_component_matches_major_only("2", &["1.9.9", "2.0.0", "3.0.0"], Some("2.0.0"))]
    #[case::no_candidate_extends_request("4", &["1.0.0", "1.1.0"], None)]
    #[case::trailing_wildcard_is_stripped("2.1.*", &["2.1.0", "2.2.0"], Some("2.1.0"))]
    fn version_grammar_cases(#[case] requested: &str, #[case] available: &[&str], #[case] expected: Option<&str>) {
        let versions: Vec<String> = available.iter().map(|s| s.to_string()).collect();
        assert_eq!(greatest_matching(requested, &versions), expected);
    }
}
