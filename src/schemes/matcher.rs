use crate::schemes::Scheme;
use crate::version::Version;

/// Returns the first scheme, in registration order, with a pattern found in
/// `content`.
pub fn find_matching_scheme<'a>(content: &str, schemes: &'a [Scheme]) -> Option<&'a Scheme> {
    schemes.iter().find(|scheme| scheme.matches(content))
}

/// Picks the primary scheme for a file: the first matching scheme whose micro
/// capability agrees with `version`, otherwise the first match.
pub fn select_scheme<'a>(content: &str, schemes: &'a [Scheme], version: &Version) -> Option<&'a Scheme> {
    let wants_micro = version.micro.is_some();
    schemes
        .iter()
        .find(|scheme| scheme.supports_micro() == wants_micro && scheme.matches(content))
        .or_else(|| find_matching_scheme(content, schemes))
}

/// The other schemes matching `content`, to try when `primary` produced no
/// change. Schemes whose micro capability agrees with `version` come first;
/// registration order is kept otherwise.
pub fn fallback_candidates<'a>(
    content: &str,
    schemes: &'a [Scheme],
    primary: &Scheme,
    version: &Version,
) -> Vec<&'a Scheme> {
    let wants_micro = version.micro.is_some();
    let mut candidates: Vec<&Scheme> = schemes
        .iter()
        .filter(|scheme| !std::ptr::eq(*scheme, primary) && scheme.matches(content))
        .collect();
    candidates.sort_by_key(|scheme| scheme.supports_micro() != wants_micro);
    candidates
}
