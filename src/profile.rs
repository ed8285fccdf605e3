//! Profile links for comment authors.

const PROFILE_BASE_URL: &str = "https://substack.com/profile/";

/// Build the profile path suffix for a user, e.g. `1234567-am-charlebois`.
///
/// Everything but ASCII letters, digits, spaces, `_` and `-` is dropped from
/// the name, and the remaining words are joined with single hyphens. A name
/// with nothing left still yields `"{id}-"`.
pub fn profile_slug(user_id: u64, name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let suffix = kept
        .split(' ')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .to_ascii_lowercase();
    format!("{user_id}-{suffix}")
}

pub fn profile_url(user_id: u64, name: &str) -> String {
    format!("{PROFILE_BASE_URL}{}", profile_slug(user_id, name))
}

/// Profile URL for a record, if it carries both an id and a name.
pub fn profile_link(user_id: Option<u64>, name: Option<&str>) -> Option<String> {
    Some(profile_url(user_id?, name?))
}
