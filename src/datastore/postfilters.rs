//! Ways to filter posts based on their fields. Filter semantics work just like SQL:
//! If a field is unset, its filter won't be applied.
//! If set, filter out posts that don't match the filter.
//! Every set filter must match, i.e. filters are combined with AND.
use serde::Deserialize;
use uuid::Uuid;

/// Filters that can be applied to queries on the datastore.
#[derive(Default, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct PostFilters {
    pub id: Option<Uuid>,
    /// Only posts owned by exactly this user.
    pub user_id: Option<Uuid>,
    /// Only posts owned by any of these users. An empty list matches nothing.
    #[serde(skip)]
    pub owned_by: Option<Vec<Uuid>>,
    /// Only posts whose body contains this literal substring (case-sensitive).
    pub body_contains: Option<String>,
    /// Only posts with these ids.
    #[serde(skip)]
    pub ids: Option<Vec<Uuid>>,
    /// Maximum number of posts to let match the filter. Unset means no limit.
    pub limit: Option<u32>,
}

/// Escape `LIKE` wildcards so `needle` matches literally inside a `%...%` pattern.
/// Postgres uses backslash as the default LIKE escape character.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
