#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClassification {
    Public,
    Protected,
    Unclassified,
}

/// The two ordered route lists an application declares.
/// Public entries take precedence over protected ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    public: Vec<String>,
    protected: Vec<String>,
}

impl RouteTable {
    /// Builds a table, discarding empty entries (an empty entry would match every path).
    pub fn new<P, Q>(public: P, protected: Q) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        Q: IntoIterator,
        Q::Item: Into<String>,
    {
        Self {
            public: keep_non_empty(public),
            protected: keep_non_empty(protected),
        }
    }

    pub fn public(&self) -> &[String] {
        &self.public
    }

    pub fn protected(&self) -> &[String] {
        &self.protected
    }
}

fn keep_non_empty<I>(entries: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    entries
        .into_iter()
        .map(|entry| {
            let entry: String = entry.into();
            entry.trim().to_string()
        })
        .filter(|e| !e.is_empty())
        .collect()
}

/// Classifies a request path against an application's route table.
pub fn classify(path: &str, routes: &RouteTable) -> RouteClassification {
    if routes.public.iter().any(|entry| matches_entry(path, entry)) {
        return RouteClassification::Public;
    }

    if routes.protected.iter().any(|entry| matches_entry(path, entry)) {
        return RouteClassification::Protected;
    }

    RouteClassification::Unclassified
}

/// Exact match, or `entry` followed by a `/` separator.
/// `/ats-checker` matches `/ats-checker/x` but never `/ats-checker-extra`.
fn matches_entry(path: &str, entry: &str) -> bool {
    match path.strip_prefix(entry) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}
