/// Path prefixes the interceptor never looks at: API calls and framework assets.
const BYPASS_PREFIXES: &[&str] = &["/api", "/_next/static", "/_next/image", "/favicon.ico"];

/// Static image extensions served without a credential check.
const BYPASS_EXTENSIONS: &[&str] = &[".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Returns false for asset and API paths that skip the edge interceptor entirely.
pub fn is_intercepted(path: &str) -> bool {
    let bypassed_prefix = BYPASS_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    });
    if bypassed_prefix {
        return false;
    }

    !BYPASS_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
