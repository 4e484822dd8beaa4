//! `rewrite` and `reverse_rewrite`.

use crate::capability::UrlRewriter;
use crate::error::FilterError;

/// Forward rewrite; without a rewriter the URL is returned unchanged.
pub fn rewrite(rewriter: Option<&dyn UrlRewriter>, url: &str) -> String {
    match rewriter {
        Some(rewriter) => rewriter.rewrite(url),
        None => url.to_string(),
    }
}

/// Inverse rewrite.
///
/// # Errors
///
/// Returns [`FilterError::FeatureUnavailable`] when no rewriter was supplied.
pub fn reverse_rewrite(
    rewriter: Option<&dyn UrlRewriter>,
    url: &str,
) -> Result<String, FilterError> {
    rewriter
        .map(|rewriter| rewriter.reverse_rewrite(url))
        .ok_or(FilterError::FeatureUnavailable("url rewriting"))
}
