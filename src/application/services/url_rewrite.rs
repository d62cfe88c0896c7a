//! URL detection and rewriting inside post bodies.

use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());

/// Replaces every `http(s)://` span in `text` with the output of
/// `rewrite`; non-URL text passes through untouched.
///
/// The rewrite function runs once per match, in order of appearance.
pub async fn rewrite_links<F, Fut>(text: &str, rewrite: F) -> String
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = String>,
{
    if !text.contains("http") {
        return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        output.push_str(&text[last..m.start()]);
        output.push_str(&rewrite(m.as_str().to_string()).await);
        last = m.end();
    }
    output.push_str(&text[last..]);
    output
}

/// Returns every `http(s)://` span in `text`, in order, deduplicated.
#[must_use]
pub fn extract_links(text: &str) -> Vec<String> {
    if !text.contains("http") {
        return Vec::new();
    }

    let mut urls: Vec<String> = Vec::new();
    for m in URL_RE.find_iter(text) {
        let url = m.as_str().to_owned();
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}
