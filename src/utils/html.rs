// src/utils/html.rs

/// Clean backend-provided text before it reaches a view model.
///
/// Question and option text is authored through admin forms, so it is treated
/// as untrusted markup: safe formatting tags (<b>, <p>, <code>) survive,
/// scripts, iframes and event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Reduce markup to plain text for terminal output.
pub fn strip_tags(input: &str) -> String {
    let cleaned = ammonia::Builder::empty().clean(input).to_string();
    cleaned
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
