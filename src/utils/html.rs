use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive, while
/// dangerous tags (<script>, <iframe>) and attributes (onclick) are
/// stripped. Project summaries and resume descriptions are entered through
/// the admin forms but rendered to anonymous visitors, so everything
/// free-text passes through here before it is persisted.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitizes a list of free-text paragraphs, dropping entries that are
/// empty after trimming and cleaning.
pub fn clean_paragraphs(paragraphs: Vec<String>) -> Vec<String> {
    paragraphs
        .into_iter()
        .map(|p| clean_html(p.trim()))
        .filter(|p| !p.is_empty())
        .collect()
}
