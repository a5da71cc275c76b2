//! Notice ("edital") detection by keyword.

/// Flags records that announce a public notice.
#[derive(Debug, Clone)]
pub struct NoticeDetector {
    keywords: Vec<String>,
}

impl NoticeDetector {
    /// `keywords` must already be lowercase.
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    /// True iff any keyword occurs in the lowercased `title + " " + body`.
    pub fn is_notice(&self, title: &str, body: &str) -> bool {
        let text = format!("{title} {body}").to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}
