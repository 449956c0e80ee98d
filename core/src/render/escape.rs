use serde::Serialize;
use std::fmt;

/// 转义 HTML 文本和属性，`&` 最先替换
pub fn escape_html(value: impl AsRef<str>) -> String {
    value
        .as_ref()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// 缺失值映射为空串
pub fn escape_opt(value: Option<&str>) -> String {
    value.map(escape_html).unwrap_or_default()
}

/// 已转义的 HTML 片段，只能由转义文本或本 crate 的字面量标记构造
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Html(String);

impl Html {
    pub fn new() -> Self {
        Self(String::new())
    }

    pub fn text(value: impl AsRef<str>) -> Self {
        Self(escape_html(value))
    }

    pub(crate) fn trusted(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn push(&mut self, other: &Html) {
        self.0.push_str(&other.0);
    }

    pub(crate) fn push_trusted(&mut self, markup: &str) {
        self.0.push_str(markup);
    }

    pub fn push_text(&mut self, value: impl AsRef<str>) {
        self.0.push_str(&escape_html(value));
    }

    pub fn join(parts: impl IntoIterator<Item = Html>, sep: &str) -> Html {
        let parts: Vec<String> = parts.into_iter().map(|h| h.0).collect();
        Html(parts.join(sep))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Html {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_characters_once() {
        assert_eq!(
            escape_html(r#"<script>&"'</script>"#),
            "&lt;script&gt;&amp;&quot;&#039;&lt;/script&gt;"
        );
    }

    #[test]
    fn existing_entities_are_escaped_literally() {
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }

    #[test]
    fn absent_value_is_empty() {
        assert_eq!(escape_opt(None), "");
        assert_eq!(escape_opt(Some("a<b")), "a&lt;b");
    }

    #[test]
    fn html_text_is_escaped_and_trusted_is_not() {
        let mut out = Html::trusted("<b>");
        out.push_text("<i>");
        out.push_trusted("</b>");
        assert_eq!(out.as_str(), "<b>&lt;i&gt;</b>");
    }
}
