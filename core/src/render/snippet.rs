use super::escape::Html;

/// 默认上下文行数（上下各 4 行）
pub const DEFAULT_RADIUS: usize = 4;

const NUMBER_WIDTH: usize = 4;
const SEPARATOR: &str = " | ";

/// 片段中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetLine<'a> {
    /// 1-based
    pub number: usize,
    pub text: &'a str,
    pub highlighted: bool,
}

/// 目标行上下 `radius` 行，目标行号夹到 [1, 行数]
pub fn snippet_lines(text: &str, target_line: u64, radius: usize) -> Vec<SnippetLine<'_>> {
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        lines.push("");
    }

    let last = lines.len() - 1;
    let target = usize::try_from(target_line)
        .unwrap_or(usize::MAX)
        .clamp(1, lines.len())
        - 1;
    let start = target.saturating_sub(radius);
    let end = target.saturating_add(radius).min(last);

    lines[start..=end]
        .iter()
        .enumerate()
        .map(|(offset, line)| {
            let idx = start + offset;
            SnippetLine {
                number: idx + 1,
                text: line,
                highlighted: idx == target,
            }
        })
        .collect()
}

/// 渲染带行号的片段，目标行包在 `<span class="hl">` 中
pub fn extract_snippet(text: &str, target_line: u64, radius: usize) -> Html {
    let rendered = snippet_lines(text, target_line, radius)
        .into_iter()
        .map(|line| {
            let mut out = Html::trusted(format!(
                "{:>width$}{}",
                line.number,
                SEPARATOR,
                width = NUMBER_WIDTH
            ));
            out.push_text(line.text);
            if line.highlighted {
                let mut marked = Html::trusted(r#"<span class="hl">"#);
                marked.push(&out);
                marked.push_trusted("</span>");
                marked
            } else {
                out
            }
        });

    Html::join(rendered, "\n")
}
