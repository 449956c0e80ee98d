use pipeaudit_core::render::escape_html;
use pipeaudit_core::{Level, ResultsView, Settings, Status};

/// 渲染空状态的页面
pub fn index(settings: &Settings) -> String {
    const TEMPLATE: &str = include_str!("templates/index.html");

    let results = ResultsView::new(settings.snippet_radius);

    TEMPLATE
        .replace("{{LEVEL_OPTIONS}}", &level_options(settings.default_level))
        .replace("{{STATUS_OPTIONS}}", &status_options())
        .replace("{{MAX_UPLOAD}}", &settings.max_upload_bytes.to_string())
        .replace("{{RESULTS}}", results.results_html().as_str())
}

fn level_options(selected: Level) -> String {
    Level::ALL
        .iter()
        .map(|level| option(level.as_str(), level.as_str(), *level == selected))
        .collect()
}

fn status_options() -> String {
    let mut options = option("", "All", true);
    for status in Status::ALL {
        options.push_str(&option(status.as_str(), status.as_str(), false));
    }
    options
}

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        r#"<option value="{}"{}>{}</option>"#,
        escape_html(value),
        if selected { " selected" } else { "" },
        escape_html(label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_selects_configured_level() {
        let settings = Settings {
            default_level: Level::L2,
            ..Settings::default()
        };
        let html = index(&settings);
        assert!(html.contains(r#"<option value="L2" selected>L2</option>"#));
        assert!(html.contains(r#"<option value="L1">L1</option>"#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn index_starts_with_empty_placeholder() {
        let html = index(&Settings::default());
        assert!(html.contains("No scan results yet."));
        assert!(html.contains(r#"<option value="" selected>All</option>"#));
        assert!(html.contains(r#"<option value="FAIL">FAIL</option>"#));
    }
}
