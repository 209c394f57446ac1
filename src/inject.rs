//! Runtime tooling injected into HTML templates.
//!
//! Each page template receives a script block right after its `<title>` (or
//! at the top of `<head>` when there is no title), and a build stamp comment
//! after the closing `</html>`:
//!
//! - development builds set the debug flags read by the guard script,
//! - production builds expose the version tag as `window._publicTime_`.

use crate::config::BuildMode;
use maud::{Markup, PreEscaped, html};

/// Guard script loaded after the injected flags, relative to the page.
pub const DEFAULT_GUARD_SRC: &str = "./static/js/common/qwGuard.js";

const DEV_FLAGS_JS: &str = r"window._isDevEnv_ = true;
window.__debugMode__ = true;
window._debugToolsConfig_ = { eruda: false, vconsole: false, cdn: {} };
if (!/win32/i.test(window.navigator.platform)) { window._debugToolsConfig_.eruda = true; }";

/// Appends a `t=<millis>` cache buster to `src`.
#[must_use]
pub fn with_cache_buster(src: &str, millis: i64) -> String {
    let sep = if src.contains('?') { '&' } else { '?' };
    format!("{src}{sep}t={millis}")
}

/// Renders the script block for `mode`.
#[must_use]
pub fn render_inject_block(mode: BuildMode, version_tag: &str, guard_src: Option<&str>) -> Markup {
    let flags = match mode {
        BuildMode::Prod => {
            let quoted = serde_json::to_string(version_tag).unwrap_or_else(|_| "\"\"".to_string());
            format!("window._publicTime_ = {quoted};")
        }
        BuildMode::Dev | BuildMode::Test => DEV_FLAGS_JS.to_string(),
    };
    html! {
        script { (PreEscaped(flags)) }
        @if let Some(src) = guard_src {
            script src=(src) {}
        }
    }
}

/// Injects the script block and the build stamp into `template`.
#[must_use]
pub fn inject_debug_tooling(template: &str, mode: BuildMode, version_tag: &str, guard_src: Option<&str>) -> String {
    let block = render_inject_block(mode, version_tag, guard_src).into_string();
    let lower = template.to_ascii_lowercase();

    let at = lower
        .find("</title>")
        .map(|i| i + "</title>".len())
        .or_else(|| head_open_end(&lower))
        .unwrap_or(0);

    let mut out = String::with_capacity(template.len() + block.len() + 64);
    out.push_str(&template[..at]);
    out.push_str(&block);
    out.push_str(&template[at..]);

    let stamp = format!("\n<!-- build at : {version_tag} -->");
    match out.to_ascii_lowercase().rfind("</html>") {
        Some(i) => out.insert_str(i + "</html>".len(), &stamp),
        None => out.push_str(&stamp),
    }
    out
}

/// Byte offset just past the opening `<head>` tag.
fn head_open_end(lower: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = lower[from..].find("<head") {
        let start = from + rel;
        let rest = &lower[start + "<head".len()..];
        // Skip `<header>` and friends.
        if rest.starts_with('>') || rest.starts_with(char::is_whitespace) {
            return rest.find('>').map(|gt| start + "<head".len() + gt + 1);
        }
        from = start + "<head".len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<html><head><title>App</title></head><body></body></html>";

    #[test]
    fn test_prod_injection_after_title() {
        let out = inject_debug_tooling(PAGE, BuildMode::Prod, "2024-03-01 08:00:00", Some("./g.js"));
        insta::assert_snapshot!(out, @r#"
        <html><head><title>App</title><script>window._publicTime_ = "2024-03-01 08:00:00";</script><script src="./g.js"></script></head><body></body></html>
        <!-- build at : 2024-03-01 08:00:00 -->
        "#);
    }

    #[test]
    fn test_dev_injection_without_title_goes_after_head() {
        let page = "<HTML><Head lang=\"en\"><meta charset=\"utf-8\"></Head><body><header></header></body></HTML>";
        let out = inject_debug_tooling(page, BuildMode::Dev, "v1", None);

        let head_end = out.find("<Head lang=\"en\">").unwrap() + "<Head lang=\"en\">".len();
        assert!(out[head_end..].starts_with("<script>window._isDevEnv_ = true;"));
        assert!(out.contains("window._debugToolsConfig_"));
        assert!(!out.contains("src="));
        assert!(out.ends_with("</HTML>\n<!-- build at : v1 -->"));
    }

    #[test]
    fn test_header_tag_is_not_mistaken_for_head() {
        assert_eq!(head_open_end("<body><header></header>"), None);
        assert_eq!(head_open_end("<header></header><head>"), Some(23));
    }

    #[test]
    fn test_fragment_without_document_tags() {
        let out = inject_debug_tooling("<div></div>", BuildMode::Prod, "v2", None);
        assert_eq!(
            out,
            "<script>window._publicTime_ = \"v2\";</script><div></div>\n<!-- build at : v2 -->"
        );
    }

    #[test]
    fn test_with_cache_buster() {
        assert_eq!(with_cache_buster("./g.js", 42), "./g.js?t=42");
        assert_eq!(with_cache_buster("./g.js?v=1", 42), "./g.js?v=1&t=42");
    }
}
