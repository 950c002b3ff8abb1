//! PDF rendering.
//!
//! A finished report is markdown; it becomes a self-contained printable HTML
//! page (pulldown-cmark plus inline print CSS), which a headless Chromium
//! child process prints to PDF. The whole render runs under a hard timeout;
//! exceeding it fails the request.

use pulldown_cmark::{html, Options, Parser};
use std::time::Duration;
use tokio::process::Command;

use crate::error::RelayError;
use crate::research::TaskSource;

const PAGE_CSS: &str = r#"
  @page { size: A4; margin: 22mm 18mm; }
  body { font-family: Georgia, 'Times New Roman', serif; color: #1a1a1a;
         font-size: 11pt; line-height: 1.55; }
  h1 { font-size: 20pt; border-bottom: 2px solid #1a1a1a; padding-bottom: 6pt; }
  h2 { font-size: 15pt; margin-top: 18pt; }
  h3 { font-size: 12pt; }
  a { color: #1a56db; text-decoration: none; }
  code { font-family: 'Courier New', monospace; font-size: 9.5pt;
         background: #f3f3f3; padding: 1pt 3pt; }
  pre { background: #f3f3f3; padding: 8pt; overflow-x: hidden;
        white-space: pre-wrap; }
  blockquote { border-left: 3px solid #ccc; margin-left: 0;
               padding-left: 12pt; color: #444; }
  table { border-collapse: collapse; width: 100%; }
  th, td { border: 1px solid #ccc; padding: 4pt 6pt; font-size: 10pt; }
  .sources { margin-top: 24pt; border-top: 1px solid #ccc; padding-top: 8pt; }
  .sources li { font-size: 9.5pt; margin-bottom: 4pt; }
"#;

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Convert a markdown report plus its sources into a printable HTML page.
pub fn report_html(title: &str, markdown: &str, sources: &[TaskSource]) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut body = String::new();
    html::push_html(&mut body, parser);

    let mut sources_html = String::new();
    if !sources.is_empty() {
        sources_html.push_str("<div class=\"sources\"><h2>Sources</h2><ol>");
        for source in sources {
            sources_html.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>",
                escape_html(&source.url),
                escape_html(&source.title),
            ));
        }
        sources_html.push_str("</ol></div>");
    }

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{PAGE_CSS}</style></head><body>{body}{sources_html}</body></html>",
        escape_html(title),
    )
}

/// Prints HTML to PDF through a headless Chromium child process.
pub struct PdfRenderer {
    chromium_bin: String,
    timeout: Duration,
}

impl PdfRenderer {
    pub fn new(chromium_bin: String, timeout: Duration) -> Self {
        Self {
            chromium_bin,
            timeout,
        }
    }

    /// Render `html` to PDF bytes. Fails with `Render` on a non-zero exit,
    /// a missing binary, or when the time budget runs out.
    pub async fn render(&self, html: &str) -> Result<Vec<u8>, RelayError> {
        let scratch = tempfile::tempdir()
            .map_err(|e| RelayError::Render(format!("scratch dir: {e}")))?;
        let page_path = scratch.path().join("report.html");
        let pdf_path = scratch.path().join("report.pdf");

        tokio::fs::write(&page_path, html)
            .await
            .map_err(|e| RelayError::Render(format!("write page: {e}")))?;

        let mut cmd = Command::new(&self.chromium_bin);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", pdf_path.display()))
            .arg(format!("file://{}", page_path.display()))
            .kill_on_drop(true);

        let started = std::time::Instant::now();
        let output = tokio::time::timeout(self.timeout, async {
            cmd.output()
                .await
                .map_err(|e| RelayError::Render(format!("spawn {}: {e}", self.chromium_bin)))
        })
        .await
        .map_err(|_| {
            RelayError::Render(format!(
                "render exceeded {}s budget",
                self.timeout.as_secs()
            ))
        })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RelayError::Render(format!(
                "chromium exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(&pdf_path)
            .await
            .map_err(|e| RelayError::Render(format!("read pdf: {e}")))?;

        tracing::info!(
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pdf rendered"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_html_renders_markdown_and_sources() {
        let sources = vec![TaskSource {
            title: "Acme <Corp>".to_string(),
            url: "https://acme.com".to_string(),
        }];
        let html = report_html("Competitor Analysis", "# Acme\n\nB2B **SaaS**.", &sources);

        assert!(html.contains("<h1>Acme</h1>"));
        assert!(html.contains("<strong>SaaS</strong>"));
        assert!(html.contains("Acme &lt;Corp&gt;"));
        assert!(html.contains("https://acme.com"));
        assert!(html.contains("<title>Competitor Analysis</title>"));
    }

    #[test]
    fn report_html_without_sources_has_no_sources_section() {
        let html = report_html("Report", "plain text", &[]);
        assert!(!html.contains("class=\"sources\""));
    }

    #[tokio::test]
    async fn missing_binary_is_a_render_error() {
        let renderer = PdfRenderer::new(
            "/nonexistent/chromium".to_string(),
            Duration::from_secs(5),
        );
        let err = renderer.render("<html></html>").await.unwrap_err();
        assert!(matches!(err, RelayError::Render(_)));
    }
}
