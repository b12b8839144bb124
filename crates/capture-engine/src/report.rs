//! HTML embed snippets for test-report evidence.
//!
//! The host test facade owns paths and logging; these helpers only render
//! the snippet it embeds into an HTML report.

use std::path::Path;

/// Autoplaying inline video linking to the recording file.
pub fn video_embed_html(path: &Path, width: &str) -> String {
    let link = path.to_string_lossy();
    format!(
        "<a href=\"{link}\"><video width=\"{width}\" autoplay>\
         <source src=\"{link}\" type=\"video/webm\"></video></a>"
    )
}

/// Inline image linking to the screenshot file.
pub fn image_embed_html(path: &Path, width: &str) -> String {
    let link = path.to_string_lossy();
    format!("<a href=\"{link}\"><img src=\"{link}\" width=\"{width}\"></a>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_snippet_references_path_and_width() {
        let html = video_embed_html(Path::new("run/evidence.webm"), "800px");
        assert!(html.contains("src=\"run/evidence.webm\""));
        assert!(html.contains("width=\"800px\""));
        assert!(html.contains("type=\"video/webm\""));
    }

    #[test]
    fn image_snippet_links_the_file() {
        let html = image_embed_html(Path::new("run/shot.png"), "50%");
        assert!(html.starts_with("<a href=\"run/shot.png\">"));
        assert!(html.contains("width=\"50%\""));
    }
}
