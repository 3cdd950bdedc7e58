//! The Document Source: the HTML text currently loaded for preview and
//! conversion, plus the name of the file it last came from.

/// Mutable HTML buffer with a loaded-file indicator.
///
/// Edits replace the text; file loads replace the text *and* set the
/// indicator. Clearing the indicator keeps the text. There is no history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSource {
    text: String,
    loaded_file: Option<String>,
}

impl DocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            loaded_file: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text with surrounding whitespace removed, as sent for conversion.
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    /// Whether there is nothing but whitespace to convert.
    pub fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }

    /// Replace the text from a direct edit. The loaded-file indicator is kept.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Replace the text with a file's full contents and record its name.
    pub fn replace_with_file(&mut self, name: impl Into<String>, contents: impl Into<String>) {
        self.text = contents.into();
        self.loaded_file = Some(name.into());
    }

    /// Name of the file the text was last loaded from, if any.
    pub fn loaded_file(&self) -> Option<&str> {
        self.loaded_file.as_deref()
    }

    /// Forget the loaded-file indicator, returning it. The text stays.
    pub fn clear_loaded_file(&mut self) -> Option<String> {
        self.loaded_file.take()
    }
}

/// Built-in sample document.
pub const EXAMPLE_CV_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Curriculum Vitae</title>
    <style>
        @page { size: A4; margin: 15mm; }
        body { font-family: Helvetica, Arial, sans-serif; font-size: 11pt; line-height: 1.4; color: #222; }
        header { text-align: center; border-bottom: 2px solid #222; padding-bottom: 8px; margin-bottom: 18px; }
        header h1 { font-size: 22pt; margin: 0 0 4px 0; }
        header p { margin: 2px 0; color: #555; }
        h2 { font-size: 13pt; border-bottom: 1px solid #222; padding-bottom: 2px; }
        .role { font-weight: bold; }
        .when { font-style: italic; color: #555; }
        ul { margin: 4px 0; padding-left: 18px; }
    </style>
</head>
<body>
    <header>
        <h1>Alex Morgan</h1>
        <p>alex.morgan@example.com | +44 20 7946 0000</p>
        <p>Manchester, United Kingdom</p>
    </header>

    <section>
        <h2>Experience</h2>
        <div class="role">Backend Engineer, Example Logistics</div>
        <div class="when">March 2021 to present</div>
        <ul>
            <li>Built the shipment tracking API handling 40k requests per minute</li>
            <li>Cut batch invoice generation time from hours to minutes</li>
        </ul>
    </section>

    <section>
        <h2>Education</h2>
        <div class="role">MEng Software Engineering</div>
        <div class="when">University of Leeds, 2016 to 2020</div>
    </section>

    <section>
        <h2>Skills</h2>
        <ul>
            <li><strong>Languages:</strong> Rust, Go, SQL</li>
            <li><strong>Infrastructure:</strong> PostgreSQL, Kafka, Kubernetes</li>
        </ul>
    </section>
</body>
</html>"#;
