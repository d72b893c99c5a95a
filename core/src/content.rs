use std::fmt;

/// A locale-tagged blob of problem text: a title, or a statement in some format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub locale: String,
    pub contents: Vec<u8>,
    /// e.g. `text`, `text/html`, `application/pdf`
    pub content_type: String,
}

impl Content {
    pub const TEXT: &str = "text";
    pub const HTML: &str = "text/html";
    pub const PDF: &str = "application/pdf";

    pub fn new(
        locale: impl Into<String>,
        contents: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            locale: locale.into(),
            contents: contents.into(),
            content_type: content_type.into(),
        }
    }

    pub fn text(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(locale, text.into().into_bytes(), Self::TEXT)
    }

    pub fn is_text(&self) -> bool {
        self.content_type == Self::TEXT
    }

    pub fn is_html(&self) -> bool {
        self.content_type == Self::HTML
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type == Self::PDF
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.contents))
    }
}

/// A downloadable file that comes with a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub contents: Vec<u8>,
}
