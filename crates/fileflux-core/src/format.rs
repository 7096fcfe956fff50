//! Input format identification.

use serde::{Deserialize, Serialize};

/// Input document format, dispatched on the lowercased file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputFormat {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Microsoft Excel workbook (.xlsx)
    Xlsx,
    /// Microsoft PowerPoint presentation (.pptx)
    Pptx,
    /// Hangul word processor document (.hwp, .hwpx)
    Hwp,
    /// HTML document (.html, .htm)
    Html,
    /// Markdown document (.md, .markdown)
    Md,
}

impl InputFormat {
    /// Detect the format from a lowercased extension without the dot.
    ///
    /// Returns `None` for extensions no reader handles.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "xlsx" => Some(Self::Xlsx),
            "pptx" => Some(Self::Pptx),
            "hwp" | "hwpx" => Some(Self::Hwp),
            "html" | "htm" => Some(Self::Html),
            "md" | "markdown" => Some(Self::Md),
            _ => None,
        }
    }

    /// Extensions this format is dispatched on.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Pdf => &["pdf"],
            Self::Docx => &["docx"],
            Self::Xlsx => &["xlsx"],
            Self::Pptx => &["pptx"],
            Self::Hwp => &["hwp", "hwpx"],
            Self::Html => &["html", "htm"],
            Self::Md => &["md", "markdown"],
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
            Self::Hwp => "hwp",
            Self::Html => "html",
            Self::Md => "md",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension_known() {
        assert_eq!(InputFormat::from_extension("pdf"), Some(InputFormat::Pdf));
        assert_eq!(InputFormat::from_extension("hwpx"), Some(InputFormat::Hwp));
        assert_eq!(InputFormat::from_extension("htm"), Some(InputFormat::Html));
        assert_eq!(InputFormat::from_extension("markdown"), Some(InputFormat::Md));
    }

    #[test]
    fn test_from_extension_unknown() {
        assert_eq!(InputFormat::from_extension("xyz"), None);
        // Dispatch is on lowercased extensions only.
        assert_eq!(InputFormat::from_extension("PDF"), None);
    }

    #[test]
    fn test_extensions_round_trip() {
        for fmt in [
            InputFormat::Pdf,
            InputFormat::Docx,
            InputFormat::Xlsx,
            InputFormat::Pptx,
            InputFormat::Hwp,
            InputFormat::Html,
            InputFormat::Md,
        ] {
            for ext in fmt.extensions() {
                assert_eq!(InputFormat::from_extension(ext), Some(fmt));
            }
        }
    }
}
