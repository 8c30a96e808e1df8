use crate::error::PagecropError;

/// Closed set of detection labels the engine dispatches on.
///
/// The external detector emits a richer vocabulary; everything that is not
/// extractable content or boilerplate collapses into `Other` so filtering
/// stays a closed match instead of a string lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum LabelKind {
    Figure,
    Table,
    PageHeader,
    PageFooter,
    Footnote,
    Other,
}

impl LabelKind {
    pub const fn name(&self) -> &str {
        match self {
            LabelKind::Figure => "Figure",
            LabelKind::Table => "Table",
            LabelKind::PageHeader => "Page-Header",
            LabelKind::PageFooter => "Page-Footer",
            LabelKind::Footnote => "Footnote",
            LabelKind::Other => "Other",
        }
    }

    pub const fn color(&self) -> [u8; 3] {
        match self {
            LabelKind::Figure => [128, 0, 128],     // Purple
            LabelKind::Table => [128, 128, 128],    // Gray
            LabelKind::PageHeader => [0, 255, 255], // Cyan
            LabelKind::PageFooter => [255, 0, 255], // Magenta
            LabelKind::Footnote => [0, 255, 0],     // Green
            LabelKind::Other => [0, 128, 0],        // Dark Green
        }
    }

    /// Resolves a detector label name into its `LabelKind`.
    ///
    /// The full vocabulary of the layout model is accepted; names outside it
    /// fail with [`PagecropError::Label`] at decode time rather than falling
    /// through filtering silently.
    pub fn from_name(name: &str) -> Result<Self, PagecropError> {
        match name {
            "Figure" | "Picture" => Ok(LabelKind::Figure),
            "Table" => Ok(LabelKind::Table),
            "Page-Header" | "Page-header" => Ok(LabelKind::PageHeader),
            "Page-Footer" | "Page-footer" => Ok(LabelKind::PageFooter),
            "Footnote" => Ok(LabelKind::Footnote),
            "Caption" | "Formula" | "List-Item" | "List-item" | "Section-Header"
            | "Section-header" | "Text" | "Title" => Ok(LabelKind::Other),
            _ => Err(PagecropError::Label {
                name: name.to_string(),
            }),
        }
    }
}
