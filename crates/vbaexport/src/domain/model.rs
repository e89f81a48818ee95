//! Domain models for candidate workbooks, selections, and extracted modules.

use std::fmt;
use std::path::PathBuf;

use time::OffsetDateTime;

/// A macro-enabled workbook discovered in the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub full_path: PathBuf,
    pub size: Option<u64>,
    pub modified: Option<OffsetDateTime>,
}

/// Outcome of the interactive file picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Chosen(usize),
    Cancelled,
}

/// Kind of a component in a workbook's VBA project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Standard,
    Class,
    Form,
    Other,
}

impl ComponentKind {
    /// Decode the host's `vbext_ComponentType` value.
    ///
    /// Document modules (`ThisWorkbook`, sheets) and anything unrecognised
    /// collapse into [`ComponentKind::Other`].
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ComponentKind::Standard,
            2 => ComponentKind::Class,
            3 => ComponentKind::Form,
            _ => ComponentKind::Other,
        }
    }

    /// Output file suffix for modules of this kind.
    pub fn extension(self) -> &'static str {
        match self {
            ComponentKind::Standard => ".bas.vbs",
            ComponentKind::Class => ".cls.vbs",
            ComponentKind::Form => ".frm.vbs",
            ComponentKind::Other => ".vbs",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Standard => "standard",
            ComponentKind::Class => "class",
            ComponentKind::Form => "form",
            ComponentKind::Other => "other",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source text read out of a component, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedModule {
    pub name: String,
    pub kind: ComponentKind,
    pub source_text: String,
    pub output_path: PathBuf,
}

impl ExtractedModule {
    /// File name used for a component: `<name><extension>`.
    pub fn file_name(name: &str, kind: ComponentKind) -> String {
        format!("{name}{}", kind.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_map_to_extensions() {
        let cases = [
            (1, ".bas.vbs"),
            (2, ".cls.vbs"),
            (3, ".frm.vbs"),
            (100, ".vbs"),
            (0, ".vbs"),
            (-1, ".vbs"),
        ];
        for (code, expected) in cases {
            assert_eq!(ComponentKind::from_code(code).extension(), expected, "code {code}");
        }
    }

    #[test]
    fn kinds_display_as_lowercase_words() {
        assert_eq!(ComponentKind::from_code(2).to_string(), "class");
        assert_eq!(ComponentKind::from_code(100).to_string(), "other");
    }

    #[test]
    fn file_name_appends_kind_extension() {
        assert_eq!(
            ExtractedModule::file_name("Module2", ComponentKind::Standard),
            "Module2.bas.vbs"
        );
        assert_eq!(
            ExtractedModule::file_name("ThisWorkbook", ComponentKind::Other),
            "ThisWorkbook.vbs"
        );
    }
}
