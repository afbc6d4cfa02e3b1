//! Media types of the resources this step consumes and produces.
//!
//! Copyright (c) 2025 Posit, PBC

use std::fmt;

/// A resource media type (`main/sub`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaType {
    pub main_type: &'static str,
    pub sub_type: &'static str,
}

impl MediaType {
    /// SCSS syntax (`text/x-scss`).
    pub const SCSS: MediaType = MediaType {
        main_type: "text",
        sub_type: "x-scss",
    };

    /// Indented SASS syntax (`text/x-sass`).
    pub const SASS: MediaType = MediaType {
        main_type: "text",
        sub_type: "x-sass",
    };

    /// Stylesheet output (`text/css`).
    pub const CSS: MediaType = MediaType {
        main_type: "text",
        sub_type: "css",
    };

    /// Whether this is the indented SASS syntax.
    pub fn is_indented_syntax(&self) -> bool {
        self.sub_type == Self::SASS.sub_type
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indented_syntax() {
        assert!(MediaType::SASS.is_indented_syntax());
        assert!(!MediaType::SCSS.is_indented_syntax());
        assert!(!MediaType::CSS.is_indented_syntax());
    }

    #[test]
    fn test_display() {
        assert_eq!(MediaType::SCSS.to_string(), "text/x-scss");
        assert_eq!(MediaType::CSS.to_string(), "text/css");
    }
}
