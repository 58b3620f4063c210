use serde::{Deserialize, Serialize};

/// One numbered subject area and the catalog pages it spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Human-readable title, empty when no catalog page was found.
    pub course: String,
    pub number: u32,
    pub course_url: String,
    pub catalog_urls: Vec<String>,
}

impl Course {
    pub fn has_title(&self) -> bool {
        !self.course.is_empty()
    }
}

/// A validated course subpage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub content: String,
}

/// A subpage candidate taken from a catalog heading, not yet checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linklet {
    pub href: String,
    pub content: String,
}

impl Linklet {
    pub fn resolved(self, href: String) -> Link {
        Link {
            href,
            content: self.content,
        }
    }
}
