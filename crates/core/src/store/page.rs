use serde::Deserialize;

/// Sort direction for a listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Pagination and ordering of a listing query.
///
/// `sort_by` must be validated against the entity schema before it reaches
/// the store; the store interpolates it into the ORDER BY clause.
#[derive(Debug, Clone)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
    pub sort_by: Option<String>,
    pub sort_dir: SortDir,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
            sort_by: None,
            sort_dir: SortDir::Asc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page_matches_gateway_defaults() {
        let page = Page::default();
        assert_eq!(page.offset, 0);
        assert_eq!(page.limit, 20);
        assert!(page.sort_by.is_none());
        assert_eq!(page.sort_dir, SortDir::Asc);
    }

    #[test]
    fn sort_dir_deserializes_lowercase() {
        assert_eq!(
            serde_json::from_str::<SortDir>("\"desc\"").unwrap(),
            SortDir::Desc
        );
        assert_eq!(
            serde_json::from_str::<SortDir>("\"asc\"").unwrap(),
            SortDir::Asc
        );
    }
}
