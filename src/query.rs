//! The mailbox search sent to the remote store.
//!
//! The shape is fixed: a date lower bound, a folder scope and a set of
//! excluded categories, rendered in Gmail search syntax.

use std::fmt;

use chrono::NaiveDate;

/// A fixed-shape mailbox search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Only messages received after this date.
    pub after: NaiveDate,
    /// Folder scope, e.g. `inbox`. Empty searches every folder.
    pub folder: String,
    /// Categories to leave out, e.g. `social`.
    pub exclude_categories: Vec<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            after: NaiveDate::from_ymd_opt(2019, 3, 12).unwrap_or_default(),
            folder: "inbox".to_string(),
            exclude_categories: vec![
                "social".to_string(),
                "promotions".to_string(),
                "forums".to_string(),
            ],
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "after:{}", self.after.format("%Y/%m/%d"))?;
        if !self.folder.is_empty() {
            write!(f, " in:{}", self.folder)?;
        }
        match self.exclude_categories.as_slice() {
            [] => {}
            [single] => write!(f, " -category:{single}")?,
            many => write!(f, " -category:{{{}}}", many.join(" "))?,
        }
        Ok(())
    }
}

/// Parse a `YYYY-MM-DD` (or `YYYY/MM/DD`) date given on the command line.
pub fn parse_after(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y/%m/%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query() {
        assert_eq!(
            SearchQuery::default().to_string(),
            "after:2019/03/12 in:inbox -category:{social promotions forums}"
        );
    }

    #[test]
    fn test_no_folder_no_exclusions() {
        let q = SearchQuery {
            after: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            folder: String::new(),
            exclude_categories: Vec::new(),
        };
        assert_eq!(q.to_string(), "after:2024/01/05");
    }

    #[test]
    fn test_single_exclusion_has_no_braces() {
        let q = SearchQuery {
            exclude_categories: vec!["updates".into()],
            ..SearchQuery::default()
        };
        assert_eq!(q.to_string(), "after:2019/03/12 in:inbox -category:updates");
    }

    #[test]
    fn test_parse_after() {
        let expected = NaiveDate::from_ymd_opt(2020, 2, 29);
        assert_eq!(parse_after("2020-02-29"), expected);
        assert_eq!(parse_after("2020/02/29"), expected);
        assert_eq!(parse_after("2021-02-29"), None);
        assert_eq!(parse_after("yesterday"), None);
    }
}
