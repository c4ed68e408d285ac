//! Typed rows of the books dataset.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{Error, Result, list};

/// One row of the source dataset.
///
/// The `authors` and `categories` columns stay raw here; they are list
/// literals decoded on demand via [`BookRecord::author_names`] and
/// [`BookRecord::category_names`]. Empty CSV fields become `None`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub authors: String,
    pub language: Option<String>,
    pub categories: String,
    #[serde(rename = "maturityRating")]
    pub maturity_rating: Option<String>,
    pub publisher: Option<String>,
    #[serde(rename = "publishedDate")]
    pub published_date: Option<String>,
    #[serde(rename = "pageCount")]
    pub page_count: Option<i64>,
}

impl BookRecord {
    /// Decode the `authors` list literal.
    pub fn author_names(&self) -> Result<Vec<String>> {
        list::parse_list(&self.authors)
    }

    /// Decode the `categories` list literal.
    pub fn category_names(&self) -> Result<Vec<String>> {
        list::parse_list(&self.categories)
    }

    /// Validate and convert the `publishedDate` column.
    pub fn published_date(&self) -> Result<Option<NaiveDate>> {
        match self.published_date.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Some)
                .map_err(|err| {
                    Error::conversion("publishedDate", format!("'{raw}' is not a date: {err}"))
                }),
        }
    }
}
