use serde::{Deserialize, Serialize};

/// One literature entry, flattened for tabular export.
///
/// Field order is the column order of the written table, and field names are its header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub pubmed_id: String,
    pub title: Option<String>,
    /// `YEAR-MONTH-DAY`, with month and day defaulting to `01`.
    pub publication_date: Option<String>,
    pub corresponding_author_email: Option<String>,
}

impl Record {
    /// A record that carries nothing but its identifier.
    pub fn bare(pubmed_id: &str) -> Self {
        Record {
            pubmed_id: pubmed_id.to_string(),
            title: None,
            publication_date: None,
            corresponding_author_email: None,
        }
    }

    /// Only records with a title make it into the output.
    pub fn is_exportable(&self) -> bool {
        self.title.is_some()
    }
}
