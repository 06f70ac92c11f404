use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    markup::{Document, Node},
    record::Record,
};

/// Email addresses as they show up inside free-text affiliations.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

/// Turn one efetch XML document into a [`Record`].
///
/// Unparseable markup is logged and yields a record holding only `pubmed_id`; dropping it is
/// left to the caller.
pub fn extract(markup: &str, pubmed_id: &str) -> Record {
    let mut record = Record::bare(pubmed_id);
    let doc = match Document::parse(markup) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(pubmed_id, "Error parsing XML for PubMed ID {pubmed_id}: {e}");
            return record;
        }
    };
    let root = doc.root();

    record.title = root
        .find("ArticleTitle")
        .and_then(|n| n.text())
        .map(str::to_string);
    record.publication_date = publication_date(root);
    record.corresponding_author_email = affiliation_email(root);

    tracing::debug!(
        pubmed_id,
        has_title = record.title.is_some(),
        has_date = record.publication_date.is_some(),
        has_email = record.corresponding_author_email.is_some(),
        "extracted record"
    );
    record
}

fn publication_date(root: Node<'_>) -> Option<String> {
    let pub_date = root.find("PubDate")?;
    let year = pub_date.child("Year")?;
    let text_of = |n: Node<'_>| n.text().unwrap_or_default().to_string();
    Some(compose_date(
        &text_of(year),
        pub_date.child("Month").map(text_of).as_deref(),
        pub_date.child("Day").map(text_of).as_deref(),
    ))
}

/// `YEAR-MONTH-DAY` from the raw parts; a missing month or day becomes `01`.
fn compose_date(year: &str, month: Option<&str>, day: Option<&str>) -> String {
    format!(
        "{}-{}-{}",
        year,
        month.unwrap_or("01"),
        day.unwrap_or("01")
    )
}

/// First email found in the first affiliation that contains one.
fn affiliation_email(root: Node<'_>) -> Option<String> {
    root.descendants("Affiliation")
        .filter_map(|n| n.text())
        .find_map(|text| EMAIL_RE.find(text).map(|m| m.as_str().to_string()))
}
