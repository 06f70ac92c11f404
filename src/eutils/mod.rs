pub mod pubmed;

/// A literature database that can be searched and fetched from one record at a time.
pub trait Literature {
    /// Identifiers of up to `retmax` records matching `term`, in the database's order.
    fn search(&self, term: &str, retmax: u32) -> anyhow::Result<Vec<String>>;
    /// Raw XML for a single record.
    fn fetch(&self, id: &str) -> anyhow::Result<String>;
}
