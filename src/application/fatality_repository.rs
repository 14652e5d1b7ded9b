// Repository trait for fatality data access
use crate::domain::record::RawFatalityRow;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait FatalityRepository: Send + Sync {
    /// Where the data lives, used as part of the cache key.
    fn source_location(&self) -> String;

    /// Name of the table the rows come from.
    fn table_name(&self) -> String;

    /// Read every row of the fatality table, unsanitised.
    async fn fetch_all(&self) -> Result<Vec<RawFatalityRow>>;
}
