pub mod candidate;
pub mod job;
pub mod match_record;
pub mod outreach;

/// Decodes a JSON-encoded TEXT column into its typed value.
pub(crate) fn decode_json_column<T: serde::de::DeserializeOwned>(
    column: &str,
    raw: &str,
) -> std::result::Result<T, sqlx::Error> {
    serde_json::from_str(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
