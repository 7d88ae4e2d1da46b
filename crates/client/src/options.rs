//! Owned read options for file-backed table registration.
//!
//! The engine's own option structs borrow their schema and file extension;
//! these owned versions can be kept in handles across the C boundary and are
//! converted right before a registration call.

use arrow_schema::{DataType, SchemaRef};
use datafusion::prelude::{CsvReadOptions, ParquetReadOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    pub has_header: bool,
    pub delimiter: u8,
    /// Explicit schema; inferred from the first records when `None`.
    pub schema: Option<SchemaRef>,
    pub schema_infer_max_records: usize,
    pub file_extension: String,
    pub table_partition_cols: Vec<(String, DataType)>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            schema: None,
            schema_infer_max_records: 1000,
            file_extension: ".csv".to_string(),
            table_partition_cols: vec![],
        }
    }
}

impl CsvOptions {
    pub(crate) fn to_read_options(&self) -> CsvReadOptions<'_> {
        let mut out = CsvReadOptions::new()
            .has_header(self.has_header)
            .delimiter(self.delimiter)
            .schema_infer_max_records(self.schema_infer_max_records)
            .file_extension(&self.file_extension)
            .table_partition_cols(self.table_partition_cols.clone());
        if let Some(schema) = &self.schema {
            out = out.schema(schema.as_ref());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParquetOptions {
    pub file_extension: String,
    pub table_partition_cols: Vec<(String, DataType)>,
    /// Row-group pruning from parquet statistics; engine default when `None`.
    pub pruning: Option<bool>,
    pub skip_metadata: Option<bool>,
}

impl Default for ParquetOptions {
    fn default() -> Self {
        Self {
            file_extension: ".parquet".to_string(),
            table_partition_cols: vec![],
            pruning: None,
            skip_metadata: None,
        }
    }
}

impl ParquetOptions {
    pub(crate) fn to_read_options(&self) -> ParquetReadOptions<'_> {
        let mut out = ParquetReadOptions {
            file_extension: &self.file_extension,
            ..Default::default()
        }
        .table_partition_cols(self.table_partition_cols.clone());
        if let Some(pruning) = self.pruning {
            out = out.parquet_pruning(pruning);
        }
        if let Some(skip) = self.skip_metadata {
            out = out.skip_metadata(skip);
        }
        out
    }
}
