#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, Schema};
use dfe_client::{DataFrame, Engine};
use dfe_common::EngineConfig;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

pub fn engine() -> Engine {
    Engine::new(EngineConfig::default()).expect("engine")
}

pub fn people_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
    ]))
}

pub fn people_batch() -> RecordBatch {
    RecordBatch::try_new(
        people_schema(),
        vec![
            Arc::new(Int64Array::from(vec![1_i64, 2, 3])),
            Arc::new(StringArray::from(vec!["ada", "grace", "barbara"])),
        ],
    )
    .expect("people batch")
}

pub fn write_csv(dir: &TempDir, file_name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(file_name);
    std::fs::write(&path, contents).expect("write csv");
    path
}

pub fn write_parquet(path: &Path, schema: Arc<Schema>, cols: Vec<ArrayRef>) {
    let batch = RecordBatch::try_new(schema.clone(), cols).expect("build batch");
    let file = File::create(path).expect("create parquet");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("writer");
    writer.write(&batch).expect("write");
    writer.close().expect("close");
}

/// All values of an Int64 column across batches, in result order.
pub fn int64_column(batches: &[RecordBatch], idx: usize) -> Vec<i64> {
    let mut out = Vec::new();
    for batch in batches {
        let col = batch
            .column(idx)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("int64 column");
        for row in 0..col.len() {
            out.push(col.value(row));
        }
    }
    out
}

pub fn single_i64(df: &DataFrame) -> i64 {
    let values = int64_column(&df.collect().expect("collect"), 0);
    assert_eq!(values.len(), 1, "expected a single row, got {values:?}");
    values[0]
}

/// Lines of a rendered table that carry cells (header and data rows).
pub fn table_rows(rendered: &str) -> Vec<&str> {
    rendered.lines().filter(|l| l.starts_with('|')).collect()
}
