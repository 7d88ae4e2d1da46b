//! Stable C ABI for embedding DFE from non-Rust runtimes.
//!
//! This module is enabled by the `ffi` feature and exports:
//! - session create/free, SQL submission
//! - data frame show/render/count, export through the Arrow C stream interface
//! - table registration from CSV, parquet or Arrow C data interface arrays
//! - error objects with code and message accessors
//!
//! Error handling contract:
//! - fallible functions take a trailing `DFError **error` (may be `NULL`)
//! - on failure a newly allocated `DFError` is stored into `*error` and the
//!   function returns `NULL`, `false` or `-1`; on success `*error` is untouched
//! - a non-null `*error` is never overwritten; the earlier error is kept
//! - every returned `DFError`, `DFSessionContext`, `DFDataFrame`, options
//!   object and string must be released exactly once with its `df_*_free`
//!   function; passing `NULL` to a free function is a no-op
//!
//! Double release and use after release are undefined behavior that this
//! layer does not detect.

use std::ffi::{CStr, CString, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use arrow::array::StructArray;
use arrow::ffi::{FFI_ArrowArray, FFI_ArrowSchema, from_ffi};
use arrow::ffi_stream::FFI_ArrowArrayStream;
use arrow::record_batch::{RecordBatch, RecordBatchIterator};
use arrow_schema::{DataType, Schema};
use dfe_common::{DfeError, EngineConfig, ErrorCode, Result};
use tracing::warn;

use crate::error_slot::{ErrorSlot, ReportedError};
use crate::options::{CsvOptions, ParquetOptions};
use crate::{DataFrame, Engine};

/// Opaque C handle for an error object.
#[repr(C)]
pub struct DFError {
    _private: [u8; 0],
}

/// Opaque C handle for a query session.
#[repr(C)]
pub struct DFSessionContext {
    _private: [u8; 0],
}

/// Opaque C handle for a planned query result.
#[repr(C)]
pub struct DFDataFrame {
    _private: [u8; 0],
}

/// Opaque C handle for CSV registration options.
#[repr(C)]
pub struct DFCsvReadOptions {
    _private: [u8; 0],
}

/// Opaque C handle for parquet registration options.
#[repr(C)]
pub struct DFParquetReadOptions {
    _private: [u8; 0],
}

fn into_handle<T, H>(value: T) -> *mut H {
    Box::into_raw(Box::new(value)).cast::<H>()
}

fn release_handle<T, H>(handle: *mut H) {
    if handle.is_null() {
        return;
    }
    // SAFETY: ownership is transferred back to Rust exactly once by caller.
    drop(unsafe { Box::from_raw(handle.cast::<T>()) });
}

fn handle_ref<'a, T, H>(handle: *const H, field: &str) -> Result<&'a T> {
    if handle.is_null() {
        return Err(DfeError::InvalidArgument(format!("{field} is null")));
    }
    // SAFETY: pointer checked for null; caller promises a live handle of this kind.
    Ok(unsafe { &*handle.cast::<T>() })
}

fn handle_mut<'a, T, H>(handle: *mut H, field: &str) -> Result<&'a mut T> {
    if handle.is_null() {
        return Err(DfeError::InvalidArgument(format!("{field} is null")));
    }
    // SAFETY: pointer checked for null; caller promises a live, unaliased handle.
    Ok(unsafe { &mut *handle.cast::<T>() })
}

fn parse_cstr_owned(ptr: *const c_char, field: &str) -> Result<String> {
    if ptr.is_null() {
        return Err(DfeError::InvalidArgument(format!("{field} is null")));
    }
    // SAFETY: ptr checked for null; caller promises NUL-terminated string.
    let raw = unsafe { CStr::from_ptr(ptr) };
    let val = raw
        .to_str()
        .map_err(|e| DfeError::InvalidArgument(format!("{field} is not valid UTF-8: {e}")))?;
    Ok(val.to_string())
}

fn parse_cstr_array(ptrs: *const *const c_char, n: usize, field: &str) -> Result<Vec<String>> {
    if n == 0 {
        return Ok(vec![]);
    }
    if ptrs.is_null() {
        return Err(DfeError::InvalidArgument(format!("{field} is null")));
    }
    // SAFETY: caller provides `n` readable pointers.
    let slice = unsafe { std::slice::from_raw_parts(ptrs, n) };
    slice
        .iter()
        .enumerate()
        .map(|(i, &ptr)| parse_cstr_owned(ptr, &format!("{field}[{i}]")))
        .collect()
}

fn into_c_string(value: &str) -> Result<*mut c_char> {
    let owned = CString::new(value)
        .map_err(|e| DfeError::Internal(format!("string contains NUL byte: {e}")))?;
    Ok(owned.into_raw())
}

/// Moves `values` into a C array of owned strings, released with
/// [`df_strings_free`]. An empty list is returned as `NULL`.
fn into_c_string_array(values: &[String], n_out: *mut usize) -> Result<*mut *mut c_char> {
    if n_out.is_null() {
        return Err(DfeError::InvalidArgument("n_columns is null".to_string()));
    }
    let mut raw = Vec::with_capacity(values.len());
    for value in values {
        match into_c_string(value) {
            Ok(ptr) => raw.push(ptr),
            Err(e) => {
                raw.into_iter().for_each(|ptr| df_string_free(ptr));
                return Err(e);
            }
        }
    }
    // SAFETY: n_out checked for null; caller provides a writable `size_t`.
    unsafe { *n_out = raw.len() };
    if raw.is_empty() {
        return Ok(std::ptr::null_mut());
    }
    Ok(Box::into_raw(raw.into_boxed_slice()).cast::<*mut c_char>())
}

fn partition_column_names(cols: &[(String, DataType)]) -> Vec<String> {
    cols.iter().map(|(name, _)| name.clone()).collect()
}

fn publish_error(out: *mut *mut DFError, error: ReportedError) {
    if out.is_null() {
        return;
    }
    // SAFETY: caller provides a writable `DFError *` location.
    unsafe {
        if !(*out).is_null() {
            warn!(dropped = %error, "error location already set; keeping first error");
            return;
        }
        *out = into_handle::<ReportedError, DFError>(error);
    }
}

/// Runs `f` with panics contained, routing any failure into `error`.
fn guarded<T, F>(error: *mut *mut DFError, fallback: T, f: F) -> T
where
    F: FnOnce() -> Result<T>,
{
    let mut slot = ErrorSlot::new();
    let outcome = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => slot.capture(result),
        Err(_) => {
            slot.set(ReportedError::new(
                ErrorCode::Internal,
                "panic crossed FFI boundary",
            ));
            None
        }
    };
    if let Some(reported) = slot.take() {
        publish_error(error, reported);
    }
    outcome.unwrap_or(fallback)
}

fn utf8_partition_cols(names: Vec<String>) -> Vec<(String, DataType)> {
    names.into_iter().map(|n| (n, DataType::Utf8)).collect()
}

// ---------------------------------------------------------------------------
// Errors

/// Frees an error returned through a `DFError **` out-parameter.
#[unsafe(no_mangle)]
pub extern "C" fn df_error_free(error: *mut DFError) {
    release_handle::<ReportedError, DFError>(error);
}

/// Returns the error message. Valid until `df_error_free`. `NULL` for a
/// `NULL` error.
#[unsafe(no_mangle)]
pub extern "C" fn df_error_get_message(error: *const DFError) -> *const c_char {
    match handle_ref::<ReportedError, DFError>(error, "error") {
        Ok(e) => e.message_cstr().as_ptr(),
        Err(_) => std::ptr::null(),
    }
}

/// Returns the error category. A `NULL` error reports `DF_ERROR_INTERNAL`.
#[unsafe(no_mangle)]
pub extern "C" fn df_error_get_code(error: *const DFError) -> ErrorCode {
    match handle_ref::<ReportedError, DFError>(error, "error") {
        Ok(e) => e.code(),
        Err(_) => ErrorCode::Internal,
    }
}

/// Returns the symbolic name of an error code. The string is static.
#[unsafe(no_mangle)]
pub extern "C" fn df_error_code_name(code: ErrorCode) -> *const c_char {
    code.c_name().as_ptr()
}

/// Frees a string returned by a `df_*` function.
#[unsafe(no_mangle)]
pub extern "C" fn df_string_free(value: *mut c_char) {
    if value.is_null() {
        return;
    }
    // SAFETY: string was produced by `CString::into_raw` and is freed once.
    drop(unsafe { CString::from_raw(value) });
}

/// Frees an array of `n` strings returned by a `df_*` function together with
/// its element count.
#[unsafe(no_mangle)]
pub extern "C" fn df_strings_free(values: *mut *mut c_char, n: usize) {
    if values.is_null() {
        return;
    }
    // SAFETY: array was produced by `into_c_string_array` with exactly `n`
    // elements and is freed once.
    let owned = unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(values, n)) };
    owned.iter().for_each(|&ptr| df_string_free(ptr));
}

// ---------------------------------------------------------------------------
// Session context

/// Creates a session with default config. Returns `NULL` if the session
/// could not be allocated.
#[unsafe(no_mangle)]
pub extern "C" fn df_session_context_new() -> *mut DFSessionContext {
    let created = catch_unwind(Engine::create).ok().flatten();
    match created {
        Some(engine) => into_handle::<Engine, DFSessionContext>(engine),
        None => std::ptr::null_mut(),
    }
}

/// Creates a session from key/value config pairs (`key=value,key=value`).
#[unsafe(no_mangle)]
pub extern "C" fn df_session_context_new_with_config_kv(
    config_kv: *const c_char,
    error: *mut *mut DFError,
) -> *mut DFSessionContext {
    guarded(error, std::ptr::null_mut(), || {
        let raw = parse_cstr_owned(config_kv, "config_kv")?;
        let engine = Engine::new(EngineConfig::from_kv(&raw)?)?;
        Ok(into_handle::<Engine, DFSessionContext>(engine))
    })
}

/// Creates a session from a JSON-encoded config.
#[unsafe(no_mangle)]
pub extern "C" fn df_session_context_new_with_config_json(
    config_json: *const c_char,
    error: *mut *mut DFError,
) -> *mut DFSessionContext {
    guarded(error, std::ptr::null_mut(), || {
        let raw = parse_cstr_owned(config_json, "config_json")?;
        let engine = Engine::new(EngineConfig::from_json(&raw)?)?;
        Ok(into_handle::<Engine, DFSessionContext>(engine))
    })
}

/// Frees a session. Data frames created from it stay valid and must still be
/// freed on their own.
#[unsafe(no_mangle)]
pub extern "C" fn df_session_context_free(context: *mut DFSessionContext) {
    release_handle::<Engine, DFSessionContext>(context);
}

/// Parses and plans `sql`. Returns `NULL` and sets `*error` on failure.
#[unsafe(no_mangle)]
pub extern "C" fn df_session_context_sql(
    context: *mut DFSessionContext,
    sql: *const c_char,
    error: *mut *mut DFError,
) -> *mut DFDataFrame {
    guarded(error, std::ptr::null_mut(), || {
        let engine = handle_ref::<Engine, DFSessionContext>(context, "context")?;
        let query = parse_cstr_owned(sql, "sql")?;
        let frame = engine.sql(&query)?;
        Ok(into_handle::<DataFrame, DFDataFrame>(frame))
    })
}

/// Registers a CSV file or directory as table `name`. `options` may be
/// `NULL` for defaults.
#[unsafe(no_mangle)]
pub extern "C" fn df_session_context_register_csv(
    context: *mut DFSessionContext,
    name: *const c_char,
    url: *const c_char,
    options: *const DFCsvReadOptions,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let engine = handle_ref::<Engine, DFSessionContext>(context, "context")?;
        let name = parse_cstr_owned(name, "name")?;
        let url = parse_cstr_owned(url, "url")?;
        let defaults = CsvOptions::default();
        let options = if options.is_null() {
            &defaults
        } else {
            handle_ref::<CsvOptions, DFCsvReadOptions>(options, "options")?
        };
        engine.register_csv(&name, &url, options)?;
        Ok(true)
    })
}

/// Registers a parquet file or directory as table `name`. `options` may be
/// `NULL` for defaults.
#[unsafe(no_mangle)]
pub extern "C" fn df_session_context_register_parquet(
    context: *mut DFSessionContext,
    name: *const c_char,
    url: *const c_char,
    options: *const DFParquetReadOptions,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let engine = handle_ref::<Engine, DFSessionContext>(context, "context")?;
        let name = parse_cstr_owned(name, "name")?;
        let url = parse_cstr_owned(url, "url")?;
        let defaults = ParquetOptions::default();
        let options = if options.is_null() {
            &defaults
        } else {
            handle_ref::<ParquetOptions, DFParquetReadOptions>(options, "options")?
        };
        engine.register_parquet(&name, &url, options)?;
        Ok(true)
    })
}

/// Registers record batches exported through the Arrow C data interface as an
/// in-memory table. Each array is a struct array whose fields are the
/// columns of `schema`.
///
/// `schema` stays owned by the caller. The arrays are moved: on return each
/// `batches[i]` that was imported has been marked released and must not be
/// released again by the caller.
#[unsafe(no_mangle)]
pub extern "C" fn df_session_context_register_record_batches(
    context: *mut DFSessionContext,
    name: *const c_char,
    schema: *const FFI_ArrowSchema,
    batches: *const *mut FFI_ArrowArray,
    n_batches: usize,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let engine = handle_ref::<Engine, DFSessionContext>(context, "context")?;
        let name = parse_cstr_owned(name, "name")?;
        if schema.is_null() {
            return Err(DfeError::InvalidArgument("schema is null".to_string()));
        }
        if n_batches > 0 && batches.is_null() {
            return Err(DfeError::InvalidArgument("batches is null".to_string()));
        }
        // SAFETY: schema checked for null; caller keeps it alive for this call.
        let ffi_schema = unsafe { &*schema };
        let table_schema = Arc::new(Schema::try_from(ffi_schema)?);
        let arrays = if n_batches == 0 {
            &[][..]
        } else {
            // SAFETY: caller provides `n_batches` readable pointers.
            unsafe { std::slice::from_raw_parts(batches, n_batches) }
        };
        let mut imported = Vec::with_capacity(arrays.len());
        for (i, &array) in arrays.iter().enumerate() {
            if array.is_null() {
                return Err(DfeError::InvalidArgument(format!("batches[{i}] is null")));
            }
            // SAFETY: array checked for null; ownership moves into Rust and the
            // caller's struct is left marked as released.
            let ffi_array = unsafe { FFI_ArrowArray::from_raw(array) };
            // SAFETY: the array was exported with `schema`.
            let data = unsafe { from_ffi(ffi_array, ffi_schema) }?;
            let batch = RecordBatch::from(StructArray::from(data));
            imported.push(batch.with_schema(table_schema.clone())?);
        }
        engine.register_batches(&name, table_schema, imported)?;
        Ok(true)
    })
}

/// Removes table `name`. Returns `true` on success whether or not the table
/// existed.
#[unsafe(no_mangle)]
pub extern "C" fn df_session_context_deregister(
    context: *mut DFSessionContext,
    name: *const c_char,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let engine = handle_ref::<Engine, DFSessionContext>(context, "context")?;
        let name = parse_cstr_owned(name, "name")?;
        engine.deregister(&name)?;
        Ok(true)
    })
}

// ---------------------------------------------------------------------------
// Data frame

/// Frees a data frame created by [`df_session_context_sql`].
#[unsafe(no_mangle)]
pub extern "C" fn df_data_frame_free(data_frame: *mut DFDataFrame) {
    release_handle::<DataFrame, DFDataFrame>(data_frame);
}

/// Executes the plan and prints the result table to standard output.
/// The data frame stays valid whether or not this succeeds.
#[unsafe(no_mangle)]
pub extern "C" fn df_data_frame_show(
    data_frame: *mut DFDataFrame,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let frame = handle_ref::<DataFrame, DFDataFrame>(data_frame, "data_frame")?;
        frame.show()?;
        Ok(true)
    })
}

/// Executes the plan and returns the result table as text, to be released
/// with [`df_string_free`].
#[unsafe(no_mangle)]
pub extern "C" fn df_data_frame_render(
    data_frame: *mut DFDataFrame,
    error: *mut *mut DFError,
) -> *mut c_char {
    guarded(error, std::ptr::null_mut(), || {
        let frame = handle_ref::<DataFrame, DFDataFrame>(data_frame, "data_frame")?;
        into_c_string(&frame.render()?)
    })
}

/// Executes the plan and returns its row count, or -1 on failure.
///
/// Counting may skip evaluating projected expressions, so an expression that
/// fails when shown can still be counted. Use [`df_data_frame_render`] or
/// [`df_data_frame_export_stream`] to surface every execution error.
#[unsafe(no_mangle)]
pub extern "C" fn df_data_frame_count(
    data_frame: *mut DFDataFrame,
    error: *mut *mut DFError,
) -> i64 {
    guarded(error, -1, || {
        let frame = handle_ref::<DataFrame, DFDataFrame>(data_frame, "data_frame")?;
        let rows = frame.count()?;
        i64::try_from(rows).map_err(|e| DfeError::Internal(format!("row count overflow: {e}")))
    })
}

/// Executes the plan and moves the result into `*out_stream` as an Arrow C
/// stream. The caller releases the stream through its `release` callback.
#[unsafe(no_mangle)]
pub extern "C" fn df_data_frame_export_stream(
    data_frame: *mut DFDataFrame,
    out_stream: *mut FFI_ArrowArrayStream,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let frame = handle_ref::<DataFrame, DFDataFrame>(data_frame, "data_frame")?;
        if out_stream.is_null() {
            return Err(DfeError::InvalidArgument("out_stream is null".to_string()));
        }
        let batches = frame.collect()?;
        let schema = batches
            .first()
            .map(RecordBatch::schema)
            .unwrap_or_else(|| frame.schema());
        let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), schema);
        let stream = FFI_ArrowArrayStream::new(Box::new(reader));
        // SAFETY: out_stream checked for null; the caller's previous content is
        // treated as uninitialized and not dropped.
        unsafe { std::ptr::write(out_stream, stream) };
        Ok(true)
    })
}

// ---------------------------------------------------------------------------
// CSV read options

#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_new() -> *mut DFCsvReadOptions {
    into_handle::<CsvOptions, DFCsvReadOptions>(CsvOptions::default())
}

#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_free(options: *mut DFCsvReadOptions) {
    release_handle::<CsvOptions, DFCsvReadOptions>(options);
}

#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_set_has_header(
    options: *mut DFCsvReadOptions,
    has_header: bool,
) {
    if let Ok(o) = handle_mut::<CsvOptions, DFCsvReadOptions>(options, "options") {
        o.has_header = has_header;
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_get_has_header(options: *const DFCsvReadOptions) -> bool {
    handle_ref::<CsvOptions, DFCsvReadOptions>(options, "options")
        .map(|o| o.has_header)
        .unwrap_or(CsvOptions::default().has_header)
}

#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_set_delimiter(
    options: *mut DFCsvReadOptions,
    delimiter: u8,
) {
    if let Ok(o) = handle_mut::<CsvOptions, DFCsvReadOptions>(options, "options") {
        o.delimiter = delimiter;
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_get_delimiter(options: *const DFCsvReadOptions) -> u8 {
    handle_ref::<CsvOptions, DFCsvReadOptions>(options, "options")
        .map(|o| o.delimiter)
        .unwrap_or(CsvOptions::default().delimiter)
}

#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_set_schema_infer_max_records(
    options: *mut DFCsvReadOptions,
    n: usize,
) {
    if let Ok(o) = handle_mut::<CsvOptions, DFCsvReadOptions>(options, "options") {
        o.schema_infer_max_records = n;
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_get_schema_infer_max_records(
    options: *const DFCsvReadOptions,
) -> usize {
    handle_ref::<CsvOptions, DFCsvReadOptions>(options, "options")
        .map(|o| o.schema_infer_max_records)
        .unwrap_or(CsvOptions::default().schema_infer_max_records)
}

/// Sets an explicit schema. `NULL` switches back to inference. The schema is
/// copied; the caller keeps ownership of `schema`.
#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_set_schema(
    options: *mut DFCsvReadOptions,
    schema: *const FFI_ArrowSchema,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let o = handle_mut::<CsvOptions, DFCsvReadOptions>(options, "options")?;
        o.schema = if schema.is_null() {
            None
        } else {
            // SAFETY: schema checked for null; caller keeps it alive for this call.
            let ffi_schema = unsafe { &*schema };
            Some(Arc::new(Schema::try_from(ffi_schema)?))
        };
        Ok(true)
    })
}

/// Exports the explicit schema into `*out_schema`, which the caller releases
/// through its `release` callback. Returns `false` without an error when no
/// schema is set.
#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_get_schema(
    options: *const DFCsvReadOptions,
    out_schema: *mut FFI_ArrowSchema,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let o = handle_ref::<CsvOptions, DFCsvReadOptions>(options, "options")?;
        if out_schema.is_null() {
            return Err(DfeError::InvalidArgument("out_schema is null".to_string()));
        }
        let Some(schema) = &o.schema else {
            return Ok(false);
        };
        let exported = FFI_ArrowSchema::try_from(schema.as_ref())?;
        // SAFETY: out_schema checked for null; its previous content is treated
        // as uninitialized and not dropped.
        unsafe { std::ptr::write(out_schema, exported) };
        Ok(true)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_set_file_extension(
    options: *mut DFCsvReadOptions,
    file_extension: *const c_char,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let o = handle_mut::<CsvOptions, DFCsvReadOptions>(options, "options")?;
        o.file_extension = parse_cstr_owned(file_extension, "file_extension")?;
        Ok(true)
    })
}

/// Returns a copy of the file extension, released with [`df_string_free`].
#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_get_file_extension(
    options: *const DFCsvReadOptions,
    error: *mut *mut DFError,
) -> *mut c_char {
    guarded(error, std::ptr::null_mut(), || {
        let o = handle_ref::<CsvOptions, DFCsvReadOptions>(options, "options")?;
        into_c_string(&o.file_extension)
    })
}

/// Sets hive-style partition columns. Partition values are read as strings.
#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_set_table_partition_columns(
    options: *mut DFCsvReadOptions,
    columns: *const *const c_char,
    n_columns: usize,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let o = handle_mut::<CsvOptions, DFCsvReadOptions>(options, "options")?;
        let names = parse_cstr_array(columns, n_columns, "columns")?;
        o.table_partition_cols = utf8_partition_cols(names);
        Ok(true)
    })
}

/// Returns the partition column names and stores their count in
/// `*n_columns`. Release the array with [`df_strings_free`].
#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_get_table_partition_columns(
    options: *const DFCsvReadOptions,
    n_columns: *mut usize,
    error: *mut *mut DFError,
) -> *mut *mut c_char {
    guarded(error, std::ptr::null_mut(), || {
        let o = handle_ref::<CsvOptions, DFCsvReadOptions>(options, "options")?;
        into_c_string_array(&partition_column_names(&o.table_partition_cols), n_columns)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn df_csv_read_options_get_n_table_partition_columns(
    options: *const DFCsvReadOptions,
) -> usize {
    handle_ref::<CsvOptions, DFCsvReadOptions>(options, "options")
        .map(|o| o.table_partition_cols.len())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Parquet read options

#[unsafe(no_mangle)]
pub extern "C" fn df_parquet_read_options_new() -> *mut DFParquetReadOptions {
    into_handle::<ParquetOptions, DFParquetReadOptions>(ParquetOptions::default())
}

#[unsafe(no_mangle)]
pub extern "C" fn df_parquet_read_options_free(options: *mut DFParquetReadOptions) {
    release_handle::<ParquetOptions, DFParquetReadOptions>(options);
}

#[unsafe(no_mangle)]
pub extern "C" fn df_parquet_read_options_set_file_extension(
    options: *mut DFParquetReadOptions,
    file_extension: *const c_char,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let o = handle_mut::<ParquetOptions, DFParquetReadOptions>(options, "options")?;
        o.file_extension = parse_cstr_owned(file_extension, "file_extension")?;
        Ok(true)
    })
}

/// Returns a copy of the file extension, released with [`df_string_free`].
#[unsafe(no_mangle)]
pub extern "C" fn df_parquet_read_options_get_file_extension(
    options: *const DFParquetReadOptions,
    error: *mut *mut DFError,
) -> *mut c_char {
    guarded(error, std::ptr::null_mut(), || {
        let o = handle_ref::<ParquetOptions, DFParquetReadOptions>(options, "options")?;
        into_c_string(&o.file_extension)
    })
}

/// Sets hive-style partition columns. Partition values are read as strings.
#[unsafe(no_mangle)]
pub extern "C" fn df_parquet_read_options_set_table_partition_columns(
    options: *mut DFParquetReadOptions,
    columns: *const *const c_char,
    n_columns: usize,
    error: *mut *mut DFError,
) -> bool {
    guarded(error, false, || {
        let o = handle_mut::<ParquetOptions, DFParquetReadOptions>(options, "options")?;
        let names = parse_cstr_array(columns, n_columns, "columns")?;
        o.table_partition_cols = utf8_partition_cols(names);
        Ok(true)
    })
}

/// Returns the partition column names and stores their count in
/// `*n_columns`. Release the array with [`df_strings_free`].
#[unsafe(no_mangle)]
pub extern "C" fn df_parquet_read_options_get_table_partition_columns(
    options: *const DFParquetReadOptions,
    n_columns: *mut usize,
    error: *mut *mut DFError,
) -> *mut *mut c_char {
    guarded(error, std::ptr::null_mut(), || {
        let o = handle_ref::<ParquetOptions, DFParquetReadOptions>(options, "options")?;
        into_c_string_array(&partition_column_names(&o.table_partition_cols), n_columns)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn df_parquet_read_options_get_n_table_partition_columns(
    options: *const DFParquetReadOptions,
) -> usize {
    handle_ref::<ParquetOptions, DFParquetReadOptions>(options, "options")
        .map(|o| o.table_partition_cols.len())
        .unwrap_or(0)
}

#[unsafe(no_mangle)]
pub extern "C" fn df_parquet_read_options_set_pruning(
    options: *mut DFParquetReadOptions,
    pruning: bool,
) {
    if let Ok(o) = handle_mut::<ParquetOptions, DFParquetReadOptions>(options, "options") {
        o.pruning = Some(pruning);
    }
}

/// Returns the pruning flag; an unset flag reports the engine default (`true`).
#[unsafe(no_mangle)]
pub extern "C" fn df_parquet_read_options_get_pruning(
    options: *const DFParquetReadOptions,
) -> bool {
    handle_ref::<ParquetOptions, DFParquetReadOptions>(options, "options")
        .ok()
        .and_then(|o| o.pruning)
        .unwrap_or(true)
}

#[unsafe(no_mangle)]
pub extern "C" fn df_parquet_read_options_set_skip_metadata(
    options: *mut DFParquetReadOptions,
    skip_metadata: bool,
) {
    if let Ok(o) = handle_mut::<ParquetOptions, DFParquetReadOptions>(options, "options") {
        o.skip_metadata = Some(skip_metadata);
    }
}

/// Returns the skip-metadata flag; an unset flag reports the engine default
/// (`true`).
#[unsafe(no_mangle)]
pub extern "C" fn df_parquet_read_options_get_skip_metadata(
    options: *const DFParquetReadOptions,
) -> bool {
    handle_ref::<ParquetOptions, DFParquetReadOptions>(options, "options")
        .ok()
        .and_then(|o| o.skip_metadata)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_converts_panics_into_internal_errors() {
        let mut err: *mut DFError = std::ptr::null_mut();
        let out = guarded(&mut err, 7_i64, || -> Result<i64> { panic!("boom") });
        assert_eq!(out, 7);
        assert!(!err.is_null());
        assert_eq!(df_error_get_code(err), ErrorCode::Internal);
        df_error_free(err);
    }

    #[test]
    fn guarded_keeps_existing_error() {
        let mut err: *mut DFError = std::ptr::null_mut();
        let _ = guarded(&mut err, false, || {
            Err(DfeError::InvalidArgument("first".to_string()))
        });
        let first = err;
        let _ = guarded(&mut err, false, || {
            Err(DfeError::InvalidConfig("second".to_string()))
        });
        assert_eq!(err, first);
        assert_eq!(df_error_get_code(err), ErrorCode::InvalidArgument);
        df_error_free(err);
    }

    #[test]
    fn null_error_location_is_tolerated() {
        let out = guarded(std::ptr::null_mut(), -1_i64, || {
            Err(DfeError::Internal("nobody listens".to_string()))
        });
        assert_eq!(out, -1);
    }

    #[test]
    fn code_names_match_rust_names() {
        for code in [ErrorCode::Sql, ErrorCode::Plan, ErrorCode::Execution, ErrorCode::Allocation] {
            // SAFETY: static NUL-terminated string.
            let name = unsafe { CStr::from_ptr(df_error_code_name(code)) };
            assert_eq!(name.to_str().expect("utf8"), code.name());
        }
    }
}
