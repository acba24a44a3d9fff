use arrow::array::{ArrayRef, AsArray, Float64Array, StringArray};
use arrow::datatypes::Float64Type;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use bench_core::{AnalysisRecord, BenchError, Result};
use std::sync::Arc;

use crate::parquet_io::{IMAGE_COLUMN, PROMPT_COLUMN, binary_column, string_column};

pub const HUE_COLUMN: &str = "hue";
pub const RACE_COLUMN: &str = "race_prediction";
pub const SEX_COLUMN: &str = "sex_prediction";

// Feature descriptions written by the hub's dataset tooling; stale once columns change.
const HUB_FEATURES_METADATA_KEY: &str = "huggingface";

/// One row of a downloaded dataset, as needed by the analysis pass.
#[derive(Debug, Clone)]
pub struct DatasetRow {
    pub image: Vec<u8>,
    pub prompt: String,
}

pub fn total_rows(batches: &[RecordBatch]) -> usize {
    batches.iter().map(|b| b.num_rows()).sum()
}

/// Flatten batches into rows in iteration order.
pub fn dataset_rows(batches: &[RecordBatch]) -> Result<Vec<DatasetRow>> {
    let mut rows = Vec::with_capacity(total_rows(batches));
    for batch in batches {
        let images = binary_column(batch, IMAGE_COLUMN)?;
        let prompts = string_column(batch, PROMPT_COLUMN)?;
        rows.extend(
            images
                .into_iter()
                .zip(prompts)
                .map(|(image, prompt)| DatasetRow { image, prompt }),
        );
    }
    Ok(rows)
}

/// Read back the analysis columns of a merged dataset. Face regions are not
/// stored, so `face` is always `None`.
pub fn analysis_columns(batches: &[RecordBatch]) -> Result<Vec<AnalysisRecord>> {
    let mut records = Vec::with_capacity(total_rows(batches));
    for batch in batches {
        let hues = batch
            .column_by_name(HUE_COLUMN)
            .and_then(|c| c.as_primitive_opt::<Float64Type>())
            .ok_or_else(|| {
                BenchError::Serialization(format!("column {:?} missing or not float64", HUE_COLUMN))
            })?;
        let races = string_column(batch, RACE_COLUMN)?;
        let sexes = string_column(batch, SEX_COLUMN)?;

        for ((hue, race), gender) in hues.values().iter().zip(races).zip(sexes) {
            records.push(AnalysisRecord {
                hue: *hue,
                face: None,
                race,
                gender,
            });
        }
    }
    Ok(records)
}

pub fn analysis_schema(base: &Schema) -> SchemaRef {
    let mut fields: Vec<Arc<Field>> = base.fields().iter().cloned().collect();
    fields.push(Arc::new(Field::new(HUE_COLUMN, DataType::Float64, false)));
    fields.push(Arc::new(Field::new(RACE_COLUMN, DataType::Utf8, false)));
    fields.push(Arc::new(Field::new(SEX_COLUMN, DataType::Utf8, false)));

    let mut metadata = base.metadata().clone();
    metadata.remove(HUB_FEATURES_METADATA_KEY);
    Arc::new(Schema::new_with_metadata(fields, metadata))
}

/// Append hue/race/sex columns after the existing ones. `analysis` must hold
/// exactly one record per row, in row order.
pub fn append_analysis_columns(
    schema: &Schema,
    batches: &[RecordBatch],
    analysis: &[AnalysisRecord],
) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let rows = total_rows(batches);
    if rows != analysis.len() {
        return Err(BenchError::Alignment {
            rows,
            values: analysis.len(),
        });
    }

    let merged_schema = analysis_schema(schema);
    let mut merged = Vec::with_capacity(batches.len());
    let mut offset = 0;

    for batch in batches {
        let slice = &analysis[offset..offset + batch.num_rows()];
        offset += batch.num_rows();

        let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
        columns.push(Arc::new(Float64Array::from_iter_values(
            slice.iter().map(|r| r.hue),
        )));
        columns.push(Arc::new(StringArray::from_iter_values(
            slice.iter().map(|r| r.race.as_str()),
        )));
        columns.push(Arc::new(StringArray::from_iter_values(
            slice.iter().map(|r| r.gender.as_str()),
        )));

        let batch = RecordBatch::try_new(merged_schema.clone(), columns)
            .map_err(|e| BenchError::Serialization(format!("failed to merge columns: {}", e)))?;
        merged.push(batch);
    }

    Ok((merged_schema, merged))
}
