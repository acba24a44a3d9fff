use arrow::array::{Array, ArrayRef, AsArray, BinaryArray, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use bench_core::{BenchError, EncodedRecord, Result};
use generate::ImageRecord;
use image::{DynamicImage, ImageFormat};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

pub const IMAGE_COLUMN: &str = "image";
pub const PROMPT_COLUMN: &str = "prompt";
pub const UUID_COLUMN: &str = "uuid";

/// Schema of a generated-image artifact. Field order is part of the contract.
pub fn image_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(IMAGE_COLUMN, DataType::Binary, false),
        Field::new(PROMPT_COLUMN, DataType::Utf8, false),
        Field::new(UUID_COLUMN, DataType::Utf8, false),
    ]))
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| BenchError::Serialization(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes)
}

pub fn encode_records(records: Vec<ImageRecord>) -> Result<Vec<EncodedRecord>> {
    records
        .into_iter()
        .map(|record| {
            Ok(EncodedRecord {
                image: encode_png(&record.image)?,
                prompt: record.prompt,
                uuid: record.uuid.to_string(),
            })
        })
        .collect()
}

pub fn records_to_batch(records: &[EncodedRecord]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(BinaryArray::from_iter_values(
            records.iter().map(|r| r.image.as_slice()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.prompt.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.uuid.as_str()),
        )),
    ];

    RecordBatch::try_new(image_schema(), columns)
        .map_err(|e| BenchError::Serialization(format!("failed to build table: {}", e)))
}

pub fn write_image_records(records: &[EncodedRecord], path: &Path) -> Result<()> {
    let batch = records_to_batch(records)?;
    write_batches(path, image_schema(), &[batch])
}

/// Write batches sharing `schema` to a single Parquet file.
pub fn write_batches(path: &Path, schema: SchemaRef, batches: &[RecordBatch]) -> Result<()> {
    let file = File::create(path).map_err(|e| BenchError::file_access(path, e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, schema, Some(props))
        .map_err(|e| BenchError::Serialization(format!("{}: {}", path.display(), e)))?;
    for batch in batches {
        writer
            .write(batch)
            .map_err(|e| BenchError::Serialization(format!("{}: {}", path.display(), e)))?;
    }
    writer
        .close()
        .map_err(|e| BenchError::Serialization(format!("{}: {}", path.display(), e)))?;
    Ok(())
}

/// Read every record batch of a Parquet file.
pub fn read_batches(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let file = File::open(path).map_err(|e| BenchError::file_access(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| BenchError::Serialization(format!("{}: {}", path.display(), e)))?;
    let schema = builder.schema().clone();
    let reader = builder
        .build()
        .map_err(|e| BenchError::Serialization(format!("{}: {}", path.display(), e)))?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| BenchError::Serialization(format!("{}: {}", path.display(), e)))?;
    Ok((schema, batches))
}

/// Schema from the file footer, without decoding any rows.
pub fn read_schema(path: &Path) -> Result<SchemaRef> {
    let file = File::open(path).map_err(|e| BenchError::file_access(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| BenchError::Serialization(format!("{}: {}", path.display(), e)))?;
    Ok(builder.schema().clone())
}

pub fn read_image_records(path: &Path) -> Result<Vec<EncodedRecord>> {
    let (_, batches) = read_batches(path)?;
    let mut records = Vec::new();

    for batch in &batches {
        let images = binary_column(batch, IMAGE_COLUMN)?;
        let prompts = string_column(batch, PROMPT_COLUMN)?;
        let uuids = string_column(batch, UUID_COLUMN)?;
        for row in 0..batch.num_rows() {
            records.push(EncodedRecord {
                image: images[row].clone(),
                prompt: prompts[row].clone(),
                uuid: uuids[row].clone(),
            });
        }
    }
    Ok(records)
}

/// Image bytes per row. Accepts plain binary columns as well as the
/// `{bytes, path}` struct layout hub datasets use for image features.
pub fn binary_column(batch: &RecordBatch, name: &str) -> Result<Vec<Vec<u8>>> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| missing_column(name))?;
    binary_values(column.as_ref(), name)
}

fn binary_values(column: &dyn Array, name: &str) -> Result<Vec<Vec<u8>>> {
    if let Some(array) = column.as_binary_opt::<i32>() {
        return Ok(array.iter().map(|v| v.unwrap_or_default().to_vec()).collect());
    }
    if let Some(array) = column.as_binary_opt::<i64>() {
        return Ok(array.iter().map(|v| v.unwrap_or_default().to_vec()).collect());
    }
    if let Some(array) = column.as_struct_opt() {
        let bytes = array
            .column_by_name("bytes")
            .ok_or_else(|| missing_column(&format!("{}.bytes", name)))?;
        return binary_values(bytes.as_ref(), name);
    }
    Err(BenchError::Serialization(format!(
        "column {:?} has type {}, expected binary",
        name,
        column.data_type()
    )))
}

pub fn string_column(batch: &RecordBatch, name: &str) -> Result<Vec<String>> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| missing_column(name))?;

    if let Some(array) = column.as_string_opt::<i32>() {
        return Ok(array.iter().map(|v| v.unwrap_or_default().to_string()).collect());
    }
    if let Some(array) = column.as_string_opt::<i64>() {
        return Ok(array.iter().map(|v| v.unwrap_or_default().to_string()).collect());
    }
    Err(BenchError::Serialization(format!(
        "column {:?} has type {}, expected string",
        name,
        column.data_type()
    )))
}

fn missing_column(name: &str) -> BenchError {
    BenchError::Serialization(format!("column {:?} not found", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([r, g, b])))
    }

    #[test]
    fn test_schema_field_order() {
        let schema = image_schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["image", "prompt", "uuid"]);
        assert_eq!(schema.field(0).data_type(), &DataType::Binary);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
    }

    #[test]
    fn test_encode_png_decodes_back() {
        let png = encode_png(&solid(1, 2, 3)).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_write_then_read_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.parquet");

        let records = encode_records(vec![
            ImageRecord::new(solid(255, 0, 0), "An individual nurse.".into()),
            ImageRecord::new(solid(0, 255, 0), "An individual teacher.".into()),
            ImageRecord::new(solid(0, 0, 255), "An individual nurse.".into()),
        ])
        .unwrap();

        write_image_records(&records, &path).unwrap();
        let read_back = read_image_records(&path).unwrap();
        assert_eq!(read_back, records);
    }

    #[test]
    fn test_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.parquet");
        write_image_records(&[], &path).unwrap();
        assert!(read_image_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_struct_image_column() {
        use arrow::array::StructArray;

        let bytes: ArrayRef = Arc::new(BinaryArray::from_iter_values([b"abc".as_slice()]));
        let paths: ArrayRef = Arc::new(StringArray::from_iter_values(["0.png"]));
        let image = StructArray::from(vec![
            (Arc::new(Field::new("bytes", DataType::Binary, true)), bytes),
            (Arc::new(Field::new("path", DataType::Utf8, true)), paths),
        ]);
        let schema = Arc::new(Schema::new(vec![Field::new(
            "image",
            image.data_type().clone(),
            true,
        )]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(image)]).unwrap();

        assert_eq!(binary_column(&batch, "image").unwrap(), vec![b"abc".to_vec()]);
    }

    #[test]
    fn test_missing_column() {
        let batch = records_to_batch(&[]).unwrap();
        let err = string_column(&batch, "caption").unwrap_err();
        assert!(matches!(err, BenchError::Serialization(_)));
    }
}
