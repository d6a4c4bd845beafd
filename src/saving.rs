use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::dataset::Dataset;
use crate::error::Result;

/// Writes a dataset snapshot as gzip-compressed bincode
///
/// # Arguments
/// * `dataset` - The dataset to persist
/// * `out` - Any writer; the gzip stream is finished before returning
///
/// # Returns
/// * `Ok(())` on success, or an I/O or snapshot error
pub fn write_snapshot<W: Write>(dataset: &Dataset, out: W) -> Result<()> {
    let encoder = GzEncoder::new(out, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, dataset)?;

    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    encoder.finish()?;
    Ok(())
}

/// Reads a snapshot written by [`write_snapshot`] and validates it
///
/// # Arguments
/// * `input` - Any reader positioned at the start of the gzip stream
///
/// # Returns
/// * The restored `Dataset`, or a snapshot or validation error
pub fn read_snapshot<R: Read>(input: R) -> Result<Dataset> {
    let mut reader = BufReader::new(GzDecoder::new(input));
    let dataset: Dataset = deserialize_from(&mut reader)?;
    dataset.validate()?;
    Ok(dataset)
}

/// Save a dataset snapshot to a file
///
/// # Examples
/// ```no_run
/// use dashboard::loader::from_json;
/// use dashboard::saving::save_snapshot;
///
/// let data = from_json("data/dashboard.json").unwrap();
/// save_snapshot(&data, "dashboard.gz").unwrap();
/// ```
pub fn save_snapshot(dataset: &Dataset, filename: impl AsRef<Path>) -> Result<()> {
    let path = filename.as_ref();
    write_snapshot(dataset, File::create(path)?)?;
    log::info!("saved snapshot to {}", path.display());
    Ok(())
}

/// Load a dataset snapshot from a file written by [`save_snapshot`].
pub fn load_snapshot(filename: impl AsRef<Path>) -> Result<Dataset> {
    let path = filename.as_ref();
    let dataset = read_snapshot(File::open(path)?)?;
    log::info!("loaded snapshot from {}", path.display());
    Ok(dataset)
}

/// In-memory variant of [`write_snapshot`].
pub fn snapshot_to_bytes(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_snapshot(dataset, &mut buffer)?;
    Ok(buffer)
}

pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Dataset> {
    read_snapshot(bytes)
}
