//! FASTA input.
//!
//! Parsing is delegated to `bio`; this module only turns records into
//! [`SequenceRecord`]s in file order.

use std::{
    fmt::Debug,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use bio::io::fasta;
use bytes::Bytes;
use tracing::debug;

use crate::{error::KmerSigError, pipeline::SequenceRecord};

/// Check if a path has a gzip extension (.gz).
#[cfg(feature = "gzip")]
fn is_gzip_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .is_some_and(|ext| ext == "gz")
}

/// Reads every record of the FASTA file at `path`.
///
/// With the `gzip` feature, paths ending in `.gz` are decompressed.
///
/// # Errors
///
/// Returns [`KmerSigError::SequenceRead`] if the file cannot be opened and
/// [`KmerSigError::SequenceParse`] if a record is malformed.
pub fn read_fasta<P>(path: P) -> Result<Vec<SequenceRecord>, KmerSigError>
where
    P: AsRef<Path> + Debug,
{
    let path_ref = path.as_ref();
    let file = File::open(path_ref).map_err(|source| KmerSigError::SequenceRead {
        source,
        path: path_ref.to_path_buf(),
    })?;

    #[cfg(feature = "gzip")]
    let records = if is_gzip_path(path_ref) {
        read_records(flate2::read::GzDecoder::new(file), path_ref)?
    } else {
        read_records(file, path_ref)?
    };
    #[cfg(not(feature = "gzip"))]
    let records = read_records(file, path_ref)?;

    debug!(path = ?path_ref, sequences = records.len(), "Read sequences from file");
    Ok(records)
}

/// Reads every FASTA record from `reader`.
///
/// # Errors
///
/// Returns [`KmerSigError::SequenceParse`] if a record is malformed.
pub fn read_fasta_from_reader<R: Read>(reader: R) -> Result<Vec<SequenceRecord>, KmerSigError> {
    read_records(reader, Path::new("<reader>"))
}

fn read_records<R: Read>(reader: R, path: &Path) -> Result<Vec<SequenceRecord>, KmerSigError> {
    fasta::Reader::new(BufReader::new(reader))
        .records()
        .map(|record| {
            record
                .map(|record| {
                    SequenceRecord::new(record.id(), Bytes::copy_from_slice(record.seq()))
                })
                .map_err(|e| KmerSigError::SequenceParse {
                    details: e.to_string(),
                    path: path.to_path_buf(),
                })
        })
        .collect()
}
