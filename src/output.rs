//! Signature serialization and parsing.
//!
//! # Tabular layout
//!
//! ```text
//! Sequence Id<TAB>AA<TAB>AC<TAB>...
//! seq1<TAB>0.25<TAB>0<TAB>...
//! ```
//!
//! Values are written with the shortest representation that parses back to
//! the same `f64`, so a write/read cycle is lossless.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{cli::OutputFormat, error::KmerSigError, index::ID_COLUMN, signature::Signature};

/// A signature row for JSON Lines output.
#[derive(Serialize)]
struct SignatureRow<'a> {
    id: &'a str,
    signature: &'a Signature,
}

#[derive(Deserialize)]
struct OwnedSignatureRow {
    id: String,
    signature: Signature,
}

/// Streaming writer of signature rows.
///
/// The header is written on construction; every row goes straight to the
/// underlying writer.
pub struct SignatureSink<W: Write> {
    writer: W,
    format: OutputFormat,
    rows: u64,
}

impl<W: Write> SignatureSink<W> {
    /// Creates a sink and writes the header for `columns` (TSV only).
    ///
    /// # Errors
    ///
    /// Returns [`KmerSigError::WriteError`] if the header cannot be written.
    pub fn new<S: AsRef<str>>(
        mut writer: W,
        format: OutputFormat,
        columns: &[S],
    ) -> Result<Self, KmerSigError> {
        if let OutputFormat::Tsv = format {
            write!(writer, "{ID_COLUMN}")?;
            for column in columns {
                write!(writer, "\t{}", column.as_ref())?;
            }
            writeln!(writer)?;
        }
        Ok(Self {
            writer,
            format,
            rows: 0,
        })
    }

    /// Writes one row.
    ///
    /// # Errors
    ///
    /// Returns [`KmerSigError::WriteError`] or [`KmerSigError::JsonError`].
    pub fn write_row(&mut self, id: &str, signature: &Signature) -> Result<(), KmerSigError> {
        match self.format {
            OutputFormat::Tsv => {
                write!(self.writer, "{id}")?;
                for value in signature.values() {
                    write!(self.writer, "\t{value}")?;
                }
                writeln!(self.writer)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, &SignatureRow { id, signature })?;
                writeln!(self.writer)?;
            }
        }
        self.rows += 1;
        Ok(())
    }

    /// Number of rows written so far.
    #[must_use]
    pub const fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`KmerSigError::WriteError`] if flushing fails.
    pub fn finish(mut self) -> Result<W, KmerSigError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Parses tabular signature output back into a map from identifier to
/// signature. The first line is taken to be the header and skipped.
///
/// # Errors
///
/// Returns [`KmerSigError::ParseSignature`] for a row with a non-numeric
/// value, or [`KmerSigError::WriteError`] wrapping a read failure.
///
/// # Example
///
/// ```rust
/// use kmersig::output::read_signatures;
///
/// let text = "Sequence Id\tA\tC\nseq1\t0.25\t0.75\n";
/// let sigs = read_signatures(text.as_bytes())?;
/// assert_eq!(sigs["seq1"].values(), &[0.25, 0.75]);
/// # Ok::<(), kmersig::error::KmerSigError>(())
/// ```
pub fn read_signatures<R: BufRead>(reader: R) -> Result<HashMap<String, Signature>, KmerSigError> {
    let mut signatures = HashMap::new();

    for (line_no, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let id = fields.next().unwrap_or_default().to_string();
        let values = fields
            .map(|field| {
                field
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| KmerSigError::ParseSignature {
                        line: line_no + 1,
                        details: format!("'{field}': {e}"),
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        signatures.insert(id, Signature::from(values));
    }

    Ok(signatures)
}

/// Parses JSON Lines signature output, one `{"id", "signature"}` object per
/// line. Blank lines are skipped.
///
/// # Errors
///
/// Returns [`KmerSigError::ParseSignature`] for a line that is not a
/// signature row.
pub fn read_json_lines<R: BufRead>(reader: R) -> Result<HashMap<String, Signature>, KmerSigError> {
    let mut signatures = HashMap::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: OwnedSignatureRow =
            serde_json::from_str(line).map_err(|e| KmerSigError::ParseSignature {
                line: line_no + 1,
                details: e.to_string(),
            })?;
        signatures.insert(row.id, row.signature);
    }

    Ok(signatures)
}

/// Reads a tabular signature file from `path`.
///
/// # Errors
///
/// Returns [`KmerSigError::SignatureRead`] if the file cannot be opened,
/// otherwise as [`read_signatures`].
pub fn read_signatures_path<P: AsRef<Path>>(
    path: P,
) -> Result<HashMap<String, Signature>, KmerSigError> {
    read_signatures_path_as(path, OutputFormat::Tsv)
}

/// Reads a signature file from `path` written in `format`.
///
/// # Errors
///
/// Returns [`KmerSigError::SignatureRead`] if the file cannot be opened,
/// otherwise as [`read_signatures`] or [`read_json_lines`].
pub fn read_signatures_path_as<P: AsRef<Path>>(
    path: P,
    format: OutputFormat,
) -> Result<HashMap<String, Signature>, KmerSigError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| KmerSigError::SignatureRead {
        source,
        path: path.to_path_buf(),
    })?;
    let reader = BufReader::new(file);
    match format {
        OutputFormat::Tsv => read_signatures(reader),
        OutputFormat::Json => read_json_lines(reader),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sink_output(format: OutputFormat, rows: &[(&str, Vec<f64>)]) -> String {
        let mut sink = SignatureSink::new(Vec::new(), format, &["AA", "AC"]).unwrap();
        for (id, values) in rows {
            sink.write_row(id, &Signature::from(values.clone())).unwrap();
        }
        assert_eq!(sink.rows(), rows.len() as u64);
        String::from_utf8(sink.finish().unwrap()).unwrap()
    }

    #[test]
    fn tsv_layout() {
        let out = sink_output(
            OutputFormat::Tsv,
            &[("seq1", vec![0.25, 0.75]), ("seq2", vec![1.0, 0.0])],
        );
        insta::assert_snapshot!(out, @r###"
        Sequence Id	AA	AC
        seq1	0.25	0.75
        seq2	1	0
        "###);
    }

    #[test]
    fn json_lines_layout() {
        let out = sink_output(OutputFormat::Json, &[("seq1", vec![0.25, 0.75])]);
        assert_eq!(out, "{\"id\":\"seq1\",\"signature\":[0.25,0.75]}\n");
    }

    #[test]
    fn tsv_round_trip_is_exact() {
        let values = vec![1.0 / 3.0, 2.0 / 3.0];
        let out = sink_output(OutputFormat::Tsv, &[("x", values.clone())]);
        let parsed = read_signatures(out.as_bytes()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["x"].values(), values.as_slice());
    }

    #[test]
    fn read_tolerates_crlf_and_blank_lines() {
        let text = "Sequence Id\tA\tC\r\nseq1\t0.5\t0.5\r\n\r\n";
        let parsed = read_signatures(text.as_bytes()).unwrap();
        assert_eq!(parsed["seq1"].values(), &[0.5, 0.5]);
    }

    #[test]
    fn read_reports_malformed_line() {
        let text = "Sequence Id\tA\tC\nseq1\t0.5\t0.5\nseq2\tabc\t0.5\n";
        let err = read_signatures(text.as_bytes()).unwrap_err();
        assert!(matches!(err, KmerSigError::ParseSignature { line: 3, .. }));
    }

    #[test]
    fn json_lines_round_trip_is_exact() {
        let out = sink_output(
            OutputFormat::Json,
            &[("x", vec![1.0 / 3.0, 2.0 / 3.0]), ("y", vec![1.0, 0.0])],
        );
        let parsed = read_json_lines(out.as_bytes()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["x"].values(), &[1.0 / 3.0, 2.0 / 3.0]);
        assert_eq!(parsed["y"].values(), &[1.0, 0.0]);
    }

    #[test]
    fn json_lines_reports_malformed_line() {
        let text = "{\"id\":\"a\",\"signature\":[1.0]}\n\nnot json\n";
        let err = read_json_lines(text.as_bytes()).unwrap_err();
        assert!(matches!(err, KmerSigError::ParseSignature { line: 3, .. }));
    }

    #[test]
    fn read_missing_file() {
        let err = read_signatures_path("/definitely/not/here.tsv").unwrap_err();
        assert!(matches!(err, KmerSigError::SignatureRead { .. }));
    }
}
