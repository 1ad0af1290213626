use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::dataset::{Dataset, TableData};

/// Write a table as CSV, header first, feeding every byte into `digest`.
///
/// Returns the number of bytes written.
pub fn write_table_csv(
    path: &Path,
    table: &TableData,
    digest: &mut Sha256,
) -> Result<u64, csv::Error> {
    let writer = BufWriter::new(File::create(path).map_err(csv::Error::from)?);
    let counting = render_table_csv(CountingWriter::new(writer, digest), table)?;
    Ok(counting.bytes_written())
}

/// SHA-256 over the CSV rendering of every table, in dataset order.
pub fn dataset_fingerprint(dataset: &Dataset) -> Result<String, csv::Error> {
    let mut digest = Sha256::new();
    for table in &dataset.tables {
        render_table_csv(CountingWriter::new(std::io::sink(), &mut digest), table)?;
    }
    Ok(hex::encode(digest.finalize()))
}

fn render_table_csv<'d, W: Write>(
    counting: CountingWriter<'d, W>,
    table: &TableData,
) -> Result<CountingWriter<'d, W>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|value| value.to_csv()))?;
    }

    writer.flush()?;
    writer.into_inner().map_err(|err| err.into_error().into())
}

struct CountingWriter<'d, W: Write> {
    inner: W,
    digest: &'d mut Sha256,
    bytes: u64,
}

impl<'d, W: Write> CountingWriter<'d, W> {
    fn new(inner: W, digest: &'d mut Sha256) -> Self {
        Self {
            inner,
            digest,
            bytes: 0,
        }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.digest.update(&buf[..size]);
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
