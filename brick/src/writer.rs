use crate::{common::*, Record};

/// Appends records to a byte sink.
#[derive(Debug)]
pub struct RecordWriter<W>
where
    W: Write,
{
    writer: Option<W>,
    num_records: usize,
}

impl RecordWriter<BufWriter<File>> {
    pub fn create<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W> RecordWriter<W>
where
    W: Write,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            num_records: 0,
        }
    }

    /// Number of records successfully written so far.
    pub fn records_written(&self) -> usize {
        self.num_records
    }

    pub fn write(&mut self, record: &Record) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(Error::Closed)?;
        record.encode_to(writer)?;
        self.num_records += 1;
        Ok(())
    }

    /// Write every record in order, logging progress every 1000 records.
    pub fn write_all<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Record>,
    {
        for record in records {
            if self.num_records > 0 && self.num_records % 1000 == 0 {
                info!("saved {} records", self.num_records);
            }
            self.write(&record)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.as_mut().ok_or(Error::Closed)?.flush()?;
        Ok(())
    }

    /// Flush and release the sink. Later writes fail with [Error::Closed].
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Flush and hand back the sink.
    pub fn into_inner(mut self) -> Result<W> {
        let mut writer = self.writer.take().ok_or(Error::Closed)?;
        writer.flush()?;
        Ok(writer)
    }
}
