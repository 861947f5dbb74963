use crate::{common::*, decode_bboxes, Record, IMAGE_SIZE_BYTES, LABEL_SIZE_BYTES};

#[derive(Debug)]
enum State<R> {
    Open(R),
    /// The stream was cut short; reading yields nothing more.
    Exhausted,
    Closed,
}

/// Strictly forward reader over a stream of back-to-back records.
#[derive(Debug)]
pub struct RecordReader<R>
where
    R: Read,
{
    state: State<R>,
    offset: u64,
    num_records: usize,
    label_buf: Vec<u8>,
}

impl RecordReader<BufReader<File>> {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl RecordReader<Cursor<Vec<u8>>> {
    /// Read records out of an in-memory buffer.
    pub fn from_bytes<B>(bytes: B) -> Self
    where
        B: Into<Vec<u8>>,
    {
        Self::new(Cursor::new(bytes.into()))
    }
}

impl<R> RecordReader<R>
where
    R: Read,
{
    pub fn new(reader: R) -> Self {
        Self {
            state: State::Open(reader),
            offset: 0,
            num_records: 0,
            label_buf: vec![],
        }
    }

    /// Byte offset of the next unread record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn records_read(&self) -> usize {
        self.num_records
    }

    /// Release the underlying source. Later reads fail with [Error::Closed].
    pub fn close(&mut self) {
        self.state = State::Closed;
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` when the stream ends exactly on a record boundary.
    /// A stream that ends inside a record yields [Error::TruncatedRecord]
    /// once, after which the reader behaves as exhausted.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        let result = self.read_record_inner();
        if let Err(Error::TruncatedRecord {
            offset,
            expected,
            available,
        }) = &result
        {
            warn!(
                "failed to read {} bytes at offset {}, only {} available",
                expected, offset, available
            );
            self.state = State::Exhausted;
        }
        result
    }

    fn read_record_inner(&mut self) -> Result<Option<Record>> {
        let reader = match &mut self.state {
            State::Open(reader) => reader,
            State::Exhausted => return Ok(None),
            State::Closed => return Err(Error::Closed),
        };
        let start = self.offset;
        let mut offset = start;

        // image frame
        let mut size_buf = [0u8; IMAGE_SIZE_BYTES];
        let num_read = read_up_to(reader, &mut size_buf)?;
        if num_read == 0 {
            self.state = State::Exhausted;
            return Ok(None);
        }
        check_len(offset, IMAGE_SIZE_BYTES, num_read)?;
        offset += IMAGE_SIZE_BYTES as u64;
        let image_size = LittleEndian::read_u16(&size_buf) as usize;

        let mut image = Vec::with_capacity(image_size);
        reader
            .by_ref()
            .take(image_size as u64)
            .read_to_end(&mut image)?;
        check_len(offset, image_size, image.len())?;
        offset += image_size as u64;

        // label frame
        let mut size_buf = [0u8; LABEL_SIZE_BYTES];
        let num_read = read_up_to(reader, &mut size_buf)?;
        check_len(offset, LABEL_SIZE_BYTES, num_read)?;
        offset += LABEL_SIZE_BYTES as u64;
        let label_size = LittleEndian::read_u32(&size_buf) as usize;

        self.label_buf.clear();
        reader
            .by_ref()
            .take(label_size as u64)
            .read_to_end(&mut self.label_buf)?;
        check_len(offset, label_size, self.label_buf.len())?;
        offset += label_size as u64;

        // the whole record is consumed even if the labels turn out malformed
        self.offset = offset;
        let bboxes = decode_bboxes(&self.label_buf)?;
        self.num_records += 1;
        debug!(
            "read record {} at offset {} with {} boxes",
            self.num_records,
            start,
            bboxes.len()
        );

        Ok(Some(Record { image, bboxes }))
    }
}

impl<R> Iterator for RecordReader<R>
where
    R: Read,
{
    type Item = Result<Record>;

    /// Yields records until the end of stream or the first error.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(record) => record.map(Ok),
            Err(err) => {
                if !matches!(self.state, State::Closed) {
                    self.state = State::Exhausted;
                }
                Some(Err(err))
            }
        }
    }
}

/// Fill `buf` as far as the source allows and report how many bytes were read.
fn read_up_to<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: Read,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(filled)
}

fn check_len(offset: u64, expected: usize, available: usize) -> Result<()> {
    if available < expected {
        return Err(Error::TruncatedRecord {
            offset,
            expected,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        let bboxes = vec![
            BBoxLabel::try_from_fields([100.0, 100.0, 50.0, 50.0], 0).unwrap(),
            BBoxLabel::try_from_fields([20.5, 30.25, 8.0, 16.0], 2).unwrap(),
        ];
        Record::new(vec![1, 2, 3, 4, 5], bboxes)
    }

    #[test]
    fn empty_stream_is_clean_end() {
        let mut reader = RecordReader::from_bytes(Vec::<u8>::new());
        assert!(reader.read_record().unwrap().is_none());
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn truncated_image_blob() {
        let bytes = sample_record().encode().unwrap();
        let mut reader = RecordReader::from_bytes(&bytes[..5]);
        let err = reader.read_record().unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedRecord {
                offset: 2,
                expected: 5,
                available: 3
            }
        ));
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn truncated_size_field() {
        let mut reader = RecordReader::from_bytes(vec![7u8]);
        assert!(matches!(
            reader.read_record(),
            Err(Error::TruncatedRecord { offset: 0, .. })
        ));
    }

    #[test]
    fn truncated_label_blob() {
        let bytes = sample_record().encode().unwrap();
        let mut reader = RecordReader::from_bytes(&bytes[..bytes.len() - 1]);
        assert!(matches!(
            reader.read_record(),
            Err(Error::TruncatedRecord {
                expected: 40,
                available: 39,
                ..
            })
        ));
    }

    #[test]
    fn malformed_label_blob() {
        let mut bytes = vec![];
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.push(0xff);
        bytes.extend_from_slice(&23u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 23]);

        let mut reader = RecordReader::from_bytes(bytes);
        assert!(matches!(
            reader.read_record(),
            Err(Error::MalformedLabel { len: 23 })
        ));
        // the malformed frame is consumed, so the stream ends cleanly
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn read_after_close_fails() {
        let bytes = sample_record().encode().unwrap();
        let mut reader = RecordReader::from_bytes(bytes);
        reader.close();
        assert!(matches!(reader.read_record(), Err(Error::Closed)));
    }

    #[test]
    fn iterator_stops_after_error() {
        let mut bytes = sample_record().encode().unwrap();
        bytes.extend(sample_record().encode().unwrap());
        bytes.truncate(bytes.len() - 3);

        let results: Vec<_> = RecordReader::from_bytes(bytes).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), &sample_record());
        assert!(matches!(results[1], Err(Error::TruncatedRecord { .. })));
    }
}
