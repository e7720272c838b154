//! Fixed-width big-endian binary streams (§4.6, §6.3).
//!
//! Records are back-to-back with no framing, header, or count. Each `write_*`
//! function here emits exactly one record.

use crate::domain::errors::ExportError;
use crate::domain::types::{ObjectId, SourceLocId, Timestamp};
use std::io::Write;

/// `{ i32 object_id; u64 most_recent_use_time; i32 site_file_id; i32 site_iid }` (20 bytes).
pub fn write_last_use_record<W: Write + ?Sized>(
    writer: &mut W,
    object_id: ObjectId,
    time: Timestamp,
    site: SourceLocId,
) -> Result<(), ExportError> {
    writer.write_all(&object_id.0.to_be_bytes())?;
    writer.write_all(&time.0.to_be_bytes())?;
    writer.write_all(&site.file_id.to_be_bytes())?;
    writer.write_all(&site.iid.to_be_bytes())?;
    Ok(())
}

/// `{ i32 object_id; u64 unreachable_time; i32 site_file_id; i32 site_iid }` (20 bytes).
pub fn write_unreachable_record<W: Write + ?Sized>(
    writer: &mut W,
    object_id: ObjectId,
    time: Timestamp,
    site: SourceLocId,
) -> Result<(), ExportError> {
    // Same shape as the last-use record; kept as a distinct function so the
    // two streams can diverge independently if their record formats ever do.
    writer.write_all(&object_id.0.to_be_bytes())?;
    writer.write_all(&time.0.to_be_bytes())?;
    writer.write_all(&site.file_id.to_be_bytes())?;
    writer.write_all(&site.iid.to_be_bytes())?;
    Ok(())
}

/// `{ i32 object_id; i32 site_file_id; i32 site_iid }` (12 bytes). `creation_time`
/// is the sort key used before calling this and is not itself emitted (§6.3).
pub fn write_iid_update_record<W: Write + ?Sized>(
    writer: &mut W,
    object_id: ObjectId,
    new_site: SourceLocId,
) -> Result<(), ExportError> {
    writer.write_all(&object_id.0.to_be_bytes())?;
    writer.write_all(&new_site.file_id.to_be_bytes())?;
    writer.write_all(&new_site.iid.to_be_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_use_record_is_twenty_bytes_big_endian() {
        let mut buf = Vec::new();
        write_last_use_record(&mut buf, ObjectId(5), Timestamp(20), SourceLocId::new(1, 2))
            .unwrap();
        assert_eq!(buf.len(), 20);
        assert_eq!(&buf[0..4], &5i32.to_be_bytes());
        assert_eq!(&buf[4..12], &20u64.to_be_bytes());
        assert_eq!(&buf[12..16], &1i32.to_be_bytes());
        assert_eq!(&buf[16..20], &2i32.to_be_bytes());
    }

    #[test]
    fn iid_update_record_is_twelve_bytes_and_omits_creation_time() {
        let mut buf = Vec::new();
        write_iid_update_record(&mut buf, ObjectId(5), SourceLocId::new(3, 3)).unwrap();
        assert_eq!(buf.len(), 12);
        assert_eq!(&buf[0..4], &5i32.to_be_bytes());
        assert_eq!(&buf[4..8], &3i32.to_be_bytes());
        assert_eq!(&buf[8..12], &3i32.to_be_bytes());
    }

    #[test]
    fn records_are_back_to_back_with_no_framing() {
        let mut buf = Vec::new();
        write_unreachable_record(&mut buf, ObjectId(1), Timestamp(10), SourceLocId::new(0, 0))
            .unwrap();
        write_unreachable_record(&mut buf, ObjectId(2), Timestamp(20), SourceLocId::new(0, 0))
            .unwrap();
        assert_eq!(buf.len(), 40);
    }
}
