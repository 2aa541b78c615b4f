//! Packing admitted fragments into a single archive.

use std::io::{Cursor, Write as _};

use crate::SplitError;

/// Bundles `(file name, bytes)` entries into one archive.
pub trait Archiver: Send + Sync {
    /// Packs `entries` in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError`] if the archive cannot be written.
    fn pack(&self, entries: &[(&str, &[u8])]) -> Result<Vec<u8>, SplitError>;
}

/// In-memory ZIP archiver.
#[derive(Debug, Clone, Copy)]
pub struct ZipArchiver {
    compression: zip::CompressionMethod,
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self {
            compression: zip::CompressionMethod::Deflated,
        }
    }
}

impl ZipArchiver {
    /// Archiver that stores entries without compression.
    #[must_use]
    pub const fn stored() -> Self {
        Self {
            compression: zip::CompressionMethod::Stored,
        }
    }
}

impl Archiver for ZipArchiver {
    fn pack(&self, entries: &[(&str, &[u8])]) -> Result<Vec<u8>, SplitError> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            zip::write::SimpleFileOptions::default().compression_method(self.compression);

        for (name, bytes) in entries {
            writer.start_file(*name, options)?;
            writer.write_all(bytes)?;
        }

        let archive = writer.finish()?.into_inner();
        log::debug!(
            "Packed {} entries into {} byte archive",
            entries.len(),
            archive.len()
        );
        Ok(archive)
    }
}

/// `<stem>_<suffix>.zip`, e.g. `folha_marco_contracheques.zip`.
#[must_use]
pub fn archive_file_name(stem: &str, suffix: &str) -> String {
    format!("{stem}_{suffix}.zip")
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;

    use super::*;

    fn read_back(archive: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
        (0..zip.len())
            .map(|i| {
                let mut file = zip.by_index(i).unwrap();
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).unwrap();
                (file.name().to_owned(), bytes)
            })
            .collect()
    }

    #[test]
    fn packs_entries_in_order() {
        let entries: [(&str, &[u8]); 2] = [
            ("JOAO_SILVA.pdf", b"%PDF-first"),
            ("recibo_topo_p2_20-106mm.pdf", b"%PDF-second"),
        ];

        let contents = read_back(ZipArchiver::default().pack(&entries).unwrap());

        assert_eq!(
            contents,
            vec![
                ("JOAO_SILVA.pdf".to_owned(), b"%PDF-first".to_vec()),
                (
                    "recibo_topo_p2_20-106mm.pdf".to_owned(),
                    b"%PDF-second".to_vec()
                ),
            ]
        );
    }

    #[test]
    fn empty_archive_is_valid() {
        let archive = ZipArchiver::stored().pack(&[]).unwrap();
        assert!(read_back(archive).is_empty());
    }

    #[test]
    fn names_archive_after_input() {
        assert_eq!(
            archive_file_name("folha_marco", "contracheques"),
            "folha_marco_contracheques.zip"
        );
    }
}
