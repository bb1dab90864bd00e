use crate::error::{ServiceError, ServiceResult};

/// ZIP local file header; every `.xlsx` package starts with one.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// OLE2 compound document header used by BIFF `.xls` workbooks.
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    Xlsx,
    Xls,
}

impl WorkbookFormat {
    /// Format implied by the file name's extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(WorkbookFormat::Xlsx),
            "xls" => Some(WorkbookFormat::Xls),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            WorkbookFormat::Xlsx => "xlsx",
            WorkbookFormat::Xls => "xls",
        }
    }

    fn magic(self) -> &'static [u8] {
        match self {
            WorkbookFormat::Xlsx => ZIP_MAGIC,
            WorkbookFormat::Xls => OLE_MAGIC,
        }
    }

    pub fn matches_signature(self, bytes: &[u8]) -> bool {
        bytes.starts_with(self.magic())
    }
}

/// Decides the format of an upload from its name and checks the bytes agree.
pub fn detect_format(file_name: &str, bytes: &[u8]) -> ServiceResult<WorkbookFormat> {
    let format = WorkbookFormat::from_file_name(file_name).ok_or_else(|| {
        ServiceError::Validation("Only Excel files (.xls, .xlsx) are allowed".to_string())
    })?;
    if !format.matches_signature(bytes) {
        return Err(ServiceError::Validation(format!(
            "File content is not a valid .{} workbook",
            format.extension()
        )));
    }
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(WorkbookFormat::from_file_name("a.XLSX"), Some(WorkbookFormat::Xlsx));
        assert_eq!(WorkbookFormat::from_file_name("report.v2.xls"), Some(WorkbookFormat::Xls));
        assert_eq!(WorkbookFormat::from_file_name("data.csv"), None);
        assert_eq!(WorkbookFormat::from_file_name("xlsx"), None);
    }

    #[test]
    fn content_must_match_the_extension() {
        let zip = b"PK\x03\x04rest-of-archive";
        let ole = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0x00];

        assert_eq!(detect_format("a.xlsx", zip).unwrap(), WorkbookFormat::Xlsx);
        assert_eq!(detect_format("a.xls", &ole).unwrap(), WorkbookFormat::Xls);

        // Renamed files are caught.
        assert!(matches!(detect_format("a.xlsx", &ole), Err(ServiceError::Validation(_))));
        assert!(matches!(detect_format("a.xls", zip), Err(ServiceError::Validation(_))));
        assert!(matches!(detect_format("a.xlsx", b""), Err(ServiceError::Validation(_))));
        assert!(matches!(detect_format("notes.txt", zip), Err(ServiceError::Validation(_))));
    }
}
