use super::blocking;
use crate::auth::AuthenticatedOwner;
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::error::{ServiceError, ServiceResult};
use crate::store::{NewRecord, Store};
use crate::workbook::{self, WorkbookFormat};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::responses::UploadResponse;
use futures_util::StreamExt;
use log::{info, warn};

/// Multipart field names that may carry the spreadsheet.
const FILE_FIELDS: [&str; 2] = ["excelFile", "file"];

/// Upper bound on the size of one uploaded file.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

struct UploadedFile {
    file_name: String,
    bytes: Vec<u8>,
}

/// HTTP handler for `POST /api/upload`.
///
/// - On success: `201 Created` with the summary of the new record.
/// - On failure: the error's status (400 for a rejected file, 422 when the workbook
///   cannot be read).
pub(crate) async fn process(
    owner: AuthenticatedOwner,
    store: web::Data<Store>,
    limits: web::Data<UploadLimits>,
    payload: Multipart,
) -> ServiceResult<HttpResponse> {
    let upload = match read_upload(payload, *limits.get_ref()).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("Upload by {} rejected: {}", owner.id(), e);
            return Err(e);
        }
    };

    let format = workbook::detect_format(&upload.file_name, &upload.bytes)?;
    let content_md5 = format!("{:x}", md5::compute(&upload.bytes));
    let size = upload.bytes.len();

    let sheets = blocking(move || workbook::parse_workbook(format, upload.bytes)).await?;

    let new_record = NewRecord {
        owner_id: owner.id().to_string(),
        original_file_name: upload.file_name,
        content_md5,
        sheets,
    };
    let record = blocking(move || store.create_record(new_record)).await?;

    info!(
        "Owner {} uploaded '{}' ({} bytes, {} sheets) as {}",
        record.owner_id,
        record.original_file_name,
        size,
        record.sheet_names.len(),
        record.id
    );

    Ok(HttpResponse::Created().json(UploadResponse {
        message: "File uploaded and parsed successfully".to_string(),
        file: record.summary(),
    }))
}

/// Reads the spreadsheet part of the multipart body into memory.
///
/// The extension is checked as soon as the part's headers arrive, before any of its
/// bytes are buffered, and reading stops once the size limit is exceeded.
async fn read_upload(mut payload: Multipart, limits: UploadLimits) -> ServiceResult<UploadedFile> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match field_name.as_deref() {
            Some(name) if FILE_FIELDS.contains(&name) => {
                if upload.is_some() {
                    return Err(ServiceError::Validation(
                        "Only one file can be uploaded at a time".to_string(),
                    ));
                }

                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(display_name))
                    .unwrap_or_default();

                if WorkbookFormat::from_file_name(&file_name).is_none() {
                    return Err(ServiceError::Validation(
                        "Only Excel files (.xls, .xlsx) are allowed".to_string(),
                    ));
                }

                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(malformed)?;
                    if bytes.len() + chunk.len() > limits.max_file_bytes {
                        return Err(ServiceError::Validation(format!(
                            "File is larger than the {} byte limit",
                            limits.max_file_bytes
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                upload = Some(UploadedFile { file_name, bytes });
            }

            _ => {}
        }
    }

    upload.ok_or_else(|| ServiceError::Validation("No file uploaded".to_string()))
}

fn malformed(err: impl std::fmt::Display) -> ServiceError {
    ServiceError::Validation(format!("Malformed upload: {}", err))
}

/// Last path component of a client supplied file name.
fn display_name(raw: &str) -> String {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::display_name;

    #[test]
    fn client_paths_are_stripped() {
        assert_eq!(display_name("C:\\Users\\me\\q1.xlsx"), "q1.xlsx");
        assert_eq!(display_name("reports/2024/q1.xls"), "q1.xls");
        assert_eq!(display_name("plain.xlsx"), "plain.xlsx");
    }
}
