//! Upload history reads and the deletion rules behind them.
//!
//! Every operation takes the caller's owner id and refuses to touch records owned by
//! someone else. Deletions run inside one `BEGIN IMMEDIATE` transaction each: the
//! ownership check, the "is this the last sheet?" decision, and the mutation all see
//! the same state, so two concurrent requests against one record cannot both act on
//! a stale sheet list.
//!
//! Deleting the only remaining sheet of a file deletes the file. A record therefore
//! never exists with an empty sheet list, whatever the client believed the sheet list
//! to be when it sent the request.

use crate::error::{ServiceError, ServiceResult};
use crate::store::{self, Store};
use common::model::deletion::DeletionOutcome;
use common::model::file_record::{FileRecord, FileSummary};
use common::model::sheet::SheetData;
use log::info;
use rusqlite::{Connection, TransactionBehavior};

#[derive(Clone)]
pub struct Reconciler {
    store: Store,
}

impl Reconciler {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// All records of `owner_id`, newest first.
    pub fn list_history(&self, owner_id: &str) -> ServiceResult<Vec<FileSummary>> {
        self.store
            .with_conn(|conn| store::list_summaries(conn, owner_id))
    }

    pub fn get_file(&self, owner_id: &str, file_id: &str) -> ServiceResult<FileRecord> {
        self.store.with_conn(|conn| {
            authorize(conn, owner_id, file_id)?;
            store::load_record(conn, file_id)?.ok_or_else(ServiceError::file_not_found)
        })
    }

    pub fn get_sheet(
        &self,
        owner_id: &str,
        file_id: &str,
        sheet_name: &str,
    ) -> ServiceResult<SheetData> {
        self.store.with_conn(|conn| {
            authorize(conn, owner_id, file_id)?;
            let (column_headers, rows) = store::load_sheet(conn, file_id, sheet_name)?
                .ok_or_else(|| ServiceError::sheet_not_found(sheet_name))?;
            Ok(SheetData {
                file_id: file_id.to_string(),
                sheet_name: sheet_name.to_string(),
                column_headers,
                rows,
            })
        })
    }

    /// Removes a record and all of its sheets.
    pub fn request_file_deletion(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> ServiceResult<DeletionOutcome> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            authorize(&tx, owner_id, file_id)?;
            if !store::delete_record(&tx, file_id)? {
                return Err(ServiceError::file_not_found());
            }
            tx.commit()?;
            info!("Owner {} deleted file {}", owner_id, file_id);
            Ok(DeletionOutcome::FileDeleted {
                file_id: file_id.to_string(),
            })
        })
    }

    /// Removes one sheet, or the whole record when `sheet_name` is its last sheet.
    pub fn request_sheet_deletion(
        &self,
        owner_id: &str,
        file_id: &str,
        sheet_name: &str,
    ) -> ServiceResult<DeletionOutcome> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            authorize(&tx, owner_id, file_id)?;

            let sheet_names = store::load_sheet_names(&tx, file_id)?;
            if !sheet_names.iter().any(|name| name == sheet_name) {
                return Err(ServiceError::sheet_not_found(sheet_name));
            }

            if sheet_names.len() == 1 {
                store::delete_record(&tx, file_id)?;
                tx.commit()?;
                info!(
                    "Owner {} deleted last sheet '{}' of file {}; file removed",
                    owner_id, sheet_name, file_id
                );
                return Ok(DeletionOutcome::FileDeleted {
                    file_id: file_id.to_string(),
                });
            }

            store::remove_sheet(&tx, file_id, sheet_name)?;
            let remaining = store::load_sheet_names(&tx, file_id)?;
            tx.commit()?;
            info!(
                "Owner {} deleted sheet '{}' of file {}",
                owner_id, sheet_name, file_id
            );
            Ok(DeletionOutcome::SheetDeleted {
                file_id: file_id.to_string(),
                sheet_names: remaining,
            })
        })
    }
}

/// `NotFound` when the file does not exist, `Forbidden` when it belongs to someone else.
fn authorize(conn: &Connection, owner_id: &str, file_id: &str) -> ServiceResult<()> {
    match store::load_owner(conn, file_id)? {
        None => Err(ServiceError::file_not_found()),
        Some(owner) if owner != owner_id => Err(ServiceError::Forbidden),
        Some(_) => Ok(()),
    }
}
