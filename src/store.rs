//! Upstream collaborators the engine consumes but never reimplements:
//! the relational store holding imported tables and message templates,
//! and the spreadsheet reader feeding them. The engine calls these as
//! opaque services and takes no part in their schema decisions.

use async_trait::async_trait;

use crate::errors::{PilotError, PilotResult};
use crate::model::Contact;

/// Opaque handle to one imported table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub unique_name: String,
}

pub type Row = Vec<String>;

/// Relational store for imported contact/message tables.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn create_table(&self, title: &str, headers: &[String]) -> PilotResult<TableRef>;
    async fn insert_rows(&self, table: &TableRef, rows: &[Row]) -> PilotResult<()>;
    async fn row(&self, table: &TableRef, id: u64) -> PilotResult<Option<Row>>;
    async fn update_row(&self, table: &TableRef, id: u64, row: Row) -> PilotResult<()>;
    async fn delete_row(&self, table: &TableRef, id: u64) -> PilotResult<()>;
}

/// A parsed sheet: header row plus data rows.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// Spreadsheet/CSV reader; parsing and column sanitization live behind
/// this seam.
pub trait SheetReader: Send + Sync {
    fn read(&self, path: &std::path::Path) -> PilotResult<Sheet>;
}

const CONTACT_HEADERS: [&str; 2] = ["new_name", "new_phone"];

/// A sheet is a contact-import sheet exactly when it carries the
/// two-column `new_name`/`new_phone` header convention.
pub fn is_contact_sheet(sheet: &Sheet) -> bool {
    sheet.headers.len() == CONTACT_HEADERS.len()
        && sheet
            .headers
            .iter()
            .zip(CONTACT_HEADERS)
            .all(|(have, want)| have == want)
}

/// Maps a contact-import sheet to a batch of contacts, in row order.
pub fn contacts_from_sheet(sheet: &Sheet) -> PilotResult<Vec<Contact>> {
    if !is_contact_sheet(sheet) {
        return Err(PilotError::InvalidItem(format!(
            "not a contact sheet: headers {:?}",
            sheet.headers
        )));
    }
    Ok(sheet
        .rows
        .iter()
        .map(|row| {
            let name = row.first().cloned().unwrap_or_default();
            let phone = row.get(1).cloned().unwrap_or_default();
            Contact::new(name, phone)
        })
        .collect())
}
