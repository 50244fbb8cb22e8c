use crate::error::{Result, ScriptaError};
use crate::scripta::catalog::{CatalogStore, DocumentRecord};
use crate::scripta::placer::parse_declared_date;

/// Records ordered by `date` ascending; equal dates keep catalog order.
///
/// Lexicographic order is correct only because dates are zero-padded.
pub fn list(records: &[DocumentRecord]) -> Vec<DocumentRecord> {
    let mut out = records.to_vec();
    out.sort_by(|a, b| a.date.cmp(&b.date));
    out
}

/// Case-insensitive substring match over every field, in catalog order.
pub fn search(records: &[DocumentRecord], query: &str) -> Vec<DocumentRecord> {
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|r| {
            r.field_strings()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct FieldUpdates {
    pub description: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    pub recipient: Option<String>,
    pub refnum: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl FieldUpdates {
    pub fn is_empty(&self) -> bool {
        [
            &self.description,
            &self.date,
            &self.author,
            &self.recipient,
            &self.refnum,
        ]
        .into_iter()
        .all(|v| non_empty(v).is_none())
    }

    fn apply(&self, record: &mut DocumentRecord) {
        let targets = [
            (&self.description, &mut record.description),
            (&self.date, &mut record.date),
            (&self.author, &mut record.author),
            (&self.recipient, &mut record.recipient),
            (&self.refnum, &mut record.refnum),
        ];
        for (update, field) in targets {
            if let Some(value) = non_empty(update) {
                *field = value.to_string();
            }
        }
    }
}

/// Applies non-empty updates to the record at `index` and saves the catalog.
/// A new date is validated but the stored file stays where it is.
pub fn edit(store: &CatalogStore, index: u64, updates: &FieldUpdates) -> Result<DocumentRecord> {
    if let Some(date) = non_empty(&updates.date) {
        parse_declared_date(date)?;
    }

    let mut records = store.load()?;
    let record = records
        .iter_mut()
        .find(|r| r.index == index)
        .ok_or(ScriptaError::NotFound { index })?;
    updates.apply(record);
    let updated = record.clone();

    store.save(&records)?;
    Ok(updated)
}
