use crate::scripta::catalog::DocumentRecord;
use std::fs;

const LARGEST_LIMIT: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct CatalogStats {
    pub records: usize,
    pub total_bytes: u64,
    pub largest: Vec<(DocumentRecord, u64)>,
    pub missing: Vec<DocumentRecord>,
}

pub fn collect(records: &[DocumentRecord]) -> CatalogStats {
    let mut sized = Vec::new();
    let mut missing = Vec::new();
    for record in records {
        match fs::metadata(&record.path) {
            Ok(meta) if meta.is_file() => sized.push((record.clone(), meta.len())),
            _ => missing.push(record.clone()),
        }
    }

    let total_bytes = sized.iter().map(|(_, len)| len).sum();
    sized.sort_by(|a, b| b.1.cmp(&a.1));
    sized.truncate(LARGEST_LIMIT);

    CatalogStats {
        records: records.len(),
        total_bytes,
        largest: sized,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripta::catalog::sample_record;
    use tempfile::tempdir;

    #[test]
    fn stats_rank_by_size_and_report_missing() {
        let tmp = tempdir().expect("tempdir");
        let mut records = Vec::new();
        for i in 1..=7u64 {
            let mut record = sample_record(i, &format!("d{i}"));
            let path = tmp.path().join(format!("f{i}"));
            if i != 4 {
                fs::write(&path, "x".repeat(i as usize * 10)).expect("write");
            }
            record.path = path.display().to_string();
            records.push(record);
        }

        let stats = collect(&records);
        assert_eq!(stats.records, 7);
        assert_eq!(stats.total_bytes, (1 + 2 + 3 + 5 + 6 + 7) * 10);
        let order: Vec<u64> = stats.largest.iter().map(|(r, _)| r.index).collect();
        assert_eq!(order, vec![7, 6, 5, 3, 2]);
        assert_eq!(stats.missing.len(), 1);
        assert_eq!(stats.missing[0].index, 4);
    }
}
