//! CSV import pipeline
//!
//! Parses a file, then creates or reuses one coffee per row inside a single
//! transaction. Any failing row rolls back the whole file.

use crate::errors::ImportError;
use crate::parser::parse_csv;
use beans_common::db::models::Coffee;
use beans_common::db::{Repository, UserScope};
use beans_common::metrics;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Counts reported back to the uploader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub created: usize,
    pub reused: usize,
}

impl std::fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} rows: {} new coffees, {} already known",
            self.rows, self.created, self.reused
        )
    }
}

/// Result of a successful import
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Coffees touched, in row order
    pub coffees: Vec<Coffee>,
    pub summary: ImportSummary,
}

/// CSV importer
pub struct CsvImporter {
    repository: Repository,
}

impl CsvImporter {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Import a `;`-delimited file for a user
    #[instrument(skip(self, data), fields(user_id = %user_id, bytes = data.len()))]
    pub async fn import(&self, user_id: Uuid, data: &[u8]) -> Result<ImportOutcome, ImportError> {
        let start = Instant::now();
        let result = self.run(user_id, data).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(outcome) => {
                metrics::record_import(elapsed, outcome.summary.rows, true);
                info!(
                    rows = outcome.summary.rows,
                    created = outcome.summary.created,
                    reused = outcome.summary.reused,
                    "CSV import complete"
                );
            }
            Err(e) => {
                metrics::record_import(elapsed, 0, false);
                warn!(error = %e, row = ?e.row(), "CSV import rejected");
            }
        }

        result
    }

    async fn run(&self, user_id: Uuid, data: &[u8]) -> Result<ImportOutcome, ImportError> {
        let rows = parse_csv(data)?;

        let txn = self.repository.begin().await?;
        let scope = UserScope::new(&txn, user_id);

        let mut coffees = Vec::with_capacity(rows.len());
        let mut summary = ImportSummary {
            rows: rows.len(),
            ..ImportSummary::default()
        };

        for new in &rows {
            let (coffee, created) = scope.upsert_coffee(new).await?;
            if created {
                summary.created += 1;
            } else {
                summary.reused += 1;
            }
            coffees.push(coffee);
        }

        txn.commit().await.map_err(beans_common::AppError::from)?;

        Ok(ImportOutcome { coffees, summary })
    }
}
