//! Index many symbol files with a bounded number in flight.
//!
//! Every symbol file runs on the blocking pool; a failure (or panic) in one
//! is recorded against its path and never stops the others.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::linker::{link_symbol_file, LinkOptions, SymbolFileJob};
use crate::provider::Provider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSymbolFile {
    pub pdb_path: PathBuf,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub attempted: usize,
    /// Failed symbol files, in completion order.
    pub failed: Vec<FailedSymbolFile>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Link every job with up to `max_concurrent` symbol files at once.
pub async fn link_all(
    jobs: Vec<SymbolFileJob>,
    provider: Arc<Provider>,
    revision: Arc<str>,
    options: Arc<LinkOptions>,
    max_concurrent: usize,
) -> BatchSummary {
    let max_concurrent = max_concurrent.max(1);
    let mut summary = BatchSummary::default();
    let mut pending = jobs.into_iter();
    let mut join_set = JoinSet::new();

    loop {
        while join_set.len() < max_concurrent {
            let Some(job) = pending.next() else {
                break;
            };
            summary.attempted += 1;
            let provider = Arc::clone(&provider);
            let revision = Arc::clone(&revision);
            let options = Arc::clone(&options);
            join_set.spawn(async move {
                let pdb_path = job.pdb_path.clone();
                let result = tokio::task::spawn_blocking(move || {
                    link_symbol_file(&job, &provider, &revision, &options)
                })
                .await;
                let outcome = match result {
                    Ok(Ok(outcome)) => Ok(outcome),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(e) => Err(format!("symbol file task: {}", e)),
                };
                (pdb_path, outcome)
            });
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok((_, Ok(outcome))) => {
                tracing::debug!(
                    "indexed {} file(s) into {}",
                    outcome.indexed_files,
                    outcome.srcsrv_path.display()
                );
            }
            Ok((pdb_path, Err(error))) => {
                tracing::error!(
                    "an error occurred while processing pdb '{}': {}",
                    pdb_path.display(),
                    error
                );
                summary.failed.push(FailedSymbolFile { pdb_path, error });
            }
            Err(e) => {
                tracing::error!("symbol file task join: {}", e);
                summary.failed.push(FailedSymbolFile {
                    pdb_path: PathBuf::new(),
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "all pdbs are done. {} of {} succeeded",
        summary.succeeded(),
        summary.attempted
    );
    summary
}
