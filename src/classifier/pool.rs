//! Worker-pool classification on tokio's blocking threads.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{BackendError, ClassificationResult, ClassifyError, SentimentBackend, SentimentClassifier};

type Slot = (usize, Result<ClassificationResult, ClassifyError>);

impl<B> SentimentClassifier<B>
where
    B: SentimentBackend + Send + Sync + 'static,
{
    /// Classifies documents with up to `workers` predictions in flight.
    ///
    /// Results are resequenced by input index, so the output matches
    /// [`classify`](Self::classify) for a deterministic backend. The first
    /// failure aborts the remaining tasks and fails the whole call.
    pub async fn classify_concurrent(
        self: &Arc<Self>,
        documents: Vec<String>,
        workers: usize,
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        if documents.is_empty() {
            return Err(ClassifyError::invalid(
                "must provide a non-empty list of documents",
            ));
        }
        if workers == 0 {
            return Err(ClassifyError::invalid("workers must be greater than 0"));
        }

        let total = documents.len();
        debug!(documents = total, workers, "Classifying documents concurrently");

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks: JoinSet<Slot> = JoinSet::new();
        let mut task_index = HashMap::with_capacity(total);
        let mut slots: Vec<Option<ClassificationResult>> = vec![None; total];

        for (index, document) in documents.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| failure(index, e.to_string()))?;

            let classifier = Arc::clone(self);
            let handle = tasks.spawn_blocking(move || {
                let _permit = permit;
                (index, classifier.classify_document(index, &document))
            });
            task_index.insert(handle.id(), index);

            while let Some(joined) = tasks.try_join_next_with_id() {
                store(&mut tasks, &task_index, &mut slots, joined)?;
            }
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            store(&mut tasks, &task_index, &mut slots, joined)?;
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| failure(index, "worker produced no result".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(results = results.len(), "Concurrent classification complete");

        Ok(results)
    }
}

fn store(
    tasks: &mut JoinSet<Slot>,
    task_index: &HashMap<tokio::task::Id, usize>,
    slots: &mut [Option<ClassificationResult>],
    joined: Result<(tokio::task::Id, Slot), tokio::task::JoinError>,
) -> Result<(), ClassifyError> {
    let outcome = match joined {
        Ok((_, (index, result))) => result.map(|r| (index, r)),
        Err(e) => {
            let index = task_index.get(&e.id()).copied().unwrap_or_default();
            Err(failure(index, format!("worker task failed: {e}")))
        }
    };

    match outcome {
        Ok((index, result)) => {
            slots[index] = Some(result);
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Aborting remaining classification tasks");
            tasks.abort_all();
            Err(e)
        }
    }
}

fn failure(index: usize, reason: String) -> ClassifyError {
    ClassifyError::ClassificationFailure {
        index,
        source: BackendError::Unavailable { reason },
    }
}
