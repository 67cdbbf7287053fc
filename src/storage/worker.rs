use super::table::StoreTable;
use crate::core::{MoatError, Result};
use crate::model::Entity;
use crate::provider::CorrelationId;
use lazy_static::lazy_static;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{Level, event, info_span};

type Reply<T> = oneshot::Sender<Result<T>>;

/// A table operation waiting for the store worker.
pub(crate) enum StoreRequest {
    Add {
        entity: Entity,
        reply: Reply<Entity>,
    },
    Update {
        entity: Entity,
        reply: Reply<Entity>,
    },
    UpdateFields {
        entity: Entity,
        fields: Vec<String>,
        reply: Reply<(Entity, Vec<String>)>,
    },
    Remove {
        uid: String,
        reply: Reply<Entity>,
    },
    FindByUid {
        uid: String,
        reply: Reply<Entity>,
    },
    FindAllUids {
        reply: Reply<Vec<String>>,
    },
    Count {
        reply: Reply<usize>,
    },
}

pub(crate) struct StoreEnvelope {
    pub correlation: CorrelationId,
    pub request: StoreRequest,
}

/// Single owner of a store table.
///
/// Requests are applied one at a time in the order they were submitted.
/// The task exits once every sender is gone.
pub struct StoreWorker {
    tx: Option<mpsc::UnboundedSender<StoreEnvelope>>,
    join_handle: Option<JoinHandle<()>>,
}

// Hosts store tasks for mappers built outside any tokio runtime
lazy_static! {
    static ref FALLBACK_RUNTIME: Option<Runtime> = Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("moat-store")
        .enable_all()
        .build()
        .ok();
}

impl StoreWorker {
    pub(crate) fn submit(&self, envelope: StoreEnvelope) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| MoatError::ExecutionError("store worker stopped".to_string()))?;
        tx.send(envelope).map_err(|err| {
            MoatError::ExecutionError(format!(
                "store worker stopped before accepting {}",
                err.0.correlation
            ))
        })
    }

    /// Stop accepting requests and wait for the pending ones to finish.
    pub async fn stop(mut self) -> Result<()> {
        self.tx.take();
        if let Some(join_handle) = self.join_handle.take() {
            join_handle
                .await
                .map_err(|err| MoatError::ExecutionError(format!("store worker join: {}", err)))?;
        }
        Ok(())
    }
}

impl Drop for StoreWorker {
    fn drop(&mut self) {
        // Closing the channel lets the task drain its queue and finish.
        self.tx.take();
        self.join_handle.take();
    }
}

fn runtime_handle() -> Result<Handle> {
    if let Ok(handle) = Handle::try_current() {
        return Ok(handle);
    }
    FALLBACK_RUNTIME
        .as_ref()
        .map(|runtime| runtime.handle().clone())
        .ok_or_else(|| MoatError::ExecutionError("store runtime unavailable".to_string()))
}

/// Spawn the task that owns a fresh table of `max_size` records.
///
/// The task runs on the current tokio runtime, or on a small shared runtime
/// when called from plain threads.
pub fn spawn_store_worker(model: &str, max_size: usize) -> Result<StoreWorker> {
    let (tx, mut rx) = mpsc::unbounded_channel::<StoreEnvelope>();
    let model_name = model.to_string();

    let join_handle = runtime_handle()?.spawn(async move {
        let mut table = StoreTable::new(max_size);
        while let Some(envelope) = rx.recv().await {
            let span = info_span!(
                "store.request",
                model = %model_name,
                correlation = %envelope.correlation,
                seq = envelope.correlation.seq()
            );
            let _enter = span.enter();
            apply(&mut table, envelope.request);
        }
        event!(Level::DEBUG, model = %model_name, "store worker stopped");
    });

    Ok(StoreWorker {
        tx: Some(tx),
        join_handle: Some(join_handle),
    })
}

fn apply(table: &mut StoreTable, request: StoreRequest) {
    match request {
        StoreRequest::Add { entity, reply } => answer(reply, table.insert(entity)),
        StoreRequest::Update { entity, reply } => answer(reply, table.replace(entity)),
        StoreRequest::UpdateFields {
            entity,
            fields,
            reply,
        } => {
            let result = table
                .update_fields(&entity, &fields)
                .map(|updated| (updated, fields));
            answer(reply, result)
        }
        StoreRequest::Remove { uid, reply } => answer(reply, table.remove(&uid)),
        StoreRequest::FindByUid { uid, reply } => answer(reply, table.get(&uid)),
        StoreRequest::FindAllUids { reply } => answer(reply, Ok(table.uids())),
        StoreRequest::Count { reply } => answer(reply, Ok(table.len())),
    }
}

fn answer<T>(reply: Reply<T>, result: Result<T>) {
    match &result {
        Ok(_) => event!(Level::TRACE, "store request applied"),
        Err(err) => event!(Level::DEBUG, error = %err, "store request rejected"),
    }
    // The caller may have dropped its completion; the effect stands regardless.
    let _ = reply.send(result);
}
