use crate::core::{MoatError, Result};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Mapper operation kinds, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Add,
    Update,
    UpdateFields,
    Remove,
    FindByUid,
    FindAllUids,
    Count,
}

impl StoreOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::UpdateFields => "updateFields",
            Self::Remove => "remove",
            Self::FindByUid => "findByUid",
            Self::FindAllUids => "findAllUids",
            Self::Count => "count",
        }
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pairs a scheduled request with its eventual answer.
///
/// Renders as `<op>-<uid>`, or `<op>-result` for key-less operations. The
/// sequence number keeps two requests for the same `(op, uid)` apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId {
    op: StoreOp,
    uid: Option<String>,
    seq: u64,
}

impl CorrelationId {
    pub fn new(op: StoreOp, uid: Option<&str>, seq: u64) -> Self {
        Self {
            op,
            uid: uid.map(str::to_string),
            seq,
        }
    }

    pub fn op(&self) -> StoreOp {
        self.op
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.uid {
            Some(uid) => write!(f, "{}-{}", self.op, uid),
            None => write!(f, "{}-result", self.op),
        }
    }
}

/// Handle to the single answer of a scheduled mapper operation.
///
/// Resolves exactly once. The first poll always yields, so the answer is
/// never observed on the turn that scheduled the request. Dropping the
/// handle discards the answer but does not cancel the operation.
pub struct Completion<T> {
    correlation: CorrelationId,
    rx: oneshot::Receiver<Result<T>>,
    yielded: bool,
}

impl<T> Completion<T> {
    /// Create a handle and the sender a provider answers through.
    pub fn channel(correlation: CorrelationId) -> (oneshot::Sender<Result<T>>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                correlation,
                rx,
                yielded: false,
            },
        )
    }

    /// A handle that is already answered; still yields once before resolving.
    pub fn ready(correlation: CorrelationId, result: Result<T>) -> Self {
        let (tx, completion) = Self::channel(correlation);
        let _ = tx.send(result);
        completion
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation
    }

    /// Block the current thread until the answer arrives.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context;
    /// `.await` the handle there instead.
    pub fn wait(self) -> Result<T> {
        let correlation = self.correlation;
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Err(provider_gone(&correlation)))
    }

    /// Deliver the answer to `callback` on a later task, exactly once.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since the callback task
    /// is spawned onto the current one.
    pub fn on_complete<F>(self, callback: F) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: FnOnce(Result<T>) + Send + 'static,
    {
        tokio::spawn(async move { callback(self.await) })
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if !this.yielded {
            this.yielded = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }

        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(provider_gone(&this.correlation))),
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("correlation", &self.correlation.to_string())
            .finish()
    }
}

fn provider_gone(correlation: &CorrelationId) -> MoatError {
    MoatError::ExecutionError(format!(
        "provider stopped before answering {}",
        correlation
    ))
}
