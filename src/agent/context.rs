use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::callbacks::CallbackManager;

/// Per-run state threaded through planning and tool calls.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub cancel: CancellationToken,
    /// Handlers tagged with `run_id`.
    pub callbacks: CallbackManager,
}

impl RunContext {
    pub fn new(cancel: CancellationToken, callbacks: &CallbackManager) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            run_id,
            cancel,
            callbacks: callbacks.for_run(run_id),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(CancellationToken::new(), &CallbackManager::default())
    }
}
