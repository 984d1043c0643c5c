use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use super::catalog::ActionCall;
use super::driver::{InputDriver, ResultPayload};
use super::wire::ContentBlock;

#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Deadline for every worker, measured from batch start. A worker that
    /// misses it is abandoned (not killed) and contributes no result.
    pub worker_timeout: Duration,
    /// Admission bound on concurrently running workers.
    pub max_workers: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_timeout: Duration::from_secs(10),
            max_workers: 4,
        }
    }
}

/// A validated invocation ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub id: String,
    pub call: ActionCall,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub id: String,
    pub payload: ResultPayload,
}

impl ExecutionResult {
    /// The tool-result block fed back to the model for this execution.
    pub fn into_block(self) -> ContentBlock {
        let (content, is_error) = match self.payload {
            ResultPayload::Text(text) => (vec![ContentBlock::text(text)], false),
            ResultPayload::Image(source) => (vec![ContentBlock::Image { source }], false),
            ResultPayload::Error(text) => (vec![ContentBlock::text(text)], true),
        };
        ContentBlock::ToolResult {
            tool_use_id: self.id,
            content,
            is_error,
        }
    }
}

async fn run_action(driver: &dyn InputDriver, call: ActionCall) -> ResultPayload {
    match call {
        ActionCall::TakeScreenshot(args) => driver.capture_screen(args.filename).await,
        ActionCall::PressKey(args) => driver.press(args.key).await,
        ActionCall::HoldKey(args) => {
            driver
                .hold(args.key, Duration::from_secs_f64(args.duration))
                .await
        }
        ActionCall::MoveMouse(args) => {
            driver
                .move_pointer(args.x, args.y, Duration::from_secs_f64(args.duration))
                .await
        }
        ActionCall::ClickMouse(args) => driver.click(args.button).await,
        // Control actions are applied by the session, never dispatched.
        other => ResultPayload::Error(format!("not a driver action: {other:?}")),
    }
}

/// Executes one validated batch with bounded parallelism.
///
/// Every invocation runs on its own task; results land in a shared
/// append-only accumulator in completion order, correlated by id. The next
/// batch must not start until this call returns: all workers have either
/// finished or been abandoned at the deadline.
pub async fn execute_batch(
    driver: Arc<dyn InputDriver>,
    batch: Vec<ActionRequest>,
    config: &DispatchConfig,
) -> Vec<ExecutionResult> {
    if batch.is_empty() {
        return Vec::new();
    }

    let deadline = Instant::now() + config.worker_timeout;
    let results = Arc::new(Mutex::new(Vec::with_capacity(batch.len())));
    let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));

    let mut handles = Vec::with_capacity(batch.len());
    for request in batch {
        let driver = Arc::clone(&driver);
        let results = Arc::clone(&results);
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let _permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            debug!(id = %request.id, "executing tool invocation");
            let payload = run_action(driver.as_ref(), request.call).await;
            results.lock().await.push(ExecutionResult {
                id: request.id,
                payload,
            });
        }));
    }

    for handle in handles {
        match timeout_at(deadline, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(join_err)) => warn!(error = %join_err, "tool worker failed to join"),
            // Abandoned: the task keeps running but its result (if any) is
            // dropped. Absence of the correlation id is the timeout signal.
            Err(_) => warn!("tool worker missed its deadline; abandoned"),
        }
    }

    let collected = results.lock().await.clone();
    collected
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::agent::catalog::{HoldKeyArgs, PressKeyArgs};

    /// Driver that records calls and simulates `hold` by sleeping for the
    /// requested duration.
    #[derive(Default)]
    struct FakeDriver {
        calls: StdMutex<Vec<String>>,
        executed: AtomicUsize,
    }

    impl FakeDriver {
        fn record(&self, what: String) {
            self.executed.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push(what);
        }

        fn executed(&self) -> usize {
            self.executed.load(Ordering::SeqCst)
        }
    }

    impl InputDriver for FakeDriver {
        fn capture_screen<'a>(
            &'a self,
            _filename: Option<String>,
        ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>> {
            Box::pin(async move {
                self.record("capture".to_string());
                ResultPayload::Image(crate::agent::wire::ImageSource::png_base64("aGk="))
            })
        }

        fn press<'a>(
            &'a self,
            key: String,
        ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>> {
            Box::pin(async move {
                self.record(format!("press:{key}"));
                ResultPayload::Text(format!("Pressed key: {key}"))
            })
        }

        fn hold<'a>(
            &'a self,
            key: String,
            duration: Duration,
        ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>> {
            Box::pin(async move {
                tokio::time::sleep(duration).await;
                self.record(format!("hold:{key}"));
                ResultPayload::Text(format!("Held key: {key}"))
            })
        }

        fn move_pointer<'a>(
            &'a self,
            x: i32,
            y: i32,
            _duration: Duration,
        ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>> {
            Box::pin(async move {
                self.record(format!("move:{x},{y}"));
                ResultPayload::Text(format!("Moved mouse to: {x}, {y}"))
            })
        }

        fn click<'a>(
            &'a self,
            button: String,
        ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>> {
            Box::pin(async move {
                self.record(format!("click:{button}"));
                ResultPayload::Text(format!("Clicked mouse button: {button}"))
            })
        }
    }

    fn press(id: &str, key: &str) -> ActionRequest {
        ActionRequest {
            id: id.to_string(),
            call: ActionCall::PressKey(PressKeyArgs {
                key: key.to_string(),
            }),
        }
    }

    fn hold(id: &str, key: &str, duration: f64) -> ActionRequest {
        ActionRequest {
            id: id.to_string(),
            call: ActionCall::HoldKey(HoldKeyArgs {
                key: key.to_string(),
                duration,
            }),
        }
    }

    #[tokio::test]
    async fn batch_collects_every_result_by_id() {
        let driver = Arc::new(FakeDriver::default());
        let results = execute_batch(
            driver.clone(),
            vec![press("tu_1", "w"), press("tu_2", "a"), press("tu_3", "d")],
            &DispatchConfig::default(),
        )
        .await;

        assert_eq!(results.len(), 3);
        let mut ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["tu_1", "tu_2", "tu_3"]);
        assert_eq!(driver.executed(), 3);
    }

    #[tokio::test]
    async fn slow_worker_is_abandoned_while_siblings_complete() {
        let driver = Arc::new(FakeDriver::default());
        let config = DispatchConfig {
            worker_timeout: Duration::from_millis(100),
            max_workers: 4,
        };
        // The hold's nominal duration exceeds the worker timeout.
        let results = execute_batch(
            driver.clone(),
            vec![press("tu_1", "w"), hold("tu_2", "s", 5.0), press("tu_3", "d")],
            &config,
        )
        .await;

        let mut ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["tu_1", "tu_3"]);
    }

    #[tokio::test]
    async fn admission_bound_still_completes_large_batches() {
        let driver = Arc::new(FakeDriver::default());
        let config = DispatchConfig {
            worker_timeout: Duration::from_secs(10),
            max_workers: 2,
        };
        let batch: Vec<ActionRequest> = (0..9).map(|n| press(&format!("tu_{n}"), "w")).collect();
        let results = execute_batch(driver.clone(), batch, &config).await;
        assert_eq!(results.len(), 9);
        assert_eq!(driver.executed(), 9);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let driver = Arc::new(FakeDriver::default());
        let results = execute_batch(driver.clone(), vec![], &DispatchConfig::default()).await;
        assert!(results.is_empty());
        assert_eq!(driver.executed(), 0);
    }

    #[test]
    fn error_payload_becomes_error_block() {
        let result = ExecutionResult {
            id: "tu_1".to_string(),
            payload: ResultPayload::Error("unrecognized key: 'warp'".to_string()),
        };
        match result.into_block() {
            ContentBlock::ToolResult {
                tool_use_id,
                is_error,
                ..
            } => {
                assert_eq!(tool_use_id, "tu_1");
                assert!(is_error);
            }
            other => panic!("expected tool_result, got {other:?}"),
        }
    }
}
