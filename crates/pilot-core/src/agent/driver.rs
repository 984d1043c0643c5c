use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::wire::ImageSource;

/// What one executed action produced.
///
/// Invalid parameters (an unrecognized key name, an unknown button) come back
/// as `Error` payloads so they can be folded into the conversation for the
/// model to self-correct; the driver never raises them as faults.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultPayload {
    Text(String),
    Image(ImageSource),
    Error(String),
}

impl ResultPayload {
    pub fn is_error(&self) -> bool {
        matches!(self, ResultPayload::Error(_))
    }
}

/// Boundary the session uses to effect input and capture the screen.
///
/// The process-wide input device lives behind this trait; simultaneous calls
/// are permitted and any serialization happens inside the implementation.
pub trait InputDriver: Send + Sync {
    fn capture_screen<'a>(
        &'a self,
        filename: Option<String>,
    ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>>;

    fn press<'a>(&'a self, key: String) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>>;

    fn hold<'a>(
        &'a self,
        key: String,
        duration: Duration,
    ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>>;

    fn move_pointer<'a>(
        &'a self,
        x: i32,
        y: i32,
        duration: Duration,
    ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>>;

    fn click<'a>(
        &'a self,
        button: String,
    ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>>;
}
