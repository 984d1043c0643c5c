use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

use screen_pilot_core::agent::driver::{InputDriver, ResultPayload};
use screen_pilot_core::agent::wire::ImageSource;

use crate::actor::{InputCommand, InputHandle, InputReply, spawn_input_thread};
use crate::capture;
use crate::keys;

const DEFAULT_SCREENSHOT_NAME: &str = "screenshot.png";
/// Pointer glides are stepped; one step roughly every 15 ms.
const GLIDE_STEP_MS: u64 = 15;
const MAX_GLIDE_STEPS: u32 = 60;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Directory where requested screenshots are saved.
    pub output_dir: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
        }
    }
}

/// The process-wide input driver: a dedicated thread owns the OS input
/// device, screen capture runs on the blocking pool. Validation failures
/// (unknown key or button) come back as error payloads, never as faults.
pub struct EnigoGateway {
    input: InputHandle,
    output_dir: PathBuf,
}

impl EnigoGateway {
    /// Opens the input device. Failure here (no display, missing permissions)
    /// is a configuration error and should abort startup.
    pub fn open(config: GatewayConfig) -> anyhow::Result<Self> {
        let input = spawn_input_thread()?;
        Ok(Self {
            input,
            output_dir: config.output_dir,
        })
    }

    async fn glide_pointer(&self, x: i32, y: i32, duration: Duration) -> Result<(), String> {
        let start = match self.input.submit(InputCommand::MouseLocation).await {
            Ok(InputReply::Location(sx, sy)) => Some((sx, sy)),
            // Without a start position there is nothing to interpolate from.
            _ => None,
        };

        let Some((sx, sy)) = start else {
            tokio::time::sleep(duration).await;
            self.input
                .submit(InputCommand::MouseMoveAbs { x, y })
                .await?;
            return Ok(());
        };

        let steps = ((duration.as_millis() as u64 / GLIDE_STEP_MS).max(2) as u32)
            .min(MAX_GLIDE_STEPS);
        let pause = duration / steps;
        for step in 1..=steps {
            let t = f64::from(step) / f64::from(steps);
            let ix = sx + ((f64::from(x - sx)) * t).round() as i32;
            let iy = sy + ((f64::from(y - sy)) * t).round() as i32;
            tokio::time::sleep(pause).await;
            self.input
                .submit(InputCommand::MouseMoveAbs { x: ix, y: iy })
                .await?;
        }
        Ok(())
    }
}

impl InputDriver for EnigoGateway {
    fn capture_screen<'a>(
        &'a self,
        filename: Option<String>,
    ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>> {
        Box::pin(async move {
            let png = match tokio::task::spawn_blocking(capture::capture_primary_png).await {
                Ok(Ok(png)) => png,
                Ok(Err(err)) => return ResultPayload::Error(format!("screenshot failed: {err:#}")),
                Err(err) => return ResultPayload::Error(format!("screenshot worker died: {err}")),
            };

            let file_name = filename
                .as_deref()
                .and_then(capture::sanitize_filename)
                .unwrap_or_else(|| DEFAULT_SCREENSHOT_NAME.to_string());
            match capture::save_png(&self.output_dir, &file_name, &png) {
                Ok(path) => debug!(path = %path.display(), bytes = png.len(), "screenshot saved"),
                Err(err) => warn!("could not save screenshot copy: {err:#}"),
            }

            ResultPayload::Image(ImageSource::png_base64(BASE64.encode(&png)))
        })
    }

    fn press<'a>(
        &'a self,
        key: String,
    ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>> {
        Box::pin(async move {
            let Some(parsed) = keys::parse_key(&key) else {
                return ResultPayload::Error(format!("unrecognized key: '{key}'"));
            };
            match self.input.submit(InputCommand::KeyTap(parsed)).await {
                Ok(_) => ResultPayload::Text(format!("Pressed key: {key}")),
                Err(err) => ResultPayload::Error(format!("press '{key}' failed: {err}")),
            }
        })
    }

    fn hold<'a>(
        &'a self,
        key: String,
        duration: Duration,
    ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>> {
        Box::pin(async move {
            let Some(parsed) = keys::parse_key(&key) else {
                return ResultPayload::Error(format!("unrecognized key: '{key}'"));
            };
            if let Err(err) = self.input.submit(InputCommand::KeyDown(parsed)).await {
                return ResultPayload::Error(format!("hold '{key}' failed: {err}"));
            }
            tokio::time::sleep(duration).await;
            match self.input.submit(InputCommand::KeyUp(parsed)).await {
                Ok(_) => ResultPayload::Text(format!(
                    "Held key '{key}' for {:.2} seconds",
                    duration.as_secs_f64()
                )),
                Err(err) => {
                    ResultPayload::Error(format!("held '{key}' but release failed: {err}"))
                }
            }
        })
    }

    fn move_pointer<'a>(
        &'a self,
        x: i32,
        y: i32,
        duration: Duration,
    ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>> {
        Box::pin(async move {
            let result = if duration.is_zero() {
                self.input.submit(InputCommand::MouseMoveAbs { x, y }).await.map(|_| ())
            } else {
                self.glide_pointer(x, y, duration).await
            };
            match result {
                Ok(()) => ResultPayload::Text(format!("Moved mouse to: {x}, {y}")),
                Err(err) => ResultPayload::Error(format!("move mouse failed: {err}")),
            }
        })
    }

    fn click<'a>(
        &'a self,
        button: String,
    ) -> Pin<Box<dyn Future<Output = ResultPayload> + Send + 'a>> {
        Box::pin(async move {
            let Some(parsed) = keys::parse_button(&button) else {
                return ResultPayload::Error(format!(
                    "unrecognized mouse button: '{button}' (expected left, right, or middle)"
                ));
            };
            match self.input.submit(InputCommand::MouseClick(parsed)).await {
                Ok(_) => ResultPayload::Text(format!("Clicked mouse button: {button}")),
                Err(err) => ResultPayload::Error(format!("click '{button}' failed: {err}")),
            }
        })
    }
}
