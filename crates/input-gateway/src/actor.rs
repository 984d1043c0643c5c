use std::sync::mpsc;

use anyhow::Context;
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use tracing::debug;

/// One operation against the input device.
#[derive(Debug, Clone, Copy)]
pub(crate) enum InputCommand {
    KeyTap(Key),
    KeyDown(Key),
    KeyUp(Key),
    MouseMoveAbs { x: i32, y: i32 },
    MouseClick(Button),
    MouseLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputReply {
    Done,
    Location(i32, i32),
}

type Request = (InputCommand, tokio::sync::oneshot::Sender<Result<InputReply, String>>);

/// Handle to the dedicated thread that owns the input device.
///
/// The device handle never crosses threads; commands are individual key/mouse
/// events, so a long hold is key-down and key-up around an async sleep and
/// the device thread is never blocked for the duration.
#[derive(Clone)]
pub(crate) struct InputHandle {
    tx: mpsc::Sender<Request>,
}

impl InputHandle {
    pub(crate) async fn submit(&self, command: InputCommand) -> Result<InputReply, String> {
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        self.tx
            .send((command, reply_tx))
            .map_err(|_| "input device thread is gone".to_string())?;
        reply_rx
            .await
            .map_err(|_| "input device thread dropped the request".to_string())?
    }
}

pub(crate) fn spawn_input_thread() -> anyhow::Result<InputHandle> {
    let (tx, rx) = mpsc::channel::<Request>();
    let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

    std::thread::Builder::new()
        .name("input-device".to_string())
        .spawn(move || {
            // The device handle must be created on the thread that will use it.
            let mut enigo = match Enigo::new(&Settings::default()) {
                Ok(enigo) => {
                    let _ = ready_tx.send(Ok(()));
                    enigo
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err.to_string()));
                    return;
                }
            };
            while let Ok((command, reply)) = rx.recv() {
                let _ = reply.send(apply(&mut enigo, command));
            }
            debug!("input device thread shutting down");
        })
        .context("failed to spawn input device thread")?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(InputHandle { tx }),
        Ok(Err(err)) => anyhow::bail!("input device unavailable: {err}"),
        Err(_) => anyhow::bail!("input device thread exited during startup"),
    }
}

fn apply(enigo: &mut Enigo, command: InputCommand) -> Result<InputReply, String> {
    let result = match command {
        InputCommand::KeyTap(key) => enigo.key(key, Direction::Click).map(|_| InputReply::Done),
        InputCommand::KeyDown(key) => enigo.key(key, Direction::Press).map(|_| InputReply::Done),
        InputCommand::KeyUp(key) => enigo.key(key, Direction::Release).map(|_| InputReply::Done),
        InputCommand::MouseMoveAbs { x, y } => enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map(|_| InputReply::Done),
        InputCommand::MouseClick(button) => enigo
            .button(button, Direction::Click)
            .map(|_| InputReply::Done),
        InputCommand::MouseLocation => enigo.location().map(|(x, y)| InputReply::Location(x, y)),
    };
    result.map_err(|err| err.to_string())
}
