// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::{Device, DeviceError};
use std::{
    sync::mpsc::{channel, Sender},
    thread,
};

enum Command {
    Run(Box<dyn FnOnce() + Send>),
    Fence(Sender<()>),
    Shutdown,
}

/// An in-order queue of device work, executed on a dedicated worker thread.
///
/// Commands run in the order they were enqueued.  Nothing that was enqueued is observable on the
/// host until [`Stream::synchronize`] returns.  Dropping the stream finishes the queued work and
/// joins the worker.
pub struct Stream {
    device: Device,
    handle: Option<thread::JoinHandle<()>>,
    tx: Sender<Command>,
}

impl Stream {
    pub fn new(device: &Device) -> Result<Self, DeviceError> {
        let (tx, rx) = channel::<Command>();

        let handle = thread::Builder::new()
            .name("molforce-stream".into())
            .spawn(move || {
                log::debug!("Started stream worker");
                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        Command::Run(f) => f(),
                        Command::Fence(done) => {
                            let _ = done.send(());
                        }
                        Command::Shutdown => break,
                    }
                }
                log::debug!("Stream worker shutting down");
            })
            .map_err(|err| {
                log::error!("Failed to spawn stream worker: {err}");
                DeviceError::StreamClosed
            })?;

        Ok(Self {
            device: device.clone(),
            handle: Some(handle),
            tx,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Queues `f` to run after everything already on the stream.
    pub fn enqueue(&self, f: impl FnOnce() + Send + 'static) -> Result<(), DeviceError> {
        self.tx
            .send(Command::Run(Box::new(f)))
            .map_err(|_| DeviceError::StreamClosed)
    }

    /// Blocks until every command enqueued so far has executed.
    pub fn synchronize(&self) -> Result<(), DeviceError> {
        let (done_tx, done_rx) = channel();
        self.tx
            .send(Command::Fence(done_tx))
            .map_err(|_| DeviceError::StreamClosed)?;
        done_rx.recv().map_err(|_| DeviceError::StreamClosed)
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Stream worker panicked");
            }
        }
    }
}

// End of File
