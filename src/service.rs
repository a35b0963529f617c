//! Async-friendly pipeline facade.
//!
//! A dedicated worker thread owns the synchronous [`Pipeline`] and executes
//! commands sent from async tasks, so servers can embed chart generation
//! without the pipeline types needing to be `Send` across await points.
//! Callers wanting cancellation wrap calls in `tokio::time::timeout`; an
//! abandoned call finishes on the worker and its scoped browser session is
//! still torn down.

use std::sync::mpsc::{self, Sender};
use std::thread;

use tokio::sync::oneshot;

use crate::pipeline::{ChartRequest, DocumentSource, Pipeline};
use crate::template::TemplateStore;
use crate::{Error, RenderConfig, Result};

enum Command {
    Generate(ChartRequest, oneshot::Sender<Vec<u8>>),
    ListTemplates(oneshot::Sender<Vec<String>>),
    Close(oneshot::Sender<()>),
}

/// Handle to a worker-thread-backed chart pipeline.
#[derive(Clone)]
pub struct ChartService {
    cmd_tx: Sender<Command>,
}

impl ChartService {
    /// Spawn the worker and return a handle to it.
    pub fn new(
        store: TemplateStore,
        config: RenderConfig,
        source: Box<dyn DocumentSource>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

        thread::spawn(move || {
            let pipeline = Pipeline::new(store, config);

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Generate(request, resp) => {
                        let _ = resp.send(pipeline.generate(&request, source.as_ref()));
                    }
                    Command::ListTemplates(resp) => {
                        let _ = resp.send(pipeline.list_templates());
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(());
                        break;
                    }
                }
            }
        });

        Self { cmd_tx }
    }

    /// Generate a chart image. The returned bytes are always a valid PNG;
    /// only a dead worker surfaces as an error.
    pub async fn generate(&self, request: ChartRequest) -> Result<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Generate(request, tx))
            .map_err(|_| Error::Other("Chart service worker is gone".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Generate canceled: {}", e)))
    }

    /// List the available style template names.
    pub async fn list_templates(&self) -> Result<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ListTemplates(tx))
            .map_err(|_| Error::Other("Chart service worker is gone".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("ListTemplates canceled: {}", e)))
    }

    /// Shut the worker down.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Close(tx))
            .map_err(|_| Error::Other("Chart service worker is gone".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))
    }
}
