use crate::ai::Generator;
use crate::error::GenerationError;
use crate::generation::{GenerationEvent, PartialSink, Ticket};
use crate::logger;
use crate::models::{SourceDocument, TargetSchema};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Spawns generation requests onto the runtime and routes their events to the UI loop.
#[derive(Clone)]
pub struct GenerationLauncher {
    runtime: Handle,
    generator: Arc<dyn Generator>,
    tx: UnboundedSender<GenerationEvent>,
    timeout: Duration,
}

impl GenerationLauncher {
    pub fn new(
        runtime: Handle,
        generator: Arc<dyn Generator>,
        tx: UnboundedSender<GenerationEvent>,
        timeout: Duration,
    ) -> Self {
        Self {
            runtime,
            generator,
            tx,
            timeout,
        }
    }

    pub fn launch(
        &self,
        ticket: Ticket,
        document: SourceDocument,
        schema: TargetSchema,
    ) -> JoinHandle<()> {
        let sink = PartialSink::new(ticket, self.tx.clone());
        self.runtime.spawn(spawn_generation(
            Arc::clone(&self.generator),
            document,
            schema,
            sink,
            self.timeout,
        ))
    }
}

pub async fn spawn_generation(
    generator: Arc<dyn Generator>,
    document: SourceDocument,
    schema: TargetSchema,
    sink: PartialSink,
    timeout: Duration,
) {
    logger::log(&format!(
        "Worker starting {} generation {:?}",
        schema.noun(),
        sink.ticket()
    ));

    let result = match tokio::time::timeout(timeout, generator.generate(&document, schema, &sink)).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::TimedOut(timeout)),
    };

    match &result {
        Ok(items) => logger::log(&format!(
            "Worker finished {:?} with {} items",
            sink.ticket(),
            items.len()
        )),
        Err(e) => logger::log(&format!("Worker error for {:?}: {}", sink.ticket(), e)),
    }

    sink.finish(result);
}
