use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use mapsy_common::{CallbackPayload, ExtractionRequest, PipelineResult, ScrapeError};

use crate::callback::CallbackSender;
use crate::extractor::PlaceNameExtractor;
use crate::resolver::PlaceResolver;
use crate::scraper::ScraperSet;

// --- Stages ---

/// `Received → Scraping → Extracting → Resolving → Assembling → Delivered`.
/// `Failed` is reachable from `Scraping` only; later stages degrade instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Scraping,
    Extracting,
    Resolving,
    Assembling,
    Delivered,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Scraping => "scraping",
            Stage::Extracting => "extracting",
            Stage::Resolving => "resolving",
            Stage::Assembling => "assembling",
            Stage::Delivered => "delivered",
            Stage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a run did. `delivered` is whether the callback receiver accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub content_id: Uuid,
    pub final_stage: Stage,
    pub delivered: bool,
}

// --- Orchestrator ---

#[derive(Clone)]
pub struct Orchestrator {
    scrapers: ScraperSet,
    extractor: PlaceNameExtractor,
    resolver: PlaceResolver,
    callback: Arc<dyn CallbackSender>,
}

impl Orchestrator {
    pub fn new(
        scrapers: ScraperSet,
        extractor: PlaceNameExtractor,
        resolver: PlaceResolver,
        callback: Arc<dyn CallbackSender>,
    ) -> Self {
        Self {
            scrapers,
            extractor,
            resolver,
            callback,
        }
    }

    pub fn scrapers(&self) -> &ScraperSet {
        &self.scrapers
    }

    /// Run the pipeline and send exactly one callback, whatever happens inside.
    pub async fn run(&self, request: ExtractionRequest) -> RunReport {
        let content_id = request.content_id;
        transition(content_id, Stage::Received);

        let outcome = AssertUnwindSafe(self.execute(&request)).catch_unwind().await;

        let (payload, final_stage) = match outcome {
            Ok(Ok(result)) => {
                transition(content_id, Stage::Assembling);
                (CallbackPayload::success(content_id, result), Stage::Delivered)
            }
            Ok(Err(e)) => {
                warn!(
                    %content_id,
                    error = %e,
                    permanent = e.is_permanent(),
                    "Scraping failed, reporting failure"
                );
                (CallbackPayload::failed(content_id, e.to_string()), Stage::Failed)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(%content_id, panic = message.as_str(), "Pipeline panicked");
                (CallbackPayload::failed(content_id, message), Stage::Failed)
            }
        };

        let delivered = self.callback.send(&payload).await;
        transition(content_id, final_stage);

        info!(%content_id, stage = %final_stage, delivered, "Pipeline run finished");
        RunReport {
            content_id,
            final_stage,
            delivered,
        }
    }

    async fn execute(&self, request: &ExtractionRequest) -> Result<PipelineResult, ScrapeError> {
        let content_id = request.content_id;

        transition(content_id, Stage::Scraping);
        let metadata = self.scrapers.scrape_url(&request.source_url).await?;

        transition(content_id, Stage::Extracting);
        let extracted = self.extractor.extract(metadata.caption_text()).await;

        transition(content_id, Stage::Resolving);
        let resolution = self.resolver.resolve(&extracted.names).await;

        Ok(PipelineResult::new(metadata, extracted, resolution))
    }
}

fn transition(content_id: Uuid, stage: Stage) {
    info!(%content_id, stage = %stage, "Pipeline stage");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "pipeline panicked".to_string()
    }
}
