//! Two-phase batch execution
//!
//! Loading decodes every request's assets on a bounded set of blocking
//! tasks. Once every load has finished, pages are cut and rendered on a
//! dedicated rayon pool. Serial mode runs both phases on one thread.

use rayon::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::compose::{LabelRenderer, render_page};
use crate::io::{AssetCache, CardLoad, load_card};
use crate::layout::create_grid_layout;
use crate::options::{SheetOptions, SheetParams};
use crate::paginate::{Page, expand, group_cards, paginate, single_page};
use crate::stats::BatchStatistics;
use crate::types::*;

/// Cards that loaded plus the problems met along the way
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Loaded items in request order
    pub items: Vec<LoadedItem>,
    /// Requests dropped from the batch
    pub failures: Vec<SheetError>,
    /// Recoverable problems on kept cards (e.g. an unreadable logo)
    pub warnings: Vec<SheetError>,
}

impl LoadOutcome {
    fn record(&mut self, result: Result<CardLoad>) {
        match result {
            Ok(load) => {
                self.warnings.extend(load.logo_error);
                self.items.push(load.item);
            }
            Err(e) => {
                log::warn!("Skipping card: {}", e);
                self.failures.push(e);
            }
        }
    }
}

/// Files written for one page
#[derive(Debug, Clone)]
pub struct PageOutput {
    pub number: usize,
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Everything a batch run produced
#[derive(Debug, Default)]
pub struct BatchReport {
    pub stats: BatchStatistics,
    /// Successfully written pages, by page number
    pub pages: Vec<PageOutput>,
    pub load_failures: Vec<SheetError>,
    pub load_warnings: Vec<SheetError>,
    pub render_failures: Vec<SheetError>,
    pub load_time: Duration,
    pub render_time: Duration,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.load_failures.is_empty() && self.render_failures.is_empty()
    }
}

// =============================================================================
// Loading Phase
// =============================================================================

/// Decode all requests concurrently, at most `workers` at a time.
///
/// Each distinct source file is decoded once and shared between the
/// requests naming it. A request that fails to decode, or whose decode
/// panics, is reported in the outcome and dropped; the rest keep their
/// input order.
pub async fn load_cards(
    requests: Vec<CardRequest>,
    card_size: (u32, u32),
    workers: usize,
) -> Result<LoadOutcome> {
    let cache = Arc::new(AssetCache::new());
    let outcome = {
        let cache = Arc::clone(&cache);
        load_all(requests, workers, move |request| {
            load_card(request, card_size, &cache)
        })
        .await?
    };
    log::debug!("Decoded {} distinct source images", cache.len());
    Ok(outcome)
}

async fn load_all<F>(requests: Vec<CardRequest>, workers: usize, loader: F) -> Result<LoadOutcome>
where
    F: Fn(&CardRequest) -> Result<CardLoad> + Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let loader = Arc::new(loader);
    let mut tasks = JoinSet::new();
    let total = requests.len();

    for (index, request) in requests.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let loader = Arc::clone(&loader);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let key = request.key.clone();
            let result = tokio::task::spawn_blocking(move || (*loader)(&request))
                .await
                .unwrap_or_else(|e| Err(load_task_failure(key, e)));
            (index, result)
        });
    }

    let mut results = Vec::with_capacity(total);
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(index, _)| *index);

    let mut outcome = LoadOutcome::default();
    for (_, result) in results {
        outcome.record(result);
    }
    Ok(outcome)
}

fn load_task_failure(key: String, error: tokio::task::JoinError) -> SheetError {
    let reason = if error.is_panic() {
        format!("panicked: {}", panic_message(error.into_panic()))
    } else {
        error.to_string()
    };
    SheetError::LoadTask { key, reason }
}

/// Decode all requests one after another on the calling thread
pub fn load_cards_serial(requests: &[CardRequest], card_size: (u32, u32)) -> LoadOutcome {
    let cache = AssetCache::new();
    load_all_serial(requests, |request| load_card(request, card_size, &cache))
}

fn load_all_serial<F>(requests: &[CardRequest], loader: F) -> LoadOutcome
where
    F: Fn(&CardRequest) -> Result<CardLoad>,
{
    let mut outcome = LoadOutcome::default();
    for request in requests {
        let result = catch_unwind(AssertUnwindSafe(|| loader(request))).unwrap_or_else(|payload| {
            Err(SheetError::LoadTask {
                key: request.key.clone(),
                reason: format!("panicked: {}", panic_message(payload)),
            })
        });
        outcome.record(result);
    }
    outcome
}

// =============================================================================
// Rendering Phase
// =============================================================================

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Render one page and write its layers to `<output_dir>/<page number>/`.
pub fn render_and_write_page(
    page: &Page,
    params: &SheetParams,
    labels: &dyn LabelRenderer,
    output_dir: &Path,
) -> Result<PageOutput> {
    let layers = render_page(page, params, labels)?;

    let dir = output_dir.join(page.number.to_string());
    std::fs::create_dir_all(&dir)?;
    let files = layers.save(&dir, &params.output_prefix, params.dpi)?;

    log::info!("Page {} completed ({} cards)", page.number, page.len());
    Ok(PageOutput {
        number: page.number,
        dir,
        files,
    })
}

/// Render a page, turning any failure (panics included) into a
/// [`SheetError::RenderTask`] that names the page
fn render_isolated(
    page: &Page,
    params: &SheetParams,
    labels: &dyn LabelRenderer,
    output_dir: &Path,
) -> Result<PageOutput> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        render_and_write_page(page, params, labels, output_dir)
    }));

    match result {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(SheetError::RenderTask { page, reason })) => {
            Err(SheetError::RenderTask { page, reason })
        }
        Ok(Err(e)) => Err(SheetError::RenderTask {
            page: page.number,
            reason: e.to_string(),
        }),
        Err(payload) => Err(SheetError::RenderTask {
            page: page.number,
            reason: format!("panicked: {}", panic_message(payload)),
        }),
    }
}

/// Render pages on a pool of `workers` threads; one result per page, in
/// page order.
pub fn render_pages(
    pages: &[Page],
    params: &SheetParams,
    labels: &dyn LabelRenderer,
    output_dir: &Path,
    workers: usize,
) -> Result<Vec<Result<PageOutput>>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("sheet-render-{}", i))
        .build()?;

    Ok(pool.install(|| {
        pages
            .par_iter()
            .map(|page| render_isolated(page, params, labels, output_dir))
            .collect()
    }))
}

/// Render pages one after another on the calling thread
pub fn render_pages_serial(
    pages: &[Page],
    params: &SheetParams,
    labels: &dyn LabelRenderer,
    output_dir: &Path,
) -> Vec<Result<PageOutput>> {
    pages
        .iter()
        .map(|page| render_isolated(page, params, labels, output_dir))
        .collect()
}

// =============================================================================
// Batch
// =============================================================================

/// Load, paginate and render a whole batch into `output_dir`.
///
/// Configuration and geometry errors abort before anything is decoded.
/// Per-card decode failures and per-page render failures are collected in
/// the report; the rest of the batch still completes.
pub async fn run_batch(
    requests: Vec<CardRequest>,
    options: &SheetOptions,
    output_dir: impl AsRef<Path>,
    labels: Arc<dyn LabelRenderer>,
) -> Result<BatchReport> {
    let params = SheetParams::from_options(options)?;
    let grid = create_grid_layout(&params.geometry);
    let card_size = params.card_size();
    let output_dir = output_dir.as_ref().to_path_buf();

    log::info!(
        "Sheet {}x{}px holds {} cards ({} rows x {} cols)",
        params.geometry.width_px,
        params.geometry.height_px,
        grid.capacity(),
        grid.rows,
        grid.cols
    );

    let requests: Vec<CardRequest> = requests
        .into_iter()
        .filter(|request| {
            if request.quantity == 0 {
                log::warn!("Skipping card `{}` with quantity 0", request.key);
            }
            request.quantity > 0
        })
        .collect();

    // Load
    let load_start = Instant::now();
    let loaded = if options.parallel {
        let workers = options.resolved_load_workers();
        log::debug!("Loading {} requests with {} workers", requests.len(), workers);
        load_cards(requests, card_size, workers).await?
    } else {
        tokio::task::spawn_blocking(move || load_cards_serial(&requests, card_size)).await?
    };
    let load_time = load_start.elapsed();
    log::info!(
        "Loaded {} cards in {:.2}s ({} failed)",
        loaded.items.len(),
        load_time.as_secs_f64(),
        loaded.failures.len()
    );

    // Paginate
    let item_count = loaded.items.len();
    let cards = group_cards(expand(loaded.items));
    let stats = BatchStatistics::for_grid(item_count, cards.len(), &grid, options.single_page)?;
    let pages = if options.single_page {
        single_page(cards, &grid)?
    } else {
        paginate(cards, &grid)?
    };
    log::info!("{} cards across {} pages", stats.cards, pages.len());

    tokio::fs::create_dir_all(&output_dir).await?;

    // Render
    let render_start = Instant::now();
    let parallel = options.parallel;
    let workers = options.resolved_render_workers();
    let results = tokio::task::spawn_blocking(move || {
        if parallel {
            render_pages(&pages, &params, labels.as_ref(), &output_dir, workers)
        } else {
            Ok(render_pages_serial(&pages, &params, labels.as_ref(), &output_dir))
        }
    })
    .await??;
    let render_time = render_start.elapsed();

    let mut report = BatchReport {
        stats,
        load_failures: loaded.failures,
        load_warnings: loaded.warnings,
        load_time,
        render_time,
        ..Default::default()
    };
    for result in results {
        match result {
            Ok(output) => report.pages.push(output),
            Err(e) => {
                log::error!("{}", e);
                report.render_failures.push(e);
            }
        }
    }

    log::info!(
        "Rendered {} pages in {:.2}s ({} failed)",
        report.pages.len(),
        render_time.as_secs_f64(),
        report.render_failures.len()
    );
    Ok(report)
}
