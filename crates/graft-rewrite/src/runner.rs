//! Runs a recipe over a corpus: validate, scan everything, then transform.

use graft_tree::{Document, ExecutionContext};
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::errors::RewriteResult;
use crate::pool;
use crate::recipe::{Recipe, RecipeDescriptor, RecipeRun, TypedRun};

/// Outcome for one input document.
#[derive(Clone, Debug)]
pub struct DocumentResult {
    pub before: Document,
    pub after: Document,
}

impl DocumentResult {
    /// False exactly when the transform returned the input document itself.
    pub fn is_changed(&self) -> bool {
        !Document::ptr_eq(&self.before, &self.after)
    }

    /// Warning markers attached to the transformed tree.
    pub fn warnings(&self) -> Vec<String> {
        self.after.warnings()
    }
}

/// Per-document results, in input order.
#[derive(Clone, Debug, Default)]
pub struct RunResult {
    pub results: Vec<DocumentResult>,
}

impl RunResult {
    pub fn changed(&self) -> impl Iterator<Item = &DocumentResult> {
        self.results.iter().filter(|result| result.is_changed())
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.results.iter().map(|result| &result.after)
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.results.into_iter().map(|result| result.after).collect()
    }
}

/// Apply `recipe` to `corpus`.
///
/// Configuration and recipe options are validated first; a failure there
/// aborts the run before any document is scanned. Every document is then
/// scanned, the accumulators are sealed, and only then is any document
/// transformed. Per-document problems never abort the run; they show up as
/// warning markers on the affected trees.
pub fn run(
    recipe: &dyn RecipeDescriptor,
    corpus: Vec<Document>,
    config: &RunConfig,
) -> RewriteResult<RunResult> {
    config.validate()?;
    recipe.validate_all()?;

    let ctx = ExecutionContext::new();
    let mut state = recipe.start(&ctx);
    info!(
        recipe = recipe.display_name(),
        documents = corpus.len(),
        workers = config.workers,
        "running recipe"
    );

    scan_all(state.as_ref(), &corpus, config, &ctx);
    state.seal();
    debug!(recipe = recipe.display_name(), "scan phase complete");

    let state = state.as_ref();
    let results = pool::map(config.workers, corpus, |before| {
        let after = state.transform(before.clone(), &ctx, config.max_iterations);
        DocumentResult { before, after }
    });

    let changed = results.iter().filter(|result| result.is_changed()).count();
    info!(recipe = recipe.display_name(), changed, "recipe finished");
    Ok(RunResult { results })
}

/// Run only the scan phase of `recipe` and return its final accumulator.
pub fn scan_corpus<R: Recipe>(
    recipe: &R,
    corpus: &[Document],
    config: &RunConfig,
) -> RewriteResult<R::Acc> {
    config.validate()?;
    recipe.validate_all()?;

    let ctx = ExecutionContext::new();
    let state = TypedRun::new(recipe, &ctx);
    scan_all(&state, corpus, config, &ctx);
    Ok(state.into_accumulator())
}

fn scan_all(state: &dyn RecipeRun, corpus: &[Document], config: &RunConfig, ctx: &ExecutionContext) {
    debug!(recipe = state.display_name(), "scanning");
    pool::for_each(config.workers, corpus, |document| state.scan(document, ctx));
}
