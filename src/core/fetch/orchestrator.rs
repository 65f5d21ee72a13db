// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Fetch orchestration
//!
//! Fans one fetch out per target under a bounded worker pool. Each worker
//! performs exactly one fetch, routes the payload, and reports an outcome;
//! outcomes arrive in completion order, not submission order. One target's
//! failure never cancels sibling work and never aborts the pool - it is
//! converted into a per-target outcome. There is no mid-run cancellation;
//! the pool always drains.

use crate::adapters::platform::PlatformApi;
use crate::config::RunConfig;
use crate::core::output::OutputRouter;
use crate::domain::{ExtraArgs, QuarryError, ReportKind, ReportTarget, ScopeKind};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Outcome of one target: artifacts written on success, the error
/// otherwise
pub struct FetchOutcome {
    /// The target this outcome belongs to
    pub target: ReportTarget,
    /// Artifacts written immediately (zero under unified buffering)
    pub result: Result<usize, QuarryError>,
}

/// Per-worker fetch parameters, shared read-only across the pool
struct FetchContext {
    kind: ReportKind,
    scope_kind: ScopeKind,
    binary: bool,
    extra_args: ExtraArgs,
}

/// Runs one fetch per target under bounded concurrency
pub struct FetchOrchestrator {
    api: Arc<dyn PlatformApi>,
    router: Arc<OutputRouter>,
}

impl FetchOrchestrator {
    /// Create an orchestrator over a platform API and an output router
    pub fn new(api: Arc<dyn PlatformApi>, router: Arc<OutputRouter>) -> Self {
        Self { api, router }
    }

    /// Fetch and route every target, returning outcomes in completion
    /// order
    ///
    /// Always produces exactly one outcome per target. Asynchronous report
    /// kinds force the pool down to a single worker.
    pub async fn run(&self, targets: Vec<ReportTarget>, config: &RunConfig) -> Vec<FetchOutcome> {
        if targets.is_empty() {
            return Vec::new();
        }

        let concurrency = config.effective_concurrency();
        if concurrency != config.concurrency {
            tracing::info!(
                kind = %config.report_kind,
                "Report kind is asynchronous, fetches are serialized"
            );
        }
        tracing::info!(
            targets = targets.len(),
            concurrency,
            "Starting report fetches"
        );

        let context = Arc::new(FetchContext {
            kind: config.report_kind,
            scope_kind: config.report_scope_kind,
            binary: config.output_mode.is_binary(),
            extra_args: config.extra_args.clone(),
        });
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let (tx, mut rx) = mpsc::channel(concurrency);

        let total = targets.len();
        for target in targets {
            let api = Arc::clone(&self.api);
            let router = Arc::clone(&self.router);
            let context = Arc::clone(&context);
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            tokio::spawn(async move {
                let _permit = semaphore.acquire().await.expect("Semaphore closed");
                let result = process_target(api, router, context, &target).await;
                // Receiver outlives every worker; a send failure means the
                // run was torn down and the outcome has nowhere to go.
                let _ = tx.send(FetchOutcome { target, result }).await;
            });
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = rx.recv().await {
            if let Err(e) = &outcome.result {
                tracing::error!(
                    target = %outcome.target.display_name,
                    org = %outcome.target.parent_org_name,
                    error = %e,
                    "Report generation failed"
                );
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// One worker: fetch, then route
async fn process_target(
    api: Arc<dyn PlatformApi>,
    router: Arc<OutputRouter>,
    context: Arc<FetchContext>,
    target: &ReportTarget,
) -> Result<usize, QuarryError> {
    tracing::info!(
        kind = %context.kind,
        scope_kind = %target.kind,
        target = %target.display_name,
        org = %target.parent_org_name,
        "Running report"
    );

    let payload = api
        .fetch_report(
            &target.token,
            context.scope_kind,
            context.kind,
            context.binary,
            &context.extra_args,
        )
        .await?;

    router.route(target, payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::platform::PlatformApi;
    use crate::config::TokenType;
    use crate::domain::errors::PlatformError;
    use crate::domain::{
        InclusionSpec, Organization, OutputMode, ReportPayload, Scope, ScopeToken,
    };
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetch-only fake that fails for chosen tokens and tracks the peak
    /// number of in-flight fetches
    struct FetchFake {
        fail_tokens: Vec<ScopeToken>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl FetchFake {
        fn new(fail_tokens: Vec<ScopeToken>) -> Self {
            Self {
                fail_tokens,
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PlatformApi for FetchFake {
        async fn organizations(&self) -> Result<Vec<Organization>, PlatformError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn organization_details(
            &self,
            _org_token: &ScopeToken,
        ) -> Result<Organization, PlatformError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn scopes(
            &self,
            _org_token: &ScopeToken,
            _kind: ScopeKind,
            _expand_names: bool,
        ) -> Result<Vec<Scope>, PlatformError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn scope_by_token(
            &self,
            _org_token: &ScopeToken,
            _token: &ScopeToken,
        ) -> Result<Scope, PlatformError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn child_projects(
            &self,
            _org_token: &ScopeToken,
            _product_token: &ScopeToken,
        ) -> Result<Vec<Scope>, PlatformError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn tokens_from_name(&self, _name: &str) -> Result<Vec<ScopeToken>, PlatformError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn fetch_report(
            &self,
            scope_token: &ScopeToken,
            _scope_kind: ScopeKind,
            _kind: ReportKind,
            _binary: bool,
            _extra_args: &ExtraArgs,
        ) -> Result<ReportPayload, PlatformError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_tokens.contains(scope_token) {
                return Err(PlatformError::ServerError {
                    status: 500,
                    message: "injected".to_string(),
                });
            }
            Ok(ReportPayload::Binary(vec![0x01]))
        }
    }

    fn targets(dir: &Path, count: usize) -> Vec<ReportTarget> {
        (0..count)
            .map(|i| ReportTarget {
                token: ScopeToken::new(format!("p{i}")),
                kind: ScopeKind::Product,
                display_name: format!("product-{i}"),
                parent_org_name: "Acme".to_string(),
                output_path: dir.join(format!("product_product-{i}_vulnerability.xlsx")),
            })
            .collect()
    }

    fn run_config(dir: &Path, kind: ReportKind, concurrency: usize) -> RunConfig {
        RunConfig {
            report_kind: kind,
            output_mode: OutputMode::Binary,
            report_scope_kind: ScopeKind::Product,
            output_dir: dir.to_path_buf(),
            concurrency,
            extra_args: Default::default(),
            token_type: TokenType::Organization,
            tokens: vec![ScopeToken::new("o1")],
            selection: InclusionSpec::default(),
        }
    }

    async fn run_pool(
        fail_tokens: Vec<ScopeToken>,
        count: usize,
        concurrency: usize,
        kind: ReportKind,
    ) -> (Vec<FetchOutcome>, usize) {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FetchFake::new(fail_tokens));
        let router = Arc::new(OutputRouter::new(OutputMode::Binary));
        let orchestrator = FetchOrchestrator::new(api.clone(), router);
        let config = run_config(dir.path(), kind, concurrency);
        let outcomes = orchestrator.run(targets(dir.path(), count), &config).await;
        let peak = api.peak_in_flight.load(Ordering::SeqCst);
        (outcomes, peak)
    }

    #[tokio::test]
    async fn test_fan_out_completeness_across_concurrency_levels() {
        let n = 6;
        for concurrency in 1..=n + 5 {
            let (outcomes, _) =
                run_pool(Vec::new(), n, concurrency, ReportKind::Vulnerability).await;
            assert_eq!(outcomes.len(), n, "concurrency {concurrency}");
            assert!(outcomes.iter().all(|o| o.result.is_ok()));
        }
    }

    #[tokio::test]
    async fn test_failure_isolation() {
        let (outcomes, _) = run_pool(
            vec![ScopeToken::new("p2")],
            5,
            3,
            ReportKind::Vulnerability,
        )
        .await;
        assert_eq!(outcomes.len(), 5);
        let failed: Vec<_> = outcomes.iter().filter(|o| o.result.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].target.token, ScopeToken::new("p2"));
        assert_eq!(outcomes.iter().filter(|o| o.result.is_ok()).count(), 4);
    }

    #[tokio::test]
    async fn test_concurrency_bound_respected() {
        let (outcomes, peak) = run_pool(Vec::new(), 12, 4, ReportKind::Vulnerability).await;
        assert_eq!(outcomes.len(), 12);
        assert!(peak <= 4, "peak in-flight was {peak}");
    }

    #[tokio::test]
    async fn test_asynchronous_kind_serializes_fetches() {
        let (outcomes, peak) = run_pool(Vec::new(), 5, 10, ReportKind::Attribution).await;
        assert_eq!(outcomes.len(), 5);
        assert_eq!(peak, 1, "asynchronous kinds must never fetch concurrently");
    }

    #[tokio::test]
    async fn test_empty_target_list() {
        let (outcomes, _) = run_pool(Vec::new(), 0, 3, ReportKind::Vulnerability).await;
        assert!(outcomes.is_empty());
    }
}
