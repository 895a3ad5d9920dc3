use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::{Args, ValueEnum};
use std::path::Path;
use std::sync::Arc;
use unpost_core::checkpoint::{CheckpointState, CheckpointStore};
use unpost_core::config::Config;
use unpost_core::executor::{ActionExecutor, ApiExecutor, UiExecutor};
use unpost_core::orchestrator::{Orchestrator, RunOptions, RunReport, RunState};
use unpost_core::source::{ContentSource, DiscoverySource, PaginatedSource};
use unpost_core::types::{Backend, RunMode};
use unpost_core::ui::{Locators, Pacer, Page, WebDriverPage};
use unpost_core::usage::UsageTracker;
use unpost_core::UnpostError;
use x_client::XClient;

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Discover and classify only; nothing is changed or written
    Dry,
    /// Delete originals and undo reposts
    Auto,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum BackendArg {
    Api,
    Ui,
}

#[derive(Args)]
pub struct RunArgs {
    #[arg(long, value_enum, default_value_t = ModeArg::Dry)]
    mode: ModeArg,

    /// Stop after acting on this many items
    #[arg(long = "max", value_parser = clap::value_parser!(u64).range(1..))]
    max_items: Option<u64>,

    /// Continue from the stored checkpoint (otherwise start from the top
    /// with an empty processed set)
    #[arg(long)]
    resume: bool,

    /// Override the configured backend
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Bearer token for the REST API
    #[arg(long, env = "UNPOST_BEARER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Account id (resolved through the API when omitted)
    #[arg(long, env = "UNPOST_USER_ID")]
    user_id: Option<String>,

    #[arg(long, env = "UNPOST_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Your own profile page, e.g. https://x.com/<handle>
    #[arg(long, env = "UNPOST_PROFILE_URL")]
    profile_url: Option<String>,
}

impl RunArgs {
    fn mode(&self) -> RunMode {
        match self.mode {
            ModeArg::Dry => RunMode::Dry,
            ModeArg::Auto => RunMode::Auto,
        }
    }

    fn apply(&self, config: &mut Config) {
        if let Some(backend) = self.backend {
            config.backend = match backend {
                BackendArg::Api => Backend::Api,
                BackendArg::Ui => Backend::Ui,
            };
        }
        if let Some(id) = &self.user_id {
            config.api.user_id = Some(id.clone());
        }
        if let Some(url) = &self.webdriver_url {
            config.ui.webdriver_url = url.clone();
        }
        if let Some(url) = &self.profile_url {
            config.ui.profile_url = Some(url.clone());
        }
    }
}

/// Returns the process exit code.
pub fn run(root: &Path, args: RunArgs, json: bool) -> anyhow::Result<i32> {
    let mut config = Config::load(root).context("failed to load config")?;
    args.apply(&mut config);
    config.ensure_valid()?;

    let options = RunOptions {
        mode: args.mode(),
        max_items: args.max_items,
    };
    let store = CheckpointStore::at_root(root);
    let checkpoint = store
        .load(args.resume)
        .context("failed to load checkpoint")?;

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        match config.backend {
            Backend::Api => run_api(root, &config, &args, store, checkpoint, options).await,
            Backend::Ui => run_ui(&config, store, checkpoint, options).await,
        }
    })?;

    print_report(&report, json)?;
    Ok(exit_code(&report.state))
}

async fn run_api(
    root: &Path,
    config: &Config,
    args: &RunArgs,
    store: CheckpointStore,
    checkpoint: CheckpointState,
    options: RunOptions,
) -> anyhow::Result<RunReport> {
    let token = args
        .token
        .as_deref()
        .ok_or(UnpostError::MissingCredential("UNPOST_BEARER_TOKEN"))?;
    let client = Arc::new(XClient::new(&config.api.base_url, token)?);

    let user_id = match &config.api.user_id {
        Some(id) => id.clone(),
        None => {
            client
                .me()
                .await
                .context("failed to resolve the authenticated account")?
                .id
        }
    };

    // Dry runs never charge the tracker: the source gets none and `act` is
    // never called.
    let tracker = Arc::new(
        UsageTracker::at_root(root, config.limits).context("failed to open usage file")?,
    );
    let source_tracker = (!options.mode.is_dry()).then(|| tracker.clone());

    let source: Box<dyn ContentSource> = Box::new(PaginatedSource::new(
        client.clone(),
        user_id.clone(),
        config.api.page_size,
        source_tracker,
        checkpoint.cursor().map(str::to_string),
    ));
    let executor: Box<dyn ActionExecutor> = Box::new(ApiExecutor::new(client, user_id, tracker));

    Ok(Orchestrator::new(source, executor, store, checkpoint, options)
        .run()
        .await)
}

async fn run_ui(
    config: &Config,
    store: CheckpointStore,
    checkpoint: CheckpointState,
    options: RunOptions,
) -> anyhow::Result<RunReport> {
    let profile_url = config
        .ui
        .profile_url
        .as_deref()
        .ok_or_else(|| UnpostError::Config("ui.profile_url is required".into()))?;
    let opened = match &config.ui.session_id {
        Some(session_id) => {
            WebDriverPage::attach(
                &config.ui.webdriver_url,
                session_id,
                profile_url,
                Locators::default(),
            )
            .await
        }
        None => {
            WebDriverPage::connect(
                &config.ui.webdriver_url,
                profile_url,
                config.ui.capabilities.clone(),
                Locators::default(),
            )
            .await
        }
    };
    let page = Arc::new(opened.context("failed to open the timeline")?);
    let pacer = Pacer::new(config.ui.min_wait_ms, config.ui.max_wait_ms);

    let shared: Arc<dyn Page> = page.clone();
    let source: Box<dyn ContentSource> = Box::new(DiscoverySource::new(
        shared.clone(),
        config.discovery,
        pacer,
    ));
    let executor: Box<dyn ActionExecutor> = Box::new(UiExecutor::new(
        shared,
        page.locators().clone(),
        pacer,
        config.ui.max_retries,
    ));

    let report = Orchestrator::new(source, executor, store, checkpoint, options)
        .run()
        .await;

    match Arc::try_unwrap(page) {
        Ok(page) => {
            if let Err(e) = page.close().await {
                tracing::warn!(error = %e, "Failed to close WebDriver session");
            }
        }
        Err(_) => tracing::warn!("WebDriver session still in use, leaving it open"),
    }
    Ok(report)
}

fn exit_code(state: &RunState) -> i32 {
    match state {
        RunState::Exhausted | RunState::CapReached => 0,
        RunState::BudgetStopped { .. } => 2,
        RunState::FatalError { .. } => 1,
    }
}

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(report);
    }

    let detail = match &report.state {
        RunState::BudgetStopped { reason } => format!(" ({reason})"),
        RunState::FatalError { message } => format!(" ({message})"),
        _ => String::new(),
    };
    let mode = if report.mode.is_dry() { " [dry run]" } else { "" };
    println!("Run ended: {}{detail}{mode}", report.state.label());
    println!(
        "Elapsed: {:.1}s  Checkpointed ids: {}",
        report.elapsed_ms as f64 / 1000.0,
        report.checkpointed
    );
    println!();

    let s = &report.stats;
    let rows = [
        ("processed", s.processed),
        ("deleted", s.deleted),
        ("unreposted", s.unreposted),
        ("skipped", s.skipped),
        ("errors", s.errors),
        ("retries", s.retries),
    ]
    .into_iter()
    .map(|(name, n)| vec![name.to_string(), n.to_string()])
    .collect();
    print_table(&["STAT", "COUNT"], rows);

    match report.state {
        RunState::BudgetStopped { .. } => {
            println!("\nResume later with: unpost run --mode auto --resume")
        }
        RunState::FatalError { .. } => {
            println!("\nProgress so far is checkpointed; fix the error and rerun with --resume")
        }
        _ => {}
    }
    Ok(())
}
