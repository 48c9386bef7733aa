use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use chrono::Local;
use clip_logging::{clip_info, clip_warn};
use clipdown_core::{update, AppState, Msg, WorkflowState};
use clipdown_engine::{
    ConvertSettings, FileDownloader, LogNotifier, RemoteConverter, RouterDeps, RouterHandle,
};
use clipdown_page::{ConvertAction, Overlay, PageDocument, RegionSink};
use serde_json::json;

use super::effects::EffectRunner;
use super::ui::render;
use crate::Cli;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let markup = std::fs::read_to_string(&cli.page)
        .with_context(|| format!("reading {}", cli.page.display()))?;
    let router = build_router(&cli)?;

    if cli.select.is_empty() {
        run_workflow(&cli, &markup, router)
    } else {
        run_region_selection(&cli, &markup, router)
    }
}

fn build_router(cli: &Cli) -> anyhow::Result<RouterHandle> {
    let mut settings = ConvertSettings::default();
    if let Some(endpoint) = &cli.endpoint {
        settings.endpoint = url::Url::parse(endpoint).context("parsing --endpoint")?;
    }
    clip_info!("conversion endpoint: {}", settings.endpoint);

    let deps = RouterDeps {
        converter: Arc::new(RemoteConverter::new(settings)?),
        downloader: Arc::new(FileDownloader::new(cli.out_dir.clone())),
        notifier: Arc::new(LogNotifier),
        date_stamp: Arc::new(|| Local::now().format("%Y-%m-%d").to_string()),
    };
    Ok(RouterHandle::new(deps))
}

/// The whole-page workflow: capture, convert, package, with the state
/// machine driving and the effect runner carrying its effects out.
fn run_workflow(cli: &Cli, markup: &str, router: RouterHandle) -> anyhow::Result<()> {
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(
        router,
        cli.out_dir.clone(),
        Arc::new(PageDocument::parse(markup)),
        msg_tx.clone(),
    );

    let mut state = AppState::new();
    let _ = msg_tx.send(Msg::ConvertClicked);

    loop {
        let msg = msg_rx
            .recv_timeout(Duration::from_secs(120))
            .context("workflow stalled waiting for a message")?;
        let (next, effects) = update(state, msg);
        state = next;
        runner.run(effects);

        if state.consume_dirty() {
            render::print(&state.view());
        }
        match state.workflow() {
            WorkflowState::Succeeded => return Ok(()),
            WorkflowState::Failed => bail!("conversion failed"),
            _ => {}
        }
    }
}

/// The region flow: attach the overlay, drive its selection machine from the
/// given CSS selectors, then hand the composition off fire-and-forget.
fn run_region_selection(cli: &Cli, markup: &str, router: RouterHandle) -> anyhow::Result<()> {
    let mut overlay = Overlay::attach(markup)?;
    for selector in &cli.select {
        let ids = overlay.find(selector);
        if ids.is_empty() {
            clip_warn!("selector \"{selector}\" matched nothing");
        }
        for id in ids {
            overlay.pointer_enter(id);
            overlay.click(id);
        }
    }
    println!("{}", overlay.panel().count_text);

    let before = markdown_files(&cli.out_dir);
    let sink = RouterSink { router };
    match overlay.convert(&sink) {
        ConvertAction::Submitted { confirmation } => {
            println!("{confirmation}");
            // Fire-and-forget: wait for the download to land so the process
            // does not exit underneath the background flow.
            match wait_for_new_markdown(&cli.out_dir, &before, Duration::from_secs(60)) {
                Some(path) => println!("Saved {}", path.display()),
                None => bail!("no download arrived; the failure was notified"),
            }
            Ok(())
        }
        ConvertAction::NothingSelected(_) => bail!("no region matched the given selectors"),
    }
}

struct RouterSink {
    router: RouterHandle,
}

impl RegionSink for RouterSink {
    fn submit(&self, html: String, title: String) {
        self.router.submit(json!({
            "action": "convertSelectedRegions",
            "html": html,
            "title": title,
        }));
    }
}

fn markdown_files(dir: &Path) -> HashSet<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("md"))
                .collect()
        })
        .unwrap_or_default()
}

fn wait_for_new_markdown(
    dir: &Path,
    before: &HashSet<PathBuf>,
    timeout: Duration,
) -> Option<PathBuf> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(path) = markdown_files(dir).difference(before).next().cloned() {
            return Some(path);
        }
        thread::sleep(Duration::from_millis(50));
    }
    None
}
