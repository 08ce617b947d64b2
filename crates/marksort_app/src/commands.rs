use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use marksort_core::{count_bookmarks, RunRequest, BOOKMARK_BAR};
use marksort_engine::{
    load_tree, save_tree, CategorizerSettings, Controller, EngineHandle, GeminiClient,
    InMemoryBookmarkStore, LivenessSettings, OrganizerConfig, ReqwestLivenessChecker, Reorganizer,
};
use marksort_logging::{mark_info, mark_warn};

use crate::render;
use crate::settings::{load_settings, save_settings, API_KEY_ENV};
use crate::OrganizeArgs;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub fn organize(settings_path: &Path, args: OrganizeArgs) -> anyhow::Result<()> {
    let settings = load_settings(settings_path);
    let credential = settings
        .api_key_with_override(env::var(API_KEY_ENV).ok())
        .ok_or_else(|| {
            anyhow!("No API key configured. Run `marksort set-key <KEY>` or set {API_KEY_ENV}.")
        })?;

    let tree = load_tree(&args.tree)
        .with_context(|| format!("Failed to read bookmark tree {:?}", args.tree))?;
    let original = tree.clone();
    let store = Arc::new(InMemoryBookmarkStore::new(tree));

    let mut model_settings = CategorizerSettings::default();
    if let Some(model) = args.model {
        model_settings.model = model;
    }
    let reorganizer = Reorganizer::new(
        store.clone(),
        Arc::new(ReqwestLivenessChecker::new(LivenessSettings::default())?),
        Arc::new(GeminiClient::new(model_settings)?),
        OrganizerConfig::default(),
    );
    let mut controller = Controller::new(EngineHandle::new(reorganizer)?);
    let interrupted = watch_interrupt();

    controller.start(RunRequest {
        credential,
        max_folders: args.max_folders.or(settings.max_folders),
        validate_urls: settings.validate_urls && !args.no_validate,
    });

    let mut last_line = String::new();
    let progress = loop {
        if interrupted.load(Ordering::SeqCst) {
            controller.cancel();
        }
        let progress = controller.get_progress();
        let line = render::progress_line(&progress);
        if line != last_line {
            println!("{line}");
            last_line = line;
        }
        if progress.is_terminal() {
            break progress;
        }
        thread::sleep(POLL_INTERVAL);
    };

    // A cancelled run keeps going until its next checkpoint.
    while controller.run_in_flight() {
        thread::sleep(POLL_INTERVAL);
    }

    let result = store.snapshot();
    if result != original {
        let output = args.output.as_deref().unwrap_or(args.tree.as_path());
        save_tree(output, &result)
            .with_context(|| format!("Failed to write bookmark tree {:?}", output))?;
        mark_info!("Wrote reorganized tree to {:?}", output);
        println!("Saved bookmarks to {}", output.display());
    }

    if let Some(outcome) = controller.last_outcome() {
        for warning in &outcome.warnings {
            println!("Warning: {warning}");
        }
    }

    if let Some(error) = &progress.error {
        bail!(error.clone());
    }
    if let Some(message) = render::final_message(&progress) {
        println!("{message}");
    }
    Ok(())
}

pub fn stats(tree: &Path) -> anyhow::Result<()> {
    let tree =
        load_tree(tree).with_context(|| format!("Failed to read bookmark tree {:?}", tree))?;
    let bar = BOOKMARK_BAR.resolve(&tree)?;
    println!("{}", render::stats_line(&count_bookmarks(bar)));
    Ok(())
}

pub fn set_key(settings_path: &Path, key: &str) -> anyhow::Result<()> {
    let key = key.trim();
    if key.is_empty() {
        bail!("API key must not be empty");
    }
    let mut settings = load_settings(settings_path);
    settings.api_key = Some(key.to_string());
    save_settings(settings_path, &settings)?;
    println!("API key saved to {}", settings_path.display());
    Ok(())
}

pub fn test_key(settings_path: &Path, key: Option<String>) -> anyhow::Result<()> {
    let key = match key {
        Some(key) => key,
        None => load_settings(settings_path)
            .api_key_with_override(env::var(API_KEY_ENV).ok())
            .ok_or_else(|| anyhow!("No API key configured"))?,
    };

    let client = GeminiClient::new(CategorizerSettings::default())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    match runtime.block_on(client.test_connection(&key)) {
        Ok(()) => {
            println!("API key works.");
            Ok(())
        }
        Err(err) => Err(anyhow!("API key rejected: {err}")),
    }
}

/// Flag raised on the first Ctrl-C.
fn watch_interrupt() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let raised = flag.clone();
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                mark_warn!("Ctrl-C handling unavailable: {}", err);
                return;
            }
        };
        runtime.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                mark_info!("Interrupt received, cancelling");
                raised.store(true, Ordering::SeqCst);
            }
        });
    });
    flag
}
