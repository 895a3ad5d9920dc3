use crate::output::{print_json, print_table};
use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use unpost_core::checkpoint::CheckpointStore;
use unpost_core::config::Config;
use unpost_core::types::Backend;
use unpost_core::usage::{Remaining, UsageState, UsageTracker, Window};

#[derive(Serialize)]
struct WindowStatus {
    window: Window,
    key: String,
    used: u64,
    limit: Option<u64>,
    remaining: Remaining,
}

#[derive(Serialize)]
struct StatusOutput {
    root: String,
    backend: Backend,
    processed: usize,
    cursor: Option<String>,
    usage: Vec<WindowStatus>,
}

/// Read-only view of the durable state. Rolls usage windows in memory for
/// display but never writes either file.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let checkpoint = CheckpointStore::at_root(root)
        .load(true)
        .context("failed to load checkpoint")?;
    let tracker =
        UsageTracker::at_root(root, config.limits).context("failed to load usage counters")?;
    let usage = tracker.snapshot();

    let output = StatusOutput {
        root: root.display().to_string(),
        backend: config.backend,
        processed: checkpoint.len(),
        cursor: checkpoint.cursor().map(str::to_string),
        usage: [Window::Daily, Window::Monthly]
            .into_iter()
            .map(|window| window_status(&tracker, &usage, window))
            .collect(),
    };

    if json {
        return print_json(&output);
    }

    println!("Root:      {}", output.root);
    println!("Backend:   {}", output.backend);
    println!("Processed: {}", output.processed);
    println!(
        "Cursor:    {}",
        output.cursor.as_deref().unwrap_or("(start of timeline)")
    );
    println!();

    let rows = output
        .usage
        .iter()
        .map(|w| {
            vec![
                w.window.to_string(),
                w.key.clone(),
                w.used.to_string(),
                w.limit.map_or_else(|| "-".to_string(), |l| l.to_string()),
                fmt_remaining(w.remaining),
            ]
        })
        .collect();
    print_table(&["WINDOW", "KEY", "USED", "LIMIT", "REMAINING"], rows);
    Ok(())
}

fn window_status(tracker: &UsageTracker, usage: &UsageState, window: Window) -> WindowStatus {
    let (key, used) = match window {
        Window::Daily => (usage.day_key.clone(), usage.daily_count),
        Window::Monthly => (usage.month_key.clone(), usage.monthly_count),
    };
    WindowStatus {
        window,
        key,
        used,
        limit: tracker.limits().get(window),
        remaining: tracker.remaining(window),
    }
}

fn fmt_remaining(r: Remaining) -> String {
    match r {
        Remaining::Unlimited => "unlimited".to_string(),
        Remaining::Count(n) => n.to_string(),
    }
}
