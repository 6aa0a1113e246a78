//! md Runtime - demo
//!
//! Runs a scripted session against a small page: open a dialog through its
//! trigger, stack a second one, dismiss it with Escape, close the first with
//! an action button. Pass a JSON configuration file as the first argument to
//! override the defaults.

use anyhow::{Context, Result};
use md_runtime::{DialogState, NodeId, Runtime, RuntimeConfig};
use tracing_subscriber::EnvFilter;

const PAGE: &str = r#"
<main id="main">
  <button id="open-settings" data-md-dialog="{target: '#settings'}">Settings</button>
</main>
<div id="settings" class="md-dialog">
  <div class="md-dialog__scrim"></div>
  <div class="md-dialog__container">
    <input id="display-name" autofocus>
    <button id="open-confirm" data-md-dialog="{target: '#confirm', stacked: true}">Delete account</button>
    <button id="save" data-md-dialog-action="save">Save</button>
  </div>
</div>
<div id="confirm" class="md-dialog">
  <div class="md-dialog__container">
    <button data-md-dialog-action="cancel">Cancel</button>
  </div>
</div>
"#;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading config {}", path))?;
            RuntimeConfig::from_json(&text).with_context(|| format!("parsing config {}", path))?
        }
        None => RuntimeConfig::default(),
    };

    tracing::info!("md runtime {}", md_runtime::VERSION);
    let mut rt = md_runtime::start(PAGE, config).context("parsing demo page")?;

    let opener = element(&rt, "open-settings")?;
    let settings = element(&rt, "settings")?;
    let confirm = element(&rt, "confirm")?;
    rt.document_mut().focus(opener);

    rt.click(opener);
    report(&mut rt, "settings trigger clicked", &[settings, confirm]);

    rt.click(element(&rt, "open-confirm")?);
    report(&mut rt, "confirm trigger clicked", &[settings, confirm]);

    rt.key("Escape", false);
    report(&mut rt, "escape pressed", &[settings, confirm]);

    rt.click(element(&rt, "save")?);
    report(&mut rt, "save clicked", &[settings, confirm]);

    tracing::info!(
        "settings returned {:?}, focus back on opener: {}",
        rt.return_value(settings),
        rt.document().focused() == Some(opener)
    );
    Ok(())
}

fn element(rt: &Runtime, id: &str) -> Result<NodeId> {
    rt.document()
        .get_element_by_id(id)
        .with_context(|| format!("demo page has no #{}", id))
}

fn report(rt: &mut Runtime, step: &str, dialogs: &[NodeId]) {
    let frames = rt.settle();
    let states: Vec<String> = dialogs
        .iter()
        .map(|d| rt.dialog_state(*d).unwrap_or(DialogState::Inactive).to_string())
        .collect();
    tracing::info!(
        "{} ({} frames): dialogs [{}], stack depth {}, scroll locks {}",
        step,
        frames,
        states.join(", "),
        rt.overlays().depth(),
        rt.overlays().lock_count()
    );
}
