use std::path::Path;

use anyhow::Context as _;

use magnolia::query::Styler;
use magnolia::recorder::Recorder;

use crate::output::print_json;
use crate::session::Session;

pub fn cmd_record_dir(session: &Session, path: &Path, json: bool) -> anyhow::Result<i32> {
    let classifier = session.settings.classifier();
    let recorder = Recorder::new(&session.store, &classifier);
    let visit = recorder
        .record_directory_visit(path)
        .with_context(|| format!("cannot record visit to {}", path.display()))?;
    if json {
        print_json(&visit, &Styler::new(session.config.color_enabled));
    }
    Ok(0)
}

pub fn cmd_record_file(
    session: &Session,
    path: &Path,
    action: &str,
    json: bool,
) -> anyhow::Result<i32> {
    let classifier = session.settings.classifier();
    let recorder = Recorder::new(&session.store, &classifier);
    let visit = recorder
        .record_file_visit(path, action)
        .with_context(|| format!("cannot record visit to {}", path.display()))?;
    if json {
        print_json(&visit, &Styler::new(session.config.color_enabled));
    }
    Ok(0)
}
