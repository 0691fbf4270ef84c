use std::io::Write as _;

use magnolia::query::{Styler, pretty_json};

/// Pretty-print any serializable value as JSON to stdout, styled like the
/// plain-text output.
pub fn print_json(value: &(impl serde::Serialize + ?Sized), styler: &Styler) {
    match serde_json::to_value(value) {
        Ok(json) => println!("{}", pretty_json(&json, styler)),
        Err(e) => eprintln!("[magnolia] JSON serialization error: {e}"),
    }
}

/// Write a fully computed page of lines. A closed pipe (e.g. `| head`) is not an error.
pub fn print_lines(lines: &[String]) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    let written = lines
        .iter()
        .try_for_each(|line| writeln!(out, "{line}"))
        .and_then(|()| out.flush());
    match written {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Print an error and map it to the process exit code.
pub fn report(e: &anyhow::Error) -> i32 {
    eprintln!("[magnolia] error: {e:#}");
    e.downcast_ref::<magnolia::Error>()
        .map_or(1, magnolia::Error::exit_code)
}
