use magnolia::query::{Query, QueryOutput};

use crate::output::{print_json, print_lines};
use crate::session::Session;

pub fn cmd_query(session: &Session, query: &Query, json: bool) -> anyhow::Result<i32> {
    let dispatcher = session.dispatcher()?;
    let output = dispatcher.execute(query)?;
    if output.is_empty() {
        tracing::debug!(?query, "no history entries found");
    }
    let styler = dispatcher.styler();
    if json && !matches!(output, QueryOutput::Rows(_)) {
        print_json(&output, &styler);
    } else {
        print_lines(&output.to_lines(&styler)?)?;
    }
    Ok(0)
}
