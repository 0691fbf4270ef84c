use magnolia::error::EXIT_NO_ACTION;
use magnolia::history::VisitKind;
use magnolia::selector::{ExternalSelector, Resolution, SelectorBridge};

use crate::output::print_json;
use crate::session::Session;

/// Interactive pick. Prints one action on success; exits `EXIT_NO_ACTION`
/// when nothing was picked.
pub fn cmd_pick(
    session: &Session,
    kind: VisitKind,
    limit: Option<i64>,
    json: bool,
) -> anyhow::Result<i32> {
    let dispatcher = session.dispatcher()?;
    let selector = ExternalSelector::from_settings(&session.settings.selector);
    let mut bridge = SelectorBridge::new(&dispatcher, selector);

    match bridge.run(kind, limit)? {
        Resolution::Selected(action) => {
            if json {
                print_json(&action, &dispatcher.styler());
            } else {
                println!("{}", action.token());
            }
            Ok(0)
        }
        Resolution::Cancelled => Ok(EXIT_NO_ACTION),
        Resolution::Empty => {
            eprintln!("[magnolia] no {} history to choose from", kind.label());
            Ok(EXIT_NO_ACTION)
        }
    }
}
