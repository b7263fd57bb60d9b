//! Line-oriented command input standing in for the page's buttons and fields.
//!
//! ```text
//! connect
//! eth 0.5 | usd 1500 | price 3000
//! buy | sell
//! hover buy | hover sell | leave
//! ```

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::warn;

use crate::form::InputField;
use crate::models::Side;
use crate::session::Event;

/// Parse one command line. Blank lines and unknown commands yield `None`.
pub fn parse_command(line: &str) -> Option<Event> {
    let mut words = line.split_whitespace();
    let command = words.next()?.to_ascii_lowercase();
    let arg = words.next();
    let event = match (command.as_str(), arg) {
        ("connect", None) => Event::Connect,
        ("eth", value) => Event::Input(InputField::EthSize, value.unwrap_or_default().to_string()),
        ("usd", value) => Event::Input(InputField::UsdSize, value.unwrap_or_default().to_string()),
        ("price", value) => Event::Input(InputField::LimitPrice, value.unwrap_or_default().to_string()),
        ("buy", None) => Event::Click(Side::Buy),
        ("sell", None) => Event::Click(Side::Sell),
        ("hover", Some(side)) => Event::Hover(Some(side_of(side)?)),
        ("leave", None) => Event::Hover(None),
        _ => return None,
    };
    Some(event)
}

fn side_of(word: &str) -> Option<Side> {
    match word.to_ascii_lowercase().as_str() {
        "buy" => Some(Side::Buy),
        "sell" => Some(Side::Sell),
        _ => None,
    }
}

/// Forward parsed commands from `reader` until it hits EOF or the session
/// stops listening.
pub async fn forward_commands<Rd>(reader: Rd, events: mpsc::Sender<Event>) -> std::io::Result<()>
where
    Rd: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(event) = parse_command(&line) else {
            warn!(%line, "[CLI] unknown command");
            continue;
        };
        if events.send(event).await.is_err() {
            break;
        }
    }
    Ok(())
}
