//! Line commands accepted by the terminal front end.

use thiserror::Error;

use crate::engine::UiEvent;
use crate::filters::{PageSize, SortDir, SortKey, parse_number_or_default};

pub const HELP: &str = "\
commands:
  min-cap <usd>          minimum market cap
  max-price <usd|none>   maximum price, `none` for no limit
  sort <column>          name | symbol | price | market_cap | percent_change_24h
  dir <asc|desc>         sort direction
  click <column>         header click: toggle direction or switch column
  page-size <n|All>      10 | 20 | 50 | 100 | All
  next | prev            change page
  more                   reached the bottom of the table (All mode)
  reset                  restore default filters
  export                 write cryptos.csv
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Event(UiEvent),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("`{command}` expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let bad = |command: &'static str, expected: &'static str| CommandError::BadArgument {
        command,
        expected,
    };

    let event = match name {
        "help" | "?" => return Ok(Some(Command::Help)),
        "quit" | "exit" | "q" => return Ok(Some(Command::Quit)),
        "min-cap" => {
            let value = parse_number_or_default(arg, f64::NAN);
            if value.is_nan() || value < 0.0 {
                return Err(bad("min-cap", "a non-negative number"));
            }
            UiEvent::SetMinMarketCap(value)
        }
        "max-price" => match arg {
            Some("none") => UiEvent::SetMaxPrice(None),
            _ => {
                let value = parse_number_or_default(arg, f64::NAN);
                if value.is_nan() || value < 0.0 {
                    return Err(bad("max-price", "a non-negative number or `none`"));
                }
                UiEvent::SetMaxPrice(Some(value))
            }
        },
        "sort" => UiEvent::SetSortKey(
            arg.and_then(SortKey::parse)
                .ok_or_else(|| bad("sort", "a column name"))?,
        ),
        "click" => UiEvent::SortBy(
            arg.and_then(SortKey::parse)
                .ok_or_else(|| bad("click", "a column name"))?,
        ),
        "dir" => UiEvent::SetSortDir(
            arg.and_then(SortDir::parse)
                .ok_or_else(|| bad("dir", "`asc` or `desc`"))?,
        ),
        "page-size" => UiEvent::SetPageSize(
            arg.and_then(PageSize::parse)
                .ok_or_else(|| bad("page-size", "10, 20, 50, 100 or All"))?,
        ),
        "next" => UiEvent::NextPage,
        "prev" | "previous" => UiEvent::PreviousPage,
        "more" | "scroll" => UiEvent::ScrolledNearBottom,
        "reset" => UiEvent::Reset,
        "export" => UiEvent::Export,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(Command::Event(event)))
}
