use comfy_table::{Cell, CellAlignment, Table};

use crate::engine::View;
use crate::export::{format_percent_change, format_price, format_short_number};
use crate::filters::{SortDir, SortKey};

const COLUMNS: [(SortKey, &str, CellAlignment); 4] = [
    (SortKey::Name, "Name", CellAlignment::Left),
    (SortKey::Price, "Price (USD)", CellAlignment::Right),
    (SortKey::MarketCap, "Market Cap", CellAlignment::Right),
    (SortKey::PercentChange24h, "24h % Change", CellAlignment::Right),
];

pub const NO_RESULT: &str = "No result";
pub const LOADING: &str = "Loading...";

/// Render a view as plain text: the table, then the pager in paged mode.
/// A failed fetch renders only the error message.
pub fn render_view(view: &View) -> String {
    if let Some(error) = &view.error {
        return format!("Error: {error}");
    }

    let mut table = Table::new();
    table.set_header(COLUMNS.iter().map(|(key, label, _)| {
        let label = if *key == view.filters.sort_key {
            let arrow = match view.filters.sort_dir {
                SortDir::Asc => '▲',
                SortDir::Desc => '▼',
            };
            format!("{label} {arrow}")
        } else {
            label.to_string()
        };
        Cell::new(label)
    }));

    if view.rows.is_empty() && !view.loading {
        table.add_row(vec![Cell::new(NO_RESULT)]);
    }
    for row in &view.rows {
        let usd = row.usd();
        let mut name = format!("{} {}", row.symbol, row.name);
        if view.logos.contains_key(&row.id) {
            name.insert_str(0, "◉ ");
        }
        let cells = [
            name,
            format_price(usd.price),
            format!("${}", format_short_number(usd.market_cap)),
            format_percent_change(usd.percent_change_24h),
        ];
        table.add_row(
            cells
                .into_iter()
                .zip(COLUMNS)
                .map(|(text, (_, _, align))| Cell::new(text).set_alignment(align)),
        );
    }
    if view.loading {
        table.add_row(vec![Cell::new(LOADING)]);
    }

    let mut out = table.to_string();
    if view.shows_pagination() {
        out.push_str(&format!("\n[Previous]  Page {}  [Next]", view.filters.page));
    }
    if let Some(status) = &view.status {
        out.push('\n');
        out.push_str(status);
    }
    out
}
