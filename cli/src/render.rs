//! Plain-text rendering of a converter snapshot.

use chrono::{DateTime, TimeZone};
use tcurrency_common::catalog::{self, CurrencyInfo};
use tcurrency_converter::Settings;
use tcurrency_ledger::LedgerSnapshot;

/// One line per currency, then the status and rate source lines.
///
/// With `show_exchange_source` off, the update label and the source line are
/// left out; loading and unavailable notices are always shown.
pub fn render<Tz: TimeZone>(
    snapshot: &LedgerSnapshot,
    settings: &Settings,
    now: &DateTime<Tz>,
) -> Vec<String> {
    let mut lines: Vec<String> = snapshot
        .rows
        .iter()
        .map(|row| {
            let marker = if row.active { ">" } else { " " };
            let symbol = if settings.show_symbol {
                row.descriptor.symbol.as_str()
            } else {
                ""
            };
            format!(
                "{marker} {flag:<2} {code:<4}{symbol}{amount}",
                flag = row.descriptor.flag,
                code = row.currency.code(),
                amount = row.amount,
            )
            .trim_end()
            .to_string()
        })
        .collect();

    lines.extend(status_line(snapshot, settings.show_exchange_source, now));
    if settings.show_exchange_source {
        lines.push(format!("source: {}", settings.exchange_source.label()));
    }
    lines
}

fn status_line<Tz: TimeZone>(
    snapshot: &LedgerSnapshot,
    show_update: bool,
    now: &DateTime<Tz>,
) -> Option<String> {
    if snapshot.loading {
        return Some("loading rates...".to_string());
    }
    if snapshot.data_unavailable {
        let label = snapshot.update_label(now);
        return Some(if label.is_empty() {
            "rates unavailable".to_string()
        } else {
            format!("rates unavailable, showing data {label}")
        });
    }
    let label = snapshot.update_label(now);
    (show_update && !label.is_empty()).then_some(label)
}

/// Currency picker listing: favorites, then matches grouped by initial.
///
/// Favorites are only listed when `query` is blank.
pub fn render_catalog(query: &str) -> Vec<String> {
    let entry = |info: &CurrencyInfo| format!("  {:<2} {:<4}{}", info.flag, info.code, info.name);
    let mut lines = Vec::new();

    if query.trim().is_empty() {
        lines.push("Favorites".to_string());
        lines.extend(catalog::favorites().into_iter().map(entry));
    }

    let matches = catalog::search(query);
    if matches.is_empty() {
        lines.push(format!("no currency matches {query:?}"));
        return lines;
    }
    for (initial, infos) in catalog::grouped_by_initial(&matches) {
        lines.push(initial.to_string());
        lines.extend(infos.into_iter().map(entry));
    }
    lines
}
