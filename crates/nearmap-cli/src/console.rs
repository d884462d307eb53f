//! Terminal rendering of the page regions.

use std::sync::Mutex;

use nearmap_client::{AppView, RowHandle};
use nearmap_core::{Business, UiRegion};

/// Prints every region update to stdout; errors go to stderr.
///
/// Rows are numbered from 1 on screen, which is also how the interactive
/// `hover`/`click` commands address them.
#[derive(Default)]
pub(crate) struct ConsoleView {
    rows: Mutex<Vec<String>>,
}

fn region_label(region: UiRegion) -> &'static str {
    match region {
        UiRegion::Map => "map",
        UiRegion::LocationLabel => "location",
        UiRegion::SearchInput => "search",
        UiRegion::BusinessList => "businesses",
    }
}

pub(crate) fn format_row(index: usize, business: &Business) -> String {
    let mut line = format!("{:>2}. {}", index + 1, business.name);
    if let Some(address) = business.location.formatted_address.first() {
        line.push_str(&format!(" | {address}"));
    }
    if let Some(distance) = business.distance {
        line.push_str(&format!(" | {distance} m"));
    }
    if let Some(rating) = business.rating {
        line.push_str(&format!(" | {rating:.1}/10"));
    }
    if business.website.is_none() {
        line.push_str(" | no website");
    }
    line
}

impl AppView for ConsoleView {
    fn show_location_label(&self, text: &str) {
        println!("location: {text}");
    }

    fn render_businesses(&self, businesses: &[Business]) -> Vec<RowHandle> {
        let lines: Vec<String> = businesses
            .iter()
            .enumerate()
            .map(|(i, b)| format_row(i, b))
            .collect();
        for line in &lines {
            println!("{line}");
        }
        *self
            .rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = lines;
        (0..businesses.len()).map(RowHandle).collect()
    }

    fn show_no_results(&self) {
        println!("No businesses found nearby.");
    }

    fn show_error(&self, region: UiRegion, message: &str) {
        eprintln!("[{}] {message}", region_label(region));
    }

    fn focus_search_input(&self) {
        println!("Enter a ZIP code or address with `search <query>`.");
    }

    fn set_row_highlight(&self, row: RowHandle, highlighted: bool) {
        let rows = self
            .rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(line) = rows.get(row.0) {
            let marker = if highlighted { ">" } else { " " };
            println!("{marker}{line}");
        }
    }

    fn open_url(&self, url: &str) {
        println!("open: {url}");
    }
}
