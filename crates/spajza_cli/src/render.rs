//! Plain-text rendering for terminal output.

use chrono::{DateTime, Utc};
use spajza_core::{CategoryGroup, Product, Suggestion};
use std::fmt::Write;

/// One block per category: header, then `[ ]`/`[x]` rows with ids.
pub fn grouped(groups: &[CategoryGroup<'_>]) -> String {
    if groups.is_empty() {
        return "nothing to show\n".to_string();
    }
    let mut out = String::new();
    for group in groups {
        let _ = writeln!(out, "{} ({})", group.category, group.products.len());
        for product in &group.products {
            let _ = writeln!(out, "  {}", row(product));
        }
    }
    out
}

fn row(product: &Product) -> String {
    let mark = if product.is_stocked() { "x" } else { " " };
    match &product.quantity {
        Some(quantity) => format!("[{mark}] {} ({quantity})  #{}", product.name, product.id),
        None => format!("[{mark}] {}  #{}", product.name, product.id),
    }
}

/// Answer text followed by its cited sources.
pub fn suggestion(suggestion: &Suggestion) -> String {
    let mut out = String::new();
    if suggestion.text.trim().is_empty() {
        out.push_str("no suggestion returned\n");
    } else {
        let _ = writeln!(out, "{}", suggestion.text.trim_end());
    }
    if !suggestion.sources.is_empty() {
        out.push_str("\nSources:\n");
        for source in &suggestion.sources {
            let title = source.title.as_deref().unwrap_or("untitled");
            match &source.uri {
                Some(uri) => {
                    let _ = writeln!(out, "- {title}: {uri}");
                }
                None => {
                    let _ = writeln!(out, "- {title}");
                }
            }
        }
    }
    out
}

pub fn last_sync(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => format!("synced at {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => "not synced yet".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{grouped, last_sync, suggestion};
    use spajza_core::{ListService, MemoryKeyValueStore, Source, Suggestion, ViewTab};

    #[test]
    fn grouped_marks_stocked_rows_and_shows_ids() {
        let service = ListService::open(MemoryKeyValueStore::new());
        let text = grouped(&service.grouped_view(ViewTab::Inventory, ""));

        assert!(text.contains("Mliečne výrobky (2)"));
        assert!(text.contains("[ ] Mlieko (2ks)  #1"));
        assert!(text.contains("[x] Vajíčka (10ks)  #3"));
    }

    #[test]
    fn grouped_reports_empty_views() {
        let service = ListService::open(MemoryKeyValueStore::new());
        assert_eq!(
            grouped(&service.grouped_view(ViewTab::Shopping, "nothing-matches")),
            "nothing to show\n"
        );
    }

    #[test]
    fn suggestion_lists_sources_with_fallback_title() {
        let text = suggestion(&Suggestion {
            text: "Omeleta".to_string(),
            sources: vec![Source {
                title: None,
                uri: Some("https://example.com/omeleta".to_string()),
            }],
        });
        assert!(text.starts_with("Omeleta\n"));
        assert!(text.contains("- untitled: https://example.com/omeleta"));
    }

    #[test]
    fn last_sync_without_time() {
        assert_eq!(last_sync(None), "not synced yet");
    }
}
