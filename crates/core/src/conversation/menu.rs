//! User-facing texts and keyboards.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::callback::CallbackAction;
use crate::catalog::{SearchMode, SearchResult, MAX_DISPLAYED_RESULTS};
use crate::gateway::{Button, Keyboard};

pub const MENU_PROMPT: &str = "👋 Hi! What do you want to search for?";
pub const PICK_MODE_FIRST: &str = "Pick a search option first:";
pub const NO_RESULTS: &str = "⚠️ No results found. Try again:";
pub const DOWNLOADING: &str = "⏳ Downloading... please wait.";
pub const DOWNLOAD_FAILED: &str = "⚠️ Could not download the file. Try again.";
pub const GENERIC_CAPTION: &str = "🎵 Here is your track";

/// Characters with meaning in legacy Markdown.
static MARKDOWN_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([_*`\[])").expect("static regex"));

/// Bold user text for a legacy Markdown message.
///
/// Legacy Markdown allows no escapes inside an entity, so special
/// characters are escaped between bold runs: `AC_DC` becomes `*AC*\_*DC*`.
pub fn bold_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for special in MARKDOWN_SPECIAL.find_iter(text) {
        push_bold_run(&mut out, &text[last..special.start()]);
        out.push('\\');
        out.push_str(special.as_str());
        last = special.end();
    }
    push_bold_run(&mut out, &text[last..]);
    out
}

fn push_bold_run(out: &mut String, run: &str) {
    if run.trim().is_empty() {
        out.push_str(run);
    } else {
        out.push('*');
        out.push_str(run);
        out.push('*');
    }
}

pub fn mode_button_label(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Track => "🎵 Search track",
        SearchMode::Artist => "👤 Search artist",
        SearchMode::Album => "💿 Search album",
    }
}

pub fn query_prompt(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Track => "🎵 Type the name of the track:",
        SearchMode::Artist => "👤 Type the name of the artist:",
        SearchMode::Album => "💿 Type the name of the album:",
    }
}

/// Markdown header above a result list.
pub fn results_header(query: &str) -> String {
    format!("🔎 Results for {}:", bold_markdown(query))
}

/// Unformatted header, used when the Markdown one is rejected.
pub fn plain_results_header(query: &str) -> String {
    format!("🔎 Results for {}:", query)
}

/// Error text shown when uploading the file failed.
pub fn send_failed(error: &str) -> String {
    format!("⚠️ Error sending the file: {}", error)
}

/// One button per search mode.
pub fn main_menu() -> Keyboard {
    Keyboard::single_column(SearchMode::ALL.into_iter().map(|mode| {
        Button::new(
            mode_button_label(mode),
            CallbackAction::Search(mode).encode(),
        )
    }))
}

pub fn back_button() -> Button {
    Button::new("⬅️ Back", CallbackAction::Back.encode())
}

/// One button per result, in order, then a back button.
pub fn results_keyboard(results: &[SearchResult]) -> Keyboard {
    let buttons = results
        .iter()
        .take(MAX_DISPLAYED_RESULTS)
        .enumerate()
        .map(|(i, r)| {
            Button::new(
                r.label(i + 1),
                CallbackAction::Track(r.id.as_str().to_string()).encode(),
            )
        })
        .chain(std::iter::once(back_button()));

    Keyboard::single_column(buttons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_main_menu_has_all_modes() {
        let menu = main_menu();
        let data: Vec<&str> = menu.buttons().map(|b| b.data.as_str()).collect();
        assert_eq!(data, vec!["search:track", "search:artist", "search:album"]);
    }

    #[test]
    fn test_results_keyboard_order_and_back() {
        let results = vec![
            fixtures::search_result(11, "First", "A"),
            fixtures::search_result(22, "Second", "B"),
            fixtures::search_result(33, "Third", "C"),
        ];
        let keyboard = results_keyboard(&results);
        let buttons: Vec<_> = keyboard.buttons().collect();

        assert_eq!(buttons.len(), 4);
        assert_eq!(buttons[0].label, "1. First - A");
        assert_eq!(buttons[0].data, "track:11");
        assert_eq!(buttons[2].data, "track:33");
        assert_eq!(buttons[3].data, "back");
    }

    #[test]
    fn test_results_keyboard_caps_entries() {
        let keyboard = results_keyboard(&fixtures::numbered_results(25, "X"));
        assert_eq!(keyboard.buttons().count(), MAX_DISPLAYED_RESULTS + 1);
    }

    #[test]
    fn test_results_header_bolds_plain_query() {
        assert_eq!(results_header("plain"), "🔎 Results for *plain*:");
        assert_eq!(results_header("daft punk"), "🔎 Results for *daft punk*:");
    }

    #[test]
    fn test_special_characters_stay_outside_bold() {
        assert_eq!(results_header("AC_DC"), r"🔎 Results for *AC*\_*DC*:");
        assert_eq!(results_header("*NSYNC"), r"🔎 Results for \**NSYNC*:");
        assert_eq!(bold_markdown("[x] `y`"), r"\[*x] *\`*y*\`");
        assert_eq!(bold_markdown("__"), r"\_\_");
    }

    #[test]
    fn test_bold_runs_contain_no_escapes() {
        for query in ["AC_DC", "*NSYNC", "a*b_c`d[e", "_leading", "trailing*"] {
            let rendered = bold_markdown(query);
            // Every entity between a pair of unescaped asterisks is escape free.
            let mut in_bold = false;
            let mut chars = rendered.chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        assert!(!in_bold, "escape inside bold for {:?}: {}", query, rendered);
                        chars.next();
                    }
                    '*' => in_bold = !in_bold,
                    _ => {}
                }
            }
            assert!(!in_bold, "unclosed bold for {:?}: {}", query, rendered);
        }
    }

    #[test]
    fn test_plain_results_header() {
        assert_eq!(plain_results_header("*NSYNC"), "🔎 Results for *NSYNC:");
    }
}
