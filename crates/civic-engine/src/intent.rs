// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reduction of inbound payloads to a closed set of intents.
//!
//! Classification depends on the current step: digits are a code only while
//! a code is expected, and greetings are only recognized outside the data
//! collection steps so that a description of "hello" is kept as text.

use civic_core::{ChoiceOption, EventPayload, Language, Step};

const RESET_WORDS: &[&str] = &["reset", "restart"];
const SKIP_WORDS: &[&str] = &["skip"];
const GREETING_WORDS: &[&str] = &[
    "hi", "hii", "hello", "hey", "namaste", "namaskar", "start", "menu", "नमस्ते", "नमस्कार",
];

/// Button and row id prefixes shared by the prompts and the classifier.
pub const LANGUAGE_ID_PREFIX: &str = "lang_";
pub const MENU_ID_PREFIX: &str = "menu_";
pub const SKIP_ID: &str = "skip";

/// Entries of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Grievance,
    Appointment,
    TrackStatus,
}

impl MenuChoice {
    pub fn id(self) -> &'static str {
        match self {
            MenuChoice::Grievance => "menu_grievance",
            MenuChoice::Appointment => "menu_appointment",
            MenuChoice::TrackStatus => "menu_track",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "menu_grievance" => Some(MenuChoice::Grievance),
            "menu_appointment" => Some(MenuChoice::Appointment),
            "menu_track" => Some(MenuChoice::TrackStatus),
            _ => None,
        }
    }
}

/// What the citizen meant, independent of how the provider delivered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundIntent {
    Greeting,
    Reset,
    Skip,
    LanguageChoice(Language),
    MenuChoice(MenuChoice),
    /// A tapped option the classifier has no special meaning for.
    OptionReply { id: String, title: String },
    OtpCode(String),
    Media {
        media_id: String,
        caption: Option<String>,
    },
    FreeText(String),
    Empty,
}

impl InboundIntent {
    pub fn classify(payload: &EventPayload, step: Step) -> Self {
        match payload {
            EventPayload::Media {
                media_id, caption, ..
            } => InboundIntent::Media {
                media_id: media_id.clone(),
                caption: caption.clone(),
            },
            EventPayload::Interactive { option_id, title } => classify_option(option_id, title),
            EventPayload::Text { body } => classify_text(body, step),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            InboundIntent::Greeting => "greeting",
            InboundIntent::Reset => "reset",
            InboundIntent::Skip => "skip",
            InboundIntent::LanguageChoice(_) => "language_choice",
            InboundIntent::MenuChoice(_) => "menu_choice",
            InboundIntent::OptionReply { .. } => "option_reply",
            InboundIntent::OtpCode(_) => "otp_code",
            InboundIntent::Media { .. } => "media",
            InboundIntent::FreeText(_) => "free_text",
            InboundIntent::Empty => "empty",
        }
    }
}

fn classify_option(id: &str, title: &str) -> InboundIntent {
    if let Some(code) = id.strip_prefix(LANGUAGE_ID_PREFIX)
        && let Some(language) = Language::from_code(code)
    {
        return InboundIntent::LanguageChoice(language);
    }
    if let Some(choice) = MenuChoice::from_id(id) {
        return InboundIntent::MenuChoice(choice);
    }
    if id == SKIP_ID {
        return InboundIntent::Skip;
    }
    InboundIntent::OptionReply {
        id: id.to_string(),
        title: title.to_string(),
    }
}

fn classify_text(body: &str, step: Step) -> InboundIntent {
    let text = body.trim();
    if text.is_empty() {
        return InboundIntent::Empty;
    }
    let lower = text.to_lowercase();
    if RESET_WORDS.contains(&lower.as_str()) {
        return InboundIntent::Reset;
    }
    if SKIP_WORDS.contains(&lower.as_str()) {
        return InboundIntent::Skip;
    }

    match step {
        Step::Start | Step::MainMenu if GREETING_WORDS.contains(&lower.as_str()) => {
            InboundIntent::Greeting
        }
        Step::LanguageSelection => {
            if let Some(language) = Language::from_label(text) {
                return InboundIntent::LanguageChoice(language);
            }
            if let Some(index) = parse_choice_number(text, Language::ALL.len()) {
                return InboundIntent::LanguageChoice(Language::ALL[index]);
            }
            if GREETING_WORDS.contains(&lower.as_str()) {
                return InboundIntent::Greeting;
            }
            InboundIntent::FreeText(text.to_string())
        }
        Step::OtpVerification if text.chars().all(|c| c.is_ascii_digit()) => {
            InboundIntent::OtpCode(text.to_string())
        }
        _ => InboundIntent::FreeText(text.to_string()),
    }
}

/// Parses a 1-based choice number into a 0-based index below `count`.
pub fn parse_choice_number(text: &str, count: usize) -> Option<usize> {
    let n: usize = text.trim().trim_end_matches('.').parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

/// Resolves a reply against offered options by id, title (case-insensitive)
/// or 1-based position.
pub fn resolve_option<'a>(options: &'a [ChoiceOption], input: &str) -> Option<&'a ChoiceOption> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let lower = input.to_lowercase();
    if let Some(option) = options
        .iter()
        .find(|o| o.id == input || o.title.to_lowercase() == lower)
    {
        return Some(option);
    }
    parse_choice_number(input, options.len()).map(|i| &options[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(body: &str) -> EventPayload {
        EventPayload::Text { body: body.into() }
    }

    fn tap(id: &str, title: &str) -> EventPayload {
        EventPayload::Interactive {
            option_id: id.into(),
            title: title.into(),
        }
    }

    #[test]
    fn reset_and_skip_win_in_every_step() {
        for step in [Step::Start, Step::GrievanceDescription, Step::OtpVerification] {
            assert_eq!(InboundIntent::classify(&text(" RESTART "), step), InboundIntent::Reset);
            assert_eq!(InboundIntent::classify(&text("Skip"), step), InboundIntent::Skip);
        }
    }

    #[test]
    fn greeting_is_text_inside_data_steps() {
        assert_eq!(
            InboundIntent::classify(&text("Hello"), Step::Start),
            InboundIntent::Greeting
        );
        assert_eq!(
            InboundIntent::classify(&text("Hello"), Step::GrievanceDescription),
            InboundIntent::FreeText("Hello".into())
        );
    }

    #[test]
    fn language_by_button_name_or_number() {
        assert_eq!(
            InboundIntent::classify(&tap("lang_mr", "मराठी"), Step::LanguageSelection),
            InboundIntent::LanguageChoice(Language::Marathi)
        );
        assert_eq!(
            InboundIntent::classify(&text("hindi"), Step::LanguageSelection),
            InboundIntent::LanguageChoice(Language::Hindi)
        );
        assert_eq!(
            InboundIntent::classify(&text("1"), Step::LanguageSelection),
            InboundIntent::LanguageChoice(Language::English)
        );
        assert_eq!(
            InboundIntent::classify(&text("7"), Step::LanguageSelection),
            InboundIntent::FreeText("7".into())
        );
    }

    #[test]
    fn digits_are_codes_only_at_verification() {
        assert_eq!(
            InboundIntent::classify(&text("123456"), Step::OtpVerification),
            InboundIntent::OtpCode("123456".into())
        );
        assert_eq!(
            InboundIntent::classify(&text("123456"), Step::GrievanceName),
            InboundIntent::FreeText("123456".into())
        );
    }

    #[test]
    fn option_ids_map_to_menu_or_reply() {
        assert_eq!(
            InboundIntent::classify(&tap("menu_grievance", "Grievance"), Step::MainMenu),
            InboundIntent::MenuChoice(MenuChoice::Grievance)
        );
        assert_eq!(
            InboundIntent::classify(&tap("cat_1", "Water"), Step::GrievanceCategory),
            InboundIntent::OptionReply {
                id: "cat_1".into(),
                title: "Water".into()
            }
        );
        assert_eq!(
            InboundIntent::classify(&tap("skip", "Skip"), Step::GrievanceLocation),
            InboundIntent::Skip
        );
    }

    #[test]
    fn media_and_empty() {
        let media = EventPayload::Media {
            media_id: "M1".into(),
            mime_type: None,
            caption: Some("leak".into()),
        };
        assert_eq!(
            InboundIntent::classify(&media, Step::GrievancePhoto),
            InboundIntent::Media {
                media_id: "M1".into(),
                caption: Some("leak".into())
            }
        );
        assert_eq!(
            InboundIntent::classify(&text("   "), Step::MainMenu),
            InboundIntent::Empty
        );
    }

    #[test]
    fn resolve_option_by_id_title_or_number() {
        let options = vec![
            ChoiceOption::new("cat_0", "Roads"),
            ChoiceOption::new("cat_1", "Water Supply"),
        ];
        assert_eq!(resolve_option(&options, "cat_1").unwrap().title, "Water Supply");
        assert_eq!(resolve_option(&options, "water supply").unwrap().id, "cat_1");
        assert_eq!(resolve_option(&options, "1").unwrap().id, "cat_0");
        assert_eq!(resolve_option(&options, "2.").unwrap().id, "cat_1");
        assert!(resolve_option(&options, "3").is_none());
        assert!(resolve_option(&options, "").is_none());
    }
}
