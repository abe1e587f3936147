// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Citizen-facing message bodies.

use civic_core::{ChoiceOption, Language, ListSection, MessageBody, Module, TenantChannelConfig};

use crate::gateway::MAX_BUTTONS;
use crate::intent::{LANGUAGE_ID_PREFIX, MenuChoice, SKIP_ID};

/// Id prefix of the category buttons.
pub const CATEGORY_ID_PREFIX: &str = "cat_";

pub fn language_prompt() -> MessageBody {
    MessageBody::Buttons {
        prompt: "Welcome! Please choose your language.".into(),
        options: Language::ALL
            .iter()
            .map(|l| ChoiceOption::new(format!("{LANGUAGE_ID_PREFIX}{}", l.code()), l.label()))
            .collect(),
    }
}

/// Menu rows offered to this tenant's citizens, in display order.
///
/// Track status is always offered; the other rows follow enabled modules.
pub fn menu_options(tenant: &TenantChannelConfig) -> Vec<ChoiceOption> {
    let mut rows = Vec::new();
    if tenant.is_enabled(Module::Grievance) {
        rows.push(
            ChoiceOption::new(MenuChoice::Grievance.id(), "Register grievance")
                .with_description("Report a civic issue"),
        );
    }
    if tenant.is_enabled(Module::Appointment) {
        rows.push(
            ChoiceOption::new(MenuChoice::Appointment.id(), "Book appointment")
                .with_description("Meet an official"),
        );
    }
    rows.push(
        ChoiceOption::new(MenuChoice::TrackStatus.id(), "Track status")
            .with_description("Check an earlier request"),
    );
    rows
}

pub fn main_menu(tenant: &TenantChannelConfig) -> MessageBody {
    MessageBody::List {
        prompt: format!("{}: how can we help you today?", tenant.name),
        button_label: "View services".into(),
        sections: vec![ListSection {
            title: "Services".into(),
            rows: menu_options(tenant),
        }],
    }
}

pub fn service_unavailable(tenant: &TenantChannelConfig) -> MessageBody {
    MessageBody::text(format!(
        "Sorry, {} is not offering any services on this number right now.",
        tenant.name
    ))
}

pub fn name_prompt() -> MessageBody {
    MessageBody::text("Please tell us your full name.")
}

/// The category options shown as buttons: the first few available labels.
pub fn category_options(categories: &[String]) -> Vec<ChoiceOption> {
    categories
        .iter()
        .take(MAX_BUTTONS)
        .enumerate()
        .map(|(i, label)| ChoiceOption::new(format!("{CATEGORY_ID_PREFIX}{i}"), label))
        .collect()
}

pub fn category_prompt(categories: &[String]) -> MessageBody {
    MessageBody::Buttons {
        prompt: "Which category best describes your grievance? You can also type it.".into(),
        options: category_options(categories),
    }
}

pub fn description_prompt() -> MessageBody {
    MessageBody::text("Please describe the problem.")
}

pub fn location_prompt() -> MessageBody {
    MessageBody::Buttons {
        prompt: "Please share the address or landmark of the problem.".into(),
        options: vec![ChoiceOption::new(SKIP_ID, "Skip")],
    }
}

pub fn photo_prompt() -> MessageBody {
    MessageBody::Buttons {
        prompt: "Send a photo of the problem, or skip to submit.".into(),
        options: vec![ChoiceOption::new(SKIP_ID, "Skip")],
    }
}

pub fn otp_code(code: &str, ttl_minutes: i64) -> String {
    format!("Your verification code is {code}. It is valid for {ttl_minutes} minutes.")
}

pub fn otp_sent() -> MessageBody {
    MessageBody::text("We sent you a verification code. Please reply with it to continue.")
}

pub fn otp_invalid() -> MessageBody {
    MessageBody::text("That code is not valid. Please check it and try again, or type reset.")
}

pub fn otp_verified() -> MessageBody {
    MessageBody::text("Thank you, your number is verified.")
}

pub fn confirmation(reference: &str) -> MessageBody {
    MessageBody::text(format!(
        "Your grievance has been registered. Reference: {reference}. Please keep it for tracking."
    ))
}

pub fn apology() -> MessageBody {
    MessageBody::text(
        "Sorry, we could not register your grievance right now. Please try again later.",
    )
}

pub fn reset_ack() -> MessageBody {
    MessageBody::text("Your conversation has been reset. Send any message to start again.")
}

pub fn module_denied() -> MessageBody {
    MessageBody::text("Sorry, that service is not available here.")
}

pub fn invalid_option() -> MessageBody {
    MessageBody::text("Sorry, I did not understand that. Please pick an option from the menu.")
}

pub fn appointment_placeholder() -> MessageBody {
    MessageBody::text("Appointment booking will be available soon.")
}

pub fn track_placeholder() -> MessageBody {
    MessageBody::text("Status tracking will be available soon. Please keep your reference number.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn tenant(modules: &[Module]) -> TenantChannelConfig {
        TenantChannelConfig {
            tenant_id: "t1".into(),
            name: "Ward Office".into(),
            active: true,
            credentials: None,
            modules: modules.iter().copied().collect::<BTreeSet<_>>(),
            org_units: vec![],
        }
    }

    #[test]
    fn menu_follows_enabled_modules() {
        let ids: Vec<String> = menu_options(&tenant(&[Module::Grievance]))
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec!["menu_grievance", "menu_track"]);

        let all = menu_options(&tenant(&[Module::Grievance, Module::Appointment]));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn language_buttons_carry_language_codes() {
        let MessageBody::Buttons { options, .. } = language_prompt() else {
            panic!("expected buttons");
        };
        let ids: Vec<&str> = options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["lang_en", "lang_hi", "lang_mr"]);
    }

    #[test]
    fn category_buttons_show_the_first_three() {
        let labels: Vec<String> = ["Roads", "Water", "Power", "Parks"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let options = category_options(&labels);
        assert_eq!(options.len(), 3);
        assert_eq!(options[2].id, "cat_2");
        assert_eq!(options[2].title, "Power");
    }
}
