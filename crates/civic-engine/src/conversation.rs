// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation state machine.
//!
//! [`ConversationEngine::advance`] is a total function over (step, intent):
//! every combination produces at least one reply and a well-defined next
//! step. Storage and delivery happen in the caller.

use std::sync::Arc;
use std::time::Duration;

use civic_config::model::ConversationConfig;
use civic_core::{
    Draft, InboundEvent, MessageBody, Module, PendingAction, Session, Step, TenantChannelConfig,
};
use civic_prometheus::record_transition;
use tracing::{debug, info};

use crate::finalize::Finalizer;
use crate::intent::{InboundIntent, MenuChoice, resolve_option};
use crate::otp::OtpVerifier;
use crate::prompts;
use crate::router::CategoryRouter;

/// What the caller does with the session after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Save the mutated session.
    Keep,
    /// Delete the session; the next message starts over.
    Clear,
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub disposition: Disposition,
    pub replies: Vec<MessageBody>,
    /// Delay after which the main menu is offered again in a fresh session.
    pub follow_up: Option<Duration>,
}

impl Transition {
    fn keep(replies: Vec<MessageBody>) -> Self {
        Self {
            disposition: Disposition::Keep,
            replies,
            follow_up: None,
        }
    }

    fn clear(replies: Vec<MessageBody>) -> Self {
        Self {
            disposition: Disposition::Clear,
            replies,
            follow_up: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationSettings {
    pub menu_redisplay_delay: Duration,
}

impl ConversationSettings {
    pub fn from_config(config: &ConversationConfig) -> Self {
        Self {
            menu_redisplay_delay: Duration::from_secs(config.menu_redisplay_delay_secs),
        }
    }
}

pub struct ConversationEngine {
    otp: Arc<OtpVerifier>,
    router: CategoryRouter,
    finalizer: Finalizer,
    settings: ConversationSettings,
}

impl ConversationEngine {
    pub fn new(
        otp: Arc<OtpVerifier>,
        router: CategoryRouter,
        finalizer: Finalizer,
        settings: ConversationSettings,
    ) -> Self {
        Self {
            otp,
            router,
            finalizer,
            settings,
        }
    }

    pub fn otp(&self) -> &Arc<OtpVerifier> {
        &self.otp
    }

    /// Applies one inbound event to `session`.
    pub async fn advance(
        &self,
        session: &mut Session,
        tenant: &TenantChannelConfig,
        event: &InboundEvent,
    ) -> Transition {
        let from = session.step;
        let intent = InboundIntent::classify(&event.payload, from);
        debug!(
            session = %session.key,
            step = %from,
            intent = intent.label(),
            "advancing conversation"
        );

        let transition = if intent == InboundIntent::Reset {
            session.abandon_flow();
            session.step = Step::Start;
            Transition::clear(vec![prompts::reset_ack()])
        } else {
            match from {
                Step::Start => self.start(session, tenant),
                Step::LanguageSelection => self.language_selection(session, tenant, intent),
                Step::MainMenu => self.main_menu(session, tenant, intent).await,
                Step::OtpVerification => self.otp_verification(session, tenant, intent),
                Step::GrievanceName => self.grievance_name(session, tenant, intent),
                Step::GrievanceCategory => self.grievance_category(session, tenant, intent),
                Step::GrievanceDescription => self.grievance_description(session, intent),
                Step::GrievanceLocation => self.grievance_location(session, intent),
                Step::GrievancePhoto => self.grievance_photo(session, tenant, intent).await,
            }
        };

        let to = match transition.disposition {
            Disposition::Keep => session.step,
            Disposition::Clear => Step::Start,
        };
        record_transition(from, to);
        transition
    }

    fn start(&self, session: &mut Session, tenant: &TenantChannelConfig) -> Transition {
        if !tenant.has_modules() {
            info!(tenant = %tenant.tenant_id, "tenant has no enabled modules");
            return Transition::clear(vec![prompts::service_unavailable(tenant)]);
        }
        session.step = Step::LanguageSelection;
        Transition::keep(vec![prompts::language_prompt()])
    }

    fn language_selection(
        &self,
        session: &mut Session,
        tenant: &TenantChannelConfig,
        intent: InboundIntent,
    ) -> Transition {
        match intent {
            InboundIntent::LanguageChoice(language) => {
                session.language = language;
                session.step = Step::MainMenu;
                Transition::keep(vec![prompts::main_menu(tenant)])
            }
            _ => Transition::keep(vec![prompts::language_prompt()]),
        }
    }

    async fn main_menu(
        &self,
        session: &mut Session,
        tenant: &TenantChannelConfig,
        intent: InboundIntent,
    ) -> Transition {
        let choice = match &intent {
            InboundIntent::Greeting => {
                return Transition::keep(vec![prompts::main_menu(tenant)]);
            }
            InboundIntent::MenuChoice(choice) => Some(*choice),
            InboundIntent::OptionReply { title: input, .. } | InboundIntent::FreeText(input) => {
                resolve_option(&prompts::menu_options(tenant), input)
                    .and_then(|option| MenuChoice::from_id(&option.id))
            }
            _ => None,
        };

        match choice {
            Some(MenuChoice::Grievance) if tenant.is_enabled(Module::Grievance) => {
                self.begin_grievance(session, tenant).await
            }
            Some(MenuChoice::Appointment) if tenant.is_enabled(Module::Appointment) => {
                Transition::keep(vec![prompts::appointment_placeholder()])
            }
            Some(MenuChoice::TrackStatus) => {
                Transition::keep(vec![prompts::track_placeholder()])
            }
            Some(_) => {
                Transition::keep(vec![prompts::module_denied(), prompts::main_menu(tenant)])
            }
            None => Transition::keep(vec![prompts::invalid_option(), prompts::main_menu(tenant)]),
        }
    }

    async fn begin_grievance(
        &self,
        session: &mut Session,
        tenant: &TenantChannelConfig,
    ) -> Transition {
        session.draft = Draft::default();
        if self.otp.is_verified(&session.key) {
            session.pending_action = None;
            session.step = Step::GrievanceName;
            return Transition::keep(vec![prompts::name_prompt()]);
        }

        self.otp
            .issue(&session.key, tenant.credentials.as_ref())
            .await;
        session.pending_action = Some(PendingAction::Grievance);
        session.step = Step::OtpVerification;
        Transition::keep(vec![prompts::otp_sent()])
    }

    fn otp_verification(
        &self,
        session: &mut Session,
        tenant: &TenantChannelConfig,
        intent: InboundIntent,
    ) -> Transition {
        let accepted = match &intent {
            InboundIntent::OtpCode(code) => self.otp.check(&session.key, code),
            _ => false,
        };
        if !accepted {
            return Transition::keep(vec![prompts::otp_invalid()]);
        }

        let mut replies = vec![prompts::otp_verified()];
        match session.pending_action.take() {
            Some(PendingAction::Grievance) => {
                session.step = Step::GrievanceName;
                replies.push(prompts::name_prompt());
            }
            None => {
                session.step = Step::MainMenu;
                replies.push(prompts::main_menu(tenant));
            }
        }
        Transition::keep(replies)
    }

    fn grievance_name(
        &self,
        session: &mut Session,
        tenant: &TenantChannelConfig,
        intent: InboundIntent,
    ) -> Transition {
        match intent {
            InboundIntent::FreeText(name) => {
                session.draft.citizen_name = Some(name);
                session.step = Step::GrievanceCategory;
                let categories = self.router.available_categories(tenant);
                Transition::keep(vec![prompts::category_prompt(&categories)])
            }
            _ => Transition::keep(vec![prompts::name_prompt()]),
        }
    }

    fn grievance_category(
        &self,
        session: &mut Session,
        tenant: &TenantChannelConfig,
        intent: InboundIntent,
    ) -> Transition {
        let categories = self.router.available_categories(tenant);
        let shown = prompts::category_options(&categories);

        let selected = match &intent {
            InboundIntent::OptionReply { id, title } => shown
                .iter()
                .find(|option| option.id == *id)
                .map(|option| option.title.clone())
                .or_else(|| match_label(&categories, title)),
            InboundIntent::FreeText(text) => match_label(&categories, text)
                .or_else(|| resolve_option(&shown, text).map(|option| option.title.clone())),
            _ => None,
        };

        let category = selected.unwrap_or_else(|| {
            debug!(session = %session.key, "category unmatched, using fallback");
            self.router.fallback_category().to_string()
        });
        session.draft.category = Some(category);
        session.step = Step::GrievanceDescription;
        Transition::keep(vec![prompts::description_prompt()])
    }

    fn grievance_description(&self, session: &mut Session, intent: InboundIntent) -> Transition {
        match intent {
            InboundIntent::FreeText(text) => {
                session.draft.description = Some(text);
            }
            InboundIntent::Media { media_id, caption } => {
                session.draft.media.push(media_id);
                match caption.filter(|c| !c.trim().is_empty()) {
                    Some(caption) => session.draft.description = Some(caption.trim().to_string()),
                    None => return Transition::keep(vec![prompts::description_prompt()]),
                }
            }
            _ => return Transition::keep(vec![prompts::description_prompt()]),
        }
        session.step = Step::GrievanceLocation;
        Transition::keep(vec![prompts::location_prompt()])
    }

    fn grievance_location(&self, session: &mut Session, intent: InboundIntent) -> Transition {
        match intent {
            InboundIntent::Skip => session.draft.address = None,
            InboundIntent::FreeText(address) => session.draft.address = Some(address),
            InboundIntent::Media { media_id, .. } => {
                session.draft.media.push(media_id);
                return Transition::keep(vec![prompts::location_prompt()]);
            }
            _ => return Transition::keep(vec![prompts::location_prompt()]),
        }
        session.step = Step::GrievancePhoto;
        Transition::keep(vec![prompts::photo_prompt()])
    }

    async fn grievance_photo(
        &self,
        session: &mut Session,
        tenant: &TenantChannelConfig,
        intent: InboundIntent,
    ) -> Transition {
        if let InboundIntent::Media { media_id, .. } = intent {
            session.draft.media.push(media_id);
        }

        match self.finalizer.finalize(session, tenant).await {
            Ok(receipt) => Transition {
                disposition: Disposition::Clear,
                replies: vec![prompts::confirmation(&receipt.reference)],
                follow_up: Some(self.settings.menu_redisplay_delay),
            },
            Err(_) => Transition::clear(vec![prompts::apology()]),
        }
    }
}

fn match_label(categories: &[String], input: &str) -> Option<String> {
    let wanted = input.trim().to_lowercase();
    categories
        .iter()
        .find(|c| c.to_lowercase() == wanted)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::OutboundGateway;
    use crate::otp::OtpSettings;
    use chrono::Utc;
    use civic_core::{
        ChannelCredentials, EventPayload, Language, OrgUnit, SessionKey, SystemClock,
    };
    use civic_test_utils::{MockAuditSink, MockMessaging, MockRecordStore, extract_code};
    use std::collections::BTreeSet;

    struct Fixture {
        engine: ConversationEngine,
        messaging: Arc<MockMessaging>,
        records: Arc<MockRecordStore>,
    }

    fn fixture() -> Fixture {
        let messaging = Arc::new(MockMessaging::new());
        let records = Arc::new(MockRecordStore::new());
        let clock = Arc::new(SystemClock);
        let gateway = Arc::new(OutboundGateway::new(messaging.clone()));
        let otp = Arc::new(OtpVerifier::new(
            OtpSettings::default(),
            gateway,
            clock.clone(),
        ));
        let router = CategoryRouter::new("General");
        let finalizer = Finalizer::new(
            records.clone(),
            Arc::new(MockAuditSink::new()),
            router.clone(),
            clock,
        );
        Fixture {
            engine: ConversationEngine::new(
                otp,
                router,
                finalizer,
                ConversationSettings {
                    menu_redisplay_delay: Duration::from_secs(3),
                },
            ),
            messaging,
            records,
        }
    }

    fn tenant(modules: &[Module]) -> TenantChannelConfig {
        TenantChannelConfig {
            tenant_id: "t1".into(),
            name: "Ward Office".into(),
            active: true,
            credentials: Some(ChannelCredentials {
                channel_id: "PN1".into(),
                access_token: "token".into(),
            }),
            modules: modules.iter().copied().collect::<BTreeSet<_>>(),
            org_units: vec![
                OrgUnit {
                    id: "pwd".into(),
                    name: "Public Works".into(),
                    categories: vec!["Roads".into(), "Drainage".into()],
                },
                OrgUnit {
                    id: "water".into(),
                    name: "Water Supply".into(),
                    categories: vec![],
                },
            ],
        }
    }

    fn session(step: Step) -> Session {
        let mut s = Session::new(SessionKey::new("t1", "919800000001"), Utc::now());
        s.step = step;
        s
    }

    fn event(payload: EventPayload) -> InboundEvent {
        InboundEvent {
            provider_message_id: "wamid.1".into(),
            channel_id: "PN1".into(),
            from: "919800000001".into(),
            profile_name: None,
            payload,
            received_at: Utc::now(),
        }
    }

    fn text(body: &str) -> InboundEvent {
        event(EventPayload::Text { body: body.into() })
    }

    fn tap(id: &str, title: &str) -> InboundEvent {
        event(EventPayload::Interactive {
            option_id: id.into(),
            title: title.into(),
        })
    }

    fn media(id: &str, caption: Option<&str>) -> InboundEvent {
        event(EventPayload::Media {
            media_id: id.into(),
            mime_type: Some("image/jpeg".into()),
            caption: caption.map(str::to_string),
        })
    }

    fn grievance_tenant() -> TenantChannelConfig {
        tenant(&[Module::Grievance])
    }

    #[tokio::test]
    async fn tenant_without_modules_gets_unavailable_message() {
        let f = fixture();
        let mut s = session(Step::Start);
        let t = f.engine.advance(&mut s, &tenant(&[]), &text("hi")).await;
        assert_eq!(t.disposition, Disposition::Clear);
        let MessageBody::Text(body) = &t.replies[0] else {
            panic!("expected text");
        };
        assert!(body.contains("not offering any services"));
    }

    #[tokio::test]
    async fn any_first_message_asks_for_language() {
        let f = fixture();
        let mut s = session(Step::Start);
        let t = f
            .engine
            .advance(&mut s, &grievance_tenant(), &text("pothole!"))
            .await;
        assert_eq!(s.step, Step::LanguageSelection);
        assert_eq!(t.replies, vec![prompts::language_prompt()]);
    }

    #[tokio::test]
    async fn language_by_number_moves_to_menu() {
        let f = fixture();
        let mut s = session(Step::LanguageSelection);
        let t = f
            .engine
            .advance(&mut s, &grievance_tenant(), &text("2"))
            .await;
        assert_eq!(s.step, Step::MainMenu);
        assert_eq!(s.language, Language::Hindi);
        assert_eq!(t.replies, vec![prompts::main_menu(&grievance_tenant())]);
    }

    #[tokio::test]
    async fn unrecognized_language_reprompts() {
        let f = fixture();
        let mut s = session(Step::LanguageSelection);
        f.engine
            .advance(&mut s, &grievance_tenant(), &text("klingon"))
            .await;
        assert_eq!(s.step, Step::LanguageSelection);
    }

    #[tokio::test]
    async fn grievance_requires_a_code_then_asks_for_name() {
        let f = fixture();
        let t_cfg = grievance_tenant();
        let mut s = session(Step::MainMenu);

        let t = f
            .engine
            .advance(&mut s, &t_cfg, &tap("menu_grievance", "Register grievance"))
            .await;
        assert_eq!(s.step, Step::OtpVerification);
        assert_eq!(s.pending_action, Some(PendingAction::Grievance));
        assert_eq!(t.replies, vec![prompts::otp_sent()]);

        let sent = f.messaging.sent_messages().await;
        let code = extract_code(&sent[0].body.to_plain_text()).unwrap();

        let t = f.engine.advance(&mut s, &t_cfg, &text("999999x")).await;
        assert_eq!(s.step, Step::OtpVerification);
        assert_eq!(t.replies, vec![prompts::otp_invalid()]);
        assert_eq!(f.messaging.sent_count().await, 1, "no new code is issued");

        let t = f.engine.advance(&mut s, &t_cfg, &text(&code)).await;
        assert_eq!(s.step, Step::GrievanceName);
        assert_eq!(s.pending_action, None);
        assert_eq!(t.replies.last(), Some(&prompts::name_prompt()));
    }

    #[tokio::test]
    async fn verified_phone_skips_the_code() {
        let f = fixture();
        let t_cfg = grievance_tenant();
        let mut s = session(Step::MainMenu);
        f.engine.advance(&mut s, &t_cfg, &text("1")).await;
        let sent = f.messaging.sent_messages().await;
        let code = extract_code(&sent[0].body.to_plain_text()).unwrap();
        f.engine.advance(&mut s, &t_cfg, &text(&code)).await;

        let mut again = session(Step::MainMenu);
        f.engine.advance(&mut again, &t_cfg, &text("1")).await;
        assert_eq!(again.step, Step::GrievanceName);
        assert_eq!(f.messaging.sent_count().await, 1);
    }

    #[tokio::test]
    async fn disabled_module_is_denied() {
        let f = fixture();
        let t_cfg = tenant(&[Module::Appointment]);
        let mut s = session(Step::MainMenu);
        let t = f
            .engine
            .advance(&mut s, &t_cfg, &tap("menu_grievance", "Register grievance"))
            .await;
        assert_eq!(s.step, Step::MainMenu);
        assert_eq!(t.replies[0], prompts::module_denied());
        assert_eq!(f.messaging.sent_count().await, 0);
    }

    #[tokio::test]
    async fn unmatched_menu_input_repeats_the_menu() {
        let f = fixture();
        let t_cfg = grievance_tenant();
        let mut s = session(Step::MainMenu);
        let t = f.engine.advance(&mut s, &t_cfg, &text("weather?")).await;
        assert_eq!(
            t.replies,
            vec![prompts::invalid_option(), prompts::main_menu(&t_cfg)]
        );
    }

    #[tokio::test]
    async fn track_status_is_acknowledged() {
        let f = fixture();
        let mut s = session(Step::MainMenu);
        let t = f
            .engine
            .advance(&mut s, &grievance_tenant(), &text("track status"))
            .await;
        assert_eq!(t.replies, vec![prompts::track_placeholder()]);
        assert_eq!(s.step, Step::MainMenu);
    }

    #[tokio::test]
    async fn name_then_category_buttons() {
        let f = fixture();
        let mut s = session(Step::GrievanceName);
        let t = f
            .engine
            .advance(&mut s, &grievance_tenant(), &text("Asha Patil"))
            .await;
        assert_eq!(s.draft.citizen_name.as_deref(), Some("Asha Patil"));
        assert_eq!(s.step, Step::GrievanceCategory);
        let MessageBody::Buttons { options, .. } = &t.replies[0] else {
            panic!("expected category buttons");
        };
        let titles: Vec<&str> = options.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["Roads", "Drainage", "Water Supply"]);
    }

    #[tokio::test]
    async fn category_resolves_by_button_label_or_number() {
        let f = fixture();
        let t_cfg = grievance_tenant();

        let mut s = session(Step::GrievanceCategory);
        f.engine.advance(&mut s, &t_cfg, &tap("cat_1", "Drainage")).await;
        assert_eq!(s.draft.category.as_deref(), Some("Drainage"));

        let mut s = session(Step::GrievanceCategory);
        f.engine.advance(&mut s, &t_cfg, &text("water supply")).await;
        assert_eq!(s.draft.category.as_deref(), Some("Water Supply"));

        let mut s = session(Step::GrievanceCategory);
        f.engine.advance(&mut s, &t_cfg, &text("1")).await;
        assert_eq!(s.draft.category.as_deref(), Some("Roads"));
        assert_eq!(s.step, Step::GrievanceDescription);
    }

    #[tokio::test]
    async fn unmatched_category_falls_back() {
        let f = fixture();
        let mut s = session(Step::GrievanceCategory);
        f.engine
            .advance(&mut s, &grievance_tenant(), &text("stray dogs"))
            .await;
        assert_eq!(s.draft.category.as_deref(), Some("General"));
        assert_eq!(s.step, Step::GrievanceDescription);
    }

    #[tokio::test]
    async fn description_is_stored() {
        let f = fixture();
        let mut s = session(Step::GrievanceDescription);
        let t = f
            .engine
            .advance(&mut s, &grievance_tenant(), &text("Pothole near school"))
            .await;
        assert_eq!(s.draft.description.as_deref(), Some("Pothole near school"));
        assert_eq!(s.step, Step::GrievanceLocation);
        assert_eq!(t.replies, vec![prompts::location_prompt()]);
    }

    #[tokio::test]
    async fn captionless_media_during_description_is_kept_and_reprompts() {
        let f = fixture();
        let mut s = session(Step::GrievanceDescription);
        f.engine
            .advance(&mut s, &grievance_tenant(), &media("m1", None))
            .await;
        assert_eq!(s.step, Step::GrievanceDescription);
        assert_eq!(s.draft.media, vec!["m1".to_string()]);

        f.engine
            .advance(&mut s, &grievance_tenant(), &media("m2", Some("Broken pipe")))
            .await;
        assert_eq!(s.step, Step::GrievanceLocation);
        assert_eq!(s.draft.description.as_deref(), Some("Broken pipe"));
        assert_eq!(s.draft.media.len(), 2);
    }

    #[tokio::test]
    async fn location_can_be_skipped() {
        let f = fixture();
        let mut s = session(Step::GrievanceLocation);
        s.draft.address = Some("stale".into());
        f.engine
            .advance(&mut s, &grievance_tenant(), &tap("skip", "Skip"))
            .await;
        assert_eq!(s.draft.address, None);
        assert_eq!(s.step, Step::GrievancePhoto);
    }

    #[tokio::test]
    async fn photo_step_finalizes_and_schedules_menu() {
        let f = fixture();
        let mut s = session(Step::GrievancePhoto);
        s.draft.citizen_name = Some("Asha".into());
        s.draft.category = Some("Roads".into());
        s.draft.description = Some("Pothole".into());

        let t = f
            .engine
            .advance(&mut s, &grievance_tenant(), &media("photo-1", None))
            .await;
        assert_eq!(t.disposition, Disposition::Clear);
        assert_eq!(t.follow_up, Some(Duration::from_secs(3)));
        assert_eq!(t.replies, vec![prompts::confirmation("GRV-000001")]);

        let stored = f.records.records().await;
        assert_eq!(stored[0].media, vec!["photo-1".to_string()]);
        assert_eq!(stored[0].org_unit_id.as_deref(), Some("pwd"));
    }

    #[tokio::test]
    async fn finalization_failure_apologizes_and_clears() {
        let f = fixture();
        f.records.fail(true);
        let mut s = session(Step::GrievancePhoto);
        s.draft.citizen_name = Some("Asha".into());
        s.draft.description = Some("Pothole".into());

        let t = f
            .engine
            .advance(&mut s, &grievance_tenant(), &tap("skip", "Skip"))
            .await;
        assert_eq!(t.disposition, Disposition::Clear);
        assert_eq!(t.follow_up, None);
        assert_eq!(t.replies, vec![prompts::apology()]);
    }

    #[tokio::test]
    async fn reset_clears_from_any_step() {
        let f = fixture();
        let mut s = session(Step::GrievanceLocation);
        s.draft.description = Some("Pothole".into());
        let t = f
            .engine
            .advance(&mut s, &grievance_tenant(), &text("reset"))
            .await;
        assert_eq!(t.disposition, Disposition::Clear);
        assert_eq!(t.replies, vec![prompts::reset_ack()]);
        assert!(s.draft.is_empty());
    }

    const ALL_STEPS: [Step; 9] = [
        Step::Start,
        Step::LanguageSelection,
        Step::MainMenu,
        Step::OtpVerification,
        Step::GrievanceName,
        Step::GrievanceCategory,
        Step::GrievanceDescription,
        Step::GrievanceLocation,
        Step::GrievancePhoto,
    ];

    #[tokio::test]
    async fn every_step_answers_every_kind_of_input() {
        let inputs = [
            text("hello"),
            text(""),
            text("skip"),
            text("123456"),
            text("2"),
            tap("lang_mr", "मराठी"),
            tap("menu_track", "Track status"),
            tap("unknown", "Unknown"),
            media("m", Some("caption")),
            media("m", None),
        ];
        let t_cfg = tenant(&[Module::Grievance, Module::Appointment]);
        for step in ALL_STEPS {
            for input in &inputs {
                let f = fixture();
                let mut s = session(step);
                s.draft.citizen_name = Some("Asha".into());
                s.draft.description = Some("Pothole".into());
                let t = f.engine.advance(&mut s, &t_cfg, input).await;
                assert!(
                    !t.replies.is_empty(),
                    "step {step} gave no reply to {:?}",
                    input.payload
                );
            }
        }
    }
}
