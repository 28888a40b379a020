use crate::client::GeminiClient;
use crate::error::{OracleError, Result};
use crate::fallback;
use crate::generator::TextGenerator;
use crate::types::{Diagnostics, DossierReport, Generated, HiringVelocity, MarketSignal};
use serde::de::DeserializeOwned;
use std::time::Duration;
use warroom_core::backup::BulkImport;
use warroom_core::config::OracleConfig;
use warroom_core::contact::Contact;
use warroom_core::deal::Deal;
use warroom_core::state::{NeuralCore, UserState};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Remove markdown code fences the backend likes to wrap JSON in.
pub fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Fallback-safe facade over a [`TextGenerator`].
///
/// Every capability resolves: a missing generator, a backend error, a timeout
/// or output of the wrong shape all yield the capability's fixed fallback,
/// tagged [`crate::Source::Fallback`] so callers can tell.
pub struct Oracle<G> {
    generator: Option<G>,
    timeout: Duration,
}

impl Oracle<GeminiClient> {
    /// Live when the configured key variable is set, offline otherwise.
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        Ok(Self::new(GeminiClient::from_config(config)?, config.timeout()))
    }
}

impl<G: TextGenerator> Oracle<G> {
    pub fn new(generator: Option<G>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn offline() -> Self {
        Self::new(None, DEFAULT_TIMEOUT)
    }

    pub fn is_live(&self) -> bool {
        self.generator.is_some()
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    async fn try_text(&self, prompt: &str) -> Option<Result<String>> {
        let generator = self.generator.as_ref()?;
        let outcome = match tokio::time::timeout(self.timeout, generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(self.timeout)),
        };
        Some(outcome)
    }

    async fn text(&self, label: &str, prompt: &str) -> Option<String> {
        match self.try_text(prompt).await? {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                tracing::warn!(capability = label, "empty generation, using fallback");
                None
            }
            Err(e) => {
                tracing::warn!(capability = label, error = %e, "generation failed, using fallback");
                None
            }
        }
    }

    async fn json<T: DeserializeOwned>(&self, label: &str, prompt: &str) -> Option<T> {
        let text = self.text(label, prompt).await?;
        match serde_json::from_str::<T>(&strip_fences(&text)) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(
                    capability = label,
                    error = %OracleError::Parse(e),
                    "unexpected shape, using fallback"
                );
                None
            }
        }
    }

    fn resolve<T>(value: Option<T>, fallback: impl FnOnce() -> T) -> Generated<T> {
        match value {
            Some(v) => Generated::live(v),
            None => Generated::fallback(fallback()),
        }
    }

    // -----------------------------------------------------------------------
    // Capabilities
    // -----------------------------------------------------------------------

    /// Cold email to a contact, written in the user's voice.
    pub async fn draft_outreach(&self, contact: &Contact, core: &NeuralCore) -> Generated<String> {
        let prompt = format!(
            "Draft a concise, high-status cold email to {name} ({role} at {company}).\n\
             Context: {notes}.\n\
             My persona: {identity}.\n\
             Goal: secure a 15-minute strategic sync.\n\
             Tone: low friction, high value, peer-to-peer.",
            name = contact.name,
            role = if contact.role.is_empty() { "leader" } else { contact.role.as_str() },
            company = contact.company,
            notes = contact.notes.as_deref().unwrap_or("No prior context"),
            identity = core.identity,
        );
        let text = self.text("draft_outreach", &prompt).await;
        Self::resolve(text, || fallback::outreach(contact))
    }

    /// One-page executive briefing for a deal, in markdown.
    pub async fn generate_briefing(&self, core: &NeuralCore, deal: &Deal) -> Generated<String> {
        let prompt = format!(
            "Generate a one-page executive narrative briefing.\n\
             Persona: {identity}\n\
             Key proof points: {ledger}\n\
             Target: {company} ({role})\n\
             Deal value: ${value}\n\
             Style: authoritative and strategic, focused on outcomes.\n\
             Format: Markdown with sections Executive Summary, Strategic Positioning, \
             Tactical Differentiators, Conclusion.",
            identity = core.identity,
            ledger = core.ledger.join(", "),
            company = deal.company,
            role = deal.role,
            value = deal.value,
        );
        let text = self.text("generate_briefing", &prompt).await;
        Self::resolve(text, || fallback::BRIEFING.to_string())
    }

    /// Extract contacts and deals from CSV or unstructured text.
    pub async fn parse_bulk_import(&self, text: &str) -> Generated<BulkImport> {
        let prompt = format!(
            "Parse this GTM data (CSV or unstructured):\n{text}\n\
             Return only JSON of the form {{\"contacts\": [...], \"deals\": [...]}}. \
             Contacts use name, company, role, status, tier, email, linkedin, notes. \
             Deals use company, role, stage, value, probability, priority, nextStep, notes."
        );
        let parsed = self.json::<BulkImport>("parse_bulk_import", &prompt).await;
        Self::resolve(parsed, fallback::bulk_import)
    }

    /// Grade an interview or pitch transcript.
    pub async fn score_session(&self, transcript: &str) -> Generated<DossierReport> {
        let prompt = format!(
            "Analyze this GTM interview transcript:\n{transcript}\n\
             Return only JSON with summary, conviction, clarity, starMethod, \
             cadenceMatch (0-100) and wpm."
        );
        let report = self.json::<DossierReport>("score_session", &prompt).await;
        Self::resolve(report, fallback::dossier)
    }

    /// Recent market events, optionally focused on `companies`.
    pub async fn fetch_market_signals(&self, companies: &[String]) -> Generated<Vec<MarketSignal>> {
        let prompt = if companies.is_empty() {
            "List 5 high-impact tech market events this month. Return only a JSON array of \
             objects with id, company, type, headline, date, impactScore."
                .to_string()
        } else {
            format!(
                "List 5 high-impact tech market events this month for these companies: {}. \
                 Return only a JSON array of objects with id, company, type, headline, date, \
                 impactScore.",
                companies.join(", ")
            )
        };
        let signals = self
            .json::<Vec<MarketSignal>>("fetch_market_signals", &prompt)
            .await
            .filter(|s| !s.is_empty());
        Self::resolve(signals, fallback::market_signals)
    }

    pub async fn hiring_velocity(&self) -> Generated<HiringVelocity> {
        let prompt = "Provide current hiring velocity insights for enterprise go-to-market roles. \
                      Return only JSON with velocity, insight and trend (array of {month, score}).";
        let velocity = self.json::<HiringVelocity>("hiring_velocity", prompt).await;
        Self::resolve(velocity, fallback::hiring_velocity)
    }

    /// Suggestions for the health of the stored document.
    pub async fn diagnostics(&self, state: &UserState) -> Generated<Diagnostics> {
        let prompt = format!(
            "Diagnostic check on a pipeline with {contacts} contacts and {deals} deals. \
             Return only JSON with improvements (array), bugs (array) and \
             categoryMaturity (object of name to 0-100).",
            contacts = state.contacts.len(),
            deals = state.pipeline.len(),
        );
        let diag = self.json::<Diagnostics>("diagnostics", &prompt).await;
        Self::resolve(diag, fallback::diagnostics)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;
    use std::sync::Mutex;
    use warroom_core::contact::ContactDraft;
    use warroom_core::deal::DealDraft;

    /// Replies with a canned result and records the prompts it saw.
    struct Stub {
        reply: std::result::Result<String, ()>,
        delay: Option<Duration>,
        prompts: Mutex<Vec<String>>,
    }

    impl Stub {
        fn ok(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                delay: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                delay: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn slow(text: &str, delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::ok(text)
            }
        }
    }

    impl TextGenerator for Stub {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            self.reply.clone().map_err(|_| OracleError::EmptyResponse)
        }
    }

    fn live(stub: Stub) -> Oracle<Stub> {
        Oracle::new(Some(stub), Duration::from_secs(5))
    }

    fn deal() -> Deal {
        DealDraft::new("Stripe", "Enterprise AE").into_deal("d1".into(), 10, "t".into())
    }

    #[test]
    fn strip_fences_handles_json_blocks() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("  [1]  "), "[1]");
    }

    #[tokio::test]
    async fn offline_oracle_always_falls_back() {
        let oracle: Oracle<Stub> = Oracle::offline();
        assert!(!oracle.is_live());

        let brief = oracle.generate_briefing(&NeuralCore::default(), &deal()).await;
        assert_eq!(brief.source, Source::Fallback);
        assert_eq!(brief.value, fallback::BRIEFING);

        let signals = oracle.fetch_market_signals(&[]).await;
        assert!(signals.is_fallback());
        assert_eq!(signals.value.len(), 5);
        assert_eq!(signals.value[0].company, "Databricks");

        let velocity = oracle.hiring_velocity().await;
        assert_eq!(velocity.value.trend.len(), 12);
    }

    #[tokio::test]
    async fn live_text_is_tagged_live() {
        let oracle = live(Stub::ok("## Executive Summary\nWin."));
        let mut core = NeuralCore::default();
        core.identity = "Technical closer".into();
        let brief = oracle.generate_briefing(&core, &deal()).await;
        assert_eq!(brief.source, Source::Live);
        assert!(brief.value.starts_with("## Executive Summary"));

        let prompts = oracle.generator.as_ref().unwrap().prompts.lock().unwrap();
        assert!(prompts[0].contains("Stripe"));
        assert!(prompts[0].contains("Technical closer"));
    }

    #[tokio::test]
    async fn backend_error_falls_back() {
        let oracle = live(Stub::failing());
        let contact = ContactDraft::new("Minh Pham", "NVIDIA").into_contact("c1".into());
        let draft = oracle.draft_outreach(&contact, &NeuralCore::default()).await;
        assert!(draft.is_fallback());
        assert!(draft.value.contains("Minh Pham"));
    }

    #[tokio::test]
    async fn fenced_json_is_parsed() {
        let oracle = live(Stub::ok(
            "```json\n{\"contacts\":[{\"name\":\"Ed\",\"company\":\"Carr\"}],\"deals\":[]}\n```",
        ));
        let bulk = oracle.parse_bulk_import("Ed, Carr").await;
        assert_eq!(bulk.source, Source::Live);
        assert_eq!(bulk.value.contacts.len(), 1);
        assert_eq!(bulk.value.contacts[0].name.as_deref(), Some("Ed"));
    }

    #[tokio::test]
    async fn wrong_shape_falls_back() {
        let oracle = live(Stub::ok("I could not parse that, sorry."));
        let bulk = oracle.parse_bulk_import("???").await;
        assert!(bulk.is_fallback());
        assert!(bulk.value.is_empty());

        let report = oracle.score_session("um, so, yeah").await;
        assert!(report.is_fallback());
        assert_eq!(report.value.wpm, Some(145.0));
    }

    #[tokio::test]
    async fn numeric_grades_are_accepted() {
        let oracle = live(Stub::ok(
            r#"{"summary":"Strong","conviction":92,"clarity":"A-","starMethod":"Pass"}"#,
        ));
        let report = oracle.score_session("transcript").await;
        assert_eq!(report.source, Source::Live);
        assert_eq!(report.value.conviction, crate::types::Grade::Score(92.0));
        assert_eq!(report.value.cadence_match, None);
    }

    #[tokio::test]
    async fn empty_signal_list_falls_back() {
        let oracle = live(Stub::ok("[]"));
        let signals = oracle.fetch_market_signals(&["Linear".to_string()]).await;
        assert!(signals.is_fallback());
    }

    #[tokio::test]
    async fn slow_backend_times_out_to_fallback() {
        let oracle = Oracle::new(
            Some(Stub::slow("too late", Duration::from_secs(5))),
            Duration::from_millis(50),
        );
        let diag = oracle.diagnostics(&UserState::default()).await;
        assert!(diag.is_fallback());
        assert!(!diag.value.improvements.is_empty());
    }
}
