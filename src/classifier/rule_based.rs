use async_trait::async_trait;

use super::Classifier;
use super::ClassifierError;
use super::TriageOutcome;
use super::TriageRequest;
use crate::domain::Confidence;
use crate::domain::Intent;
use crate::domain::NextAction;
use crate::domain::Priority;

struct IntentRule {
    intent: Intent,
    keywords: &'static [&'static str],
    default_priority: Priority,
}

/// Checked in order; the first intent with a matching keyword wins, mirroring
/// a plain keyword-matching triage adapter with no external dependency.
const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::Buy,
        keywords: &["price", "cost", "buy", "purchase", "quote", "pricing"],
        default_priority: Priority::P1,
    },
    IntentRule {
        intent: Intent::Support,
        keywords: &["help", "broken", "error", "not working", "bug", "support", "issue"],
        default_priority: Priority::P2,
    },
    IntentRule {
        intent: Intent::Job,
        keywords: &["job", "career", "resume", "cv", "vacancy", "hiring"],
        default_priority: Priority::P3,
    },
    IntentRule {
        intent: Intent::Spam,
        keywords: &["http://", "https://", "www.", ".com", "advertisement", "spam"],
        default_priority: Priority::P3,
    },
];

const PRIORITY_RULES: &[(Priority, &[&str])] = &[
    (Priority::P0, &["urgent", "asap", "immediately", "critical"]),
    (Priority::P1, &["soon", "shortly", "this week"]),
    (Priority::P2, &[]),
    (Priority::P3, &["someday", "no rush", "whenever"]),
];

fn next_action_for(intent: Intent, priority: Priority) -> NextAction {
    use Intent::*;
    use NextAction::*;
    use Priority::*;
    match (intent, priority) {
        (Buy, P0) => Call,
        (Buy, P1 | P2) => Email,
        (Buy, P3) => Qualify,
        (Support, P0) => Call,
        (Support, _) => Email,
        (Job, P0 | P1 | P2) => Email,
        (Job, P3) => Ignore,
        (Spam, _) => Ignore,
        (Other, P0 | P1 | P2) => Qualify,
        (Other, P3) => Ignore,
    }
}

/// Local, dependency-free triage strategy: decides intent, priority, and
/// next action purely from keyword matches against the note text. Does not
/// call out to any external service.
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn new() -> Self { Self }

    fn detect_intent(note: &str) -> Intent {
        INTENT_RULES
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| note.contains(kw)))
            .map(|rule| rule.intent)
            .unwrap_or(Intent::Other)
    }

    fn detect_priority(note: &str, intent: Intent) -> Priority {
        for (priority, keywords) in PRIORITY_RULES {
            if keywords.iter().any(|kw| note.contains(kw)) {
                return *priority;
            }
        }
        INTENT_RULES
            .iter()
            .find(|rule| rule.intent == intent)
            .map(|rule| rule.default_priority)
            .unwrap_or(Priority::P2)
    }

    fn confidence_for(note: &str, intent: Intent) -> Confidence {
        if intent == Intent::Other {
            return Confidence::new(0.3).unwrap();
        }
        let matches = INTENT_RULES
            .iter()
            .find(|rule| rule.intent == intent)
            .map(|rule| rule.keywords.iter().filter(|kw| note.contains(*kw)).count())
            .unwrap_or(0);
        let score = (0.3 + matches as f32 * 0.2).min(0.9);
        Confidence::new(score).unwrap()
    }

    fn tags_for(note: &str) -> Vec<String> {
        let mut tags = Vec::new();
        if ["urgent", "asap", "immediately"].iter().any(|kw| note.contains(kw)) {
            tags.push("urgent".to_string());
        }
        if ["enterprise", "business"].iter().any(|kw| note.contains(kw)) {
            tags.push("enterprise".to_string());
        }
        if ["trial", "demo"].iter().any(|kw| note.contains(kw)) {
            tags.push("trial".to_string());
        }
        tags
    }
}

#[async_trait]
impl Classifier for RuleBasedClassifier {
    async fn triage(&self, request: TriageRequest) -> Result<TriageOutcome, ClassifierError> {
        let note = request.note.to_lowercase();
        let intent = Self::detect_intent(&note);
        let priority = Self::detect_priority(&note, intent);
        let next_action = next_action_for(intent, priority);
        let confidence = Self::confidence_for(&note, intent);
        let tags = Self::tags_for(&note);

        Ok(TriageOutcome {
            intent,
            priority,
            next_action,
            confidence,
            tags,
        })
    }
}
