//! Response rule table.
//!
//! An ordered list of keyword rules plus one fallback. The first rule whose
//! keywords appear in a message wins, so the table order is part of its meaning.
//! The crisis rule always sits first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::AppError;
use crate::models::Severity;

/// Topic a response rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Suicide or self-harm language
    Crisis,
    /// Anxiety and nervousness
    Anxiety,
    /// Sleep problems
    Sleep,
    /// Exams, coursework, feeling overwhelmed
    Academic,
    /// Loneliness and social isolation
    Loneliness,
    /// General support (fallback only)
    General,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Crisis => "crisis",
            Category::Anxiety => "anxiety",
            Category::Sleep => "sleep",
            Category::Academic => "academic",
            Category::Loneliness => "loneliness",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A keyword-triggered rule.
///
/// A message matches when its lower-cased text contains any of the keywords.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRule {
    category: Category,
    keywords: Vec<String>,
    response: String,
    severity: Severity,
}

impl ResponseRule {
    /// Create a rule, normalising keywords to lowercase.
    ///
    /// Blank keywords are rejected: an empty substring matches every message and
    /// would shadow all rules placed after it.
    pub fn new<I, S>(
        category: Category,
        keywords: I,
        response: impl Into<String>,
        severity: Severity,
    ) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().to_lowercase();
            if keyword.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "Rule '{}' contains a blank keyword",
                    category
                )));
            }
            if !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }

        if normalized.is_empty() {
            return Err(AppError::Validation(format!(
                "Rule '{}' has no keywords",
                category
            )));
        }

        let response = response.into();
        if response.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Rule '{}' has an empty response",
                category
            )));
        }

        Ok(Self {
            category,
            keywords: normalized,
            response,
            severity,
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the first keyword contained in `lowered`, which must already be lower-cased.
    pub fn matched_keyword(&self, lowered: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|keyword| lowered.contains(keyword.as_str()))
            .map(String::as_str)
    }
}

/// The always-matching last rule. Its severity is always low.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackRule {
    response: String,
}

impl FallbackRule {
    pub fn new(response: impl Into<String>) -> Result<Self, AppError> {
        let response = response.into();
        if response.trim().is_empty() {
            return Err(AppError::Validation(
                "Fallback rule has an empty response".to_string(),
            ));
        }
        Ok(Self { response })
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn severity(&self) -> Severity {
        Severity::Low
    }

    pub fn category(&self) -> Category {
        Category::General
    }
}

/// Ordered rule table with a trailing fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleTable {
    rules: Vec<ResponseRule>,
    fallback: FallbackRule,
}

/// On-disk representation of a rule table
#[derive(Debug, Deserialize)]
struct RawRuleTable {
    rules: Vec<RawRule>,
    fallback: RawFallback,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    category: Category,
    keywords: Vec<String>,
    response: String,
    severity: Severity,
}

#[derive(Debug, Deserialize)]
struct RawFallback {
    response: String,
    #[serde(default)]
    severity: Option<Severity>,
}

impl RuleTable {
    /// Build a table, checking the ordering invariants.
    ///
    /// - the first rule is the crisis rule and its severity is high
    /// - no other rule uses the crisis category
    /// - `general` is reserved for the fallback
    pub fn new(rules: Vec<ResponseRule>, fallback: FallbackRule) -> Result<Self, AppError> {
        let first = rules.first().ok_or_else(|| {
            AppError::Validation("Rule table must start with a crisis rule".to_string())
        })?;

        if first.category != Category::Crisis {
            return Err(AppError::Validation(format!(
                "First rule must be the crisis rule, found '{}'",
                first.category
            )));
        }
        if first.severity != Severity::High {
            return Err(AppError::Validation(
                "Crisis rule must have high severity".to_string(),
            ));
        }

        for (position, rule) in rules.iter().enumerate().skip(1) {
            match rule.category {
                Category::Crisis => {
                    return Err(AppError::Validation(format!(
                        "Crisis rule must appear only once, found another at position {}",
                        position + 1
                    )))
                }
                Category::General => {
                    return Err(AppError::Validation(format!(
                        "Category 'general' is reserved for the fallback (position {})",
                        position + 1
                    )))
                }
                _ => {}
            }
        }

        Ok(Self { rules, fallback })
    }

    /// Parse and validate a JSON rule table.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let raw: RawRuleTable = serde_json::from_str(json)?;

        if let Some(severity) = raw.fallback.severity {
            if severity != Severity::Low {
                return Err(AppError::Validation(format!(
                    "Fallback severity must be low, found '{}'",
                    severity
                )));
            }
        }

        let rules = raw
            .rules
            .into_iter()
            .map(|r| ResponseRule::new(r.category, r.keywords, r.response, r.severity))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(rules, FallbackRule::new(raw.fallback.response)?)
    }

    /// Read a JSON rule table from disk.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn rules(&self) -> &[ResponseRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &FallbackRule {
        &self.fallback
    }

    /// Number of rules including the fallback
    pub fn len(&self) -> usize {
        self.rules.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        BUILTIN_RULES.clone()
    }
}

const CRISIS_RESPONSE: &str = "Hearing you say that makes it really important that we get you some help right away. You are not alone in this, and you deserve to feel safe. Here are some resources that can connect you with a caring person immediately:\n\n🆘 National Suicide Prevention Lifeline: 988\n🏥 Campus Crisis Line: (555) 123-4567\n🚨 Emergency Services: 911\n\nIt's incredibly brave of you to share this. Please, let one of these amazing people help.";

const ANXIETY_RESPONSE: &str = "It sounds like you're carrying a lot of anxiety right now, and that's tough. I'm here with you. Let's try something that can help you feel more grounded right now:\n\n🌬️ **Calm Breathing**: Breathe in for 4 counts, hold for 7, and gently breathe out for 8. It can make a real difference.\n📝 **Grounding Yourself**: Look around and name 5 things you can see, 4 things you can touch, 3 you can hear, 2 you can smell, and 1 you can taste.\n\nWhich of these feels right for you, or would you rather talk more about what's causing this feeling?";

const SLEEP_RESPONSE: &str = "It's so hard when you can't get the rest you need. Let's explore some gentle ways to help your mind and body unwind for sleep:\n\n🌙 **Create a Sleep Sanctuary**:\n• Try to go to bed and wake up around the same time.\n• Put away screens an hour before bed to let your mind quiet down.\n• Create a simple, relaxing routine like reading or listening to calm music.\n\n🧘 **Relaxation Rituals**:\n• Try a guided sleep meditation.\n• Write down any worries in a journal before bed to get them out of your head.\n\nOften, our minds are too busy to rest. What's on your mind when you're trying to sleep?";

const ACADEMIC_RESPONSE: &str = "Feeling overwhelmed by school is so common, but that doesn't make it any less difficult. We can tackle this together. Let's start with some small, manageable steps:\n\n📅 **Find Your Flow**:\n• Try the Pomodoro Technique: 25 minutes of focused work, then a 5-minute break. It’s a game-changer!\n• Break big tasks into tiny ones. Just focus on the very next step.\n\nRemember, your well-being is the most important thing. What's the one thing that's causing the most pressure right now?";

const LONELINESS_RESPONSE: &str = "Feeling lonely can be one of the toughest parts of college, and so many people feel it. It's really brave to talk about it. Let's think about some gentle ways to open the door to connection:\n\n🤝 **Find Your People**:\n• Join a club that feels like 'you'.\n• Even a small chat with a classmate can make a big difference.\n• Look for peer support groups on campus.\n\nBuilding connections takes time, and you're worth getting to know. What kind of connection are you hoping to find?";

const GENERAL_RESPONSE: &str = "Thank you for trusting me with this. It takes real strength to open up, and I'm honored to be here for you. We can explore this together.\n\nHere are a few things that help many students feel more balanced:\n\n🧠 **Mindful Moments**: Just 5 minutes of quiet can reset your day.\n💪 **Body & Mind Fuel**: A short walk or a nutritious meal can boost your mood.\n📞 **Friendly Voices**: Connecting with friends or family can lift your spirits.\n\nWhere would you like to start? Or is there something else you'd like to share?";

fn builtin(category: Category, keywords: &[&str], response: &str, severity: Severity) -> ResponseRule {
    ResponseRule {
        category,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        response: response.to_string(),
        severity,
    }
}

/// Built-in wellness rule table. Order: crisis, anxiety, sleep, academic, loneliness.
pub static BUILTIN_RULES: LazyLock<RuleTable> = LazyLock::new(|| RuleTable {
    rules: vec![
        builtin(
            Category::Crisis,
            &["suicide", "harm myself", "end it all"],
            CRISIS_RESPONSE,
            Severity::High,
        ),
        builtin(
            Category::Anxiety,
            &["anxious", "anxiety", "nervous", "stressing me out"],
            ANXIETY_RESPONSE,
            Severity::Medium,
        ),
        builtin(
            Category::Sleep,
            &["sleep", "insomnia", "tired"],
            SLEEP_RESPONSE,
            Severity::Medium,
        ),
        builtin(
            Category::Academic,
            &["exam", "study", "coursework", "overwhelmed", "too much"],
            ACADEMIC_RESPONSE,
            Severity::Medium,
        ),
        builtin(
            Category::Loneliness,
            &["lonely", "isolated", "friends", "social"],
            LONELINESS_RESPONSE,
            Severity::Low,
        ),
    ],
    fallback: FallbackRule {
        response: GENERAL_RESPONSE.to_string(),
    },
});
