//! Node-type vocabulary: which nodes are external services, which are
//! internal utilities, and which services belong to which category.
//!
//! Resolution order for one node:
//!
//! 1. The normalized node **type** is looked up in [`NODE_KINDS`]. A
//!    [`NodeKind::Service`] hit is final; a [`NodeKind::Utility`] hit means
//!    the node contributes no integration at all.
//! 2. Community package types are scanned for [`COMMUNITY_KEYWORDS`].
//! 3. Otherwise the lower-cased node **name** is scanned for any service key
//!    from [`NODE_KINDS`], in table order; short keys must match a whole word.
//! 4. Otherwise an unrecognized first-party type is title-cased as-is.

/// Classification of a normalized node-type key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An externally-facing service with its canonical display name.
    Service(&'static str),
    /// Control flow, data shaping, file I/O, triggers and other internals.
    Utility,
}

use NodeKind::{Service, Utility};

/// Normalized node-type key → kind. Order matters for name scanning.
pub const NODE_KINDS: &[(&str, NodeKind)] = &[
    // messaging
    ("telegram", Service("Telegram")),
    ("discord", Service("Discord")),
    ("slack", Service("Slack")),
    ("whatsapp", Service("WhatsApp")),
    ("mattermost", Service("Mattermost")),
    ("microsoftteams", Service("Microsoft Teams")),
    ("teams", Service("Microsoft Teams")),
    ("rocketchat", Service("Rocket.Chat")),
    // email
    ("gmail", Service("Gmail")),
    ("mailjet", Service("Mailjet")),
    ("emailreadimap", Service("Email (IMAP)")),
    ("emailsend", Service("Email (SMTP)")),
    ("microsoftoutlook", Service("Outlook")),
    ("outlook", Service("Outlook")),
    // cloud storage
    ("googledrive", Service("Google Drive")),
    ("googledocs", Service("Google Docs")),
    ("googlesheets", Service("Google Sheets")),
    ("dropbox", Service("Dropbox")),
    ("microsoftonedrive", Service("OneDrive")),
    ("onedrive", Service("OneDrive")),
    ("box", Service("Box")),
    // databases
    ("postgres", Service("PostgreSQL")),
    ("mysql", Service("MySQL")),
    ("mongodb", Service("MongoDB")),
    ("redis", Service("Redis")),
    ("airtable", Service("Airtable")),
    ("notion", Service("Notion")),
    // project management
    ("jira", Service("Jira")),
    ("github", Service("GitHub")),
    ("gitlab", Service("GitLab")),
    ("trello", Service("Trello")),
    ("asana", Service("Asana")),
    ("mondaycom", Service("Monday.com")),
    // AI / ML
    ("openai", Service("OpenAI")),
    ("lmchatopenai", Service("OpenAI")),
    ("embeddingsopenai", Service("OpenAI")),
    ("anthropic", Service("Anthropic")),
    ("lmchatanthropic", Service("Anthropic")),
    ("huggingface", Service("Hugging Face")),
    // social media
    ("linkedin", Service("LinkedIn")),
    ("twitter", Service("Twitter/X")),
    ("facebook", Service("Facebook")),
    ("instagram", Service("Instagram")),
    // e-commerce
    ("shopify", Service("Shopify")),
    ("stripe", Service("Stripe")),
    ("paypal", Service("PayPal")),
    // analytics
    ("googleanalytics", Service("Google Analytics")),
    ("mixpanel", Service("Mixpanel")),
    // calendar & tasks
    ("googlecalendar", Service("Google Calendar")),
    ("googletasks", Service("Google Tasks")),
    ("calendly", Service("Calendly")),
    ("cal", Service("Cal.com")),
    // forms
    ("typeform", Service("Typeform")),
    ("googleforms", Service("Google Forms")),
    ("form", Service("Form Trigger")),
    // development
    ("httprequest", Service("HTTP Request")),
    ("graphql", Service("GraphQL")),
    ("sse", Service("Server-Sent Events")),
    ("youtube", Service("YouTube")),
    ("calcslive", Service("CalcsLive")),
    // trigger-only kinds
    ("webhook", Utility),
    ("respondtowebhook", Utility),
    ("schedule", Utility),
    ("cron", Utility),
    ("interval", Utility),
    ("manual", Utility),
    ("start", Utility),
    ("error", Utility),
    ("chat", Utility),
    // control flow
    ("if", Utility),
    ("switch", Utility),
    ("merge", Utility),
    ("split", Utility),
    ("splitinbatches", Utility),
    ("splitout", Utility),
    ("wait", Utility),
    ("noop", Utility),
    ("stopanderror", Utility),
    ("executeworkflow", Utility),
    ("executecommand", Utility),
    ("executiondata", Utility),
    ("stickynote", Utility),
    ("debughelper", Utility),
    // code and data shaping
    ("set", Utility),
    ("function", Utility),
    ("functionitem", Utility),
    ("code", Utility),
    ("itemlists", Utility),
    ("limit", Utility),
    ("aggregate", Utility),
    ("summarize", Utility),
    ("filter", Utility),
    ("sort", Utility),
    ("removeduplicates", Utility),
    ("renamekeys", Utility),
    ("comparedatasets", Utility),
    ("datetime", Utility),
    ("html", Utility),
    ("xml", Utility),
    ("markdown", Utility),
    ("crypto", Utility),
    // file I/O
    ("extractfromfile", Utility),
    ("converttofile", Utility),
    ("spreadsheetfile", Utility),
    ("readbinaryfile", Utility),
    ("readbinaryfiles", Utility),
    ("writebinaryfile", Utility),
    ("readwritefile", Utility),
    ("movebinarydata", Utility),
    ("compression", Utility),
    // LLM plumbing
    ("agent", Utility),
    ("chainllm", Utility),
    ("chainsummarization", Utility),
    ("memorybufferwindow", Utility),
    ("outputparserstructured", Utility),
    ("toolcode", Utility),
    ("toolworkflow", Utility),
];

/// Keywords recognized inside third-party package node types
/// (e.g. `n8n-nodes-youtube-transcription.youtubeTranscripter`).
pub const COMMUNITY_KEYWORDS: &[(&str, &str)] = &[
    ("youtube", "YouTube"),
    ("telegram", "Telegram"),
    ("discord", "Discord"),
    ("calcslive", "CalcsLive"),
];

/// Keys this short only match a whole word of a node name, so `cal` skips
/// "calculation" and `form` skips "Information".
const SHORT_KEY_MAX_LEN: usize = 4;

const BASE_PREFIX: &str = "n8n-nodes-base.";
const SCOPED_PREFIX: &str = "@n8n/";

/// Service categories and the canonical services that belong to them.
pub const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "messaging",
        &[
            "Telegram",
            "Discord",
            "Slack",
            "WhatsApp",
            "Mattermost",
            "Microsoft Teams",
            "Rocket.Chat",
        ],
    ),
    (
        "email",
        &["Gmail", "Mailjet", "Email (IMAP)", "Email (SMTP)", "Outlook"],
    ),
    (
        "cloud_storage",
        &[
            "Google Drive",
            "Google Docs",
            "Google Sheets",
            "Dropbox",
            "OneDrive",
            "Box",
        ],
    ),
    (
        "database",
        &["PostgreSQL", "MySQL", "MongoDB", "Redis", "Airtable", "Notion"],
    ),
    (
        "project_management",
        &["Jira", "GitHub", "GitLab", "Trello", "Asana", "Monday.com"],
    ),
    (
        "ai_ml",
        &["OpenAI", "Anthropic", "Hugging Face", "CalcsLive"],
    ),
    (
        "social_media",
        &["LinkedIn", "Twitter/X", "Facebook", "Instagram"],
    ),
    ("ecommerce", &["Shopify", "Stripe", "PayPal"]),
    ("analytics", &["Google Analytics", "Mixpanel"]),
    (
        "calendar_tasks",
        &["Google Calendar", "Google Tasks", "Cal.com", "Calendly"],
    ),
    ("forms", &["Typeform", "Google Forms", "Form Trigger"]),
    (
        "development",
        &["HTTP Request", "GraphQL", "Server-Sent Events", "YouTube"],
    ),
];

/// Label used when no category matches a record's integrations.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Exact lookup of a normalized key.
pub fn lookup(key: &str) -> Option<NodeKind> {
    NODE_KINDS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, kind)| *kind)
}

/// Outcome of looking at a node's type string alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMatch {
    Service(String),
    Utility,
    /// Not in the table. Carries the title-cased key for first-party types.
    Unresolved { fallback: Option<String> },
}

/// Strip the namespace and a trailing `trigger`, then lower-case.
///
/// Returns `None` for types outside the first-party namespaces.
pub fn normalize_node_type(node_type: &str) -> Option<String> {
    let raw = if let Some(rest) = node_type.strip_prefix(BASE_PREFIX) {
        rest
    } else if node_type.starts_with(SCOPED_PREFIX) {
        node_type.rsplit('.').next().unwrap_or(node_type)
    } else {
        return None;
    };

    let lower = raw.to_lowercase();
    let key = lower.strip_suffix("trigger").unwrap_or(&lower);
    Some(key.to_string())
}

pub fn service_from_type(node_type: &str) -> TypeMatch {
    if let Some(key) = normalize_node_type(node_type) {
        if key.is_empty() {
            return TypeMatch::Unresolved { fallback: None };
        }
        return match lookup(&key) {
            Some(NodeKind::Service(name)) => TypeMatch::Service(name.to_string()),
            Some(NodeKind::Utility) => TypeMatch::Utility,
            None => TypeMatch::Unresolved {
                fallback: Some(capitalize(&key)),
            },
        };
    }

    if node_type.contains('-') || node_type.contains('@') {
        let lower = node_type.to_lowercase();
        for part in lower.split('.') {
            if let Some((_, name)) = COMMUNITY_KEYWORDS.iter().find(|(kw, _)| part.contains(kw)) {
                return TypeMatch::Service(name.to_string());
            }
        }
    }

    TypeMatch::Unresolved { fallback: None }
}

/// Secondary signal: first service key (in table order) contained in the name.
pub fn service_from_name(node_name: &str) -> Option<&'static str> {
    let name = node_name.to_lowercase();
    if name.is_empty() {
        return None;
    }

    NODE_KINDS.iter().find_map(|(key, kind)| match kind {
        NodeKind::Service(service) => {
            let hit = if key.len() <= SHORT_KEY_MAX_LEN {
                name.split(|c: char| !c.is_alphanumeric()).any(|word| word == *key)
            } else {
                name.contains(key)
            };
            hit.then_some(*service)
        }
        NodeKind::Utility => None,
    })
}

/// Resolve the integration contributed by one node, if any.
pub fn resolve_node_service(node_type: &str, node_name: &str) -> Option<String> {
    match service_from_type(node_type) {
        TypeMatch::Service(name) => Some(name),
        TypeMatch::Utility => None,
        TypeMatch::Unresolved { fallback } => service_from_name(node_name)
            .map(str::to_string)
            .or(fallback),
    }
}

/// Services belonging to `category`, or `None` for an unknown key.
pub fn category_services(category: &str) -> Option<&'static [&'static str]> {
    CATEGORIES
        .iter()
        .find(|(key, _)| *key == category)
        .map(|(_, services)| *services)
}

/// First category (in table order) sharing a service with `integrations`.
pub fn category_for(integrations: &[String]) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(_, services)| {
            integrations
                .iter()
                .any(|i| services.iter().any(|s| *s == i.as_str()))
        })
        .map(|(key, _)| *key)
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
