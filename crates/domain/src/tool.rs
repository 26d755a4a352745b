use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The closed set of tool keys a plan may reference.
///
/// Anything outside this set is dropped during plan normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKey {
    RagSearch,
    DocsSignUrl,
    NotifyUser,
    TrialBalanceGet,
    LedgerQuery,
    AnalyticsExport,
}

impl ToolKey {
    pub const ALL: [ToolKey; 6] = [
        ToolKey::RagSearch,
        ToolKey::DocsSignUrl,
        ToolKey::NotifyUser,
        ToolKey::TrialBalanceGet,
        ToolKey::LedgerQuery,
        ToolKey::AnalyticsExport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolKey::RagSearch => "rag.search",
            ToolKey::DocsSignUrl => "docs.sign_url",
            ToolKey::NotifyUser => "notify.user",
            ToolKey::TrialBalanceGet => "trial_balance.get",
            ToolKey::LedgerQuery => "ledger.query",
            ToolKey::AnalyticsExport => "analytics.export",
        }
    }

    /// Exact-match lookup against the allowlist. Keys are case-sensitive.
    pub fn lookup(key: &str) -> Option<ToolKey> {
        ToolKey::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for ToolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ToolKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ToolKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ToolKey::lookup(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("tool key '{raw}' is not allowlisted")))
    }
}
