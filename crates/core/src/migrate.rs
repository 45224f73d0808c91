//! Upgrades persisted documents to the current schema.
//!
//! Documents are classified by their `version` tag alone: no tag, or a
//! numeric tag of 1 or below, means the legacy layout where a channel's
//! candidates are bare ids. Every other tag is decoded with the current
//! layout, which keeps documents written by newer releases readable without
//! ever downgrading them.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::{
    BearerToken, Candidate, CandidateId, Channel, ChannelId, Document, Team, TeamId,
    CURRENT_SCHEMA_VERSION,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaVersion {
    /// Flat candidate id lists, no version stamp.
    V1,
    /// Candidates carry group memberships; document stamped `"2"`.
    V2,
}

impl SchemaVersion {
    pub const CURRENT: Self = Self::V2;

    /// Maps a raw `version` tag to a known schema. Numeric tags up to 1
    /// (`"0"`, `"01"`, `"1.0"`) are legacy; non-numeric tags count as current.
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag.map(str::trim).filter(|tag| !tag.is_empty()) else {
            return Self::V1;
        };
        match tag.parse::<f64>() {
            Ok(number) if number.is_finite() && number <= 1.0 => Self::V1,
            _ => Self::V2,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::V1 => "1",
            Self::V2 => CURRENT_SCHEMA_VERSION,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionedDocument {
    Legacy(LegacyDocument),
    Current(Document),
}

impl VersionedDocument {
    pub fn schema(&self) -> SchemaVersion {
        match self {
            Self::Legacy(_) => SchemaVersion::V1,
            Self::Current(_) => SchemaVersion::V2,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LegacyDocument {
    #[serde(default)]
    pub teams: BTreeMap<TeamId, LegacyTeam>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LegacyTeam {
    #[serde(default)]
    pub token: Option<BearerToken>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channels: BTreeMap<ChannelId, LegacyChannel>,
}

/// Legacy channel. Per-channel scratch fields such as `eligibleCandidates` are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LegacyChannel {
    #[serde(default)]
    pub candidates: Vec<CandidateId>,
}

/// Result of [`upgrade`]: the current-layout document and the steps applied to reach it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upgrade {
    pub document: Document,
    pub from: SchemaVersion,
    pub steps: Vec<&'static str>,
}

impl Upgrade {
    pub fn changed(&self) -> bool {
        !self.steps.is_empty()
    }
}

pub fn decode(raw: &str) -> Result<VersionedDocument, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    let tag = value.get("version").and_then(Value::as_str);

    match SchemaVersion::from_tag(tag) {
        SchemaVersion::V1 => serde_json::from_value(value).map(VersionedDocument::Legacy),
        SchemaVersion::V2 => {
            let mut document: Document = serde_json::from_value(value)?;
            collapse_duplicate_candidates(&mut document);
            Ok(VersionedDocument::Current(document))
        }
    }
}

/// Folds repeated candidate names within a channel into the first entry,
/// unioning their groups. Returns how many entries were dropped.
pub fn collapse_duplicate_candidates(document: &mut Document) -> usize {
    let mut dropped = 0;
    for (team_id, team) in &mut document.teams {
        for (channel_id, channel) in &mut team.channels {
            let mut kept: Vec<Candidate> = Vec::with_capacity(channel.candidates.len());
            let mut merged = 0;
            for candidate in channel.candidates.drain(..) {
                match kept.iter_mut().find(|existing| existing.name == candidate.name) {
                    Some(existing) => {
                        existing.groups.extend(candidate.groups);
                        merged += 1;
                    }
                    None => kept.push(candidate),
                }
            }
            channel.candidates = kept;

            if merged > 0 {
                warn!(
                    event_name = "migrate.duplicates_collapsed",
                    team_id = %team_id,
                    channel_id = %channel_id,
                    merged,
                    "duplicate candidate entries merged"
                );
            }
            dropped += merged;
        }
    }
    dropped
}

/// Applies every migration step between the document's schema and the current one.
pub fn upgrade(document: VersionedDocument) -> Upgrade {
    let from = document.schema();
    let mut steps = Vec::new();
    let mut pending = document;

    loop {
        pending = match pending {
            VersionedDocument::Legacy(legacy) => {
                steps.push("v1_to_v2");
                VersionedDocument::Current(v1_to_v2(legacy))
            }
            VersionedDocument::Current(document) => {
                if !steps.is_empty() {
                    info!(
                        event_name = "migrate.applied",
                        from = from.tag(),
                        to = document.version.as_str(),
                        steps = %steps.join(","),
                        "document migrated to current schema"
                    );
                }
                return Upgrade { document, from, steps };
            }
        };
    }
}

fn v1_to_v2(legacy: LegacyDocument) -> Document {
    let teams = legacy
        .teams
        .into_iter()
        .map(|(team_id, team)| {
            let channels = team
                .channels
                .into_iter()
                .map(|(channel_id, channel)| {
                    let mut candidates: Vec<Candidate> = Vec::new();
                    for name in channel.candidates {
                        if candidates.iter().all(|existing| existing.name != name) {
                            candidates.push(Candidate::ungrouped(name));
                        }
                    }
                    (channel_id, Channel { candidates, ..Channel::default() })
                })
                .collect();
            (team_id, Team { token: team.token, name: team.name, channels })
        })
        .collect();

    Document { version: SchemaVersion::V2.tag().to_owned(), teams }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode, upgrade, SchemaVersion, VersionedDocument};
    use crate::domain::{CandidateId, ChannelId, Document, TeamId, CURRENT_SCHEMA_VERSION};

    fn channel_candidates(document: &Document) -> serde_json::Value {
        let channel = document
            .channel(&TeamId::from("T1"), &ChannelId::from("C1"))
            .expect("channel should survive migration");
        serde_json::to_value(&channel.candidates).expect("serialize candidates")
    }

    #[test]
    fn legacy_candidates_gain_empty_groups_and_version_stamp() {
        let raw = json!({
            "teams": {
                "T1": {
                    "token": "xoxp-1",
                    "name": "Acme",
                    "channels": {
                        "C1": { "candidates": ["A", "B"], "eligibleCandidates": ["A"] }
                    }
                }
            }
        })
        .to_string();

        let decoded = decode(&raw).expect("decode legacy");
        assert_eq!(decoded.schema(), SchemaVersion::V1);

        let upgraded = upgrade(decoded);
        assert!(upgraded.changed());
        assert_eq!(upgraded.from, SchemaVersion::V1);
        assert_eq!(upgraded.document.version, CURRENT_SCHEMA_VERSION);
        assert_eq!(
            channel_candidates(&upgraded.document),
            json!([{ "name": "A", "groups": [] }, { "name": "B", "groups": [] }])
        );
        let team = upgraded.document.team(&TeamId::from("T1")).expect("team kept");
        assert_eq!(team.name.as_deref(), Some("Acme"));
        assert_eq!(team.token.as_ref().map(|token| token.expose()), Some("xoxp-1"));
    }

    #[test]
    fn legacy_duplicates_collapse_to_one_candidate() {
        let raw = json!({
            "teams": { "T1": { "channels": { "C1": { "candidates": ["A", "A"] } } } }
        })
        .to_string();

        let upgraded = upgrade(decode(&raw).expect("decode legacy"));

        assert_eq!(channel_candidates(&upgraded.document), json!([{ "name": "A", "groups": [] }]));
    }

    #[test]
    fn current_document_is_left_untouched() {
        let raw = json!({
            "version": "2",
            "teams": {
                "T1": {
                    "token": null,
                    "name": null,
                    "channels": {
                        "C1": {
                            "candidates": [{ "name": "A", "groups": ["web"] }],
                            "notEligibleUsers": ["A"]
                        }
                    }
                }
            }
        });

        let decoded = decode(&raw.to_string()).expect("decode current");
        let VersionedDocument::Current(original) = decoded.clone() else {
            panic!("expected current document");
        };

        let upgraded = upgrade(decoded);
        assert!(!upgraded.changed());
        assert_eq!(upgraded.document, original);
        assert_eq!(serde_json::to_value(&upgraded.document).expect("serialize"), raw);
    }

    #[test]
    fn upgrade_is_idempotent() {
        let raw = json!({ "teams": { "T1": { "channels": { "C1": { "candidates": ["A"] } } } } })
            .to_string();

        let first = upgrade(decode(&raw).expect("decode legacy"));
        let second = upgrade(VersionedDocument::Current(first.document.clone()));

        assert!(!second.changed());
        assert_eq!(second.document, first.document);
    }

    #[test]
    fn future_version_is_kept_as_is() {
        let raw = json!({
            "version": "7",
            "teams": {
                "T1": { "channels": { "C1": { "candidates": [{ "name": "A", "groups": [] }] } } }
            }
        })
        .to_string();

        let upgraded = upgrade(decode(&raw).expect("decode future"));

        assert!(!upgraded.changed());
        assert_eq!(upgraded.document.version, "7");
        let channel = upgraded
            .document
            .channel(&TeamId::from("T1"), &ChannelId::from("C1"))
            .expect("channel");
        assert!(channel.candidate(&CandidateId::from("A")).is_some());
    }

    #[test]
    fn explicit_v1_tag_is_legacy() {
        assert_eq!(SchemaVersion::from_tag(Some("1")), SchemaVersion::V1);
        assert_eq!(SchemaVersion::from_tag(None), SchemaVersion::V1);
        assert_eq!(SchemaVersion::from_tag(Some(" ")), SchemaVersion::V1);
        assert_eq!(SchemaVersion::from_tag(Some("2")), SchemaVersion::V2);
        assert_eq!(SchemaVersion::from_tag(Some("2.1")), SchemaVersion::V2);
    }

    #[test]
    fn older_numeric_tags_are_legacy() {
        for tag in ["0", "01", "1.0", "-3"] {
            assert_eq!(SchemaVersion::from_tag(Some(tag)), SchemaVersion::V1, "tag {tag}");
        }
        for tag in ["7", "beta", "NaN"] {
            assert_eq!(SchemaVersion::from_tag(Some(tag)), SchemaVersion::V2, "tag {tag}");
        }
    }

    #[test]
    fn version_zero_document_is_upgraded_not_dropped() {
        let raw = json!({
            "version": "0",
            "teams": { "T1": { "channels": { "C1": { "candidates": ["A"] } } } }
        })
        .to_string();

        let decoded = decode(&raw).expect("decode version 0 document");
        assert_eq!(decoded.schema(), SchemaVersion::V1);

        let upgraded = upgrade(decoded);
        assert_eq!(upgraded.steps, vec!["v1_to_v2"]);
        assert_eq!(upgraded.document.version, CURRENT_SCHEMA_VERSION);
        assert_eq!(channel_candidates(&upgraded.document), json!([{ "name": "A", "groups": [] }]));
    }

    #[test]
    fn current_document_duplicates_merge_into_first_entry() {
        let raw = json!({
            "version": "2",
            "teams": {
                "T1": {
                    "channels": {
                        "C1": {
                            "candidates": [
                                { "name": "A", "groups": ["web"] },
                                { "name": "B", "groups": [] },
                                { "name": "A", "groups": ["api"] }
                            ]
                        }
                    }
                }
            }
        })
        .to_string();

        let VersionedDocument::Current(document) = decode(&raw).expect("decode current") else {
            panic!("expected current document");
        };

        assert_eq!(
            channel_candidates(&document),
            json!([{ "name": "A", "groups": ["api", "web"] }, { "name": "B", "groups": [] }])
        );
    }
}
