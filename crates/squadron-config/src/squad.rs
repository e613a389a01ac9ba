// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The validated, immutable squad model.
//!
//! [`SquadConfig::load`] checks a [`SquadDocument`] for every consistency
//! rule routing relies on and reports all violations at once. A loaded
//! `SquadConfig` never changes; reloading means building a new one.

use std::collections::HashMap;

use serde::Serialize;
use squadron_core::{ResponderKind, TierKind, FALLBACK_TIER};
use tracing::{debug, warn};

use crate::diagnostic::{suggest_key, ConfigError};
use crate::model::SquadDocument;

/// A registered responder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Responder {
    pub id: String,
    pub kind: ResponderKind,
    pub display_name: String,
    pub tags: Vec<String>,
}

/// A capability tier, in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tier {
    pub name: String,
    pub kind: TierKind,
    pub confidence_threshold: f64,
    pub description: String,
    /// Member ids in declaration order.
    pub members: Vec<String>,
}

impl Tier {
    pub fn contains(&self, responder_id: &str) -> bool {
        self.members.iter().any(|m| m == responder_id)
    }
}

/// Read-only overview of a loaded squad.
#[derive(Debug, Clone, Serialize)]
pub struct SquadSummary {
    pub name: String,
    pub responder_count: usize,
    pub specialist_count: usize,
    pub coordinator_count: usize,
    pub fallback_id: String,
    pub tiers: Vec<TierSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierSummary {
    pub name: String,
    pub kind: TierKind,
    pub confidence_threshold: f64,
    pub members: Vec<String>,
}

/// Validated squad: responder registry, ordered tiers and the fallback.
#[derive(Debug, Clone)]
pub struct SquadConfig {
    name: String,
    description: String,
    responders: Vec<Responder>,
    index: HashMap<String, usize>,
    tiers: Vec<Tier>,
    tier_of: HashMap<String, usize>,
    fallback_id: String,
    fan_out: HashMap<String, Vec<String>>,
}

impl SquadConfig {
    /// Validate a squad document and build the routing model.
    ///
    /// Every violation is collected; an `Err` lists them all.
    pub fn load(doc: &SquadDocument) -> Result<Self, Vec<ConfigError>> {
        let mut errors = Vec::new();

        let (responders, index) = collect_responders(doc, &mut errors);
        let fallback_id = doc.fallback.responder.trim().to_string();
        check_fallback(&fallback_id, &responders, &index, &mut errors);

        let tier_of = check_tiers(doc, &responders, &index, &fallback_id, &mut errors);

        let tiers: Vec<Tier> = doc
            .tiers
            .iter()
            .map(|t| Tier {
                name: t.name.clone(),
                kind: t.kind,
                confidence_threshold: t.confidence_threshold,
                description: t.description.clone(),
                members: t.members.clone(),
            })
            .collect();

        let fan_out = resolve_fan_out(doc, &responders, &index, &tiers, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        for responder in &responders {
            let routed = tier_of.contains_key(&responder.id);
            let targeted = fan_out.values().any(|t| t.contains(&responder.id));
            if responder.kind != ResponderKind::Fallback && !routed && !targeted {
                warn!(
                    responder = %responder.id,
                    kind = %responder.kind,
                    "responder is not a tier member or fan-out target and will never be invoked"
                );
            }
        }

        debug!(
            squad = %doc.name,
            responders = responders.len(),
            tiers = tiers.len(),
            fallback = %fallback_id,
            "squad configuration loaded"
        );

        Ok(Self {
            name: doc.name.clone(),
            description: doc.description.clone(),
            responders,
            index,
            tiers,
            tier_of,
            fallback_id,
            fan_out,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Tiers in evaluation order.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn fallback_id(&self) -> &str {
        &self.fallback_id
    }

    /// All responders in declaration order.
    pub fn responders(&self) -> &[Responder] {
        &self.responders
    }

    pub fn responder(&self, id: &str) -> Option<&Responder> {
        self.index.get(id).map(|&i| &self.responders[i])
    }

    /// The tier a responder belongs to. `None` for the fallback and untiered responders.
    pub fn tier_of(&self, id: &str) -> Option<&Tier> {
        self.tier_of.get(id).map(|&i| &self.tiers[i])
    }

    /// Position of a responder within its tier's member list.
    pub fn member_position(&self, id: &str) -> Option<usize> {
        self.tier_of(id)
            .and_then(|tier| tier.members.iter().position(|m| m == id))
    }

    /// Resolved fan-out targets for a coordinator, in invocation order.
    pub fn fan_out_targets(&self, coordinator_id: &str) -> Option<&[String]> {
        self.fan_out.get(coordinator_id).map(Vec::as_slice)
    }

    /// Human-readable name for a responder, falling back to the id.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.responder(id)
            .map(|r| r.display_name.as_str())
            .unwrap_or(id)
    }

    fn count_kind(&self, kind: ResponderKind) -> usize {
        self.responders.iter().filter(|r| r.kind == kind).count()
    }

    pub fn summary(&self) -> SquadSummary {
        SquadSummary {
            name: self.name.clone(),
            responder_count: self.responders.len(),
            specialist_count: self.count_kind(ResponderKind::Specialist),
            coordinator_count: self.count_kind(ResponderKind::Coordinator),
            fallback_id: self.fallback_id.clone(),
            tiers: self
                .tiers
                .iter()
                .map(|t| TierSummary {
                    name: t.name.clone(),
                    kind: t.kind,
                    confidence_threshold: t.confidence_threshold,
                    members: t.members.clone(),
                })
                .collect(),
        }
    }
}

fn collect_responders(
    doc: &SquadDocument,
    errors: &mut Vec<ConfigError>,
) -> (Vec<Responder>, HashMap<String, usize>) {
    let mut responders = Vec::with_capacity(doc.responders.len());
    let mut index = HashMap::new();

    for spec in &doc.responders {
        let id = spec.id.trim();
        if id.is_empty() {
            errors.push(ConfigError::validation("responder id must not be empty"));
            continue;
        }
        if index.contains_key(id) {
            errors.push(ConfigError::validation(format!(
                "responder `{id}` is declared more than once"
            )));
            continue;
        }
        index.insert(id.to_string(), responders.len());
        responders.push(Responder {
            id: id.to_string(),
            kind: spec.kind,
            display_name: spec
                .display_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| id.to_string()),
            tags: spec.tags.clone(),
        });
    }

    (responders, index)
}

fn check_fallback(
    fallback_id: &str,
    responders: &[Responder],
    index: &HashMap<String, usize>,
    errors: &mut Vec<ConfigError>,
) {
    if fallback_id.is_empty() {
        errors.push(ConfigError::validation(
            "squad.fallback.responder must name the fallback responder",
        ));
    } else {
        match index.get(fallback_id).map(|&i| &responders[i]) {
            Some(r) if r.kind == ResponderKind::Fallback => {}
            _ => errors.push(ConfigError::FallbackMissing {
                responder: fallback_id.to_string(),
            }),
        }
    }

    for r in responders {
        if r.kind == ResponderKind::Fallback && r.id != fallback_id {
            errors.push(ConfigError::validation(format!(
                "responder `{}` has kind fallback but squad.fallback.responder is `{fallback_id}`; exactly one fallback is allowed",
                r.id
            )));
        }
    }
}

/// Checks tier names, thresholds and membership. Returns member id → tier index.
fn check_tiers(
    doc: &SquadDocument,
    responders: &[Responder],
    index: &HashMap<String, usize>,
    fallback_id: &str,
    errors: &mut Vec<ConfigError>,
) -> HashMap<String, usize> {
    let mut tier_of: HashMap<String, usize> = HashMap::new();

    if doc.tiers.is_empty() {
        errors.push(ConfigError::EmptyTiers);
        return tier_of;
    }

    let known: Vec<&str> = responders.iter().map(|r| r.id.as_str()).collect();
    let mut names: Vec<&str> = Vec::new();
    let mut previous: Option<(&str, f64)> = None;

    for (tier_index, tier) in doc.tiers.iter().enumerate() {
        let name = tier.name.as_str();

        if name.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "tier #{} has an empty name",
                tier_index + 1
            )));
        } else if name == FALLBACK_TIER {
            errors.push(ConfigError::validation(format!(
                "tier name `{FALLBACK_TIER}` is reserved"
            )));
        } else if names.contains(&name) {
            errors.push(ConfigError::validation(format!(
                "tier `{name}` is declared more than once"
            )));
        }
        names.push(name);

        let threshold = tier.confidence_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            errors.push(ConfigError::ThresholdOutOfRange {
                tier: name.to_string(),
                value: threshold,
            });
        } else {
            if let Some((previous_tier, previous_threshold)) = previous {
                if threshold > previous_threshold {
                    errors.push(ConfigError::ThresholdIncrease {
                        tier: name.to_string(),
                        threshold,
                        previous_tier: previous_tier.to_string(),
                        previous_threshold,
                    });
                }
            }
            previous = Some((name, threshold));
        }

        if tier.members.is_empty() {
            errors.push(ConfigError::validation(format!(
                "tier `{name}` has no members"
            )));
        }

        for member in &tier.members {
            let member = member.as_str();
            if member == fallback_id {
                errors.push(ConfigError::FallbackInTier {
                    tier: name.to_string(),
                    responder: member.to_string(),
                });
                continue;
            }

            let Some(&responder_index) = index.get(member) else {
                errors.push(ConfigError::DanglingResponder {
                    owner: format!("tier `{name}`"),
                    responder: member.to_string(),
                    suggestion: suggest_key(member, &known),
                });
                continue;
            };

            if let Some(&first) = tier_of.get(member) {
                errors.push(ConfigError::DuplicateMember {
                    responder: member.to_string(),
                    first: doc.tiers[first].name.clone(),
                    second: name.to_string(),
                });
                continue;
            }
            tier_of.insert(member.to_string(), tier_index);

            let responder = &responders[responder_index];
            if responder.kind != tier.kind.member_kind() {
                errors.push(ConfigError::validation(format!(
                    "responder `{member}` has kind {} but tier `{name}` is a {} tier",
                    responder.kind, tier.kind
                )));
            }
        }
    }

    tier_of
}

/// Resolve each coordinator's fan-out target list.
///
/// Explicit targets must be declared specialists. An empty list means every
/// member of every specialist tier, in tier order.
fn resolve_fan_out(
    doc: &SquadDocument,
    responders: &[Responder],
    index: &HashMap<String, usize>,
    tiers: &[Tier],
    errors: &mut Vec<ConfigError>,
) -> HashMap<String, Vec<String>> {
    let known: Vec<&str> = responders.iter().map(|r| r.id.as_str()).collect();
    let mut fan_out = HashMap::new();

    for spec in &doc.responders {
        let id = spec.id.trim();

        if spec.kind != ResponderKind::Coordinator {
            if !spec.targets.is_empty() {
                errors.push(ConfigError::validation(format!(
                    "responder `{id}` declares targets but only coordinators fan out"
                )));
            }
            continue;
        }

        let targets: Vec<String> = if spec.targets.is_empty() {
            tiers
                .iter()
                .filter(|t| t.kind == TierKind::Specialist)
                .flat_map(|t| t.members.iter().cloned())
                .filter(|m| {
                    index
                        .get(m)
                        .is_some_and(|&i| responders[i].kind == ResponderKind::Specialist)
                })
                .collect()
        } else {
            let mut resolved: Vec<String> = Vec::with_capacity(spec.targets.len());
            for target in &spec.targets {
                match index.get(target.as_str()).map(|&i| &responders[i]) {
                    None => errors.push(ConfigError::DanglingResponder {
                        owner: format!("coordinator `{id}`"),
                        responder: target.clone(),
                        suggestion: suggest_key(target, &known),
                    }),
                    Some(r) if r.kind != ResponderKind::Specialist => {
                        errors.push(ConfigError::validation(format!(
                            "coordinator `{id}` targets `{target}`, which is a {} and not a specialist",
                            r.kind
                        )));
                    }
                    Some(_) if resolved.contains(target) => {
                        errors.push(ConfigError::validation(format!(
                            "coordinator `{id}` lists target `{target}` more than once"
                        )));
                    }
                    Some(_) => resolved.push(target.clone()),
                }
            }
            resolved
        };

        if targets.is_empty() && spec.targets.is_empty() {
            errors.push(ConfigError::validation(format!(
                "coordinator `{id}` has no fan-out targets; declare targets or a specialist tier"
            )));
        }

        fan_out.insert(id.to_string(), targets);
    }

    fan_out
}
