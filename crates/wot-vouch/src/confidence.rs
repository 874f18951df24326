//! Confidence normalization: free-form vouch metadata to a typed record.
//!
//! A vouch's expansion carries its confidence as an arbitrary JSON object.
//! Normalization happens in two passes:
//! 1. Targeted rewrites of the keys that need outside knowledge:
//!    `username_verified_via` is matched case-insensitively against the
//!    verification method table, and every uid in `vouched_by` is
//!    resolved to a username through the injected lookup.
//! 2. A field-by-field mapping of the rewritten object into `Confidence`.
//!    Unknown keys are ignored; known keys that do not fit are errors.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::context::VouchContext;
use crate::error::{Result, VouchError};
use crate::identity::{SigId, Uid};

const USERNAME_VERIFIED_VIA: &str = "username_verified_via";
const VOUCHED_BY: &str = "vouched_by";
const PROOFS: &str = "proofs";
const OTHER: &str = "other";
const KNOWN_ON_KEYBASE_DAYS: &str = "known_on_keybase_days";

/// Resolves uids to usernames.
pub trait UsernameLookup {
    /// Return the current username of `uid`.
    ///
    /// Implementations should fail with `VouchError::IdentityLookupFailed`
    /// and must honour `ctx`.
    fn lookup_username(&self, ctx: &VouchContext, uid: &Uid) -> Result<String>;
}

/// How the voucher confirmed the username belongs to the person they know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsernameVerificationType {
    None,
    Audio,
    Video,
    Email,
    OtherChat,
    InPerson,
}

impl UsernameVerificationType {
    pub const ALL: [UsernameVerificationType; 6] = [
        Self::None,
        Self::Audio,
        Self::Video,
        Self::Email,
        Self::OtherChat,
        Self::InPerson,
    ];

    /// Numeric code of the method.
    pub fn code(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Audio => 1,
            Self::Video => 2,
            Self::Email => 3,
            Self::OtherChat => 4,
            Self::InPerson => 5,
        }
    }

    /// Return a stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Email => "email",
            Self::OtherChat => "other_chat",
            Self::InPerson => "in_person",
        }
    }

    /// Look a method up by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "NONE" => Some(Self::None),
            "AUDIO" => Some(Self::Audio),
            "VIDEO" => Some(Self::Video),
            "EMAIL" => Some(Self::Email),
            "OTHER_CHAT" => Some(Self::OtherChat),
            "IN_PERSON" => Some(Self::InPerson),
            _ => None,
        }
    }
}

impl std::fmt::Display for UsernameVerificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UsernameVerificationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UsernameVerificationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::from_name(&name).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown username verification method: {name}"))
        })
    }
}

/// Canonical confidence record attached to a verified vouch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username_verified_via: Option<UsernameVerificationType>,
    /// Usernames of the people through whom the voucher knows the subject.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vouched_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proofs: Vec<SigId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_on_keybase_days: Option<u32>,
}

impl Confidence {
    /// Render the record back into the raw object form found in expansions.
    pub fn to_raw(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(via) = self.username_verified_via {
            map.insert(USERNAME_VERIFIED_VIA.into(), Value::from(via.as_str()));
        }
        if !self.vouched_by.is_empty() {
            map.insert(VOUCHED_BY.into(), Value::from(self.vouched_by.clone()));
        }
        if !self.proofs.is_empty() {
            let proofs: Vec<Value> = self
                .proofs
                .iter()
                .map(|p| Value::from(p.as_str()))
                .collect();
            map.insert(PROOFS.into(), Value::Array(proofs));
        }
        if let Some(other) = &self.other {
            map.insert(OTHER.into(), Value::from(other.as_str()));
        }
        if let Some(days) = self.known_on_keybase_days {
            map.insert(KNOWN_ON_KEYBASE_DAYS.into(), Value::from(days));
        }
        map
    }

    /// Map an already-rewritten object into the record, field by field.
    ///
    /// `vouched_by` must already hold usernames. Unknown keys are skipped.
    pub fn from_canonical_map(map: &Map<String, Value>) -> Result<Self> {
        let mut confidence = Confidence::default();

        for (key, value) in map {
            match key.as_str() {
                USERNAME_VERIFIED_VIA => {
                    confidence.username_verified_via = match value {
                        Value::Null => None,
                        Value::String(s) => Some(UsernameVerificationType::from_name(s).ok_or_else(
                            || VouchError::SchemaMismatch {
                                field: USERNAME_VERIFIED_VIA,
                                reason: format!("unknown method {s:?}"),
                            },
                        )?),
                        other => return Err(schema_mismatch(USERNAME_VERIFIED_VIA, "string", other)),
                    };
                }
                VOUCHED_BY => confidence.vouched_by = string_list(VOUCHED_BY, value)?,
                PROOFS => {
                    confidence.proofs = string_list(PROOFS, value)?
                        .into_iter()
                        .map(SigId)
                        .collect();
                }
                OTHER => {
                    confidence.other = match value {
                        Value::Null => None,
                        Value::String(s) => Some(s.clone()),
                        other => return Err(schema_mismatch(OTHER, "string", other)),
                    };
                }
                KNOWN_ON_KEYBASE_DAYS => {
                    confidence.known_on_keybase_days = match value {
                        Value::Null => None,
                        Value::Number(n) => Some(
                            n.as_u64()
                                .and_then(|d| u32::try_from(d).ok())
                                .ok_or_else(|| VouchError::SchemaMismatch {
                                    field: KNOWN_ON_KEYBASE_DAYS,
                                    reason: format!("{n} is not a day count"),
                                })?,
                        ),
                        other => {
                            return Err(schema_mismatch(
                                KNOWN_ON_KEYBASE_DAYS,
                                "non-negative integer",
                                other,
                            ))
                        }
                    };
                }
                unknown => log::debug!("ignoring unknown confidence key {unknown:?}"),
            }
        }

        Ok(confidence)
    }
}

/// Normalize a raw expansion confidence object into a `Confidence`.
pub fn normalize_confidence(
    ctx: &VouchContext,
    lookup: &dyn UsernameLookup,
    mut raw: Map<String, Value>,
) -> Result<Confidence> {
    if let Some(via) = raw.get_mut(USERNAME_VERIFIED_VIA) {
        let name = via.as_str().ok_or(VouchError::BadFieldType {
            field: USERNAME_VERIFIED_VIA,
            expected: "a string",
        })?;
        let method = UsernameVerificationType::from_name(name)
            .ok_or_else(|| VouchError::UnknownVerificationMethod(name.to_string()))?;
        *via = Value::from(method.as_str());
    }

    if let Some(vouched_by) = raw.get_mut(VOUCHED_BY) {
        let uids = uid_list(vouched_by)?;
        let mut usernames = Vec::with_capacity(uids.len());
        for uid in &uids {
            ctx.check()?;
            usernames.push(resolve_username(ctx, lookup, uid)?);
        }
        *vouched_by = Value::from(usernames);
    }

    Confidence::from_canonical_map(&raw)
}

fn uid_list(value: &Value) -> Result<Vec<Uid>> {
    let bad = || VouchError::BadFieldType {
        field: VOUCHED_BY,
        expected: "a list of uid strings",
    };
    value
        .as_array()
        .ok_or_else(bad)?
        .iter()
        .map(|v| v.as_str().map(Uid::new).ok_or_else(bad))
        .collect()
}

fn resolve_username(ctx: &VouchContext, lookup: &dyn UsernameLookup, uid: &Uid) -> Result<String> {
    lookup.lookup_username(ctx, uid).map_err(|e| match e {
        VouchError::IdentityLookupFailed { .. } => e,
        e if e.is_interrupt() => e,
        other => VouchError::IdentityLookupFailed {
            uid: uid.clone(),
            reason: other.to_string(),
        },
    })
}

fn string_list(field: &'static str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(schema_mismatch(field, "list of strings", other)),
            })
            .collect(),
        other => Err(schema_mismatch(field, "list of strings", other)),
    }
}

fn schema_mismatch(field: &'static str, expected: &str, found: &Value) -> VouchError {
    VouchError::SchemaMismatch {
        field,
        reason: format!("expected {expected}, found {found}"),
    }
}
