//! Processor-group (`proc_grps`) configuration wire format (`spec.md` §6, §8
//! scenario 1).
//!
//! Grounded in `examples/original_source/parser_library/src/workspaces/pgm_conf.h`
//! and `proc_grps.h`: a library entry on the wire is either a bare path string
//! or an object with a `path` and an `optional` flag, and parsing always
//! normalizes to the object shape before re-serializing.

use serde::{Deserialize, Serialize};

/// One entry of a processor group's `libs` array as it appears on the wire:
/// either a bare path string or `{ "path": ..., "optional": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum WireLibrary {
    Path(String),
    Full { path: String, #[serde(default)] optional: bool },
}

/// A normalized library reference: always has both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// The library's root path, as given in configuration.
    pub path: String,
    /// `true` if a missing/empty library should not produce a diagnostic.
    #[serde(default)]
    pub optional: bool,
}

impl From<WireLibrary> for LibraryEntry {
    fn from(wire: WireLibrary) -> Self {
        match wire {
            WireLibrary::Path(path) => LibraryEntry { path, optional: false },
            WireLibrary::Full { path, optional } => LibraryEntry { path, optional },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WireProcessorGroup {
    name: String,
    libs: Vec<WireLibrary>,
}

/// A single processor group: a name plus its ordered list of libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessorGroup {
    /// The group's name, as referenced by `pgm_conf`.
    pub name: String,
    /// The libraries contributed by this group, in configuration order.
    pub libs: Vec<LibraryEntry>,
}

impl From<WireProcessorGroup> for ProcessorGroup {
    fn from(wire: WireProcessorGroup) -> Self {
        ProcessorGroup {
            name: wire.name,
            libs: wire.libs.into_iter().map(LibraryEntry::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WireProcGrps {
    pgroups: Vec<WireProcessorGroup>,
}

/// The parsed `proc_grps.json` document: a set of named processor groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcGrps {
    /// The groups, in document order.
    pub pgroups: Vec<ProcessorGroup>,
}

/// A structural failure while parsing a `proc_grps` document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON was not valid, or did not match the expected `proc_grps` shape.
    #[error("invalid proc_grps configuration: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ProcGrps {
    /// Parses a `proc_grps.json` document, normalizing every library entry to
    /// its `{path, optional}` shape.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let wire: WireProcGrps = serde_json::from_str(text)?;
        Ok(ProcGrps {
            pgroups: wire.pgroups.into_iter().map(ProcessorGroup::from).collect(),
        })
    }

    /// Serializes back to the normalized JSON shape (never the bare-string
    /// library form).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("ProcGrps serializes infallibly")
    }
}

/// Per-workspace settings as pulled from the client: an opaque JSON object
/// with documented defaults for missing keys (`spec.md` §6).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceSettings {
    raw: serde_json::Map<String, serde_json::Value>,
}

impl WorkspaceSettings {
    /// Builds settings from a `workspace/configuration` response value.
    /// Non-object responses are treated as empty settings.
    #[must_use]
    pub fn from_response(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => WorkspaceSettings { raw: map },
            _ => WorkspaceSettings::default(),
        }
    }

    /// Settings reflecting a configuration-request error: an empty object
    /// (`spec.md` §4.8: "on `error`, replaced with an empty object").
    #[must_use]
    pub fn empty() -> Self {
        WorkspaceSettings::default()
    }

    /// Looks up a raw key, for callers that know the expected shape.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.raw.get(key)
    }

    /// Parses this settings object's `proc_grps` key, if present.
    pub fn proc_grps(&self) -> Result<Option<ProcGrps>, ConfigError> {
        let Some(value) = self.raw.get("proc_grps") else {
            return Ok(None);
        };
        let wire: WireProcGrps = serde_json::from_value(value.clone())?;
        Ok(Some(ProcGrps {
            pgroups: wire.pgroups.into_iter().map(ProcessorGroup::from).collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proc_grps_round_trip_normalizes_bare_paths() {
        let input = r#"{"pgroups":[{"name":"P1","libs":["lib1",{"path":"lib2","optional":true}]}]}"#;
        let parsed = ProcGrps::parse(input).expect("parses");
        assert_eq!(
            parsed,
            ProcGrps {
                pgroups: vec![ProcessorGroup {
                    name: "P1".to_string(),
                    libs: vec![
                        LibraryEntry { path: "lib1".to_string(), optional: false },
                        LibraryEntry { path: "lib2".to_string(), optional: true },
                    ],
                }],
            }
        );

        let expected: serde_json::Value = serde_json::from_str(
            r#"{"pgroups":[{"name":"P1","libs":[{"path":"lib1","optional":false},{"path":"lib2","optional":true}]}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.to_json(), expected);
    }

    #[test]
    fn reparsing_the_serialized_form_is_idempotent() {
        let input = r#"{"pgroups":[{"name":"P1","libs":["lib1"]}]}"#;
        let first = ProcGrps::parse(input).unwrap();
        let second = ProcGrps::parse(&first.to_json().to_string()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(ProcGrps::parse("{not json").is_err());
    }

    #[test]
    fn settings_error_response_is_empty_object() {
        let settings = WorkspaceSettings::empty();
        assert!(settings.get("proc_grps").is_none());
        assert_eq!(settings.proc_grps().unwrap(), None);
    }

    #[test]
    fn non_object_response_becomes_empty_settings() {
        let settings = WorkspaceSettings::from_response(serde_json::Value::Null);
        assert_eq!(settings, WorkspaceSettings::empty());
    }
}
