//! Queue metadata.

use crate::error::{QueueError, QueueResult};
use crate::group::GroupState;
use crate::pointer::EntryPointer;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Current structured meta record format.
const FORMAT_V1: u8 = 1;

/// On-substrate form of structured queue meta.
#[derive(Debug, Serialize, Deserialize)]
struct MetaRecord {
    format: u8,
    global_head_pointer: u64,
    current_write_pointer: u64,
    groups: Vec<GroupState>,
}

#[derive(Debug, Clone)]
enum MetaForm {
    Structured {
        global_head_pointer: u64,
        current_write_pointer: u64,
        groups: Vec<GroupState>,
    },
    /// Opaque legacy JSON interop form. `None` means the blob failed to
    /// parse and the field was left unset; callers must treat it as
    /// unknown, never as zero.
    Legacy { json: Option<String> },
}

/// Global state of one queue.
///
/// Tracks the oldest retained and most recently assigned entry pointers,
/// plus every consumer group's progress. Alternatively the whole record
/// may be an opaque legacy JSON blob for interop with an older metadata
/// format; in that mode equality and rendering compare the blob verbatim
/// and the structured accessors return `None` - check
/// [`QueueMeta::is_legacy`] first.
#[derive(Debug, Clone)]
pub struct QueueMeta {
    form: MetaForm,
}

impl QueueMeta {
    /// Creates empty structured meta for a new queue.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pointers(EntryPointer::new(0), EntryPointer::new(0))
    }

    /// Creates structured meta with the given pointers.
    #[must_use]
    pub fn with_pointers(global_head: EntryPointer, current_write: EntryPointer) -> Self {
        debug_assert!(global_head <= current_write);
        Self {
            form: MetaForm::Structured {
                global_head_pointer: global_head.as_u64(),
                current_write_pointer: current_write.as_u64(),
                groups: Vec::new(),
            },
        }
    }

    /// Creates meta in the legacy JSON interop form.
    ///
    /// A malformed blob is caught here: the field is left unset and the
    /// failure logged, never propagated.
    #[must_use]
    pub fn from_legacy_json(json: &str) -> Self {
        let parsed = match serde_json::from_str::<serde_json::Value>(json) {
            Ok(_) => Some(json.to_string()),
            Err(err) => {
                warn!(error = %err, "malformed legacy queue meta JSON, leaving unset");
                None
            }
        };
        Self {
            form: MetaForm::Legacy { json: parsed },
        }
    }

    /// Returns `true` if this meta is the legacy JSON interop form.
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        matches!(self.form, MetaForm::Legacy { .. })
    }

    /// Returns the legacy JSON blob, when present and well-formed.
    #[must_use]
    pub fn legacy_json(&self) -> Option<&str> {
        match &self.form {
            MetaForm::Legacy { json } => json.as_deref(),
            MetaForm::Structured { .. } => None,
        }
    }

    /// Returns the oldest retained entry pointer; `None` in legacy form.
    #[must_use]
    pub fn global_head_pointer(&self) -> Option<EntryPointer> {
        match &self.form {
            MetaForm::Structured {
                global_head_pointer,
                ..
            } => Some(EntryPointer::new(*global_head_pointer)),
            MetaForm::Legacy { .. } => None,
        }
    }

    /// Returns the most recently assigned entry pointer; `None` in legacy
    /// form.
    #[must_use]
    pub fn current_write_pointer(&self) -> Option<EntryPointer> {
        match &self.form {
            MetaForm::Structured {
                current_write_pointer,
                ..
            } => Some(EntryPointer::new(*current_write_pointer)),
            MetaForm::Legacy { .. } => None,
        }
    }

    /// Returns the consumer groups; empty in legacy form.
    #[must_use]
    pub fn groups(&self) -> &[GroupState] {
        match &self.form {
            MetaForm::Structured { groups, .. } => groups,
            MetaForm::Legacy { .. } => &[],
        }
    }

    /// Returns a group's state by id.
    #[must_use]
    pub fn group(&self, group_id: u64) -> Option<&GroupState> {
        self.groups().iter().find(|g| g.group_id() == group_id)
    }

    /// Returns a group's state mutably.
    ///
    /// # Errors
    ///
    /// Fails on legacy meta or an unregistered group.
    pub fn group_mut(&mut self, group_id: u64) -> QueueResult<&mut GroupState> {
        match &mut self.form {
            MetaForm::Structured { groups, .. } => groups
                .iter_mut()
                .find(|g| g.group_id() == group_id)
                .ok_or(QueueError::UnknownGroup { group_id }),
            MetaForm::Legacy { .. } => Err(QueueError::LegacyMeta),
        }
    }

    /// Registers a consumer group at the current global head. Idempotent.
    ///
    /// # Errors
    ///
    /// Fails on legacy meta.
    pub fn register_group(&mut self, group_id: u64) -> QueueResult<()> {
        match &mut self.form {
            MetaForm::Structured {
                global_head_pointer,
                groups,
                ..
            } => {
                if !groups.iter().any(|g| g.group_id() == group_id) {
                    groups.push(GroupState::new(
                        group_id,
                        EntryPointer::new(*global_head_pointer),
                    ));
                }
                Ok(())
            }
            MetaForm::Legacy { .. } => Err(QueueError::LegacyMeta),
        }
    }

    /// Assigns the next entry pointer, advancing the current write
    /// pointer.
    ///
    /// # Errors
    ///
    /// Fails on legacy meta.
    pub fn assign_next_pointer(&mut self) -> QueueResult<EntryPointer> {
        match &mut self.form {
            MetaForm::Structured {
                current_write_pointer,
                ..
            } => {
                *current_write_pointer += 1;
                Ok(EntryPointer::new(*current_write_pointer))
            }
            MetaForm::Legacy { .. } => Err(QueueError::LegacyMeta),
        }
    }

    /// Advances the global head to the minimum consumed-through pointer
    /// across groups, returning the new head.
    ///
    /// With no groups registered the head advances to the current write
    /// pointer: nothing retained is consumable by anyone.
    ///
    /// # Errors
    ///
    /// Fails on legacy meta.
    pub fn advance_global_head(&mut self) -> QueueResult<EntryPointer> {
        match &mut self.form {
            MetaForm::Structured {
                global_head_pointer,
                current_write_pointer,
                groups,
            } => {
                let floor = groups
                    .iter()
                    .map(|g| g.consumed_through().as_u64())
                    .min()
                    .unwrap_or(*current_write_pointer);
                // The head never regresses.
                *global_head_pointer = (*global_head_pointer).max(floor);
                Ok(EntryPointer::new(*global_head_pointer))
            }
            MetaForm::Legacy { .. } => Err(QueueError::LegacyMeta),
        }
    }

    /// Encodes structured meta for storage.
    ///
    /// # Errors
    ///
    /// Fails on legacy meta, which is never re-encoded by this core.
    pub fn encode(&self) -> QueueResult<Vec<u8>> {
        match &self.form {
            MetaForm::Structured {
                global_head_pointer,
                current_write_pointer,
                groups,
            } => {
                let record = MetaRecord {
                    format: FORMAT_V1,
                    global_head_pointer: *global_head_pointer,
                    current_write_pointer: *current_write_pointer,
                    groups: groups.clone(),
                };
                let mut buf = Vec::new();
                ciborium::into_writer(&record, &mut buf)
                    .map_err(|err| QueueError::meta_corrupted(err.to_string()))?;
                Ok(buf)
            }
            MetaForm::Legacy { .. } => Err(QueueError::LegacyMeta),
        }
    }

    /// Decodes structured meta from storage.
    ///
    /// # Errors
    ///
    /// Fails with [`QueueError::MetaCorrupted`] on undecodable bytes and
    /// [`QueueError::UnsupportedState`] on an unrecognized format value.
    pub fn decode(bytes: &[u8]) -> QueueResult<Self> {
        let record: MetaRecord = ciborium::from_reader(bytes)
            .map_err(|err| QueueError::meta_corrupted(err.to_string()))?;
        if record.format != FORMAT_V1 {
            return Err(QueueError::UnsupportedState {
                value: u64::from(record.format),
            });
        }
        if record.global_head_pointer > record.current_write_pointer {
            return Err(QueueError::meta_corrupted(format!(
                "global head {} beyond write pointer {}",
                record.global_head_pointer, record.current_write_pointer
            )));
        }
        Ok(Self {
            form: MetaForm::Structured {
                global_head_pointer: record.global_head_pointer,
                current_write_pointer: record.current_write_pointer,
                groups: record.groups,
            },
        })
    }
}

impl Default for QueueMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for QueueMeta {
    fn eq(&self, other: &Self) -> bool {
        match (&self.form, &other.form) {
            // Legacy meta compares the blob verbatim, never the fields.
            (MetaForm::Legacy { json: a }, MetaForm::Legacy { json: b }) => a == b,
            (
                MetaForm::Structured {
                    global_head_pointer: ah,
                    current_write_pointer: aw,
                    groups: ag,
                },
                MetaForm::Structured {
                    global_head_pointer: bh,
                    current_write_pointer: bw,
                    groups: bg,
                },
            ) => ah == bh && aw == bw && ag == bg,
            _ => false,
        }
    }
}

impl Eq for QueueMeta {}

impl fmt::Display for QueueMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.form {
            MetaForm::Legacy { json: Some(json) } => f.write_str(json),
            MetaForm::Legacy { json: None } => f.write_str("QueueMeta{legacy: unset}"),
            MetaForm::Structured {
                global_head_pointer,
                current_write_pointer,
                groups,
            } => write!(
                f,
                "QueueMeta{{globalHead: {}, currentWrite: {}, groups: {}}}",
                global_head_pointer,
                current_write_pointer,
                groups.len()
            ),
        }
    }
}
