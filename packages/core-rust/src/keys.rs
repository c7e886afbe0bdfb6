//! Command key derivation.
//!
//! Engines bucket statistics, isolation pools, and circuit state by
//! `(GroupKey, CommandKey)`. Both keys are derived from the operation's
//! declared name, so derivation is pure string identity and never fails.
//! Determinism is the whole point: per-key engine state is only meaningful
//! if the same name always maps to the same pair.

use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// KeyScope
// ---------------------------------------------------------------------------

/// Controls whether same-named operations on different receivers share
/// engine state.
///
/// The default, [`KeyScope::SharedByName`], derives both keys from the
/// declared name alone: two receivers exposing `get_user` land in the same
/// engine bucket and share metrics, isolation, and circuit status. Call
/// sites may depend on that sharing, so it is never changed implicitly;
/// [`KeyScope::PerReceiver`] is the explicit opt-out and prefixes both keys
/// with the receiver label when one is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyScope {
    /// Keys derive from the declared name only (collisions across receivers
    /// are deliberate).
    #[default]
    SharedByName,
    /// Keys are prefixed with the receiver label, isolating receivers from
    /// each other.
    PerReceiver,
}

// ---------------------------------------------------------------------------
// GroupKey / CommandKey
// ---------------------------------------------------------------------------

/// Opaque stable identifier bucketing related commands for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(Arc<str>);

/// Opaque stable identifier for a single command within a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandKey(Arc<str>);

impl GroupKey {
    /// The key's string form, as handed to the engine.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CommandKey {
    /// The key's string form, as handed to the engine.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// CommandKeys
// ---------------------------------------------------------------------------

/// The `(group, command)` pair identifying a protected operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandKeys {
    pub group: GroupKey,
    pub command: CommandKey,
}

impl CommandKeys {
    /// Derive both keys from the operation's declared name.
    ///
    /// Identity derivation: group and command are both the name itself.
    #[must_use]
    pub fn derive(name: &str) -> Self {
        let shared: Arc<str> = Arc::from(name);
        Self {
            group: GroupKey(shared.clone()),
            command: CommandKey(shared),
        }
    }

    /// Derive keys with an optional receiver prefix.
    ///
    /// Under [`KeyScope::SharedByName`] (or when no receiver label exists)
    /// this is identical to [`CommandKeys::derive`].
    #[must_use]
    pub fn derive_scoped(name: &str, receiver: Option<&str>, scope: KeyScope) -> Self {
        match (scope, receiver) {
            (KeyScope::PerReceiver, Some(receiver)) => {
                let shared: Arc<str> = Arc::from(format!("{receiver}::{name}").as_str());
                Self {
                    group: GroupKey(shared.clone()),
                    command: CommandKey(shared),
                }
            }
            _ => Self::derive(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
