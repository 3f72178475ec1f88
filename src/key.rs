//! Key types for widget identity resolution.

use std::fmt;

/// Identifier of a render pass.
///
/// Monotonically increasing, one per execution of the host's script,
/// including executions abandoned by a rerun request.
pub type PassId = u64;

/// Declaration-site ordinal: the position of a declaration within a pass,
/// counted in document order from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SiteId(u32);

impl SiteId {
    /// Create a site id from an ordinal.
    #[inline]
    pub const fn new(ordinal: u32) -> Self {
        Self(ordinal)
    }

    /// The ordinal of this site within its pass.
    #[inline]
    pub const fn ordinal(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "site {}", self.0)
    }
}

/// The resolved identity of a widget instance.
///
/// A declaration that carries an explicit key resolves to
/// [`InstanceKey::Keyed`]; while that key string is redeclared across passes
/// the same instance is reused no matter how its parameters change. A
/// declaration without a key resolves to [`InstanceKey::Site`], where
/// continuity additionally requires the declared parameters to be
/// structurally equal to the instance's stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstanceKey {
    /// Identity chosen by the caller. Parameters play no role in matching.
    Keyed(String),
    /// Identity derived from the declaration site.
    Site(SiteId),
}

impl InstanceKey {
    /// Key for an explicitly keyed declaration.
    pub fn keyed(key: impl Into<String>) -> Self {
        InstanceKey::Keyed(key.into())
    }

    /// Key for a declaration identified by its site ordinal.
    pub const fn site(ordinal: u32) -> Self {
        InstanceKey::Site(SiteId::new(ordinal))
    }

    /// The explicit key string, if this identity is caller-chosen.
    pub fn explicit(&self) -> Option<&str> {
        match self {
            InstanceKey::Keyed(key) => Some(key),
            InstanceKey::Site(_) => None,
        }
    }

    /// Returns true if this identity was chosen by the caller.
    pub fn is_explicit(&self) -> bool {
        matches!(self, InstanceKey::Keyed(_))
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceKey::Keyed(key) => write!(f, "key {:?}", key),
            InstanceKey::Site(site) => write!(f, "{}", site),
        }
    }
}

impl From<SiteId> for InstanceKey {
    fn from(site: SiteId) -> Self {
        InstanceKey::Site(site)
    }
}
