//! Per-pass declaration context and identity resolution.

use std::collections::{BTreeMap, HashSet};

use crate::error::PassError;
use crate::key::{InstanceKey, PassId, SiteId};
use crate::session::Session;
use crate::storage::{Instance, MountNotice};
use crate::tracer::PassOutcome;
use crate::value::{Params, Value};

/// A widget declaration: what the script asks for at one point in document
/// order.
///
/// Usually built through [`PassContext::widget`]; constructing it directly is
/// useful when declarations are produced programmatically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Declaration {
    /// Explicit identity key, if the caller chose one.
    pub key: Option<String>,
    /// Declared input parameters.
    pub params: Params,
    /// Value a fresh instance starts with.
    pub default: Value,
}

impl Declaration {
    /// Create an empty declaration with a `Null` default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the explicit key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add an input parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }
}

/// What a completed pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassReport {
    /// The id of the completed pass.
    pub pass: PassId,
    /// Emitted value of every declaration, by site ordinal in document order.
    pub outputs: BTreeMap<SiteId, Value>,
    /// Number of abandoned passes that preceded this one in the same
    /// [`Session::run`](crate::Session::run) call.
    pub reruns: u32,
}

impl PassReport {
    /// Emitted value of the declaration at a site ordinal.
    pub fn output(&self, ordinal: u32) -> Option<&Value> {
        self.outputs.get(&SiteId::new(ordinal))
    }
}

/// The context handed to the host's script for the duration of one pass.
///
/// Declarations made through it are resolved immediately, in document order,
/// against the session's live-instance table; the emitted value is returned
/// inline so scripts can branch on it.
pub struct PassContext<'s> {
    session: &'s Session,
    pass: PassId,
    next_site: u32,
    touched: HashSet<InstanceKey, ahash::RandomState>,
    outputs: BTreeMap<SiteId, Value>,
}

impl<'s> PassContext<'s> {
    pub(crate) fn new(session: &'s Session, pass: PassId) -> Self {
        Self {
            session,
            pass,
            next_site: 0,
            touched: HashSet::default(),
            outputs: BTreeMap::new(),
        }
    }

    /// Id of the pass this context belongs to.
    pub fn pass_id(&self) -> PassId {
        self.pass
    }

    /// Start a widget declaration at the next site in document order.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let value = ctx.widget()
    ///     .param("label", "Create")
    ///     .default(false)
    ///     .mount();
    /// ```
    pub fn widget(&mut self) -> WidgetBuilder<'_, 's> {
        WidgetBuilder {
            ctx: self,
            decl: Declaration::new(),
        }
    }

    /// Resolve a declaration against the live-instance table and return the
    /// emitted value.
    ///
    /// This is the identity decision. The declaration is assigned the next
    /// site ordinal; with an explicit key the instance under that key is
    /// reused no matter what the parameters are, without one the instance at
    /// this site survives only while the parameters compare equal to its
    /// creation snapshot. Unmatched declarations create a fresh instance and
    /// emit its default.
    pub fn mount(&mut self, decl: Declaration) -> Value {
        let site = SiteId::new(self.next_site);
        self.next_site += 1;

        let key = match &decl.key {
            Some(key) => InstanceKey::keyed(key.clone()),
            None => InstanceKey::Site(site),
        };

        // A second declaration under the same explicit key in one pass does
        // not get a second instance: the first declaration owns it, the
        // collision is flagged, and the current value is emitted read-only.
        if self.touched.contains(&key) {
            self.session.tracer().on_key_collision(&key, self.pass);
            let value = self
                .session
                .instances()
                .get(&key)
                .map(|instance| instance.value)
                .unwrap_or(Value::Null);
            self.outputs.insert(site, value.clone());
            return value;
        }

        let store = self.session.instances();
        let value = match store.get(&key) {
            Some(existing) if key.is_explicit() => {
                // Parameters are never considered while the key is stable.
                if existing.default != decl.default {
                    self.session
                        .tracer()
                        .on_default_drift(&key, &existing.default, &decl.default);
                }
                self.session.tracer().on_reuse(&key, self.pass);
                existing.value
            }
            Some(existing) if existing.params == decl.params => {
                if existing.default != decl.default {
                    self.session
                        .tracer()
                        .on_default_drift(&key, &existing.default, &decl.default);
                }
                self.session.tracer().on_reuse(&key, self.pass);
                existing.value
            }
            Some(existing) => {
                // Parameter drift at an implicit site: prior state is
                // discarded and the instance starts over from the default.
                self.session
                    .tracer()
                    .on_remount(&key, &existing.params, &decl.params, self.pass);
                self.create(key.clone(), decl)
            }
            None => {
                self.session
                    .tracer()
                    .on_mount(&key, &decl.params, self.pass);
                self.create(key.clone(), decl)
            }
        };

        self.touched.insert(key);
        self.outputs.insert(site, value.clone());
        value
    }

    fn create(&self, key: InstanceKey, decl: Declaration) -> Value {
        let instance = Instance {
            key: key.clone(),
            params: decl.params.clone(),
            value: decl.default.clone(),
            default: decl.default.clone(),
            mounted_at: self.pass,
        };
        self.session.instances().insert(instance);
        self.session.mounts().push(MountNotice {
            key,
            params: decl.params,
            pass: self.pass,
        });
        decl.default
    }

    /// Request an immediate extra render pass.
    ///
    /// Always returns `Err(PassError::Rerun)`; propagate it with `?` so the
    /// rest of the script is skipped and the host loop restarts the pass.
    pub fn request_rerun(&self) -> Result<(), PassError> {
        self.session.tracer().on_rerun_requested(self.pass);
        Err(PassError::Rerun)
    }

    /// Read a session-state entry.
    pub fn state(&self, key: &str) -> Option<Value> {
        self.session.state_store().get(key)
    }

    /// Read a session-state entry, inserting `default` first if absent.
    pub fn state_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.session.state_store().get_or_insert(key, default.into())
    }

    /// Write a session-state entry.
    pub fn set_state(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.session.state_store().set(key, value.into());
    }

    /// Complete the pass: collect untouched instances and build the report.
    pub(crate) fn finish(self, reruns: u32) -> PassReport {
        let dropped = self.session.instances().retain_touched(&self.touched);
        for key in &dropped {
            self.session.tracer().on_unmount(key, self.pass);
        }
        self.session.tracer().on_pass_end(
            self.pass,
            PassOutcome::Completed {
                widgets: self.outputs.len(),
            },
        );
        PassReport {
            pass: self.pass,
            outputs: self.outputs,
            reruns,
        }
    }
}

/// Builder for one widget declaration, obtained from [`PassContext::widget`].
pub struct WidgetBuilder<'c, 's> {
    ctx: &'c mut PassContext<'s>,
    decl: Declaration,
}

impl WidgetBuilder<'_, '_> {
    /// Give the declaration an explicit identity key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.decl.key = Some(key.into());
        self
    }

    /// Add an input parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.decl.params.insert(name, value);
        self
    }

    /// Set the value a fresh instance starts with. Defaults to `Null`.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.decl.default = value.into();
        self
    }

    /// Resolve the declaration and return the emitted value.
    pub fn mount(self) -> Value {
        self.ctx.mount(self.decl)
    }
}
