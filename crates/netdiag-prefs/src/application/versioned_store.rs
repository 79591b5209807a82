//! VersionedConfigStore: loads and saves a [`PreferenceSet`] through a
//! [`KeyValueStore`].
//!
//! # What "versioned" means here (for beginners)
//!
//! Every save writes [`FORMAT_VERSION`] next to the preferences.  On load the
//! stored version is compared with [`STACK_LEVEL_THRESHOLD`]: before that
//! release the stack-level setting counted protocol layers differently, so a
//! non-topmost level read from an older file earns a compatibility warning.
//! The value itself is loaded untouched; the user decides.
//!
//! # Load order
//!
//! Fields are read one by one, each falling back to its documented default on
//! its own.  Two steps depend on earlier ones and must stay in this order:
//!
//! ```text
//! General/version ──────────────────────────────┐
//! General/mode ──► refresh-period default ──► Diagram/refresh_period
//! Diagram/stack_level ──► compare(version, 0.5.4) ──► warning?
//! ```

use std::cmp::Ordering;
use std::fmt;

use netdiag_core::domain::version;
use netdiag_core::{
    defaults, CaptureMode, ColorAssignmentList, NodeSizeMetric, PreferenceSet, SizeMode,
    StackLevel, DEFAULT_COLOR_VECTOR,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::edit_colors::ColorListEditor;
use super::ports::{KeyValueStore, Lookup, Namespace, ProtocolColoring, StoreError, StoredValue};

/// Version written on every save.
pub const FORMAT_VERSION: &str = "0.9.0";

/// Version assumed when a stored file carries none.
pub const BASELINE_VERSION: &str = "0.5.4";

/// Files older than this may hold stack levels with the old meaning.
pub const STACK_LEVEL_THRESHOLD: &str = "0.5.4";

/// Store keys, relative to the namespace.
pub mod keys {
    pub const VERSION: &str = "General/version";
    pub const MODE: &str = "General/mode";

    pub const DIAGRAM_ONLY: &str = "Diagram/diagram_only";
    pub const GROUP_UNKNOWN: &str = "Diagram/group_unk";
    pub const STATIONARY: &str = "Diagram/stationary";
    pub const FADE_DISABLED: &str = "Diagram/nofade";
    pub const CYCLE_COLORS: &str = "Diagram/cycle";
    pub const NEW_INFO_DIALOG: &str = "Diagram/new_infodlg";
    pub const ANTIALIAS: &str = "Diagram/antialias";
    pub const NAME_RESOLUTION: &str = "Diagram/name_res";

    pub const NODE_TIMEOUT: &str = "Diagram/node_timeout_time";
    pub const GUI_NODE_TIMEOUT: &str = "Diagram/gui_node_timeout_time";
    pub const PROTO_NODE_TIMEOUT: &str = "Diagram/proto_node_timeout_time";
    pub const LINK_TIMEOUT: &str = "Diagram/link_timeout_time";
    pub const GUI_LINK_TIMEOUT: &str = "Diagram/gui_link_timeout_time";
    pub const PROTO_LINK_TIMEOUT: &str = "Diagram/proto_link_timeout_time";
    pub const PROTO_TIMEOUT: &str = "Diagram/proto_timeout_time";
    pub const AVERAGING: &str = "Diagram/averaging_time";
    pub const NODE_RADIUS_MULTIPLIER: &str = "Diagram/node_radius_multiplier";
    pub const LINK_WIDTH_MULTIPLIER: &str = "Diagram/link_width_multiplier";
    pub const REFRESH_PERIOD: &str = "Diagram/refresh_period";

    pub const SIZE_MODE: &str = "Diagram/size_mode";
    pub const NODE_SIZE_METRIC: &str = "Diagram/node_size_variable";
    pub const STACK_LEVEL: &str = "Diagram/stack_level";

    pub const FILTER: &str = "Diagram/filter";
    pub const FONT_NAME: &str = "Diagram/fontname";
    pub const COLORS: &str = "Diagram/colors";
}

/// Error type for [`VersionedConfigStore::save`].
///
/// Writes are not rolled back: keys written before the failure stay written.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to write preference {key:?}: {source}")]
    Write {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to flush preferences: {0}")]
    Sync(#[source] StoreError),
}

/// Advisory raised when a stored stack level predates its current meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityWarning {
    pub stored_version: String,
    pub stack_level: StackLevel,
}

impl fmt::Display for CompatibilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stack level is {:?} rather than the topmost recognized protocol in preferences \
             written by version {}; check in the preferences that this is what you want",
            self.stack_level, self.stored_version
        )
    }
}

/// Everything a load produced, for callers that want more than the values.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub preferences: PreferenceSet,
    /// Version string found in the store (or the baseline when absent).
    pub stored_version: String,
    pub warnings: Vec<CompatibilityWarning>,
    /// Full keys whose values were absent or malformed.
    pub defaulted_keys: Vec<String>,
}

/// Reads fields for one load, remembering which ones fell back to defaults.
struct FieldReader<'a, S: ?Sized> {
    store: &'a S,
    namespace: &'a Namespace,
    defaulted_keys: Vec<String>,
}

impl<'a, S: KeyValueStore + ?Sized> FieldReader<'a, S> {
    fn new(store: &'a S, namespace: &'a Namespace) -> Self {
        Self {
            store,
            namespace,
            defaulted_keys: Vec::new(),
        }
    }

    fn note<T>(&mut self, key: String, lookup: Lookup<T>) -> Lookup<T> {
        if lookup.defaulted {
            self.defaulted_keys.push(key);
        }
        lookup
    }

    fn bool(&mut self, path: &str, default: bool) -> bool {
        let key = self.namespace.key(path);
        let lookup = self.store.get_bool(&key, default);
        self.note(key, lookup).value
    }

    fn string(&mut self, path: &str, default: &str) -> String {
        let key = self.namespace.key(path);
        let lookup = self.store.get_string(&key, default);
        self.note(key, lookup).value
    }

    fn vector(&mut self, path: &str, default: &[&str]) -> Vec<String> {
        let key = self.namespace.key(path);
        let lookup = self.store.get_vector(&key, default);
        self.note(key, lookup).value
    }

    /// Reads a float that must satisfy `valid`; anything else is malformed.
    fn float(&mut self, path: &str, default: f64, valid: fn(f64) -> bool) -> Lookup<f64> {
        let key = self.namespace.key(path);
        let mut lookup = self.store.get_float(&key, default);
        if !lookup.defaulted && !valid(lookup.value) {
            warn!(key = %key, value = lookup.value, "out-of-range preference, using default");
            lookup = Lookup::defaulted(default);
        }
        self.note(key, lookup)
    }

    fn timeout(&mut self, path: &str, default: f64) -> f64 {
        self.float(path, default, |v| v.is_finite() && v >= 0.0).value
    }

    /// Scale multipliers are forced to their constant whenever the read
    /// reports a default, whatever value the generic float path produced.
    fn multiplier(&mut self, path: &str, constant: f64) -> f64 {
        let lookup = self.float(path, constant, |v| v.is_finite() && v > 0.0);
        if lookup.defaulted {
            constant
        } else {
            lookup.value
        }
    }

    fn refresh_period(&mut self, path: &str, default: u32) -> u32 {
        let key = self.namespace.key(path);
        let lookup = self.store.get_int(&key, i64::from(default));
        let lookup = match u32::try_from(lookup.value) {
            Ok(period) if period > 0 => Lookup {
                value: period,
                defaulted: lookup.defaulted,
            },
            _ => {
                warn!(key = %key, value = lookup.value, "out-of-range refresh period, using default");
                Lookup::defaulted(default)
            }
        };
        self.note(key, lookup).value
    }

    fn int(&mut self, path: &str, default: i64) -> i64 {
        let key = self.namespace.key(path);
        let lookup = self.store.get_int(&key, default);
        self.note(key, lookup).value
    }

    fn variant<E>(&mut self, path: &str, default: E) -> E
    where
        E: TryFrom<i64> + Copy + Into<i64>,
        <E as TryFrom<i64>>::Error: fmt::Display,
    {
        let key = self.namespace.key(path);
        let lookup = self.store.get_int(&key, default.into());
        let lookup = if lookup.defaulted {
            Lookup::defaulted(default)
        } else {
            match E::try_from(lookup.value) {
                Ok(value) => Lookup::found(value),
                Err(e) => {
                    warn!(key = %key, error = %e, "unknown enum value, using default");
                    Lookup::defaulted(default)
                }
            }
        };
        self.note(key, lookup).value
    }
}

/// Loads and saves preferences, and keeps the protocol-coloring collaborator
/// in step with whatever color list is authoritative.
pub struct VersionedConfigStore<S, C> {
    store: S,
    coloring: C,
}

impl<S, C> VersionedConfigStore<S, C>
where
    S: KeyValueStore,
    C: ProtocolColoring,
{
    pub fn new(store: S, coloring: C) -> Self {
        Self { store, coloring }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn coloring(&self) -> &C {
        &self.coloring
    }

    pub fn into_parts(self) -> (S, C) {
        (self.store, self.coloring)
    }

    /// Loads the preference set stored under `namespace`.
    ///
    /// Never fails: every absent or malformed field takes its default.
    pub fn load(&mut self, namespace: &Namespace) -> PreferenceSet {
        self.load_report(namespace).preferences
    }

    /// Like [`load`](Self::load), but also returns the stored version,
    /// compatibility warnings, and the keys that were defaulted.
    pub fn load_report(&mut self, namespace: &Namespace) -> LoadReport {
        let mut read = FieldReader::new(&self.store, namespace);

        let stored_version = read.string(keys::VERSION, BASELINE_VERSION);

        let diagram_only = read.bool(keys::DIAGRAM_ONLY, defaults::DIAGRAM_ONLY);
        let group_unknown = read.bool(keys::GROUP_UNKNOWN, defaults::GROUP_UNKNOWN);
        let stationary = read.bool(keys::STATIONARY, defaults::STATIONARY);
        let fade_disabled = read.bool(keys::FADE_DISABLED, defaults::FADE_DISABLED);
        let cycle_colors = read.bool(keys::CYCLE_COLORS, defaults::CYCLE_COLORS);
        let new_info_dialog = read.bool(keys::NEW_INFO_DIALOG, defaults::NEW_INFO_DIALOG);
        let antialias = read.bool(keys::ANTIALIAS, defaults::ANTIALIAS);
        let name_resolution = read.bool(keys::NAME_RESOLUTION, defaults::NAME_RESOLUTION);

        let node_timeout_ms = read.timeout(keys::NODE_TIMEOUT, defaults::NODE_TIMEOUT_MS);
        let gui_node_timeout_ms = read.timeout(keys::GUI_NODE_TIMEOUT, defaults::GUI_NODE_TIMEOUT_MS);
        let proto_node_timeout_ms =
            read.timeout(keys::PROTO_NODE_TIMEOUT, defaults::PROTO_NODE_TIMEOUT_MS);
        let link_timeout_ms = read.timeout(keys::LINK_TIMEOUT, defaults::LINK_TIMEOUT_MS);
        let gui_link_timeout_ms = read.timeout(keys::GUI_LINK_TIMEOUT, defaults::GUI_LINK_TIMEOUT_MS);
        let proto_link_timeout_ms =
            read.timeout(keys::PROTO_LINK_TIMEOUT, defaults::PROTO_LINK_TIMEOUT_MS);
        let proto_timeout_ms = read.timeout(keys::PROTO_TIMEOUT, defaults::PROTO_TIMEOUT_MS);
        let averaging_ms = read.timeout(keys::AVERAGING, defaults::AVERAGING_MS);

        let node_radius_multiplier =
            read.multiplier(keys::NODE_RADIUS_MULTIPLIER, defaults::NODE_RADIUS_MULTIPLIER);
        let link_width_multiplier =
            read.multiplier(keys::LINK_WIDTH_MULTIPLIER, defaults::LINK_WIDTH_MULTIPLIER);

        // The refresh-period default depends on the mode, so the mode comes first.
        let capture_mode = read.variant(keys::MODE, CaptureMode::default());
        let refresh_period_ms =
            read.refresh_period(keys::REFRESH_PERIOD, capture_mode.default_refresh_period_ms());

        let size_mode = read.variant(keys::SIZE_MODE, SizeMode::default());
        let node_size_metric = read.variant(keys::NODE_SIZE_METRIC, NodeSizeMetric::default());
        // Any stored level is kept as-is, including ones past the known levels.
        let stack_level =
            StackLevel::from(read.int(keys::STACK_LEVEL, StackLevel::default().as_i64()));

        let warnings = stack_level_warning(&stored_version, stack_level)
            .into_iter()
            .collect();

        let filter = read.string(keys::FILTER, defaults::FILTER);
        let font_name = read.string(keys::FONT_NAME, defaults::FONT_NAME);

        let colors = ColorAssignmentList::from_persisted_vector(
            read.vector(keys::COLORS, &DEFAULT_COLOR_VECTOR),
        );

        let defaulted_keys = read.defaulted_keys;
        debug!(
            namespace = namespace.as_str(),
            stored_version = %stored_version,
            defaulted = defaulted_keys.len(),
            "preferences loaded"
        );

        let preferences = PreferenceSet {
            diagram_only,
            group_unknown,
            stationary,
            fade_disabled,
            cycle_colors,
            antialias,
            name_resolution,
            new_info_dialog,
            node_timeout_ms,
            gui_node_timeout_ms,
            proto_node_timeout_ms,
            link_timeout_ms,
            gui_link_timeout_ms,
            proto_link_timeout_ms,
            proto_timeout_ms,
            averaging_ms,
            refresh_period_ms,
            node_radius_multiplier,
            link_width_multiplier,
            capture_mode,
            size_mode,
            node_size_metric,
            stack_level,
            filter,
            font_name,
            colors,
        };

        self.coloring
            .read_pref_vector(&preferences.colors.to_persisted_vector());

        LoadReport {
            preferences,
            stored_version,
            warnings,
            defaulted_keys,
        }
    }

    /// Writes every field of `prefs` under `namespace`, stamps
    /// [`FORMAT_VERSION`], then flushes the store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Write`] on the first failed write (earlier
    /// writes are not undone) and [`ConfigError::Sync`] if the flush fails.
    pub fn save(&mut self, namespace: &Namespace, prefs: &PreferenceSet) -> Result<(), ConfigError> {
        let fields = [
            (keys::DIAGRAM_ONLY, StoredValue::Bool(prefs.diagram_only)),
            (keys::GROUP_UNKNOWN, StoredValue::Bool(prefs.group_unknown)),
            (keys::STATIONARY, StoredValue::Bool(prefs.stationary)),
            (keys::FADE_DISABLED, StoredValue::Bool(prefs.fade_disabled)),
            (keys::CYCLE_COLORS, StoredValue::Bool(prefs.cycle_colors)),
            (keys::ANTIALIAS, StoredValue::Bool(prefs.antialias)),
            (keys::NAME_RESOLUTION, StoredValue::Bool(prefs.name_resolution)),
            (keys::NEW_INFO_DIALOG, StoredValue::Bool(prefs.new_info_dialog)),
            (keys::NODE_TIMEOUT, StoredValue::Float(prefs.node_timeout_ms)),
            (keys::GUI_NODE_TIMEOUT, StoredValue::Float(prefs.gui_node_timeout_ms)),
            (keys::PROTO_NODE_TIMEOUT, StoredValue::Float(prefs.proto_node_timeout_ms)),
            (keys::LINK_TIMEOUT, StoredValue::Float(prefs.link_timeout_ms)),
            (keys::GUI_LINK_TIMEOUT, StoredValue::Float(prefs.gui_link_timeout_ms)),
            (keys::PROTO_LINK_TIMEOUT, StoredValue::Float(prefs.proto_link_timeout_ms)),
            (keys::PROTO_TIMEOUT, StoredValue::Float(prefs.proto_timeout_ms)),
            (keys::AVERAGING, StoredValue::Float(prefs.averaging_ms)),
            (keys::NODE_RADIUS_MULTIPLIER, StoredValue::Float(prefs.node_radius_multiplier)),
            (keys::LINK_WIDTH_MULTIPLIER, StoredValue::Float(prefs.link_width_multiplier)),
            (keys::MODE, StoredValue::Int(prefs.capture_mode.as_i64())),
            (keys::REFRESH_PERIOD, StoredValue::Int(i64::from(prefs.refresh_period_ms))),
            (keys::SIZE_MODE, StoredValue::Int(prefs.size_mode.as_i64())),
            (keys::NODE_SIZE_METRIC, StoredValue::Int(prefs.node_size_metric.as_i64())),
            (keys::STACK_LEVEL, StoredValue::Int(prefs.stack_level.as_i64())),
            (keys::FILTER, StoredValue::Str(prefs.filter.clone())),
            (keys::FONT_NAME, StoredValue::Str(prefs.font_name.clone())),
            (keys::COLORS, StoredValue::Vector(prefs.colors.to_persisted_vector())),
            (keys::VERSION, StoredValue::Str(FORMAT_VERSION.to_string())),
        ];

        for (path, value) in fields {
            let key = namespace.key(path);
            self.store
                .set(&key, value)
                .map_err(|source| ConfigError::Write { key, source })?;
        }

        self.store.sync().map_err(ConfigError::Sync)?;
        info!(namespace = namespace.as_str(), version = FORMAT_VERSION, "preferences saved");
        Ok(())
    }

    /// Reconciles pending color edits into `prefs`, forwarding the new list
    /// to the protocol-coloring collaborator.  Returns `true` if anything was
    /// reconciled.
    pub fn apply(&mut self, prefs: &mut PreferenceSet, editor: &mut ColorListEditor) -> bool {
        editor.reconcile(prefs, &mut self.coloring)
    }

    /// Applies pending color edits, then saves.
    ///
    /// # Errors
    ///
    /// See [`save`](Self::save).
    pub fn apply_and_save(
        &mut self,
        namespace: &Namespace,
        prefs: &mut PreferenceSet,
        editor: &mut ColorListEditor,
    ) -> Result<(), ConfigError> {
        self.apply(prefs, editor);
        self.save(namespace, prefs)
    }
}

/// Returns a warning when a non-topmost stack level comes from a file older
/// than [`STACK_LEVEL_THRESHOLD`].  An unparsable version skips the check.
fn stack_level_warning(stored_version: &str, stack_level: StackLevel) -> Option<CompatibilityWarning> {
    if stack_level.is_topmost() {
        return None;
    }
    match version::compare(stored_version, STACK_LEVEL_THRESHOLD) {
        Ok(Ordering::Less) => {
            let warning = CompatibilityWarning {
                stored_version: stored_version.to_string(),
                stack_level,
            };
            warn!("{warning}");
            Some(warning)
        }
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "cannot compare stored version, skipping stack level check");
            None
        }
    }
}
