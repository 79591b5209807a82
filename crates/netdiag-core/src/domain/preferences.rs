//! The Preference Set: every user-tunable value of the network diagram.
//!
//! Each field has a documented default (see the `defaults` module) and an
//! independent lifecycle: it is set when preferences are loaded, changed by
//! whatever edits preferences (a dialog, the CLI), and read when preferences
//! are saved or when the diagram engine consults it.
//!
//! # Enumerations stored as integers (for beginners)
//!
//! Several settings are small enumerations that are persisted as plain
//! integers.  Most enums below implement `TryFrom<i64>` so a stored integer can
//! be checked on the way in: an integer that does not name a variant is a
//! malformed value, not a new mode.  [`StackLevel`] is the exception and keeps
//! whatever integer was stored.

use serde::Serialize;
use thiserror::Error;

use super::colors::ColorAssignmentList;

/// Documented default values, one constant per field.
pub mod defaults {
    pub const DIAGRAM_ONLY: bool = false;
    pub const GROUP_UNKNOWN: bool = true;
    pub const STATIONARY: bool = false;
    pub const FADE_DISABLED: bool = false;
    pub const CYCLE_COLORS: bool = true;
    pub const ANTIALIAS: bool = true;
    pub const NAME_RESOLUTION: bool = true;
    pub const NEW_INFO_DIALOG: bool = true;

    /// One hour.
    pub const NODE_TIMEOUT_MS: f64 = 3_600_000.0;
    pub const GUI_NODE_TIMEOUT_MS: f64 = 60_000.0;
    pub const PROTO_NODE_TIMEOUT_MS: f64 = 60_000.0;
    pub const LINK_TIMEOUT_MS: f64 = 60_000.0;
    pub const GUI_LINK_TIMEOUT_MS: f64 = 20_000.0;
    pub const PROTO_LINK_TIMEOUT_MS: f64 = 20_000.0;
    /// One day.
    pub const PROTO_TIMEOUT_MS: f64 = 86_400_000.0;
    pub const AVERAGING_MS: f64 = 3_000.0;

    pub const NODE_RADIUS_MULTIPLIER: f64 = 0.0005;
    pub const LINK_WIDTH_MULTIPLIER: f64 = 0.0005;

    /// Refresh period when capturing in an aggregate (IP or TCP) mode.
    pub const AGGREGATE_REFRESH_PERIOD_MS: u32 = 3_000;
    /// Refresh period in every other mode.
    pub const REFRESH_PERIOD_MS: u32 = 800;

    pub const FILTER: &str = "";
    pub const FONT_NAME: &str = "-*-*-*-*-*-*-*-140-*-*-*-*-iso8859-1";
}

/// Error returned when a stored integer does not name an enum variant.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("{value} is not a valid {kind}")]
pub struct InvalidVariant {
    pub kind: &'static str,
    pub value: i64,
}

/// Generates the integer conversions shared by every stored enum.
macro_rules! stored_enum {
    ($name:ident, $kind:literal, { $($variant:ident = $value:literal),+ $(,)? }) => {
        impl $name {
            /// The integer written to the preference store.
            pub const fn as_i64(self) -> i64 {
                self as i64
            }
        }

        impl TryFrom<i64> for $name {
            type Error = InvalidVariant;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(InvalidVariant { kind: $kind, value }),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> i64 {
                value.as_i64()
            }
        }
    };
}

/// Which protocol layer the capture engine aggregates traffic at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[repr(i8)]
pub enum CaptureMode {
    /// Let the capture engine pick a mode from the link type.
    #[default]
    Default = -1,
    Ethernet = 0,
    Fddi = 1,
    Ieee802 = 2,
    Ip = 3,
    Tcp = 4,
}

stored_enum!(CaptureMode, "capture mode", {
    Default = -1,
    Ethernet = 0,
    Fddi = 1,
    Ieee802 = 2,
    Ip = 3,
    Tcp = 4,
});

impl CaptureMode {
    /// IP and TCP modes aggregate many hosts per node and refresh more slowly.
    pub const fn is_aggregate(self) -> bool {
        matches!(self, Self::Ip | Self::Tcp)
    }

    /// The refresh period used when none is stored for this mode.
    pub const fn default_refresh_period_ms(self) -> u32 {
        if self.is_aggregate() {
            defaults::AGGREGATE_REFRESH_PERIOD_MS
        } else {
            defaults::REFRESH_PERIOD_MS
        }
    }
}

/// How traffic volume is mapped onto node and link size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[repr(u8)]
pub enum SizeMode {
    #[default]
    Linear = 0,
    Logarithmic = 1,
    SquareRoot = 2,
}

stored_enum!(SizeMode, "size mode", {
    Linear = 0,
    Logarithmic = 1,
    SquareRoot = 2,
});

/// Which traffic counter determines node size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[repr(u8)]
pub enum NodeSizeMetric {
    InstantTotal = 0,
    InstantInbound = 1,
    #[default]
    InstantOutbound = 2,
    AccumulatedTotal = 3,
    AccumulatedInbound = 4,
    AccumulatedOutbound = 5,
}

stored_enum!(NodeSizeMetric, "node size metric", {
    InstantTotal = 0,
    InstantInbound = 1,
    InstantOutbound = 2,
    AccumulatedTotal = 3,
    AccumulatedInbound = 4,
    AccumulatedOutbound = 5,
});

/// Which protocol of a packet's stack names its traffic in the diagram.
///
/// Before release 0.5.4 the non-zero levels meant something different, which
/// is why the loader warns about non-topmost levels in older files.
///
/// Any stored integer is kept: levels past the ones the dialog offers land in
/// [`StackLevel::Other`] and are written back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum StackLevel {
    /// The highest protocol the dissector recognised.
    #[default]
    Topmost,
    Level1,
    Level2,
    Level3,
    Level4,
    /// A stored level outside `0..=4`.
    Other(i64),
}

impl StackLevel {
    pub const fn is_topmost(self) -> bool {
        matches!(self, Self::Topmost)
    }

    /// The integer written to the preference store.
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Topmost => 0,
            Self::Level1 => 1,
            Self::Level2 => 2,
            Self::Level3 => 3,
            Self::Level4 => 4,
            Self::Other(value) => value,
        }
    }
}

impl From<i64> for StackLevel {
    fn from(value: i64) -> Self {
        match value {
            0 => Self::Topmost,
            1 => Self::Level1,
            2 => Self::Level2,
            3 => Self::Level3,
            4 => Self::Level4,
            other => Self::Other(other),
        }
    }
}

impl From<StackLevel> for i64 {
    fn from(value: StackLevel) -> i64 {
        value.as_i64()
    }
}

/// Every tunable of the diagram, with its documented default.
///
/// Timeouts and periods are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceSet {
    pub diagram_only: bool,
    pub group_unknown: bool,
    pub stationary: bool,
    pub fade_disabled: bool,
    pub cycle_colors: bool,
    pub antialias: bool,
    pub name_resolution: bool,
    pub new_info_dialog: bool,

    /// How long an idle node survives in the data model.
    pub node_timeout_ms: f64,
    /// How long an idle node stays on screen.
    pub gui_node_timeout_ms: f64,
    /// How long an idle protocol stays attached to a node.
    pub proto_node_timeout_ms: f64,
    pub link_timeout_ms: f64,
    pub gui_link_timeout_ms: f64,
    pub proto_link_timeout_ms: f64,
    /// How long an idle protocol stays in the global protocol table.
    pub proto_timeout_ms: f64,
    /// Window over which traffic rates are averaged.
    pub averaging_ms: f64,
    pub refresh_period_ms: u32,

    /// Strictly positive.
    pub node_radius_multiplier: f64,
    /// Strictly positive.
    pub link_width_multiplier: f64,

    pub capture_mode: CaptureMode,
    pub size_mode: SizeMode,
    pub node_size_metric: NodeSizeMetric,
    pub stack_level: StackLevel,

    /// Capture filter expression (pcap syntax).
    pub filter: String,
    pub font_name: String,

    pub colors: ColorAssignmentList,
}

impl Default for PreferenceSet {
    fn default() -> Self {
        let capture_mode = CaptureMode::default();
        Self {
            diagram_only: defaults::DIAGRAM_ONLY,
            group_unknown: defaults::GROUP_UNKNOWN,
            stationary: defaults::STATIONARY,
            fade_disabled: defaults::FADE_DISABLED,
            cycle_colors: defaults::CYCLE_COLORS,
            antialias: defaults::ANTIALIAS,
            name_resolution: defaults::NAME_RESOLUTION,
            new_info_dialog: defaults::NEW_INFO_DIALOG,
            node_timeout_ms: defaults::NODE_TIMEOUT_MS,
            gui_node_timeout_ms: defaults::GUI_NODE_TIMEOUT_MS,
            proto_node_timeout_ms: defaults::PROTO_NODE_TIMEOUT_MS,
            link_timeout_ms: defaults::LINK_TIMEOUT_MS,
            gui_link_timeout_ms: defaults::GUI_LINK_TIMEOUT_MS,
            proto_link_timeout_ms: defaults::PROTO_LINK_TIMEOUT_MS,
            proto_timeout_ms: defaults::PROTO_TIMEOUT_MS,
            averaging_ms: defaults::AVERAGING_MS,
            refresh_period_ms: capture_mode.default_refresh_period_ms(),
            node_radius_multiplier: defaults::NODE_RADIUS_MULTIPLIER,
            link_width_multiplier: defaults::LINK_WIDTH_MULTIPLIER,
            capture_mode,
            size_mode: SizeMode::default(),
            node_size_metric: NodeSizeMetric::default(),
            stack_level: StackLevel::default(),
            filter: defaults::FILTER.to_string(),
            font_name: defaults::FONT_NAME.to_string(),
            colors: ColorAssignmentList::default(),
        }
    }
}
