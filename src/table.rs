//! Stream templates for the MOM6 diag table extension.
//!
//! One template exists per (frequency tier x vertical-grid variant). Tiers
//! are created once at startup and only their variable lists grow afterwards.
//! Suffix and cadence fields may be conditional on run mode; those conditions
//! are carried opaquely for the model's runtime to evaluate.

use crate::parse::Frequency;
use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Vertical grid(s) requested for 3D history output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VertGrid {
    Native,
    Interpolated,
    Both,
}

impl VertGrid {
    pub fn includes_interpolated(self) -> bool {
        matches!(self, VertGrid::Interpolated | VertGrid::Both)
    }

    pub fn includes_native(self) -> bool {
        matches!(self, VertGrid::Native | VertGrid::Both)
    }
}

const SPINUP: &str = "$OCN_DIAG_MODE == \"spinup\"";
const TEST: &str = "$TEST == True";
const ELSE: &str = "else";

// Transport diagnostics appended to native-grid 3D streams so budgets can be
// closed offline.
const TRANSPORT_VARS: [&str; 7] = ["volcello", "vmo", "vhGM", "vhml", "umo", "uhGM", "uhml"];

const MODULE_NATIVE: &str = "ocean_model";
const MODULE_Z_SPACE: &str = "ocean_model_z";

/// A template field that is either a concrete value or a set of
/// run-mode-conditional cases, resolved downstream by the model.
///
/// Cases serialize as a JSON object in the order they were declared; the
/// final case is always the `else` fallback.
#[derive(Debug, Clone)]
pub enum Setting {
    Fixed(Value),
    Cases(Vec<(&'static str, Value)>),
}

impl Setting {
    fn fixed(value: impl Into<Value>) -> Self {
        Setting::Fixed(value.into())
    }

    fn spinup_else(spinup: impl Into<Value>, fallback: impl Into<Value>) -> Self {
        Setting::Cases(vec![(SPINUP, spinup.into()), (ELSE, fallback.into())])
    }

    fn spinup_test_else(
        spinup: impl Into<Value>,
        test: impl Into<Value>,
        fallback: impl Into<Value>,
    ) -> Self {
        Setting::Cases(vec![
            (SPINUP, spinup.into()),
            (TEST, test.into()),
            (ELSE, fallback.into()),
        ])
    }
}

impl Serialize for Setting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Setting::Fixed(value) => value.serialize(serializer),
            Setting::Cases(cases) => {
                let mut map = serializer.serialize_map(Some(cases.len()))?;
                for (condition, value) in cases {
                    map.serialize_entry(condition, value)?;
                }
                map.end()
            }
        }
    }
}

/// Configuration record for one output stream. Field order is the key order
/// the model's diag_table reader expects.
#[derive(Debug, Clone, Serialize)]
pub struct StreamTemplate {
    pub suffix: Setting,
    pub output_freq: Setting,
    pub new_file_freq: Setting,
    pub output_freq_units: Setting,
    pub new_file_freq_units: Setting,
    pub time_axis_units: String,
    pub reduction_method: String,
    pub regional_section: String,
    pub fields: Vec<FieldGroup>,
}

/// One field group inside a stream: the vertical-grid module, output
/// precision packing (1 = double, 2 = single), and the variable-name lists.
#[derive(Debug, Clone, Serialize)]
pub struct FieldGroup {
    pub module: String,
    pub packing: u32,
    pub lists: Vec<Vec<String>>,
}

impl StreamTemplate {
    fn new(
        suffix: Setting,
        output_freq: Setting,
        output_freq_units: Setting,
        new_file_freq_units: Option<Setting>,
        module: &str,
    ) -> Self {
        let new_file_freq_units = new_file_freq_units.unwrap_or_else(|| output_freq_units.clone());
        StreamTemplate {
            suffix,
            output_freq,
            new_file_freq: Setting::fixed(1),
            output_freq_units,
            new_file_freq_units,
            time_axis_units: "days".to_string(),
            reduction_method: "mean".to_string(),
            regional_section: "none".to_string(),
            fields: vec![FieldGroup {
                module: module.to_string(),
                packing: 1,
                lists: vec![Vec::new()],
            }],
        }
    }

    /// Variables requested for this stream, in declaration order.
    pub fn user_vars(&self) -> &[String] {
        self.fields
            .first()
            .and_then(|group| group.lists.first())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn push_var(&mut self, name: &str) {
        if let Some(list) = self.fields.first_mut().and_then(|g| g.lists.first_mut()) {
            list.push(name.to_string());
        }
    }

    fn module(&self) -> &str {
        self.fields.first().map(|g| g.module.as_str()).unwrap_or("")
    }
}

/// Registry of stream templates, keyed by tier name in declaration order.
#[derive(Debug)]
pub struct DiagTable {
    entries: Vec<(String, StreamTemplate)>,
}

impl DiagTable {
    /// Build the per-tier templates for the requested vertical grid(s).
    ///
    /// Tier naming: a `_z` suffix on the tier means 3D output converted to
    /// Z space, `_native_z` means 3D output left on the model grid. File
    /// suffixes starting `hm_` mark native-grid streams, `h_` interpolated.
    pub fn new(vert_grid: VertGrid) -> Self {
        let mut entries = Vec::new();

        // "medium" behaves like the mom6.hm stream: annual in spinup runs,
        // monthly otherwise (daily under test).
        let medium_units = || Setting::spinup_test_else("years", "days", "months");
        entries.push((
            "medium".to_string(),
            StreamTemplate::new(
                Setting::spinup_test_else(
                    "h_bgc_annual%4yr",
                    "h_bgc_daily%4yr-%2mo-%2dy",
                    "h_bgc_monthly%4yr-%2mo",
                ),
                Setting::fixed(1),
                medium_units(),
                None,
                MODULE_NATIVE,
            ),
        ));
        if vert_grid.includes_interpolated() {
            entries.push((
                "medium_z".to_string(),
                StreamTemplate::new(
                    Setting::spinup_test_else(
                        "h_bgc_annual_z%4yr",
                        "h_bgc_daily_z%4yr-%2mo-%2dy",
                        "h_bgc_monthly_z%4yr-%2mo",
                    ),
                    Setting::fixed(1),
                    medium_units(),
                    None,
                    MODULE_Z_SPACE,
                ),
            ));
        }
        if vert_grid.includes_native() {
            entries.push((
                "medium_native_z".to_string(),
                StreamTemplate::new(
                    Setting::spinup_test_else(
                        "hm_bgc_annual_z%4yr",
                        "hm_bgc_daily_z%4yr-%2mo-%2dy",
                        "hm_bgc_monthly_z%4yr-%2mo",
                    ),
                    Setting::fixed(1),
                    medium_units(),
                    None,
                    MODULE_NATIVE,
                ),
            ));
        }

        // "high" behaves like the mom6.sfc stream: 5-day averages in spinup,
        // daily otherwise, rolling to a new file monthly instead of yearly.
        let high_freq = || Setting::spinup_else(5, 1);
        let high_roll = || Some(Setting::spinup_else("years", "months"));
        entries.push((
            "high".to_string(),
            StreamTemplate::new(
                Setting::spinup_else("h_bgc_daily5%4yr", "h_bgc_daily%4yr-%2mo"),
                high_freq(),
                Setting::fixed("days"),
                high_roll(),
                MODULE_NATIVE,
            ),
        ));
        if vert_grid.includes_interpolated() {
            entries.push((
                "high_z".to_string(),
                StreamTemplate::new(
                    Setting::spinup_else("h_bgc_daily5_z%4yr", "h_bgc_daily_z%4yr-%2mo"),
                    high_freq(),
                    Setting::fixed("days"),
                    high_roll(),
                    MODULE_Z_SPACE,
                ),
            ));
        }
        if vert_grid.includes_native() {
            entries.push((
                "high_native_z".to_string(),
                StreamTemplate::new(
                    Setting::spinup_else("hm_bgc_daily5_z%4yr", "hm_bgc_daily_z%4yr-%2mo"),
                    high_freq(),
                    Setting::fixed("days"),
                    high_roll(),
                    MODULE_NATIVE,
                ),
            ));
        }

        // "low" is annual averages.
        entries.push((
            "low".to_string(),
            StreamTemplate::new(
                Setting::spinup_else("h_bgc_annual2%4yr", "h_bgc_annual%4yr"),
                Setting::fixed(1),
                Setting::fixed("years"),
                None,
                MODULE_NATIVE,
            ),
        ));
        if vert_grid.includes_interpolated() {
            entries.push((
                "low_z".to_string(),
                StreamTemplate::new(
                    Setting::spinup_else("h_bgc_annual2_z%4yr", "h_bgc_annual_z%4yr"),
                    Setting::fixed(1),
                    Setting::fixed("years"),
                    None,
                    MODULE_Z_SPACE,
                ),
            ));
        }
        if vert_grid.includes_native() {
            entries.push((
                "low_native_z".to_string(),
                StreamTemplate::new(
                    Setting::spinup_else("hm_bgc_annual2_z%4yr", "hm_bgc_annual_z%4yr"),
                    Setting::fixed(1),
                    Setting::fixed("years"),
                    None,
                    MODULE_NATIVE,
                ),
            ));
        }

        DiagTable { entries }
    }

    /// Look up one tier's template by name.
    pub fn tier(&self, name: &str) -> Option<&StreamTemplate> {
        self.entries
            .iter()
            .find(|(tier, _)| tier == name)
            .map(|(_, template)| template)
    }

    fn tier_mut(&mut self, name: &str) -> Result<&mut StreamTemplate> {
        self.entries
            .iter_mut()
            .find(|(tier, _)| tier == name)
            .map(|(_, template)| template)
            .ok_or_else(|| anyhow!("no stream template registered for tier '{name}'"))
    }

    /// Append a variable to the streams selected by its frequencies.
    ///
    /// With `output_all` set the declared frequencies are ignored and the
    /// variable lands in the medium tier alone. 2D variables go to the base
    /// tier; 3D variables fan out to the `_z` and/or `_native_z` variants
    /// matching the vertical-grid selection.
    pub fn update(
        &mut self,
        name: &str,
        frequencies: &[Frequency],
        is_2d: bool,
        output_all: bool,
        vert_grid: VertGrid,
    ) -> Result<()> {
        let forced = [Frequency::Medium];
        let use_freq: &[Frequency] = if output_all { &forced } else { frequencies };

        for freq in use_freq {
            if *freq == Frequency::Never {
                continue;
            }
            if is_2d {
                self.tier_mut(freq.as_str())?.push_var(name);
            } else {
                if vert_grid.includes_interpolated() {
                    self.tier_mut(&format!("{freq}_z"))?.push_var(name);
                }
                if vert_grid.includes_native() {
                    self.tier_mut(&format!("{freq}_native_z"))?.push_var(name);
                }
            }
        }
        Ok(())
    }

    /// Write the non-empty tiers to `path` as a diag table extension.
    ///
    /// If every tier is empty no file is written; the model then runs with
    /// its stock diag table.
    pub fn dump(&self, path: &Path) -> Result<()> {
        let mut files: Vec<(&str, StreamTemplate)> = Vec::new();
        for (tier, template) in &self.entries {
            if template.user_vars().is_empty() {
                continue;
            }
            let mut out = template.clone();
            // Native-grid 3D streams also carry the transport diagnostics.
            if out.module() == MODULE_NATIVE && tier.ends_with("_z") {
                if let Some(group) = out.fields.first_mut() {
                    group
                        .lists
                        .push(TRANSPORT_VARS.iter().map(|v| v.to_string()).collect());
                }
            }
            files.push((tier, out));
        }

        if files.is_empty() {
            tracing::warn!("no diag table written: no variables were requested");
            return Ok(());
        }

        write_pretty_json(path, &OutputDocument { files })
    }
}

/// Top-level document: a single `Files` object holding the non-empty tiers
/// in declaration order.
struct OutputDocument<'a> {
    files: Vec<(&'a str, StreamTemplate)>,
}

impl Serialize for OutputDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut root = serializer.serialize_map(Some(1))?;
        root.serialize_entry("Files", &FilesMap(&self.files))?;
        root.end()
    }
}

struct FilesMap<'a>(&'a [(&'a str, StreamTemplate)]);

impl Serialize for FilesMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (tier, template) in self.0 {
            map.serialize_entry(tier, template)?;
        }
        map.end()
    }
}

// The consuming reader was written against 3-space indentation; keep it.
fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .context("serialize diag table JSON")?;
    std::fs::write(path, buf).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
