//! Notification Rendering
//!
//! `Debug` output comes from prost. The pretty layout follows what the agent
//! CLI prints while subscribed: fixed-width labels, ids as UUID text (or `-`
//! when unset), enum values by name, and a dashed rule after each message.

use chrono::{DateTime, SecondsFormat};

use super::proto::amdgpu::{
    Event, EventId, EventSeverity, GpuWatch, GpuWatchAttr, GpuWatchAttrId,
    gpu_watch_attr_val::WatchAttrVal,
};
use crate::application::ports::Notification;
use crate::domain::identifier::EntityId;

const EVENT_RULE_WIDTH: usize = 62;
const WATCH_RULE_WIDTH: usize = 60;
const ATTR_RULE_WIDTH: usize = 42;

impl Notification for Event {
    fn render_pretty(&self) -> String {
        let timestamp = self.time.as_ref().map_or_else(
            || "-".to_string(),
            |ts| format_timestamp(ts.seconds, ts.nanos),
        );
        [
            field("Event Id", &enum_name(self.id, EventId::try_from, EventId::as_str_name)),
            field("GPU Id", &EntityId::display_wire(&self.gpu)),
            field(
                "Severity",
                &enum_name(self.severity, EventSeverity::try_from, EventSeverity::as_str_name),
            ),
            field("Timestamp", &timestamp),
            field("Description", &self.description),
            "-".repeat(EVENT_RULE_WIDTH),
        ]
        .join("\n")
    }
}

/// Statistics view: watch id, then one attribute table per GPU.
impl Notification for GpuWatch {
    fn render_pretty(&self) -> String {
        let watch_id = self.spec.as_ref().map_or(&[][..], |spec| spec.id.as_slice());
        let mut lines = vec![format!("GPU watch id : {}", EntityId::display_wire(watch_id))];

        let gpu_attrs = self
            .stats
            .as_ref()
            .map(|s| s.gpu_watch_attr.as_slice())
            .unwrap_or_default();
        for gpu in gpu_attrs {
            lines.push(String::new());
            lines.push(format!("  GPU : {}", EntityId::display_wire(&gpu.gpu)));
            if !gpu.attr.is_empty() {
                let rule = "-".repeat(ATTR_RULE_WIDTH);
                lines.push(format!("  {rule}"));
                lines.push(format!("  {:<30}{:<12}", "Attribute", "Value"));
                lines.push(format!("  {rule}"));
            }
            for attr in &gpu.attr {
                if let Some(value) = attr_value(attr) {
                    lines.push(format!("  {:<30}{value:<12}", attr_name(attr.id)));
                }
            }
        }

        lines.push(String::new());
        lines.push("-".repeat(WATCH_RULE_WIDTH));
        lines.join("\n")
    }
}

fn field(label: &str, value: &str) -> String {
    format!("{label:<20} : {value}")
}

/// Enum name for a known code, the number otherwise.
fn enum_name<E, Err>(
    code: i32,
    parse: impl Fn(i32) -> Result<E, Err>,
    name: impl Fn(&E) -> &'static str,
) -> String {
    parse(code).map_or_else(|_| code.to_string(), |value| name(&value).to_string())
}

/// `GPU_WATCH_ATTR_ID_GPU_CLOCK` → `gpu-clock`.
fn attr_name(code: i32) -> String {
    GpuWatchAttrId::try_from(code).map_or_else(
        |_| code.to_string(),
        |id| {
            id.as_str_name()
                .trim_start_matches("GPU_WATCH_ATTR_ID_")
                .to_lowercase()
                .replace('_', "-")
        },
    )
}

fn attr_value(attr: &GpuWatchAttr) -> Option<String> {
    let value = attr.value.as_ref()?;
    match value.watch_attr_val.as_ref()? {
        WatchAttrVal::LongVal(v) => Some(with_units(v.to_string(), &value.units)),
        WatchAttrVal::FloatVal(v) => Some(with_units(v.to_string(), &value.units)),
        WatchAttrVal::StringVal(v) => Some(v.clone()),
    }
}

fn with_units(value: String, units: &str) -> String {
    if units.is_empty() {
        value
    } else {
        format!("{value} {units}")
    }
}

fn format_timestamp(seconds: i64, nanos: i32) -> String {
    u32::try_from(nanos)
        .ok()
        .and_then(|nanos| DateTime::from_timestamp(seconds, nanos))
        .map_or_else(
            || format!("{seconds}s {nanos}ns"),
            |dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )
}
