pub mod config;
pub mod css;
pub mod dom;
pub mod export;
pub mod id;
pub mod lint;
pub mod markup;
pub mod model;
pub mod parser;
pub mod plugin;
pub mod svg;

pub use config::{ConfigError, XdConfig};
pub use dom::{DomError, DomNode, Rect};
pub use export::{export_document, export_json, weight_style};
pub use id::NodeId;
pub use lint::{LintDiagnostic, LintSeverity, lint_tree};
pub use markup::render_html;
pub use model::*;
pub use parser::{parse_dom, parse_dom_with, parse_snapshot_json};
pub use plugin::{EXPORT_TAG, PluginDocument, PluginNode};
pub use svg::{export_svg, export_svg_with};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
