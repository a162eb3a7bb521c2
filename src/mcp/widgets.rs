//! Widget registry
//!
//! Each tool renders its structured content through a widget whose HTML is
//! served as an MCP resource. The registry is built once at startup from
//! [`WIDGETS`] and never changes afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{json, Value};

use crate::error::{ConfigError, Result};
use crate::mcp::types::{Resource, ResourceContents, ResourceTemplate, WIDGET_MIME_TYPE};

/// Static description of a widget
#[derive(Debug)]
pub struct WidgetDescriptor {
    /// Widget id, equal to the name of the tool it renders
    pub id: &'static str,
    pub title: &'static str,
    pub template_uri: &'static str,

    /// Status line shown while the tool runs
    pub invoking: &'static str,

    /// Status line shown once the tool returns
    pub invoked: &'static str,

    /// Base name of the built HTML file in the assets directory
    pub component: &'static str,

    /// Confirmation text returned with every successful call
    pub response_text: &'static str,
}

pub static WIDGETS: [WidgetDescriptor; 3] = [
    WidgetDescriptor {
        id: "beach-map",
        title: "Show Beach Map",
        template_uri: "ui://widget/beach-map.html",
        invoking: "Diving into beach data",
        invoked: "Surfaced with fresh beach info",
        component: "badevandet",
        response_text: "Rendered a beach map with water quality information!",
    },
    WidgetDescriptor {
        id: "beach-compare",
        title: "Compare Beaches",
        template_uri: "ui://widget/beach-compare.html",
        invoking: "Comparing beach conditions",
        invoked: "Beach comparison ready",
        component: "badevandet-compare",
        response_text: "Created a detailed comparison of beaches!",
    },
    WidgetDescriptor {
        id: "beach-best",
        title: "Find Best Beaches for Swimming",
        template_uri: "ui://widget/beach-best.html",
        invoking: "Finding the perfect swimming spots",
        invoked: "Best beaches identified",
        component: "badevandet-best",
        response_text: "Here are the best beaches for swimming right now!",
    },
];

/// A widget with its markup loaded
#[derive(Debug)]
pub struct Widget {
    pub descriptor: &'static WidgetDescriptor,
    pub html: String,
}

impl Widget {
    /// `_meta` block binding a tool or resource to this widget
    pub fn meta(&self) -> Value {
        json!({
            "openai/outputTemplate": self.descriptor.template_uri,
            "openai/toolInvocation/invoking": self.descriptor.invoking,
            "openai/toolInvocation/invoked": self.descriptor.invoked,
            "openai/widgetAccessible": true,
            "openai/resultCanProduceWidget": true,
        })
    }

    pub fn resource(&self) -> Resource {
        Resource {
            uri: self.descriptor.template_uri.to_string(),
            name: self.descriptor.title.to_string(),
            description: Some(format!("{} widget markup", self.descriptor.title)),
            mime_type: Some(WIDGET_MIME_TYPE.to_string()),
            meta: Some(self.meta()),
        }
    }

    pub fn resource_template(&self) -> ResourceTemplate {
        ResourceTemplate {
            uri_template: self.descriptor.template_uri.to_string(),
            name: self.descriptor.title.to_string(),
            description: Some(format!("{} widget markup", self.descriptor.title)),
            mime_type: Some(WIDGET_MIME_TYPE.to_string()),
            meta: Some(self.meta()),
        }
    }

    pub fn contents(&self) -> ResourceContents {
        ResourceContents {
            uri: self.descriptor.template_uri.to_string(),
            mime_type: Some(WIDGET_MIME_TYPE.to_string()),
            text: Some(self.html.clone()),
            meta: Some(self.meta()),
        }
    }
}

/// Read-only lookup of widgets by id and by template URI
#[derive(Debug)]
pub struct WidgetRegistry {
    widgets: Vec<Widget>,
    by_id: HashMap<&'static str, usize>,
    by_uri: HashMap<&'static str, usize>,
}

impl WidgetRegistry {
    /// Build the registry, obtaining each widget's HTML from `load_html`
    pub fn build<F>(mut load_html: F) -> Result<Self>
    where
        F: FnMut(&WidgetDescriptor) -> Result<String>,
    {
        let mut widgets = Vec::with_capacity(WIDGETS.len());
        let mut by_id = HashMap::new();
        let mut by_uri = HashMap::new();

        for (index, descriptor) in WIDGETS.iter().enumerate() {
            let html = load_html(descriptor)?;
            by_id.insert(descriptor.id, index);
            by_uri.insert(descriptor.template_uri, index);
            widgets.push(Widget { descriptor, html });
        }

        Ok(Self {
            widgets,
            by_id,
            by_uri,
        })
    }

    /// Build the registry from the built widget HTML in `assets_dir`
    pub fn load(assets_dir: &Path) -> Result<Self> {
        Self::build(|descriptor| read_widget_html(assets_dir, descriptor.component))
    }

    pub fn by_id(&self, id: &str) -> Option<&Widget> {
        self.by_id.get(id).map(|&i| &self.widgets[i])
    }

    pub fn by_uri(&self, uri: &str) -> Option<&Widget> {
        self.by_uri.get(uri).map(|&i| &self.widgets[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Widget> {
        self.widgets.iter()
    }
}

/// Read `<component>.html`, or the latest `<component>-*.html` build output
pub fn read_widget_html(assets_dir: &Path, component: &str) -> Result<String> {
    if !assets_dir.is_dir() {
        return Err(ConfigError::AssetsDirNotFound {
            path: assets_dir.display().to_string(),
        }
        .into());
    }

    let direct = assets_dir.join(format!("{}.html", component));
    if direct.is_file() {
        return Ok(std::fs::read_to_string(direct)?);
    }

    // Hashed build outputs sort by name; the last one is the newest
    let prefix = format!("{}-", component);
    let mut candidates: Vec<String> = std::fs::read_dir(assets_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(&prefix) && name.ends_with(".html"))
        .collect();
    candidates.sort();

    match candidates.last() {
        Some(name) => Ok(std::fs::read_to_string(assets_dir.join(name))?),
        None => Err(ConfigError::WidgetAssetMissing {
            component: component.to_string(),
            path: assets_dir.display().to_string(),
        }
        .into()),
    }
}
