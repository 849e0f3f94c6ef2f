//! WMS GetCapabilities document parsing (1.1.1 and 1.3.0).

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use wms_common::{LayerId, LayerInfo, LayerStyle, WmsError, WmsResult};

/// The parts of a capabilities document the explorer uses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Service title
    pub title: Option<String>,
    /// Named layers keyed by layer name
    pub layers: BTreeMap<LayerId, LayerInfo>,
}

impl Capabilities {
    pub fn layer(&self, id: &LayerId) -> Option<&LayerInfo> {
        self.layers.get(id)
    }

    /// All named layers, sorted.
    pub fn layer_ids(&self) -> impl Iterator<Item = &LayerId> {
        self.layers.keys()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl FromIterator<LayerInfo> for Capabilities {
    fn from_iter<I: IntoIterator<Item = LayerInfo>>(iter: I) -> Self {
        Self {
            title: None,
            layers: iter.into_iter().map(|l| (l.name.clone(), l)).collect(),
        }
    }
}

/// Parse a GetCapabilities XML document.
///
/// Only named layers are kept. Time positions come from a `Dimension` or
/// `Extent` element named `time` (case-insensitive); whichever carries values
/// first wins. Legends come from `Style/LegendURL/OnlineResource@xlink:href`.
pub fn parse_capabilities(xml: &str) -> WmsResult<Capabilities> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut layer_stack: Vec<LayerInfo> = Vec::new();
    let mut current_style: Option<LayerStyle> = None;
    let mut capture_time = false;
    let mut text = String::new();
    let mut capabilities = Capabilities::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                match name.as_str() {
                    "Layer" => layer_stack.push(LayerInfo::default()),
                    "Style" if !layer_stack.is_empty() => {
                        current_style = Some(LayerStyle::default());
                    }
                    "Dimension" | "Extent" if !layer_stack.is_empty() => {
                        capture_time = is_time_dimension(&e);
                    }
                    "OnlineResource" => read_legend_href(&e, &path, &mut current_style),
                    _ => {}
                }
                path.push(name);
                text.clear();
            }
            Ok(Event::Empty(e)) => {
                if local_name(&e) == "OnlineResource" {
                    read_legend_href(&e, &path, &mut current_style);
                }
            }
            Ok(Event::Text(t)) => {
                let unescaped = t.unescape().map_err(|e| xml_error(&reader, e))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(c)) => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Ok(Event::End(_)) if !path.is_empty() => {
                let name = path.pop().unwrap_or_default();
                let parent = path.last().map(String::as_str);
                let value = text.trim().to_string();
                text.clear();

                match (name.as_str(), parent) {
                    ("Title", Some("Service")) => capabilities.title = Some(value),
                    ("Name", Some("Layer")) => {
                        if let Some(layer) = layer_stack.last_mut() {
                            layer.name = LayerId::new(value);
                        }
                    }
                    ("Title", Some("Layer")) => {
                        if let Some(layer) = layer_stack.last_mut() {
                            layer.title = value;
                        }
                    }
                    ("Abstract", Some("Layer")) => {
                        if let Some(layer) = layer_stack.last_mut() {
                            layer.description = (!value.is_empty()).then_some(value);
                        }
                    }
                    ("Name", Some("Style")) => {
                        if let Some(style) = current_style.as_mut() {
                            style.name = value;
                        }
                    }
                    ("Title", Some("Style")) => {
                        if let Some(style) = current_style.as_mut() {
                            style.title = Some(value);
                        }
                    }
                    ("Dimension" | "Extent", _) if capture_time => {
                        capture_time = false;
                        if let Some(layer) = layer_stack.last_mut() {
                            if layer.time_positions.is_empty() {
                                layer.time_positions = split_positions(&value);
                            }
                        }
                    }
                    ("Style", _) => {
                        if let (Some(style), Some(layer)) =
                            (current_style.take(), layer_stack.last_mut())
                        {
                            layer.styles.push(style);
                        }
                    }
                    ("Layer", _) => {
                        if let Some(layer) = layer_stack.pop() {
                            if !layer.name.as_str().is_empty() {
                                capabilities.layers.insert(layer.name.clone(), layer);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(capabilities)
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn is_time_dimension(e: &BytesStart<'_>) -> bool {
    e.attributes().flatten().any(|attr| {
        attr.key.as_ref() == b"name"
            && String::from_utf8_lossy(&attr.value).eq_ignore_ascii_case("time")
    })
}

/// Record the legend link when `OnlineResource` sits inside `Style/LegendURL`.
fn read_legend_href(e: &BytesStart<'_>, path: &[String], style: &mut Option<LayerStyle>) {
    let in_legend = matches!(
        path,
        [.., parent, last] if parent == "Style" && last == "LegendURL"
    );
    let Some(style) = style.as_mut().filter(|_| in_legend) else {
        return;
    };

    style.legend_url = e
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"href")
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()));
}

fn split_positions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn xml_error(reader: &Reader<&[u8]>, e: quick_xml::Error) -> WmsError {
    WmsError::CapabilitiesParse(format!(
        "XML parsing error at position {}: {:?}",
        reader.buffer_position(),
        e
    ))
}
