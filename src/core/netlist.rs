//! Netlist extraction from EESchema intermediate XML exports
//!
//! The netlist is parsed exactly once. Every `<comp>` element yields a
//! designator plus the value of the configured custom field, and the first
//! sheet's title block is kept as read-only document metadata.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use thiserror::Error;

/// Netlist parse failure with source location
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(tbom::netlist::malformed))]
pub struct NetlistSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl NetlistSyntaxError {
    fn at(source: &str, name: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(source.len().saturating_sub(1));
        Self {
            src: NamedSource::new(name, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help: None,
            message: message.into(),
        }
    }

    fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Human readable description without the source excerpt
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum NetlistError {
    #[error("Failed to read netlist {}", path.display())]
    #[diagnostic(
        code(tbom::netlist::io),
        help("Export the netlist from EESchema via Tools > Generate Bill of Materials")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Malformed(#[from] NetlistSyntaxError),
}

/// Title block and origin of the exported schematic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub revision: Option<String>,
    pub date: Option<String>,
    pub source: Option<String>,
}

/// One placed component and its catalog key, if it has exactly one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentEntry {
    pub reference: String,
    pub part_id: Option<String>,
}

/// A parsed netlist document
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    pub components: Vec<ComponentEntry>,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Copy)]
enum Capture {
    Field,
    Title,
    Revision,
    Date,
    Source,
}

/// Component currently being read
struct OpenComponent {
    reference: String,
    depth: usize,
    offset: usize,
    matches: Vec<String>,
}

impl Netlist {
    /// Read and parse a netlist file
    pub fn load(path: &Path, field_name: &str) -> Result<Self, NetlistError> {
        let source = std::fs::read_to_string(path).map_err(|source| NetlistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path.display().to_string();
        Self::parse(&source, &name, field_name)
    }

    /// Parse netlist XML held in memory
    ///
    /// `name` is only used to label diagnostics.
    pub fn parse(source: &str, name: &str, field_name: &str) -> Result<Self, NetlistError> {
        let mut reader = Reader::from_str(source);
        reader.trim_text(true);

        let mut netlist = Netlist::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut path: Vec<String> = Vec::new();
        let mut component: Option<OpenComponent> = None;
        let mut capture: Option<(Capture, usize, String)> = None;

        let syntax = |offset: usize, err: quick_xml::Error| {
            NetlistSyntaxError::at(source, name, offset, format!("XML syntax error: {}", err))
        };

        loop {
            let offset = reader.buffer_position() as usize;
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => return Err(syntax(reader.buffer_position() as usize, e).into()),
            };

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();

                    if tag == "comp" && component.is_none() {
                        let reference = attribute(e, "ref")
                            .map_err(|err| syntax(offset, err))?
                            .filter(|r| !r.trim().is_empty())
                            .ok_or_else(|| {
                                NetlistSyntaxError::at(
                                    source,
                                    name,
                                    offset,
                                    "Component has no `ref` attribute",
                                )
                                .with_help("Annotate the schematic before exporting the netlist")
                            })?;
                        component = Some(OpenComponent {
                            reference,
                            depth: path.len(),
                            offset,
                            matches: Vec::new(),
                        });
                    } else if tag == "field" {
                        if let Some(ref comp) = component {
                            let under_fields = path.len() == comp.depth + 2
                                && path.last().map(String::as_str) == Some("fields");
                            if under_fields
                                && attribute(e, "name").map_err(|err| syntax(offset, err))?.as_deref()
                                    == Some(field_name)
                            {
                                capture = Some((Capture::Field, path.len(), String::new()));
                            }
                        }
                    } else if let Some(target) = metadata_target(&path, &tag) {
                        capture = Some((target, path.len(), String::new()));
                    }

                    if is_empty {
                        finish_element(
                            source,
                            name,
                            path.len(),
                            &mut netlist,
                            &mut seen,
                            &mut component,
                            &mut capture,
                        )?;
                    } else {
                        path.push(tag);
                    }
                }
                Event::Text(ref e) => {
                    if let Some((_, _, ref mut text)) = capture {
                        let unescaped = e
                            .unescape()
                            .map_err(|err| syntax(offset, err))?;
                        text.push_str(&unescaped);
                    }
                }
                Event::CData(ref e) => {
                    if let Some((_, _, ref mut text)) = capture {
                        text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(_) => {
                    path.pop();
                    finish_element(
                        source,
                        name,
                        path.len(),
                        &mut netlist,
                        &mut seen,
                        &mut component,
                        &mut capture,
                    )?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !path.is_empty() {
            return Err(NetlistSyntaxError::at(
                source,
                name,
                source.len(),
                format!("Unexpected end of document inside <{}>", path.join("/")),
            )
            .into());
        }

        tracing::debug!(
            components = netlist.components.len(),
            unresolved = netlist.components.iter().filter(|c| c.part_id.is_none()).count(),
            "parsed netlist"
        );

        Ok(netlist)
    }

    /// Number of placed components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// `(designator, part id)` pairs in document order
    pub fn part_ids(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.components
            .iter()
            .map(|c| (c.reference.as_str(), c.part_id.as_deref()))
    }
}

/// Close bookkeeping for an element that ended at `depth`
fn finish_element(
    source: &str,
    name: &str,
    depth: usize,
    netlist: &mut Netlist,
    seen: &mut HashSet<String>,
    component: &mut Option<OpenComponent>,
    capture: &mut Option<(Capture, usize, String)>,
) -> Result<(), NetlistError> {
    if let Some((target, capture_depth, _)) = capture {
        if *capture_depth == depth {
            let target = *target;
            let text = capture.take().map(|(_, _, t)| t).unwrap_or_default();
            let value = text.trim().to_string();
            let meta = &mut netlist.metadata;
            match target {
                Capture::Field => {
                    if let Some(comp) = component.as_mut() {
                        comp.matches.push(value);
                    }
                }
                Capture::Title => set_once(&mut meta.title, value),
                Capture::Revision => set_once(&mut meta.revision, value),
                Capture::Date => set_once(&mut meta.date, value),
                Capture::Source => set_once(&mut meta.source, value),
            }
        }
    }

    let closes_component = component.as_ref().is_some_and(|c| c.depth == depth);
    if closes_component {
        if let Some(comp) = component.take() {
            if !seen.insert(comp.reference.clone()) {
                return Err(NetlistSyntaxError::at(
                    source,
                    name,
                    comp.offset,
                    format!("Designator {} appears more than once", comp.reference),
                )
                .with_help("Re-annotate the schematic so every designator is unique")
                .into());
            }
            // Duplicated fields are ambiguous and count as missing.
            let part_id = match comp.matches.as_slice() {
                [only] if !only.is_empty() => Some(only.clone()),
                _ => None,
            };
            netlist.components.push(ComponentEntry {
                reference: comp.reference,
                part_id,
            });
        }
    }

    Ok(())
}

fn set_once(slot: &mut Option<String>, value: String) {
    if slot.is_none() && !value.is_empty() {
        *slot = Some(value);
    }
}

/// Metadata element addressed by `path` + `tag`, ignoring the root element name
fn metadata_target(path: &[String], tag: &str) -> Option<Capture> {
    let inner: Vec<&str> = path.iter().skip(1).map(String::as_str).collect();
    match (inner.as_slice(), tag) {
        (["design"], "source") => Some(Capture::Source),
        (["design", "sheet", "title_block"], "title") => Some(Capture::Title),
        (["design", "sheet", "title_block"], "rev") => Some(Capture::Revision),
        (["design", "sheet", "title_block"], "date") => Some(Capture::Date),
        _ => None,
    }
}

fn attribute(e: &BytesStart, name: &str) -> Result<Option<String>, quick_xml::Error> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}
