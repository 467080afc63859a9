// src/manifest/parser.rs

//! package.xml parsing
//!
//! Supports manifest formats 1 to 3. Only the elements needed to generate a
//! Nix expression are read; everything else (maintainers, urls, exports
//! other than `build_type`) is skipped.

use super::{BuildTypeExport, Condition, DependencyDeclaration, DependencyRole, PackageManifest};
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;
use tracing::debug;

/// An open element while walking the document
struct Frame {
    name: String,
    condition: Option<String>,
    text: String,
    /// Byte offset just past the start tag
    start: usize,
}

fn attribute(e: &BytesStart<'_>, key: &str) -> std::result::Result<Option<String>, String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_ref() == key.as_bytes() {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_condition(raw: Option<&str>) -> std::result::Result<Option<Condition>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(expr) => Condition::parse(expr).map(Some).map_err(|e| e.to_string()),
    }
}

/// Inner markup of an element closed at byte offset `end`, ends stripped
fn inner_markup(content: &str, start: usize, end: usize) -> String {
    let raw = content.get(start..end).unwrap_or_default();
    let inner = raw.rfind("</").map_or(raw, |close| &raw[..close]);
    inner.trim().to_string()
}

#[derive(Default)]
struct Builder {
    format: u8,
    name: Option<String>,
    version: Option<String>,
    description: String,
    licenses: Vec<String>,
    build_types: Vec<BuildTypeExport>,
    dependencies: Vec<DependencyDeclaration>,
}

impl Builder {
    /// Handle a closed element; `parents` are the names of its ancestors
    ///
    /// `description` keeps its inner markup verbatim; other elements take
    /// their text content. Both are stripped only at the ends.
    fn close(
        &mut self,
        parents: &[String],
        frame: Frame,
        description: Option<String>,
    ) -> std::result::Result<(), String> {
        let text = frame.text.trim().to_string();
        let parents: Vec<&str> = parents.iter().map(String::as_str).collect();

        match (parents.as_slice(), frame.name.as_str()) {
            (["package"], "name") => self.name = Some(text),
            (["package"], "version") => self.version = Some(text),
            (["package"], "description") => self.description = description.unwrap_or_default(),
            (["package"], "license") => self.licenses.push(text),
            (["package", "export"], "build_type") => {
                self.build_types.push(BuildTypeExport {
                    name: text,
                    condition: parse_condition(frame.condition.as_deref())?,
                });
            }
            (["package"], tag) => {
                if let Some(roles) = DependencyRole::from_tag(tag, self.format) {
                    if text.is_empty() {
                        return Err(format!("empty <{}> element", tag));
                    }
                    let condition = parse_condition(frame.condition.as_deref())?;
                    for role in roles {
                        self.dependencies.push(DependencyDeclaration {
                            name: text.clone(),
                            role: *role,
                            condition: condition.clone(),
                        });
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> std::result::Result<PackageManifest, String> {
        let name = self.name.filter(|n| !n.is_empty()).ok_or("missing <name>")?;
        let version = self
            .version
            .filter(|v| !v.is_empty())
            .ok_or("missing <version>")?;
        Ok(PackageManifest {
            format: self.format,
            name,
            version,
            description: self.description,
            licenses: self.licenses,
            build_types: self.build_types,
            dependencies: self.dependencies,
        })
    }
}

fn parse(content: &str) -> std::result::Result<PackageManifest, String> {
    let mut reader = Reader::from_str(content);

    let mut builder = Builder {
        format: 1,
        ..Default::default()
    };
    let mut stack: Vec<Frame> = Vec::new();
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("{} at position {}", e, reader.buffer_position()))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if stack.is_empty() {
                    if seen_root || name != "package" {
                        return Err(format!("unexpected root element <{}>", name));
                    }
                    seen_root = true;
                    if let Some(format) = attribute(e, "format")? {
                        builder.format = format
                            .trim()
                            .parse()
                            .map_err(|_| format!("invalid format attribute \"{}\"", format))?;
                    }
                }
                let frame = Frame {
                    name,
                    condition: attribute(e, "condition")?,
                    text: String::new(),
                    start: reader.buffer_position(),
                };
                if matches!(event, Event::Empty(_)) {
                    let parents: Vec<String> = stack.iter().map(|f| f.name.clone()).collect();
                    builder.close(&parents, frame, None)?;
                } else {
                    stack.push(frame);
                }
            }
            Event::End(_) => {
                let frame = stack.pop().ok_or("unbalanced closing tag")?;
                let parents: Vec<String> = stack.iter().map(|f| f.name.clone()).collect();
                let markup = (frame.name == "description")
                    .then(|| inner_markup(content, frame.start, reader.buffer_position()));
                builder.close(&parents, frame, markup)?;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err("no <package> element".to_string());
    }
    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }
    builder.finish()
}

/// Parse manifest `content`; `path` is only used in error messages
pub fn parse_manifest(content: &str, path: &Path) -> Result<PackageManifest> {
    let manifest = parse(content).map_err(|reason| Error::ManifestParse {
        path: path.to_path_buf(),
        reason,
    })?;
    debug!(
        "Parsed {} {} (format {}, {} dependency declarations)",
        manifest.name,
        manifest.version,
        manifest.format,
        manifest.dependencies.len()
    );
    Ok(manifest)
}

/// Read and parse a manifest file
pub fn parse_manifest_file(path: &Path) -> Result<PackageManifest> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::ManifestParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_manifest(&content, path)
}
