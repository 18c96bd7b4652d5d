//! Ingestion: raw inputs to decoded resources.
//!
//! Every input is normalized, split into documents, and each document is
//! probed for its `apiVersion`/`kind` before being handed to the decoder
//! registered for that pair. `List` documents are expanded recursively and
//! unregistered kinds are recorded as ignored. Malformed documents do not
//! stop ingestion: all of them are collected into a single [`ParseError`].

pub mod decode;
pub mod yaml;

pub use decode::{DecodeFn, DecoderRegistry};
pub use yaml::{RawDocument, detect_file_location, normalize_newlines, parse_yaml_bool, split_documents};

use crate::analyzer::kubescore::context::{IgnoredObject, ParsedObjects, Resource, TypeMeta};
use crate::analyzer::kubescore::pragma::SKIP_ANNOTATION;
use crate::analyzer::kubescore::types::FileLocation;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// One input to ingest, with the name used in file locations. The content
/// is kept as bytes so that a document with invalid UTF-8 is reported like
/// any other malformed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedInput {
    pub name: String,
    pub content: Vec<u8>,
}

impl NamedInput {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A document that could not be read or decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {message}")]
pub struct DocumentError {
    pub location: FileLocation,
    pub message: String,
}

/// Every malformed document found across all inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    pub errors: Vec<DocumentError>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    items: Vec<serde_yaml::Value>,
}

/// Decodes inputs using a [`DecoderRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct Parser<'r> {
    registry: &'r DecoderRegistry,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r DecoderRegistry) -> Self {
        Self { registry }
    }

    /// Parse every input. Either all resources are returned, or an error
    /// naming every malformed document.
    pub fn parse_inputs(&self, inputs: &[NamedInput]) -> Result<ParsedObjects, ParseError> {
        let mut objects = ParsedObjects::new();
        let mut errors = Vec::new();

        for input in inputs {
            let before = objects.len();
            self.parse_input(input, &mut objects, &mut errors);
            log::info!("Parsed {} object(s) from {}", objects.len() - before, input.name);
        }

        if errors.is_empty() {
            Ok(objects)
        } else {
            Err(ParseError { errors })
        }
    }

    /// Parse a single named string.
    pub fn parse_str(&self, name: &str, content: &str) -> Result<ParsedObjects, ParseError> {
        self.parse_inputs(&[NamedInput::new(name, content)])
    }

    fn parse_input(&self, input: &NamedInput, objects: &mut ParsedObjects, errors: &mut Vec<DocumentError>) {
        let content = normalize_newlines(&input.content);
        for document in split_documents(&content) {
            let text = match std::str::from_utf8(document.text) {
                Ok(text) => text,
                Err(err) => {
                    errors.push(DocumentError {
                        location: FileLocation::new(&input.name, document.line),
                        message: format!("Document is not valid UTF-8: {}", err),
                    });
                    continue;
                }
            };
            let location = detect_file_location(&input.name, document.line, text);
            self.decode_document(text, location, objects, errors);
        }
    }

    fn decode_document(
        &self,
        raw: &str,
        location: FileLocation,
        objects: &mut ParsedObjects,
        errors: &mut Vec<DocumentError>,
    ) {
        let type_meta: TypeMeta = match serde_yaml::from_str(raw) {
            Ok(type_meta) => type_meta,
            Err(err) => {
                errors.push(DocumentError {
                    location,
                    message: err.to_string(),
                });
                return;
            }
        };

        if type_meta.api_version == "v1" && type_meta.kind == "List" {
            self.decode_list(raw, location, objects, errors);
            return;
        }

        let Some(decode) = self.registry.get(&type_meta) else {
            log::debug!("Ignoring unknown kind {} at {}", type_meta, location);
            objects.add_ignored(IgnoredObject { type_meta, location });
            return;
        };

        match decode(raw) {
            Ok(mut k8s_object) => {
                log::debug!("Decoded {} {} at {}", type_meta, k8s_object.name(), location);
                k8s_object.set_type_meta(type_meta);
                let mut resource = Resource::new(location, k8s_object);
                resource.location.skip = skip_requested(&resource);
                objects.add_resource(resource);
            }
            Err(err) => errors.push(DocumentError {
                location,
                message: format!("Failed to parse {}: {}", type_meta, err),
            }),
        }
    }

    fn decode_list(
        &self,
        raw: &str,
        location: FileLocation,
        objects: &mut ParsedObjects,
        errors: &mut Vec<DocumentError>,
    ) {
        let list: ListEnvelope = match serde_yaml::from_str(raw) {
            Ok(list) => list,
            Err(err) => {
                errors.push(DocumentError {
                    location,
                    message: format!("Failed to parse v1/List: {}", err),
                });
                return;
            }
        };

        for item in list.items {
            match serde_yaml::to_string(&item) {
                Ok(item_raw) => self.decode_document(&item_raw, location.clone(), objects, errors),
                Err(err) => errors.push(DocumentError {
                    location: location.clone(),
                    message: format!("Failed to read List item: {}", err),
                }),
            }
        }
    }
}

/// Whether the object opts out of scoring through its skip annotation.
fn skip_requested(resource: &Resource) -> bool {
    let Some(value) = resource.object_meta().annotation(SKIP_ANNOTATION) else {
        return false;
    };
    match parse_yaml_bool(value) {
        Some(skip) => skip,
        None => {
            log::warn!(
                "Invalid value {:?} for annotation {} at {}, expected a boolean",
                value,
                SKIP_ANNOTATION,
                resource.location
            );
            false
        }
    }
}
