// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Streaming XML decoding and encoding
//!
//! Response bodies are decoded without building a document tree. An [`XmlReader`]
//! yields a flat sequence of [`XmlNode`]s and each response type implements
//! [`FromXml`] by tracking the current element path in a [`TagPath`] and
//! assigning text only when the path matches one of its fields exactly.
//!
//! ```
//! # use azure_storage_rest::xml::{from_slice, FromXml, TagPath, XmlNode, XmlReader, XmlTag};
//! # use azure_storage_rest::DecodeError;
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Tag { Share, Name, Unknown }
//!
//! impl XmlTag for Tag {
//!     fn classify(name: &str) -> Self {
//!         match name {
//!             "Share" => Self::Share,
//!             "Name" => Self::Name,
//!             _ => Self::Unknown,
//!         }
//!     }
//! }
//!
//! #[derive(Debug, Default)]
//! struct Share { name: String }
//!
//! impl FromXml for Share {
//!     fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
//!         let mut share = Self::default();
//!         let mut path = TagPath::<Tag>::new();
//!         loop {
//!             match reader.read()? {
//!                 XmlNode::StartTag(name) => path.push_name(&name),
//!                 XmlNode::EndTag => if !path.pop() { break },
//!                 XmlNode::Text(text) if path.is(&[Tag::Share, Tag::Name]) => share.name = text,
//!                 XmlNode::End => { path.finish()?; break }
//!                 _ => {}
//!             }
//!         }
//!         Ok(share)
//!     }
//! }
//!
//! let share: Share = from_slice(b"<Share><Other>x</Other><Name>logs</Name></Share>").unwrap();
//! assert_eq!(share.name, "logs");
//! ```

use crate::error::DecodeError;
use crate::models::Metadata;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::VecDeque;
use std::fmt::Display;
use std::str::FromStr;

mod writer;
pub use writer::{write_element, write_optional_element, ToXml};

/// Declares a tag enumeration implementing [`XmlTag`]
///
/// An `Unknown` variant is added for every tag not listed.
macro_rules! xml_tags {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident => $tag:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $($variant,)*
            Unknown,
        }

        impl $crate::xml::XmlTag for $name {
            fn classify(name: &str) -> Self {
                match name {
                    $($tag => Self::$variant,)*
                    _ => Self::Unknown,
                }
            }
        }
    };
}

/// A node yielded by an [`XmlReader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// The start of an element
    StartTag(String),
    /// The end of the most recently started element
    EndTag,
    /// Text content, exactly as written
    ///
    /// Whitespace-only text between elements is skipped.
    Text(String),
    /// An attribute of the most recently started element
    Attribute {
        /// Attribute name
        name: String,
        /// Unescaped attribute value
        value: String,
    },
    /// The end of the document
    End,
}

/// A forward-only reader of [`XmlNode`]
///
/// Self-closing elements yield a [`XmlNode::StartTag`] followed by their attributes
/// and an [`XmlNode::EndTag`]. Declarations, comments and processing instructions are
/// skipped. Once [`XmlNode::End`] has been returned it is returned forever.
pub struct XmlReader<'a> {
    reader: Reader<&'a [u8]>,
    pending: VecDeque<XmlNode>,
    after_start: bool,
    done: bool,
}

impl std::fmt::Debug for XmlReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlReader")
            .field("position", &self.reader.buffer_position())
            .field("pending", &self.pending)
            .field("done", &self.done)
            .finish()
    }
}

fn xml_error(e: impl Display) -> DecodeError {
    DecodeError::Xml {
        message: e.to_string(),
    }
}

fn utf8(bytes: &[u8]) -> Result<String, DecodeError> {
    std::str::from_utf8(bytes)
        .map(ToString::to_string)
        .map_err(xml_error)
}

impl<'a> XmlReader<'a> {
    /// Create a reader over an in-memory document
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            reader: Reader::from_reader(input),
            pending: VecDeque::new(),
            after_start: false,
            done: false,
        }
    }

    /// Returns the next node of the document
    pub fn read(&mut self) -> Result<XmlNode, DecodeError> {
        if let Some(node) = self.pending.pop_front() {
            return Ok(node);
        }
        if self.done {
            return Ok(XmlNode::End);
        }

        loop {
            let event = self.reader.read_event().map_err(xml_error)?;
            if let Some(node) = self.node(event)? {
                return Ok(node);
            }
        }
    }

    /// Convert `event` into a node, returning `None` for skipped events
    fn node(&mut self, event: Event<'a>) -> Result<Option<XmlNode>, DecodeError> {
        let after_start =
            std::mem::replace(&mut self.after_start, matches!(event, Event::Start(_)));
        Ok(match event {
            Event::Start(e) => Some(XmlNode::StartTag(self.start(&e)?)),
            Event::Empty(e) => {
                let name = self.start(&e)?;
                self.pending.push_back(XmlNode::EndTag);
                Some(XmlNode::StartTag(name))
            }
            Event::End(_) => Some(XmlNode::EndTag),
            Event::Text(e) => {
                let text = e.unescape().map_err(xml_error)?.into_owned();
                if text.is_empty() {
                    None
                } else if !text.chars().all(char::is_whitespace) {
                    Some(XmlNode::Text(text))
                } else if !after_start {
                    None
                } else {
                    // Whitespace is content only when it is all an element holds
                    match self.reader.read_event().map_err(xml_error)? {
                        Event::End(_) => {
                            self.pending.push_back(XmlNode::EndTag);
                            Some(XmlNode::Text(text))
                        }
                        next => self.node(next)?,
                    }
                }
            }
            Event::CData(e) => Some(XmlNode::Text(utf8(&e.into_inner())?)),
            Event::Eof => {
                self.done = true;
                Some(XmlNode::End)
            }
            _ => None,
        })
    }

    /// Queue the attributes of `e` and return its name
    fn start(&mut self, e: &BytesStart<'_>) -> Result<String, DecodeError> {
        for attr in e.attributes() {
            let attr = attr.map_err(xml_error)?;
            let name = utf8(attr.key.as_ref())?;
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            self.pending.push_back(XmlNode::Attribute { name, value });
        }
        utf8(e.name().as_ref())
    }
}

/// A tag enumeration of one response schema
///
/// Usually declared with the `xml_tags!` macro.
pub trait XmlTag: Copy + PartialEq + std::fmt::Debug {
    /// Map an element name to a tag, returning the unknown marker for unlisted names
    fn classify(name: &str) -> Self;
}

/// The path from the root of a (sub-)document to the current element
#[derive(Debug, Clone)]
pub struct TagPath<T> {
    stack: Vec<T>,
}

impl<T: XmlTag> Default for TagPath<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: XmlTag> TagPath<T> {
    /// Create an empty path
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(8),
        }
    }

    /// Enter an element
    pub fn push(&mut self, tag: T) {
        self.stack.push(tag)
    }

    /// Enter an element by name
    pub fn push_name(&mut self, name: &str) {
        self.push(T::classify(name))
    }

    /// Leave the current element
    ///
    /// Returns false if the path was already empty, i.e. the end tag closes the
    /// element enclosing this sub-document.
    pub fn pop(&mut self) -> bool {
        self.stack.pop().is_some()
    }

    /// Returns true if the path equals `path` exactly
    pub fn is(&self, path: &[T]) -> bool {
        self.stack == path
    }

    /// The open elements, outermost first
    pub fn as_slice(&self) -> &[T] {
        &self.stack
    }

    /// The number of open elements
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if no element is open
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Check the document ended with every element closed
    pub fn finish(&self) -> Result<(), DecodeError> {
        match self.stack.len() {
            0 => Ok(()),
            depth => Err(DecodeError::UnexpectedEnd { depth }),
        }
    }
}

/// A type decoded from an XML (sub-)document
///
/// Implementations consume nodes until the end tag that closes the element
/// enclosing them, or until the end of the document.
pub trait FromXml: Sized {
    /// Decode `Self` from `reader`
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError>;
}

/// What a [`walk`] visitor did with a start tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Keep walking into the element
    Continue,
    /// The visitor decoded the element with a nested decoder, including its end tag
    Consumed,
}

/// Walk a (sub-)document, handing every node to `visit` along with the current path
///
/// Start tags are pushed before `visit` sees them. If `visit` returns
/// [`Visit::Consumed`] for a start tag the element is popped again, as its end tag
/// was read by a nested decoder. Returns once the end tag enclosing the sub-document
/// is read, or at the end of the document, failing if elements are still open.
pub fn walk<T, F>(reader: &mut XmlReader<'_>, mut visit: F) -> Result<(), DecodeError>
where
    T: XmlTag,
    F: FnMut(&mut XmlReader<'_>, &TagPath<T>, XmlNode) -> Result<Visit, DecodeError>,
{
    let mut path = TagPath::new();
    loop {
        match reader.read()? {
            XmlNode::StartTag(name) => {
                path.push_name(&name);
                if visit(reader, &path, XmlNode::StartTag(name))? == Visit::Consumed {
                    path.pop();
                }
            }
            XmlNode::EndTag => {
                if !path.pop() {
                    return Ok(());
                }
            }
            XmlNode::End => return path.finish(),
            node => {
                visit(reader, &path, node)?;
            }
        }
    }
}

/// Decode a response body
///
/// An empty or whitespace-only body decodes to the default value.
pub fn from_slice<T: FromXml + Default>(body: &[u8]) -> Result<T, DecodeError> {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    T::from_xml(&mut XmlReader::new(body))
}

/// Parse element text into `T`
pub fn parse_value<T>(field: &'static str, text: &str) -> Result<T, DecodeError>
where
    T: FromStr,
    T::Err: Display,
{
    text.trim().parse().map_err(|e: T::Err| DecodeError::InvalidValue {
        field,
        value: text.to_string(),
        message: e.to_string(),
    })
}

/// Parse an RFC 1123 date, falling back to RFC 3339
pub fn parse_datetime(field: &'static str, text: &str) -> Result<DateTime<Utc>, DecodeError> {
    let trimmed = text.trim();
    DateTime::parse_from_rfc2822(trimmed)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| DecodeError::InvalidValue {
            field,
            value: text.to_string(),
            message: e.to_string(),
        })
}

/// Decode the children of a `<Metadata>` element
///
/// Must be called right after the `<Metadata>` start tag. Consumes nodes up to and
/// including the matching end tag. An element without text maps to an empty value.
pub fn read_metadata(reader: &mut XmlReader<'_>) -> Result<Metadata, DecodeError> {
    let mut metadata = Metadata::new();
    let mut key: Option<String> = None;
    let mut depth = 0usize;
    loop {
        match reader.read()? {
            XmlNode::StartTag(name) => {
                if depth == 0 {
                    metadata.insert(name.clone(), String::new());
                    key = Some(name);
                }
                depth += 1;
            }
            XmlNode::Text(text) => {
                if depth == 1 {
                    if let Some(key) = &key {
                        metadata.insert(key.clone(), text);
                    }
                }
            }
            XmlNode::EndTag => {
                if depth == 0 {
                    return Ok(metadata);
                }
                depth -= 1;
            }
            XmlNode::Attribute { .. } => {}
            XmlNode::End => return Err(DecodeError::UnexpectedEnd { depth: depth + 1 }),
        }
    }
}
