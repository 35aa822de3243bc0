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

use crate::error::RequestError;
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;
use std::io::{self, Write};

/// A type encoded as an XML request body
pub trait ToXml {
    /// Write `self` as a complete element
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;

    /// Encode `self` as a complete document
    fn to_xml(&self) -> Result<String, RequestError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .and_then(|_| self.write_xml(&mut writer))
            .map_err(|source| RequestError::XmlEncode { source })?;
        String::from_utf8(writer.into_inner()).map_err(|e| RequestError::XmlEncode {
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }
}

/// Write `<name>text</name>`, escaping `text`
pub fn write_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: impl Display,
) -> io::Result<()> {
    let text = text.to_string();
    writer
        .create_element(name)
        .write_text_content(BytesText::new(&text))?;
    Ok(())
}

/// Write `<name>text</name>` if `text` is present
pub fn write_optional_element<W: Write, T: Display>(
    writer: &mut Writer<W>,
    name: &str,
    text: Option<T>,
) -> io::Result<()> {
    match text {
        Some(text) => write_element(writer, name, text),
        None => Ok(()),
    }
}
