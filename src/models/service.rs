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

use crate::error::DecodeError;
use crate::xml::{
    parse_value, walk, write_element, write_optional_element, FromXml, ToXml, Visit, XmlNode,
    XmlReader,
};
use quick_xml::Writer;
use std::io::{self, Write};

xml_tags! {
    enum ServiceTag {
        StorageServiceProperties => "StorageServiceProperties",
        HourMetrics => "HourMetrics",
        MinuteMetrics => "MinuteMetrics",
        Version => "Version",
        Enabled => "Enabled",
        IncludeApis => "IncludeAPIs",
        RetentionPolicy => "RetentionPolicy",
        Days => "Days",
        Cors => "Cors",
        CorsRule => "CorsRule",
        AllowedOrigins => "AllowedOrigins",
        AllowedMethods => "AllowedMethods",
        AllowedHeaders => "AllowedHeaders",
        ExposedHeaders => "ExposedHeaders",
        MaxAgeInSeconds => "MaxAgeInSeconds",
    }
}

/// How long metrics data is kept
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Whether old data is deleted
    pub enabled: bool,
    /// Days to keep data for, required when enabled
    pub days: Option<i32>,
}

/// Settings of an hourly or minute metrics collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    /// Storage analytics version
    pub version: String,
    /// Whether metrics are collected
    pub enabled: bool,
    /// Whether metrics include per-API statistics, only meaningful when enabled
    pub include_apis: Option<bool>,
    /// How long metrics are kept
    pub retention_policy: RetentionPolicy,
}

/// A cross-origin resource sharing rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsRule {
    /// Comma separated origins, or `*`
    pub allowed_origins: String,
    /// Comma separated HTTP methods
    pub allowed_methods: String,
    /// Comma separated request headers
    pub allowed_headers: String,
    /// Comma separated response headers exposed to the client
    pub exposed_headers: String,
    /// How long a preflight response may be cached
    pub max_age_in_seconds: i32,
}

/// Properties of a storage service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageServiceProperties {
    /// Hourly aggregated metrics
    pub hour_metrics: Metrics,
    /// Per-minute metrics
    pub minute_metrics: Metrics,
    /// CORS rules, in evaluation order
    pub cors: Vec<CorsRule>,
}

impl FromXml for RetentionPolicy {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut policy = Self::default();
        walk::<ServiceTag, _>(reader, |_, path, node| {
            if let XmlNode::Text(text) = node {
                match path.as_slice() {
                    [ServiceTag::Enabled] => policy.enabled = parse_value("Enabled", &text)?,
                    [ServiceTag::Days] => policy.days = Some(parse_value("Days", &text)?),
                    _ => {}
                }
            }
            Ok(Visit::Continue)
        })?;
        Ok(policy)
    }
}

impl FromXml for Metrics {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut metrics = Self::default();
        walk::<ServiceTag, _>(reader, |reader, path, node| {
            match (path.as_slice(), node) {
                ([ServiceTag::RetentionPolicy], XmlNode::StartTag(_)) => {
                    metrics.retention_policy = RetentionPolicy::from_xml(reader)?;
                    return Ok(Visit::Consumed);
                }
                ([ServiceTag::Version], XmlNode::Text(text)) => metrics.version = text,
                ([ServiceTag::Enabled], XmlNode::Text(text)) => {
                    metrics.enabled = parse_value("Enabled", &text)?
                }
                ([ServiceTag::IncludeApis], XmlNode::Text(text)) => {
                    metrics.include_apis = Some(parse_value("IncludeAPIs", &text)?)
                }
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(metrics)
    }
}

impl FromXml for CorsRule {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut rule = Self::default();
        walk::<ServiceTag, _>(reader, |_, path, node| {
            if let XmlNode::Text(text) = node {
                match path.as_slice() {
                    [ServiceTag::AllowedOrigins] => rule.allowed_origins = text,
                    [ServiceTag::AllowedMethods] => rule.allowed_methods = text,
                    [ServiceTag::AllowedHeaders] => rule.allowed_headers = text,
                    [ServiceTag::ExposedHeaders] => rule.exposed_headers = text,
                    [ServiceTag::MaxAgeInSeconds] => {
                        rule.max_age_in_seconds = parse_value("MaxAgeInSeconds", &text)?
                    }
                    _ => {}
                }
            }
            Ok(Visit::Continue)
        })?;
        Ok(rule)
    }
}

impl FromXml for StorageServiceProperties {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut properties = Self::default();
        walk::<ServiceTag, _>(reader, |reader, path, node| {
            if let XmlNode::StartTag(_) = node {
                match path.as_slice() {
                    [ServiceTag::StorageServiceProperties, ServiceTag::HourMetrics] => {
                        properties.hour_metrics = Metrics::from_xml(reader)?;
                        return Ok(Visit::Consumed);
                    }
                    [ServiceTag::StorageServiceProperties, ServiceTag::MinuteMetrics] => {
                        properties.minute_metrics = Metrics::from_xml(reader)?;
                        return Ok(Visit::Consumed);
                    }
                    [
                        ServiceTag::StorageServiceProperties,
                        ServiceTag::Cors,
                        ServiceTag::CorsRule,
                    ] => {
                        properties.cors.push(CorsRule::from_xml(reader)?);
                        return Ok(Visit::Consumed);
                    }
                    _ => {}
                }
            }
            Ok(Visit::Continue)
        })?;
        Ok(properties)
    }
}

impl Metrics {
    fn write<W: Write>(&self, name: &str, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element(name).write_inner_content(|writer| {
            write_element(writer, "Version", &self.version)?;
            write_element(writer, "Enabled", self.enabled)?;
            if self.enabled {
                write_optional_element(writer, "IncludeAPIs", self.include_apis)?;
            }
            let retention = &self.retention_policy;
            writer
                .create_element("RetentionPolicy")
                .write_inner_content(|writer| {
                    write_element(writer, "Enabled", retention.enabled)?;
                    if retention.enabled {
                        write_optional_element(writer, "Days", retention.days)?;
                    }
                    Ok(())
                })?;
            Ok(())
        })?;
        Ok(())
    }
}

impl ToXml for StorageServiceProperties {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("StorageServiceProperties")
            .write_inner_content(|writer| {
                self.hour_metrics.write("HourMetrics", writer)?;
                self.minute_metrics.write("MinuteMetrics", writer)?;
                writer.create_element("Cors").write_inner_content(|writer| {
                    for rule in &self.cors {
                        writer.create_element("CorsRule").write_inner_content(|writer| {
                            write_element(writer, "AllowedOrigins", &rule.allowed_origins)?;
                            write_element(writer, "AllowedMethods", &rule.allowed_methods)?;
                            write_element(writer, "AllowedHeaders", &rule.allowed_headers)?;
                            write_element(writer, "ExposedHeaders", &rule.exposed_headers)?;
                            write_element(writer, "MaxAgeInSeconds", rule.max_age_in_seconds)
                        })?;
                    }
                    Ok(())
                })?;
                Ok(())
            })?;
        Ok(())
    }
}
