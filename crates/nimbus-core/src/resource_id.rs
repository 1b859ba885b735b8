//! Typed resource IDs
//!
//! Resource Manager identifiers are segment-based paths of the form
//! `/subscriptions/{id}/resourceGroups/{group}/providers/{namespace}/{type}/{name}`.
//! Each resource family gets a typed ID with `new`/`parse`/
//! `parse_insensitively` and a canonical `Display`. The insensitive parsers
//! exist because the API does not guarantee casing on identifiers it
//! returns; they should only be used on response data, never on user input.

use std::fmt;

use crate::error::{CoreError, Result};

const NETWORK_NAMESPACE: &str = "Nimbus.Network";
const EVENTS_NAMESPACE: &str = "Nimbus.Events";

/// Walks the `/`-separated segments of a resource ID, consuming fixed
/// literals and named values in order
struct SegmentParser<'a> {
    input: &'a str,
    segments: Vec<&'a str>,
    position: usize,
    insensitive: bool,
}

impl<'a> SegmentParser<'a> {
    fn new(input: &'a str, insensitive: bool) -> Result<Self> {
        let trimmed = input.strip_prefix('/').unwrap_or(input);
        if trimmed.is_empty() {
            return Err(invalid(input, "id was empty"));
        }
        Ok(Self {
            input,
            segments: trimmed.split('/').collect(),
            position: 0,
            insensitive,
        })
    }

    fn next(&mut self, describing: &str) -> Result<&'a str> {
        let segment = self.segments.get(self.position).copied().ok_or_else(|| {
            invalid(
                self.input,
                &format!("the segment {describing:?} was not found"),
            )
        })?;
        self.position += 1;
        if segment.is_empty() {
            return Err(invalid(
                self.input,
                &format!("the segment {describing:?} was empty"),
            ));
        }
        Ok(segment)
    }

    /// Consume a fixed segment such as `resourceGroups`
    fn literal(&mut self, expected: &str) -> Result<()> {
        let found = self.next(expected)?;
        let matches = if self.insensitive {
            found.eq_ignore_ascii_case(expected)
        } else {
            found == expected
        };
        if !matches {
            return Err(invalid(
                self.input,
                &format!("expected the segment {expected:?} but found {found:?}"),
            ));
        }
        Ok(())
    }

    /// Consume a user-supplied value segment, preserved byte-for-byte
    fn value(&mut self, describing: &str) -> Result<String> {
        Ok(self.next(describing)?.to_string())
    }

    fn finish(self) -> Result<()> {
        if self.position != self.segments.len() {
            return Err(invalid(
                self.input,
                &format!(
                    "unexpected trailing segment {:?}",
                    self.segments[self.position]
                ),
            ));
        }
        Ok(())
    }
}

fn invalid(input: &str, reason: &str) -> CoreError {
    CoreError::InvalidResourceId {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

/// ID for a virtual network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNetworkId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl VirtualNetworkId {
    pub fn new(subscription_id: &str, resource_group: &str, name: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            name: name.to_string(),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, false)
    }

    /// Parse tolerating any casing of the fixed segments; for API response
    /// data only
    pub fn parse_insensitively(input: &str) -> Result<Self> {
        Self::parse_with(input, true)
    }

    fn parse_with(input: &str, insensitive: bool) -> Result<Self> {
        let mut parser = SegmentParser::new(input, insensitive)?;
        parser.literal("subscriptions")?;
        let subscription_id = parser.value("subscriptionId")?;
        parser.literal("resourceGroups")?;
        let resource_group = parser.value("resourceGroup")?;
        parser.literal("providers")?;
        parser.literal(NETWORK_NAMESPACE)?;
        parser.literal("virtualNetworks")?;
        let name = parser.value("virtualNetworkName")?;
        parser.finish()?;
        Ok(Self {
            subscription_id,
            resource_group,
            name,
        })
    }
}

impl fmt::Display for VirtualNetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/virtualNetworks/{}",
            self.subscription_id, self.resource_group, NETWORK_NAMESPACE, self.name
        )
    }
}

/// ID for a peering between two virtual networks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNetworkPeeringId {
    pub subscription_id: String,
    pub resource_group: String,
    pub virtual_network_name: String,
    pub name: String,
}

impl VirtualNetworkPeeringId {
    pub fn new(
        subscription_id: &str,
        resource_group: &str,
        virtual_network_name: &str,
        name: &str,
    ) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            virtual_network_name: virtual_network_name.to_string(),
            name: name.to_string(),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, false)
    }

    pub fn parse_insensitively(input: &str) -> Result<Self> {
        Self::parse_with(input, true)
    }

    fn parse_with(input: &str, insensitive: bool) -> Result<Self> {
        let mut parser = SegmentParser::new(input, insensitive)?;
        parser.literal("subscriptions")?;
        let subscription_id = parser.value("subscriptionId")?;
        parser.literal("resourceGroups")?;
        let resource_group = parser.value("resourceGroup")?;
        parser.literal("providers")?;
        parser.literal(NETWORK_NAMESPACE)?;
        parser.literal("virtualNetworks")?;
        let virtual_network_name = parser.value("virtualNetworkName")?;
        parser.literal("peerings")?;
        let name = parser.value("peeringName")?;
        parser.finish()?;
        Ok(Self {
            subscription_id,
            resource_group,
            virtual_network_name,
            name,
        })
    }

    /// ID of the parent virtual network
    pub fn virtual_network_id(&self) -> VirtualNetworkId {
        VirtualNetworkId::new(
            &self.subscription_id,
            &self.resource_group,
            &self.virtual_network_name,
        )
    }
}

impl fmt::Display for VirtualNetworkPeeringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/peerings/{}",
            self.virtual_network_id(),
            self.name
        )
    }
}

/// ID for an event topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl TopicId {
    pub fn new(subscription_id: &str, resource_group: &str, name: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            name: name.to_string(),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, false)
    }

    pub fn parse_insensitively(input: &str) -> Result<Self> {
        Self::parse_with(input, true)
    }

    fn parse_with(input: &str, insensitive: bool) -> Result<Self> {
        let mut parser = SegmentParser::new(input, insensitive)?;
        parser.literal("subscriptions")?;
        let subscription_id = parser.value("subscriptionId")?;
        parser.literal("resourceGroups")?;
        let resource_group = parser.value("resourceGroup")?;
        parser.literal("providers")?;
        parser.literal(EVENTS_NAMESPACE)?;
        parser.literal("topics")?;
        let name = parser.value("topicName")?;
        parser.finish()?;
        Ok(Self {
            subscription_id,
            resource_group,
            name,
        })
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/topics/{}",
            self.subscription_id, self.resource_group, EVENTS_NAMESPACE, self.name
        )
    }
}

/// ID for an event subscription on a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSubscriptionId {
    pub subscription_id: String,
    pub resource_group: String,
    pub topic_name: String,
    pub name: String,
}

impl EventSubscriptionId {
    pub fn new(subscription_id: &str, resource_group: &str, topic_name: &str, name: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            topic_name: topic_name.to_string(),
            name: name.to_string(),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, false)
    }

    pub fn parse_insensitively(input: &str) -> Result<Self> {
        Self::parse_with(input, true)
    }

    fn parse_with(input: &str, insensitive: bool) -> Result<Self> {
        let mut parser = SegmentParser::new(input, insensitive)?;
        parser.literal("subscriptions")?;
        let subscription_id = parser.value("subscriptionId")?;
        parser.literal("resourceGroups")?;
        let resource_group = parser.value("resourceGroup")?;
        parser.literal("providers")?;
        parser.literal(EVENTS_NAMESPACE)?;
        parser.literal("topics")?;
        let topic_name = parser.value("topicName")?;
        parser.literal("eventSubscriptions")?;
        let name = parser.value("eventSubscriptionName")?;
        parser.finish()?;
        Ok(Self {
            subscription_id,
            resource_group,
            topic_name,
            name,
        })
    }

    pub fn topic_id(&self) -> TopicId {
        TopicId::new(&self.subscription_id, &self.resource_group, &self.topic_name)
    }
}

impl fmt::Display for EventSubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/eventSubscriptions/{}", self.topic_id(), self.name)
    }
}
