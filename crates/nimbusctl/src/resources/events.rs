//! Event subscription wire models
//!
//! The filter, destination and mapping types are polymorphic on the wire: a
//! discriminator field names the variant and the remaining fields depend on
//! it. They are modelled as internally-tagged enums, so encoding always
//! injects the discriminator and decoding dispatches on it.

use serde::{Deserialize, Serialize};

/// An event subscription on a topic
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: EventSubscriptionProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubscriptionProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<EventDestination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<EventFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_letter_destination: Option<DeadLetterDestination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// Where matching events are delivered, discriminated by `endpointType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "endpointType")]
pub enum EventDestination {
    WebHook {
        properties: WebHookProperties,
    },
    StorageQueue {
        properties: StorageQueueProperties,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebHookProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_attribute_mappings: Option<Vec<DeliveryAttributeMapping>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageQueueProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_name: Option<String>,
}

/// Where undeliverable events land, discriminated by `endpointType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "endpointType")]
pub enum DeadLetterDestination {
    StorageBlob {
        properties: StorageBlobDeadLetterProperties,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageBlobDeadLetterProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_container_name: Option<String>,
}

/// Attributes attached to delivered events, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeliveryAttributeMapping {
    Static {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        properties: StaticDeliveryAttributeProperties,
    },
    Dynamic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        properties: DynamicDeliveryAttributeProperties,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticDeliveryAttributeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_secret: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicDeliveryAttributeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,
}

/// Which events a subscription receives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_begins_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_ends_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_event_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_filters: Option<Vec<AdvancedFilter>>,
}

/// Per-field filter conditions, discriminated by `operatorType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operatorType")]
pub enum AdvancedFilter {
    StringContains {
        key: String,
        values: Vec<String>,
    },
    StringBeginsWith {
        key: String,
        values: Vec<String>,
    },
    NumberGreaterThan {
        key: String,
        value: f64,
    },
    NumberInRange {
        key: String,
        values: Vec<[f64; 2]>,
    },
    IsNotNull {
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encoding_injects_the_discriminator() {
        let filter = AdvancedFilter::StringContains {
            key: "subject".to_string(),
            values: vec!["audit".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"operatorType": "StringContains", "key": "subject", "values": ["audit"]})
        );

        let mapping = DeliveryAttributeMapping::Static {
            name: Some("env".to_string()),
            properties: StaticDeliveryAttributeProperties {
                value: Some("prod".to_string()),
                is_secret: Some(false),
            },
        };
        assert_eq!(
            serde_json::to_value(&mapping).unwrap(),
            json!({"type": "Static", "name": "env", "properties": {"value": "prod", "isSecret": false}})
        );
    }

    #[test]
    fn test_decoding_dispatches_on_the_discriminator() {
        let decoded: AdvancedFilter = serde_json::from_value(json!({
            "operatorType": "NumberGreaterThan",
            "key": "data.size",
            "value": 10.5
        }))
        .unwrap();
        assert_eq!(
            decoded,
            AdvancedFilter::NumberGreaterThan {
                key: "data.size".to_string(),
                value: 10.5
            }
        );

        let destination: EventDestination = serde_json::from_value(json!({
            "endpointType": "StorageQueue",
            "properties": {"resourceId": "/subscriptions/s/storage/acct", "queueName": "q1"}
        }))
        .unwrap();
        match destination {
            EventDestination::StorageQueue { properties } => {
                assert_eq!(properties.queue_name.as_deref(), Some("q1"));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_discriminator_is_an_error() {
        let result: Result<AdvancedFilter, _> = serde_json::from_value(json!({
            "operatorType": "BoolEquals",
            "key": "data.flag",
            "value": true
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_number_in_range_uses_pairs() {
        let decoded: AdvancedFilter = serde_json::from_value(json!({
            "operatorType": "NumberInRange",
            "key": "data.size",
            "values": [[1.0, 5.0], [10.0, 20.0]]
        }))
        .unwrap();
        match decoded {
            AdvancedFilter::NumberInRange { values, .. } => assert_eq!(values.len(), 2),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_subscription_round_trips_with_nested_variants() {
        let subscription = EventSubscription {
            id: None,
            name: Some("audit".to_string()),
            properties: EventSubscriptionProperties {
                destination: Some(EventDestination::WebHook {
                    properties: WebHookProperties {
                        endpoint_url: Some("https://hooks.example/audit".to_string()),
                        delivery_attribute_mappings: Some(vec![
                            DeliveryAttributeMapping::Dynamic {
                                name: Some("source".to_string()),
                                properties: DynamicDeliveryAttributeProperties {
                                    source_field: Some("data.origin".to_string()),
                                },
                            },
                        ]),
                    },
                }),
                filter: Some(EventFilter {
                    subject_begins_with: Some("/billing".to_string()),
                    advanced_filters: Some(vec![AdvancedFilter::IsNotNull {
                        key: "data.amount".to_string(),
                    }]),
                    ..Default::default()
                }),
                dead_letter_destination: None,
                provisioning_state: None,
            },
        };

        let value = serde_json::to_value(&subscription).unwrap();
        assert_eq!(
            value.pointer("/properties/destination/endpointType"),
            Some(&json!("WebHook"))
        );
        assert_eq!(
            value.pointer("/properties/filter/advancedFilters/0/operatorType"),
            Some(&json!("IsNotNull"))
        );

        let back: EventSubscription = serde_json::from_value(value).unwrap();
        assert_eq!(back.name.as_deref(), Some("audit"));
    }
}
