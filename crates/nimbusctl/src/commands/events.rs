//! Event subscription commands

use nimbus_core::{create_or_update_and_wait, delete_and_wait, EventSubscriptionId, Operation};

use crate::cli::{TopicScope, WaitArgs};
use crate::commands::{print_no_wait, progress_spinner};
use crate::connection::ConnectionManager;
use crate::error::{CtlError, Result};
use crate::output::{print_output, OutputFormat};
use crate::resources::events::{
    AdvancedFilter, DeadLetterDestination, DeliveryAttributeMapping, EventDestination,
    EventFilter, EventSubscription, EventSubscriptionProperties,
    StorageBlobDeadLetterProperties, StorageQueueProperties, WebHookProperties,
};

/// Arguments for building an event subscription payload
pub struct CreateArgs {
    pub webhook_endpoint: Option<String>,
    pub storage_queue: Option<String>,
    pub advanced_filters: Vec<String>,
    pub included_event_types: Vec<String>,
    pub subject_begins_with: Option<String>,
    pub subject_ends_with: Option<String>,
    pub delivery_attributes: Vec<String>,
    pub dead_letter_blob: Option<String>,
}

pub async fn create(
    conn: &ConnectionManager,
    profile: Option<&str>,
    name: String,
    scope: TopicScope,
    args: CreateArgs,
    wait: WaitArgs,
    format: OutputFormat,
) -> Result<()> {
    let ctx = conn.context(profile)?;
    let id = EventSubscriptionId::new(&ctx.subscription_id, &scope.resource_group, &scope.topic, &name);
    let path = id.to_string();

    let subscription = build_subscription(&args)?;
    let body = serde_json::to_value(&subscription)?;
    let options = ctx.poll_options(&wait);

    if wait.no_wait {
        let response = ctx.client.put(&path, &body).await?;
        let operation = Operation::from_response(ctx.client.resolve(&path)?, &response)?;
        print_no_wait(&operation);
        return Ok(());
    }

    let (pb, callback) = progress_spinner(&format!("Creating event subscription '{name}'"));
    let result = create_or_update_and_wait(&ctx.client, &path, &body, &options, Some(callback)).await;
    pb.finish_and_clear();

    print_output(result?, format)?;
    Ok(())
}

/// Assemble the wire payload from CLI arguments; discriminator-tagged
/// variants are decoded from their JSON forms here, so a bad
/// `operatorType` fails before anything is submitted
fn build_subscription(args: &CreateArgs) -> Result<EventSubscription> {
    let destination = match (&args.webhook_endpoint, &args.storage_queue) {
        (Some(endpoint), None) => {
            let delivery_attribute_mappings = parse_json_list::<DeliveryAttributeMapping>(
                &args.delivery_attributes,
                "delivery attribute",
            )?;
            EventDestination::WebHook {
                properties: WebHookProperties {
                    endpoint_url: Some(endpoint.clone()),
                    delivery_attribute_mappings: if delivery_attribute_mappings.is_empty() {
                        None
                    } else {
                        Some(delivery_attribute_mappings)
                    },
                },
            }
        }
        (None, Some(queue)) => {
            if !args.delivery_attributes.is_empty() {
                return Err(CtlError::InvalidInput {
                    message: "delivery attributes only apply to webhook destinations".to_string(),
                });
            }
            let (resource_id, queue_name) = split_target(queue, "QUEUE")?;
            EventDestination::StorageQueue {
                properties: StorageQueueProperties {
                    resource_id: Some(resource_id),
                    queue_name: Some(queue_name),
                },
            }
        }
        (None, None) => {
            return Err(CtlError::InvalidInput {
                message: "a destination is required: --webhook-endpoint or --storage-queue"
                    .to_string(),
            });
        }
        (Some(_), Some(_)) => unreachable!("clap forbids both destinations"),
    };

    let advanced_filters =
        parse_json_list::<AdvancedFilter>(&args.advanced_filters, "advanced filter")?;

    let filter = EventFilter {
        subject_begins_with: args.subject_begins_with.clone(),
        subject_ends_with: args.subject_ends_with.clone(),
        included_event_types: if args.included_event_types.is_empty() {
            None
        } else {
            Some(args.included_event_types.clone())
        },
        advanced_filters: if advanced_filters.is_empty() {
            None
        } else {
            Some(advanced_filters)
        },
    };
    let has_filter = filter != EventFilter::default();

    let dead_letter_destination = args
        .dead_letter_blob
        .as_deref()
        .map(|target| {
            let (resource_id, blob_container_name) = split_target(target, "CONTAINER")?;
            Ok::<_, CtlError>(DeadLetterDestination::StorageBlob {
                properties: StorageBlobDeadLetterProperties {
                    resource_id: Some(resource_id),
                    blob_container_name: Some(blob_container_name),
                },
            })
        })
        .transpose()?;

    Ok(EventSubscription {
        id: None,
        name: None,
        properties: EventSubscriptionProperties {
            destination: Some(destination),
            filter: has_filter.then_some(filter),
            dead_letter_destination,
            provisioning_state: None,
        },
    })
}

fn parse_json_list<T: serde::de::DeserializeOwned>(
    raw: &[String],
    what: &str,
) -> Result<Vec<T>> {
    raw.iter()
        .map(|json| {
            serde_json::from_str(json).map_err(|err| CtlError::InvalidInput {
                message: format!("invalid {what} {json:?}: {err}"),
            })
        })
        .collect()
}

/// Split `RESOURCE_ID:NAME` targets; resource IDs never contain ':' so the
/// last separator wins
fn split_target(raw: &str, what: &str) -> Result<(String, String)> {
    match raw.rsplit_once(':') {
        Some((resource_id, name)) if !resource_id.is_empty() && !name.is_empty() => {
            Ok((resource_id.to_string(), name.to_string()))
        }
        _ => Err(CtlError::InvalidInput {
            message: format!("expected RESOURCE_ID:{what}, got {raw:?}"),
        }),
    }
}

pub async fn show(
    conn: &ConnectionManager,
    profile: Option<&str>,
    name: String,
    scope: TopicScope,
    format: OutputFormat,
) -> Result<()> {
    let ctx = conn.context(profile)?;
    let id = EventSubscriptionId::new(&ctx.subscription_id, &scope.resource_group, &scope.topic, &name);

    let subscription: EventSubscription = ctx.client.get(&id.to_string()).await?.json()?;
    print_output(subscription, format)?;
    Ok(())
}

pub async fn delete(
    conn: &ConnectionManager,
    profile: Option<&str>,
    name: String,
    scope: TopicScope,
    wait: WaitArgs,
) -> Result<()> {
    let ctx = conn.context(profile)?;
    let id = EventSubscriptionId::new(&ctx.subscription_id, &scope.resource_group, &scope.topic, &name);
    let path = id.to_string();
    let options = ctx.poll_options(&wait);

    if wait.no_wait {
        let response = match ctx.client.delete(&path).await {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                println!("Event subscription '{name}' is already gone");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let operation = Operation::from_response(ctx.client.resolve(&path)?, &response)?;
        print_no_wait(&operation);
        return Ok(());
    }

    let (pb, callback) = progress_spinner(&format!("Deleting event subscription '{name}'"));
    let result = delete_and_wait(&ctx.client, &path, &options, Some(callback)).await;
    pb.finish_and_clear();
    result?;

    println!("Deleted event subscription '{name}'");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CreateArgs {
        CreateArgs {
            webhook_endpoint: Some("https://hooks.example/audit".to_string()),
            storage_queue: None,
            advanced_filters: vec![],
            included_event_types: vec![],
            subject_begins_with: None,
            subject_ends_with: None,
            delivery_attributes: vec![],
            dead_letter_blob: None,
        }
    }

    #[test]
    fn test_webhook_destination_with_filters() {
        let mut args = base_args();
        args.advanced_filters = vec![
            r#"{"operatorType":"StringContains","key":"subject","values":["audit"]}"#.to_string(),
        ];
        args.subject_begins_with = Some("/billing".to_string());

        let subscription = build_subscription(&args).unwrap();
        let value = serde_json::to_value(&subscription).unwrap();
        assert_eq!(
            value.pointer("/properties/destination/endpointType"),
            Some(&serde_json::json!("WebHook"))
        );
        assert_eq!(
            value.pointer("/properties/filter/advancedFilters/0/operatorType"),
            Some(&serde_json::json!("StringContains"))
        );
    }

    #[test]
    fn test_bad_filter_discriminator_is_rejected_before_submit() {
        let mut args = base_args();
        args.advanced_filters =
            vec![r#"{"operatorType":"NoSuchOperator","key":"x"}"#.to_string()];
        let err = build_subscription(&args).unwrap_err();
        assert!(err.to_string().contains("advanced filter"), "{err}");
    }

    #[test]
    fn test_storage_queue_target_parsing() {
        let mut args = base_args();
        args.webhook_endpoint = None;
        args.storage_queue = Some("/subscriptions/s/storage/acct:jobs".to_string());

        let subscription = build_subscription(&args).unwrap();
        match subscription.properties.destination.unwrap() {
            EventDestination::StorageQueue { properties } => {
                assert_eq!(
                    properties.resource_id.as_deref(),
                    Some("/subscriptions/s/storage/acct")
                );
                assert_eq!(properties.queue_name.as_deref(), Some("jobs"));
            }
            other => panic!("wrong destination: {other:?}"),
        }
    }

    #[test]
    fn test_missing_destination_is_an_error() {
        let mut args = base_args();
        args.webhook_endpoint = None;
        let err = build_subscription(&args).unwrap_err();
        assert!(err.to_string().contains("destination"), "{err}");
    }

    #[test]
    fn test_delivery_attributes_require_webhook() {
        let mut args = base_args();
        args.webhook_endpoint = None;
        args.storage_queue = Some("/subscriptions/s/storage/acct:jobs".to_string());
        args.delivery_attributes =
            vec![r#"{"type":"Static","name":"env","properties":{"value":"prod"}}"#.to_string()];
        assert!(build_subscription(&args).is_err());
    }

    #[test]
    fn test_empty_filter_is_omitted() {
        let subscription = build_subscription(&base_args()).unwrap();
        assert!(subscription.properties.filter.is_none());
    }
}
