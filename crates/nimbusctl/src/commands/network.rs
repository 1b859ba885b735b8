//! Virtual network peering commands
//!
//! Peerings are two-sided: the remote API links a pair of resources
//! non-atomically, and concurrent submissions against the family can corrupt
//! remote state. Every mutating command here therefore holds the
//! `network/peerings` family lock for the whole submit+poll sequence.
//!
//! Creation has one more wrinkle: a PUT can be rejected with
//! `ReferencedResourceNotProvisioned` while the underlying network (or the
//! other side of the pair) is still settling. The create path re-submits
//! through a target-state wait until the submission sticks.

use nimbus_core::{
    poll_until_done, CoreError, Operation, StateWait, VirtualNetworkId, VirtualNetworkPeeringId,
};
use serde_json::Value;
use tracing::debug;

use crate::cli::{PeeringAccessArgs, PeeringScope, WaitArgs};
use crate::commands::{print_no_wait, progress_spinner};
use crate::connection::ConnectionManager;
use crate::error::{CtlError, Result};
use crate::output::{print_output, OutputFormat};
use crate::resources::network::{PeeringProperties, SubResource, VirtualNetworkPeering};

/// Lock family for all peering mutations
const PEERING_LOCK_FAMILY: &str = "network/peerings";

fn peering_id(
    conn_subscription: &str,
    scope: &PeeringScope,
    name: &str,
) -> VirtualNetworkPeeringId {
    VirtualNetworkPeeringId::new(
        conn_subscription,
        &scope.resource_group,
        &scope.virtual_network,
        name,
    )
}

/// A 400 naming `ReferencedResourceNotProvisioned` means the referenced
/// network is not ready yet, not that the request is wrong; treat it as
/// pending and re-submit.
fn references_unprovisioned(err: &CoreError) -> bool {
    matches!(
        err,
        CoreError::Api { status: 400, code, message }
            if code.as_deref() == Some("ReferencedResourceNotProvisioned")
                || message.contains("ReferencedResourceNotProvisioned")
    )
}

pub async fn create(
    conn: &ConnectionManager,
    profile: Option<&str>,
    name: String,
    scope: PeeringScope,
    remote_network_id: String,
    access: PeeringAccessArgs,
    wait: WaitArgs,
    format: OutputFormat,
) -> Result<()> {
    let ctx = conn.context(profile)?;
    let id = peering_id(&ctx.subscription_id, &scope, &name);
    let path = id.to_string();

    // Strict parse: this is user input, not API echo.
    let remote_id = VirtualNetworkId::parse(&remote_network_id)?;

    match ctx.client.get(&path).await {
        Ok(_) => {
            return Err(CtlError::InvalidInput {
                message: format!(
                    "peering '{name}' already exists; use 'network peering update'"
                ),
            });
        }
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err.into()),
    }

    let peering = VirtualNetworkPeering {
        id: None,
        name: None,
        properties: PeeringProperties {
            allow_virtual_network_access: Some(access.allow_network_access.unwrap_or(true)),
            allow_forwarded_traffic: access.allow_forwarded_traffic,
            allow_gateway_transit: access.allow_gateway_transit,
            use_remote_gateways: access.use_remote_gateways,
            remote_virtual_network: Some(SubResource {
                id: remote_id.to_string(),
            }),
            peering_state: None,
            provisioning_state: None,
        },
    };
    let body = serde_json::to_value(&peering)?;

    // Hold the family lock across the whole submit+poll sequence.
    let _lock = conn.locks.acquire(PEERING_LOCK_FAMILY).await;
    let options = ctx.poll_options(&wait);
    let resource_url = ctx.client.resolve(&path)?;

    if wait.no_wait {
        let response = ctx.client.put(&path, &body).await?;
        let operation = Operation::from_response(resource_url, &response)?;
        print_no_wait(&operation);
        return Ok(());
    }

    let state_wait = StateWait {
        pending: vec!["Pending".to_string()],
        target: vec!["Succeeded".to_string()],
        min_interval: options.interval,
        timeout: options.timeout,
    };

    let client = &ctx.client;
    let body_ref = &body;
    let path_ref = path.as_str();
    let resource_url_ref = &resource_url;
    state_wait
        .wait_for_state(move || async move {
            match client.put(path_ref, body_ref).await {
                Ok(response) => {
                    let operation =
                        Operation::from_response(resource_url_ref.clone(), &response)?;
                    poll_until_done(client, operation, &options, None).await?;
                    Ok(((), "Succeeded".to_string()))
                }
                Err(err) if err.is_retryable() || references_unprovisioned(&err) => {
                    debug!(error = %err, "peering submission not ready, will retry");
                    Ok(((), "Pending".to_string()))
                }
                Err(err) => Err(err),
            }
        })
        .await?;

    let settled: Value = ctx.client.get(&path).await?.json()?;
    print_output(settled, format)?;
    Ok(())
}

pub async fn update(
    conn: &ConnectionManager,
    profile: Option<&str>,
    name: String,
    scope: PeeringScope,
    access: PeeringAccessArgs,
    wait: WaitArgs,
    format: OutputFormat,
) -> Result<()> {
    let ctx = conn.context(profile)?;
    let id = peering_id(&ctx.subscription_id, &scope, &name);
    let path = id.to_string();

    let existing: VirtualNetworkPeering = ctx.client.get(&path).await?.json()?;

    let mut properties = existing.properties;
    if let Some(value) = access.allow_network_access {
        properties.allow_virtual_network_access = Some(value);
    }
    if let Some(value) = access.allow_forwarded_traffic {
        properties.allow_forwarded_traffic = Some(value);
    }
    if let Some(value) = access.allow_gateway_transit {
        properties.allow_gateway_transit = Some(value);
    }
    if let Some(value) = access.use_remote_gateways {
        properties.use_remote_gateways = Some(value);
    }
    // Computed fields are the server's to set.
    properties.peering_state = None;
    properties.provisioning_state = None;

    let body = serde_json::to_value(&VirtualNetworkPeering {
        id: None,
        name: None,
        properties,
    })?;

    let _lock = conn.locks.acquire(PEERING_LOCK_FAMILY).await;
    let options = ctx.poll_options(&wait);
    let resource_url = ctx.client.resolve(&path)?;

    let response = ctx.client.put(&path, &body).await?;
    let operation = Operation::from_response(resource_url, &response)?;
    if wait.no_wait {
        print_no_wait(&operation);
        return Ok(());
    }
    poll_until_done(&ctx.client, operation, &options, None).await?;

    let settled: Value = ctx.client.get(&path).await?.json()?;
    print_output(settled, format)?;
    Ok(())
}

pub async fn show(
    conn: &ConnectionManager,
    profile: Option<&str>,
    name: String,
    scope: PeeringScope,
    format: OutputFormat,
) -> Result<()> {
    let ctx = conn.context(profile)?;
    let id = peering_id(&ctx.subscription_id, &scope, &name);

    let mut peering: VirtualNetworkPeering = ctx.client.get(&id.to_string()).await?.json()?;

    // The API echoes identifiers with whatever casing it likes; normalize
    // before showing them.
    if let Some(remote) = peering.properties.remote_virtual_network.as_mut() {
        remote.id = VirtualNetworkId::parse_insensitively(&remote.id)?.to_string();
    }

    print_output(peering, format)?;
    Ok(())
}

pub async fn delete(
    conn: &ConnectionManager,
    profile: Option<&str>,
    name: String,
    scope: PeeringScope,
    wait: WaitArgs,
) -> Result<()> {
    let ctx = conn.context(profile)?;
    let id = peering_id(&ctx.subscription_id, &scope, &name);
    let path = id.to_string();

    let _lock = conn.locks.acquire(PEERING_LOCK_FAMILY).await;
    let options = ctx.poll_options(&wait);

    if wait.no_wait {
        let response = match ctx.client.delete(&path).await {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                println!("Peering '{name}' is already gone");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let operation = Operation::from_response(ctx.client.resolve(&path)?, &response)?;
        print_no_wait(&operation);
        return Ok(());
    }

    let (pb, callback) = progress_spinner(&format!("Deleting peering '{name}'"));
    let result =
        nimbus_core::delete_and_wait(&ctx.client, &path, &options, Some(callback)).await;
    pb.finish_and_clear();
    result?;

    println!("Deleted peering '{name}'");
    Ok(())
}
