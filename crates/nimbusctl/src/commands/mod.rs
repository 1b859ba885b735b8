//! Command implementations

pub mod events;
pub mod network;
pub mod operation;
pub mod profile;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use nimbus_core::{Operation, ProgressCallback, ProgressEvent};

/// Spinner wired to poller progress events
pub fn progress_spinner(message: &str) -> (ProgressBar, ProgressCallback) {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(message.to_string());

    let pb_clone = pb.clone();
    let base = message.to_string();
    let callback: ProgressCallback = Box::new(move |event| match event {
        ProgressEvent::Started { .. } => {}
        ProgressEvent::Polling { status, .. } => {
            pb_clone.set_message(format!("{base}: {status}"));
        }
        ProgressEvent::Completed { .. } => {
            pb_clone.set_message(format!("{base}: done"));
        }
        ProgressEvent::Failed { error } => {
            pb_clone.set_message(format!("{base}: {error}"));
        }
    });

    (pb, callback)
}

/// Report an operation a `--no-wait` invocation left running
pub fn print_no_wait(operation: &Operation) {
    if operation.is_terminal() {
        println!("Operation completed synchronously.");
        return;
    }
    match operation.poll_url() {
        Some(url) => {
            println!("Operation accepted.");
            println!("To wait for completion, run: nimbusctl operation wait {url}");
        }
        None => println!("Operation accepted."),
    }
}
