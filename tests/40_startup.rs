use std::process::Command;

use anyhow::Result;

/// Startup builds the host pool before binding, so a deployment with no
/// host settings must exit nonzero and name the variable it is missing
/// instead of serving requests it can never route.
#[test]
fn startup_refuses_without_host_configuration() -> Result<()> {
    let binary = std::env::current_dir()?.join("target/debug/leafpos-api");

    // Run from a scratch directory so a developer's .env cannot supply the
    // settings this test strips.
    let output = Command::new(binary)
        .current_dir(std::env::temp_dir())
        .env_remove("HOST_ENDPOINT_URL")
        .env_remove("HOST_ACCESS_KEY")
        .output()?;

    assert_eq!(output.status.code(), Some(1));

    let logs = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(
        logs.contains("HOST_ENDPOINT_URL"),
        "startup logs should name the missing variable: {}",
        logs
    );

    Ok(())
}
