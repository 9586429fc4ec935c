//! # virtconfig
//!
//! Update IP address, hostname and /etc/hosts of an offline libvirt guest.
//!
//! ## Usage
//! ```bash
//! virtconfig [-i new_ipaddr] [-h new_hostname] [-c] domname
//! ```

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{debug, info};
use virtconfig::cli::Args;
use virtconfig::config::Config;
use virtconfig::{EditRequest, GuestNetEditor};
use virtconfig_hypervisor::{GuestfishSession, Hypervisor};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = parse_args();

    // Reject bad values before touching the hypervisor.
    let request = EditRequest::new(args.ipaddr.clone(), args.hostname.clone())?;

    let config = Config::resolve(&args)?;
    config.logging.init()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        domain = %args.domname,
        "Starting virtconfig"
    );

    if request.is_empty() {
        info!("No changes requested");
    }

    let hypervisor = connect_hypervisor(&config).await?;

    let guestfish = config.guestfs.guestfish_path.clone();
    let uri = config.hypervisor.libvirt_uri.clone();
    let editor = GuestNetEditor::open(hypervisor.as_ref(), &args.domname, &config.dialect, || async move {
        GuestfishSession::start(&guestfish, Some(uri.as_str())).await
    })
    .await?;

    editor.apply(&request).await?;

    if args.confirm {
        let current = editor.read_config().await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&current)?);
        } else {
            println!("{}", current);
        }
    }

    editor.close().await?;
    debug!("Done");
    Ok(())
}

/// Parse arguments; usage errors exit with status 1.
fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "libvirt")]
async fn connect_hypervisor(config: &Config) -> Result<Box<dyn Hypervisor>> {
    let backend = virtconfig_hypervisor::LibvirtBackend::new(&config.hypervisor.libvirt_uri).await?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "libvirt"))]
async fn connect_hypervisor(_config: &Config) -> Result<Box<dyn Hypervisor>> {
    anyhow::bail!("libvirt support not compiled in; rebuild with --features libvirt")
}
