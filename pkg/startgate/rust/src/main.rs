// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::Result;
use clap::Parser;
use dd_startgate::cli::Args;
use dd_startgate::logger::Logger;
use dd_startgate::signals::forward_termination_signals;
use log::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    Logger::new(args.log_level, args.log_file.as_deref())?.install()?;
    info!(
        "dd-startgate starting (version {})",
        env!("CARGO_PKG_VERSION")
    );

    let mut signals = forward_termination_signals()?;
    let config = args.into_run_config();

    let code = match dd_startgate::run(&config, &mut signals).await {
        Ok(outcome) => {
            let code = outcome.exit_code();
            info!("dd-startgate exiting with code {code}");
            code
        }
        Err(e) => {
            error!("run aborted: {e}");
            e.exit_code()
        }
    };

    log::logger().flush();
    // Dropping the runtime would wait on resolver lookups abandoned by connect timeouts.
    std::process::exit(code)
}
