// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use nop_gallery::app_state::AppState;
use nop_gallery::config::{ValidatedConfig, load_config, write_default_config};
use nop_gallery::runtime_paths::RuntimePaths;
use nop_gallery::{admin, public};
use std::path::PathBuf;
use std::sync::Arc;

struct ParsedArgs {
    runtime_root: PathBuf,
    help: bool,
}

fn parse_args() -> Result<ParsedArgs, String> {
    let mut runtime_root = PathBuf::from(".");
    let mut help = false;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-C" => {
                let value = args.next().ok_or("Missing value for -C")?;
                runtime_root = PathBuf::from(value);
            }
            "-h" | "--help" => help = true,
            other => return Err(format!("Unknown argument '{}'", other)),
        }
    }
    Ok(ParsedArgs { runtime_root, help })
}

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };
    if parsed_args.help {
        println!("nop-gallery [-C <runtime-root>]");
        println!("  -C <root>   runtime directory (config.yaml, state/, pages/)");
        return 0;
    }

    let runtime_paths = RuntimePaths::from_root(&parsed_args.runtime_root);
    if let Err(error) = runtime_paths.ensure_directories() {
        eprintln!("❌ Failed to create runtime directories: {}", error);
        return 1;
    }

    let raw_config = if runtime_paths.config_file.exists() {
        match load_config(&runtime_paths.config_file) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("❌ {}", error);
                return 1;
            }
        }
    } else {
        match write_default_config(&runtime_paths.config_file) {
            Ok(config) => {
                eprintln!(
                    "[bootstrap] created {} with a generated admin API key",
                    runtime_paths.config_file.display()
                );
                config
            }
            Err(error) => {
                eprintln!("❌ {}", error);
                return 1;
            }
        }
    };
    let config = match raw_config.validate() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("❌ {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    env_logger::Builder::new()
        .filter_level(config.log_level)
        .init();

    System::new().block_on(async { serve(config, runtime_paths).await })
}

async fn serve(config: ValidatedConfig, runtime_paths: RuntimePaths) -> i32 {
    let app_state = match AppState::build(&config, runtime_paths) {
        Ok(app_state) => web::Data::new(app_state),
        Err(error) => {
            log::error!("Failed to build application state: {}", error);
            return 1;
        }
    };
    let config = Arc::new(config);
    let config_data = web::Data::from(config.clone());
    let bind = (config.server.bind_address.clone(), config.server.port);
    let admin_path = config.admin.path.clone();

    log::info!(
        "Gallery module listening on {}:{} (admin at {})",
        bind.0,
        bind.1,
        admin_path
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .app_data(config_data.clone())
            .configure(|cfg| admin::configure(cfg, &admin_path))
            .configure(public::configure)
    })
    .bind(bind);

    match server {
        Ok(server) => match server.run().await {
            Ok(()) => 0,
            Err(error) => {
                log::error!("Server error: {}", error);
                1
            }
        },
        Err(error) => {
            log::error!("Failed to bind server: {}", error);
            1
        }
    }
}
