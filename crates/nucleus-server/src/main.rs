// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Nucleus user management server binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nucleus_server::seed::ADMIN_PASSWORD_ENV;
use nucleus_server::{seed, UserServices};
use nucleus_server_auth::UserId;
use nucleus_server_users::UserListInput;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Nucleus server - administrative user management.
#[derive(Parser, Debug)]
#[command(name = "nucleus-server", about = "Nucleus user management", version)]
struct Args {
	/// Config file to use instead of /etc/nucleus/server.toml
	#[arg(long, env = "NUCLEUS_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Apply database migrations
	Migrate,
	/// Create default permissions, roles and system accounts
	Seed,
	/// Inspect and manage users
	Users {
		#[command(subcommand)]
		command: UsersCommand,
	},
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
	/// List users as JSON
	List {
		#[arg(long)]
		filter: Option<String>,
		/// `username`, `email` or `createdAt`, optionally followed by `asc`/`desc`
		#[arg(long)]
		sort: Option<String>,
		/// Zero-based page number
		#[arg(long, default_value_t = 0)]
		page: u32,
		#[arg(long, default_value_t = 0)]
		page_size: u32,
	},
	/// Show a user with its granted roles and the role catalogue
	Show { id: UserId },
	/// Remove a user
	Remove { id: UserId },
	/// Replace a user's roles with the member role
	GrantMember { email: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => nucleus_server_config::load_config_with_file(path),
		None => nucleus_server_config::load_config(),
	}
	.context("failed to load configuration")?;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	tracing::info!(database = %config.database.url, "starting nucleus-server");

	let pool = nucleus_server_db::create_pool(&config.database.url)
		.await
		.context("failed to open database")?;
	nucleus_server_db::run_migrations(&pool)
		.await
		.context("failed to run migrations")?;

	let services = UserServices::new(pool, &config.users, &config.password);

	match args.command {
		Command::Migrate => {
			tracing::info!("migrations applied");
		}
		Command::Seed => {
			let password = std::env::var(ADMIN_PASSWORD_ENV).ok();
			let report = seed(&services, password.as_deref()).await?;
			println!("{report:?}");
		}
		Command::Users { command } => run_users_command(&services, command).await?,
	}

	Ok(())
}

async fn run_users_command(services: &UserServices, command: UsersCommand) -> anyhow::Result<()> {
	match command {
		UsersCommand::List {
			filter,
			sort,
			page,
			page_size,
		} => {
			let input = UserListInput {
				filter,
				sort_by: sort,
				page_index: page,
				page_size,
			};
			let result = services.directory.list_users(&input).await?;
			println!("{}", serde_json::to_string_pretty(&result)?);
		}
		UsersCommand::Show { id } => {
			let output = services.directory.get_user_for_create_or_update(id).await?;
			println!("{}", serde_json::to_string_pretty(&output)?);
		}
		UsersCommand::Remove { id } => {
			services.lifecycle.remove_user(id).await?;
			println!("removed {id}");
		}
		UsersCommand::GrantMember { email } => {
			services.lifecycle.grant_member_role(&email).await?;
			println!("granted member role to {email}");
		}
	}
	Ok(())
}
