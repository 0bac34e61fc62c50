//! FileGate CLI: onboarding of clients (tenants) and users.
//!
//! Talks to the database directly. Set DATABASE_URL (a .env file is honored).

use anyhow::Context;
use clap::{Parser, Subcommand};
use filegate_cli::{init_tracing, new_user, print_json};
use filegate_core::models::{TenantId, UserRole};
use filegate_db::{
    PostgresTenantRepository, PostgresUserRepository, TenantRepositoryTrait, UserRepositoryTrait,
};
use sqlx::postgres::PgPoolOptions;

#[derive(Parser)]
#[command(name = "filegate", about = "FileGate administration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create a client organization
    CreateTenant {
        #[arg(long)]
        name: String,
    },
    /// List client organizations
    ListTenants,
    /// Delete a client organization that has no users or files left
    DeleteTenant {
        #[arg(long)]
        id: TenantId,
    },
    /// Create a user
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// admin, employee or client
        #[arg(long)]
        role: UserRole,
        /// Required for employee and client users
        #[arg(long)]
        tenant_id: Option<TenantId>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Migrate => {
            filegate_db::run_migrations(&pool).await?;
            tracing::info!("Migrations applied");
        }
        Commands::CreateTenant { name } => {
            let tenant = PostgresTenantRepository::new(pool).create(&name).await?;
            print_json(&tenant)?;
        }
        Commands::ListTenants => {
            let tenants = PostgresTenantRepository::new(pool).list().await?;
            print_json(&tenants)?;
        }
        Commands::DeleteTenant { id } => {
            PostgresTenantRepository::new(pool).delete(id).await?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
        Commands::CreateUser {
            username,
            password,
            role,
            tenant_id,
        } => {
            let user = new_user(&username, &password, role, tenant_id)?;
            let created = PostgresUserRepository::new(pool).create(user).await?;
            print_json(&created)?;
        }
    }

    Ok(())
}
