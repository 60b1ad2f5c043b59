//! CLI argument definitions for the idmesh binary.

use clap::{Parser, Subcommand, ValueEnum};

/// Role values accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    User,
    Admin,
    SuperAdmin,
}

impl From<RoleArg> for idmesh::Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => idmesh::Role::User,
            RoleArg::Admin => idmesh::Role::Admin,
            RoleArg::SuperAdmin => idmesh::Role::SuperAdmin,
        }
    }
}

/// Idmesh operator CLI
///
/// Store configuration comes from the IDMESH_* environment variables
/// (IDMESH_ENV, IDMESH_DATABASE_URL, IDMESH_LOCAL_STORE,
/// IDMESH_ADAPTER_TIMEOUT_MS).
#[derive(Parser, Debug)]
#[command(name = "idmesh")]
#[command(about = "Inspect and repair the reconciled identity store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the canonical record for an email
    Lookup(LookupArgs),
    /// List all identities, deduplicated by email
    List(ListArgs),
    /// Create a new identity across the configured stores
    Create(CreateArgs),
    /// Set the role overlay for an identity, fanned out to every store
    Promote(PromoteArgs),
    /// Delete an identity, best-effort across stores
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct LookupArgs {
    /// Email to resolve
    pub email: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only show shop-owner accounts with a pending application
    #[arg(long)]
    pub pending_shops: bool,
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// Email (the cross-store natural key)
    pub email: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Pre-computed password hash (stored opaquely)
    #[arg(long)]
    pub password_hash: String,

    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct PromoteArgs {
    /// Email of the identity to change
    pub email: String,

    /// Role to set
    #[arg(long, value_enum)]
    pub role: RoleArg,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Record id or email
    pub key: String,

    /// Treat the key as a store-local id instead of an email
    #[arg(long)]
    pub id: bool,
}
