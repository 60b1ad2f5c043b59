use clap::Parser;
use idmesh::{
    Directory, IdentityPatch, NewIdentity, ResolvedIdentity, Settings, UserType, WriteKey,
    WriteReport,
};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("idmesh=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let directory = Directory::open(Settings::from_env()?).await?;

    match cli.command {
        Commands::Lookup(args) => {
            let resolved = directory.get_by_email(&args.email).await?;
            print_resolved(&resolved);
        }
        Commands::List(args) => {
            let identities = if args.pending_shops {
                directory.pending_shops().await?
            } else {
                directory.list_all().await?
            };
            for resolved in &identities {
                print_resolved(resolved);
            }
            println!("{} identities", identities.len());
        }
        Commands::Create(args) => {
            let report = directory
                .create(NewIdentity {
                    email: args.email,
                    name: args.name,
                    password_hash: args.password_hash,
                    phone: args.phone,
                    user_type: UserType::Customer,
                    role: None,
                    shop_info: None,
                })
                .await?;
            print_report(&report);
        }
        Commands::Promote(args) => {
            let report = directory
                .update(
                    WriteKey::Email(args.email),
                    &IdentityPatch::role(args.role.into()),
                )
                .await?;
            print_report(&report);
        }
        Commands::Delete(args) => {
            let key = if args.id {
                WriteKey::Id(args.key)
            } else {
                WriteKey::Email(args.key)
            };
            let report = directory.delete(key).await?;
            print_report(&report);
        }
    }
    Ok(())
}

fn print_resolved(resolved: &ResolvedIdentity) {
    let record = &resolved.record;
    println!(
        "{}  {}  role={}  stores={}{}",
        record.id,
        record.email,
        record.effective_role(),
        resolved
            .provenance
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
        if resolved.divergent { "  [divergent ids]" } else { "" },
    );
}

fn print_report(report: &WriteReport) {
    for (kind, outcome) in &report.outcomes {
        println!("{kind}: {outcome:?}");
    }
    if let Some(record) = &report.record {
        println!("record id: {}", record.id);
    }
    println!(
        "persistence: {:?}{}",
        report.persistence,
        if report.is_durable() { " (durable)" } else { " (NOT durable)" },
    );
}
