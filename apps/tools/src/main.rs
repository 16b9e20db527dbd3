use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::domain::ContactId;
use storage::{demo_contacts, seed_contacts, ContactStore, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/contacts.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert the demo contacts.
    Seed,
    List {
        #[arg(long)]
        q: Option<String>,
    },
    Create,
    Delete {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Seed => {
            let seeded = seed_contacts(&storage, demo_contacts()).await?;
            println!("seeded {} contacts", seeded.len());
        }
        Command::List { q } => {
            for contact in storage.list_contacts(q.as_deref()).await? {
                let name = contact
                    .display_name()
                    .unwrap_or_else(|| "(no name)".to_string());
                let star = if contact.favorite { " ★" } else { "" };
                println!("{}\t{name}{star}", contact.id);
            }
        }
        Command::Create => {
            let contact = storage.create_empty_contact().await?;
            println!("created contact_id={}", contact.id);
        }
        Command::Delete { id } => {
            storage.delete_contact(&ContactId(id)).await?;
            println!("deleted");
        }
    }

    Ok(())
}
