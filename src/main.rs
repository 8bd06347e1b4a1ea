//! # handover-act CLI
//!
//! ```bash
//! # Start a new act with a fresh number
//! handover-act new akts.json
//!
//! # Render it
//! handover-act render akts.json -o akts.pdf --profile fast
//!
//! # Mail it through the relay configured in ACT_MAIL_RELAY_URL
//! handover-act email akts.json --to klients@example.lv
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use handover_act::{
    ActError, Composer, DocumentRecord, EmailSettings, FileStore, MailRelay, MailRelayConfig,
    Party, PartyRepository, RenderConfig, RenderProfile, Result, SettingsRepository,
    model::new_act_number,
};

/// Handover/acceptance act generator
#[derive(Parser, Debug)]
#[command(name = "handover-act")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding saved parties and mail settings
    #[arg(long, global = true, env = "ACT_STORE_DIR", default_value = ".handover-act")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default record with a fresh act number
    New {
        /// Output record file
        record: PathBuf,
    },

    /// Render a record to PDF
    Render {
        /// Record JSON file
        record: PathBuf,

        /// Output file (defaults to the attachment file name)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Render a record and mail it through the relay
    Email {
        /// Record JSON file
        record: PathBuf,

        /// Recipient address
        #[arg(long)]
        to: String,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Manage saved parties
    Parties {
        #[command(subcommand)]
        action: PartiesAction,
    },

    /// Manage mail settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    /// Rendering preset
    #[arg(long, value_enum, default_value_t = RenderProfile::Advanced)]
    profile: RenderProfile,

    /// Regular TrueType font to embed
    #[arg(long, value_name = "FILE", requires = "bold_font")]
    font: Option<PathBuf>,

    /// Bold TrueType font to embed
    #[arg(long, value_name = "FILE", requires = "font")]
    bold_font: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum PartiesAction {
    /// List saved parties
    List,
    /// Save a party from a JSON file
    Save { party: PathBuf },
    /// Delete a saved party by id
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print the stored settings (password masked)
    Show,
    /// Write the stored settings to a JSON file
    Export { file: PathBuf },
    /// Validate and store settings from a JSON file
    Import { file: PathBuf },
    /// Forget the stored settings
    Reset,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::New { record } => {
            let mut act = DocumentRecord::default();
            act.act_number = new_act_number();
            std::fs::write(&record, serde_json::to_string_pretty(&act)?)?;
            println!("{} -> {}", act.act_number, record.display());
        }
        Commands::Render {
            record,
            output,
            render,
        } => {
            let record = read_record(&record)?;
            let act = composer(&render)?.render(&record)?;
            let output = output.unwrap_or_else(|| PathBuf::from(record.attachment_filename()));
            act.write_to(&output)?;
            println!("{} page(s) -> {}", act.page_count(), output.display());
        }
        Commands::Email {
            record,
            to,
            render,
        } => {
            let record = read_record(&record)?;
            record.validate()?;
            let settings = SettingsRepository::new(FileStore::open(&cli.store)?).load()?;
            settings.validate()?;
            let act = composer(&render)?.render(&record)?;
            let relay = MailRelay::new(&MailRelayConfig::from_env())?;
            relay.send_act(&to, &settings, &record, &act)?;
            println!("Sent {} to {}", record.attachment_filename(), to);
        }
        Commands::Parties { action } => {
            let mut repo = PartyRepository::load(FileStore::open(&cli.store)?)?;
            match action {
                PartiesAction::List => {
                    for saved in repo.parties() {
                        println!(
                            "{}  {}  {}",
                            saved.id,
                            saved.created_at.format("%Y-%m-%d"),
                            saved.party.name
                        );
                    }
                }
                PartiesAction::Save { party } => {
                    let party: Party = serde_json::from_str(&std::fs::read_to_string(party)?)?;
                    match repo.save(&party)? {
                        Some(saved) => println!("Saved {}", saved.id),
                        None => println!("Party has no name, nothing saved"),
                    }
                }
                PartiesAction::Delete { id } => {
                    if !repo.delete(&id)? {
                        return Err(ActError::Validation(format!("No saved party with id {id}")));
                    }
                    println!("Deleted {}", id);
                }
            }
        }
        Commands::Settings { action } => {
            let mut repo = SettingsRepository::new(FileStore::open(&cli.store)?);
            match action {
                SettingsAction::Show => {
                    let mut settings = repo.load()?;
                    if !settings.smtp_password.is_empty() {
                        settings.smtp_password = "********".to_string();
                    }
                    println!("{}", settings.export_json()?);
                }
                SettingsAction::Export { file } => {
                    std::fs::write(&file, repo.load()?.export_json()?)?;
                    println!("Exported to {}", file.display());
                }
                SettingsAction::Import { file } => {
                    let settings = EmailSettings::import_json(&std::fs::read_to_string(file)?)?;
                    repo.save(&settings)?;
                    println!("Imported settings for {}", settings.smtp_host);
                }
                SettingsAction::Reset => {
                    repo.reset()?;
                    println!("Settings reset");
                }
            }
        }
    }

    Ok(())
}

fn read_record(path: &Path) -> Result<DocumentRecord> {
    let record: DocumentRecord = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    info!("Loaded act {:?} from {}", record.act_number, path.display());
    Ok(record)
}

fn composer(args: &RenderArgs) -> Result<Composer> {
    let mut config = RenderConfig::from_profile(args.profile);
    if let (Some(regular), Some(bold)) = (&args.font, &args.bold_font) {
        config = config.with_fonts(load_fonts(regular, bold)?);
    }
    Ok(Composer::new(config))
}

#[cfg(feature = "ttf-parser")]
fn load_fonts(regular: &Path, bold: &Path) -> Result<handover_act::FontSet> {
    handover_act::FontSet::embedded(std::fs::read(regular)?, std::fs::read(bold)?)
}

#[cfg(not(feature = "ttf-parser"))]
fn load_fonts(_regular: &Path, _bold: &Path) -> Result<handover_act::FontSet> {
    Err(ActError::TextError(
        "Font embedding needs the ttf-parser feature".to_string(),
    ))
}
