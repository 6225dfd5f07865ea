use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ions_client::config::Config;
use ions_client::models::{Credentials, ExperienceInput, NewAccount, ProfilePatch};
use ions_client::session::encode_avatar;
use ions_client::{AppState, Session};

#[derive(Parser)]
#[command(name = "ions-client", version, about = "Manage your ions marketplace profile")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account (does not log in)
    Signup {
        email: String,
        first_name: String,
        last_name: String,
        #[arg(long)]
        password: String,
    },
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Print the current profile as JSON
    Whoami,
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    Skills {
        #[command(subcommand)]
        action: SkillsAction,
    },
    Experiences {
        #[command(subcommand)]
        action: ExperiencesAction,
    },
    /// Upload a profile picture (max 5 MiB)
    Avatar { image: PathBuf },
    /// Generate a résumé and print its download URL
    Resume,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Set one field, e.g. `profile set workMode Flexible`
    Set { field: String, value: String },
}

#[derive(Subcommand)]
enum SkillsAction {
    List,
    Add { name: String },
    Remove { id: i64 },
    /// Make the skill list exactly NAMES
    Sync { names: Vec<String> },
    /// All skill names known to the marketplace
    Catalog,
}

#[derive(Subcommand)]
enum ExperiencesAction {
    List,
    Add { name: String, year: i32 },
    Update { id: i64, name: String, year: i32 },
    Remove { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("ions_client={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("ions-client v{} against {}", env!("CARGO_PKG_VERSION"), config.api_url);

    let state = AppState::build(config)?;
    if let Err(e) = state.session.restore().await {
        warn!("Stored session could not be restored: {e}");
    }

    run(&state.session, cli.command).await
}

async fn run(session: &Session, command: Command) -> Result<()> {
    match command {
        Command::Signup {
            email,
            first_name,
            last_name,
            password,
        } => {
            let record = session
                .sign_up(&NewAccount {
                    email,
                    first_name,
                    last_name,
                    password,
                })
                .await?;
            println!("Account created for {}. Log in to continue.", record.email);
        }
        Command::Login { email, password } => {
            session.login(&Credentials { email, password }).await?;
            if let Some(user) = session.user().await {
                println!("Logged in as {}", user.record.full_name());
            }
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
        }
        Command::Whoami => {
            let user = require_user(session).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Profile {
            action: ProfileAction::Set { field, value },
        } => {
            require_user(session).await?;
            let patch = ProfilePatch::single(&field, &value).map_err(anyhow::Error::msg)?;
            session.update_profile(&patch).await?;
            println!("Updated {field}");
        }
        Command::Skills { action } => run_skills(session, action).await?,
        Command::Experiences { action } => run_experiences(session, action).await?,
        Command::Avatar { image } => {
            require_user(session).await?;
            let mime = image_mime(&image)?;
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("reading {}", image.display()))?;
            session
                .update_profile_picture(&encode_avatar(&bytes, mime))
                .await?;
            println!("Profile picture updated");
        }
        Command::Resume => {
            require_user(session).await?;
            session.generate_resume().await?;
            match session.resume_url().await? {
                Some(url) => println!("{url}"),
                None => println!("Résumé requested; no document available yet"),
            }
        }
    }
    Ok(())
}

async fn run_skills(session: &Session, action: SkillsAction) -> Result<()> {
    require_user(session).await?;
    match action {
        SkillsAction::List => {
            for skill in require_user(session).await?.skills {
                println!("{:>6}  {}", skill.id, skill.name);
            }
        }
        SkillsAction::Add { name } => {
            let skill = session.add_skill(&name).await?;
            println!("Added {} (id {})", skill.name, skill.id);
        }
        SkillsAction::Remove { id } => {
            session.remove_skill(id).await?;
            println!("Removed skill {id}");
        }
        SkillsAction::Sync { names } => {
            session.sync_skills(&names).await?;
            println!("Skills now: {}", skill_names(session).await.join(", "));
        }
        SkillsAction::Catalog => {
            for name in session.skill_catalog().await? {
                println!("{name}");
            }
        }
    }
    Ok(())
}

async fn run_experiences(session: &Session, action: ExperiencesAction) -> Result<()> {
    require_user(session).await?;
    match action {
        ExperiencesAction::List => {
            session.fetch_experiences().await?;
            for experience in require_user(session).await?.experiences {
                println!(
                    "{:>6}  {} ({} years)",
                    experience.id, experience.name, experience.year
                );
            }
        }
        ExperiencesAction::Add { name, year } => {
            let experience = session.add_experience(&ExperienceInput { name, year }).await?;
            println!("Added experience {}", experience.id);
        }
        ExperiencesAction::Update { id, name, year } => {
            session
                .update_experience(id, &ExperienceInput { name, year })
                .await?;
            println!("Updated experience {id}");
        }
        ExperiencesAction::Remove { id } => {
            session.remove_experience(id).await?;
            println!("Removed experience {id}");
        }
    }
    Ok(())
}

async fn require_user(session: &Session) -> Result<ions_client::models::UserProfile> {
    match session.user().await {
        Some(user) => Ok(user),
        None => {
            bail!("Not logged in. Run `ions-client login <email> --password <password>` first.")
        }
    }
}

async fn skill_names(session: &Session) -> Vec<String> {
    session
        .user()
        .await
        .map(|u| u.skills.into_iter().map(|s| s.name).collect())
        .unwrap_or_default()
}

fn image_mime(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    Ok(match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        other => bail!("unsupported image type '{other}' (png, jpg, gif, webp)"),
    })
}
