use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, Select, Text};
use std::fmt;

use directory_core::{
    ActionKind, AuthClient, AuthToken, CardBoard, CardContext, Config, Credentials, DoctorClient,
    DoctorFilter, DoctorId, NewDoctor, PatientClient, ProviderRecord, Role, Session,
};

use crate::terminal::{TerminalBooking, TerminalPrompt, print_board};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "directory", version, about = "Doctor directory CLI")]
pub struct Cli {
    /// Use this API base URL instead of the configured one.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API base URL, e.g. "http://localhost:8080".
    Configure {
        url: String,
    },

    /// Store the role (and token) used to render cards.
    ///
    /// Admins and logged-in patients without `--token` are asked for their
    /// credentials, which are exchanged for a token.
    Login {
        /// One of: visitor, patient, loggedPatient, admin.
        #[arg(long)]
        role: String,

        /// Use this auth token instead of logging in with credentials.
        #[arg(long)]
        token: Option<String>,
    },

    /// Forget the stored role and token.
    Logout,

    /// Show all doctors.
    List,

    /// Show doctors matching the given criteria.
    Filter(FilterArgs),

    /// Add a doctor (admin only).
    Add,

    /// Browse doctor cards and use their actions.
    Browse(FilterArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long)]
    pub name: Option<String>,

    /// Availability slot, e.g. "AM" or "PM".
    #[arg(long)]
    pub time: Option<String>,

    #[arg(long)]
    pub specialty: Option<String>,
}

impl FilterArgs {
    fn into_filter(self) -> DoctorFilter {
        DoctorFilter { name: self.name, time: self.time, specialty: self.specialty }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        let base_url = self.base_url.unwrap_or_else(|| config.base_url().to_string());

        match self.command {
            Command::Configure { url } => {
                DoctorClient::new(&url)?;
                config.set_base_url(url);
                config.save()?;
                println!("API base URL set to {}", config.base_url());
            }
            Command::Login { role, token } => {
                let role = Role::try_from(role.as_str())?;
                let token = match (role.needs_token(), token) {
                    (false, _) => None,
                    (true, Some(raw)) => Some(parse_token(role, raw)?),
                    (true, None) => {
                        let auth = AuthClient::new(&base_url)?;
                        let result = auth.login(&read_credentials(role)?).await;
                        if !result.is_success() {
                            println!("Login failed: {}", result.message);
                            return Ok(());
                        }
                        println!("{}", result.message);
                        Some(parse_token(role, result.payload.unwrap_or_default())?)
                    }
                };
                config.set_session(role, token.as_ref());
                config.save()?;
                println!("Logged in as {role}.");
            }
            Command::Logout => {
                config.clear_session();
                config.save()?;
                println!("Logged out.");
            }
            Command::List => {
                let client = DoctorClient::new(&base_url)?;
                let board = CardBoard::render(client.list().await, config.session().role);
                print_board(&board);
            }
            Command::Filter(args) => {
                let client = DoctorClient::new(&base_url)?;
                let records = client.filter(&args.into_filter()).await;
                print_board(&CardBoard::render(records, config.session().role));
            }
            Command::Add => {
                let client = DoctorClient::new(&base_url)?;
                add_doctor(&client, &config.session()).await?;
            }
            Command::Browse(args) => {
                browse(&base_url, &config.session(), args.into_filter()).await?;
            }
        }

        Ok(())
    }
}

fn parse_token(role: Role, raw: String) -> anyhow::Result<AuthToken> {
    AuthToken::new(raw).ok_or_else(|| anyhow!("Role '{role}' requires a non-empty auth token."))
}

fn read_credentials(role: Role) -> anyhow::Result<Credentials> {
    let identifier = match role {
        Role::Admin => "Username:",
        Role::LoggedPatient => "Email:",
        Role::Visitor | Role::Patient => bail!("Role '{role}' does not log in."),
    };
    let identifier = Text::new(identifier).prompt().context("Failed to read login name")?;
    let password = Password::new("Password:")
        .without_confirmation()
        .prompt()
        .context("Failed to read password")?;

    Ok(credentials_for(role, identifier.trim().to_string(), password))
}

fn credentials_for(role: Role, identifier: String, password: String) -> Credentials {
    match role {
        Role::Admin => Credentials::Admin { username: identifier, password },
        Role::Visitor | Role::Patient | Role::LoggedPatient => {
            Credentials::Patient { email: identifier, password }
        }
    }
}

async fn add_doctor(client: &DoctorClient, session: &Session) -> anyhow::Result<()> {
    let Some(token) = session.token.as_ref().filter(|_| session.role == Role::Admin) else {
        bail!(
            "Adding doctors requires an admin session.\n\
             Hint: run `directory login --role admin` first."
        );
    };

    let doctor = NewDoctor {
        id: None,
        name: Text::new("Name:").prompt()?,
        specialty: Text::new("Specialty:").prompt()?,
        email: Text::new("Email:").prompt()?,
        password: Password::new("Password:").prompt()?,
        phone: Text::new("Phone (10 digits):").prompt()?,
        available_times: split_slots(
            &Text::new("Available times (comma-separated):").prompt()?,
        ),
    };

    let result = client.create(&doctor, token).await;
    if result.is_success() {
        println!("{}", result.message);
    } else {
        println!("Failed to add doctor: {}", result.message);
    }

    Ok(())
}

fn split_slots(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

async fn fetch(client: &DoctorClient, filter: &DoctorFilter) -> Vec<ProviderRecord> {
    if filter.query_pairs().is_empty() {
        client.list().await
    } else {
        client.filter(filter).await
    }
}

/// Entry in the card picker.
enum CardPick {
    Card { id: DoctorId, label: String },
    Quit,
}

impl fmt::Display for CardPick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardPick::Card { label, .. } => f.write_str(label),
            CardPick::Quit => f.write_str("Quit"),
        }
    }
}

/// Entry in the action picker.
enum ActionPick {
    Action(ActionKind),
    Back,
}

impl fmt::Display for ActionPick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPick::Action(kind) => f.write_str(kind.label()),
            ActionPick::Back => f.write_str("Back"),
        }
    }
}

async fn browse(base_url: &str, session: &Session, filter: DoctorFilter) -> anyhow::Result<()> {
    let client = DoctorClient::new(base_url)?;
    let patients = PatientClient::new(base_url)?;
    let prompt = TerminalPrompt;
    let booking = TerminalBooking;
    let ctx = CardContext {
        session,
        directory: &client,
        prompt: &prompt,
        profiles: &patients,
        booking: &booking,
    };

    let mut board = CardBoard::render(fetch(&client, &filter).await, session.role);

    loop {
        print_board(&board);
        if board.is_empty() {
            return Ok(());
        }

        let mut picks: Vec<CardPick> = board
            .cards()
            .iter()
            .map(|card| CardPick::Card {
                id: card.id().clone(),
                label: format!("{} ({})", card.record().name, card.record().specialty),
            })
            .collect();
        picks.push(CardPick::Quit);

        let Some(CardPick::Card { id, .. }) = Select::new("Doctor:", picks).prompt_skippable()?
        else {
            return Ok(());
        };

        let Some(card) = board.get(&id) else { continue };
        if card.actions().is_empty() {
            println!("No actions available for role '{}'.", session.role);
            continue;
        }

        let mut actions: Vec<ActionPick> =
            card.actions().iter().map(|c| ActionPick::Action(c.kind())).collect();
        actions.push(ActionPick::Back);

        let Some(ActionPick::Action(kind)) = Select::new("Action:", actions).prompt_skippable()?
        else {
            continue;
        };

        let outcome = board.activate(&id, kind, &ctx).await;
        tracing::debug!(doctor = %id, ?kind, ?outcome, "card action finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_command_maps_only_given_criteria() {
        let cli = Cli::try_parse_from(["directory", "filter", "--specialty", "Cardiology"]).unwrap();

        let Command::Filter(args) = cli.command else { panic!("expected filter command") };
        let filter = args.into_filter();
        assert_eq!(filter.query_pairs(), vec![("specialty", "Cardiology")]);
    }

    #[test]
    fn global_base_url_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["directory", "list", "--base-url", "http://h:1/api"]).unwrap();

        assert_eq!(cli.base_url.as_deref(), Some("http://h:1/api"));
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn login_requires_role() {
        assert!(Cli::try_parse_from(["directory", "login"]).is_err());
    }

    #[test]
    fn given_blank_token_is_rejected() {
        let err = parse_token(Role::Admin, "   ".to_string()).unwrap_err();
        assert!(err.to_string().contains("requires a non-empty auth token"));
    }

    #[test]
    fn login_token_flag_is_optional() {
        let cli = Cli::try_parse_from(["directory", "login", "--role", "admin"]).unwrap();

        let Command::Login { role, token } = cli.command else { panic!("expected login command") };
        assert_eq!(role, "admin");
        assert!(token.is_none());
    }

    #[test]
    fn credentials_match_the_role_login_endpoint() {
        let admin = credentials_for(Role::Admin, "root".into(), "pw".into());
        assert_eq!(admin, Credentials::Admin { username: "root".into(), password: "pw".into() });
        assert_eq!(admin.role(), Role::Admin);

        let patient = credentials_for(Role::LoggedPatient, "p@x.com".into(), "pw".into());
        assert_eq!(patient, Credentials::Patient { email: "p@x.com".into(), password: "pw".into() });
        assert_eq!(patient.role(), Role::LoggedPatient);
    }

    #[test]
    fn configure_takes_url_positionally() {
        let cli = Cli::try_parse_from(["directory", "configure", "http://h:1"]).unwrap();

        let Command::Configure { url } = cli.command else { panic!("expected configure command") };
        assert_eq!(url, "http://h:1");
        assert!(cli.base_url.is_none());
    }

    #[test]
    fn slots_are_split_and_trimmed() {
        assert_eq!(split_slots(" 09:00-10:00, ,10:00-11:00 "), vec!["09:00-10:00", "10:00-11:00"]);
    }
}
