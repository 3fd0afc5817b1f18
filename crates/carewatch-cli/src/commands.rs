use std::sync::Arc;

use clap::{Args, Subcommand};
use eyre::Result;
use jiff::Timestamp;
use serde::Serialize;
use serde::de::DeserializeOwned;

use carewatch_cli::config::{CarewatchConfig, config_info, config_path, save_config};
use carewatch_client::{AssessmentSubmission, HttpStore, RemoteError, RemoteStore};
use carewatch_core::models::patient::PatientDraft;
use carewatch_core::models::room::{Room, RoomDraft, RoomStatus, RoomType};
use carewatch_core::{PatientId, RoomId};
use carewatch_occupancy::{OccupancyCoordinator, OccupancyError};
use carewatch_risk::{
    RawRiskInputs, Tier, TierDistribution, build_feature_vector, classify_tier, tier_of,
};
use carewatch_timeline::{
    AgeBound, KindFilter, TimelineFilter, TimelineStats, build_timeline, filter, group_by_day,
};

#[derive(Subcommand)]
pub enum RoomsCommand {
    /// List rooms with their occupant and risk tier
    List,
    /// Waiting patients who can be given a room
    Waiting,
    /// Put a patient in an available room
    Assign {
        /// Room id
        room: String,
        /// Patient id
        patient: String,
    },
    /// Free an occupied room
    Discharge {
        /// Room id
        room: String,
    },
    /// Take an available room out of service, or bring it back with --end
    Maintenance {
        /// Room id
        room: String,
        #[arg(long)]
        end: bool,
    },
    /// Register a new room
    Register(RegisterArgs),
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Room number shown to staff, e.g. "D-12"
    #[arg(long)]
    number: String,
    /// delivery, recovery, consultation or emergency
    #[arg(long = "type", value_parser = parse_wire::<RoomType>)]
    room_type: Option<RoomType>,
    /// Initial status (available when omitted)
    #[arg(long, value_parser = parse_wire::<RoomStatus>)]
    status: Option<RoomStatus>,
    #[arg(long)]
    capacity: Option<u32>,
    /// Comma-separated equipment list
    #[arg(long, value_delimiter = ',')]
    equipment: Vec<String>,
    /// Occupant, for a room registered as occupied
    #[arg(long)]
    patient: Option<String>,
}

impl RegisterArgs {
    fn into_draft(self) -> RoomDraft {
        RoomDraft {
            number: self.number,
            room_type: self.room_type,
            status: self.status,
            capacity: self.capacity,
            equipment: self.equipment,
            patient: self.patient.map(PatientId::from),
        }
    }
}

#[derive(Subcommand)]
pub enum PatientsCommand {
    /// List patients with their risk tier
    List,
    /// Create a patient record
    Add(PatientArgs),
    /// Replace a patient record
    Update {
        /// Patient id
        id: String,
        #[command(flatten)]
        fields: PatientArgs,
    },
    /// Delete a patient record
    Delete {
        /// Patient id
        id: String,
    },
}

#[derive(Args)]
pub struct PatientArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    age: u32,
    #[arg(long)]
    condition: String,
    /// Appointment time, e.g. "2025-01-10 09:00"
    #[arg(long)]
    appointment: String,
    #[arg(long)]
    contact: String,
    #[arg(long)]
    emergency_contact: Option<String>,
    #[arg(long)]
    email: Option<String>,
}

impl PatientArgs {
    fn into_draft(self) -> Result<PatientDraft> {
        let draft = PatientDraft {
            name: self.name,
            age: self.age,
            condition: self.condition,
            appointment: self.appointment,
            contact: self.contact,
            emergency_contact: self.emergency_contact,
            email: self.email,
        };
        draft.validate()?;
        Ok(draft)
    }
}

#[derive(Args)]
pub struct AssessArgs {
    /// Patient id
    patient: String,
    /// Form value as field=value, e.g. -i age=34 -i hpv_positive=1
    #[arg(short = 'i', long = "input", value_parser = parse_pair)]
    inputs: Vec<(String, String)>,
    /// Print the request instead of sending it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
pub struct TimelineArgs {
    /// Case-insensitive match on title, description or actor
    #[arg(long, default_value = "")]
    search: String,
    /// all, patient_added or risk_assessment
    #[arg(long, default_value = "all")]
    kind: KindFilter,
    /// Maximum age in days, or "all"
    #[arg(long, default_value = "30")]
    days: AgeBound,
    /// Print summary counts before the log
    #[arg(long)]
    stats: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Update the config file
    Set {
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        #[arg(long)]
        token: Option<String>,
        #[arg(long, conflicts_with = "token")]
        clear_token: bool,
        /// IANA time zone name for day grouping
        #[arg(long)]
        timezone: Option<String>,
    },
}

fn parse_wire<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(|e| e.to_string())
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected field=value, got {s:?}"))
}

pub struct Context {
    config: CarewatchConfig,
    json: bool,
}

impl Context {
    pub fn new(config: CarewatchConfig, json: bool) -> Self {
        Self { config, json }
    }

    fn store(&self) -> Result<Arc<HttpStore>> {
        let mut store = HttpStore::new(&self.config.api_base_url, self.config.timeout())?;
        if let Some(token) = &self.config.api_token {
            store = store.with_token(token.clone());
        }
        Ok(Arc::new(store))
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Put the staff-facing message on top of the error chain.
fn remote_report(e: RemoteError) -> eyre::Report {
    let message = e.user_message();
    eyre::Report::new(e).wrap_err(message)
}

fn occupancy_report(e: OccupancyError) -> eyre::Report {
    match e {
        OccupancyError::Transport(e) => remote_report(e),
        other => eyre::Report::new(other),
    }
}

fn tier_badge(tier: Option<Tier>) -> &'static str {
    tier.map_or("", |t| t.label())
}

pub async fn rooms(ctx: &Context, cmd: RoomsCommand) -> Result<()> {
    let mut coord = OccupancyCoordinator::load(ctx.store()?)
        .await
        .map_err(occupancy_report)?;

    let changed = match cmd {
        RoomsCommand::List => return print_rooms(ctx, &coord),
        RoomsCommand::Waiting => {
            let waiting = coord.waiting_patients();
            if ctx.json {
                return ctx.print_json(&waiting);
            }
            if waiting.is_empty() {
                println!("No patients waiting.");
            }
            for p in waiting {
                println!(
                    "{:<8} {:<28} {}",
                    p.id.as_str(),
                    p.name,
                    tier_badge(tier_of(p.risk_score)),
                );
            }
            return Ok(());
        }
        RoomsCommand::Assign { room, patient } => coord
            .assign(&RoomId::from(room), &PatientId::from(patient))
            .await,
        RoomsCommand::Discharge { room } => coord.discharge(&RoomId::from(room)).await,
        RoomsCommand::Maintenance { room, end: false } => {
            coord.set_maintenance(&RoomId::from(room)).await
        }
        RoomsCommand::Maintenance { room, end: true } => {
            coord.end_maintenance(&RoomId::from(room)).await
        }
        RoomsCommand::Register(args) => coord.register(args.into_draft()).await,
    }
    .map_err(occupancy_report)?;

    print_changed(ctx, &coord, &changed)
}

fn print_changed(ctx: &Context, coord: &OccupancyCoordinator, room: &Room) -> Result<()> {
    if ctx.json {
        ctx.print_json(room)?;
    } else {
        let occupant = room
            .patient
            .as_ref()
            .map(|id| format!(" ({})", occupant_name(coord, id)))
            .unwrap_or_default();
        println!("Room {} is now {}{occupant}.", room.number, room.status);
    }
    if coord.is_stale() {
        eprintln!("Room list could not be refreshed; run `carewatch rooms list` to see current state.");
    }
    Ok(())
}

fn occupant_name(coord: &OccupancyCoordinator, id: &PatientId) -> String {
    coord
        .snapshot()
        .patient(id)
        .map_or_else(|| id.to_string(), |p| p.name.clone())
}

fn print_rooms(ctx: &Context, coord: &OccupancyCoordinator) -> Result<()> {
    let snapshot = coord.snapshot();
    let stats = coord.room_stats();
    if ctx.json {
        return ctx.print_json(&serde_json::json!({
            "rooms": snapshot.rooms,
            "stats": stats,
        }));
    }

    for room in &snapshot.rooms {
        let occupant = room
            .patient
            .as_ref()
            .map_or_else(|| "-".to_string(), |id| occupant_name(coord, id));
        println!(
            "{:<8} {:<10} {:<12} {:<28} {}",
            room.id.as_str(),
            room.number,
            room.status.as_str(),
            occupant,
            tier_badge(coord.occupant_tier(&room.id)),
        );
    }
    println!(
        "{} rooms: {} occupied, {} available, {} in maintenance",
        stats.total, stats.occupied, stats.available, stats.maintenance
    );
    Ok(())
}

pub async fn patients(ctx: &Context, cmd: PatientsCommand) -> Result<()> {
    let store = ctx.store()?;
    match cmd {
        PatientsCommand::List => {
            let patients = store.fetch_patients().await.map_err(remote_report)?;
            let distribution =
                TierDistribution::from_scores(patients.iter().filter_map(|p| p.risk_score));
            if ctx.json {
                return ctx.print_json(&serde_json::json!({
                    "patients": patients,
                    "distribution": distribution,
                }));
            }
            for p in &patients {
                println!(
                    "{:<8} {:<28} {:<12} {}",
                    p.id.as_str(),
                    p.name,
                    p.status.as_str(),
                    tier_badge(tier_of(p.risk_score)),
                );
            }
            let counts: Vec<String> = Tier::ALL
                .iter()
                .map(|t| format!("{}: {}", t.label(), distribution.count(*t)))
                .collect();
            println!("{} patients; {}", patients.len(), counts.join(", "));
        }
        PatientsCommand::Add(fields) => {
            let draft = fields.into_draft()?;
            let created = store.create_patient(&draft).await.map_err(remote_report)?;
            tracing::info!(patient = %created.id, "patient created");
            if ctx.json {
                ctx.print_json(&created)?;
            } else {
                println!("Created patient {} ({}).", created.name, created.id);
            }
        }
        PatientsCommand::Update { id, fields } => {
            let id = PatientId::from(id);
            let draft = fields.into_draft()?;
            let updated = store
                .update_patient(&id, &draft)
                .await
                .map_err(remote_report)?;
            tracing::info!(patient = %updated.id, "patient updated");
            if ctx.json {
                ctx.print_json(&updated)?;
            } else {
                println!("Updated patient {} ({}).", updated.name, updated.id);
            }
        }
        PatientsCommand::Delete { id } => {
            let id = PatientId::from(id);
            store.delete_patient(&id).await.map_err(remote_report)?;
            tracing::info!(patient = %id, "patient deleted");
            if !ctx.json {
                println!("Deleted patient {id}.");
            }
        }
    }
    Ok(())
}

pub async fn assess(ctx: &Context, args: AssessArgs) -> Result<()> {
    let raw: RawRiskInputs = args.inputs.into_iter().collect();
    let vector = build_feature_vector(&raw)?;
    let submission = AssessmentSubmission::new(PatientId::from(args.patient), &vector);

    if args.dry_run {
        return ctx.print_json(&submission);
    }

    let store = ctx.store()?;
    let record = store
        .submit_assessment(&submission)
        .await
        .map_err(remote_report)?;
    let tier = classify_tier(record.risk_score)?;
    tracing::info!(assessment = %record.id, patient = %record.patient, %tier, "assessment stored");

    if ctx.json {
        return ctx.print_json(&serde_json::json!({
            "record": record,
            "tier": tier,
        }));
    }
    println!("Risk score {:.2} ({})", record.risk_score, tier.label());
    if !record.recommended_action.trim().is_empty() {
        println!("Recommended action: {}", record.recommended_action);
    }
    Ok(())
}

pub fn classify(ctx: &Context, score: f64) -> Result<()> {
    let tier = classify_tier(score)?;
    if ctx.json {
        return ctx.print_json(&serde_json::json!({ "score": score, "tier": tier }));
    }
    println!("{score} is {}", tier.label());
    Ok(())
}

pub async fn timeline(ctx: &Context, args: TimelineArgs) -> Result<()> {
    let tz = ctx.config.time_zone()?;
    let store = ctx.store()?;
    let (patients, assessments) =
        tokio::try_join!(store.fetch_patients(), store.fetch_assessments())
            .map_err(remote_report)?;

    let now = Timestamp::now();
    let events = build_timeline(&patients, &assessments, now, &tz);
    let criteria = TimelineFilter {
        search: args.search,
        kind: args.kind,
        max_age: args.days,
    };
    let shown = filter(&events, &criteria, now);
    let groups = group_by_day(&shown, &tz);
    let stats = args
        .stats
        .then(|| TimelineStats::compute(&events, now, &tz));

    if ctx.json {
        return ctx.print_json(&serde_json::json!({
            "stats": stats,
            "groups": groups,
        }));
    }

    if let Some(stats) = stats {
        println!(
            "{} activities, {} today, {} patients added, {} risk assessments",
            stats.total, stats.today, stats.patients_added, stats.risk_assessments
        );
        println!();
    }
    if groups.is_empty() {
        println!("No matching activity.");
    }
    for group in &groups {
        println!("{}", group.label());
        for event in &group.events {
            let time = event.timestamp.to_zoned(tz.clone()).strftime("%H:%M").to_string();
            println!(
                "  {time}  {} - {} ({}) {}",
                event.title,
                event.description,
                event.actor,
                tier_badge(event.metadata.tier),
            );
        }
    }
    Ok(())
}

pub fn config(ctx: &Context, mut stored: CarewatchConfig, cmd: ConfigCommand) -> Result<()> {
    let path = config_path()?;
    match cmd {
        ConfigCommand::Show => {
            let info = config_info(&ctx.config, &path);
            if ctx.json {
                return ctx.print_json(&info);
            }
            println!("file:     {}", info.path);
            println!("api url:  {}", info.api_base_url);
            println!("timeout:  {}s", info.timeout_secs);
            println!("token:    {}", info.token_hint.as_deref().unwrap_or("(none)"));
            println!("timezone: {}", info.timezone);
        }
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Set {
            api_url,
            timeout_secs,
            token,
            clear_token,
            timezone,
        } => {
            if let Some(url) = api_url {
                HttpStore::new(&url, stored.timeout())?;
                stored.api_base_url = url;
            }
            if let Some(secs) = timeout_secs {
                if secs == 0 {
                    return Err(eyre::eyre!("timeout must be at least one second"));
                }
                stored.timeout_secs = secs;
            }
            if clear_token {
                stored.api_token = None;
            } else if let Some(token) = token {
                stored.api_token = Some(token);
            }
            if let Some(name) = timezone {
                stored.timezone = Some(name);
                stored.time_zone()?;
            }
            let saved = save_config(&stored)?;
            println!("Saved {}.", saved.display());
        }
    }
    Ok(())
}
