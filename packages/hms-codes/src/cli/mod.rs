use crate::{
    beds::{BedStatus, EmergencyBeds, NewEmergencyBed},
    config::{LogConfig, LogFormat, LogLevel, DEFAULT_CONFIG_FILE_PATH},
    error::Error,
    log::BEDS,
    store::BedStore,
};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Clone, Debug, Parser)]
#[command(version, about, verbatim_doc_comment)]
///
/// HMS Codes
///
/// Allocates sequential, human-readable bed numbers for emergency beds stored in PostgreSQL.
///
pub struct Args {
    /// Optional path to a configuration file.
    ///
    /// Default is "hms-codes.toml".
    /// Configuration is loaded from this file, if present.
    /// Environment variables are used instead of the file or to override any values defined in the file.
    #[arg(short = 'p', long, default_value = DEFAULT_CONFIG_FILE_PATH, verbatim_doc_comment, global = true)]
    pub config_file_path: String,

    ///
    /// Optional log level.
    ///
    #[arg(short, long, value_enum, default_value_t = LogConfig::default_log_level(), env = "HMS_LOG__LEVEL", global = true)]
    pub log_level: LogLevel,

    ///
    /// Optional log format. Default level is "pretty" if running in a terminal session, otherwise "structured".
    ///
    #[arg(short='f', long, value_enum, default_value_t = LogConfig::default_log_format(), env = "HMS_LOG__FORMAT", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create the emergency_beds table and its unique constraint if missing
    Setup,

    /// Show the bed number the next created bed would get
    Next,

    /// Create an emergency bed with the next bed number
    Create {
        #[arg(short, long)]
        ward: Option<String>,

        #[arg(short, long, value_enum, default_value_t = BedStatus::default())]
        status: BedStatus,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List all emergency beds, including retired ones
    List,

    /// Show one emergency bed
    Show { bed_no: String },

    /// Retire an emergency bed. Its bed number is not reused.
    Delete { id: i64 },
}

///
/// Runs the command specified on the command line
/// Returns the `data` payload of the response envelope
///
pub async fn run<S: BedStore>(command: Commands, beds: &EmergencyBeds<S>) -> Result<Value, Error> {
    debug!(target: BEDS, ?command);

    let data = match command {
        Commands::Setup => {
            beds.setup().await?;
            json!({ "table": "emergency_beds" })
        }
        Commands::Next => json!({ "bed_no": beds.next_bed_no().await? }),
        Commands::Create {
            ward,
            status,
            notes,
        } => {
            let bed = NewEmergencyBed {
                ward,
                status,
                notes,
            };
            serde_json::to_value(beds.create(bed).await?)?
        }
        Commands::List => serde_json::to_value(beds.list().await?)?,
        Commands::Show { bed_no } => serde_json::to_value(beds.get(&bed_no).await?)?,
        Commands::Delete { id } => serde_json::to_value(beds.delete(id).await?)?,
    };

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocatorConfig;
    use crate::store::MemoryStore;

    fn beds() -> EmergencyBeds<MemoryStore> {
        EmergencyBeds::new(MemoryStore::new(), AllocatorConfig::default())
    }

    #[test]
    fn parse_create() {
        let args = Args::try_parse_from([
            "hms-codes",
            "create",
            "--ward",
            "Resus",
            "--status",
            "occupied",
        ])
        .unwrap();

        match args.command {
            Commands::Create {
                ward,
                status,
                notes,
            } => {
                assert_eq!(ward.as_deref(), Some("Resus"));
                assert_eq!(status, BedStatus::Occupied);
                assert!(notes.is_none());
            }
            other => panic!("Unexpected command {other:?}"),
        }
        assert_eq!(args.config_file_path, DEFAULT_CONFIG_FILE_PATH);
    }

    #[test]
    fn parse_global_config_path_after_subcommand() {
        let args =
            Args::try_parse_from(["hms-codes", "show", "ER-04", "-p", "other.toml"]).unwrap();

        assert_eq!(args.config_file_path, "other.toml");
        assert!(matches!(args.command, Commands::Show { ref bed_no } if bed_no == "ER-04"));
    }

    #[test]
    fn command_is_required() {
        assert!(Args::try_parse_from(["hms-codes"]).is_err());
    }

    #[tokio::test]
    async fn run_create_then_next() {
        let beds = beds();

        let created = run(
            Commands::Create {
                ward: Some("Resus".to_string()),
                status: BedStatus::Available,
                notes: None,
            },
            &beds,
        )
        .await
        .unwrap();

        assert_eq!(created["bed_no"], json!("ER-01"));
        assert_eq!(created["status"], json!("available"));

        let next = run(Commands::Next, &beds).await.unwrap();
        assert_eq!(next, json!({ "bed_no": "ER-02" }));
    }

    #[tokio::test]
    async fn run_show_unknown_is_not_found() {
        let err = run(
            Commands::Show {
                bed_no: "ER-99".to_string(),
            },
            &beds(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), 404);
    }
}
