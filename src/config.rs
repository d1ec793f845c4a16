use crate::{models::case::CaseState, services::case_resolver::CaseTarget};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt, path::PathBuf, str::FromStr, time::Duration};

/// Message sent when none is configured.
pub const DEFAULT_MESSAGE_BODY: &str = "Bonjour !";

/// Everything one pipeline run needs.
#[derive(Clone)]
pub struct PipelineConfig {
    pub endpoint_url: String,
    pub token: String,
    pub target: CaseTarget,
    pub file_path: PathBuf,
    pub message_body: String,
    /// Per-request timeout; `None` keeps the HTTP client defaults.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("token", &"<redacted>")
            .field("target", &self.target)
            .field("file_path", &self.file_path)
            .field("message_body", &self.message_body)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PipelineConfig {
    pub fn new(
        endpoint_url: impl Into<String>,
        token: impl Into<String>,
        target: CaseTarget,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            token: token.into(),
            target,
            file_path: file_path.into(),
            message_body: DEFAULT_MESSAGE_BODY.to_string(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn message_body(mut self, body: impl Into<String>) -> Self {
        self.message_body = body.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Parse CLI args, then fill the gaps from the environment.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::from_args_and_env(args, |name| env::var(name).ok())
    }

    /// Merge `args` over variables read through `lookup`. CLI values win.
    pub fn from_args_and_env<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint_url = args
            .endpoint
            .or_else(|| lookup("GRAPHQL_URL"))
            .context("missing GraphQL endpoint (--endpoint or GRAPHQL_URL)")?;

        let token = args
            .token
            .or_else(|| lookup("DS_API_TOKEN"))
            .or_else(|| lookup("DS_API_TOCKEN"))
            .context("missing API token (--token or DS_API_TOKEN)")?;

        let file_path = args
            .file
            .or_else(|| lookup("DS_FILE").map(PathBuf::from))
            .context("missing file to upload (FILE argument or DS_FILE)")?;

        let message_body = args
            .body
            .or_else(|| lookup("DS_MESSAGE_BODY"))
            .unwrap_or_else(|| DEFAULT_MESSAGE_BODY.to_string());

        let timeout = match args.timeout_secs {
            Some(secs) => Some(secs),
            None => parse_var::<u64, _>(&lookup, "DS_TIMEOUT_SECS")?,
        }
        .map(Duration::from_secs);

        let case_id = args.case_id.or_else(|| lookup("DS_DOSSIER_ID"));
        let reviewer_id = args.reviewer_id.or_else(|| lookup("DS_INSTRUCTEUR_ID"));
        let case_number = match args.case_number {
            Some(n) => Some(n),
            None => parse_var::<i64, _>(&lookup, "DS_DOSSIER_NUMBER")?,
        };
        let procedure_number = match args.procedure_number {
            Some(n) => Some(n),
            None => parse_var::<i64, _>(&lookup, "DS_DEMARCHE_NUMBER")?,
        };

        let target = match (case_id, reviewer_id, case_number, procedure_number) {
            (Some(case_id), Some(reviewer_id), _, _) => CaseTarget::ByKnownIds {
                case_id,
                reviewer_id,
            },
            (Some(_), None, _, _) | (None, Some(_), _, _) => {
                bail!("a known case id and reviewer id must be given together")
            }
            (None, None, Some(number), _) => CaseTarget::ByCaseNumber(number),
            (None, None, None, Some(number)) => CaseTarget::ByProcedure {
                number,
                state: args.state.unwrap_or_default(),
                fetch_history: !args.no_history,
            },
            (None, None, None, None) => bail!(
                "no target case: set a case number, a procedure number, or a case id and reviewer id"
            ),
        };

        Ok(Self {
            endpoint_url,
            token,
            target,
            file_path,
            message_body,
            timeout,
        })
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Attach a file to a case and send it to the case reviewer"
)]
pub struct Args {
    /// File to attach (overrides DS_FILE)
    pub file: Option<PathBuf>,

    /// GraphQL endpoint URL (overrides GRAPHQL_URL)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bearer token (overrides DS_API_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Case number to resolve (overrides DS_DOSSIER_NUMBER)
    #[arg(long)]
    pub case_number: Option<i64>,

    /// Procedure number to pick a case from (overrides DS_DEMARCHE_NUMBER)
    #[arg(long)]
    pub procedure_number: Option<i64>,

    /// Case state used when picking from a procedure
    #[arg(long)]
    pub state: Option<CaseState>,

    /// Skip fetching the message history of a case picked from a procedure
    #[arg(long)]
    pub no_history: bool,

    /// Known case id, skips resolution (overrides DS_DOSSIER_ID)
    #[arg(long)]
    pub case_id: Option<String>,

    /// Known reviewer id, skips resolution (overrides DS_INSTRUCTEUR_ID)
    #[arg(long)]
    pub reviewer_id: Option<String>,

    /// Message body (overrides DS_MESSAGE_BODY)
    #[arg(long)]
    pub body: Option<String>,

    /// Request timeout in seconds (overrides DS_TIMEOUT_SECS)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        None => Ok(None),
    }
}
