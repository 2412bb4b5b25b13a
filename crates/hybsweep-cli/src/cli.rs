use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Gabriele Girelli",
    version,
    about = "hybsweep - Pick the FISH probe hybridization conditions that maximize correctly behaving oligos.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of worker threads for parallel sweeps.
    /// Cannot exceed the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep H1 and H2 temperatures and pick the best condition of each.
    Pick(PickArgs),
    /// Check a probe FASTA against its structure and print segment offsets.
    Validate(ValidateArgs),
}

/// Arguments for the `pick` subcommand.
#[derive(Args, Debug, Default)]
pub struct PickArgs {
    // --- Core Arguments ---
    /// FASTA file with one record per probe oligo.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Directory for the score ledgers, picked records and per-condition artifacts.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Oligo structure as four comma-separated lengths: color,forward,target,reverse.
    #[arg(short, long, value_name = "C,F,T,R")]
    pub structure: Option<String>,

    /// Probe name used in the picked records. Defaults to the input file stem.
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Stage Conditions ---
    #[command(flatten)]
    pub h1: H1Args,

    #[command(flatten)]
    pub h2: H2Args,

    // --- Melt Evaluator ---
    #[command(flatten)]
    pub evaluator: EvaluatorArgs,

    // --- Sweep ---
    /// Evaluate the whole temperature grid on a worker pool (see --threads).
    #[arg(long)]
    pub parallel: bool,

    /// Leave a sweep direction after this many points without improvement.
    /// Sequential sweeps only. Disabled by default.
    #[arg(long, value_name = "POINTS")]
    pub early_stop: Option<usize>,

    /// Tie-break among equally scored conditions: 'last-evaluated' or 'closest-to-default'.
    #[arg(long, value_name = "POLICY")]
    pub tie_break: Option<String>,

    /// Per-oligo goodness model: 'lower-bound' or 'independent'.
    #[arg(long, value_name = "MODEL")]
    pub goodness: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S h1.temperature=40
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// First hybridization, probe to target.
#[derive(Args, Debug, Default, Clone)]
pub struct H1Args {
    /// Default H1 temperature in Celsius degrees.
    #[arg(id = "t1", long = "t1", value_name = "C")]
    pub temperature: Option<f64>,
    /// H1 sweep step.
    #[arg(id = "t1-step", long = "t1-step", value_name = "C")]
    pub step: Option<f64>,
    /// Lowest H1 temperature swept.
    #[arg(id = "t1-min", long = "t1-min", value_name = "C")]
    pub min: Option<f64>,
    /// Highest H1 temperature swept.
    #[arg(id = "t1-max", long = "t1-max", value_name = "C")]
    pub max: Option<f64>,
    /// H1 formamide, % v/v.
    #[arg(id = "fa1", long = "fa1", value_name = "PERCENT")]
    pub formamide: Option<f64>,
    /// H1 monovalent ion concentration, M.
    #[arg(id = "na1", long = "na1", value_name = "M")]
    pub sodium: Option<f64>,
    /// H1 divalent ion concentration, M.
    #[arg(id = "mg1", long = "mg1", value_name = "M")]
    pub magnesium: Option<f64>,
    /// H1 duplex type (DNA:DNA, RNA:RNA, DNA:RNA or RNA:DNA).
    #[arg(id = "dtype1", long = "dtype1", value_name = "TYPE")]
    pub duplex_type: Option<String>,
    /// H1 probe concentration, M.
    #[arg(id = "conc1", long = "conc1", value_name = "M")]
    pub concentration: Option<f64>,
}

/// Second hybridization, labeled oligo to color flap.
#[derive(Args, Debug, Default, Clone)]
pub struct H2Args {
    /// Default H2 temperature in Celsius degrees.
    #[arg(id = "t2", long = "t2", value_name = "C")]
    pub temperature: Option<f64>,
    /// H2 sweep step.
    #[arg(id = "t2-step", long = "t2-step", value_name = "C")]
    pub step: Option<f64>,
    /// Lowest H2 temperature swept.
    #[arg(id = "t2-min", long = "t2-min", value_name = "C")]
    pub min: Option<f64>,
    /// Highest H2 temperature swept.
    #[arg(id = "t2-max", long = "t2-max", value_name = "C")]
    pub max: Option<f64>,
    /// H2 formamide, % v/v.
    #[arg(id = "fa2", long = "fa2", value_name = "PERCENT")]
    pub formamide: Option<f64>,
    /// H2 monovalent ion concentration, M.
    #[arg(id = "na2", long = "na2", value_name = "M")]
    pub sodium: Option<f64>,
    /// H2 divalent ion concentration, M.
    #[arg(id = "mg2", long = "mg2", value_name = "M")]
    pub magnesium: Option<f64>,
    /// H2 duplex type (DNA:DNA, RNA:RNA, DNA:RNA or RNA:DNA).
    #[arg(id = "dtype2", long = "dtype2", value_name = "TYPE")]
    pub duplex_type: Option<String>,
    /// H2 labeled oligo concentration, M.
    #[arg(id = "conc2", long = "conc2", value_name = "M")]
    pub concentration: Option<f64>,
    /// Duplex type of the competing target duplex during H2.
    #[arg(id = "dtype-bystander", long = "dtype-bystander", value_name = "TYPE")]
    pub bystander_duplex_type: Option<String>,
    /// Concentration of the competing target duplex during H2, M.
    #[arg(id = "conc-bystander", long = "conc-bystander", value_name = "M")]
    pub bystander_concentration: Option<f64>,
}

/// Where melting fractions come from. At most one source may be given here; the
/// config file may provide one instead.
#[derive(Args, Debug, Default, Clone)]
#[group(required = false, multiple = false)]
pub struct EvaluatorSource {
    /// External program computing melt fractions for each condition.
    #[arg(long, value_name = "PROGRAM")]
    pub melt_command: Option<PathBuf>,

    /// Directory of precomputed dH/dS tables (h1.duplex.tsv, h1.fold.tsv,
    /// h2.duplex.tsv, h2.fold.tsv, bystander.duplex.tsv).
    #[arg(long, value_name = "DIR")]
    pub thermo_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct EvaluatorArgs {
    #[command(flatten)]
    pub source: EvaluatorSource,

    /// Extra argument passed to the melt command. Can be used multiple times.
    #[arg(long = "melt-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub melt_args: Vec<String>,

    /// Formamide correction used with thermo tables: 'mcconaughy' or 'wright'.
    #[arg(long, value_name = "MODE")]
    pub fa_mode: Option<String>,

    /// Formamide m-value for the 'wright' correction, 'x' or 'xL+y'.
    #[arg(long, value_name = "M")]
    pub fa_mvalue: Option<String>,
}

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// FASTA file with one record per probe oligo.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Oligo structure as four comma-separated lengths: color,forward,target,reverse.
    #[arg(short, long, required = true, value_name = "C,F,T,R")]
    pub structure: String,
}
