//! Bono fracture-risk calculator CLI
//!
//! Fills the patient form from a file and `--set` overrides, validates it
//! locally, and submits it to the scoring service.
//!
//! Usage:
//!   bono fields
//!   bono validate --input config/patient.toml
//!   bono assess --input config/patient.toml --set age=72 --horizon 5
//!   bono assess --input patient.json --explain batch --plots-dir plots/

mod input;
mod settings;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bono_contracts::{
    api::SitePlots,
    catalog::{self, FeatureCategory, FeatureKind},
    error::{BonoError, BonoResult},
    patient::{PatientRecord, TreatmentKind},
    risk::FractureSite,
};
use bono_core::{ExplainMode, FormState, Submission, Submitter, FAILURE_NOTICE};
use bono_http::HttpScoringClient;
use bono_schema::{patient_form_schema, FormValidator};

use crate::settings::Settings;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Bono: fracture risk for postmenopausal women from clinical inputs.
#[derive(Parser)]
#[command(
    name = "bono",
    about = "Fracture-risk calculator client",
    long_about = "Validates patient data locally and asks the scoring service for\n\
                  vertebral, hip and any-fracture risk over a 1 to 7 year horizon."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the field catalog grouped by category.
    Fields,
    /// Validate patient data and print BMI and the record that would be sent.
    Validate {
        #[command(flatten)]
        form: FormArgs,
    },
    /// Validate, submit, and print risks with their color levels.
    Assess {
        #[command(flatten)]
        form: FormArgs,
        /// Risk horizon in years (1 to 7).
        #[arg(long, default_value = "2")]
        horizon: String,
        /// TOML file with [api] and [thresholds] sections.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Scoring service base URL; overrides config and BONO_API_BASE_URL.
        #[arg(long)]
        api_url: Option<String>,
        /// Also fetch SHAP explanations.
        #[arg(long, value_enum)]
        explain: Option<ExplainArg>,
        /// Write one PNG per site here when explanations were fetched.
        #[arg(long, requires = "explain")]
        plots_dir: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct FormArgs {
    /// Flat TOML or JSON map of form inputs.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Override one input, e.g. --set age=72. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = input::parse_assignment)]
    set: Vec<(String, String)>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExplainArg {
    /// One request per fracture site.
    Single,
    /// One request for all sites.
    Batch,
}

impl From<ExplainArg> for ExplainMode {
    fn from(arg: ExplainArg) -> Self {
        match arg {
            ExplainArg::Single => ExplainMode::PerSite,
            ExplainArg::Batch => ExplainMode::Batch,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Fields => {
            print_fields();
            Ok(())
        }
        Command::Validate { form } => run_validate(&form),
        Command::Assess {
            form,
            horizon,
            config,
            api_url,
            explain,
            plots_dir,
        } => run_assess(
            &form,
            &horizon,
            config.as_deref(),
            api_url,
            explain.map_or(ExplainMode::None, ExplainMode::from),
            plots_dir.as_deref(),
        ),
    };

    if let Err(e) = result {
        report_error(&e);
        std::process::exit(1);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn print_fields() {
    for category in [
        FeatureCategory::Demographics,
        FeatureCategory::Anamnesis,
        FeatureCategory::Bmd,
        FeatureCategory::Treatment,
    ] {
        println!("{}", category.label());
        for feature in catalog::by_category(category) {
            let keys = feature.form_keys().join(", ");
            let kind = match feature.kind {
                FeatureKind::Boolean | FeatureKind::Treatment => "yes/no",
                FeatureKind::Number => "number",
                FeatureKind::Choice => "choice",
            };
            if feature.description.is_empty() {
                println!("  {:<3} {:<40} {:<7} {}", feature.id, feature.name, kind, keys);
            } else {
                println!(
                    "  {:<3} {:<40} {:<7} {} ({})",
                    feature.id, feature.name, kind, keys, feature.description
                );
            }
        }
        println!();
    }
}

fn run_validate(args: &FormArgs) -> BonoResult<()> {
    let form = fill_form(args)?;
    let record = form.validate(&FormValidator::new(patient_form_schema()))?;

    println!("Patient data is valid.");
    if let Some(bmi) = form.bmi() {
        println!("BMI: {bmi:.2}");
    }
    let json = serde_json::to_string_pretty(&record).map_err(|e| BonoError::Output {
        reason: format!("failed to render patient record: {e}"),
    })?;
    println!("{json}");
    Ok(())
}

fn run_assess(
    args: &FormArgs,
    horizon: &str,
    config: Option<&Path>,
    api_url: Option<String>,
    explain: ExplainMode,
    plots_dir: Option<&Path>,
) -> BonoResult<()> {
    let settings = match config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    let engine = settings.threshold_engine()?;
    let client = HttpScoringClient::new(settings.client_config(api_url)?)?;
    info!(base_url = %client.config().base_url, "using scoring service");

    let mut form = fill_form(args)?;
    form.set_horizon_str(horizon)?;
    let validator = FormValidator::new(patient_form_schema());
    let record = form.validate(&validator)?;

    let submitter = Submitter::new(Box::new(client));
    let submission = submitter.submit(&record, form.horizon(), explain)?;

    print_submission(&submission, &engine, f64::from(record.age), form.bmi());
    if let Some(summary) = treatment_summary(&record) {
        println!("  Treatments: {summary}");
    }

    if let (Some(dir), Some(plots)) = (plots_dir, &submission.plots) {
        for path in write_plots(dir, plots)? {
            println!("Wrote {}", path.display());
        }
    }
    if let Some(reason) = &submission.explanation_error {
        warn!(%reason, "explanations unavailable");
        println!("Explanations unavailable; risks above are still valid.");
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Default form, then the input file, then `--set` overrides.
fn fill_form(args: &FormArgs) -> BonoResult<FormState> {
    let mut form = FormState::new();
    if let Some(path) = &args.input {
        for (key, value) in input::load_input(path)? {
            form.set(&key, value)?;
        }
    }
    for (key, value) in &args.set {
        form.set(key, value.as_str())?;
    }
    Ok(form)
}

fn print_submission(
    submission: &Submission,
    engine: &bono_thresholds::ThresholdEngine,
    age: f64,
    bmi: Option<f64>,
) {
    let result = &submission.result;
    println!("Fracture risk within {} years", result.horizon);
    if let Some(bmi) = bmi {
        println!("  BMI {bmi:.2}");
    }
    for (site, risk, level) in engine.levels(&result.risks) {
        println!("  {:<10} {:>6.2}%  {}", site.label(), risk, level);
    }
    let mof = engine.mof_category(age, result.risks.any, result.horizon);
    println!("  MOF category: {mof}");
    println!("  request {} at {}", result.request_id, result.received_at.to_rfc3339());
}

/// Decode each site's plot and write it as `<site>.png` under `dir`.
fn write_plots(dir: &Path, plots: &SitePlots) -> BonoResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| BonoError::Output {
        reason: format!("failed to create plots directory '{}': {}", dir.display(), e),
    })?;
    FractureSite::ALL
        .into_iter()
        .map(|site| {
            let path = dir.join(format!("{site}.png"));
            let bytes = plots.get(site).decode()?;
            std::fs::write(&path, bytes).map_err(|e| BonoError::Output {
                reason: format!("failed to write plot '{}': {}", path.display(), e),
            })?;
            Ok(path)
        })
        .collect()
}

/// "bisphosphonate (prior), denosumab (current)", or `None` without any
/// recorded treatment.
fn treatment_summary(record: &PatientRecord) -> Option<String> {
    let parts: Vec<String> = TreatmentKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let status = record.treatments.status(kind);
            if !status.any() {
                return None;
            }
            let phases: Vec<&str> = [
                ("prior", status.prior),
                ("current", status.current),
                ("new", status.new),
            ]
            .into_iter()
            .filter_map(|(phase, set)| set.then_some(phase))
            .collect();
            Some(format!("{} ({})", kind.key(), phases.join(", ")))
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn report_error(error: &BonoError) {
    match error {
        BonoError::Validation(errors) => {
            eprintln!("Patient data is invalid:");
            for (field, messages) in errors.iter() {
                for message in messages {
                    eprintln!("  {field}: {message}");
                }
            }
        }
        e if e.is_network() => {
            eprintln!("{FAILURE_NOTICE}");
            eprintln!("  cause: {e}");
        }
        e => eprintln!("bono: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use bono_contracts::{
        api::{ShapPlot, SitePlots},
        error::BonoError,
        patient::{PatientRecord, TreatmentKind, TreatmentStatus},
    };

    use super::{treatment_summary, write_plots};

    #[test]
    fn test_treatment_summary_lists_recorded_phases() {
        let mut record = PatientRecord::default();
        assert_eq!(treatment_summary(&record), None);

        record.treatments.set_status(
            TreatmentKind::Bisphosphonate,
            TreatmentStatus { prior: true, current: false, new: false },
        );
        record.treatments.set_status(
            TreatmentKind::Hrt,
            TreatmentStatus { prior: false, current: true, new: true },
        );
        assert_eq!(
            treatment_summary(&record).as_deref(),
            Some("bisphosphonate (prior), hrt (current, new)")
        );
    }

    fn plots(data: &str) -> SitePlots {
        let plot = ShapPlot(data.to_string());
        SitePlots { vertebral: plot.clone(), hip: plot.clone(), any: plot }
    }

    #[test]
    fn test_write_plots_one_png_per_site() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plots");
        let written = write_plots(&out, &plots("UE5HDQ==")).unwrap();

        assert_eq!(written.len(), 3);
        assert_eq!(std::fs::read(out.join("hip.png")).unwrap(), b"PNG\r");
    }

    #[test]
    fn test_write_plots_unwritable_target_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = write_plots(&blocker, &plots("UE5HDQ==")).unwrap_err();
        assert!(matches!(err, BonoError::Output { .. }));
    }
}
