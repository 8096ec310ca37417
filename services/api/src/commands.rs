use crate::infra::{resolve_classifier, InMemorySessionRepository, Recommender};
use aura_diagnosis::config::AppConfig;
use aura_diagnosis::diagnosis::{
    classify_csv, write_csv, DiagnosisClassifier, DiagnosisReport, DiagnosisService,
    RecommendedProduct,
};
use aura_diagnosis::error::AppError;
use aura_diagnosis::telemetry;
use clap::Args;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct DefinitionArgs {
    /// Quiz definition JSON to use instead of the built-in quiz
    #[arg(long)]
    pub(crate) definition: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct DiagnoseArgs {
    /// Comma separated option numbers, one per question, starting at 1
    #[arg(long, value_delimiter = ',', value_parser = parse_option_number, required = true)]
    pub(crate) answers: Vec<usize>,
    /// Print the full report as JSON
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) definition: DefinitionArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Print the normalized definition document after validation
    #[arg(long)]
    pub(crate) dump: bool,
    #[command(flatten)]
    pub(crate) definition: DefinitionArgs,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV file with a respondent id column followed by one option number per question
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Destination CSV (defaults to stdout)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) definition: DefinitionArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct QuestionsArgs {
    #[command(flatten)]
    pub(crate) definition: DefinitionArgs,
}

/// Option numbers on the command line start at 1; internally options are indexed from 0.
pub(crate) fn parse_option_number(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(number) if number >= 1 => Ok(number - 1),
        _ => Err(format!(
            "'{raw}' is not an option number (options are numbered from 1)"
        )),
    }
}

fn classifier_for(args: &DefinitionArgs, config: &AppConfig) -> Result<DiagnosisClassifier, AppError> {
    Ok(resolve_classifier(
        args.definition.as_deref(),
        &config.diagnosis,
    )?)
}

pub(crate) async fn run_diagnose(args: DiagnoseArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_stderr(&config.telemetry)?;
    let classifier = classifier_for(&args.definition, &config)?;
    let recommender = Recommender::from_config(&config.recommendation)?;
    let service = DiagnosisService::new(
        Arc::new(classifier),
        Arc::new(InMemorySessionRepository::default()),
        Arc::new(recommender),
    );

    let report = service.evaluate(&args.answers)?;

    if args.json {
        let products = service.recommend(&report.diagnosis).await;
        let mut payload = serde_json::to_value(&report).map_err(json_error)?;
        if let Some(fields) = payload.as_object_mut() {
            let products = serde_json::to_value(&products).map_err(json_error)?;
            fields.insert("recommended_products".to_string(), products);
        }
        let json = serde_json::to_string_pretty(&payload).map_err(json_error)?;
        println!("{json}");
        return Ok(());
    }

    print!("{}", render_diagnosis(&report));
    io::stdout().flush()?;
    let products = service.recommend(&report.diagnosis).await;
    print!("{}", render_products(&products));
    Ok(())
}

fn json_error(err: serde_json::Error) -> AppError {
    AppError::Io(io::Error::other(err))
}

pub(crate) fn render_diagnosis(report: &DiagnosisReport) -> String {
    let diagnosis = &report.diagnosis;
    let mut out = String::new();
    out.push_str(&format!(
        "Skin type: {} ({})\n",
        diagnosis.result.type_name, diagnosis.category
    ));
    out.push_str(&format!("Aura: {}\n", diagnosis.result.aura_keyword));
    out.push_str(&format!("{}\n", diagnosis.result.description));
    let scores = diagnosis
        .scores
        .entries()
        .iter()
        .map(|(axis, value)| format!("{}={value}", axis.key()))
        .collect::<Vec<_>>()
        .join(" ");
    out.push_str(&format!(
        "Scores: {scores} | combination={}\n",
        diagnosis.combination
    ));
    out.push_str(&format!(
        "Resolved at {}\n",
        report.resolved_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out
}

/// Product lines use whatever fields the recommendation service sent.
pub(crate) fn render_products(products: &[RecommendedProduct]) -> String {
    if products.is_empty() {
        return "Recommended products: none available\n".to_string();
    }

    let mut out = String::from("Recommended products:\n");
    for product in products {
        let id = product.id().unwrap_or_else(|| "?".to_string());
        let name = product.name().unwrap_or("Unnamed product");
        match product.price_label() {
            Some(price) => out.push_str(&format!("  - {name} [{id}] {price}\n")),
            None => out.push_str(&format!("  - {name} [{id}]\n")),
        }
    }
    out
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let classifier = classifier_for(&args.definition, &config)?;
    let definition = classifier.definition();

    if args.dump {
        let json = serde_json::to_string_pretty(&definition.to_document()).map_err(json_error)?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "Definition OK: {} questions, {} categories",
        definition.questions().len(),
        definition.results().len()
    );
    println!("Priority order:");
    for (position, rule) in definition.rules().iter().enumerate() {
        println!(
            "  {}. {} ({})",
            position + 1,
            rule.category,
            rule.condition.describe()
        );
    }
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_stderr(&config.telemetry)?;
    let classifier = classifier_for(&args.definition, &config)?;

    let reader = BufReader::new(File::open(&args.input)?);
    let outcomes = classify_csv(reader, &classifier)?;
    let failed = outcomes.iter().filter(|outcome| outcome.result.is_err()).count();

    match &args.output {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            write_csv(writer, &outcomes)?;
            println!(
                "Classified {} respondents ({} failed) -> {}",
                outcomes.len(),
                failed,
                path.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_csv(&mut handle, &outcomes)?;
            handle.flush()?;
        }
    }
    Ok(())
}

pub(crate) fn run_questions(args: QuestionsArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let classifier = classifier_for(&args.definition, &config)?;

    for (index, question) in classifier.definition().questions().iter().enumerate() {
        println!("Q{}. {}", index + 1, question.prompt);
        for (option, answer) in question.options.iter().enumerate() {
            println!("    {}) {}", option + 1, answer.text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn option_numbers_start_at_one() {
        assert_eq!(parse_option_number("1"), Ok(0));
        assert_eq!(parse_option_number(" 4 "), Ok(3));
        assert!(parse_option_number("0").is_err());
        assert!(parse_option_number("two").is_err());
    }

    #[test]
    fn diagnosis_text_lists_result_and_scores() {
        let diagnosis = DiagnosisClassifier::standard()
            .classify(&[3, 3, 3, 2, 3, 3, 3, 2, 2, 4])
            .expect("classifies");
        let report = DiagnosisReport {
            session_id: None,
            diagnosis,
            resolved_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        };

        let text = render_diagnosis(&report);

        assert!(text.starts_with("Skin type: Normal (NORMAL)\n"));
        assert!(text.contains("Aura: Clear Green"));
        assert!(text.contains("Scores: O="));
        assert!(text.contains(" Normal="));
        assert!(text.contains("| combination=false\n"));
        assert!(text.ends_with("Resolved at 2026-01-02 03:04:05 UTC\n"));
    }

    #[test]
    fn product_text_tolerates_loose_fields() {
        let products = vec![
            RecommendedProduct::new(json!({ "id": "prod_002", "name": "Calming Serum", "price": 42000 })),
            RecommendedProduct::new(json!({ "id": 7, "price": 29.99 })),
            RecommendedProduct::new(json!({ "name": "Mystery Mask" })),
        ];

        let text = render_products(&products);

        assert_eq!(
            text,
            "Recommended products:\n\
             \x20 - Calming Serum [prod_002] 42000\n\
             \x20 - Unnamed product [7] 29.99\n\
             \x20 - Mystery Mask [?]\n"
        );
    }

    #[test]
    fn empty_product_list_says_so() {
        assert_eq!(render_products(&[]), "Recommended products: none available\n");
    }
}
