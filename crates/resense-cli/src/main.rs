use anyhow::Result;
use clap::{Arg, ArgAction, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use resense_cli::select::{run_select, SelectConfig};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("RESENSE_LOG", "error,resense=info"))
        .init();

    let matches = Command::new("resense")
        .version(clap::crate_version!())
        .about("ReSense CLI - Cross-validated drug-response classifiers for transcriptomics")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("select")
                .about("Select a regularization strength by cross-validation and evaluate the refit model")
                .arg(
                    Arg::new("expression")
                        .help("Expression CSV (samples x genes, sample-id first column)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("response")
                        .help("Response CSV (sample id, response string)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("predict")
                        .short('p')
                        .long("predict")
                        .help("Unlabeled expression CSV to score into a submission file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("team")
                        .short('t')
                        .long("team")
                        .help("Team name used as the submission file prefix")
                        .default_value("resense"),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output_dir")
                        .help("Directory for the submission file")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("class0")
                        .long("class0")
                        .help("Response string coded as class 0 (its probability is reported as p0)")
                        .default_value("Sensitive"),
                )
                .arg(
                    Arg::new("class1")
                        .long("class1")
                        .help("Response string coded as class 1")
                        .default_value("Resistant"),
                )
                .arg(
                    Arg::new("folds")
                        .short('k')
                        .long("folds")
                        .help("Number of cross-validation folds")
                        .default_value("5")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("seed")
                        .short('s')
                        .long("seed")
                        .help("Seed for the fold assignment and the train/test split")
                        .default_value("42")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("lambda_min")
                        .long("lambda_min")
                        .help("Smallest lambda candidate")
                        .default_value("1e-4")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("lambda_max")
                        .long("lambda_max")
                        .help("Largest lambda candidate")
                        .default_value("1e2")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("n_lambdas")
                        .long("n_lambdas")
                        .help("Number of log-spaced lambda candidates")
                        .default_value("25")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("test_fraction")
                        .long("test_fraction")
                        .help("Fraction of samples held out for evaluation")
                        .default_value("0.2")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("raw_counts")
                        .long("raw_counts")
                        .help("Treat expression values as raw counts and apply log2-CPM")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("top_genes")
                        .long("top_genes")
                        .help("Number of top genes to report")
                        .default_value("20")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("select", sub)) => {
            let config = SelectConfig {
                expression: sub
                    .get_one::<PathBuf>("expression")
                    .cloned()
                    .expect("required argument"),
                response: sub
                    .get_one::<PathBuf>("response")
                    .cloned()
                    .expect("required argument"),
                predict: sub.get_one::<PathBuf>("predict").cloned(),
                team: sub
                    .get_one::<String>("team")
                    .cloned()
                    .expect("defaulted argument"),
                output_dir: sub
                    .get_one::<PathBuf>("output_dir")
                    .cloned()
                    .expect("defaulted argument"),
                class0: sub
                    .get_one::<String>("class0")
                    .cloned()
                    .expect("defaulted argument"),
                class1: sub
                    .get_one::<String>("class1")
                    .cloned()
                    .expect("defaulted argument"),
                n_folds: *sub.get_one::<usize>("folds").expect("defaulted argument"),
                seed: *sub.get_one::<u64>("seed").expect("defaulted argument"),
                lambda_min: *sub
                    .get_one::<f64>("lambda_min")
                    .expect("defaulted argument"),
                lambda_max: *sub
                    .get_one::<f64>("lambda_max")
                    .expect("defaulted argument"),
                n_lambdas: *sub
                    .get_one::<usize>("n_lambdas")
                    .expect("defaulted argument"),
                test_fraction: *sub
                    .get_one::<f64>("test_fraction")
                    .expect("defaulted argument"),
                raw_counts: sub.get_flag("raw_counts"),
                top_genes: *sub
                    .get_one::<usize>("top_genes")
                    .expect("defaulted argument"),
            };
            run_select(&config)
        }
        _ => unreachable!("subcommand is required"),
    }
}
