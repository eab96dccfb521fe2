use std::env;
use std::error::Error;
use std::fs::File;
use std::io::{stdout, Write};
use std::path::PathBuf;

use getopts::Options;
use tracing::info;
use tracing_subscriber::EnvFilter;

use moviereco::io;
use moviereco::{FreshBuild, Metric, ModelSource, RecommendOptions, SnapshotFile};

fn main() {

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("r", "ratings", "Ratings file (required). CSV with header \
        userId,movieId,rating,timestamp.", "PATH");
    opts.optopt("", "load-model", "Use a saved model fitted on the same ratings instead of \
        fitting one (optional).", "PATH");
    opts.optopt("o", "outputfile", "Output file name (optional, output will be written to \
        stdout by default).", "PATH");
    opts.optopt("n", "num-recommendations", "Maximum number of recommendations per user \
        (optional, defaults to 10).", "NUMBER");
    opts.optopt("k", "neighbors", "Number of similar movies to look up per seed movie \
        (optional, defaults to 10).", "NUMBER");
    opts.optopt("", "metric", "Distance metric: cosine, euclidean or manhattan (optional, \
        defaults to cosine).", "NAME");
    opts.optopt("p", "threads", "Number of worker threads (optional, defaults to the number \
        of CPUs).", "NUMBER");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let ratings_path = match matches.opt_str("r") {
        Some(path) => path,
        None => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify a ratings file via --ratings."),
        ),
    };

    let limit: usize = match matches.opt_get_default("n", 10) {
        Ok(limit) => limit,
        Err(failure) => {
            let hint = format!("Problem with option 'n': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let k: usize = match matches.opt_get_default("k", 10) {
        Ok(k) => k,
        Err(failure) => {
            let hint = format!("Problem with option 'k': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let pool_size: usize = match matches.opt_get_default("p", num_cpus::get()) {
        Ok(pool_size) => pool_size,
        Err(failure) => {
            let hint = format!("Problem with option 'p': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let metric: Metric = match matches.opt_get_default("metric", Metric::default()) {
        Ok(metric) => metric,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let options = RecommendOptions { k, limit: Some(limit), ..RecommendOptions::default() };

    let result = recommend_for_everyone(
        &ratings_path,
        matches.opt_str("load-model").map(PathBuf::from),
        metric,
        &options,
        pool_size,
        matches.opt_str("o"),
    );

    if let Err(failure) = result {
        eprintln!("{}", failure);
        std::process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}

fn recommend_for_everyone(
    ratings_path: &str,
    model_path: Option<PathBuf>,
    metric: Metric,
    options: &RecommendOptions,
    pool_size: usize,
    output_path: Option<String>,
) -> Result<(), Box<dyn Error>> {

    let ratings = io::read_ratings(ratings_path)?;
    info!("Read {} ratings from {}", ratings.len(), ratings_path);

    let model = match model_path {
        Some(path) => SnapshotFile { path }.model()?,
        None => FreshBuild { ratings: &ratings, metric }.model()?,
    };

    info!(
        "Computing recommendations for {} users on {} threads",
        model.matrix.num_users(),
        pool_size,
    );

    let recommendations =
        moviereco::recommend_for_all_users(&model, &ratings, options, pool_size)?;

    let mut out: Box<dyn Write> = match output_path {
        Some(path) => Box::new(File::create(&path)?),
        None => Box::new(stdout()),
    };

    io::write_user_recommendations(&mut out, &recommendations)?;

    Ok(())
}
