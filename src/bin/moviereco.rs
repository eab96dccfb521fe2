/**
 * MovieReco
 * Copyright (C) 2026 The MovieReco developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::env;
use std::error::Error;
use std::fs::File;
use std::io::{stdout, Write};
use std::path::PathBuf;

use getopts::Options;
use tracing::info;
use tracing_subscriber::EnvFilter;

use moviereco::io;
use moviereco::{
    FreshBuild, Metric, Model, ModelSource, RecommendOptions, SnapshotFile, SyntheticProfile,
};

/// Everything a single invocation needs, derived from the command line.
struct Request {
    ratings_path: Option<String>,
    movies_path: String,
    links_path: Option<String>,
    titles: Vec<String>,
    user: Option<i64>,
    metric: Metric,
    options: RecommendOptions,
    load_model: Option<PathBuf>,
    save_model: Option<PathBuf>,
    output_path: Option<String>,
}

fn main() {

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("r", "ratings", "Ratings file (CSV with header userId,movieId,rating,timestamp). \
        Required unless recommending for titles from a saved model.", "PATH");
    opts.optopt("m", "movies", "Movies file (CSV with header movieId,title,genres), \
        required.", "PATH");
    opts.optopt("l", "links", "Links file (CSV with header movieId,imdbId,tmdbId) used to \
        resolve TMDB identifiers (optional).", "PATH");
    opts.optmulti("t", "title", "Title of a movie the visitor likes, exactly as listed in the \
        movies file. Can be repeated.", "TITLE");
    opts.optopt("u", "user", "Recommend for an existing user instead of a set of titles.", "ID");
    opts.optopt("n", "num-recommendations", "Maximum number of recommendations (optional, \
        defaults to 10).", "NUMBER");
    opts.optopt("k", "neighbors", "Number of similar movies to look up per seed movie \
        (optional, defaults to 10).", "NUMBER");
    opts.optopt("", "metric", "Distance metric: cosine, euclidean or manhattan (optional, \
        defaults to cosine).", "NAME");
    opts.optopt("", "load-model", "Use a saved model instead of fitting one.", "PATH");
    opts.optopt("", "save-model", "Fit a model on the ratings file and save it.", "PATH");
    opts.optopt("o", "outputfile", "Output file name (optional, output will be written to \
        stdout by default).", "PATH");
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

    let movies_path = match matches.opt_str("m") {
        Some(path) => path,
        None => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify a movies file via --movies."),
        ),
    };

    let titles = matches.opt_strs("t");

    let user: Option<i64> = match matches.opt_get("u") {
        Ok(user) => user,
        Err(failure) => {
            let hint = format!("Problem with option 'u': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if titles.is_empty() && user.is_none() && !matches.opt_present("save-model") {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify at least one --title, a --user or --save-model."),
        );
    }

    if !matches.opt_present("r") && (user.is_some() || !matches.opt_present("load-model")) {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify a ratings file via --ratings."),
        );
    }

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

    let metric: Metric = match matches.opt_get_default("metric", Metric::default()) {
        Ok(metric) => metric,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let request = Request {
        ratings_path: matches.opt_str("r"),
        movies_path,
        links_path: matches.opt_str("l"),
        titles,
        user,
        metric,
        options: RecommendOptions { k, limit: Some(limit), ..RecommendOptions::default() },
        load_model: matches.opt_str("load-model").map(PathBuf::from),
        save_model: matches.opt_str("save-model").map(PathBuf::from),
        output_path: matches.opt_str("o"),
    };

    if let Err(failure) = recommend(request) {
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

fn recommend(request: Request) -> Result<(), Box<dyn Error>> {

    let catalog = io::read_catalog(
        request.movies_path.as_str(),
        request.links_path.as_ref().map(|path| path.as_str()),
    )?;

    info!("Read {} movies from {}", catalog.len(), request.movies_path);

    let ratings = match request.ratings_path {
        Some(ref path) => {
            let ratings = io::read_ratings(path)?;
            info!("Read {} ratings from {}", ratings.len(), path);
            ratings
        },
        None => Vec::new(),
    };

    // Snapshots only ever contain the base ratings, never a synthetic profile
    let mut fitted: Option<Model> = None;

    if let Some(ref path) = request.save_model {
        let model = FreshBuild { ratings: &ratings, metric: request.metric }.model()?;
        model.save(path)?;
        fitted = Some(model);
    }

    let recommended = if let Some(user) = request.user {

        let model = match (fitted, &request.load_model) {
            (Some(model), _) => model,
            (None, Some(path)) => SnapshotFile { path: path.clone() }.model()?,
            (None, None) => FreshBuild { ratings: &ratings, metric: request.metric }.model()?,
        };

        info!("Recommending for user {}", user);
        moviereco::recommend_for_user(&model, &ratings, user, &request.options)?

    } else if request.titles.is_empty() {
        return Ok(());

    } else if let Some(ref path) = request.load_model {

        let model = SnapshotFile { path: path.clone() }.model()?;
        let seeds = SyntheticProfile::default().resolve(&request.titles, &catalog);

        info!("Recommending movies similar to {:?} from saved model", seeds);
        moviereco::recommend_for_items(&model, &seeds, &request.options)?

    } else {

        info!("Recommending for {} selected titles", request.titles.len());
        moviereco::recommend_for_titles(
            &ratings,
            &catalog,
            &request.titles,
            request.metric,
            &request.options,
        )?
    };

    let mut out: Box<dyn Write> = match request.output_path {
        Some(path) => Box::new(File::create(&path)?),
        None => Box::new(stdout()),
    };

    io::write_recommendations(&mut out, &recommended, &catalog)?;

    Ok(())
}
